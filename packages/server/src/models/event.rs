use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{double_option, validate_required, validate_time_window};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Absent for a school-wide event.
    #[serde(default)]
    pub class_id: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Omit to leave unchanged, null to make school-wide, value to set.
    #[serde(default, deserialize_with = "double_option")]
    pub class_id: Option<Option<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub class_id: Option<i32>,
}

impl From<crate::entity::event::Model> for EventResponse {
    fn from(m: crate::entity::event::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            start_time: m.start_time,
            end_time: m.end_time,
            class_id: m.class_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub class_id: Option<i32>,
    pub class_name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to one class.
    pub class_id: Option<i32>,
    /// Restrict to events starting on this day (the calendar widget's query).
    pub date: Option<chrono::NaiveDate>,
    /// Case-insensitive substring match on the event title.
    pub search: Option<String>,
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    validate_required("title", &req.title)?;
    validate_time_window(req.start_time, req.end_time, "start time", "end time")?;
    Ok(())
}

pub fn validate_update_event(req: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_required("title", title)?;
    }
    if let (Some(start), Some(end)) = (req.start_time, req.end_time) {
        validate_time_window(start, end, "start time", "end time")?;
    }
    Ok(())
}
