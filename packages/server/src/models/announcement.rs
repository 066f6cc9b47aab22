use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{double_option, validate_required};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub description: String,
    /// Absent for a school-wide announcement.
    #[serde(default)]
    pub class_id: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAnnouncementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Omit to leave unchanged, null to make school-wide, value to set.
    #[serde(default, deserialize_with = "double_option")]
    pub class_id: Option<Option<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub class_id: Option<i32>,
}

impl From<crate::entity::announcement::Model> for AnnouncementResponse {
    fn from(m: crate::entity::announcement::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            date: m.date,
            class_id: m.class_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct AnnouncementListItem {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub class_id: Option<i32>,
    pub class_name: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementListResponse {
    pub data: Vec<AnnouncementListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AnnouncementListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to one class.
    pub class_id: Option<i32>,
    /// Case-insensitive substring match on the announcement title.
    pub search: Option<String>,
}

pub fn validate_create_announcement(req: &CreateAnnouncementRequest) -> Result<(), AppError> {
    validate_required("title", &req.title)?;
    Ok(())
}

pub fn validate_update_announcement(req: &UpdateAnnouncementRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_required("title", title)?;
    }
    Ok(())
}
