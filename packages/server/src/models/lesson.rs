use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{validate_required, validate_time_window};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateLessonRequest {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subject_id: i32,
    pub class_id: i32,
    pub teacher_id: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateLessonRequest {
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub subject_id: Option<i32>,
    pub class_id: Option<i32>,
    pub teacher_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    pub id: i32,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subject_id: i32,
    pub class_id: i32,
    pub teacher_id: i32,
}

impl From<crate::entity::lesson::Model> for LessonResponse {
    fn from(m: crate::entity::lesson::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            start_time: m.start_time,
            end_time: m.end_time,
            subject_id: m.subject_id,
            class_id: m.class_id,
            teacher_id: m.teacher_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct LessonListItem {
    pub id: i32,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subject_name: String,
    pub class_name: String,
    pub teacher_name: String,
    pub teacher_surname: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LessonListResponse {
    pub data: Vec<LessonListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct LessonListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to lessons taught by this teacher.
    pub teacher_id: Option<i32>,
    /// Restrict to lessons held in this class.
    pub class_id: Option<i32>,
    /// Case-insensitive substring match on the lesson or subject name.
    pub search: Option<String>,
}

pub fn validate_create_lesson(req: &CreateLessonRequest) -> Result<(), AppError> {
    validate_required("lesson name", &req.name)?;
    validate_time_window(req.start_time, req.end_time, "start time", "end time")?;
    Ok(())
}

pub fn validate_update_lesson(req: &UpdateLessonRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required("lesson name", name)?;
    }
    // Cross-field time validation against stored values happens in the handler.
    if let (Some(start), Some(end)) = (req.start_time, req.end_time) {
        validate_time_window(start, end, "start time", "end time")?;
    }
    Ok(())
}
