use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{validate_required, validate_time_window};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateExamRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub lesson_id: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateExamRequest {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub lesson_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ExamResponse {
    pub id: i32,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub lesson_id: i32,
}

impl From<crate::entity::exam::Model> for ExamResponse {
    fn from(m: crate::entity::exam::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            start_time: m.start_time,
            end_time: m.end_time,
            lesson_id: m.lesson_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ExamListItem {
    pub id: i32,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subject_name: String,
    pub class_name: String,
    pub teacher_name: String,
    pub teacher_surname: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ExamListResponse {
    pub data: Vec<ExamListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ExamListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to exams of lessons held in this class.
    pub class_id: Option<i32>,
    /// Restrict to exams of lessons taught by this teacher.
    pub teacher_id: Option<i32>,
    /// Case-insensitive substring match on the lesson's subject name.
    pub search: Option<String>,
}

pub fn validate_create_exam(req: &CreateExamRequest) -> Result<(), AppError> {
    validate_required("title", &req.title)?;
    validate_time_window(req.start_time, req.end_time, "start time", "end time")?;
    Ok(())
}

pub fn validate_update_exam(req: &UpdateExamRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_required("title", title)?;
    }
    if let (Some(start), Some(end)) = (req.start_time, req.end_time) {
        validate_time_window(start, end, "start time", "end time")?;
    }
    Ok(())
}
