use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{validate_required, validate_time_window};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub lesson_id: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub lesson_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentResponse {
    pub id: i32,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub lesson_id: i32,
}

impl From<crate::entity::assignment::Model> for AssignmentResponse {
    fn from(m: crate::entity::assignment::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            start_date: m.start_date,
            due_date: m.due_date,
            lesson_id: m.lesson_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct AssignmentListItem {
    pub id: i32,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub subject_name: String,
    pub class_name: String,
    pub teacher_name: String,
    pub teacher_surname: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AssignmentListResponse {
    pub data: Vec<AssignmentListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AssignmentListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to assignments of lessons held in this class.
    pub class_id: Option<i32>,
    /// Restrict to assignments of lessons taught by this teacher.
    pub teacher_id: Option<i32>,
    /// Case-insensitive substring match on the lesson's subject name.
    pub search: Option<String>,
}

pub fn validate_create_assignment(req: &CreateAssignmentRequest) -> Result<(), AppError> {
    validate_required("title", &req.title)?;
    validate_time_window(req.start_date, req.due_date, "start date", "due date")?;
    Ok(())
}

pub fn validate_update_assignment(req: &UpdateAssignmentRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_required("title", title)?;
    }
    if let (Some(start), Some(due)) = (req.start_date, req.due_date) {
        validate_time_window(start, due, "start date", "due date")?;
    }
    Ok(())
}
