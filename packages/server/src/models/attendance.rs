use chrono::NaiveDate;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAttendanceRequest {
    pub date: NaiveDate,
    pub present: bool,
    pub student_id: i32,
    pub lesson_id: i32,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAttendanceRequest {
    pub date: Option<NaiveDate>,
    pub present: Option<bool>,
    pub student_id: Option<i32>,
    pub lesson_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttendanceResponse {
    pub id: i32,
    pub date: NaiveDate,
    pub present: bool,
    pub student_id: i32,
    pub lesson_id: i32,
}

impl From<crate::entity::attendance::Model> for AttendanceResponse {
    fn from(m: crate::entity::attendance::Model) -> Self {
        Self {
            id: m.id,
            date: m.date,
            present: m.present,
            student_id: m.student_id,
            lesson_id: m.lesson_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct AttendanceListItem {
    pub id: i32,
    pub date: NaiveDate,
    pub present: bool,
    pub student_name: String,
    pub student_surname: String,
    pub lesson_name: String,
    pub class_name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct AttendanceListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to one student.
    pub student_id: Option<i32>,
    /// Restrict to one lesson.
    pub lesson_id: Option<i32>,
    /// Restrict to lessons held in this class.
    pub class_id: Option<i32>,
    /// Case-insensitive substring match on the lesson's class name.
    pub search: Option<String>,
}

pub fn validate_create_attendance(_req: &CreateAttendanceRequest) -> Result<(), AppError> {
    // All fields are type-checked by deserialization; referential checks
    // happen against the database.
    Ok(())
}
