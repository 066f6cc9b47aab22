use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{double_option, validate_required};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateClassRequest {
    pub name: String,
    pub capacity: i32,
    pub grade_id: i32,
    #[serde(default)]
    pub supervisor_id: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub grade_id: Option<i32>,
    /// Omit to leave unchanged, null to clear, value to set.
    #[serde(default, deserialize_with = "double_option")]
    pub supervisor_id: Option<Option<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassResponse {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub grade_id: i32,
    pub supervisor_id: Option<i32>,
}

impl From<crate::entity::class::Model> for ClassResponse {
    fn from(m: crate::entity::class::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            capacity: m.capacity,
            grade_id: m.grade_id,
            supervisor_id: m.supervisor_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ClassListItem {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub grade_level: i32,
    pub supervisor_name: Option<String>,
    pub supervisor_surname: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClassListResponse {
    pub data: Vec<ClassListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ClassListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to classes supervised by this teacher.
    pub supervisor_id: Option<i32>,
    /// Case-insensitive substring match on the class name.
    pub search: Option<String>,
}

pub fn validate_create_class(req: &CreateClassRequest) -> Result<(), AppError> {
    validate_required("class name", &req.name)?;
    if req.capacity < 1 {
        return Err(AppError::Validation("capacity must be at least 1".into()));
    }
    Ok(())
}

pub fn validate_update_class(req: &UpdateClassRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required("class name", name)?;
    }
    if let Some(capacity) = req.capacity
        && capacity < 1
    {
        return Err(AppError::Validation("capacity must be at least 1".into()));
    }
    Ok(())
}
