use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{validate_id_set, validate_required};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSubjectRequest {
    pub name: String,
    /// Teachers assigned to this subject.
    #[serde(default)]
    pub teacher_ids: Vec<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateSubjectRequest {
    pub name: Option<String>,
    /// Replaces the full teacher assignment when present.
    pub teacher_ids: Option<Vec<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectResponse {
    pub id: i32,
    pub name: String,
    pub teacher_ids: Vec<i32>,
}

impl SubjectResponse {
    pub fn from_model(m: crate::entity::subject::Model, teacher_ids: Vec<i32>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            teacher_ids,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct SubjectListItem {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SubjectListResponse {
    pub data: Vec<SubjectListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct SubjectListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Case-insensitive substring match on the subject name.
    pub search: Option<String>,
}

pub fn validate_create_subject(req: &CreateSubjectRequest) -> Result<(), AppError> {
    validate_required("subject name", &req.name)?;
    validate_id_set(&req.teacher_ids, "teacher")?;
    Ok(())
}

pub fn validate_update_subject(req: &UpdateSubjectRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required("subject name", name)?;
    }
    if let Some(ref teacher_ids) = req.teacher_ids {
        validate_id_set(teacher_ids, "teacher")?;
    }
    Ok(())
}
