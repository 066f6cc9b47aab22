use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::validate_score;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateResultRequest {
    pub score: i32,
    pub student_id: i32,
    /// Exactly one of `exam_id` and `assignment_id` must be set.
    #[serde(default)]
    pub exam_id: Option<i32>,
    #[serde(default)]
    pub assignment_id: Option<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateResultRequest {
    pub score: Option<i32>,
    pub student_id: Option<i32>,
    /// Omit to leave unchanged, null to clear, value to set. The updated row
    /// must still reference exactly one of exam and assignment.
    #[serde(default, deserialize_with = "super::shared::double_option")]
    pub exam_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "super::shared::double_option")]
    pub assignment_id: Option<Option<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResultResponse {
    pub id: i32,
    pub score: i32,
    pub student_id: i32,
    pub exam_id: Option<i32>,
    pub assignment_id: Option<i32>,
}

impl From<crate::entity::result::Model> for ResultResponse {
    fn from(m: crate::entity::result::Model) -> Self {
        Self {
            id: m.id,
            score: m.score,
            student_id: m.student_id,
            exam_id: m.exam_id,
            assignment_id: m.assignment_id,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ResultListItem {
    pub id: i32,
    pub score: i32,
    pub student_name: String,
    pub student_surname: String,
    pub exam_title: Option<String>,
    pub assignment_title: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ResultListResponse {
    pub data: Vec<ResultListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ResultListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to one student.
    pub student_id: Option<i32>,
    /// Case-insensitive substring match on the student name or exam title.
    pub search: Option<String>,
}

pub fn validate_create_result(req: &CreateResultRequest) -> Result<(), AppError> {
    validate_score(req.score)?;
    validate_exactly_one(req.exam_id, req.assignment_id)
}

pub fn validate_update_result(req: &UpdateResultRequest) -> Result<(), AppError> {
    if let Some(score) = req.score {
        validate_score(score)?;
    }
    Ok(())
}

/// A result must reference exactly one of an exam or an assignment.
pub fn validate_exactly_one(
    exam_id: Option<i32>,
    assignment_id: Option<i32>,
) -> Result<(), AppError> {
    match (exam_id, assignment_id) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        (None, None) => Err(AppError::Validation(
            "one of exam_id and assignment_id is required".into(),
        )),
        (Some(_), Some(_)) => Err(AppError::Validation(
            "exam_id and assignment_id are mutually exclusive".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_must_reference_exactly_one_target() {
        assert!(validate_exactly_one(Some(1), None).is_ok());
        assert!(validate_exactly_one(None, Some(2)).is_ok());
        assert!(validate_exactly_one(None, None).is_err());
        assert!(validate_exactly_one(Some(1), Some(2)).is_err());
    }
}
