use sea_orm::FromQueryResult;
use serde::Serialize;

/// A `{id, name}` drop-down option.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct NamedOption {
    pub id: i32,
    pub name: String,
}

/// A `{id, name, surname}` drop-down option for people.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct PersonOption {
    pub id: i32,
    pub name: String,
    pub surname: String,
}

/// A `{id, level}` drop-down option for grades.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct GradeOption {
    pub id: i32,
    pub level: i32,
}

/// A `{id, title}` drop-down option for exams and assignments.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct TitledOption {
    pub id: i32,
    pub title: String,
}

/// The reference data an entity's form needs before it becomes usable.
///
/// Only the lists registered for the requested entity are present; the rest
/// are omitted from the JSON entirely.
#[derive(Default, Serialize, utoipa::ToSchema)]
pub struct FormOptionsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grades: Option<Vec<GradeOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<NamedOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<NamedOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teachers: Option<Vec<PersonOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<PersonOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<PersonOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lessons: Option<Vec<NamedOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exams: Option<Vec<TitledOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<TitledOption>>,
}
