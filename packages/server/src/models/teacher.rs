use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::entity::Sex;
use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{
    validate_email, validate_id_set, validate_new_password, validate_password_change,
    validate_required, validate_username,
};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeacherRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
    #[serde(default)]
    pub img: Option<String>,
    pub blood_type: String,
    pub sex: Sex,
    pub birthday: NaiveDate,
    /// Subjects this teacher is assigned to.
    #[serde(default)]
    pub subject_ids: Vec<i32>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTeacherRequest {
    pub username: Option<String>,
    /// Empty string means "leave unchanged".
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub img: Option<String>,
    pub blood_type: Option<String>,
    pub sex: Option<Sex>,
    pub birthday: Option<NaiveDate>,
    /// Replaces the full subject assignment when present.
    pub subject_ids: Option<Vec<i32>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeacherResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub img: Option<String>,
    pub blood_type: String,
    pub sex: Sex,
    pub birthday: NaiveDate,
    pub subject_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
}

impl TeacherResponse {
    pub fn from_model(m: crate::entity::teacher::Model, subject_ids: Vec<i32>) -> Self {
        Self {
            id: m.id,
            username: m.username,
            name: m.name,
            surname: m.surname,
            email: m.email,
            phone: m.phone,
            address: m.address,
            img: m.img,
            blood_type: m.blood_type,
            sex: m.sex,
            birthday: m.birthday,
            subject_ids,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct TeacherListItem {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: String,
    pub img: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeacherListResponse {
    pub data: Vec<TeacherListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct TeacherListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Restrict to teachers with a lesson in this class.
    pub class_id: Option<i32>,
    /// Case-insensitive substring match on name, surname or username.
    pub search: Option<String>,
}

pub fn validate_create_teacher(req: &CreateTeacherRequest) -> Result<(), AppError> {
    validate_username(&req.username)?;
    validate_new_password(&req.password)?;
    validate_required("name", &req.name)?;
    validate_required("surname", &req.surname)?;
    validate_email(&req.email)?;
    validate_required("blood type", &req.blood_type)?;
    validate_id_set(&req.subject_ids, "subject")?;
    Ok(())
}

pub fn validate_update_teacher(req: &UpdateTeacherRequest) -> Result<(), AppError> {
    if let Some(ref username) = req.username {
        validate_username(username)?;
    }
    validate_password_change(&req.password)?;
    if let Some(ref name) = req.name {
        validate_required("name", name)?;
    }
    if let Some(ref surname) = req.surname {
        validate_required("surname", surname)?;
    }
    validate_email(&req.email)?;
    if let Some(ref blood_type) = req.blood_type {
        validate_required("blood type", blood_type)?;
    }
    if let Some(ref subject_ids) = req.subject_ids {
        validate_id_set(subject_ids, "subject")?;
    }
    Ok(())
}
