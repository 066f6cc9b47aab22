use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use super::shared::Pagination;
use super::shared::{
    validate_email, validate_new_password, validate_password_change, validate_required,
    validate_username,
};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateParentRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateParentRequest {
    pub username: Option<String>,
    /// Empty string means "leave unchanged".
    pub password: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParentResponse {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::parent::Model> for ParentResponse {
    fn from(m: crate::entity::parent::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            name: m.name,
            surname: m.surname,
            email: m.email,
            phone: m.phone,
            address: m.address,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct ParentListItem {
    pub id: i32,
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParentListResponse {
    pub data: Vec<ParentListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ParentListQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Case-insensitive substring match on name, surname or username.
    pub search: Option<String>,
}

pub fn validate_create_parent(req: &CreateParentRequest) -> Result<(), AppError> {
    validate_username(&req.username)?;
    validate_new_password(&req.password)?;
    validate_required("name", &req.name)?;
    validate_required("surname", &req.surname)?;
    validate_email(&req.email)?;
    validate_required("phone", &req.phone)?;
    validate_required("address", &req.address)?;
    Ok(())
}

pub fn validate_update_parent(req: &UpdateParentRequest) -> Result<(), AppError> {
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
    if let Some(ref phone) = req.phone {
        validate_required("phone", phone)?;
    }
    if let Some(ref address) = req.address {
        validate_required("address", address)?;
    }
    Ok(())
}
