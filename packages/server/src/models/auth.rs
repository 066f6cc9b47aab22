use common::Role;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username of the account to log into.
    #[schema(example = "j_moriarty")]
    pub username: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token valid for 7 days.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// ID of the authenticated principal.
    #[schema(example = 42)]
    pub id: i32,
    /// Username.
    #[schema(example = "j_moriarty")]
    pub username: String,
    /// Resolved role.
    pub role: Role,
}

/// The current viewer, as resolved from the bearer token.
///
/// Unresolved tokens are reported as `role: none` with no identity, never as
/// an error.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub id: Option<i32>,
    pub username: Option<String>,
    pub role: Role,
}
