use axum::{Json, extract::State};
use common::Role;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{admin, parent, student, teacher};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Viewer;
use crate::extractors::json::AppJson;
use crate::models::auth::{LoginRequest, LoginResponse, MeResponse, validate_login_request};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// A row from one of the four principal tables, reduced to what login needs.
struct Principal {
    id: i32,
    username: String,
    password_hash: String,
    role: Role,
}

/// Look the username up across the admin, teacher, student and parent tables.
async fn find_principal(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<Principal>, DbErr> {
    if let Some(m) = admin::Entity::find()
        .filter(admin::Column::Username.eq(username))
        .one(db)
        .await?
    {
        return Ok(Some(Principal {
            id: m.id,
            username: m.username,
            password_hash: m.password_hash,
            role: Role::Admin,
        }));
    }
    if let Some(m) = teacher::Entity::find()
        .filter(teacher::Column::Username.eq(username))
        .one(db)
        .await?
    {
        return Ok(Some(Principal {
            id: m.id,
            username: m.username,
            password_hash: m.password_hash,
            role: Role::Teacher,
        }));
    }
    if let Some(m) = student::Entity::find()
        .filter(student::Column::Username.eq(username))
        .one(db)
        .await?
    {
        return Ok(Some(Principal {
            id: m.id,
            username: m.username,
            password_hash: m.password_hash,
            role: Role::Student,
        }));
    }
    if let Some(m) = parent::Entity::find()
        .filter(parent::Column::Username.eq(username))
        .one(db)
        .await?
    {
        return Ok(Some(Principal {
            id: m.id,
            username: m.username,
            password_hash: m.password_hash,
            role: Role::Parent,
        }));
    }
    Ok(None)
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and receive a bearer token",
    description = "Checks the username across the admin, teacher, student and parent accounts and returns a signed JWT carrying the resolved role.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unknown username or wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let username = payload.username.trim();

    let principal = find_principal(&state.db, username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &principal.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        principal.id,
        &principal.username,
        principal.role,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        id: principal.id,
        username: principal.username,
        role: principal.role,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Return the current viewer",
    description = "Reports the identity and role resolved from the bearer token. An unresolvable token is reported as role `none`, not as an error.",
    responses(
        (status = 200, description = "The resolved viewer", body = MeResponse),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(viewer), fields(role = %viewer.role))]
pub async fn me(viewer: Viewer) -> Json<MeResponse> {
    if viewer.role == Role::None {
        return Json(MeResponse {
            id: None,
            username: None,
            role: Role::None,
        });
    }
    Json(MeResponse {
        id: Some(viewer.user_id),
        username: Some(viewer.username),
        role: viewer.role,
    })
}
