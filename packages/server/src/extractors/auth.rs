use axum::{extract::FromRequestParts, http::request::Parts};
use common::{EntityKind, Role, capabilities};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// The current principal, resolved from the `Authorization: Bearer <token>`
/// header.
///
/// Resolution never rejects the request: a missing, malformed or expired
/// token yields the anonymous viewer (`Role::None`), whose read scope is
/// empty and whose write capabilities are all denied. Write handlers call
/// `require_create`/`require_update`/`require_delete`, which consult the
/// shared capability table.
pub struct Viewer {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Viewer {
            user_id: 0,
            username: String::new(),
            role: Role::None,
        }
    }

    pub fn require_create(&self, entity: EntityKind) -> Result<(), AppError> {
        if capabilities(self.role, entity).can_create {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_update(&self, entity: EntityKind) -> Result<(), AppError> {
        if capabilities(self.role, entity).can_update {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_delete(&self, entity: EntityKind) -> Result<(), AppError> {
        if capabilities(self.role, entity).can_delete {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// True if the viewer may open the entity's form at all.
    pub fn can_use_form(&self, entity: EntityKind) -> bool {
        let caps = capabilities(self.role, entity);
        caps.can_create || caps.can_update
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(auth_header) = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(Viewer::anonymous());
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Ok(Viewer::anonymous());
        };

        match jwt::verify(token, &state.config.auth.jwt_secret) {
            Ok(claims) => Ok(Viewer {
                user_id: claims.uid,
                username: claims.sub,
                role: claims.role,
            }),
            Err(_) => Ok(Viewer::anonymous()),
        }
    }
}
