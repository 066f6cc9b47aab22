use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

/// Fixed page size of every list endpoint.
pub const PAGE_SIZE: u64 = 10;

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page (fixed).
    #[schema(example = 10)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 5)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, total: u64) -> Self {
        Pagination {
            page,
            per_page: PAGE_SIZE,
            total,
            total_pages: total.div_ceil(PAGE_SIZE),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring predicate on a (possibly table-qualified) column.
pub fn ci_contains<C: IntoColumnRef>(col: C, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(term.trim()).to_lowercase());
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a username (3-20 characters, letters, digits and underscores).
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err(AppError::Validation(
            "username must be 3-20 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "username must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(())
}

/// Validate a new password (8-128 characters).
pub fn validate_new_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Validate the password field of an update payload. Absent or empty means
/// "leave unchanged"; anything else must be a valid new password.
pub fn validate_password_change(password: &Option<String>) -> Result<(), AppError> {
    match password {
        Some(p) if !p.is_empty() => validate_new_password(p),
        _ => Ok(()),
    }
}

/// Validate an optional email address.
pub fn validate_email(email: &Option<String>) -> Result<(), AppError> {
    if let Some(email) = email {
        let ok = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if !ok {
            return Err(AppError::Validation("email address is invalid".into()));
        }
    }
    Ok(())
}

/// Validate a required free-text field (non-blank, at most 256 characters).
pub fn validate_required(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate a score (0-100).
pub fn validate_score(score: i32) -> Result<(), AppError> {
    if !(0..=100).contains(&score) {
        return Err(AppError::Validation("score must be between 0 and 100".into()));
    }
    Ok(())
}

/// Validate that a time window ends strictly after it starts.
pub fn validate_time_window<T: PartialOrd>(
    start: T,
    end: T,
    start_name: &str,
    end_name: &str,
) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation(format!(
            "{end_name} must be after {start_name}"
        )));
    }
    Ok(())
}

/// Validate an ID list for set-valued fields (no duplicates, sane length).
pub fn validate_id_set(ids: &[i32], name: &str) -> Result<(), AppError> {
    if ids.len() > 500 {
        return Err(AppError::Validation(format!("too many {name}: max 500")));
    }
    let mut seen = std::collections::HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!("duplicate {name} ID: {id}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
        assert!(validate_username("has space").is_err());
    }

    #[test]
    fn password_change_treats_empty_as_unchanged() {
        assert!(validate_password_change(&None).is_ok());
        assert!(validate_password_change(&Some(String::new())).is_ok());
        assert!(validate_password_change(&Some("short".into())).is_err());
        assert!(validate_password_change(&Some("long enough".into())).is_ok());
    }

    #[test]
    fn score_bounds() {
        assert!(validate_score(0).is_ok());
        assert!(validate_score(100).is_ok());
        assert!(validate_score(-1).is_err());
        assert!(validate_score(101).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email(&None).is_ok());
        assert!(validate_email(&Some("a@b.com".into())).is_ok());
        assert!(validate_email(&Some("not-an-email".into())).is_err());
        assert!(validate_email(&Some("a b@c.com".into())).is_err());
    }

    #[test]
    fn time_window_is_strict() {
        assert!(validate_time_window(1, 2, "start", "end").is_ok());
        assert!(validate_time_window(2, 2, "start", "end").is_err());
        assert!(validate_time_window(3, 2, "start", "end").is_err());
    }

    #[test]
    fn like_escaping() {
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
    }
}
