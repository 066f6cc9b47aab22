use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The viewer's role, resolved from a session token.
///
/// `None` is the role of an unresolved (missing, malformed or expired)
/// token: the most restrictive read scope and no write capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
    None,
}

impl Role {
    /// All roles that can hold a session.
    pub const AUTHENTICATED: &'static [Role] =
        &[Self::Admin, Self::Teacher, Self::Student, Self::Parent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
            Self::None => "none",
        }
    }

    /// True for any role backed by a signed-in principal.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::None
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role '{}', expected one of: admin, teacher, student, parent, none",
            self.invalid
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            "none" => Ok(Self::None),
            _ => Err(ParseRoleError {
                invalid: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_lowercase_tags() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        let parsed: Role = serde_json::from_str("\"parent\"").unwrap();
        assert_eq!(parsed, Role::Parent);
    }

    #[test]
    fn from_str_round_trips() {
        for role in Role::AUTHENTICATED {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn none_is_not_authenticated() {
        assert!(!Role::None.is_authenticated());
        assert!(Role::Parent.is_authenticated());
    }
}
