use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Tag for each record type exposed through the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Teacher,
    Student,
    Parent,
    Subject,
    Class,
    Lesson,
    Exam,
    Assignment,
    Result,
    Attendance,
    Event,
    Announcement,
}

impl EntityKind {
    pub const ALL: &'static [EntityKind] = &[
        Self::Teacher,
        Self::Student,
        Self::Parent,
        Self::Subject,
        Self::Class,
        Self::Lesson,
        Self::Exam,
        Self::Assignment,
        Self::Result,
        Self::Attendance,
        Self::Event,
        Self::Announcement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Parent => "parent",
            Self::Subject => "subject",
            Self::Class => "class",
            Self::Lesson => "lesson",
            Self::Exam => "exam",
            Self::Assignment => "assignment",
            Self::Result => "result",
            Self::Attendance => "attendance",
            Self::Event => "event",
            Self::Announcement => "announcement",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid entity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEntityKindError {
    invalid: String,
}

impl fmt::Display for ParseEntityKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity '{}'", self.invalid)
    }
}

impl std::error::Error for ParseEntityKindError {}

impl FromStr for EntityKind {
    type Err = ParseEntityKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEntityKindError {
                invalid: s.to_string(),
            })
    }
}

/// Write capabilities of one role on one entity.
///
/// The same table is consulted by the server before any mutation and by the
/// client when deciding whether to show an affordance, so the two can never
/// disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Capabilities {
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        can_create: false,
        can_update: false,
        can_delete: false,
    };

    pub const FULL: Capabilities = Capabilities {
        can_create: true,
        can_update: true,
        can_delete: true,
    };

    pub fn any(&self) -> bool {
        self.can_create || self.can_update || self.can_delete
    }
}

/// The capability table.
///
/// Admins manage every entity. Teachers manage the records that hang off
/// their own lessons (the ownership check itself is the server's job);
/// students and parents never write.
pub fn capabilities(role: Role, entity: EntityKind) -> Capabilities {
    use EntityKind::*;

    match role {
        Role::Admin => Capabilities::FULL,
        Role::Teacher => match entity {
            Lesson | Exam | Assignment | Result | Attendance => Capabilities::FULL,
            _ => Capabilities::NONE,
        },
        Role::Student | Role::Parent | Role::None => Capabilities::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_full_capabilities_everywhere() {
        for kind in EntityKind::ALL {
            assert_eq!(capabilities(Role::Admin, *kind), Capabilities::FULL);
        }
    }

    #[test]
    fn teacher_writes_only_lesson_linked_entities() {
        assert!(capabilities(Role::Teacher, EntityKind::Exam).can_create);
        assert!(capabilities(Role::Teacher, EntityKind::Attendance).can_delete);
        assert!(!capabilities(Role::Teacher, EntityKind::Student).any());
        assert!(!capabilities(Role::Teacher, EntityKind::Announcement).any());
    }

    #[test]
    fn read_only_roles_never_write() {
        for kind in EntityKind::ALL {
            assert!(!capabilities(Role::Student, *kind).any());
            assert!(!capabilities(Role::Parent, *kind).any());
            assert!(!capabilities(Role::None, *kind).any());
        }
    }

    #[test]
    fn entity_tags_parse() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), *kind);
        }
        assert!("grade".parse::<EntityKind>().is_err());
    }
}
