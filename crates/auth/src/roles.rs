use core::str::FromStr;

use serde::{Deserialize, Serialize};

use campus_core::DomainError;

/// Role of a principal.
///
/// Closed set: adding a role means adding a variant here and its rows in
/// [`crate::policy::RULES`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::SchoolAdmin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::SchoolAdmin => "SCHOOL_ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Every role except SUPER_ADMIN acts inside exactly one school.
    pub fn requires_tenant(&self) -> bool {
        !self.is_super_admin()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation("role", format!("unknown role '{s}'")))
    }
}
