//! Roles carried by accounts and embedded in session tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Baseline role given to every self-registered account.
    Academico,
    Professor,
    Admin,
}

impl Role {
    pub const BASELINE: Role = Role::Academico;

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Academico => "ACADEMICO",
            Role::Professor => "PROFESSOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACADEMICO" => Ok(Role::Academico),
            "PROFESSOR" => Ok(Role::Professor),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Sort and dedupe; an empty or missing set becomes `{ACADEMICO}`.
pub fn normalize_roles(roles: Option<Vec<Role>>) -> Vec<Role> {
    let mut roles = roles.unwrap_or_default();
    roles.sort();
    roles.dedup();
    if roles.is_empty() {
        roles.push(Role::BASELINE);
    }
    roles
}
