//! System approval policies
//!
//! Catalog files carry policies in their legacy string form:
//! - `"Rol: <role>"` - any user holding the role (preferring IT staff)
//! - `"Usuari: <name>"` - one named user
//! - empty / absent - no approval needed
//!
//! Any other non-empty text still demands approval but names no one, so
//! routing always falls back to the default approver.

use serde::{Deserialize, Serialize};
use std::fmt;

const ROLE_PREFIX: &str = "Rol:";
const USER_PREFIX: &str = "Usuari:";

/// Who must approve access to a system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApproverPolicy {
    #[default]
    None,
    Role(String),
    NamedUser(String),
    /// Unrecognised policy text
    Custom(String),
}

impl ApproverPolicy {
    /// Whether requesting this system needs an approval
    #[inline]
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Parse the legacy string form. Never fails.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            Self::None
        } else if let Some(role) = raw.strip_prefix(ROLE_PREFIX) {
            Self::Role(role.trim().to_string())
        } else if let Some(user) = raw.strip_prefix(USER_PREFIX) {
            Self::NamedUser(user.trim().to_string())
        } else {
            Self::Custom(raw.to_string())
        }
    }
}

impl From<String> for ApproverPolicy {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ApproverPolicy> for String {
    fn from(policy: ApproverPolicy) -> Self {
        policy.to_string()
    }
}

impl fmt::Display for ApproverPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Role(role) => write!(f, "{ROLE_PREFIX} {role}"),
            Self::NamedUser(user) => write!(f, "{USER_PREFIX} {user}"),
            Self::Custom(text) => f.write_str(text),
        }
    }
}
