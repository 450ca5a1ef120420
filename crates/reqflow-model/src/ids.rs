//! Typed identifiers
//!
//! Two families of ids:
//! - ULID-backed ids for entities the engine creates at runtime
//!   (sortable by creation time)
//! - String-backed ids for reference data authored by administrators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

macro_rules! ulid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            /// Generate a fresh id
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(s).map(Self)
            }
        }
    };
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

ulid_id!(
    /// Employee identifier
    EmployeeId
);
ulid_id!(
    /// Request identifier
    RequestId
);
ulid_id!(
    /// Task identifier
    TaskId
);
ulid_id!(
    /// Approval identifier
    ApprovalId
);
ulid_id!(
    /// Notification identifier
    NotificationId
);

string_id!(
    /// Application user identifier (requesters, approvers, assignees)
    UserId
);
string_id!(
    /// Checklist template identifier
    ChecklistTemplateId
);
string_id!(
    /// Task template identifier, unique within its checklist template
    TaskTemplateId
);
string_id!(
    /// Request type definition identifier
    RequestTypeId
);
string_id!(
    /// Managed system identifier
    SystemId
);
string_id!(
    /// Department identifier
    DepartmentId
);
string_id!(
    /// Access level identifier
    AccessLevelId
);
