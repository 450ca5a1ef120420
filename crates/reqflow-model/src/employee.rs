//! Employees: the people requests are about

use crate::ids::{EmployeeId, RequestId};
use serde::{Deserialize, Serialize};

/// Employment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmployeeStatus {
    /// Currently employed
    #[default]
    Active,
    /// Offboarded (or being offboarded)
    Inactive,
}

/// A person known to HR. Employees are never deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    /// National id, unique across employees
    pub nif: String,
    pub department: String,
    pub role: String,
    pub status: EmployeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offboarding_request_id: Option<RequestId>,
}

impl Employee {
    /// Create an active employee with a fresh id
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        nif: impl Into<String>,
        department: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            id: EmployeeId::new(),
            full_name: full_name.into(),
            nif: nif.into(),
            department: department.into(),
            role: role.into(),
            status: EmployeeStatus::Active,
            onboarding_request_id: None,
            offboarding_request_id: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}
