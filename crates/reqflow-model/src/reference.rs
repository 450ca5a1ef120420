//! Reference data maintained by administrators
//!
//! - Application users (approver resolution)
//! - Managed systems and their approval policies
//! - Checklist templates and request type definitions
//! - Departments and access levels

use crate::ids::{
    AccessLevelId, ChecklistTemplateId, DepartmentId, RequestTypeId, SystemId, TaskTemplateId,
    UserId,
};
use crate::policy::ApproverPolicy;
use crate::request::RequestKind;
use serde::{Deserialize, Serialize};

/// An application user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Directory login
    pub sam_account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Department names
    #[serde(default)]
    pub departments: Vec<String>,
}

impl User {
    #[inline]
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Display name, falling back to the login
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.sam_account_name)
    }
}

/// A system access can be requested for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub id: SystemId,
    pub name: String,
    #[serde(default, alias = "requiresApprovalBy")]
    pub approval_policy: ApproverPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLevel {
    pub id: AccessLevelId,
    pub name: String,
}

/// Blueprint for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: TaskTemplateId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Department code or name, copied verbatim onto generated tasks
    pub assignee_department: String,
    /// 1-based position; the list position is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// Ordered list of task templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistTemplate {
    pub id: ChecklistTemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub task_templates: Vec<TaskTemplate>,
}

impl ChecklistTemplate {
    /// Task templates with their effective order, sorted by it
    #[must_use]
    pub fn ordered_tasks(&self) -> Vec<(u32, &TaskTemplate)> {
        let mut tasks: Vec<(u32, &TaskTemplate)> = self
            .task_templates
            .iter()
            .zip(1u32..)
            .map(|(t, position)| (t.order.unwrap_or(position), t))
            .collect();
        tasks.sort_by_key(|(order, _)| *order);
        tasks
    }
}

/// Category a request type definition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestCategory {
    Onboarding,
    Offboarding,
    Access,
    Other,
}

impl RequestCategory {
    #[must_use]
    pub fn admits(self, kind: RequestKind) -> bool {
        matches!(
            (self, kind),
            (Self::Onboarding, RequestKind::Onboarding)
                | (Self::Offboarding, RequestKind::Offboarding)
                | (Self::Access, RequestKind::Access)
        )
    }
}

/// Admin-configured request variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTypeDefinition {
    pub id: RequestTypeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub applies_to: RequestCategory,
    pub checklist_template_id: ChecklistTemplateId,
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    /// IT work is followed by an HR final validation step
    #[serde(default)]
    pub requires_hr_validation: bool,
}

fn enabled_by_default() -> bool {
    true
}
