//! Engine configuration
//!
//! Everything the lifecycle rules treat as a constant lives here:
//! - Canonical IT and HR department names, plus the short codes templates use
//! - Default approver and the roles used to resolve approvers
//! - Validation thresholds for request forms
//!
//! Loadable from TOML; every field has a default.

use crate::error::EngineError;
use reqflow_model::UserId;
use serde::{Deserialize, Serialize};

/// IT and HR department naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DepartmentConfig {
    /// Canonical IT department name
    pub it: String,
    /// Canonical HR department name
    pub hr: String,
    /// Other names that mean IT (template codes)
    pub it_aliases: Vec<String>,
    /// Other names that mean HR (template codes)
    pub hr_aliases: Vec<String>,
}

impl DepartmentConfig {
    /// Whether `department` names the IT department
    #[must_use]
    pub fn is_it(&self, department: &str) -> bool {
        department == self.it || self.it_aliases.iter().any(|a| a == department)
    }

    /// Whether `department` names the HR department
    #[must_use]
    pub fn is_hr(&self, department: &str) -> bool {
        department == self.hr || self.hr_aliases.iter().any(|a| a == department)
    }

    /// Whether two names refer to the same department
    #[must_use]
    pub fn same(&self, a: &str, b: &str) -> bool {
        a == b || (self.is_it(a) && self.is_it(b)) || (self.is_hr(a) && self.is_hr(b))
    }
}

impl Default for DepartmentConfig {
    fn default() -> Self {
        Self {
            it: "Informàtica".to_string(),
            hr: "Recursos Humans".to_string(),
            it_aliases: vec!["IT".to_string()],
            hr_aliases: vec!["RRHH".to_string(), "HR".to_string()],
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub departments: DepartmentConfig,
    /// Approver used when no user matches a system's policy
    pub default_approver_id: UserId,
    /// Role marking IT staff when resolving approvers
    pub it_role: String,
    /// Role marking managers when resolving approvers
    pub manager_role: String,
    /// Upper bound on items in one access request
    pub max_access_items: usize,
    pub min_justification_len: usize,
    pub min_reason_len: usize,
    pub min_summary_len: usize,
    /// Attached to requests touching systems with different approval policies
    pub multi_system_approval_note: String,
    /// Safety bound on status reconciliation steps per mutation
    pub max_reconcile_steps: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing fields keep their defaults
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the text does not parse
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// With default approver
    #[inline]
    #[must_use]
    pub fn with_default_approver(mut self, approver: impl Into<UserId>) -> Self {
        self.default_approver_id = approver.into();
        self
    }

    /// With department naming
    #[inline]
    #[must_use]
    pub fn with_departments(mut self, departments: DepartmentConfig) -> Self {
        self.departments = departments;
        self
    }

    /// With maximum access items per request
    #[inline]
    #[must_use]
    pub fn with_max_access_items(mut self, max: usize) -> Self {
        self.max_access_items = max;
        self
    }

    /// With multi-policy note text
    #[inline]
    #[must_use]
    pub fn with_multi_system_note(mut self, note: impl Into<String>) -> Self {
        self.multi_system_approval_note = note.into();
        self
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.max_access_items == 0 {
            return Err(EngineError::Config("maxAccessItems must be at least 1".to_string()));
        }
        if self.max_reconcile_steps == 0 {
            return Err(EngineError::Config(
                "maxReconcileSteps must be at least 1".to_string(),
            ));
        }
        if self.departments.it == self.departments.hr {
            return Err(EngineError::Config(
                "IT and HR departments must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            departments: DepartmentConfig::default(),
            default_approver_id: UserId::from("user_005"),
            it_role: "IT".to_string(),
            manager_role: "Manager".to_string(),
            max_access_items: 5,
            min_justification_len: 10,
            min_reason_len: 10,
            min_summary_len: 5,
            multi_system_approval_note: "This request covers systems with different approval \
                requirements; the designated approver must review all of them."
                .to_string(),
            max_reconcile_steps: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_match_canonical_names() {
        let departments = DepartmentConfig::default();
        assert!(departments.is_it("IT"));
        assert!(departments.is_it("Informàtica"));
        assert!(departments.is_hr("RRHH"));
        assert!(!departments.is_hr("IT"));
        assert!(departments.same("RRHH", "Recursos Humans"));
        assert!(!departments.same("IT", "Recursos Humans"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
defaultApproverId = "user_009"
maxAccessItems = 3

[departments]
it = "Sistemes"
"#,
        )
        .unwrap();
        assert_eq!(config.default_approver_id, UserId::from("user_009"));
        assert_eq!(config.max_access_items, 3);
        assert_eq!(config.min_justification_len, 10);
        assert_eq!(config.departments.it, "Sistemes");
        assert_eq!(config.departments.hr, "Recursos Humans");
    }

    #[test]
    fn rejects_zero_item_limit() {
        assert!(EngineConfig::from_toml_str("maxAccessItems = 0").is_err());
    }
}
