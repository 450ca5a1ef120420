//! Filing forms and their input checks
//!
//! Forms are validated before the engine touches the catalog or the store;
//! a failing form creates nothing.

use crate::config::EngineConfig;
use crate::error::ValidationError;
use chrono::NaiveDate;
use reqflow_model::{EmployeeId, RequestTypeId, RequestedAccessItem};
use serde::{Deserialize, Serialize};

/// New hire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingForm {
    pub request_type_id: RequestTypeId,
    pub full_name: String,
    pub nif: String,
    pub department: String,
    pub role: String,
}

impl OnboardingForm {
    /// # Errors
    /// Returns the first empty required field
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("fullName", &self.full_name)?;
        require("nif", &self.nif)?;
        require("department", &self.department)?;
        require("role", &self.role)
    }
}

/// Leaver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffboardingForm {
    pub request_type_id: RequestTypeId,
    pub employee_id: EmployeeId,
    pub last_day: NaiveDate,
    pub reason: String,
}

impl OffboardingForm {
    /// # Errors
    /// Returns error if the reason is too short
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ValidationError> {
        min_len("reason", &self.reason, config.min_reason_len)
    }
}

/// System access for an existing employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessForm {
    pub request_type_id: RequestTypeId,
    pub target_employee_id: EmployeeId,
    pub items: Vec<RequestedAccessItem>,
}

impl AccessForm {
    /// # Errors
    /// Returns error on a bad item count, empty system or level, or a
    /// justification that is too short
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ValidationError> {
        let count = self.items.len();
        if count == 0 || count > config.max_access_items {
            return Err(ValidationError::AccessItemCount {
                count,
                max: config.max_access_items,
            });
        }
        for item in &self.items {
            require("system", &item.system)?;
            require("accessLevel", &item.access_level)?;
            min_len("justification", &item.justification, config.min_justification_len)?;
        }
        Ok(())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(())
    }
}

pub(crate) fn min_len(field: &'static str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        Err(ValidationError::TooShort { field, min })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn access(items: usize, justification: &str) -> AccessForm {
        AccessForm {
            request_type_id: RequestTypeId::from("access_request_std"),
            target_employee_id: EmployeeId::new(),
            items: (0..items)
                .map(|i| RequestedAccessItem::new(format!("SYS{i}"), "Read", justification))
                .collect(),
        }
    }

    #[test]
    fn access_item_bounds() {
        let config = EngineConfig::default();
        assert_eq!(
            access(0, "monthly reporting").validate(&config),
            Err(ValidationError::AccessItemCount { count: 0, max: 5 })
        );
        assert_eq!(
            access(6, "monthly reporting").validate(&config),
            Err(ValidationError::AccessItemCount { count: 6, max: 5 })
        );
        assert!(access(1, "monthly reporting").validate(&config).is_ok());
        assert!(access(5, "monthly reporting").validate(&config).is_ok());
    }

    #[test]
    fn short_justification_rejected() {
        assert_eq!(
            access(1, "  too short ").validate(&EngineConfig::default()),
            Err(ValidationError::TooShort {
                field: "justification",
                min: 10
            })
        );
    }

    #[test]
    fn onboarding_requires_every_field() {
        let form = OnboardingForm {
            request_type_id: RequestTypeId::from("onboarding_general"),
            full_name: "Laura Vidal".to_string(),
            nif: " ".to_string(),
            department: "Finances".to_string(),
            role: "Analyst".to_string(),
        };
        assert_eq!(form.validate(), Err(ValidationError::Empty { field: "nif" }));
    }
}
