//! Catalog report
//!
//! Summarizes what an engine would do with a catalog: who approves each
//! system, and how many tasks each request type generates.

use reqflow_catalog::{CatalogData, CatalogIssue};
use reqflow_core::{resolve_approver, EngineConfig};
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogReport {
    pub(crate) users: usize,
    pub(crate) departments: usize,
    pub(crate) access_levels: usize,
    pub(crate) systems: Vec<SystemLine>,
    pub(crate) request_types: Vec<RequestTypeLine>,
    pub(crate) errors: Vec<String>,
    pub(crate) warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SystemLine {
    pub(crate) name: String,
    pub(crate) policy: String,
    /// `None` when no approval is needed
    pub(crate) approver: Option<String>,
    pub(crate) fallback: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestTypeLine {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) applies_to: String,
    pub(crate) enabled: bool,
    pub(crate) hr_validation: bool,
    /// `None` when the checklist template is missing
    pub(crate) tasks: Option<usize>,
}

impl CatalogReport {
    pub(crate) fn build(data: &CatalogData, config: &EngineConfig) -> Self {
        let (errors, warnings): (Vec<CatalogIssue>, Vec<CatalogIssue>) =
            data.validate().into_iter().partition(CatalogIssue::is_error);

        let systems = data
            .systems
            .iter()
            .map(|system| {
                let policy = &system.approval_policy;
                let (approver, fallback) = if policy.requires_approval() {
                    match resolve_approver(policy, &data.users, config) {
                        Some(id) => (Some(id.to_string()), false),
                        None => (Some(config.default_approver_id.to_string()), true),
                    }
                } else {
                    (None, false)
                };
                SystemLine {
                    name: system.name.clone(),
                    policy: policy.to_string(),
                    approver,
                    fallback,
                }
            })
            .collect();

        let request_types = data
            .request_types
            .iter()
            .map(|definition| RequestTypeLine {
                id: definition.id.to_string(),
                name: definition.name.clone(),
                applies_to: format!("{:?}", definition.applies_to).to_lowercase(),
                enabled: definition.is_enabled,
                hr_validation: definition.requires_hr_validation,
                tasks: data
                    .checklist_templates
                    .iter()
                    .find(|t| t.id == definition.checklist_template_id)
                    .map(|t| t.task_templates.len()),
            })
            .collect();

        Self {
            users: data.users.len(),
            departments: data.departments.len(),
            access_levels: data.access_levels.len(),
            systems,
            request_types,
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    pub(crate) fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Catalog Report");
        let _ = writeln!(out, "==============");
        let _ = writeln!(
            out,
            "Users: {}  Departments: {}  Access levels: {}",
            self.users, self.departments, self.access_levels
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "Systems:");
        for system in &self.systems {
            match &system.approver {
                None => {
                    let _ = writeln!(out, "  {:<32} no approval", system.name);
                }
                Some(approver) => {
                    let _ = writeln!(
                        out,
                        "  {:<32} {} -> {}{}",
                        system.name,
                        system.policy,
                        approver,
                        if system.fallback { " (default approver)" } else { "" }
                    );
                }
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Request types:");
        for line in &self.request_types {
            let tasks = line
                .tasks
                .map_or_else(|| "missing template".to_string(), |n| format!("{n} task(s)"));
            let _ = writeln!(
                out,
                "  {:<28} {:<12} {}{}{}",
                line.id,
                line.applies_to,
                tasks,
                if line.hr_validation { ", HR validation" } else { "" },
                if line.enabled { "" } else { ", disabled" }
            );
        }

        if !self.errors.is_empty() || !self.warnings.is_empty() {
            let _ = writeln!(out);
            for error in &self.errors {
                let _ = writeln!(out, "error: {error}");
            }
            for warning in &self.warnings {
                let _ = writeln!(out, "warning: {warning}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"
[[users]]
id = "user_005"
samAccountName = "david.mas"
roles = ["Manager", "IT"]
departments = ["Informàtica"]

[[systems]]
id = "erp"
name = "ERP"
approvalPolicy = "Rol: Manager"

[[systems]]
id = "payroll"
name = "Payroll"
approvalPolicy = "Usuari: Nobody"

[[systems]]
id = "vpn"
name = "VPN"

[[checklistTemplates]]
id = "CLT_ACCESS"
name = "Access"

[[checklistTemplates.taskTemplates]]
id = "t1"
title = "Grant"
assigneeDepartment = "IT"

[[requestTypes]]
id = "access_request_std"
name = "Standard access"
appliesTo = "access"
checklistTemplateId = "CLT_ACCESS"
"#;

    #[test]
    fn reports_approvers_and_fallbacks() {
        let data = CatalogData::from_toml_str(CATALOG).unwrap();
        let report = CatalogReport::build(&data, &EngineConfig::new());

        let approvers: Vec<(Option<&str>, bool)> = report
            .systems
            .iter()
            .map(|s| (s.approver.as_deref(), s.fallback))
            .collect();
        assert_eq!(
            approvers,
            vec![
                (Some("user_005"), false),
                (Some("user_005"), true),
                (None, false)
            ]
        );
        assert_eq!(report.request_types[0].tasks, Some(1));
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.render_text().contains("(default approver)"));
    }
}
