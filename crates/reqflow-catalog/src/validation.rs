//! Catalog consistency rules
//!
//! Checked on every load and every admin upsert:
//! - Task template orders are 1-based and contiguous within a template
//! - Ids are unique per entity kind; task template ids per template
//! - Request types reference an existing checklist template
//! - System names are unique (access items refer to systems by name)
//!
//! Named-user policies that match nobody are only warnings: routing falls
//! back to the default approver for them.

use crate::data::CatalogData;
use indexmap::IndexMap;
use reqflow_model::{ApproverPolicy, ChecklistTemplate};
use std::collections::HashSet;

/// One finding from [`CatalogData::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogIssue {
    /// Task orders skip, repeat or do not start at 1
    #[error("checklist template {template}: task order {found} found where {expected} was expected")]
    NonContiguousOrder {
        template: String,
        expected: u32,
        found: u32,
    },

    #[error("checklist template {template}: duplicate task template id {task}")]
    DuplicateTaskTemplate { template: String, task: String },

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("request type {request_type} references unknown checklist template {template}")]
    UnknownChecklistTemplate {
        request_type: String,
        template: String,
    },

    #[error("system name {name} is used {count} times")]
    DuplicateSystemName { name: String, count: usize },

    #[error("system {system} names approver {user}, who is not a known user")]
    UnresolvableNamedUser { system: String, user: String },
}

impl CatalogIssue {
    /// Errors block loading; everything else is reported and tolerated
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::UnresolvableNamedUser { .. })
    }
}

impl CatalogData {
    /// Run every catalog rule, returning all findings
    #[must_use]
    pub fn validate(&self) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();

        for template in &self.checklist_templates {
            check_template(template, &mut issues);
        }

        check_unique(
            "checklist template",
            self.checklist_templates.iter().map(|t| t.id.as_str()),
            &mut issues,
        );
        check_unique(
            "request type",
            self.request_types.iter().map(|t| t.id.as_str()),
            &mut issues,
        );
        check_unique("system", self.systems.iter().map(|s| s.id.as_str()), &mut issues);
        check_unique("user", self.users.iter().map(|u| u.id.as_str()), &mut issues);
        check_unique(
            "department",
            self.departments.iter().map(|d| d.id.as_str()),
            &mut issues,
        );
        check_unique(
            "access level",
            self.access_levels.iter().map(|l| l.id.as_str()),
            &mut issues,
        );

        for definition in &self.request_types {
            let known = self
                .checklist_templates
                .iter()
                .any(|t| t.id == definition.checklist_template_id);
            if !known {
                issues.push(CatalogIssue::UnknownChecklistTemplate {
                    request_type: definition.id.to_string(),
                    template: definition.checklist_template_id.to_string(),
                });
            }
        }

        let mut names: IndexMap<&str, usize> = IndexMap::new();
        for system in &self.systems {
            *names.entry(system.name.as_str()).or_default() += 1;
        }
        issues.extend(
            names
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(name, count)| CatalogIssue::DuplicateSystemName {
                    name: name.to_string(),
                    count,
                }),
        );

        for system in &self.systems {
            if let ApproverPolicy::NamedUser(user) = &system.approval_policy {
                let known = self.users.iter().any(|u| {
                    u.name.as_deref() == Some(user.as_str()) || &u.sam_account_name == user
                });
                if !known {
                    issues.push(CatalogIssue::UnresolvableNamedUser {
                        system: system.name.clone(),
                        user: user.clone(),
                    });
                }
            }
        }

        issues
    }
}

fn check_template(template: &ChecklistTemplate, issues: &mut Vec<CatalogIssue>) {
    for (expected, (found, _)) in (1u32..).zip(template.ordered_tasks()) {
        if found != expected {
            issues.push(CatalogIssue::NonContiguousOrder {
                template: template.id.to_string(),
                expected,
                found,
            });
            break;
        }
    }

    let mut seen = HashSet::new();
    for task in &template.task_templates {
        if !seen.insert(task.id.as_str()) {
            issues.push(CatalogIssue::DuplicateTaskTemplate {
                template: template.id.to_string(),
                task: task.id.to_string(),
            });
        }
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    issues: &mut Vec<CatalogIssue>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(CatalogIssue::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqflow_model::{
        ChecklistTemplateId, RequestCategory, RequestTypeDefinition, RequestTypeId, System,
        SystemId, TaskTemplate, TaskTemplateId,
    };

    fn task(id: &str, order: Option<u32>) -> TaskTemplate {
        TaskTemplate {
            id: TaskTemplateId::from(id),
            title: format!("Task {id}"),
            description: String::new(),
            assignee_department: "IT".to_string(),
            order,
        }
    }

    fn checklist(id: &str, tasks: Vec<TaskTemplate>) -> ChecklistTemplate {
        ChecklistTemplate {
            id: ChecklistTemplateId::from(id),
            name: id.to_string(),
            description: String::new(),
            task_templates: tasks,
        }
    }

    #[test]
    fn contiguous_orders_pass() {
        let data = CatalogData {
            checklist_templates: vec![checklist(
                "CLT_A",
                vec![task("t1", Some(1)), task("t2", None), task("t3", Some(3))],
            )],
            ..CatalogData::default()
        };
        assert!(data.validate().is_empty());
    }

    #[test]
    fn gap_in_orders_is_flagged() {
        let data = CatalogData {
            checklist_templates: vec![checklist(
                "CLT_A",
                vec![task("t1", Some(1)), task("t2", Some(3))],
            )],
            ..CatalogData::default()
        };
        assert_eq!(
            data.validate(),
            vec![CatalogIssue::NonContiguousOrder {
                template: "CLT_A".to_string(),
                expected: 2,
                found: 3,
            }]
        );
    }

    #[test]
    fn dangling_template_reference_is_flagged() {
        let data = CatalogData {
            request_types: vec![RequestTypeDefinition {
                id: RequestTypeId::from("access_request_std"),
                name: "Access".to_string(),
                description: String::new(),
                applies_to: RequestCategory::Access,
                checklist_template_id: ChecklistTemplateId::from("CLT_MISSING"),
                is_enabled: true,
                requires_hr_validation: false,
            }],
            ..CatalogData::default()
        };
        let issues = data.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn unknown_named_user_is_a_warning() {
        let data = CatalogData {
            systems: vec![System {
                id: SystemId::from("sys_payroll"),
                name: "Payroll".to_string(),
                approval_policy: ApproverPolicy::NamedUser("Nobody".to_string()),
            }],
            ..CatalogData::default()
        };
        let issues = data.validate();
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }
}
