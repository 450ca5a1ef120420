//! Task generation
//!
//! Turns a request plus its checklist template into concrete tasks:
//! - One task per task template, in template order, all pending
//! - Offboarding tasks become visible (and due) on the last working day
//! - Offboarding adds one revocation task per system the employee holds
//!
//! Pure: no store access, no side effects. A missing template is reported
//! as a warning and yields no template tasks.

use crate::error::EngineWarning;
use crate::projection::{systems_to_revoke, GrantedAccess};
use chrono::{DateTime, Utc};
use reqflow_model::{
    ChecklistTemplate, ChecklistTemplateId, Request, RequestKind, Task, TaskId, TaskStatus,
};

/// Inputs the generator needs besides the request and template
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub now: DateTime<Utc>,
    /// Affected person's name, used in task titles
    pub subject_name: &'a str,
    /// Template the request type points at (reported if missing)
    pub expected_template: &'a ChecklistTemplateId,
    /// Accesses the subject currently holds (offboarding only)
    pub granted: &'a [GrantedAccess],
    /// Department revocation tasks go to
    pub it_department: &'a str,
}

/// Generator output
#[derive(Debug, Clone, Default)]
pub struct GeneratedTasks {
    pub tasks: Vec<Task>,
    pub warnings: Vec<EngineWarning>,
}

/// Generate the task set for a freshly filed request
#[must_use]
pub fn generate_tasks(
    request: &Request,
    template: Option<&ChecklistTemplate>,
    context: &GenerationContext<'_>,
) -> GeneratedTasks {
    let mut out = GeneratedTasks::default();
    let last_day = request.last_day();

    match template {
        Some(template) => {
            for (order, task_template) in template.ordered_tasks() {
                let title = match request.kind() {
                    RequestKind::Onboarding => {
                        format!("{} for {}", task_template.title, context.subject_name)
                    }
                    RequestKind::Offboarding | RequestKind::Access => format!(
                        "{} (Req: {}) for {}",
                        task_template.title, request.id, context.subject_name
                    ),
                };
                out.tasks.push(Task {
                    id: TaskId::new(),
                    request_id: request.id,
                    checklist_template_id: Some(template.id.clone()),
                    task_template_id: Some(task_template.id.clone()),
                    title,
                    description: task_template.description.clone(),
                    assignee_department: task_template.assignee_department.clone(),
                    assignee_id: None,
                    status: TaskStatus::Pending,
                    observations: String::new(),
                    order,
                    due_date: last_day,
                    visible_from: last_day,
                    created_at: context.now,
                    updated_at: context.now,
                });
            }
        }
        None => {
            tracing::warn!(
                request_id = %request.id,
                request_type = %request.request_type_id,
                template = %context.expected_template,
                "Checklist template missing; generating no template tasks"
            );
            out.warnings.push(EngineWarning::MissingChecklistTemplate {
                request_type: request.request_type_id.to_string(),
                template: context.expected_template.to_string(),
            });
        }
    }

    if request.kind() == RequestKind::Offboarding {
        let next_order = out.tasks.iter().map(|t| t.order).max().unwrap_or(0) + 1;
        for (order, system) in (next_order..).zip(systems_to_revoke(context.granted)) {
            out.tasks.push(Task {
                id: TaskId::new(),
                request_id: request.id,
                checklist_template_id: None,
                task_template_id: None,
                title: format!("Revoke access to \"{system}\" for {}", context.subject_name),
                description: format!(
                    "Revoke every permission previously granted on {system} to {}, who is leaving.",
                    context.subject_name
                ),
                assignee_department: context.it_department.to_string(),
                assignee_id: None,
                status: TaskStatus::Pending,
                observations: String::new(),
                order,
                due_date: last_day,
                visible_from: last_day,
                created_at: context.now,
                updated_at: context.now,
            });
        }
    }

    tracing::debug!(
        request_id = %request.id,
        tasks = out.tasks.len(),
        "Generated tasks"
    );
    out
}
