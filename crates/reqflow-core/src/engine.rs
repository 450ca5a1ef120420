//! Request lifecycle engine
//!
//! The orchestrator behind every request operation:
//! - Filing onboarding, offboarding and access requests
//! - Task and approval mutations, each followed by status reconciliation
//! - Manual transfer, cancellation and HR close-out
//! - Read-side queries (visible tasks, approver inbox, current accesses)
//!
//! Every mutation of an existing request runs under that request's lock,
//! re-reads state inside it, computes the full outcome and commits it in one
//! [`ChangeSet`]. Notifications are stored with the outcome and handed to the
//! sink afterwards; sink failures are logged only.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, EngineWarning, TransitionError, ValidationError};
use crate::forms::{min_len, require, AccessForm, OffboardingForm, OnboardingForm};
use crate::generator::{generate_tasks, GenerationContext};
use crate::lifecycle::{reconcile_status, validate_transition, ReconcileInput, Rule, Transition};
use crate::locks::RequestLocks;
use crate::notify::{notification_for, LifecycleEvent, NotificationSink, NullSink};
use crate::projection::{current_accesses, GrantedAccess};
use crate::router::route_approvals;
use crate::store::{ChangeSet, RequestStore};
use chrono::{DateTime, NaiveDate, Utc};
use reqflow_catalog::Catalog;
use reqflow_model::{
    Approval, ApprovalId, ClosingNote, Decision, Employee, EmployeeId, EmployeeStatus,
    NotificationItem, Request, RequestDetails, RequestId, RequestKind, RequestStatus,
    RequestTypeDefinition, RequestTypeId, Task, TaskId, TaskStatus, UserId,
};
use std::sync::Arc;

/// Result of filing a new request
#[derive(Debug, Clone)]
pub struct Filed {
    pub request: Request,
    pub employee: Employee,
    pub tasks: Vec<Task>,
    pub approval: Option<Approval>,
    pub notifications: Vec<NotificationItem>,
    pub warnings: Vec<EngineWarning>,
}

/// Result of mutating an existing request
#[derive(Debug, Clone)]
pub struct Outcome {
    pub request: Request,
    /// Task touched by the operation, if any
    pub task: Option<Task>,
    /// Approval touched by the operation, if any
    pub approval: Option<Approval>,
    /// Status changes applied, in order
    pub transitions: Vec<Transition>,
    pub notifications: Vec<NotificationItem>,
    pub warnings: Vec<EngineWarning>,
}

impl Outcome {
    /// Whether the operation moved the request to `status`
    #[must_use]
    pub fn reached(&self, status: RequestStatus) -> bool {
        self.transitions.iter().any(|t| t.to == status)
    }
}

/// Work accumulated by one operation before it is committed
#[derive(Debug, Default)]
struct Draft {
    changes: ChangeSet,
    events: Vec<LifecycleEvent>,
    transitions: Vec<Transition>,
    warnings: Vec<EngineWarning>,
}

/// The request lifecycle engine
pub struct RequestEngine {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn RequestStore>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    locks: RequestLocks,
}

impl RequestEngine {
    /// Create an engine with the wall clock and no notification delivery
    #[must_use]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: Arc<dyn RequestStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            sink: Arc::new(NullSink),
            clock: Arc::new(SystemClock),
            config,
            locks: RequestLocks::new(),
        }
    }

    /// With notification sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// With clock
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ----------------------------------------------------------------
    // Filing
    // ----------------------------------------------------------------

    /// File an onboarding request, creating the employee unless one with
    /// the same NIF already exists
    ///
    /// # Errors
    /// Returns error on invalid input or an unusable request type
    pub async fn file_onboarding(
        &self,
        form: OnboardingForm,
        requester: UserId,
    ) -> EngineResult<Filed> {
        form.validate()?;
        let definition = self.definition_for(&form.request_type_id, RequestKind::Onboarding)?;
        let now = self.clock.now();

        let mut employee = match self.store.employee_by_nif(&form.nif).await? {
            Some(mut existing) => {
                tracing::info!(employee_id = %existing.id, nif = %form.nif, "Reusing employee with matching NIF");
                existing.full_name.clone_from(&form.full_name);
                existing.department.clone_from(&form.department);
                existing.role.clone_from(&form.role);
                existing.status = EmployeeStatus::Active;
                existing
            }
            None => Employee::new(&form.full_name, &form.nif, &form.department, &form.role),
        };

        let request = Request {
            id: RequestId::new(),
            request_type_id: definition.id.clone(),
            subject: employee.id,
            requester_id: requester,
            status: RequestStatus::Pending,
            assigned_department: self.config.departments.hr.clone(),
            created_at: now,
            updated_at: now,
            summary: format!("{}: {}", definition.name, form.full_name),
            details: RequestDetails::Onboarding {
                full_name: form.full_name.clone(),
                nif: form.nif.clone(),
                role: form.role.clone(),
                department: form.department.clone(),
            },
            closing: None,
        };
        employee.onboarding_request_id = Some(request.id);

        self.file(request, employee, &definition, &[], None, Vec::new(), now)
            .await
    }

    /// File an offboarding request; the employee is deactivated and one
    /// revocation task is added per system they currently hold
    ///
    /// # Errors
    /// Returns error on invalid input, an unknown or inactive employee, or
    /// an unusable request type
    pub async fn file_offboarding(
        &self,
        form: OffboardingForm,
        requester: UserId,
    ) -> EngineResult<Filed> {
        form.validate(&self.config)?;
        let definition = self.definition_for(&form.request_type_id, RequestKind::Offboarding)?;
        let mut employee = self.active_employee(form.employee_id).await?;
        let now = self.clock.now();

        let requests = self.store.requests().await?;
        let granted = current_accesses(employee.id, &requests);

        let request = Request {
            id: RequestId::new(),
            request_type_id: definition.id.clone(),
            subject: employee.id,
            requester_id: requester,
            status: RequestStatus::Pending,
            assigned_department: self.config.departments.hr.clone(),
            created_at: now,
            updated_at: now,
            summary: format!("{}: {}", definition.name, employee.full_name),
            details: RequestDetails::Offboarding {
                last_day: form.last_day,
                reason: form.reason.trim().to_string(),
                employee_full_name: employee.full_name.clone(),
            },
            closing: None,
        };
        employee.status = EmployeeStatus::Inactive;
        employee.offboarding_request_id = Some(request.id);

        self.file(request, employee, &definition, &granted, None, Vec::new(), now)
            .await
    }

    /// File an access request for an existing employee, routing approval
    /// by the requested systems' policies
    ///
    /// # Errors
    /// Returns error on invalid input, an unknown or inactive employee, or
    /// an unusable request type
    pub async fn file_access(&self, form: AccessForm, requester: UserId) -> EngineResult<Filed> {
        form.validate(&self.config)?;
        let definition = self.definition_for(&form.request_type_id, RequestKind::Access)?;
        let employee = self.active_employee(form.target_employee_id).await?;
        let now = self.clock.now();

        let request_id = RequestId::new();
        let routed = route_approvals(
            request_id,
            &form.items,
            self.catalog.as_ref(),
            &self.config,
            now,
        );

        let request = Request {
            id: request_id,
            request_type_id: definition.id.clone(),
            subject: employee.id,
            requester_id: requester,
            status: routed.initial_status,
            assigned_department: self.config.departments.it.clone(),
            created_at: now,
            updated_at: now,
            summary: format!(
                "{} for {} ({} system(s))",
                definition.name,
                employee.full_name,
                form.items.len()
            ),
            details: RequestDetails::Access {
                requested_accesses: form.items,
                multi_system_approval_note: routed.note,
            },
            closing: None,
        };

        self.file(
            request,
            employee,
            &definition,
            &[],
            routed.approval,
            routed.warnings,
            now,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn file(
        &self,
        request: Request,
        employee: Employee,
        definition: &RequestTypeDefinition,
        granted: &[GrantedAccess],
        approval: Option<Approval>,
        warnings: Vec<EngineWarning>,
        now: DateTime<Utc>,
    ) -> EngineResult<Filed> {
        let template = self
            .catalog
            .checklist_template(&definition.checklist_template_id);
        let generated = generate_tasks(
            &request,
            template.as_ref(),
            &GenerationContext {
                now,
                subject_name: &employee.full_name,
                expected_template: &definition.checklist_template_id,
                granted,
                it_department: &self.config.departments.it,
            },
        );

        let mut draft = Draft {
            warnings,
            ..Draft::default()
        };
        draft.warnings.extend(generated.warnings);

        if let Some(approval) = &approval {
            draft.events.push(LifecycleEvent::ApprovalRequired {
                request_id: request.id,
                approver: approval.approver_id.clone(),
                subject_name: employee.full_name.clone(),
                note: match &request.details {
                    RequestDetails::Access {
                        multi_system_approval_note,
                        ..
                    } => multi_system_approval_note.clone(),
                    _ => None,
                },
            });
        }
        draft.events.push(LifecycleEvent::RequestFiled {
            request_id: request.id,
            kind: request.kind(),
            type_name: definition.name.clone(),
            subject_name: employee.full_name.clone(),
            department: request.assigned_department.clone(),
            awaiting_approval: approval.is_some(),
        });

        draft.changes.employee = Some(employee.clone());
        draft.changes.request = Some(request.clone());
        draft.changes.tasks.clone_from(&generated.tasks);
        draft.changes.approvals.extend(approval.clone());

        tracing::info!(
            request_id = %request.id,
            kind = %request.kind(),
            request_type = %definition.id,
            status = %request.status,
            tasks = generated.tasks.len(),
            gated = approval.is_some(),
            "Filed request"
        );

        let (notifications, warnings) = self.commit(draft, now).await?;
        Ok(Filed {
            request,
            employee,
            tasks: generated.tasks,
            approval,
            notifications,
            warnings,
        })
    }

    // ----------------------------------------------------------------
    // Task mutations
    // ----------------------------------------------------------------

    /// Move a pending task to in progress
    ///
    /// # Errors
    /// Returns error if the task is not pending or its request is terminal
    pub async fn start_task(&self, task_id: TaskId) -> EngineResult<Outcome> {
        self.edit_task(task_id, |task| match task.status {
            TaskStatus::Pending => {
                task.status = TaskStatus::InProgress;
                Ok(())
            }
            other => Err(TransitionError::TaskNotPending(other).into()),
        })
        .await
    }

    /// Complete a task, then reconcile the request's status
    ///
    /// # Errors
    /// Returns error if the task is already completed or its request is
    /// terminal
    pub async fn complete_task(
        &self,
        task_id: TaskId,
        observations: Option<String>,
    ) -> EngineResult<Outcome> {
        let request_id = self.task_owner(task_id).await?;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let (mut request, mut tasks, approvals) = self.load(request_id).await?;
        ensure_open(&request)?;
        let index = task_index(&tasks, task_id)?;
        let task = &mut tasks[index];
        if task.is_completed() {
            return Err(TransitionError::TaskAlreadyCompleted(task.status).into());
        }
        task.status = TaskStatus::Completed;
        if let Some(text) = observations {
            task.observations = text;
        }
        task.updated_at = now;
        let task = task.clone();

        tracing::info!(%request_id, %task_id, department = %task.assignee_department, "Task completed");

        let mut draft = Draft::default();
        draft.events.push(LifecycleEvent::TaskCompleted {
            task_id,
            title: task.title.clone(),
            department: task.assignee_department.clone(),
        });
        self.settle(&mut request, &tasks, &approvals, None, now, &mut draft);

        draft.changes.request = Some(request.clone());
        draft.changes.tasks.push(task.clone());
        self.finish(draft, request, Some(task), None, now).await
    }

    /// Replace a task's observations
    ///
    /// # Errors
    /// Returns error if the task is completed or its request is terminal
    pub async fn update_task_observations(
        &self,
        task_id: TaskId,
        observations: String,
    ) -> EngineResult<Outcome> {
        self.edit_task(task_id, |task| {
            ensure_task_open(task)?;
            task.observations = observations;
            Ok(())
        })
        .await
    }

    /// Reassign a task to another department and, optionally, a person
    ///
    /// # Errors
    /// Returns error if the department is empty, the task is completed or
    /// its request is terminal
    pub async fn reassign_task(
        &self,
        task_id: TaskId,
        department: String,
        assignee: Option<UserId>,
    ) -> EngineResult<Outcome> {
        require("department", &department)?;
        self.edit_task(task_id, |task| {
            ensure_task_open(task)?;
            task.assignee_department = department;
            task.assignee_id = assignee;
            Ok(())
        })
        .await
    }

    /// Set or clear a task's due date
    ///
    /// # Errors
    /// Returns error if the task is completed or its request is terminal
    pub async fn set_task_due_date(
        &self,
        task_id: TaskId,
        due_date: Option<NaiveDate>,
    ) -> EngineResult<Outcome> {
        self.edit_task(task_id, |task| {
            ensure_task_open(task)?;
            task.due_date = due_date;
            Ok(())
        })
        .await
    }

    async fn edit_task(
        &self,
        task_id: TaskId,
        edit: impl FnOnce(&mut Task) -> EngineResult<()>,
    ) -> EngineResult<Outcome> {
        let request_id = self.task_owner(task_id).await?;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let (mut request, mut tasks, approvals) = self.load(request_id).await?;
        ensure_open(&request)?;
        let index = task_index(&tasks, task_id)?;
        edit(&mut tasks[index])?;
        tasks[index].updated_at = now;
        let task = tasks[index].clone();

        let mut draft = Draft::default();
        self.settle(&mut request, &tasks, &approvals, None, now, &mut draft);
        if !draft.transitions.is_empty() {
            draft.changes.request = Some(request.clone());
        }
        draft.changes.tasks.push(task.clone());
        self.finish(draft, request, Some(task), None, now).await
    }

    // ----------------------------------------------------------------
    // Approvals
    // ----------------------------------------------------------------

    /// Resolve a pending approval. One-shot: a resolved approval cannot be
    /// resolved again.
    ///
    /// # Errors
    /// Returns error if the approval is already resolved or the request is
    /// terminal
    pub async fn resolve_approval(
        &self,
        approval_id: ApprovalId,
        decision: Decision,
        comments: Option<String>,
    ) -> EngineResult<Outcome> {
        let request_id = self
            .store
            .approval(approval_id)
            .await?
            .ok_or_else(|| EngineError::not_found("approval", approval_id))?
            .request_id;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let (mut request, tasks, mut approvals) = self.load(request_id).await?;
        let index = approvals
            .iter()
            .position(|a| a.id == approval_id)
            .ok_or_else(|| EngineError::not_found("approval", approval_id))?;
        if !approvals[index].is_pending() {
            return Err(TransitionError::ApprovalAlreadyResolved.into());
        }
        ensure_open(&request)?;

        let comments = comments.filter(|c| !c.trim().is_empty());
        let approval = &mut approvals[index];
        approval.status = decision.status();
        approval.approved_at = Some(now);
        approval.updated_at = now;
        if let Some(text) = &comments {
            approval.comments.clone_from(text);
        }
        let approval = approval.clone();

        tracing::info!(%request_id, %approval_id, ?decision, approver = %approval.approver_id, "Approval resolved");

        let mut draft = Draft::default();
        draft.events.push(LifecycleEvent::ApprovalDecided {
            request_id,
            summary: request.summary.clone(),
            decision,
            requester: request.requester_id.clone(),
        });
        let rejection_reason = match decision {
            Decision::Reject => comments,
            Decision::Approve => None,
        };
        self.settle(&mut request, &tasks, &approvals, rejection_reason, now, &mut draft);

        draft.changes.request = Some(request.clone());
        draft.changes.approvals.push(approval.clone());
        self.finish(draft, request, None, Some(approval), now).await
    }

    // ----------------------------------------------------------------
    // Administrative actions
    // ----------------------------------------------------------------

    /// Move a request to another department
    ///
    /// An onboarding request moved from IT to HR is forced into HR
    /// processing; otherwise a request waiting on approval or final
    /// validation drops back to pending. Approval records are untouched.
    ///
    /// # Errors
    /// Returns error if the target is empty or the current department, or
    /// the request is terminal
    pub async fn transfer(&self, request_id: RequestId, to_department: String) -> EngineResult<Outcome> {
        require("department", &to_department)?;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let mut request = self.request(request_id).await?;
        ensure_open(&request)?;
        let departments = &self.config.departments;
        let from_department = request.assigned_department.clone();
        if departments.same(&from_department, &to_department) {
            return Err(ValidationError::SameDepartment(to_department).into());
        }

        let from = request.status;
        let to = if request.kind() == RequestKind::Onboarding
            && departments.is_it(&from_department)
            && departments.is_hr(&to_department)
        {
            RequestStatus::PendingHrProcessing
        } else if matches!(
            from,
            RequestStatus::PendingManagerApproval | RequestStatus::PendingFinalValidation
        ) {
            RequestStatus::Pending
        } else {
            from
        };
        if to != from {
            validate_transition(from, to)?;
            request.status = to;
        }
        request.assigned_department.clone_from(&to_department);
        request.updated_at = now;

        tracing::info!(%request_id, from = %from_department, to = %to_department, status = %request.status, "Request transferred");

        let mut draft = Draft::default();
        draft.events.push(LifecycleEvent::Transferred {
            request_id,
            summary: request.summary.clone(),
            from: from_department,
            to: to_department,
        });
        draft.changes.request = Some(request.clone());
        self.finish(draft, request, None, None, now).await
    }

    /// Cancel a non-terminal request
    ///
    /// # Errors
    /// Returns error if the reason is empty or the request is terminal
    pub async fn cancel(&self, request_id: RequestId, reason: String) -> EngineResult<Outcome> {
        require("reason", &reason)?;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let mut request = self.request(request_id).await?;
        validate_transition(request.status, RequestStatus::Cancelled)?;
        let reason = reason.trim().to_string();
        request.status = RequestStatus::Cancelled;
        request.closing = Some(ClosingNote::Cancelled {
            reason: reason.clone(),
        });
        request.updated_at = now;

        tracing::info!(%request_id, %reason, "Request cancelled");

        let mut draft = Draft::default();
        draft.events.push(LifecycleEvent::Cancelled {
            request_id,
            summary: request.summary.clone(),
            reason,
            requester: request.requester_id.clone(),
        });
        draft.changes.request = Some(request.clone());
        self.finish(draft, request, None, None, now).await
    }

    /// Complete a request sitting in an HR stage once all its tasks are done
    ///
    /// # Errors
    /// Returns error outside the HR stages or while tasks remain open
    pub async fn finalize(&self, request_id: RequestId) -> EngineResult<Outcome> {
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let (mut request, tasks, _) = self.load(request_id).await?;
        ensure_open(&request)?;
        let from = request.status;
        if !matches!(
            from,
            RequestStatus::PendingHrProcessing | RequestStatus::PendingFinalValidation
        ) {
            return Err(TransitionError::FinalizeNotAllowed {
                status: from,
                detail: "",
            }
            .into());
        }
        if !tasks.iter().all(Task::is_completed) {
            return Err(TransitionError::FinalizeNotAllowed {
                status: from,
                detail: " while tasks are open",
            }
            .into());
        }
        validate_transition(from, RequestStatus::Completed)?;
        request.status = RequestStatus::Completed;
        request.updated_at = now;

        tracing::info!(%request_id, %from, "Request finalized");

        let mut draft = Draft::default();
        draft.events.push(LifecycleEvent::RequestCompleted {
            request_id,
            summary: request.summary.clone(),
            requester: request.requester_id.clone(),
        });
        draft.changes.request = Some(request.clone());
        self.finish(draft, request, None, None, now).await
    }

    /// Replace a request's summary
    ///
    /// # Errors
    /// Returns error if the summary is too short or the request is terminal
    pub async fn update_summary(&self, request_id: RequestId, summary: String) -> EngineResult<Outcome> {
        min_len("summary", &summary, self.config.min_summary_len)?;
        let _guard = self.locks.acquire(request_id).await;
        let now = self.clock.now();

        let mut request = self.request(request_id).await?;
        ensure_open(&request)?;
        request.summary = summary.trim().to_string();
        request.updated_at = now;

        let mut draft = Draft::default();
        draft.changes.request = Some(request.clone());
        self.finish(draft, request, None, None, now).await
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    /// # Errors
    /// Returns [`EngineError::NotFound`] for unknown ids
    pub async fn request(&self, id: RequestId) -> EngineResult<Request> {
        self.store
            .request(id)
            .await?
            .ok_or_else(|| EngineError::not_found("request", id))
    }

    /// Every request, in filing order
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn requests(&self) -> EngineResult<Vec<Request>> {
        Ok(self.store.requests().await?)
    }

    /// # Errors
    /// Returns [`EngineError::NotFound`] for unknown ids
    pub async fn employee(&self, id: EmployeeId) -> EngineResult<Employee> {
        self.store
            .employee(id)
            .await?
            .ok_or_else(|| EngineError::not_found("employee", id))
    }

    /// Tasks of a request, sorted by order
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn tasks_for(&self, request_id: RequestId) -> EngineResult<Vec<Task>> {
        Ok(self.store.tasks_for(request_id).await?)
    }

    /// # Errors
    /// Returns error if the store fails
    pub async fn approvals_for(&self, request_id: RequestId) -> EngineResult<Vec<Approval>> {
        Ok(self.store.approvals_for(request_id).await?)
    }

    /// Approvals waiting on `approver`
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn pending_approvals_for(&self, approver: &UserId) -> EngineResult<Vec<Approval>> {
        Ok(self
            .store
            .approvals()
            .await?
            .into_iter()
            .filter(|a| a.is_pending() && &a.approver_id == approver)
            .collect())
    }

    /// Tasks visible today (offboarding tasks stay hidden until the last day)
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn visible_tasks(&self) -> EngineResult<Vec<Task>> {
        self.visible_tasks_on(self.clock.today()).await
    }

    /// Tasks visible on `day`
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn visible_tasks_on(&self, day: NaiveDate) -> EngineResult<Vec<Task>> {
        Ok(self
            .store
            .tasks()
            .await?
            .into_iter()
            .filter(|t| t.is_visible_on(day))
            .collect())
    }

    /// Accesses an employee currently holds
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn current_accesses(&self, employee: EmployeeId) -> EngineResult<Vec<GrantedAccess>> {
        let requests = self.store.requests().await?;
        Ok(current_accesses(employee, &requests))
    }

    /// Every notification, most recent first
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn notifications(&self) -> EngineResult<Vec<NotificationItem>> {
        Ok(self.store.notifications().await?)
    }

    // ----------------------------------------------------------------
    // Internals
    // ----------------------------------------------------------------

    fn definition_for(
        &self,
        id: &RequestTypeId,
        kind: RequestKind,
    ) -> EngineResult<RequestTypeDefinition> {
        let definition = self
            .catalog
            .request_type(id)
            .ok_or_else(|| EngineError::not_found("request type", id))?;
        if !definition.is_enabled {
            return Err(ValidationError::RequestTypeDisabled(id.to_string()).into());
        }
        if !definition.applies_to.admits(kind) {
            return Err(ValidationError::RequestTypeMismatch {
                request_type: id.to_string(),
                kind: kind.to_string(),
            }
            .into());
        }
        Ok(definition)
    }

    async fn active_employee(&self, id: EmployeeId) -> EngineResult<Employee> {
        let employee = self.employee(id).await?;
        if employee.is_active() {
            Ok(employee)
        } else {
            Err(ValidationError::EmployeeInactive(employee.full_name).into())
        }
    }

    async fn task_owner(&self, task_id: TaskId) -> EngineResult<RequestId> {
        Ok(self
            .store
            .task(task_id)
            .await?
            .ok_or_else(|| EngineError::not_found("task", task_id))?
            .request_id)
    }

    async fn load(&self, request_id: RequestId) -> EngineResult<(Request, Vec<Task>, Vec<Approval>)> {
        let request = self.request(request_id).await?;
        let tasks = self.store.tasks_for(request_id).await?;
        let approvals = self.store.approvals_for(request_id).await?;
        Ok((request, tasks, approvals))
    }

    /// Apply reconciliation until it yields nothing
    fn settle(
        &self,
        request: &mut Request,
        tasks: &[Task],
        approvals: &[Approval],
        rejection_reason: Option<String>,
        now: DateTime<Utc>,
        draft: &mut Draft,
    ) {
        let requires_hr_validation = match self.catalog.request_type(&request.request_type_id) {
            Some(definition) => definition.requires_hr_validation,
            None => {
                tracing::warn!(request_id = %request.id, request_type = %request.request_type_id, "Request type missing during reconciliation");
                draft.warnings.push(EngineWarning::MissingRequestType {
                    request_type: request.request_type_id.to_string(),
                });
                false
            }
        };

        for _ in 0..self.config.max_reconcile_steps {
            let Some(transition) = reconcile_status(&ReconcileInput {
                request: &*request,
                tasks,
                approvals,
                requires_hr_validation,
                departments: &self.config.departments,
            }) else {
                return;
            };
            if let Err(err) = validate_transition(transition.from, transition.to) {
                tracing::error!(request_id = %request.id, %err, "Reconciliation produced a transition outside the table");
                return;
            }

            request.status = transition.to;
            request.updated_at = now;
            if let Some(assign) = transition.assign {
                request.assigned_department = assign.department(&self.config.departments).to_string();
            }
            if transition.to == RequestStatus::Rejected {
                request.closing = Some(ClosingNote::Rejected {
                    reason: rejection_reason.clone(),
                });
            }

            tracing::info!(
                request_id = %request.id,
                from = %transition.from,
                to = %transition.to,
                rule = ?transition.rule,
                department = %request.assigned_department,
                "Status changed"
            );

            if let Some(event) = self.event_for(request, &transition) {
                draft.events.push(event);
            }
            draft.transitions.push(transition);
        }
        tracing::warn!(request_id = %request.id, steps = self.config.max_reconcile_steps, "Reconciliation step limit reached");
    }

    fn event_for(&self, request: &Request, transition: &Transition) -> Option<LifecycleEvent> {
        let hr = self.config.departments.hr.clone();
        match (transition.rule, transition.to) {
            (Rule::HrHandoff, _) => Some(LifecycleEvent::HandedOffToHr {
                request_id: request.id,
                summary: request.summary.clone(),
                hr,
            }),
            (Rule::FinalValidationHandoff, _) => Some(LifecycleEvent::AwaitingFinalValidation {
                request_id: request.id,
                summary: request.summary.clone(),
                hr,
            }),
            (_, RequestStatus::Completed) => Some(LifecycleEvent::RequestCompleted {
                request_id: request.id,
                summary: request.summary.clone(),
                requester: request.requester_id.clone(),
            }),
            _ => None,
        }
    }

    async fn finish(
        &self,
        draft: Draft,
        request: Request,
        task: Option<Task>,
        approval: Option<Approval>,
        now: DateTime<Utc>,
    ) -> EngineResult<Outcome> {
        let transitions = draft.transitions.clone();
        let (notifications, warnings) = self.commit(draft, now).await?;
        Ok(Outcome {
            request,
            task,
            approval,
            transitions,
            notifications,
            warnings,
        })
    }

    async fn commit(
        &self,
        mut draft: Draft,
        now: DateTime<Utc>,
    ) -> EngineResult<(Vec<NotificationItem>, Vec<EngineWarning>)> {
        let notifications: Vec<NotificationItem> = draft
            .events
            .iter()
            .map(|event| notification_for(event, now))
            .collect();
        draft.changes.notifications.clone_from(&notifications);
        self.store.commit(draft.changes).await?;

        for item in &notifications {
            if let Err(err) = self.sink.deliver(item) {
                tracing::warn!(notification_id = %item.id, %err, "Notification delivery failed");
            }
        }
        Ok((notifications, draft.warnings))
    }
}

fn ensure_open(request: &Request) -> Result<(), TransitionError> {
    if request.status.is_terminal() {
        Err(TransitionError::RequestTerminal(request.status))
    } else {
        Ok(())
    }
}

fn ensure_task_open(task: &Task) -> EngineResult<()> {
    if task.is_completed() {
        Err(TransitionError::TaskAlreadyCompleted(task.status).into())
    } else {
        Ok(())
    }
}

fn task_index(tasks: &[Task], task_id: TaskId) -> EngineResult<usize> {
    tasks
        .iter()
        .position(|t| t.id == task_id)
        .ok_or_else(|| EngineError::not_found("task", task_id))
}
