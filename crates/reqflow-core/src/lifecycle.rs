//! Request lifecycle rules
//!
//! Two pieces:
//! - A transition table ([`allowed_transitions`] / [`validate_transition`])
//!   listing every status change any engine path may make
//! - [`reconcile_status`]: derives the next status from tasks and approvals.
//!   It is the single place status changes caused by work are decided. The
//!   engine applies it repeatedly until it yields nothing.
//!
//! Reconciliation, in precedence order:
//! 1. Terminal requests never change
//! 2. A rejected approval rejects the request
//! 3. A pending approval holds the request where it is
//! 4. Leaving the approval gate: no tasks means approved, all tasks done
//!    means completed, otherwise IT processing
//! 5. HR-validation variants move to final validation once IT work is done
//!    and HR work remains
//! 6. Onboarding moves to HR processing under the same condition
//! 7. With every task done, the request completes, unless it sits in an HR
//!    stage (those close out explicitly)

use crate::config::DepartmentConfig;
use crate::error::TransitionError;
use reqflow_model::{Approval, ApprovalStatus, Request, RequestKind, RequestStatus, Task};

/// Which rule produced a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    ApprovalRejected,
    ApprovalGranted,
    FinalValidationHandoff,
    HrHandoff,
    AllTasksCompleted,
}

/// Department the request should be assigned to after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignment {
    It,
    Hr,
}

impl Assignment {
    /// Canonical department name
    #[must_use]
    pub fn department(self, departments: &DepartmentConfig) -> &str {
        match self {
            Self::It => &departments.it,
            Self::Hr => &departments.hr,
        }
    }
}

/// One status change decided by [`reconcile_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub assign: Option<Assignment>,
    pub rule: Rule,
}

/// Everything reconciliation looks at
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub request: &'a Request,
    pub tasks: &'a [Task],
    pub approvals: &'a [Approval],
    /// Request type asks for HR final validation
    pub requires_hr_validation: bool,
    pub departments: &'a DepartmentConfig,
}

/// Statuses reachable from `from` by any engine operation
#[must_use]
pub fn allowed_transitions(from: RequestStatus) -> Vec<RequestStatus> {
    use RequestStatus::*;
    match from {
        Pending => vec![
            PendingItProcessing,
            PendingHrProcessing,
            PendingFinalValidation,
            Completed,
            Rejected,
            Cancelled,
        ],
        PendingManagerApproval => vec![
            Pending,
            Approved,
            PendingItProcessing,
            PendingHrProcessing,
            Completed,
            Rejected,
            Cancelled,
        ],
        PendingItProcessing => vec![
            PendingHrProcessing,
            PendingFinalValidation,
            Completed,
            Rejected,
            Cancelled,
        ],
        Approved => vec![
            PendingHrProcessing,
            PendingFinalValidation,
            Completed,
            Rejected,
            Cancelled,
        ],
        PendingHrProcessing => vec![PendingFinalValidation, Completed, Rejected, Cancelled],
        PendingFinalValidation => vec![Pending, PendingHrProcessing, Completed, Rejected, Cancelled],
        Completed | Rejected | Cancelled => vec![],
    }
}

/// Check a status change against the transition table
///
/// # Errors
/// Returns [`TransitionError::RequestTerminal`] from terminal statuses and
/// [`TransitionError::NotAllowed`] for any other change outside the table
pub fn validate_transition(from: RequestStatus, to: RequestStatus) -> Result<(), TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::RequestTerminal(from));
    }
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed { from, to })
    }
}

/// Derive the next status, if any, from the request's tasks and approvals
#[must_use]
pub fn reconcile_status(input: &ReconcileInput<'_>) -> Option<Transition> {
    let from = input.request.status;
    let step = |to, assign, rule| {
        Some(Transition {
            from,
            to,
            assign,
            rule,
        })
    };

    if from.is_terminal() {
        return None;
    }

    if input
        .approvals
        .iter()
        .any(|a| a.status == ApprovalStatus::Rejected)
    {
        return step(RequestStatus::Rejected, None, Rule::ApprovalRejected);
    }

    if input.approvals.iter().any(Approval::is_pending) {
        return None;
    }

    let all_done = !input.tasks.is_empty() && input.tasks.iter().all(Task::is_completed);

    if from == RequestStatus::PendingManagerApproval {
        return if input.tasks.is_empty() {
            step(RequestStatus::Approved, None, Rule::ApprovalGranted)
        } else if all_done {
            step(RequestStatus::Completed, None, Rule::ApprovalGranted)
        } else {
            step(
                RequestStatus::PendingItProcessing,
                Some(Assignment::It),
                Rule::ApprovalGranted,
            )
        };
    }

    let rank = from.rank().unwrap_or_default();
    if it_done_hr_open(input.tasks, input.departments) {
        if input.requires_hr_validation && rank < stage_rank(RequestStatus::PendingFinalValidation)
        {
            return step(
                RequestStatus::PendingFinalValidation,
                Some(Assignment::Hr),
                Rule::FinalValidationHandoff,
            );
        }
        if input.request.kind() == RequestKind::Onboarding
            && rank < stage_rank(RequestStatus::PendingHrProcessing)
        {
            return step(
                RequestStatus::PendingHrProcessing,
                Some(Assignment::Hr),
                Rule::HrHandoff,
            );
        }
    }

    if all_done
        && !matches!(
            from,
            RequestStatus::PendingHrProcessing | RequestStatus::PendingFinalValidation
        )
    {
        return step(RequestStatus::Completed, None, Rule::AllTasksCompleted);
    }

    None
}

/// At least one IT task, every IT task done, and HR work outstanding
#[must_use]
pub fn it_done_hr_open(tasks: &[Task], departments: &DepartmentConfig) -> bool {
    let mut it_tasks = tasks
        .iter()
        .filter(|t| departments.is_it(&t.assignee_department))
        .peekable();
    let has_it = it_tasks.peek().is_some();
    let it_done = it_tasks.all(Task::is_completed);
    let hr_open = tasks
        .iter()
        .any(|t| departments.is_hr(&t.assignee_department) && !t.is_completed());
    has_it && it_done && hr_open
}

fn stage_rank(status: RequestStatus) -> u8 {
    status.rank().unwrap_or_default()
}
