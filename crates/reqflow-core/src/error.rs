//! Error types for the lifecycle engine
//!
//! Three layers:
//! - [`EngineError`]: everything an engine operation can fail with
//! - [`ValidationError`] / [`TransitionError`]: rejected user input and
//!   illegal state changes; nothing is written when either is returned
//! - [`EngineWarning`]: degraded reference data the engine worked around

use reqflow_model::{RequestStatus, TaskStatus};
use std::fmt;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input rejected before anything was created or changed
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the current state
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// Referenced entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind
        entity: &'static str,
        /// Id that was looked up
        id: String,
    },

    /// Backing store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Engine configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Shorthand for [`EngineError::NotFound`]
    #[inline]
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the message can be shown to the person who made the request
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidTransition(_) | Self::NotFound { .. }
        )
    }

    /// Engine operations are never retried automatically
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Rejected input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("an access request needs between 1 and {max} items, got {count}")]
    AccessItemCount { count: usize, max: usize },

    #[error("request type {0} is disabled")]
    RequestTypeDisabled(String),

    #[error("request type {request_type} does not apply to {kind} requests")]
    RequestTypeMismatch { request_type: String, kind: String },

    #[error("employee {0} is not active")]
    EmployeeInactive(String),

    #[error("request is already assigned to {0}")]
    SameDepartment(String),
}

/// Illegal state change
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("approval already resolved")]
    ApprovalAlreadyResolved,

    #[error("request is {0} and can no longer change")]
    RequestTerminal(RequestStatus),

    #[error("{from} -> {to} is not a valid status change")]
    NotAllowed {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("task is already {0}")]
    TaskAlreadyCompleted(TaskStatus),

    #[error("task can only be started from pending, it is {0}")]
    TaskNotPending(TaskStatus),

    #[error("request in {status} cannot be finalized{detail}")]
    FinalizeNotAllowed {
        status: RequestStatus,
        detail: &'static str,
    },
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write conflict on {0}")]
    Conflict(String),
}

/// Degraded reference data, reported alongside a successful outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineWarning {
    /// Request type points at a checklist template that does not exist
    MissingChecklistTemplate { request_type: String, template: String },
    /// Access item names a system the catalog does not know
    UnknownSystem { system: String },
    /// No user matched the approval policy
    ApproverFallback { policy: String, approver: String },
    /// Request type vanished from the catalog after filing
    MissingRequestType { request_type: String },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingChecklistTemplate {
                request_type,
                template,
            } => write!(
                f,
                "request type {request_type} uses missing checklist template {template}; no template tasks generated"
            ),
            Self::UnknownSystem { system } => {
                write!(f, "system {system} is not in the catalog; no approval implied")
            }
            Self::ApproverFallback { policy, approver } => {
                write!(f, "no user matches policy '{policy}'; routed to {approver}")
            }
            Self::MissingRequestType { request_type } => write!(
                f,
                "request type {request_type} is no longer in the catalog; treated as a plain request"
            ),
        }
    }
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let err: EngineError = ValidationError::Empty { field: "reason" }.into();
        assert!(err.is_user_facing());
        assert!(!err.is_retryable());

        let err: EngineError = StoreError::Unavailable("down".to_string()).into();
        assert!(!err.is_user_facing());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = TransitionError::FinalizeNotAllowed {
            status: RequestStatus::PendingItProcessing,
            detail: "",
        };
        assert_eq!(
            err.to_string(),
            "request in pendingITProcessing cannot be finalized"
        );
        assert_eq!(
            ValidationError::TooShort {
                field: "justification",
                min: 10
            }
            .to_string(),
            "justification must be at least 10 characters"
        );
    }
}
