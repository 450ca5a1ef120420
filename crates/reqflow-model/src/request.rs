//! Requests and their lifecycle status
//!
//! A request is typed by its [`RequestDetails`] payload, so the kind and the
//! data it carries can never disagree.

use crate::ids::{EmployeeId, RequestId, RequestTypeId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestStatus {
    /// Filed, nothing gating it
    Pending,
    /// Waiting on an approver
    PendingManagerApproval,
    /// IT work in progress
    #[serde(rename = "pendingITProcessing")]
    PendingItProcessing,
    /// IT done, HR work remaining
    #[serde(rename = "pendingHRProcessing")]
    PendingHrProcessing,
    /// Awaiting HR final validation
    PendingFinalValidation,
    /// Approved with no work attached
    Approved,
    /// All work done
    Completed,
    /// Rejected by an approver
    Rejected,
    /// Withdrawn
    Cancelled,
}

impl RequestStatus {
    /// Every status, in declaration order
    pub const ALL: [Self; 9] = [
        Self::Pending,
        Self::PendingManagerApproval,
        Self::PendingItProcessing,
        Self::PendingHrProcessing,
        Self::PendingFinalValidation,
        Self::Approved,
        Self::Completed,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Terminal statuses never change again
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Cancelled)
    }

    /// Position along the forward pipeline.
    ///
    /// `None` for `Rejected` and `Cancelled`, which sit outside it.
    /// `Approved` shares the IT-processing rank: both mean the approval
    /// gate has been passed.
    #[must_use]
    pub fn rank(self) -> Option<u8> {
        match self {
            Self::Pending => Some(0),
            Self::PendingManagerApproval => Some(1),
            Self::PendingItProcessing | Self::Approved => Some(2),
            Self::PendingHrProcessing => Some(3),
            Self::PendingFinalValidation => Some(4),
            Self::Completed => Some(5),
            Self::Rejected | Self::Cancelled => None,
        }
    }

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingManagerApproval => "pendingManagerApproval",
            Self::PendingItProcessing => "pendingITProcessing",
            Self::PendingHrProcessing => "pendingHRProcessing",
            Self::PendingFinalValidation => "pendingFinalValidation",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request category, derived from the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    Onboarding,
    Offboarding,
    Access,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Onboarding => "onboarding",
            Self::Offboarding => "offboarding",
            Self::Access => "access",
        })
    }
}

/// One system access asked for in an access request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAccessItem {
    /// System name, as listed in the catalog
    pub system: String,
    pub access_level: String,
    pub justification: String,
}

impl RequestedAccessItem {
    #[must_use]
    pub fn new(
        system: impl Into<String>,
        access_level: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            access_level: access_level.into(),
            justification: justification.into(),
        }
    }
}

/// Type-specific request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RequestDetails {
    /// A new hire
    #[serde(rename_all = "camelCase")]
    Onboarding {
        full_name: String,
        nif: String,
        role: String,
        department: String,
    },
    /// A leaver
    #[serde(rename_all = "camelCase")]
    Offboarding {
        last_day: NaiveDate,
        reason: String,
        employee_full_name: String,
    },
    /// System access for an existing employee
    #[serde(rename_all = "camelCase")]
    Access {
        requested_accesses: Vec<RequestedAccessItem>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        multi_system_approval_note: Option<String>,
    },
}

impl RequestDetails {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Onboarding { .. } => RequestKind::Onboarding,
            Self::Offboarding { .. } => RequestKind::Offboarding,
            Self::Access { .. } => RequestKind::Access,
        }
    }
}

/// Why a request left the pipeline early
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClosingNote {
    /// The approver's comments, if any
    Rejected { reason: Option<String> },
    Cancelled { reason: String },
}

/// A unit of HR/IT work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: RequestId,
    /// Definition this request was filed under
    pub request_type_id: RequestTypeId,
    /// The employee the request is about
    pub subject: EmployeeId,
    pub requester_id: UserId,
    pub status: RequestStatus,
    pub assigned_department: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub summary: String,
    pub details: RequestDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing: Option<ClosingNote>,
}

impl Request {
    #[inline]
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        self.details.kind()
    }

    /// Subject of an onboarding or offboarding request
    #[must_use]
    pub fn employee_id(&self) -> Option<EmployeeId> {
        match self.kind() {
            RequestKind::Onboarding | RequestKind::Offboarding => Some(self.subject),
            RequestKind::Access => None,
        }
    }

    /// Target of an access request
    #[must_use]
    pub fn target_employee_id(&self) -> Option<EmployeeId> {
        match self.kind() {
            RequestKind::Access => Some(self.subject),
            RequestKind::Onboarding | RequestKind::Offboarding => None,
        }
    }

    /// Name of the affected person, as captured when the request was filed
    #[must_use]
    pub fn subject_name(&self) -> Option<&str> {
        match &self.details {
            RequestDetails::Onboarding { full_name, .. } => Some(full_name),
            RequestDetails::Offboarding {
                employee_full_name, ..
            } => Some(employee_full_name),
            RequestDetails::Access { .. } => None,
        }
    }

    /// Items of an access request; empty for other kinds
    #[must_use]
    pub fn requested_accesses(&self) -> &[RequestedAccessItem] {
        match &self.details {
            RequestDetails::Access {
                requested_accesses, ..
            } => requested_accesses,
            _ => &[],
        }
    }

    /// Last working day of an offboarding request
    #[must_use]
    pub fn last_day(&self) -> Option<NaiveDate> {
        match &self.details {
            RequestDetails::Offboarding { last_day, .. } => Some(*last_day),
            _ => None,
        }
    }

    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.closing {
            Some(ClosingNote::Rejected { reason }) => reason.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn cancellation_reason(&self) -> Option<&str> {
        match &self.closing {
            Some(ClosingNote::Cancelled { reason }) => Some(reason),
            _ => None,
        }
    }
}
