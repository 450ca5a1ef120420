//! Notification emission
//!
//! Every lifecycle event maps to exactly one [`NotificationItem`] through a
//! pure function. Delivery goes through a [`NotificationSink`]; it is
//! fire-and-forget, so a failing sink is logged and never blocks or undoes a
//! transition.

use chrono::{DateTime, Utc};
use reqflow_model::{
    Decision, NotificationId, NotificationItem, NotificationKind, Recipient, RequestId,
    RequestKind, TaskId, UserId,
};
use tokio::sync::mpsc;

/// Something that happened to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    RequestFiled {
        request_id: RequestId,
        kind: RequestKind,
        type_name: String,
        subject_name: String,
        department: String,
        awaiting_approval: bool,
    },
    ApprovalRequired {
        request_id: RequestId,
        approver: UserId,
        subject_name: String,
        note: Option<String>,
    },
    TaskCompleted {
        task_id: TaskId,
        title: String,
        department: String,
    },
    HandedOffToHr {
        request_id: RequestId,
        summary: String,
        hr: String,
    },
    AwaitingFinalValidation {
        request_id: RequestId,
        summary: String,
        hr: String,
    },
    RequestCompleted {
        request_id: RequestId,
        summary: String,
        requester: UserId,
    },
    ApprovalDecided {
        request_id: RequestId,
        summary: String,
        decision: Decision,
        requester: UserId,
    },
    Transferred {
        request_id: RequestId,
        summary: String,
        from: String,
        to: String,
    },
    Cancelled {
        request_id: RequestId,
        summary: String,
        reason: String,
        requester: UserId,
    },
}

/// Build the notification for an event
#[must_use]
pub fn notification_for(event: &LifecycleEvent, now: DateTime<Utc>) -> NotificationItem {
    let (kind, title, description, recipient, href) = match event {
        LifecycleEvent::RequestFiled {
            request_id,
            kind,
            type_name,
            subject_name,
            department,
            awaiting_approval,
        } => {
            let mut description =
                format!("A {kind} request ({type_name}) was filed for {subject_name} (request {request_id}).");
            if *kind == RequestKind::Offboarding {
                description.push_str(" The employee has been marked inactive.");
            }
            if *awaiting_approval {
                description.push_str(" Awaiting approval.");
            }
            (
                NotificationKind::RequestFiled,
                format!("New {kind} request"),
                description,
                Recipient::Department(department.clone()),
                Some(request_href(*request_id)),
            )
        }
        LifecycleEvent::ApprovalRequired {
            request_id,
            approver,
            subject_name,
            note,
        } => {
            let mut description = format!(
                "Access request {request_id} for {subject_name} needs your approval."
            );
            if let Some(note) = note {
                description.push(' ');
                description.push_str(note);
            }
            (
                NotificationKind::ApprovalRequired,
                "Approval required".to_string(),
                description,
                Recipient::User(approver.clone()),
                Some("/approvals".to_string()),
            )
        }
        LifecycleEvent::TaskCompleted {
            task_id,
            title,
            department,
        } => (
            NotificationKind::TaskCompleted,
            "Task completed".to_string(),
            format!("Task \"{title}\" (ID: {task_id}) has been completed."),
            Recipient::Department(department.clone()),
            Some(format!("/tasks/{task_id}")),
        ),
        LifecycleEvent::HandedOffToHr {
            request_id,
            summary,
            hr,
        } => (
            NotificationKind::HandedOffToHr,
            "Request handed off to HR".to_string(),
            format!("All IT tasks for \"{summary}\" are done. Request {request_id} is now with HR."),
            Recipient::Department(hr.clone()),
            Some(request_href(*request_id)),
        ),
        LifecycleEvent::AwaitingFinalValidation {
            request_id,
            summary,
            hr,
        } => (
            NotificationKind::AwaitingFinalValidation,
            "Final validation required".to_string(),
            format!(
                "All IT tasks for \"{summary}\" are done. Request {request_id} awaits HR final validation."
            ),
            Recipient::Department(hr.clone()),
            Some(request_href(*request_id)),
        ),
        LifecycleEvent::RequestCompleted {
            request_id,
            summary,
            requester,
        } => (
            NotificationKind::RequestCompleted,
            "Request completed".to_string(),
            format!("Request \"{summary}\" (ID: {request_id}) has been completed."),
            Recipient::User(requester.clone()),
            Some(request_href(*request_id)),
        ),
        LifecycleEvent::ApprovalDecided {
            request_id,
            summary,
            decision,
            requester,
        } => {
            let verdict = match decision {
                Decision::Approve => "approved",
                Decision::Reject => "rejected",
            };
            (
                NotificationKind::ApprovalDecided,
                format!("Request {verdict}"),
                format!("Request \"{summary}\" has been {verdict}."),
                Recipient::User(requester.clone()),
                Some(request_href(*request_id)),
            )
        }
        LifecycleEvent::Transferred {
            request_id,
            summary,
            from,
            to,
        } => (
            NotificationKind::Transferred,
            "Request transferred".to_string(),
            format!("Request \"{summary}\" has been transferred from {from} to {to}."),
            Recipient::Department(to.clone()),
            Some(request_href(*request_id)),
        ),
        LifecycleEvent::Cancelled {
            request_id,
            summary,
            reason,
            requester,
        } => (
            NotificationKind::Cancelled,
            "Request cancelled".to_string(),
            format!("Request \"{summary}\" has been cancelled: {reason}"),
            Recipient::User(requester.clone()),
            Some(request_href(*request_id)),
        ),
    };

    NotificationItem {
        id: NotificationId::new(),
        kind,
        title,
        description,
        recipient,
        created_at: now,
        read: false,
        href,
    }
}

fn request_href(id: RequestId) -> String {
    format!("/requests/{id}")
}

/// Delivery failure
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification channel closed")]
    ChannelClosed,
}

/// Where notifications are handed off for delivery
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Hand off one notification. Must not block.
    ///
    /// # Errors
    /// Returns error if the item could not be handed off
    fn deliver(&self, item: &NotificationItem) -> Result<(), DeliveryError>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn deliver(&self, _item: &NotificationItem) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Forwards notifications into an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<NotificationItem>,
}

impl ChannelSink {
    /// Create a sink and the receiving end a delivery task drains
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationItem>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl NotificationSink for ChannelSink {
    fn deliver(&self, item: &NotificationItem) -> Result<(), DeliveryError> {
        self.sender
            .send(item.clone())
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}
