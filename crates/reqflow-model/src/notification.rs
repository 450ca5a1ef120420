//! In-app notifications

use crate::ids::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    RequestFiled,
    ApprovalRequired,
    TaskCompleted,
    HandedOffToHr,
    AwaitingFinalValidation,
    RequestCompleted,
    ApprovalDecided,
    Transferred,
    Cancelled,
}

/// Who a notification is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "to", content = "id", rename_all = "camelCase")]
pub enum Recipient {
    User(UserId),
    Department(String),
    Everyone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub recipient: Recipient,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// In-app link to the subject
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}
