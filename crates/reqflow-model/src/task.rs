//! Tasks: department-assigned work items attached to a request

use crate::ids::{ChecklistTemplateId, RequestId, TaskId, TaskTemplateId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task progress. Moves forward only; `Completed` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    #[inline]
    #[must_use]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
        })
    }
}

/// A concrete work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub request_id: RequestId,
    /// Template provenance; absent for synthesized tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_template_id: Option<ChecklistTemplateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_template_id: Option<TaskTemplateId>,
    pub title: String,
    pub description: String,
    pub assignee_department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    pub status: TaskStatus,
    #[serde(default)]
    pub observations: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Hidden from task lists before this day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_from: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Whether the task shows up in task lists on `today`
    #[must_use]
    pub fn is_visible_on(&self, today: NaiveDate) -> bool {
        self.visible_from.map_or(true, |from| from <= today)
    }
}
