//! reqflow Model - entities of the HR/IT request lifecycle
//!
//! Plain data shared by every reqflow crate:
//! - Typed ids (ULID for runtime entities, strings for reference data)
//! - Employees, requests, tasks, approvals and notifications
//! - Reference data: users, systems, checklist templates, request types
//! - Approval policies in their legacy string form
//!
//! Everything here is serde-serializable with camelCase field names.

#![allow(missing_docs)]

pub mod approval;
pub mod employee;
pub mod ids;
pub mod notification;
pub mod policy;
pub mod reference;
pub mod request;
pub mod task;

pub use approval::{Approval, ApprovalStatus, Decision};
pub use employee::{Employee, EmployeeStatus};
pub use ids::{
    AccessLevelId, ApprovalId, ChecklistTemplateId, DepartmentId, EmployeeId, NotificationId,
    RequestId, RequestTypeId, SystemId, TaskId, TaskTemplateId, UserId,
};
pub use notification::{NotificationItem, NotificationKind, Recipient};
pub use policy::ApproverPolicy;
pub use reference::{
    AccessLevel, ChecklistTemplate, Department, RequestCategory, RequestTypeDefinition, System,
    TaskTemplate, User,
};
pub use request::{
    ClosingNote, Request, RequestDetails, RequestKind, RequestStatus, RequestedAccessItem,
};
pub use task::{Task, TaskStatus};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with reqflow entities
    pub use crate::{
        Approval, ApprovalStatus, Decision, Employee, EmployeeId, Request, RequestDetails,
        RequestId, RequestKind, RequestStatus, RequestedAccessItem, Task, TaskId, TaskStatus,
        UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
