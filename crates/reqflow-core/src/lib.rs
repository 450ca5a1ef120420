//! reqflow Core - the HR/IT request lifecycle engine
//!
//! Drives onboarding, offboarding and access requests from filing to a
//! terminal status:
//! - Generates department-assigned tasks from checklist templates
//! - Routes access requests to a single approver by system policy
//! - Reconciles request status from task and approval state
//! - Emits notifications for every lifecycle event
//! - Projects an employee's current accesses from granted requests
//!
//! # Example
//!
//! ```rust,ignore
//! use reqflow_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(catalog: Arc<dyn reqflow_catalog::Catalog>) -> EngineResult<()> {
//! let engine = RequestEngine::new(catalog, Arc::new(InMemoryStore::new()), EngineConfig::new());
//!
//! let filed = engine.file_access(form, UserId::from("user_001")).await?;
//! for task in &filed.tasks {
//!     engine.complete_task(task.id, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod forms;
pub mod generator;
pub mod lifecycle;
pub mod locks;
pub mod notify;
pub mod projection;
pub mod router;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DepartmentConfig, EngineConfig};
pub use engine::{Filed, Outcome, RequestEngine};
pub use error::{
    EngineError, EngineResult, EngineWarning, StoreError, TransitionError, ValidationError,
};
pub use forms::{AccessForm, OffboardingForm, OnboardingForm};
pub use generator::{generate_tasks, GeneratedTasks, GenerationContext};
pub use lifecycle::{
    allowed_transitions, reconcile_status, validate_transition, Assignment, ReconcileInput, Rule,
    Transition,
};
pub use locks::RequestLocks;
pub use notify::{
    notification_for, ChannelSink, DeliveryError, LifecycleEvent, NotificationSink, NullSink,
};
pub use projection::{current_accesses, systems_to_revoke, GrantedAccess};
pub use router::{resolve_approver, route_approvals, RoutedApprovals};
pub use store::{ChangeSet, InMemoryStore, RequestStore};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        AccessForm, EngineConfig, EngineError, EngineResult, Filed, InMemoryStore,
        OffboardingForm, OnboardingForm, Outcome, RequestEngine,
    };
    pub use reqflow_model::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::notify::MockNotificationSink;
    use reqflow_catalog::{CatalogData, InMemoryCatalog};
    use reqflow_model::{
        ChecklistTemplate, ChecklistTemplateId, Employee, RequestCategory, RequestStatus,
        RequestTypeDefinition, RequestTypeId, RequestedAccessItem, TaskTemplate, TaskTemplateId,
        UserId,
    };
    use std::sync::Arc;

    fn catalog() -> Arc<InMemoryCatalog> {
        let template = ChecklistTemplate {
            id: ChecklistTemplateId::from("CLT_ACCESS"),
            name: "Access".to_string(),
            description: String::new(),
            task_templates: vec![TaskTemplate {
                id: TaskTemplateId::from("tt_grant"),
                title: "Grant access".to_string(),
                description: String::new(),
                assignee_department: "IT".to_string(),
                order: Some(1),
            }],
        };
        let definition = RequestTypeDefinition {
            id: RequestTypeId::from("access_request_std"),
            name: "Standard access".to_string(),
            description: String::new(),
            applies_to: RequestCategory::Access,
            checklist_template_id: template.id.clone(),
            is_enabled: true,
            requires_hr_validation: false,
        };
        Arc::new(
            InMemoryCatalog::from_data(CatalogData {
                checklist_templates: vec![template],
                request_types: vec![definition],
                ..CatalogData::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn sink_failures_do_not_block_transitions() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .returning(|_| Err(DeliveryError::ChannelClosed));

        let store = Arc::new(InMemoryStore::new());
        let employee = Employee::new("Laura Vidal", "12345678Z", "Finances", "Analyst");
        store
            .commit(ChangeSet {
                employee: Some(employee.clone()),
                ..ChangeSet::default()
            })
            .await
            .unwrap();

        let engine = RequestEngine::new(catalog(), store, EngineConfig::new())
            .with_sink(Arc::new(sink));
        let filed = engine
            .file_access(
                AccessForm {
                    request_type_id: RequestTypeId::from("access_request_std"),
                    target_employee_id: employee.id,
                    items: vec![RequestedAccessItem::new("VPN", "User", "remote work access")],
                },
                UserId::from("user_001"),
            )
            .await
            .unwrap();
        assert_eq!(filed.request.status, RequestStatus::Pending);

        let outcome = engine.complete_task(filed.tasks[0].id, None).await.unwrap();
        assert_eq!(outcome.request.status, RequestStatus::Completed);
        assert_eq!(outcome.notifications.len(), 2);
    }

    #[tokio::test]
    async fn every_notification_reaches_the_sink() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver().times(1).returning(|_| Ok(()));

        let store = Arc::new(InMemoryStore::new());
        let employee = Employee::new("Pau Roca", "87654321X", "Sales", "Rep");
        store
            .commit(ChangeSet {
                employee: Some(employee.clone()),
                ..ChangeSet::default()
            })
            .await
            .unwrap();

        let engine = RequestEngine::new(catalog(), store, EngineConfig::new())
            .with_sink(Arc::new(sink));
        engine
            .file_access(
                AccessForm {
                    request_type_id: RequestTypeId::from("access_request_std"),
                    target_employee_id: employee.id,
                    items: vec![RequestedAccessItem::new("VPN", "User", "remote work access")],
                },
                UserId::from("user_001"),
            )
            .await
            .unwrap();
    }
}
