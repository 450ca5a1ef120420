//! Testing utilities for the reqflow workspace
//!
//! Shared fixtures: the sample catalog, form builders and an engine harness
//! with a pinned clock.

#![allow(missing_docs)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use reqflow_catalog::{CatalogData, InMemoryCatalog};
use reqflow_core::{
    AccessForm, EngineConfig, FixedClock, InMemoryStore, OffboardingForm, OnboardingForm,
    RequestEngine,
};
use reqflow_model::{
    Decision, Employee, EmployeeId, Request, RequestId, RequestStatus, RequestTypeId,
    RequestedAccessItem, UserId,
};
use std::sync::Arc;

/// Sample catalog document shipped under `demos/`
pub const SAMPLE_CATALOG_TOML: &str = include_str!("../../../demos/catalog.toml");

/// Requester used by the fixtures
pub const REQUESTER: &str = "user_002";

/// Parsed sample catalog
pub fn sample_catalog() -> CatalogData {
    CatalogData::from_toml_str(SAMPLE_CATALOG_TOML).unwrap()
}

pub fn sample_catalog_store() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::from_data(sample_catalog()).unwrap())
}

/// Monday 2024-05-06 09:00 UTC
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn requester() -> UserId {
    UserId::from(REQUESTER)
}

pub fn onboarding_form(full_name: &str, nif: &str) -> OnboardingForm {
    OnboardingForm {
        request_type_id: RequestTypeId::from("onboarding_general"),
        full_name: full_name.to_string(),
        nif: nif.to_string(),
        department: "Finances".to_string(),
        role: "Comptable".to_string(),
    }
}

pub fn offboarding_form(employee_id: EmployeeId, last_day: NaiveDate) -> OffboardingForm {
    OffboardingForm {
        request_type_id: RequestTypeId::from("offboarding_standard"),
        employee_id,
        last_day,
        reason: "End of fixed-term contract".to_string(),
    }
}

/// Access form for `systems` under the standard request type
pub fn access_form(employee_id: EmployeeId, systems: &[&str]) -> AccessForm {
    access_form_of("access_request_std", employee_id, systems)
}

pub fn access_form_of(request_type: &str, employee_id: EmployeeId, systems: &[&str]) -> AccessForm {
    AccessForm {
        request_type_id: RequestTypeId::from(request_type),
        target_employee_id: employee_id,
        items: systems
            .iter()
            .map(|s| RequestedAccessItem::new(*s, "Lectura i Escriptura", "Needed for daily work"))
            .collect(),
    }
}

/// Engine over the sample catalog, an in-memory store and a fixed clock
pub struct TestHarness {
    pub engine: Arc<RequestEngine>,
    pub store: Arc<InMemoryStore>,
    pub catalog: Arc<InMemoryCatalog>,
    pub clock: Arc<FixedClock>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_catalog(sample_catalog_store(), config)
    }

    pub fn with_catalog(catalog: Arc<InMemoryCatalog>, config: EngineConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(start_time()));
        let engine = RequestEngine::new(catalog.clone(), store.clone(), config)
            .with_clock(clock.clone());
        Self {
            engine: Arc::new(engine),
            store,
            catalog,
            clock,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Onboard an employee and drive the request to completion
    pub async fn seed_employee(&self, full_name: &str, nif: &str) -> Employee {
        let filed = self
            .engine
            .file_onboarding(onboarding_form(full_name, nif), requester())
            .await
            .unwrap();
        self.complete_request(filed.request.id).await;
        self.engine.employee(filed.employee.id).await.unwrap()
    }

    /// File and complete an access request, approving it if gated
    pub async fn grant(&self, employee_id: EmployeeId, systems: &[&str]) -> Request {
        let filed = self
            .engine
            .file_access(access_form(employee_id, systems), requester())
            .await
            .unwrap();
        if let Some(approval) = filed.approval {
            self.engine
                .resolve_approval(approval.id, Decision::Approve, None)
                .await
                .unwrap();
        }
        self.complete_request(filed.request.id).await
    }

    /// Complete every open task, finalizing when the request stops in an HR stage
    pub async fn complete_request(&self, request_id: RequestId) -> Request {
        for task in self.engine.tasks_for(request_id).await.unwrap() {
            if !task.is_completed() {
                self.advance(Duration::minutes(5));
                self.engine.complete_task(task.id, None).await.unwrap();
            }
        }
        let request = self.engine.request(request_id).await.unwrap();
        if matches!(
            request.status,
            RequestStatus::PendingHrProcessing | RequestStatus::PendingFinalValidation
        ) {
            return self.engine.finalize(request_id).await.unwrap().request;
        }
        request
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
