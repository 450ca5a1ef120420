//! Lifecycle simulation
//!
//! Runs scripted requests through a fresh engine over a catalog and reports
//! where each one ended. Request types and systems are picked from the
//! catalog itself, so any valid catalog can be exercised.

use anyhow::{bail, Context};
use chrono::Duration;
use reqflow_catalog::{CatalogData, InMemoryCatalog};
use reqflow_core::{
    AccessForm, Clock, EngineConfig, Filed, InMemoryStore, OffboardingForm, OnboardingForm,
    RequestEngine, SystemClock,
};
use reqflow_model::{
    Decision, EmployeeId, RequestCategory, RequestId, RequestStatus, RequestTypeId,
    RequestedAccessItem, UserId,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Scripted request run by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scenario {
    /// Access to a system that needs no approval
    Access,
    /// Gated access, approved
    Approval,
    /// Gated access, rejected
    Rejection,
    /// Leaver with everything granted so far revoked
    Offboarding,
}

impl Scenario {
    pub(crate) const ALL: [Self; 4] = [
        Self::Access,
        Self::Approval,
        Self::Rejection,
        Self::Offboarding,
    ];

    pub(crate) fn parse(name: &str) -> Option<Vec<Self>> {
        match name {
            "all" => Some(Self::ALL.to_vec()),
            "access" => Some(vec![Self::Access]),
            "approval" => Some(vec![Self::Approval]),
            "rejection" => Some(vec![Self::Rejection]),
            "offboarding" => Some(vec![Self::Offboarding]),
            _ => None,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access",
            Self::Approval => "approval",
            Self::Rejection => "rejection",
            Self::Offboarding => "offboarding",
        };
        f.write_str(name)
    }
}

/// Where one scripted request ended
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunReport {
    pub(crate) scenario: String,
    pub(crate) request_id: String,
    pub(crate) summary: String,
    pub(crate) path: Vec<RequestStatus>,
    pub(crate) tasks: usize,
    pub(crate) notifications: usize,
    pub(crate) warnings: Vec<String>,
}

impl RunReport {
    pub(crate) fn final_status(&self) -> Option<RequestStatus> {
        self.path.last().copied()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path: Vec<&str> = self.path.iter().map(|s| s.as_str()).collect();
        writeln!(f, "[{}] {}", self.scenario, self.summary)?;
        writeln!(f, "  request:       {}", self.request_id)?;
        writeln!(f, "  path:          {}", path.join(" -> "))?;
        writeln!(f, "  tasks:         {}", self.tasks)?;
        writeln!(f, "  notifications: {}", self.notifications)?;
        for warning in &self.warnings {
            writeln!(f, "  warning:       {warning}")?;
        }
        Ok(())
    }
}

/// Scripted driver over one engine
pub(crate) struct Simulator {
    engine: RequestEngine,
    data: CatalogData,
    clock: Arc<dyn Clock>,
    requester: UserId,
}

impl Simulator {
    /// # Errors
    /// Returns error if the catalog does not validate
    pub(crate) fn new(data: CatalogData, config: EngineConfig) -> anyhow::Result<Self> {
        let catalog = Arc::new(InMemoryCatalog::from_data(data.clone())?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let requester = data
            .users
            .first()
            .map_or_else(|| config.default_approver_id.clone(), |u| u.id.clone());
        let engine = RequestEngine::new(catalog, Arc::new(InMemoryStore::new()), config)
            .with_clock(Arc::clone(&clock));
        Ok(Self {
            engine,
            data,
            clock,
            requester,
        })
    }

    /// Onboard one employee, then run `scenarios` against them in order
    ///
    /// # Errors
    /// Returns error if the catalog lacks what a scenario needs or an engine
    /// operation fails
    pub(crate) async fn run(&self, scenarios: &[Scenario]) -> anyhow::Result<Vec<RunReport>> {
        let mut reports = Vec::new();

        let filed = self
            .engine
            .file_onboarding(
                OnboardingForm {
                    request_type_id: self.request_type(RequestCategory::Onboarding)?,
                    full_name: "Sofia Pons".to_string(),
                    nif: "12121212S".to_string(),
                    department: "Operacions".to_string(),
                    role: "Analista de Dades".to_string(),
                },
                self.requester.clone(),
            )
            .await?;
        let employee_id = filed.employee.id;
        reports.push(self.drive("onboarding", filed, None).await?);

        for scenario in scenarios {
            tracing::debug!(%scenario, "Running scenario");
            let report = match scenario {
                Scenario::Access => {
                    let system = self.system(false)?;
                    let filed = self.file_access(employee_id, &system).await?;
                    self.drive("access", filed, None).await?
                }
                Scenario::Approval => {
                    let system = self.system(true)?;
                    let filed = self.file_access(employee_id, &system).await?;
                    self.drive("approval", filed, Some((Decision::Approve, None)))
                        .await?
                }
                Scenario::Rejection => {
                    let system = self.system(true)?;
                    let filed = self.file_access(employee_id, &system).await?;
                    let comment = Some("policy violation".to_string());
                    self.drive("rejection", filed, Some((Decision::Reject, comment)))
                        .await?
                }
                Scenario::Offboarding => {
                    let filed = self
                        .engine
                        .file_offboarding(
                            OffboardingForm {
                                request_type_id: self.request_type(RequestCategory::Offboarding)?,
                                employee_id,
                                last_day: self.clock.today() + Duration::days(14),
                                reason: "Voluntary resignation".to_string(),
                            },
                            self.requester.clone(),
                        )
                        .await?;
                    self.drive("offboarding", filed, None).await?
                }
            };
            reports.push(report);
        }
        Ok(reports)
    }

    async fn file_access(&self, employee_id: EmployeeId, system: &str) -> anyhow::Result<Filed> {
        let form = AccessForm {
            request_type_id: self.request_type(RequestCategory::Access)?,
            target_employee_id: employee_id,
            items: vec![RequestedAccessItem::new(
                system,
                "Lectura i Escriptura",
                "Needed for daily reporting",
            )],
        };
        Ok(self.engine.file_access(form, self.requester.clone()).await?)
    }

    /// Resolve the approval (if any), complete every task and close out HR
    /// stages, recording each status the request passes through
    async fn drive(
        &self,
        scenario: &str,
        filed: Filed,
        decision: Option<(Decision, Option<String>)>,
    ) -> anyhow::Result<RunReport> {
        let request_id = filed.request.id;
        let mut path = vec![filed.request.status];
        let mut notifications = filed.notifications.len();
        let warnings: Vec<String> = filed.warnings.iter().map(ToString::to_string).collect();

        if let (Some(approval), Some((decision, comments))) = (&filed.approval, decision) {
            let outcome = self
                .engine
                .resolve_approval(approval.id, decision, comments)
                .await?;
            notifications += outcome.notifications.len();
            path.extend(outcome.transitions.iter().map(|t| t.to));
        }

        for task in &filed.tasks {
            if self.status(request_id).await?.is_terminal() {
                break;
            }
            let outcome = self.engine.complete_task(task.id, None).await?;
            notifications += outcome.notifications.len();
            path.extend(outcome.transitions.iter().map(|t| t.to));
        }

        if matches!(
            self.status(request_id).await?,
            RequestStatus::PendingHrProcessing | RequestStatus::PendingFinalValidation
        ) {
            let outcome = self.engine.finalize(request_id).await?;
            notifications += outcome.notifications.len();
            path.push(outcome.request.status);
        }

        tracing::info!(%request_id, scenario, status = ?path.last(), "Scenario finished");
        Ok(RunReport {
            scenario: scenario.to_string(),
            request_id: request_id.to_string(),
            summary: filed.request.summary,
            path,
            tasks: filed.tasks.len(),
            notifications,
            warnings,
        })
    }

    async fn status(&self, request_id: RequestId) -> anyhow::Result<RequestStatus> {
        Ok(self.engine.request(request_id).await?.status)
    }

    fn request_type(&self, category: RequestCategory) -> anyhow::Result<RequestTypeId> {
        self.data
            .request_types
            .iter()
            .find(|t| t.is_enabled && t.applies_to == category && !t.requires_hr_validation)
            .map(|t| t.id.clone())
            .with_context(|| format!("catalog has no enabled {category:?} request type"))
    }

    fn system(&self, gated: bool) -> anyhow::Result<String> {
        match self
            .data
            .systems
            .iter()
            .find(|s| s.approval_policy.requires_approval() == gated)
        {
            Some(system) => Ok(system.name.clone()),
            None if gated => bail!("catalog has no system that requires approval"),
            None => bail!("catalog has no system without an approval policy"),
        }
    }
}
