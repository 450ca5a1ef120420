//! Approval routing for access requests
//!
//! Each requested system is looked up by name; a system with an approval
//! policy makes the whole request need approval. One approval is created
//! per request, addressed to the approver of the first policy encountered.
//! When items carry more than one distinct policy, a note is attached so the
//! approver knows to review all of them.

use crate::config::EngineConfig;
use crate::error::EngineWarning;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use reqflow_catalog::Catalog;
use reqflow_model::{
    Approval, ApprovalId, ApprovalStatus, ApproverPolicy, RequestId, RequestStatus,
    RequestedAccessItem, User, UserId,
};

/// Routing outcome
#[derive(Debug, Clone)]
pub struct RoutedApprovals {
    /// The single approval gating the request, if any system needs one
    pub approval: Option<Approval>,
    pub initial_status: RequestStatus,
    /// Multi-policy note, stored on the request
    pub note: Option<String>,
    pub warnings: Vec<EngineWarning>,
}

/// Decide whether (and by whom) an access request must be approved
pub fn route_approvals(
    request_id: RequestId,
    items: &[RequestedAccessItem],
    catalog: &dyn Catalog,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> RoutedApprovals {
    let mut warnings = Vec::new();
    let mut policies: IndexSet<ApproverPolicy> = IndexSet::new();

    for item in items {
        match catalog.system_by_name(&item.system) {
            Some(system) if system.approval_policy.requires_approval() => {
                policies.insert(system.approval_policy);
            }
            Some(_) => {}
            None => {
                tracing::warn!(%request_id, system = %item.system, "Unknown system in access request");
                warnings.push(EngineWarning::UnknownSystem {
                    system: item.system.clone(),
                });
            }
        }
    }

    let Some(first) = policies.first() else {
        return RoutedApprovals {
            approval: None,
            initial_status: RequestStatus::Pending,
            note: None,
            warnings,
        };
    };

    let approver_id = match resolve_approver(first, &catalog.users(), config) {
        Some(id) => id,
        None => {
            tracing::warn!(
                %request_id,
                policy = %first,
                fallback = %config.default_approver_id,
                "No approver matches policy; using default approver"
            );
            warnings.push(EngineWarning::ApproverFallback {
                policy: first.to_string(),
                approver: config.default_approver_id.to_string(),
            });
            config.default_approver_id.clone()
        }
    };

    let note = (policies.len() > 1).then(|| config.multi_system_approval_note.clone());
    let approval = Approval {
        id: ApprovalId::new(),
        request_id,
        approver_id,
        status: ApprovalStatus::Pending,
        comments: note.as_ref().map(|n| format!("Note: {n}")).unwrap_or_default(),
        created_at: now,
        updated_at: now,
        approved_at: None,
    };

    tracing::debug!(
        %request_id,
        approver = %approval.approver_id,
        policies = policies.len(),
        "Routed approval"
    );

    RoutedApprovals {
        approval: Some(approval),
        initial_status: RequestStatus::PendingManagerApproval,
        note,
        warnings,
    }
}

/// Find the user a policy designates
///
/// - `Role(r)`: an IT-department user holding `r`, else any user holding
///   both the IT and manager roles
/// - `NamedUser(n)`: exact match on name or login
/// - anything else designates no one
#[must_use]
pub fn resolve_approver(
    policy: &ApproverPolicy,
    users: &[User],
    config: &EngineConfig,
) -> Option<UserId> {
    match policy {
        ApproverPolicy::Role(role) => users
            .iter()
            .find(|u| {
                u.has_role(role) && u.departments.iter().any(|d| config.departments.is_it(d))
            })
            .or_else(|| {
                users
                    .iter()
                    .find(|u| u.has_role(&config.it_role) && u.has_role(&config.manager_role))
            })
            .map(|u| u.id.clone()),
        ApproverPolicy::NamedUser(name) => users
            .iter()
            .find(|u| u.name.as_deref() == Some(name.as_str()) || &u.sam_account_name == name)
            .map(|u| u.id.clone()),
        ApproverPolicy::None | ApproverPolicy::Custom(_) => None,
    }
}
