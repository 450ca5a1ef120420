//! Employee access projection
//!
//! An employee's current accesses are not stored anywhere: they are the
//! items of every access request targeting them that reached `approved` or
//! `completed`.

use indexmap::IndexSet;
use reqflow_model::{EmployeeId, Request, RequestId, RequestStatus, RequestedAccessItem};
use serde::Serialize;

/// One access an employee currently holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedAccess {
    /// Request that granted it
    pub request_id: RequestId,
    pub item: RequestedAccessItem,
}

/// Accesses granted to `employee`, flattened in request order
pub fn current_accesses<'a>(
    employee: EmployeeId,
    requests: impl IntoIterator<Item = &'a Request>,
) -> Vec<GrantedAccess> {
    requests
        .into_iter()
        .filter(|r| r.target_employee_id() == Some(employee))
        .filter(|r| matches!(r.status, RequestStatus::Approved | RequestStatus::Completed))
        .flat_map(|r| {
            r.requested_accesses().iter().map(|item| GrantedAccess {
                request_id: r.id,
                item: item.clone(),
            })
        })
        .collect()
}

/// Distinct system names among `accesses`, first-seen order
#[must_use]
pub fn systems_to_revoke(accesses: &[GrantedAccess]) -> Vec<String> {
    accesses
        .iter()
        .map(|a| a.item.system.clone())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use reqflow_model::{RequestDetails, RequestTypeId, UserId};

    fn access(employee: EmployeeId, status: RequestStatus, systems: &[&str]) -> Request {
        let now = Utc::now();
        Request {
            id: RequestId::new(),
            request_type_id: RequestTypeId::from("access_request_std"),
            subject: employee,
            requester_id: UserId::from("user_001"),
            status,
            assigned_department: "Informàtica".to_string(),
            created_at: now,
            updated_at: now,
            summary: "access".to_string(),
            details: RequestDetails::Access {
                requested_accesses: systems
                    .iter()
                    .map(|s| RequestedAccessItem::new(*s, "Read", "needed for work"))
                    .collect(),
                multi_system_approval_note: None,
            },
            closing: None,
        }
    }

    #[test]
    fn only_granted_requests_count() {
        let employee = EmployeeId::new();
        let other = EmployeeId::new();
        let requests = vec![
            access(employee, RequestStatus::Completed, &["ERP", "VPN"]),
            access(employee, RequestStatus::PendingManagerApproval, &["CRM"]),
            access(employee, RequestStatus::Rejected, &["BI"]),
            access(employee, RequestStatus::Approved, &["ERP"]),
            access(other, RequestStatus::Completed, &["CRM"]),
        ];

        let granted = current_accesses(employee, &requests);
        let systems: Vec<&str> = granted.iter().map(|g| g.item.system.as_str()).collect();
        assert_eq!(systems, vec!["ERP", "VPN", "ERP"]);
        assert_eq!(systems_to_revoke(&granted), vec!["ERP", "VPN"]);
    }

    #[test]
    fn no_requests_means_no_access() {
        let granted = current_accesses(EmployeeId::new(), &[]);
        assert!(granted.is_empty());
        assert!(systems_to_revoke(&granted).is_empty());
    }
}
