//! Request store
//!
//! The engine persists through [`RequestStore`]. Each engine operation
//! computes its full outcome first and writes it as one [`ChangeSet`], so a
//! rejected operation never leaves partial writes behind.
//!
//! [`InMemoryStore`] keeps requests in filing order (the access projection
//! depends on it) and everything else in concurrent maps.

use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use reqflow_model::{
    Approval, ApprovalId, Employee, EmployeeId, NotificationItem, Request, RequestId, Task, TaskId,
};

/// Writes produced by one engine operation
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub employee: Option<Employee>,
    pub request: Option<Request>,
    pub tasks: Vec<Task>,
    pub approvals: Vec<Approval>,
    /// In emission order
    pub notifications: Vec<NotificationItem>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.employee.is_none()
            && self.request.is_none()
            && self.tasks.is_empty()
            && self.approvals.is_empty()
            && self.notifications.is_empty()
    }
}

/// Persistence used by the engine
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Apply every write in `changes` (upserts by id)
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;

    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn employee_by_nif(&self, nif: &str) -> Result<Option<Employee>, StoreError>;

    async fn employees(&self) -> Result<Vec<Employee>, StoreError>;

    async fn request(&self, id: RequestId) -> Result<Option<Request>, StoreError>;

    /// Every request, in filing order
    async fn requests(&self) -> Result<Vec<Request>, StoreError>;

    async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    /// Tasks of one request, sorted by order
    async fn tasks_for(&self, request_id: RequestId) -> Result<Vec<Task>, StoreError>;

    async fn tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn approval(&self, id: ApprovalId) -> Result<Option<Approval>, StoreError>;

    async fn approvals_for(&self, request_id: RequestId) -> Result<Vec<Approval>, StoreError>;

    async fn approvals(&self) -> Result<Vec<Approval>, StoreError>;

    /// Most recent first
    async fn notifications(&self) -> Result<Vec<NotificationItem>, StoreError>;
}

/// Store held in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    employees: DashMap<EmployeeId, Employee>,
    requests: RwLock<IndexMap<RequestId, Request>>,
    tasks: DashMap<TaskId, Task>,
    approvals: DashMap<ApprovalId, Approval>,
    notifications: Mutex<Vec<NotificationItem>>,
}

impl InMemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        if let Some(employee) = changes.employee {
            self.employees.insert(employee.id, employee);
        }
        if let Some(request) = changes.request {
            self.requests.write().insert(request.id, request);
        }
        for task in changes.tasks {
            self.tasks.insert(task.id, task);
        }
        for approval in changes.approvals {
            self.approvals.insert(approval.id, approval);
        }
        if !changes.notifications.is_empty() {
            let mut stored = self.notifications.lock();
            for item in changes.notifications {
                stored.insert(0, item);
            }
        }
        Ok(())
    }

    async fn employee(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.employees.get(&id).map(|e| e.clone()))
    }

    async fn employee_by_nif(&self, nif: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self
            .employees
            .iter()
            .find(|e| e.nif == nif)
            .map(|e| e.value().clone()))
    }

    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        let mut employees: Vec<Employee> = self.employees.iter().map(|e| e.value().clone()).collect();
        employees.sort_by_key(|e| e.id);
        Ok(employees)
    }

    async fn request(&self, id: RequestId) -> Result<Option<Request>, StoreError> {
        Ok(self.requests.read().get(&id).cloned())
    }

    async fn requests(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.requests.read().values().cloned().collect())
    }

    async fn task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.get(&id).map(|t| t.clone()))
    }

    async fn tasks_for(&self, request_id: RequestId) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| t.request_id == request_id)
            .map(|t| t.value().clone())
            .collect();
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    async fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self.tasks.iter().map(|t| t.value().clone()).collect();
        tasks.sort_by_key(|t| (t.created_at, t.request_id, t.order));
        Ok(tasks)
    }

    async fn approval(&self, id: ApprovalId) -> Result<Option<Approval>, StoreError> {
        Ok(self.approvals.get(&id).map(|a| a.clone()))
    }

    async fn approvals_for(&self, request_id: RequestId) -> Result<Vec<Approval>, StoreError> {
        Ok(self
            .approvals
            .iter()
            .filter(|a| a.request_id == request_id)
            .map(|a| a.value().clone())
            .collect())
    }

    async fn approvals(&self) -> Result<Vec<Approval>, StoreError> {
        let mut approvals: Vec<Approval> = self.approvals.iter().map(|a| a.value().clone()).collect();
        approvals.sort_by_key(|a| a.created_at);
        Ok(approvals)
    }

    async fn notifications(&self) -> Result<Vec<NotificationItem>, StoreError> {
        Ok(self.notifications.lock().clone())
    }
}
