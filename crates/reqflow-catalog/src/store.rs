//! Catalog lookups and the in-memory store
//!
//! The engine reads reference data through the [`Catalog`] trait only.
//! [`InMemoryCatalog`] keeps one validated [`CatalogData`] snapshot behind a
//! read-write lock: lookups share the read side, admin upserts validate a
//! candidate copy and swap it in.

use crate::data::CatalogData;
use crate::error::CatalogError;
use crate::validation::CatalogIssue;
use parking_lot::RwLock;
use reqflow_model::{
    AccessLevel, ChecklistTemplate, ChecklistTemplateId, Department, RequestTypeDefinition,
    RequestTypeId, System, User, UserId,
};
use std::fmt;
use std::path::Path;

/// Read-only access to reference data
pub trait Catalog: Send + Sync + fmt::Debug {
    /// Checklist template by id
    fn checklist_template(&self, id: &ChecklistTemplateId) -> Option<ChecklistTemplate>;

    /// Request type definition by id
    fn request_type(&self, id: &RequestTypeId) -> Option<RequestTypeDefinition>;

    /// System by display name (access items refer to systems by name)
    fn system_by_name(&self, name: &str) -> Option<System>;

    /// Every application user, in catalog order
    fn users(&self) -> Vec<User>;

    /// User by id
    fn user(&self, id: &UserId) -> Option<User>;

    /// Every department
    fn departments(&self) -> Vec<Department>;

    /// Every access level
    fn access_levels(&self) -> Vec<AccessLevel>;
}

/// Catalog held in memory
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    data: RwLock<CatalogData>,
}

impl InMemoryCatalog {
    /// Empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from data, rejecting it if any rule is broken
    ///
    /// # Errors
    /// Returns the first blocking [`CatalogIssue`]
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        check(&data)?;
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    /// Load and validate a catalog file
    ///
    /// # Errors
    /// Returns error on read, parse or validation failure
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let data = CatalogData::read_file(path)?;
        tracing::info!(
            path = %path.display(),
            templates = data.checklist_templates.len(),
            request_types = data.request_types.len(),
            systems = data.systems.len(),
            "Loaded catalog"
        );
        Self::from_data(data)
    }

    /// Copy of the current contents
    #[must_use]
    pub fn snapshot(&self) -> CatalogData {
        self.data.read().clone()
    }

    /// Insert or replace a checklist template
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_checklist_template(&self, template: ChecklistTemplate) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.checklist_templates, template, |t| &t.id))
    }

    /// Insert or replace a request type definition
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_request_type(&self, definition: RequestTypeDefinition) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.request_types, definition, |d| &d.id))
    }

    /// Insert or replace a system
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_system(&self, system: System) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.systems, system, |s| &s.id))
    }

    /// Insert or replace a user
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_user(&self, user: User) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.users, user, |u| &u.id))
    }

    /// Insert or replace a department
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_department(&self, department: Department) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.departments, department, |d| &d.id))
    }

    /// Insert or replace an access level
    ///
    /// # Errors
    /// Returns error if the result would break a catalog rule
    pub fn upsert_access_level(&self, level: AccessLevel) -> Result<(), CatalogError> {
        self.apply(|data| replace_or_push(&mut data.access_levels, level, |l| &l.id))
    }

    fn apply(&self, change: impl FnOnce(&mut CatalogData)) -> Result<(), CatalogError> {
        let mut guard = self.data.write();
        let mut candidate = guard.clone();
        change(&mut candidate);
        check(&candidate)?;
        *guard = candidate;
        Ok(())
    }
}

impl Catalog for InMemoryCatalog {
    fn checklist_template(&self, id: &ChecklistTemplateId) -> Option<ChecklistTemplate> {
        self.data
            .read()
            .checklist_templates
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    fn request_type(&self, id: &RequestTypeId) -> Option<RequestTypeDefinition> {
        self.data
            .read()
            .request_types
            .iter()
            .find(|d| &d.id == id)
            .cloned()
    }

    fn system_by_name(&self, name: &str) -> Option<System> {
        self.data
            .read()
            .systems
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    fn users(&self) -> Vec<User> {
        self.data.read().users.clone()
    }

    fn user(&self, id: &UserId) -> Option<User> {
        self.data.read().users.iter().find(|u| &u.id == id).cloned()
    }

    fn departments(&self) -> Vec<Department> {
        self.data.read().departments.clone()
    }

    fn access_levels(&self) -> Vec<AccessLevel> {
        self.data.read().access_levels.clone()
    }
}

fn check(data: &CatalogData) -> Result<(), CatalogError> {
    let issues = data.validate();
    for warning in issues.iter().filter(|i| !i.is_error()) {
        tracing::warn!(issue = %warning, "Catalog warning");
    }
    match issues.into_iter().find(CatalogIssue::is_error) {
        Some(issue) => Err(CatalogError::Invalid(issue)),
        None => Ok(()),
    }
}

fn replace_or_push<T, K: PartialEq>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &K) {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}
