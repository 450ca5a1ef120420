//! Per-request write serialization
//!
//! Task completion, approval resolution, transfer and cancellation all
//! read then write the same request. Each takes the request's lock first
//! and re-reads state inside it. Different requests never contend.

use dashmap::DashMap;
use reqflow_model::RequestId;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by request id
#[derive(Debug, Default)]
pub struct RequestLocks {
    locks: DashMap<RequestId, Arc<Mutex<()>>>,
}

impl RequestLocks {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one request
    pub async fn acquire(&self, id: RequestId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(id).or_default().clone();
        lock.lock_owned().await
    }

    /// Number of requests with a lock entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
