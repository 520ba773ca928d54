//! In-memory document store with failure injection

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::warn;

use crate::error::{Result, SessionError};
use crate::identity::PrincipalId;

use super::store::{ProfileStore, PROFILES_COLLECTION};
use super::types::ProfileRecord;

/// Concurrent map of `(collection, id) -> document`
#[derive(Default)]
pub struct InMemoryProfileStore {
    documents: DashMap<(String, PrincipalId), serde_json::Value>,
    failures_pending: AtomicU32,
    reads: AtomicU64,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile document directly
    pub fn insert_profile(&self, record: &ProfileRecord) -> Result<()> {
        self.documents.insert(
            (PROFILES_COLLECTION.to_string(), record.principal_id.clone()),
            record.to_document()?,
        );
        Ok(())
    }

    /// Make the next `n` reads fail as if the store were unreachable
    pub fn fail_next(&self, n: u32) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> bool {
        self.failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &PrincipalId,
    ) -> Result<Option<serde_json::Value>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            warn!(collection, principal_id = %id, "Injected store failure");
            return Err(SessionError::StoreUnavailable("injected failure".into()));
        }
        Ok(self
            .documents
            .get(&(collection.to_string(), id.clone()))
            .map(|doc| doc.value().clone()))
    }

    async fn put_document(
        &self,
        collection: &str,
        id: &PrincipalId,
        document: serde_json::Value,
    ) -> Result<()> {
        self.documents
            .insert((collection.to_string(), id.clone()), document);
        Ok(())
    }
}
