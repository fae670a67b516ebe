//! In-memory snapshot source for embedding and tests

use std::sync::{PoisonError, RwLock};
use async_trait::async_trait;
use chrono::Utc;
use crate::store::{Snapshot, SnapshotSource};

#[derive(Debug, Default)]
pub struct InMemorySnapshotSource {
    snapshot: RwLock<Snapshot>,
}

impl InMemorySnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self { Self { snapshot: RwLock::new(snapshot) } }

    pub fn replace(&self, snapshot: Snapshot) { *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot; }

    pub fn update(&self, f: impl FnOnce(&mut Snapshot)) { f(&mut self.snapshot.write().unwrap_or_else(PoisonError::into_inner)); }
}

#[async_trait]
impl SnapshotSource for InMemorySnapshotSource {
    async fn load(&self) -> crate::Result<Snapshot> {
        let mut snapshot = self.snapshot.read().unwrap_or_else(PoisonError::into_inner).clone();
        snapshot.taken_at = Some(Utc::now());
        Ok(snapshot)
    }
}
