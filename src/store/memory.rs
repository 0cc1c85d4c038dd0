use crate::core::error::StoreError;
use crate::core::snapshot::RateSnapshot;
use crate::store::SnapshotStore;
use std::sync::Mutex;
use tracing::debug;

/// In-memory snapshot store, nothing outlives the process.
#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Option<RateSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RateSnapshot) -> Self {
        Self {
            inner: Mutex::new(Some(snapshot)),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<RateSnapshot>, StoreError> {
        let stored = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("snapshot lock poisoned"))?;
        debug!(present = stored.is_some(), "Memory snapshot LOAD");
        Ok(stored.clone())
    }

    fn save(&self, snapshot: &RateSnapshot) -> Result<(), StoreError> {
        let mut stored = self
            .inner
            .lock()
            .map_err(|_| std::io::Error::other("snapshot lock poisoned"))?;
        debug!(base = %snapshot.base, "Memory snapshot SAVE");
        *stored = Some(snapshot.clone());
        Ok(())
    }
}
