//! Persistence for the single most recent rate snapshot.

pub mod disk;
pub mod memory;

use crate::core::error::StoreError;
use crate::core::snapshot::RateSnapshot;

pub use disk::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

pub trait SnapshotStore: Send + Sync {
    /// Returns the stored snapshot, `Ok(None)` if nothing was stored yet.
    fn load(&self) -> Result<Option<RateSnapshot>, StoreError>;

    /// Replaces the stored snapshot as a whole.
    fn save(&self, snapshot: &RateSnapshot) -> Result<(), StoreError>;
}
