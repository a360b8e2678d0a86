pub mod json_backend;
pub mod memory;
pub mod snapshot;

use crate::errors::Result;

pub use json_backend::JsonSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use snapshot::{Snapshot, SNAPSHOT_SCHEMA_VERSION};

/// Persistence port: load and save the versioned snapshot of all core state.
pub trait SnapshotStore: Send + Sync {
    /// Returns the stored snapshot, or `None` when nothing was persisted yet.
    fn load(&self) -> Result<Option<Snapshot>>;
    fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
