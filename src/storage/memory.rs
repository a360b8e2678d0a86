use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use super::{Snapshot, SnapshotStore};
use crate::errors::{ChoreError, Result};

/// In-memory snapshot store for tests and embedding without a filesystem.
///
/// Stores the serialized document rather than the struct so round-trips
/// exercise the same serde path as the JSON backend. `fail_saves` lets tests
/// verify the coordinator's rollback-on-persistence-failure contract.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    document: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        let guard = self
            .document
            .lock()
            .map_err(|_| ChoreError::Persistence("memory store lock poisoned".into()))?;
        match guard.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ChoreError::Persistence(
                "memory store configured to fail saves".into(),
            ));
        }
        let raw = serde_json::to_string(snapshot)?;
        let mut guard = self
            .document
            .lock()
            .map_err(|_| ChoreError::Persistence("memory store lock poisoned".into()))?;
        *guard = Some(raw);
        Ok(())
    }
}

impl SnapshotStore for std::sync::Arc<MemorySnapshotStore> {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }
}
