use std::{
    env, fs,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use dirs::home_dir;

use super::{Snapshot, SnapshotStore};
use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".chore_core";
const SNAPSHOT_FILE: &str = "snapshot.json";
const TMP_SUFFIX: &str = "tmp";

/// File-backed snapshot store: one pretty-printed JSON document, written
/// atomically via a temp file and rename.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    snapshot_file: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(default_data_dir);
        ensure_dir(&root)?;
        Ok(Self {
            snapshot_file: root.join(SNAPSHOT_FILE),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_file
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if !self.snapshot_file.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.snapshot_file)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = tmp_path(&self.snapshot_file);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.snapshot_file)?;
        Ok(())
    }
}

/// Application data directory, defaulting to `~/.chore_core` with a
/// `CHORE_CORE_HOME` override.
pub fn default_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("CHORE_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Child, EntryKind, PointsLedger};
    use tempfile::TempDir;

    fn store_with_temp_dir() -> (JsonSnapshotStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonSnapshotStore::new(Some(temp.path().to_path_buf())).expect("json store");
        (store, temp)
    }

    #[test]
    fn new_default_honors_home_override() {
        let temp = TempDir::new().expect("temp dir");
        env::set_var("CHORE_CORE_HOME", temp.path());
        let store = JsonSnapshotStore::new_default().expect("json store");
        env::remove_var("CHORE_CORE_HOME");

        assert_eq!(
            store.snapshot_path(),
            temp.path().join(SNAPSHOT_FILE)
        );
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn load_absent_snapshot_returns_none() {
        let (store, _guard) = store_with_temp_dir();
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (store, _guard) = store_with_temp_dir();
        let mut ledger = PointsLedger::new();
        ledger.add_child(Child::new("alice", "Alice")).unwrap();
        ledger
            .append("alice", 10, "chore", EntryKind::Earn, None)
            .unwrap();
        let snapshot = Snapshot::new(
            ledger,
            Default::default(),
            Default::default(),
            Default::default(),
        );

        store.save(&snapshot).expect("save snapshot");
        let loaded = store.load().expect("load").expect("snapshot present");
        assert_eq!(loaded.schema_version, snapshot.schema_version);
        assert_eq!(loaded.ledger.balance("alice"), 10);
        assert_eq!(loaded.ledger.entries, snapshot.ledger.entries);
    }

    #[test]
    fn failed_write_preserves_existing_file() {
        let (store, _guard) = store_with_temp_dir();
        store.save(&Snapshot::empty()).expect("initial save");
        let original = fs::read_to_string(store.snapshot_path()).unwrap();

        // A directory at the temp path forces File::create to fail.
        let tmp = tmp_path(store.snapshot_path());
        fs::create_dir_all(&tmp).unwrap();
        let result = store.save(&Snapshot::empty());
        assert!(result.is_err(), "save must fail when temp path is blocked");

        let current = fs::read_to_string(store.snapshot_path()).unwrap();
        assert_eq!(current, original, "original snapshot must be intact");
        let _ = fs::remove_dir_all(&tmp);
    }
}
