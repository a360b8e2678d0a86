use serde::{Deserialize, Serialize};

use crate::approval::ApprovalQueue;
use crate::chores::ChoreRegistry;
use crate::errors::{ChoreError, Result};
use crate::ledger::PointsLedger;
use crate::rewards::RewardBook;

/// Current snapshot schema. v1 predates the alias table, the generation log,
/// the rejected pool, and the `reset_on_claim` flag; all of those deserialize
/// to defaults, so migration is purely additive.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 2;

/// Versioned serialized form of all core state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "schema_version_default")]
    pub schema_version: u32,
    #[serde(default)]
    pub ledger: PointsLedger,
    #[serde(default)]
    pub registry: ChoreRegistry,
    #[serde(default)]
    pub approvals: ApprovalQueue,
    #[serde(default)]
    pub rewards: RewardBook,
}

fn schema_version_default() -> u32 {
    1
}

impl Snapshot {
    pub fn new(
        ledger: PointsLedger,
        registry: ChoreRegistry,
        approvals: ApprovalQueue,
        rewards: RewardBook,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            ledger,
            registry,
            approvals,
            rewards,
        }
    }

    pub fn empty() -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            ..Self::default()
        }
    }

    /// Upgrades an older snapshot in place. Fails on snapshots written by a
    /// newer release; older versions only gain defaulted fields, so balances
    /// and approvals always survive.
    pub fn migrate(mut self) -> Result<(Self, Vec<String>)> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(ChoreError::Persistence(format!(
                "snapshot schema v{} is newer than supported v{}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        let mut notes = Vec::new();
        if self.schema_version < SNAPSHOT_SCHEMA_VERSION {
            notes.push(format!(
                "migrated snapshot schema v{} -> v{}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            ));
            self.schema_version = SNAPSHOT_SCHEMA_VERSION;
        }
        Ok((self, notes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_document_migrates_with_defaults() {
        let raw = r#"{
            "schema_version": 1,
            "ledger": {
                "children": [{"id": "alice", "name": "Alice"}],
                "entries": [{
                    "child_id": "alice", "delta": 10,
                    "ts": "2025-06-01T12:00:00Z",
                    "reason": "chore", "kind": "Earn"
                }]
            }
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        let (migrated, notes) = snapshot.migrate().unwrap();
        assert_eq!(migrated.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(notes.len(), 1);
        assert_eq!(migrated.ledger.balance("alice"), 10);
        assert!(migrated.registry.aliases.is_empty());
        assert!(migrated.approvals.rejected.is_empty());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let snapshot = Snapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION + 1,
            ..Snapshot::default()
        };
        let err = snapshot.migrate().expect_err("future schema must fail");
        assert!(matches!(err, ChoreError::Persistence(_)), "got {err:?}");
    }

    #[test]
    fn missing_version_defaults_to_v1() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot.schema_version, 1);
    }
}
