use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ChoreError, Result};

use super::{
    child::Child,
    entry::{EntryKind, LedgerEntry},
};

/// Append-only points ledger covering every tracked child.
///
/// All aggregates are pure folds over the entry sequence. Removing a child
/// drops the `Child` record but keeps the entries for audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointsLedger {
    #[serde(default)]
    pub children: Vec<Child>,
    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&mut self, child: Child) -> Result<()> {
        if child.id.trim().is_empty() {
            return Err(ChoreError::Validation("child id must not be empty".into()));
        }
        if self.child(&child.id).is_some() {
            return Err(ChoreError::Validation(format!(
                "child `{}` already exists",
                child.id
            )));
        }
        self.children.push(child);
        Ok(())
    }

    /// Removes the child record, retaining its ledger entries.
    pub fn remove_child(&mut self, child_id: &str) -> Result<Child> {
        let idx = self
            .children
            .iter()
            .position(|c| c.id == child_id)
            .ok_or_else(|| ChoreError::NotFound(format!("child `{}`", child_id)))?;
        Ok(self.children.remove(idx))
    }

    pub fn child(&self, child_id: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.id == child_id)
    }

    pub fn append(
        &mut self,
        child_id: &str,
        delta: i64,
        reason: impl Into<String>,
        kind: EntryKind,
        category: Option<String>,
    ) -> Result<&LedgerEntry> {
        if self.child(child_id).is_none() {
            return Err(ChoreError::NotFound(format!("child `{}`", child_id)));
        }
        self.entries
            .push(LedgerEntry::new(child_id, delta, reason, kind, category));
        Ok(self.entries.last().unwrap())
    }

    pub fn balance(&self, child_id: &str) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.child_id == child_id)
            .map(|e| e.delta)
            .sum()
    }

    /// Sum of deltas within the trailing 7-day window ending at `as_of`.
    pub fn weekly_total(&self, child_id: &str, as_of: DateTime<Utc>) -> i64 {
        let window_start = as_of - Duration::days(7);
        self.entries
            .iter()
            .filter(|e| e.child_id == child_id && e.ts > window_start && e.ts <= as_of)
            .map(|e| e.delta)
            .sum()
    }

    /// Sum of positive deltas, i.e. everything the child has ever earned.
    pub fn lifetime_total(&self, child_id: &str) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.child_id == child_id && e.delta > 0)
            .map(|e| e.delta)
            .sum()
    }

    pub fn entries_for(&self, child_id: &str) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.child_id == child_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(child: &str) -> PointsLedger {
        let mut ledger = PointsLedger::new();
        ledger.add_child(Child::new(child, child)).unwrap();
        ledger
    }

    #[test]
    fn balance_is_sum_of_deltas() {
        let mut ledger = ledger_with("alice");
        ledger
            .append("alice", 10, "chore", EntryKind::Earn, None)
            .unwrap();
        ledger
            .append("alice", -4, "reward", EntryKind::Spend, None)
            .unwrap();
        ledger
            .append("alice", 3, "bonus", EntryKind::Adjust, None)
            .unwrap();
        assert_eq!(ledger.balance("alice"), 9);
    }

    #[test]
    fn append_rejects_unknown_child() {
        let mut ledger = ledger_with("alice");
        let err = ledger
            .append("bob", 5, "chore", EntryKind::Earn, None)
            .expect_err("unknown child must be rejected");
        assert!(matches!(err, ChoreError::NotFound(_)), "got {err:?}");
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let mut ledger = ledger_with("alice");
        let err = ledger
            .add_child(Child::new("alice", "Alice"))
            .expect_err("duplicate child must be rejected");
        assert!(matches!(err, ChoreError::Validation(_)));
    }

    #[test]
    fn lifetime_total_ignores_spending() {
        let mut ledger = ledger_with("alice");
        ledger
            .append("alice", 10, "chore", EntryKind::Earn, None)
            .unwrap();
        ledger
            .append("alice", -10, "reward", EntryKind::Spend, None)
            .unwrap();
        assert_eq!(ledger.balance("alice"), 0);
        assert_eq!(ledger.lifetime_total("alice"), 10);
    }

    #[test]
    fn weekly_total_excludes_older_entries() {
        let mut ledger = ledger_with("alice");
        ledger
            .append("alice", 5, "recent", EntryKind::Earn, None)
            .unwrap();
        ledger
            .append("alice", 7, "old", EntryKind::Earn, None)
            .unwrap();
        // Backdate the second entry beyond the window.
        ledger.entries[1].ts = Utc::now() - Duration::days(10);
        assert_eq!(ledger.weekly_total("alice", Utc::now()), 5);
    }

    #[test]
    fn remove_child_keeps_entries_for_audit() {
        let mut ledger = ledger_with("alice");
        ledger
            .append("alice", 5, "chore", EntryKind::Earn, None)
            .unwrap();
        ledger.remove_child("alice").unwrap();
        assert!(ledger.child("alice").is_none());
        assert_eq!(ledger.entries_for("alice").len(), 1);
    }
}
