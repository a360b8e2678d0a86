use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classifies a ledger entry by intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryKind {
    Earn,
    Spend,
    Adjust,
}

/// One immutable point-affecting transaction for a child.
///
/// Entries are never rewritten or deleted; corrections are made by appending
/// an offsetting entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerEntry {
    pub child_id: String,
    pub delta: i64,
    pub ts: DateTime<Utc>,
    pub reason: String,
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LedgerEntry {
    pub fn new(
        child_id: impl Into<String>,
        delta: i64,
        reason: impl Into<String>,
        kind: EntryKind,
        category: Option<String>,
    ) -> Self {
        Self {
            child_id: child_id.into(),
            delta,
            ts: Utc::now(),
            reason: reason.into(),
            kind,
            category,
        }
    }
}
