use serde::{Deserialize, Serialize};

/// A child tracked by the engine, keyed by a stable external id.
///
/// There is deliberately no stored points field: balances are derived from
/// the ledger entries and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Child {
    pub id: String,
    pub name: String,
}

impl Child {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
