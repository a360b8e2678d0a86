use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a chore instance.
///
/// Legal transitions: `Created -> PendingApproval -> Approved | Rejected`,
/// plus the compensating bulk edge `Rejected -> PendingApproval` driven by
/// `reset_rejected`. Everything else is an invalid-state error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChoreState {
    Created,
    PendingApproval,
    Approved,
    Rejected,
}

/// One concrete occurrence of a chore requiring completion and approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoreInstance {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<Uuid>,
    pub child_id: String,
    pub title: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub state: ChoreState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    /// Set when the owning child is removed; archived instances are kept for
    /// history but excluded from every active query and transition.
    #[serde(default)]
    pub archived: bool,
}

impl ChoreInstance {
    pub fn new(
        child_id: impl Into<String>,
        title: impl Into<String>,
        points: i64,
        category: Option<String>,
        definition_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            definition_id,
            child_id: child_id.into(),
            title: title.into(),
            points,
            category,
            state: ChoreState::Created,
            created_at: Utc::now(),
            completed_at: None,
            resolved_at: None,
            archived: false,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.archived
    }
}
