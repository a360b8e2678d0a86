//! Pending-approval queue: the parent-facing half of the chore state machine.
//!
//! Completing a chore opens exactly one [`PendingApproval`]. Approving takes
//! it out of the queue for good; rejecting parks it in a rejected pool from
//! which a bulk `reset_rejected` can move it back to pending. Rejection is
//! therefore never destructive, but it also never un-parks itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chores::ChoreInstance;
use crate::errors::{ChoreError, Result};

/// A chore instance awaiting a parental decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingApproval {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub child_id: String,
    pub title: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    /// Present only while the approval sits in the rejected pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl PendingApproval {
    fn for_instance(instance: &ChoreInstance) -> Self {
        Self {
            id: Uuid::new_v4(),
            instance_id: instance.id,
            child_id: instance.child_id.clone(),
            title: instance.title.clone(),
            points: instance.points,
            created_at: Utc::now(),
            rejection_reason: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalQueue {
    #[serde(default)]
    pub pending: Vec<PendingApproval>,
    #[serde(default)]
    pub rejected: Vec<PendingApproval>,
}

impl ApprovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an approval for a freshly completed instance. At most one
    /// outstanding approval may exist per instance.
    pub fn open(&mut self, instance: &ChoreInstance) -> Result<&PendingApproval> {
        if self.outstanding_for(instance.id) {
            return Err(ChoreError::InvalidState(format!(
                "chore instance `{}` already has an outstanding approval",
                instance.id
            )));
        }
        self.pending.push(PendingApproval::for_instance(instance));
        Ok(self.pending.last().unwrap())
    }

    pub fn outstanding_for(&self, instance_id: Uuid) -> bool {
        self.pending.iter().any(|a| a.instance_id == instance_id)
            || self.rejected.iter().any(|a| a.instance_id == instance_id)
    }

    /// Removes and returns the pending approval; `NotFound` covers both an
    /// unknown id and one that was already resolved.
    pub fn take_pending(&mut self, approval_id: Uuid) -> Result<PendingApproval> {
        let idx = self
            .pending
            .iter()
            .position(|a| a.id == approval_id)
            .ok_or_else(|| {
                ChoreError::NotFound(format!("pending approval `{}`", approval_id))
            })?;
        Ok(self.pending.remove(idx))
    }

    /// Moves a pending approval into the rejected pool, retaining the reason.
    pub fn reject(&mut self, approval_id: Uuid, reason: Option<String>) -> Result<&PendingApproval> {
        let mut approval = self.take_pending(approval_id)?;
        approval.rejection_reason = reason;
        self.rejected.push(approval);
        Ok(self.rejected.last().unwrap())
    }

    /// Bulk compensating operation: moves rejected approvals (all, or one
    /// child's) back to pending with the rejection reason cleared. Returns
    /// the restored approvals.
    pub fn reset_rejected(&mut self, child_id: Option<&str>) -> Vec<PendingApproval> {
        let mut restored = Vec::new();
        let mut kept = Vec::new();
        for mut approval in self.rejected.drain(..) {
            let matches = child_id.is_none_or(|child| approval.child_id == child);
            if matches {
                approval.rejection_reason = None;
                restored.push(approval.clone());
                self.pending.push(approval);
            } else {
                kept.push(approval);
            }
        }
        self.rejected = kept;
        restored
    }

    /// Drops every approval, pending or rejected, for a removed child.
    pub fn drop_for_child(&mut self, child_id: &str) {
        self.pending.retain(|a| a.child_id != child_id);
        self.rejected.retain(|a| a.child_id != child_id);
    }
}
