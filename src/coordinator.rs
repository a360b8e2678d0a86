//! Snapshot coordinator: owns the process-wide engine state and the 1:1
//! command surface invoked by the UI/automation layer.
//!
//! Every mutating command runs under a single write lock as
//! validate -> mutate a working copy -> persist snapshot -> commit -> emit.
//! A failed persist drops the working copy, so no acknowledged mutation can
//! be lost on restart and no failed one is ever observable.

use std::sync::{RwLock, RwLockReadGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::approval::{ApprovalQueue, PendingApproval};
use crate::chores::{
    ChoreDefinition, ChoreInstance, ChoreRegistry, ChoreState, Generated, RecurrenceRule,
    ScheduleKind,
};
use crate::errors::{ChoreError, Result};
use crate::events::{Event, EventKind, EventSink};
use crate::ledger::{Child, EntryKind, LedgerEntry, PointsLedger};
use crate::rewards::{ClaimEffect, RewardBook, RewardDefinition, RewardProgress};
use crate::storage::{Snapshot, SnapshotStore};

#[derive(Debug, Clone, Default)]
struct CoreState {
    ledger: PointsLedger,
    registry: ChoreRegistry,
    approvals: ApprovalQueue,
    rewards: RewardBook,
}

impl CoreState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            ledger: snapshot.ledger,
            registry: snapshot.registry,
            approvals: snapshot.approvals,
            rewards: snapshot.rewards,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.ledger.clone(),
            self.registry.clone(),
            self.approvals.clone(),
            self.rewards.clone(),
        )
    }

    fn require_child(&self, child_id: &str) -> Result<()> {
        if self.ledger.child(child_id).is_none() {
            return Err(ChoreError::NotFound(format!("child `{}`", child_id)));
        }
        Ok(())
    }
}

/// Facade that coordinates engine state, persistence, and event emission.
pub struct ChoreCoordinator {
    state: RwLock<CoreState>,
    store: Box<dyn SnapshotStore>,
    events: Box<dyn EventSink>,
}

impl ChoreCoordinator {
    /// Loads the persisted snapshot, or starts empty when none exists or the
    /// load fails. Only an unmigratable snapshot (newer schema) is fatal.
    pub fn start(store: Box<dyn SnapshotStore>, events: Box<dyn EventSink>) -> Result<Self> {
        let state = match store.load() {
            Ok(Some(snapshot)) => {
                let (snapshot, notes) = snapshot.migrate()?;
                for note in &notes {
                    tracing::info!(note, "snapshot migration");
                }
                CoreState::from_snapshot(snapshot)
            }
            Ok(None) => {
                tracing::info!("no snapshot found, starting with empty state");
                CoreState::default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "snapshot load failed, starting with empty state");
                CoreState::default()
            }
        };
        Ok(Self {
            state: RwLock::new(state),
            store,
            events,
        })
    }

    // Mutations land on a clone and are swapped in whole, so state behind a
    // poisoned lock is still consistent and safe to reuse.
    fn read_state(&self) -> RwLockReadGuard<'_, CoreState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn mutate<T>(&self, op: impl FnOnce(&mut CoreState, &mut Vec<Event>) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().unwrap_or_else(|p| p.into_inner());
        let mut next = guard.clone();
        let mut queued = Vec::new();
        let out = op(&mut next, &mut queued)?;
        self.store.save(&next.to_snapshot())?;
        *guard = next;
        drop(guard);
        for event in queued {
            self.events.emit(&event);
        }
        Ok(out)
    }

    /// Persists the current state; intended for teardown.
    pub fn flush(&self) -> Result<()> {
        let snapshot = self.read_state().to_snapshot();
        self.store.save(&snapshot)
    }

    // ---- children / points ----

    pub fn add_child(&self, child_id: &str, name: &str) -> Result<()> {
        self.mutate(|state, _| state.ledger.add_child(Child::new(child_id, name)))
    }

    /// Removes a child: ledger entries stay for audit, chore instances are
    /// archived, approvals and reward progress are dropped.
    pub fn remove_child(&self, child_id: &str) -> Result<()> {
        self.mutate(|state, _| {
            state.ledger.remove_child(child_id)?;
            state.registry.archive_child(child_id);
            state.approvals.drop_for_child(child_id);
            state.rewards.drop_for_child(child_id);
            Ok(())
        })
    }

    pub fn add_points(&self, child_id: &str, amount: i64, reason: &str) -> Result<()> {
        if amount <= 0 {
            return Err(ChoreError::Validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        self.mutate(|state, events| {
            state
                .ledger
                .append(child_id, amount, reason, EntryKind::Earn, None)?;
            let balance = state.ledger.balance(child_id);
            events.push(Event::points_changed(child_id, amount, balance));
            Ok(())
        })
    }

    pub fn remove_points(&self, child_id: &str, amount: i64, reason: &str) -> Result<()> {
        if amount <= 0 {
            return Err(ChoreError::Validation(format!(
                "amount must be positive, got {}",
                amount
            )));
        }
        self.mutate(|state, events| {
            state
                .ledger
                .append(child_id, -amount, reason, EntryKind::Spend, None)?;
            let balance = state.ledger.balance(child_id);
            events.push(Event::points_changed(child_id, -amount, balance));
            Ok(())
        })
    }

    pub fn balance(&self, child_id: &str) -> i64 {
        self.read_state().ledger.balance(child_id)
    }

    pub fn weekly_total(&self, child_id: &str, as_of: DateTime<Utc>) -> i64 {
        self.read_state().ledger.weekly_total(child_id, as_of)
    }

    pub fn lifetime_total(&self, child_id: &str) -> i64 {
        self.read_state().ledger.lifetime_total(child_id)
    }

    pub fn children(&self) -> Vec<Child> {
        self.read_state().ledger.children.clone()
    }

    pub fn ledger_entries(&self, child_id: &str) -> Vec<LedgerEntry> {
        self.read_state()
            .ledger
            .entries_for(child_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ---- chores ----

    pub fn create_adhoc_chore(
        &self,
        child_id: &str,
        title: &str,
        points: i64,
        category: Option<String>,
    ) -> Result<Uuid> {
        self.mutate(|state, events| {
            state.require_child(child_id)?;
            let instance = state
                .registry
                .create_adhoc(child_id, title, points, category)?;
            events.push(Event::new(
                EventKind::ChoreCreated,
                json!({
                    "instance_id": instance.id,
                    "child_id": instance.child_id,
                    "title": instance.title,
                    "points": instance.points,
                }),
            ));
            Ok(instance.id)
        })
    }

    pub fn create_recurring_chore(
        &self,
        child_id: &str,
        title: &str,
        points: i64,
        rule: RecurrenceRule,
        category: Option<String>,
    ) -> Result<Uuid> {
        self.mutate(|state, _| {
            state.require_child(child_id)?;
            state
                .registry
                .add_definition(ChoreDefinition::new(child_id, title, points, category, rule))
        })
    }

    pub fn set_recurring_enabled(&self, definition_id: Uuid, enabled: bool) -> Result<()> {
        self.mutate(|state, _| state.registry.set_definition_enabled(definition_id, enabled))
    }

    /// Spawns instances for every definition due on `date`, optionally
    /// restricted to one schedule class. Idempotent per (definition, date):
    /// re-firing the trigger returns the already-spawned instances.
    pub fn generate_recurring_chores(
        &self,
        kind: Option<ScheduleKind>,
        date: NaiveDate,
    ) -> Result<Vec<Uuid>> {
        self.mutate(|state, events| {
            let due = state.registry.due_definitions(date, kind);
            let mut spawned = Vec::with_capacity(due.len());
            for definition_id in due {
                match state.registry.generate_for_date(definition_id, date)? {
                    Generated::Created(id) => {
                        if let Some(instance) = state.registry.instance(id) {
                            events.push(Event::new(
                                EventKind::ChoreCreated,
                                json!({
                                    "instance_id": id,
                                    "definition_id": definition_id,
                                    "child_id": instance.child_id,
                                    "title": instance.title,
                                    "points": instance.points,
                                }),
                            ));
                        }
                        spawned.push(id);
                    }
                    Generated::Existing(id) => spawned.push(id),
                }
            }
            Ok(spawned)
        })
    }

    /// Binds an external identifier (e.g. a to-do item uid) to an instance.
    pub fn alias_chore(&self, external_uid: &str, instance_id: Uuid) -> Result<()> {
        self.mutate(|state, _| state.registry.alias(external_uid, instance_id))
    }

    /// Marks the chore completed and opens its pending approval.
    /// Returns the approval id.
    pub fn complete_chore(&self, instance_id: Uuid) -> Result<Uuid> {
        self.mutate(|state, events| {
            let instance = state.registry.mark_completed(instance_id)?.clone();
            let approval = state.approvals.open(&instance)?;
            events.push(Event::new(
                EventKind::ChoreCompleted,
                json!({
                    "instance_id": instance.id,
                    "child_id": instance.child_id,
                    "title": instance.title,
                }),
            ));
            events.push(Event::new(
                EventKind::ApprovalCreated,
                json!({
                    "approval_id": approval.id,
                    "instance_id": instance.id,
                    "child_id": instance.child_id,
                    "points": approval.points,
                }),
            ));
            Ok(approval.id)
        })
    }

    pub fn complete_chore_by_alias(&self, external_uid: &str) -> Result<Uuid> {
        let instance_id = self
            .read_state()
            .registry
            .resolve_alias(external_uid)
            .ok_or_else(|| ChoreError::NotFound(format!("chore alias `{}`", external_uid)))?;
        self.complete_chore(instance_id)
    }

    // ---- approvals ----

    /// Approves a pending chore: awards its points in one ledger append,
    /// advances reward progress, and removes the approval.
    pub fn approve_chore(&self, approval_id: Uuid) -> Result<()> {
        self.mutate(|state, events| {
            let approval = state.approvals.take_pending(approval_id)?;
            let category = state
                .registry
                .instance(approval.instance_id)
                .and_then(|i| i.category.clone());
            state.ledger.append(
                &approval.child_id,
                approval.points,
                format!("Approved: {}", approval.title),
                EntryKind::Earn,
                category.clone(),
            )?;
            state
                .registry
                .set_state(approval.instance_id, ChoreState::Approved)?;
            let approval_date = Utc::now().date_naive();
            let achieved =
                state
                    .rewards
                    .update_on_approval(&approval.child_id, category.as_deref(), approval_date);

            let balance = state.ledger.balance(&approval.child_id);
            events.push(Event::new(
                EventKind::ChoreApproved,
                json!({
                    "approval_id": approval.id,
                    "instance_id": approval.instance_id,
                    "child_id": approval.child_id,
                    "points": approval.points,
                }),
            ));
            events.push(Event::points_changed(
                &approval.child_id,
                approval.points,
                balance,
            ));
            for reward_id in achieved {
                let title = state
                    .rewards
                    .reward(reward_id)
                    .map(|r| r.title.clone())
                    .unwrap_or_default();
                events.push(Event::new(
                    EventKind::RewardAchieved,
                    json!({
                        "child_id": approval.child_id,
                        "reward_id": reward_id,
                        "reward_title": title,
                    }),
                ));
            }
            Ok(())
        })
    }

    /// Rejects a pending chore: no ledger effect; the approval is parked in
    /// the rejected pool until a bulk reset.
    pub fn reject_chore(&self, approval_id: Uuid, reason: Option<String>) -> Result<()> {
        self.mutate(|state, events| {
            let approval = state.approvals.reject(approval_id, reason.clone())?.clone();
            state
                .registry
                .set_state(approval.instance_id, ChoreState::Rejected)?;
            events.push(Event::new(
                EventKind::ChoreRejected,
                json!({
                    "approval_id": approval.id,
                    "instance_id": approval.instance_id,
                    "child_id": approval.child_id,
                    "reason": approval.rejection_reason,
                }),
            ));
            Ok(())
        })
    }

    /// Bulk compensating command: returns rejected chores (all, or one
    /// child's) to pending approval. Returns how many were restored.
    pub fn reset_rejected(&self, child_id: Option<&str>) -> Result<usize> {
        self.mutate(|state, events| {
            let restored = state.approvals.reset_rejected(child_id);
            for approval in &restored {
                state
                    .registry
                    .set_state(approval.instance_id, ChoreState::PendingApproval)?;
                events.push(Event::new(
                    EventKind::ApprovalCreated,
                    json!({
                        "approval_id": approval.id,
                        "instance_id": approval.instance_id,
                        "child_id": approval.child_id,
                        "points": approval.points,
                    }),
                ));
            }
            Ok(restored.len())
        })
    }

    pub fn pending_approvals(&self) -> Vec<PendingApproval> {
        self.read_state().approvals.pending.clone()
    }

    pub fn rejected_approvals(&self) -> Vec<PendingApproval> {
        self.read_state().approvals.rejected.clone()
    }

    pub fn instance(&self, instance_id: Uuid) -> Option<ChoreInstance> {
        self.read_state().registry.instance(instance_id).cloned()
    }

    pub fn definitions(&self) -> Vec<ChoreDefinition> {
        self.read_state().registry.definitions.clone()
    }

    // ---- rewards ----

    pub fn add_reward(&self, reward: RewardDefinition) -> Result<Uuid> {
        self.mutate(|state, _| Ok(state.rewards.add_reward(reward)))
    }

    pub fn rewards(&self) -> Vec<RewardDefinition> {
        self.read_state().rewards.rewards.clone()
    }

    pub fn reward_progress(&self, child_id: &str, reward_id: Uuid) -> Option<RewardProgress> {
        self.read_state()
            .rewards
            .progress(child_id, reward_id)
            .cloned()
    }

    /// Claims a reward. Point-cost rewards deduct atomically; counter
    /// rewards are milestones and leave the ledger untouched.
    pub fn claim_reward(&self, child_id: &str, reward_id: Uuid) -> Result<()> {
        self.mutate(|state, events| {
            state.require_child(child_id)?;
            let balance = state.ledger.balance(child_id);
            let effect = state.rewards.check_claim(child_id, reward_id, balance)?;
            let reward = state
                .rewards
                .reward(reward_id)
                .ok_or_else(|| ChoreError::NotFound(format!("reward `{}`", reward_id)))?
                .clone();

            if let ClaimEffect::Deduct { cost } = &effect {
                let cost = *cost;
                state.ledger.append(
                    child_id,
                    -cost,
                    format!("Reward: {}", reward.title),
                    EntryKind::Spend,
                    None,
                )?;
                let balance = state.ledger.balance(child_id);
                events.push(Event::points_changed(child_id, -cost, balance));
            }
            state.rewards.settle_claim(child_id, reward_id, &effect);

            events.push(Event::new(
                EventKind::RewardClaimed,
                json!({
                    "child_id": child_id,
                    "reward_id": reward_id,
                    "reward_title": reward.title,
                }),
            ));
            if reward.calendar.enabled {
                events.push(Event::new(
                    EventKind::CalendarEventRequested,
                    json!({
                        "child_id": child_id,
                        "summary": format!("Family reward - {} ({})", reward.title, child_id),
                        "description": reward.description,
                        "duration_hours": reward.calendar.duration_hours,
                    }),
                ));
            }
            Ok(())
        })
    }

    /// Rebuilds one (child, reward) progress cache from the approved-chore
    /// history, for audits and recovery from ambiguity.
    pub fn recompute_progress(&self, child_id: &str, reward_id: Uuid) -> Result<RewardProgress> {
        self.mutate(|state, _| {
            state.require_child(child_id)?;
            let mut history: Vec<(DateTime<Utc>, NaiveDate, Option<String>)> = state
                .registry
                .instances
                .iter()
                .filter(|i| i.child_id == child_id && i.state == ChoreState::Approved)
                .filter_map(|i| {
                    i.resolved_at
                        .map(|ts| (ts, ts.date_naive(), i.category.clone()))
                })
                .collect();
            history.sort_by_key(|(ts, _, _)| *ts);
            let history: Vec<(NaiveDate, Option<String>)> = history
                .into_iter()
                .map(|(_, date, category)| (date, category))
                .collect();
            let rebuilt = state.rewards.recompute(child_id, reward_id, &history)?;
            Ok(rebuilt.clone())
        })
    }
}
