use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{ChoreError, Result};

use super::{
    definition::{RewardDefinition, RewardKind},
    progress::RewardProgress,
};

/// What claiming a reward does once eligibility is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimEffect {
    /// Point-cost rewards deduct in a single ledger append.
    Deduct { cost: i64 },
    /// Counter rewards are milestones; the ledger is untouched.
    Milestone { reset: bool },
}

/// Reward definitions plus the per-(child, reward) progress cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardBook {
    #[serde(default)]
    pub rewards: Vec<RewardDefinition>,
    #[serde(default)]
    pub progress: Vec<RewardProgress>,
}

impl RewardBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reward(&mut self, reward: RewardDefinition) -> Uuid {
        let id = reward.id;
        self.rewards.push(reward);
        id
    }

    pub fn reward(&self, id: Uuid) -> Option<&RewardDefinition> {
        self.rewards.iter().find(|r| r.id == id)
    }

    pub fn progress(&self, child_id: &str, reward_id: Uuid) -> Option<&RewardProgress> {
        self.progress
            .iter()
            .find(|p| p.child_id == child_id && p.reward_id == reward_id)
    }

    fn ensure_progress(&mut self, child_id: &str, reward_id: Uuid) -> &mut RewardProgress {
        if let Some(idx) = self
            .progress
            .iter()
            .position(|p| p.child_id == child_id && p.reward_id == reward_id)
        {
            return &mut self.progress[idx];
        }
        self.progress.push(RewardProgress::new(child_id, reward_id));
        self.progress.last_mut().unwrap()
    }

    /// One approval applied to one counter reward. Achieved progress is
    /// frozen until a claim resets it, so replaying history through this
    /// same step lands on the same counters as incremental updates.
    /// Returns whether the reward just crossed its threshold.
    fn apply_approval(progress: &mut RewardProgress, kind: &RewardKind, date: NaiveDate) -> bool {
        if progress.achieved {
            return false;
        }
        match kind {
            RewardKind::CompletionCount { required, .. } => {
                progress.record_completion();
                if progress.completions >= *required {
                    progress.mark_achieved();
                    return true;
                }
            }
            RewardKind::StreakDays { required, .. } => {
                progress.record_streak_day(date);
                if progress.streak_days >= *required {
                    progress.mark_achieved();
                    return true;
                }
            }
            RewardKind::PointCost { .. } => {}
        }
        false
    }

    /// Advances every matching counter reward after a chore approval.
    /// Returns the ids of rewards that just crossed their threshold.
    pub fn update_on_approval(
        &mut self,
        child_id: &str,
        chore_category: Option<&str>,
        date: NaiveDate,
    ) -> Vec<Uuid> {
        let matching: Vec<RewardDefinition> = self
            .rewards
            .iter()
            .filter(|r| r.kind.matches_chore(chore_category))
            .cloned()
            .collect();
        let mut achieved = Vec::new();
        for reward in matching {
            let progress = self.ensure_progress(child_id, reward.id);
            if Self::apply_approval(progress, &reward.kind, date) {
                achieved.push(reward.id);
            }
        }
        achieved
    }

    /// Validates a claim without mutating anything, so callers can reject
    /// before any side effect.
    pub fn check_claim(&self, child_id: &str, reward_id: Uuid, balance: i64) -> Result<ClaimEffect> {
        let reward = self
            .reward(reward_id)
            .ok_or_else(|| ChoreError::NotFound(format!("reward `{}`", reward_id)))?;
        match &reward.kind {
            RewardKind::PointCost { cost } => {
                if balance < *cost {
                    return Err(ChoreError::InsufficientPoints {
                        required: *cost,
                        available: balance,
                    });
                }
                Ok(ClaimEffect::Deduct { cost: *cost })
            }
            RewardKind::CompletionCount { required, .. } => {
                let count = self
                    .progress(child_id, reward_id)
                    .map(|p| p.completions)
                    .unwrap_or(0);
                if count < *required {
                    return Err(ChoreError::InvalidState(format!(
                        "reward `{}` needs {} completions, have {}",
                        reward.title, required, count
                    )));
                }
                Ok(ClaimEffect::Milestone {
                    reset: reward.reset_on_claim,
                })
            }
            RewardKind::StreakDays { required, .. } => {
                let streak = self
                    .progress(child_id, reward_id)
                    .map(|p| p.streak_days)
                    .unwrap_or(0);
                if streak < *required {
                    return Err(ChoreError::InvalidState(format!(
                        "reward `{}` needs a {}-day streak, have {}",
                        reward.title, required, streak
                    )));
                }
                Ok(ClaimEffect::Milestone {
                    reset: reward.reset_on_claim,
                })
            }
        }
    }

    /// Applies the post-claim counter reset for milestone rewards.
    pub fn settle_claim(&mut self, child_id: &str, reward_id: Uuid, effect: &ClaimEffect) {
        if let ClaimEffect::Milestone { reset: true } = effect {
            self.ensure_progress(child_id, reward_id).reset();
        }
    }

    /// Rebuilds one progress cache from the full approved-chore history:
    /// `(approval date, chore category)` in chronological order. Replays the
    /// same per-approval step as `update_on_approval`, so counters freeze at
    /// the first achievement. Claims are not part of the history, which means
    /// a post-claim reset is overwritten by the replayed achievement.
    pub fn recompute(
        &mut self,
        child_id: &str,
        reward_id: Uuid,
        history: &[(NaiveDate, Option<String>)],
    ) -> Result<&RewardProgress> {
        let reward = self
            .reward(reward_id)
            .ok_or_else(|| ChoreError::NotFound(format!("reward `{}`", reward_id)))?
            .clone();
        let mut rebuilt = RewardProgress::new(child_id, reward_id);
        for (date, category) in history {
            if !reward.kind.matches_chore(category.as_deref()) {
                continue;
            }
            Self::apply_approval(&mut rebuilt, &reward.kind, *date);
        }
        let slot = self.ensure_progress(child_id, reward_id);
        *slot = rebuilt;
        Ok(slot)
    }

    pub fn drop_for_child(&mut self, child_id: &str) {
        self.progress.retain(|p| p.child_id != child_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn count_reward(required: u32, category: &str) -> RewardDefinition {
        RewardDefinition::new(
            "Badge",
            RewardKind::CompletionCount {
                required,
                category: Some(category.into()),
            },
        )
    }

    #[test]
    fn completion_reward_achieves_at_threshold() {
        let mut book = RewardBook::new();
        let id = book.add_reward(count_reward(2, "trash"));

        assert!(book
            .update_on_approval("alice", Some("trash"), day(1))
            .is_empty());
        let achieved = book.update_on_approval("alice", Some("trash"), day(2));
        assert_eq!(achieved, vec![id]);
        assert!(book.progress("alice", id).unwrap().achieved);
    }

    #[test]
    fn non_matching_category_is_ignored() {
        let mut book = RewardBook::new();
        let id = book.add_reward(count_reward(1, "trash"));
        assert!(book
            .update_on_approval("alice", Some("dishes"), day(1))
            .is_empty());
        assert!(book.progress("alice", id).is_none());
    }

    #[test]
    fn claim_at_exact_balance_succeeds() {
        let mut book = RewardBook::new();
        let id = book.add_reward(RewardDefinition::new(
            "Movie night",
            RewardKind::PointCost { cost: 20 },
        ));
        let effect = book.check_claim("alice", id, 20).unwrap();
        assert_eq!(effect, ClaimEffect::Deduct { cost: 20 });

        let err = book
            .check_claim("alice", id, 19)
            .expect_err("one point short must fail");
        assert!(
            matches!(
                err,
                ChoreError::InsufficientPoints {
                    required: 20,
                    available: 19
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn milestone_claim_requires_threshold_and_resets() {
        let mut book = RewardBook::new();
        let id = book.add_reward(count_reward(2, "trash"));
        let err = book
            .check_claim("alice", id, 0)
            .expect_err("claim before threshold must fail");
        assert!(matches!(err, ChoreError::InvalidState(_)));

        book.update_on_approval("alice", Some("trash"), day(1));
        book.update_on_approval("alice", Some("trash"), day(2));
        let effect = book.check_claim("alice", id, 0).unwrap();
        assert_eq!(effect, ClaimEffect::Milestone { reset: true });

        book.settle_claim("alice", id, &effect);
        assert_eq!(book.progress("alice", id).unwrap().completions, 0);
        assert!(!book.progress("alice", id).unwrap().achieved);
    }

    #[test]
    fn recompute_agrees_with_incremental_updates() {
        let mut book = RewardBook::new();
        let id = book.add_reward(RewardDefinition::new(
            "Streak",
            RewardKind::StreakDays {
                required: 3,
                category: Some("bed".into()),
            },
        ));
        for d in [1, 2, 3] {
            book.update_on_approval("alice", Some("bed"), day(d));
        }
        let incremental = book.progress("alice", id).unwrap().clone();

        let history = vec![
            (day(1), Some("bed".to_string())),
            (day(2), Some("bed".to_string())),
            (day(3), Some("bed".to_string())),
        ];
        let rebuilt = book.recompute("alice", id, &history).unwrap();
        assert_eq!(rebuilt.streak_days, incremental.streak_days);
        assert_eq!(rebuilt.achieved, incremental.achieved);
    }

    #[test]
    fn recompute_freezes_counters_past_the_threshold() {
        let mut book = RewardBook::new();
        let id = book.add_reward(count_reward(2, "trash"));
        for d in [1, 2, 3] {
            book.update_on_approval("alice", Some("trash"), day(d));
        }
        let incremental = book.progress("alice", id).unwrap().clone();
        assert_eq!(incremental.completions, 2, "achieved progress is frozen");

        let history = vec![
            (day(1), Some("trash".to_string())),
            (day(2), Some("trash".to_string())),
            (day(3), Some("trash".to_string())),
        ];
        let rebuilt = book.recompute("alice", id, &history).unwrap();
        assert_eq!(rebuilt.completions, incremental.completions);
        assert_eq!(rebuilt.achieved, incremental.achieved);
    }

    #[test]
    fn recompute_overwrites_a_post_claim_reset() {
        let mut book = RewardBook::new();
        let id = book.add_reward(count_reward(2, "trash"));
        book.update_on_approval("alice", Some("trash"), day(1));
        book.update_on_approval("alice", Some("trash"), day(2));
        let effect = book.check_claim("alice", id, 0).unwrap();
        book.settle_claim("alice", id, &effect);
        assert_eq!(book.progress("alice", id).unwrap().completions, 0);

        // History holds the approvals, not the claim, so the replay ends at
        // the frozen achievement again.
        let history = vec![
            (day(1), Some("trash".to_string())),
            (day(2), Some("trash".to_string())),
        ];
        let rebuilt = book.recompute("alice", id, &history).unwrap();
        assert_eq!(rebuilt.completions, 2);
        assert!(rebuilt.achieved);
    }
}
