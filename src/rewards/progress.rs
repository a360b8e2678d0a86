use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived eligibility counters for one (child, reward) pair.
///
/// This is a cache over the approved-chore history; it can always be rebuilt
/// via `recompute_progress`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardProgress {
    pub child_id: String,
    pub reward_id: Uuid,
    #[serde(default)]
    pub completions: u32,
    #[serde(default)]
    pub streak_days: u32,
    #[serde(default)]
    pub last_qualifying: Option<NaiveDate>,
    #[serde(default)]
    pub achieved: bool,
    #[serde(default)]
    pub achieved_at: Option<DateTime<Utc>>,
}

impl RewardProgress {
    pub fn new(child_id: impl Into<String>, reward_id: Uuid) -> Self {
        Self {
            child_id: child_id.into(),
            reward_id,
            completions: 0,
            streak_days: 0,
            last_qualifying: None,
            achieved: false,
            achieved_at: None,
        }
    }

    pub fn record_completion(&mut self) {
        self.completions += 1;
    }

    /// Streak rule: one day after the last qualifying date extends the
    /// streak, the same day is a no-op (double approvals do not double
    /// count), and any gap resets the streak to 1.
    pub fn record_streak_day(&mut self, date: NaiveDate) {
        match self.last_qualifying {
            Some(last) => {
                let gap = (date - last).num_days();
                if gap == 1 {
                    self.streak_days += 1;
                } else if gap == 0 {
                    return;
                } else {
                    self.streak_days = 1;
                }
            }
            None => self.streak_days = 1,
        }
        self.last_qualifying = Some(date);
    }

    pub fn mark_achieved(&mut self) {
        self.achieved = true;
        self.achieved_at = Some(Utc::now());
    }

    pub fn reset(&mut self) {
        self.completions = 0;
        self.streak_days = 0;
        self.last_qualifying = None;
        self.achieved = false;
        self.achieved_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn progress() -> RewardProgress {
        RewardProgress::new("alice", Uuid::new_v4())
    }

    #[test]
    fn consecutive_days_extend_streak() {
        let mut p = progress();
        p.record_streak_day(day(1));
        p.record_streak_day(day(2));
        p.record_streak_day(day(3));
        assert_eq!(p.streak_days, 3);
        assert_eq!(p.last_qualifying, Some(day(3)));
    }

    #[test]
    fn same_day_is_idempotent() {
        let mut p = progress();
        p.record_streak_day(day(1));
        p.record_streak_day(day(1));
        assert_eq!(p.streak_days, 1);
    }

    #[test]
    fn gap_resets_streak_to_one() {
        let mut p = progress();
        p.record_streak_day(day(1));
        p.record_streak_day(day(3));
        assert_eq!(p.streak_days, 1);
        assert_eq!(p.last_qualifying, Some(day(3)));
    }

    #[test]
    fn reset_clears_everything() {
        let mut p = progress();
        p.record_completion();
        p.record_streak_day(day(1));
        p.mark_achieved();
        p.reset();
        assert_eq!(p.completions, 0);
        assert_eq!(p.streak_days, 0);
        assert!(p.last_qualifying.is_none());
        assert!(!p.achieved);
    }
}
