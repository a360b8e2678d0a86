use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a reward is earned.
///
/// `category: None` on the counter kinds means any approved chore qualifies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RewardKind {
    /// Purchased with points at claim time.
    PointCost { cost: i64 },
    /// Milestone reached after enough approved chores of a category.
    CompletionCount {
        required: u32,
        category: Option<String>,
    },
    /// Milestone reached after enough consecutive qualifying days.
    StreakDays {
        required: u32,
        category: Option<String>,
    },
}

impl RewardKind {
    pub fn is_point_cost(&self) -> bool {
        matches!(self, RewardKind::PointCost { .. })
    }

    /// Category filter for the counter kinds; point-cost rewards track no
    /// progress and match nothing.
    pub fn category(&self) -> Option<&str> {
        match self {
            RewardKind::PointCost { .. } => None,
            RewardKind::CompletionCount { category, .. }
            | RewardKind::StreakDays { category, .. } => category.as_deref(),
        }
    }

    pub fn matches_chore(&self, chore_category: Option<&str>) -> bool {
        if self.is_point_cost() {
            return false;
        }
        match self.category() {
            Some(required) => chore_category == Some(required),
            None => true,
        }
    }
}

/// Template for an optional calendar event created when a reward is claimed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarTemplate {
    pub enabled: bool,
    pub duration_hours: u32,
}

impl Default for CalendarTemplate {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_hours: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardDefinition {
    pub id: Uuid,
    pub title: String,
    pub kind: RewardKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calendar: CalendarTemplate,
    /// Whether claiming a counter reward starts its progress over. `false`
    /// reproduces one-shot badges; `true` makes the milestone repeatable.
    #[serde(default = "default_reset_on_claim")]
    pub reset_on_claim: bool,
}

fn default_reset_on_claim() -> bool {
    true
}

impl RewardDefinition {
    pub fn new(title: impl Into<String>, kind: RewardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            kind,
            description: String::new(),
            calendar: CalendarTemplate::default(),
            reset_on_claim: true,
        }
    }

    pub fn with_calendar(mut self, duration_hours: u32) -> Self {
        self.calendar = CalendarTemplate {
            enabled: true,
            duration_hours,
        };
        self
    }
}
