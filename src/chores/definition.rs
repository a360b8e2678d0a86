use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// When a recurring chore template spawns instances.
///
/// The engine does not schedule anything itself; an external trigger asks for
/// generation on a concrete date and the rule decides whether that date
/// applies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RecurrenceRule {
    #[default]
    None,
    Daily,
    Weekly(Weekday),
}

/// Coarse schedule class, used to generate one class of chores at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScheduleKind {
    Daily,
    Weekly,
}

impl RecurrenceRule {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self {
            RecurrenceRule::None => false,
            RecurrenceRule::Daily => true,
            RecurrenceRule::Weekly(day) => date.weekday() == *day,
        }
    }

    pub fn schedule_kind(&self) -> Option<ScheduleKind> {
        match self {
            RecurrenceRule::None => None,
            RecurrenceRule::Daily => Some(ScheduleKind::Daily),
            RecurrenceRule::Weekly(_) => Some(ScheduleKind::Weekly),
        }
    }
}

/// Template describing a chore, ad-hoc or recurring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoreDefinition {
    pub id: Uuid,
    pub title: String,
    pub child_id: String,
    pub points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub rule: RecurrenceRule,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl ChoreDefinition {
    pub fn new(
        child_id: impl Into<String>,
        title: impl Into<String>,
        points: i64,
        category: Option<String>,
        rule: RecurrenceRule,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            child_id: child_id.into(),
            points,
            category,
            rule,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}
