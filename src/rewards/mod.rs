pub mod definition;
pub mod engine;
pub mod progress;

pub use definition::{CalendarTemplate, RewardDefinition, RewardKind};
pub use engine::{ClaimEffect, RewardBook};
pub use progress::RewardProgress;
