pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{ChoreDefinition, RecurrenceRule, ScheduleKind};
pub use instance::{ChoreInstance, ChoreState};
pub use registry::{ChoreRegistry, Generated};
