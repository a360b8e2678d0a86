pub mod child;
pub mod entry;
pub mod points;

pub use child::Child;
pub use entry::{EntryKind, LedgerEntry};
pub use points::PointsLedger;
