#![doc(test(attr(deny(warnings))))]

//! Chore Core offers the chore lifecycle, points ledger, and reward progress
//! primitives that power household chore tracking frontends.

pub mod approval;
pub mod chores;
pub mod coordinator;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod rewards;
pub mod storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("chore_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
        tracing::info!("Chore Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
