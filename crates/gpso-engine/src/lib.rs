//! The GPSO optimization loop: initialization via [`builder::OptimizerBuilder`],
//! the four-step iteration and adaptive retrain cadence in [`optimizer::Optimizer`],
//! the [`engine::Engine`] stepping abstraction it implements, synchronous
//! [`events::Observer`] hooks, and versioned [`persistence::Checkpoint`]s.
//! The data model these orchestrate — `Domain`, `Surrogate`, `PartitionTree`
//! — lives in `gpso-core`.

pub mod builder;
pub mod config;
pub mod engine;
pub mod events;
#[cfg(feature = "serde")]
pub mod persistence;

mod optimizer;

pub use builder::OptimizerBuilder;
pub use config::OptimizerConfig;
pub use engine::{Engine, EngineExt};
pub use events::{Observer, Snapshot};
pub use optimizer::{IterationRecord, Optimizer, Solution};

#[cfg(feature = "serde")]
pub use persistence::{Checkpoint, from_json, to_json};

pub mod prelude {
    pub use crate::builder::OptimizerBuilder;
    pub use crate::config::OptimizerConfig;
    pub use crate::engine::{Engine, EngineExt};
    pub use crate::events::{Observer, Snapshot};
    pub use crate::optimizer::{IterationRecord, Optimizer, Solution};
}

/// Installs a global `tracing` subscriber the first time it is called.
/// Invoked automatically by [`OptimizerBuilder::build`] when `verbose` is
/// set; harmless to call more than once.
pub fn init_logging() {
    use std::sync::Once;
    static INIT_LOGGING: Once = Once::new();

    INIT_LOGGING.call_once(|| {
        use tracing_subscriber::fmt::format::FmtSpan;
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                    .with_target(false)
                    .with_level(true)
                    .compact(),
            )
            .init();
    });
}
