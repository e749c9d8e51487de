//! Periodic and on-demand reporting of a bot's statistics to DisStat.
//!
//! The host bot provides its counts through [`StatsSource`] and learns about the outcome of
//! every post through [`EventHandler`]s registered on the builder.

mod event;
#[cfg(feature = "process-metrics")]
mod process;
mod reporter;
mod source;

pub use disstat_client::{
    BotQuery, CommandRecord, CustomGraphData, Error, GraphValue, ProcessUsage, Result,
    StatsSnapshot,
};
pub use event::EventHandler;
pub use reporter::{StatsReporter, StatsReporterBuilder, DEFAULT_POST_INTERVAL};
pub use source::StatsSource;
