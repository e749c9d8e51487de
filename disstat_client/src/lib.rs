//! Typed client for the DisStat bot statistics API.

mod client;
pub mod error;
pub mod models;

pub use client::{DisstatClient, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use models::{BotQuery, CommandRecord, CustomGraphData, GraphValue, ProcessUsage, StatsSnapshot};
