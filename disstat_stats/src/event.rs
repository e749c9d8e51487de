use async_trait::async_trait;
use disstat_client::{CommandRecord, Error, StatsSnapshot};
use serde_json::Value;

/// Receives the outcome of every post made by a [`StatsReporter`](crate::StatsReporter).
///
/// All methods default to doing nothing, implement the ones you care about.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stats were accepted by DisStat. `response` is the API's reply.
    async fn stats_posted(&self, _snapshot: &StatsSnapshot, _response: &Value) {}

    async fn stats_post_failed(&self, _snapshot: &StatsSnapshot, _error: &Error) {}

    /// A command invocation was accepted by DisStat.
    async fn command_posted(&self, _record: &CommandRecord, _response: &Value) {}

    async fn command_post_failed(&self, _record: &CommandRecord, _error: &Error) {}
}
