use async_trait::async_trait;
use chrono::{DateTime, Utc};
use disstat_stats::{CommandRecord, Error, EventHandler, StatsSnapshot};
use log::warn;
use serde_json::Value;
use tokio::sync::RwLock;

/// Auth failures in a row before the operator is told to check the API key.
const AUTH_FAILURE_WARN_THRESHOLD: u32 = 3;

/// Keeps track of how posting to DisStat has been going, shown by `/stats`.
#[derive(Default)]
pub struct PostHistory {
    state: RwLock<PostSummary>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostSummary {
    pub last_posted_at: Option<DateTime<Utc>>,
    pub last_snapshot: Option<StatsSnapshot>,
    pub consecutive_failures: u32,
    pub commands_posted: u64,
}

impl PostHistory {
    pub async fn summary(&self) -> PostSummary {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl EventHandler for PostHistory {
    async fn stats_posted(&self, snapshot: &StatsSnapshot, _response: &Value) {
        let mut state = self.state.write().await;

        state.last_posted_at = Some(Utc::now());
        state.last_snapshot = Some(snapshot.clone());
        state.consecutive_failures = 0;
    }

    async fn stats_post_failed(&self, _snapshot: &StatsSnapshot, error: &Error) {
        let mut state = self.state.write().await;
        state.consecutive_failures += 1;

        if error.is_auth_failure() && state.consecutive_failures == AUTH_FAILURE_WARN_THRESHOLD {
            warn!(
                "DisStat rejected the last {} posts, check DISSTAT_API_KEY",
                state.consecutive_failures
            );
        }
    }

    async fn command_posted(&self, _record: &CommandRecord, _response: &Value) {
        self.state.write().await.commands_posted += 1;
    }
}
