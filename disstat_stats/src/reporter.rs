use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use disstat_client::{
    BotQuery, CommandRecord, CustomGraphData, DisstatClient, Error, Result, StatsSnapshot,
};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "process-metrics")]
use crate::process::ProcessMetrics;
use crate::{EventHandler, StatsSource};

pub const DEFAULT_POST_INTERVAL: Duration = Duration::from_secs(90);

type GraphDataFuture = Pin<Box<dyn Future<Output = Vec<CustomGraphData>> + Send>>;
type GraphDataProvider = Arc<dyn Fn() -> GraphDataFuture + Send + Sync>;

pub struct StatsReporterBuilder {
    api_key: String,
    base_url: Option<String>,
    source: Arc<dyn StatsSource>,
    handlers: Vec<Arc<dyn EventHandler>>,
    process_metrics: bool,
    custom_graph_data: Option<GraphDataProvider>,
}

impl StatsReporterBuilder {
    /// Targets a different DisStat instance than the public one.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a handler. Handlers are called in the order they were added.
    pub fn event_handler<H: EventHandler + 'static>(self, handler: H) -> Self {
        self.event_handler_arc(Arc::new(handler))
    }

    pub fn event_handler_arc(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Include memory and CPU usage of the bot process in every stats post.
    pub fn process_metrics(mut self, enabled: bool) -> Self {
        self.process_metrics = enabled;
        self
    }

    /// Data points for custom graphs, gathered before every stats post and sent as `customData`.
    pub fn custom_graph_data<F, Fut>(mut self, provider: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<CustomGraphData>> + Send + 'static,
    {
        self.custom_graph_data = Some(Arc::new(move || Box::pin(provider()) as GraphDataFuture));
        self
    }

    pub fn build(self) -> Result<StatsReporter> {
        let client = match &self.base_url {
            Some(base_url) => DisstatClient::with_base_url(&self.api_key, base_url)?,
            None => DisstatClient::new(&self.api_key)?,
        };

        #[cfg(not(feature = "process-metrics"))]
        if self.process_metrics {
            warn!("Process metrics were requested, but the process-metrics feature is disabled");
        }

        Ok(StatsReporter {
            inner: Arc::new(Inner {
                client,
                source: self.source,
                handlers: self.handlers,
                #[cfg(feature = "process-metrics")]
                process: self.process_metrics.then(ProcessMetrics::new),
                custom_graph_data: self.custom_graph_data,
                auto_post: Mutex::new(None),
            }),
        })
    }
}

/// Reports a bot's statistics to DisStat, either on a timer or on demand.
///
/// Cloning is cheap and clones share the same auto-posting state, so a clone can stop a timer
/// started through another clone.
#[derive(Clone)]
pub struct StatsReporter {
    inner: Arc<Inner>,
}

struct Inner {
    client: DisstatClient,
    source: Arc<dyn StatsSource>,
    handlers: Vec<Arc<dyn EventHandler>>,
    #[cfg(feature = "process-metrics")]
    process: Option<ProcessMetrics>,
    custom_graph_data: Option<GraphDataProvider>,
    auto_post: Mutex<Option<AutoPost>>,
}

struct AutoPost {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatsReporter {
    pub fn builder(api_key: impl Into<String>, source: impl StatsSource) -> StatsReporterBuilder {
        StatsReporterBuilder {
            api_key: api_key.into(),
            base_url: None,
            source: Arc::new(source),
            handlers: vec![],
            process_metrics: false,
            custom_graph_data: None,
        }
    }

    /// Starts posting stats every `interval`. The first post is made right away.
    ///
    /// Must be called from within a Tokio runtime. Fails with [`Error::AlreadyRunning`] if a timer
    /// is already active, the running timer is left untouched.
    pub fn start_auto_post(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(Error::InvalidInterval);
        }

        let mut slot = self
            .inner
            .auto_post
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            return Err(Error::AlreadyRunning);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(auto_post(self.inner.clone(), interval, cancel.clone()));

        *slot = Some(AutoPost { cancel, handle });

        info!("Posting stats to DisStat every {interval:?}");

        Ok(())
    }

    /// Stops the timer. A pending sleep or an in-flight post is abandoned. Does nothing when idle.
    pub fn stop_auto_post(&self) {
        let task = self
            .inner
            .auto_post
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = task {
            task.cancel.cancel();
            info!("Stopped posting stats to DisStat");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .auto_post
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Current counts as reported by the host. Custom graph data is only gathered when posting.
    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.snapshot()
    }

    /// Posts the current stats once, outside of the timer. No events are dispatched.
    pub async fn post_stats(&self) -> Result<Value> {
        let snapshot = self.inner.collect_snapshot().await;
        self.inner.post_snapshot(&snapshot).await
    }

    /// Reports a single command invocation.
    ///
    /// Failures are logged and handed to [`EventHandler::command_post_failed`], never returned,
    /// so this is safe to call from a command hook.
    pub async fn post_command(
        &self,
        command: impl Into<String>,
        invoker_id: u64,
        guild_id: Option<u64>,
    ) {
        let record = CommandRecord::new(command, invoker_id, guild_id);

        match self.inner.send_command(&record).await {
            Ok(response) => {
                debug!("Posted command {} to DisStat", record.command);

                for handler in &self.inner.handlers {
                    handler.command_posted(&record, &response).await;
                }
            }
            Err(why) => {
                warn!("Failed to post command {:?} to DisStat: {why}", record.command);

                for handler in &self.inner.handlers {
                    handler.command_post_failed(&record, &why).await;
                }
            }
        }
    }

    pub async fn post_custom_graph_data(&self, data: &CustomGraphData) -> Result<Value> {
        let bot_id = self.inner.bot_id()?;
        self.inner.client.post_custom_graph_data(bot_id, data).await
    }

    /// Reads a bot's public DisStat entry, this bot's when `bot_id` is `None`.
    pub async fn get_bot(&self, bot_id: Option<u64>, query: &BotQuery) -> Result<Value> {
        let bot_id = match bot_id {
            Some(bot_id) => bot_id,
            None => self.inner.bot_id()?,
        };

        self.inner.client.get_bot(bot_id, query).await
    }
}

impl Inner {
    fn bot_id(&self) -> Result<u64> {
        self.source.bot_id().ok_or(Error::NotReady)
    }

    fn snapshot(&self) -> StatsSnapshot {
        let snapshot = StatsSnapshot::new(
            self.source.guild_count(),
            self.source.user_count(),
            self.source.shard_count(),
        )
        .with_api_ping(self.source.api_ping());

        #[cfg(feature = "process-metrics")]
        if let Some(process) = &self.process {
            return snapshot.with_process(process.sample());
        }

        snapshot
    }

    async fn collect_snapshot(&self) -> StatsSnapshot {
        let snapshot = self.snapshot();

        match &self.custom_graph_data {
            Some(provider) => snapshot.with_custom_data(provider().await),
            None => snapshot,
        }
    }

    async fn post_snapshot(&self, snapshot: &StatsSnapshot) -> Result<Value> {
        let bot_id = self.bot_id()?;
        self.client.post_stats(bot_id, snapshot).await
    }

    async fn send_command(&self, record: &CommandRecord) -> Result<Value> {
        record.validate()?;

        let bot_id = self.bot_id()?;
        self.client.post_command(bot_id, record).await
    }

    /// One tick: post the current stats and tell the handlers how it went.
    async fn post_cycle(&self) {
        let snapshot = self.collect_snapshot().await;

        match self.post_snapshot(&snapshot).await {
            Ok(response) => {
                info!(
                    "Posted stats to DisStat ({} guilds, {} users, {} shards)",
                    snapshot.guild_count, snapshot.user_count, snapshot.shard_count
                );

                for handler in &self.handlers {
                    handler.stats_posted(&snapshot, &response).await;
                }
            }
            Err(why) => {
                if why.is_auth_failure() {
                    error!("DisStat rejected the API key: {why}");
                } else {
                    warn!("Failed to post stats to DisStat: {why}");
                }

                for handler in &self.handlers {
                    handler.stats_post_failed(&snapshot, &why).await;
                }
            }
        }
    }
}

async fn auto_post(inner: Arc<Inner>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);

    // A slow post pushes the schedule back instead of causing a burst of catch-up posts
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = inner.post_cycle() => {}
        }
    }

    debug!("Auto-post loop exited");
}
