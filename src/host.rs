use std::sync::Arc;
use std::time::Duration;

use disstat_stats::StatsSource;
use serenity::all::{Cache, ShardManager, UserId};

/// Reads the bot's size from the gateway cache and its latency from the shard runners.
pub struct CacheStats {
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
    bot_id: UserId,
}

impl CacheStats {
    pub fn new(cache: Arc<Cache>, shard_manager: Arc<ShardManager>, bot_id: UserId) -> Self {
        Self {
            cache,
            shard_manager,
            bot_id,
        }
    }
}

impl StatsSource for CacheStats {
    fn bot_id(&self) -> Option<u64> {
        Some(self.bot_id.get())
    }

    fn guild_count(&self) -> u64 {
        self.cache.guild_count() as u64
    }

    // Only accurate with the GUILD_MEMBERS intent
    fn user_count(&self) -> u64 {
        self.cache.user_count() as u64
    }

    fn shard_count(&self) -> u32 {
        self.cache.shard_count()
    }

    /// Average heartbeat latency over all shards. Skipped for this tick if the runners are busy.
    fn api_ping(&self) -> Option<u64> {
        let runners = self.shard_manager.runners.try_lock().ok()?;
        let latencies: Vec<Duration> = runners
            .values()
            .filter_map(|runner| runner.latency)
            .collect();

        if latencies.is_empty() {
            return None;
        }

        let average = latencies.iter().sum::<Duration>() / latencies.len() as u32;
        Some((average.as_secs_f64() * 1000.0).round() as u64)
    }
}
