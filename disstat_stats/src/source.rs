/// Read access to the host bot's current size.
///
/// Implemented by the host (for example on top of a gateway cache). Called once per tick, so
/// implementations should be cheap and must not block.
pub trait StatsSource: Send + Sync + 'static {
    /// The bot's user id, `None` until the bot has logged in.
    fn bot_id(&self) -> Option<u64>;

    fn guild_count(&self) -> u64;

    fn user_count(&self) -> u64;

    fn shard_count(&self) -> u32 {
        1
    }

    /// Gateway latency in milliseconds, left out of the post when unknown.
    fn api_ping(&self) -> Option<u64> {
        None
    }
}
