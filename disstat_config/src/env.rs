use std::sync::LazyLock;

pub static DISCORD_TOKEN: LazyLock<String> = LazyLock::new(|| {
    std::env::var("DISCORD_TOKEN").expect("missing DISCORD_TOKEN environment variable")
});
pub static DISSTAT_API_KEY: LazyLock<String> = LazyLock::new(|| {
    std::env::var("DISSTAT_API_KEY").expect("missing DISSTAT_API_KEY environment variable")
});
pub static DISSTAT_BASE_URL: LazyLock<Option<String>> = LazyLock::new(|| {
    std::env::var("DISSTAT_BASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
});
pub static DISSTAT_POST_INTERVAL: LazyLock<Option<u64>> = LazyLock::new(|| {
    std::env::var("DISSTAT_POST_INTERVAL").ok().map(|secs| {
        secs.parse()
            .expect("DISSTAT_POST_INTERVAL must be a whole number of seconds")
    })
});
pub static DISSTAT_PROCESS_METRICS: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("DISSTAT_PROCESS_METRICS")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
});
