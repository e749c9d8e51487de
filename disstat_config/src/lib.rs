mod env;

use std::time::Duration;

use serenity::all::GatewayIntents;

pub fn discord_token() -> &'static str {
    &env::DISCORD_TOKEN
}

pub fn discord_intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS
}

pub fn disstat_api_key() -> &'static str {
    &env::DISSTAT_API_KEY
}

/// Overrides the DisStat API location, `None` means the public instance.
pub fn disstat_base_url() -> Option<&'static str> {
    env::DISSTAT_BASE_URL.as_deref()
}

/// `None` leaves the interval up to the reporter's default.
pub fn post_interval() -> Option<Duration> {
    env::DISSTAT_POST_INTERVAL.map(Duration::from_secs)
}

pub fn process_metrics() -> bool {
    *env::DISSTAT_PROCESS_METRICS
}
