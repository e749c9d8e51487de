use std::sync::Arc;

use anyhow::Result;
use disstat_stats::{StatsReporter, DEFAULT_POST_INTERVAL};
use log::{error, info};
use poise::{Framework, FrameworkOptions};
use serenity::all::{Context as SerenityContext, Ready};

use crate::{commands, history::PostHistory, host::CacheStats};

pub type Context<'a> = poise::Context<'a, Data, anyhow::Error>;
pub type FrameworkError<'a> = poise::FrameworkError<'a, Data, anyhow::Error>;

pub struct Data {
    reporter: StatsReporter,
    history: Arc<PostHistory>,
}

impl Data {
    pub fn reporter(&self) -> &StatsReporter {
        &self.reporter
    }

    pub fn history(&self) -> &PostHistory {
        &self.history
    }
}

pub fn framework_opts() -> FrameworkOptions<Data, anyhow::Error> {
    FrameworkOptions {
        commands: vec![commands::core::ping(), commands::core::stats()],
        post_command: |ctx| Box::pin(report_command(ctx)),
        on_error: |error| Box::pin(on_error(error)),
        ..Default::default()
    }
}

pub async fn setup(
    ctx: &SerenityContext,
    ready: &Ready,
    framework: &Framework<Data, anyhow::Error>,
) -> Result<Data> {
    info!("Successfully logged in as {}", ready.user.name);

    poise::builtins::register_globally(ctx, &framework.options().commands).await?;

    let history = Arc::new(PostHistory::default());
    let source = CacheStats::new(
        ctx.cache.clone(),
        framework.shard_manager().clone(),
        ready.user.id,
    );

    let mut builder = StatsReporter::builder(disstat_config::disstat_api_key(), source)
        .event_handler_arc(history.clone())
        .process_metrics(disstat_config::process_metrics());

    if let Some(base_url) = disstat_config::disstat_base_url() {
        builder = builder.base_url(base_url);
    }

    let reporter = builder.build()?;
    let interval = disstat_config::post_interval().unwrap_or(DEFAULT_POST_INTERVAL);
    reporter.start_auto_post(interval)?;

    Ok(Data { reporter, history })
}

/// Reports every completed command without holding up the framework.
async fn report_command(ctx: Context<'_>) {
    let reporter = ctx.data().reporter().clone();
    let command = ctx.command().qualified_name.clone();
    let invoker_id = ctx.author().id.get();
    let guild_id = ctx.guild_id().map(|guild_id| guild_id.get());

    tokio::spawn(async move {
        reporter.post_command(command, invoker_id, guild_id).await;
    });
}

async fn on_error(error: FrameworkError<'_>) {
    match error {
        FrameworkError::Setup { error, .. } => {
            error!("Failed to set up DisStat reporting: {error}");
        }
        FrameworkError::Command { error, ctx, .. } => {
            error!(
                "An error occured in command {}: {error}",
                ctx.command().qualified_name
            );
        }
        other => {
            if let Err(why) = poise::builtins::on_error(other).await {
                error!("Failed to handle framework error: {why}");
            }
        }
    }
}
