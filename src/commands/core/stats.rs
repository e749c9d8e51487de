use anyhow::Result;
use disstat_stats::{BotQuery, Error};
use log::error;
use poise::CreateReply;
use serenity::all::{Colour, CreateEmbed, CreateEmbedFooter};

use crate::bot::{Context, FrameworkError};

/// Show what the bot reports to DisStat
#[poise::command(slash_command, on_error = on_error)]
pub async fn stats(ctx: Context<'_>) -> Result<()> {
    ctx.defer_ephemeral().await?;

    let data = ctx.data();
    let snapshot = data.reporter().snapshot();
    let summary = data.history().summary().await;

    let listing = match data.reporter().get_bot(None, &BotQuery::default()).await {
        Ok(_) => "Listed",
        Err(Error::Remote { status, .. }) if status.as_u16() == 404 => "Not listed yet",
        Err(why) => return Err(why.into()),
    };

    let last_post = match summary.last_posted_at {
        Some(posted_at) => format!("<t:{}:R>", posted_at.timestamp()),
        None => "Never".to_string(),
    };

    let colour = if summary.consecutive_failures > 0 {
        Colour::ORANGE
    } else {
        Colour::DARK_GREEN
    };

    ctx.send(
        CreateReply::default()
            .embed(
                CreateEmbed::new()
                    .title("DisStat")
                    .field("Guilds", snapshot.guild_count.to_string(), true)
                    .field("Users", snapshot.user_count.to_string(), true)
                    .field("Shards", snapshot.shard_count.to_string(), true)
                    .field("Last post", last_post, true)
                    .field(
                        "Failed posts",
                        summary.consecutive_failures.to_string(),
                        true,
                    )
                    .field("Commands reported", summary.commands_posted.to_string(), true)
                    .footer(CreateEmbedFooter::new(listing))
                    .color(colour),
            )
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

async fn on_error(error: FrameworkError<'_>) {
    if let FrameworkError::Command { error, ctx, .. } = error {
        error!("An error occured while fetching DisStat stats: {error}");

        _ = ctx
            .send(
                CreateReply::default()
                    .embed(
                        CreateEmbed::new()
                            .description("Failed to reach DisStat, try again later.")
                            .color(Colour::RED),
                    )
                    .ephemeral(true),
            )
            .await;
    } else {
        error!("{error}")
    }
}
