mod bot;
mod commands;
mod history;
mod host;

use log::{error, info};
use poise::Framework;
use serenity::all::ClientBuilder;

#[tokio::main]
async fn main() {
    // Setup logging
    if std::env::var("RUST_LOG").is_err() {
        #[cfg(debug_assertions)]
        std::env::set_var("RUST_LOG", "disstat");

        #[cfg(not(debug_assertions))]
        std::env::set_var("RUST_LOG", "disstat=info");
    }

    env_logger::init();

    dotenvy::dotenv().ok();

    info!("Starting DisStat reporter bot");

    let framework = Framework::builder()
        .setup(|ctx, ready, framework| Box::pin(bot::setup(ctx, ready, framework)))
        .options(bot::framework_opts())
        .build();

    let mut client = match ClientBuilder::new(
        disstat_config::discord_token(),
        disstat_config::discord_intents(),
    )
    .framework(framework)
    .await
    {
        Ok(client) => client,
        Err(why) => {
            error!("Fatal error when building Serenity client: {why}");
            return;
        }
    };

    if let Err(why) = client.start_autosharded().await {
        error!("Fatal error occured during bot operations: {why}");
        error!("Bot will now shut down!");
    }
}
