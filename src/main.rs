use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod error;
mod favorites;
mod storage;
mod ui;

use crate::audio::{player::AudioPlayer, songbird_node::SongbirdNode};
use crate::bot::ShikiBot;
use crate::config::Config;
use crate::favorites::{FavoritesService, ShikimoriClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shikibot=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?)
                .add_directive("sea_orm=warn".parse()?),
        )
        .init();

    info!("🌸 Starting ShikiBot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("⚙️ {}", config.summary());

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    let db = storage::connect(&config.database_url).await?;
    let catalog = Arc::new(ShikimoriClient::new(&config.catalog_base_url)?);
    let favorites = Arc::new(FavoritesService::new(db, catalog));

    // Node events flow to one consumer so per-guild order is preserved
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();

    let songbird = Songbird::serenity();
    let node = Arc::new(SongbirdNode::new(Arc::clone(&songbird), events_tx.clone()));
    let player = Arc::new(AudioPlayer::from_config(node, &config));
    player.spawn_idle_watchdog(events_tx);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let config = Arc::new(config);
    let handler = ShikiBot::new(Arc::clone(&config), player, favorites, events_rx);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Graceful shutdown
    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Shutdown signal received, closing...");
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot started");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}

async fn health_check() -> Result<()> {
    // Songbird decodes yt-dlp streams itself, only yt-dlp must be on PATH
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    if yt_dlp.status.success() {
        println!("OK yt-dlp {}", String::from_utf8_lossy(&yt_dlp.stdout).trim());
        Ok(())
    } else {
        anyhow::bail!("yt-dlp is required but `yt-dlp --version` failed");
    }
}
