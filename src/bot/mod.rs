//! # Bot Module
//!
//! Discord-facing side of ShikiBot.
//!
//! ## Architecture
//!
//! The bot is built around the [`ShikiBot`] struct which implements
//! Serenity's [`EventHandler`] trait. It owns:
//!
//! - Playback through [`AudioPlayer`], one voice session per guild
//! - The per-guild now-playing messages in [`NowPlayingRegistry`]
//! - Favorites registration and the leaderboard via [`FavoritesService`]
//!
//! Node events (track start/end, inactivity) reach the bot through a single
//! channel consumed by [`events::pump_node_events`], started once on `ready`.

use anyhow::Result;
use parking_lot::Mutex;
use serenity::{
    all::{Context, EventHandler, GuildId, Interaction, Member, Message, Ready, User, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

pub mod admin;
pub mod commands;
pub mod events;
pub mod handlers;
pub mod preconditions;
pub mod roles;

use crate::{
    audio::{node::NodeEvent, player::AudioPlayer},
    config::Config,
    favorites::FavoritesService,
    ui::now_playing::NowPlayingRegistry,
};

/// Main Discord event handler.
///
/// ## Thread Safety
///
/// Shared state lives behind [`Arc`]; the player and the registry synchronize
/// internally, so handlers for different guilds never contend.
pub struct ShikiBot {
    /// Bot configuration loaded from environment variables
    pub config: Arc<Config>,
    /// Per-guild playback queues
    pub player: Arc<AudioPlayer>,
    /// Favorites registration, listing and leaderboard
    pub favorites: Arc<FavoritesService>,
    /// Live now-playing messages per guild
    pub now_playing: Arc<NowPlayingRegistry>,
    /// Taken by the first `ready`; reconnects must not start a second pump
    node_events: Mutex<Option<UnboundedReceiver<NodeEvent>>>,
}

impl ShikiBot {
    /// Creates the handler.
    ///
    /// # Arguments
    ///
    /// * `config` - Bot configuration
    /// * `player` - Playback queue manager
    /// * `favorites` - Favorites service backed by the database
    /// * `node_events` - Receiving side of the audio node's event channel
    pub fn new(
        config: Arc<Config>,
        player: Arc<AudioPlayer>,
        favorites: Arc<FavoritesService>,
        node_events: UnboundedReceiver<NodeEvent>,
    ) -> Self {
        Self {
            config,
            player,
            favorites,
            now_playing: Arc::new(NowPlayingRegistry::new()),
            node_events: Mutex::new(Some(node_events)),
        }
    }

    /// Registers slash commands with Discord.
    ///
    /// Commands are registered for the configured development guild when
    /// `GUILD_ID` is set, globally otherwise.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Commands registered successfully
    /// * `Err(anyhow::Error)` - Registration failed (permissions, network, etc.)
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registering slash commands...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registering commands for guild {}", guild_id);
                commands::register_guild_commands(ctx, guild_id).await?;
            }
            None => {
                info!("🌐 Registering commands globally");
                commands::register_global_commands(ctx).await?;
            }
        }

        info!("✅ Commands registered");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for ShikiBot {
    /// Registers commands and starts the node event pump.
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} is online!", ready.user.name);
        info!("📊 Connected to {} servers", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("❌ Could not register commands: {:?}", e);
        }

        let Some(events) = self.node_events.lock().take() else {
            return;
        };
        tokio::spawn(events::pump_node_events(
            Arc::clone(&ctx.http),
            Arc::clone(&self.player),
            Arc::clone(&self.now_playing),
            events,
        ));
    }

    /// Dispatches slash commands and button presses.
    ///
    /// Failures are reported to the invoking user as an ephemeral message.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(e) = handlers::handle_command(&ctx, &command, self).await {
                    handlers::report_command_error(&ctx, &command, &e).await;
                }
            }
            Interaction::Component(component) => {
                if let Err(e) = handlers::handle_component(&ctx, &component, self).await {
                    handlers::report_component_error(&ctx, &component, &e).await;
                }
            }
            _ => {}
        }
    }

    /// Detects the bot leaving voice without going through `/stop`.
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        info!("🔌 Bot disconnected from voice in guild {}", guild_id);
        self.player.forget(guild_id).await;
        self.now_playing.clear(&ctx.http, guild_id).await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        events::greet_member(&ctx, &self.config, &new_member).await;
    }

    async fn guild_member_removal(
        &self,
        ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        info!("👋 {} left guild {}", user.name, guild_id);
        events::forget_member(&ctx, &self.favorites, user.id).await;
    }

    async fn message(&self, ctx: Context, new_message: Message) {
        if new_message.guild_id.is_none() {
            return;
        }
        events::enforce_restricted_channel(&ctx, &self.config, &new_message).await;
    }
}
