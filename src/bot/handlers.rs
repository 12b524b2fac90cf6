use serenity::{
    builder::{
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{
        application::{CommandInteraction, ComponentInteraction},
        id::GuildId,
    },
    prelude::Context,
};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{
    audio::player::{Advance, EnqueueOutcome},
    bot::{
        admin::{self, RelaySource},
        commands::REFERENCE_OPTIONS,
        preconditions::{
            Invocation, ADMIN_CHAIN, CONTROL_CHAIN, GUILD_CHAIN, PLAY_CHAIN, STATUS_CHAIN,
        },
        roles, ShikiBot,
    },
    error::{CommandError, FavoritesError, PlayerError, PreconditionError, RoleError},
    ui::{buttons, embeds, now_playing, pager},
};

/// Handles slash commands
pub async fn handle_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    info!(
        "📝 Command /{} used by {} in guild {:?}",
        command.data.name, command.user.name, command.guild_id
    );

    match command.data.name.as_str() {
        "play" => handle_play(ctx, command, bot).await,
        "stop" => handle_stop(ctx, command, bot).await,
        "pause" => handle_pause(ctx, command, bot).await,
        "skip" => handle_skip(ctx, command, bot).await,
        "volume" => handle_volume(ctx, command, bot).await,
        "np" => handle_nowplaying(ctx, command, bot).await,
        "queue" => handle_queue(ctx, command, bot).await,
        "register_favorites" => handle_register_favorites(ctx, command, bot).await,
        "show_favorites" => handle_show_favorites(ctx, command, bot).await,
        "set_favorite" => handle_set_favorite(ctx, command, bot).await,
        "clear_favorite" => handle_clear_favorite(ctx, command, bot).await,
        "leaderboard" => handle_leaderboard(ctx, command, bot).await,
        "change_role_color" => handle_change_role_color(ctx, command, bot).await,
        "change_role_name" => handle_change_role_name(ctx, command, bot).await,
        "send_message" => handle_send_message(ctx, command, bot).await,
        "edit_message" => handle_edit_message(ctx, command, bot).await,
        _ => reply(ctx, command, "❌ Unknown command").await,
    }
}

/// Handles component interactions (buttons)
pub async fn handle_component(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    info!(
        "🔘 Button {} pressed by {} in guild {:?}",
        component.data.custom_id, component.user.name, component.guild_id
    );

    // Pager buttons are consumed by the collector waiting on that message.
    if component.data.custom_id.starts_with("pager_") {
        return Ok(());
    }

    buttons::handle_player_component(ctx, component, bot).await
}

/// Tells the user what went wrong, whether or not the interaction was answered yet.
pub async fn report_command_error(ctx: &Context, command: &CommandInteraction, err: &CommandError) {
    log_error(&command.data.name, err);
    let message = err.user_message();

    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(&message)
            .ephemeral(true),
    );
    if command.create_response(&ctx.http, response).await.is_ok() {
        return;
    }

    let followup = CreateInteractionResponseFollowup::new()
        .content(message)
        .ephemeral(true);
    if let Err(e) = command.create_followup(&ctx.http, followup).await {
        warn!("Could not report error for /{}: {}", command.data.name, e);
    }
}

pub async fn report_component_error(
    ctx: &Context,
    component: &ComponentInteraction,
    err: &CommandError,
) {
    log_error(&component.data.custom_id, err);
    let message = err.user_message();

    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(&message)
            .ephemeral(true),
    );
    if component.create_response(&ctx.http, response).await.is_ok() {
        return;
    }

    let followup = CreateInteractionResponseFollowup::new()
        .content(message)
        .ephemeral(true);
    if let Err(e) = component.create_followup(&ctx.http, followup).await {
        warn!("Could not report error for {}: {}", component.data.custom_id, e);
    }
}

fn log_error(source: &str, err: &CommandError) {
    if err.is_expected() {
        info!("⚠️ {} rejected: {}", source, err);
    } else {
        error!("❌ {} failed: {:?}", source, err);
    }
}

// Music

async fn handle_play(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let invocation = Invocation::from_command(ctx, command, &bot.player);
    let guild_id = invocation.check(PLAY_CHAIN)?;
    let voice_channel = invocation
        .user_channel
        .ok_or(PreconditionError::UserNotInVoice)?;
    let query = required_str(command, "query")?;

    // Search can take a while
    command.defer_ephemeral(&ctx.http).await?;

    let track = bot.player.search(query).await?;
    bot.player
        .connect(guild_id, voice_channel, command.channel_id)
        .await?;

    let content = match bot.player.enqueue(guild_id, track).await? {
        EnqueueOutcome::Started(track) => format!("🎵 Playing **{}**!", track.title),
        EnqueueOutcome::Queued { track, position } => {
            refresh_now_playing(ctx, bot, guild_id).await;
            format!("➕ Added **{}** to the queue (position {})", track.title, position)
        }
    };

    edit_reply(ctx, command, content).await
}

async fn handle_stop(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(CONTROL_CHAIN)?;

    bot.player.stop(guild_id).await?;
    bot.now_playing.clear(&ctx.http, guild_id).await;

    reply(ctx, command, "⏹️ Stopped, see you next time!").await
}

async fn handle_pause(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(CONTROL_CHAIN)?;

    let paused = bot.player.toggle_pause(guild_id).await?;
    refresh_now_playing(ctx, bot, guild_id).await;

    reply(ctx, command, if paused { "⏸️ Paused" } else { "▶️ Resumed" }).await
}

async fn handle_skip(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(CONTROL_CHAIN)?;

    let content = match bot.player.skip(guild_id).await? {
        Advance::Started(track) => format!("⏭️ Skipped, now playing **{}**", track.title),
        Advance::Idle | Advance::TornDown => {
            bot.now_playing.clear(&ctx.http, guild_id).await;
            "⏹️ The queue is empty, leaving the channel".to_string()
        }
    };

    reply(ctx, command, content).await
}

async fn handle_volume(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(CONTROL_CHAIN)?;
    let level = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "level")
        .and_then(|opt| opt.value.as_i64())
        .ok_or(CommandError::MissingOption("level"))?;

    let volume = bot.player.set_volume(guild_id, level).await?;
    refresh_now_playing(ctx, bot, guild_id).await;

    reply(ctx, command, format!("🔊 Volume set to {}%", volume)).await
}

async fn handle_nowplaying(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(STATUS_CHAIN)?;

    let view = bot
        .player
        .snapshot(guild_id)
        .as_ref()
        .and_then(now_playing::render)
        .ok_or(PlayerError::NothingPlaying)?;

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(view.embed())
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_queue(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(STATUS_CHAIN)?;
    let snapshot = bot
        .player
        .snapshot(guild_id)
        .ok_or(PlayerError::NoSession(guild_id.get()))?;

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embeds::queue_embed(&snapshot))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

// Favorites

async fn handle_register_favorites(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;
    let role_name = required_str(command, "role")?;
    let references = REFERENCE_OPTIONS
        .iter()
        .filter_map(|name| string_option(command, name))
        .map(str::to_string)
        .collect::<Vec<_>>();

    command.defer_ephemeral(&ctx.http).await?;

    let user_id = command.user.id;
    if bot.favorites.is_registered(user_id.get()).await? {
        return Err(FavoritesError::AlreadyRegistered.into());
    }
    if let Some(existing) = roles::find_role(ctx, guild_id, role_name) {
        return Err(RoleError::NameTaken(existing.name).into());
    }

    let stored = bot.favorites.register(user_id.get(), &references).await?;

    let role = match roles::provision_role(ctx, &bot.config, guild_id, user_id, role_name).await {
        Ok(role) => role,
        Err(e) => {
            // A registration never outlives a failed role setup.
            if let Err(cleanup) = bot.favorites.remove_user(user_id.get()).await {
                warn!("Could not roll back favorites of {}: {}", user_id, cleanup);
            }
            return Err(e.into());
        }
    };

    let names = stored
        .iter()
        .map(|entry| format!("• {}", entry.russian_name))
        .collect::<Vec<_>>()
        .join("\n");
    edit_reply(
        ctx,
        command,
        format!(
            "✅ Favorites saved:\n{}\n\nYour role **{}** was created and access was granted!",
            names, role.name
        ),
    )
    .await
}

async fn handle_show_favorites(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;

    let target = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "user")
        .and_then(|opt| opt.value.as_user_id())
        .unwrap_or(command.user.id);
    let owner = command
        .data
        .resolved
        .users
        .get(&target)
        .map(|user| user.name.clone())
        .unwrap_or_else(|| command.user.name.clone());

    let entries = bot.favorites.list(target.get()).await?;

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embeds::favorites_embed(&owner, &entries))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_set_favorite(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;
    let reference = required_str(command, "reference")?;

    let entry = bot.favorites.set_favorite(command.user.id.get(), reference).await?;

    reply(ctx, command, format!("💖 **{}** is now your favorite!", entry.russian_name)).await
}

async fn handle_clear_favorite(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;

    bot.favorites.clear_favorite(command.user.id.get()).await?;

    reply(ctx, command, "💔 Favorite marker removed").await
}

async fn handle_leaderboard(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;

    let rows = bot.favorites.leaderboard().await?;
    if rows.is_empty() {
        return reply(ctx, command, "📭 Nobody has registered any characters yet").await;
    }

    let idle = Duration::from_secs(bot.config.leaderboard_timeout);
    pager::run_leaderboard(ctx, command, rows, idle).await?;
    Ok(())
}

// Roles

async fn handle_change_role_color(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;
    let member = command.member.as_deref().ok_or(PreconditionError::NotInGuild)?;
    let role_name = required_str(command, "role")?;
    let colour = required_str(command, "color")?;

    let role = roles::change_colour(ctx, guild_id, member, role_name, colour).await?;

    reply(ctx, command, format!("🎨 Role **{}** now uses {}", role.name, colour.trim())).await
}

async fn handle_change_role_name(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(GUILD_CHAIN)?;
    let member = command.member.as_deref().ok_or(PreconditionError::NotInGuild)?;
    let role_name = required_str(command, "role")?;
    let new_name = required_str(command, "name")?;

    let role = roles::rename(ctx, guild_id, member, role_name, new_name).await?;

    reply(ctx, command, format!("🏷️ Your role is now called **{}**", role.name)).await
}

// Admin

async fn handle_send_message(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(ADMIN_CHAIN)?;
    let channel_id = required_str(command, "channel_id")?;
    let source = RelaySource::from_options(
        string_option(command, "content"),
        string_option(command, "message_id"),
    )?;

    command.defer_ephemeral(&ctx.http).await?;
    let channel_id = admin::send_message(ctx, guild_id, channel_id, source).await?;

    edit_reply(ctx, command, format!("✅ Message sent to <#{}>", channel_id)).await
}

async fn handle_edit_message(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let guild_id = Invocation::from_command(ctx, command, &bot.player).check(ADMIN_CHAIN)?;
    let target = required_str(command, "target_message_id")?;
    let source = RelaySource::from_options(
        string_option(command, "content"),
        string_option(command, "message_id"),
    )?;

    command.defer_ephemeral(&ctx.http).await?;
    let edited = admin::edit_message(ctx, guild_id, target, source).await?;

    edit_reply(ctx, command, format!("✅ Message {} edited", edited.link())).await
}

// Helpers

fn string_option<'a>(command: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|opt| opt.name == name)
        .and_then(|opt| opt.value.as_str())
}

fn required_str<'a>(
    command: &'a CommandInteraction,
    name: &'static str,
) -> Result<&'a str, CommandError> {
    string_option(command, name).ok_or(CommandError::MissingOption(name))
}

async fn reply(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<(), CommandError> {
    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn edit_reply(
    ctx: &Context,
    command: &CommandInteraction,
    content: impl Into<String>,
) -> Result<(), CommandError> {
    command
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await?;
    Ok(())
}

/// Re-renders the live now-playing message; failures only cost a stale display.
async fn refresh_now_playing(ctx: &Context, bot: &ShikiBot, guild_id: GuildId) {
    let Some(snapshot) = bot.player.snapshot(guild_id) else {
        return;
    };
    if let Err(e) = bot.now_playing.refresh(&ctx.http, &snapshot).await {
        warn!("Could not refresh now-playing message in guild {}: {}", guild_id, e);
    }
}
