use chrono::Timelike;
use serenity::{
    builder::CreateMessage,
    http::Http,
    model::{
        channel::{Message, MessageFlags},
        guild::Member,
        id::{ChannelId, UserId},
    },
    prelude::{Context, Mentionable},
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        node::NodeEvent,
        player::{Advance, AudioPlayer},
    },
    config::Config,
    favorites::FavoritesService,
    ui::now_playing::NowPlayingRegistry,
};

/// Consumes node events in emission order and keeps the presenter in sync.
pub async fn pump_node_events(
    http: Arc<Http>,
    player: Arc<AudioPlayer>,
    now_playing: Arc<NowPlayingRegistry>,
    mut events: UnboundedReceiver<NodeEvent>,
) {
    info!("📡 Node event pump started");

    while let Some(event) = events.recv().await {
        debug!("📡 {:?}", event);

        match event {
            NodeEvent::TrackStarted { guild_id, play_id } => {
                if let Some(snapshot) = player.track_started(guild_id, play_id) {
                    if let Err(e) = now_playing.refresh(&http, &snapshot).await {
                        warn!("Could not publish now-playing message in guild {}: {}", guild_id, e);
                    }
                }
            }
            NodeEvent::TrackEnded { guild_id, play_id } => {
                match player.track_ended(guild_id, play_id).await {
                    // The next start event refreshes the message
                    Some(Advance::Started(_)) | None => {}
                    Some(Advance::Idle) | Some(Advance::TornDown) => {
                        now_playing.clear(&http, guild_id).await
                    }
                }
            }
            NodeEvent::Inactive { guild_id } => {
                if player.inactive(guild_id).await {
                    now_playing.clear(&http, guild_id).await;
                }
            }
        }
    }

    warn!("📡 Node event channel closed");
}

/// Time-of-day greeting for a local hour in `0..24`.
pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        6..=11 => "Ohayou",
        12..=17 => "Konnichiwa",
        18..=22 => "Konbanwa",
        _ => "Oyasumi nasai",
    }
}

pub async fn greet_member(ctx: &Context, config: &Config, member: &Member) {
    let Some(channel_id) = config.greetings_channel_id else {
        return;
    };

    let hour = chrono::Local::now().hour();
    let content = format!(
        "{}, {}! Welcome to the server, register your favorite characters with \
         /register_favorites to unlock the voice channels ✨",
        greeting_for_hour(hour),
        member.mention()
    );
    let message = CreateMessage::new()
        .content(content)
        .flags(MessageFlags::SUPPRESS_EMBEDS);

    if let Err(e) = ChannelId::new(channel_id)
        .send_message(&ctx.http, message)
        .await
    {
        warn!("Could not greet {} in channel {}: {}", member.user.name, channel_id, e);
    }
}

/// Cleans up after a departed member: unused roles first, then stored favorites.
pub async fn forget_member(ctx: &Context, favorites: &FavoritesService, user_id: UserId) {
    crate::bot::roles::remove_unused_roles(ctx).await;

    if let Err(e) = favorites.remove_user(user_id.get()).await {
        warn!("Could not remove favorites of {}: {}", user_id, e);
    }
}

/// Whether a message must be removed from a no-chat channel.
pub fn is_forbidden_message(
    restricted: &[u64],
    channel_id: ChannelId,
    author_is_bot: bool,
) -> bool {
    !author_is_bot && restricted.contains(&channel_id.get())
}

pub async fn enforce_restricted_channel(ctx: &Context, config: &Config, message: &Message) {
    let restricted = &config.restricted_channel_ids;
    if !is_forbidden_message(restricted, message.channel_id, message.author.bot) {
        return;
    }

    match message.delete(&ctx.http).await {
        Ok(()) => debug!(
            "🧹 Deleted message from {} in channel {}",
            message.author.name, message.channel_id
        ),
        Err(e) => warn!("Could not delete message in channel {}: {}", message.channel_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn greets_by_time_of_day() {
        assert_eq!(greeting_for_hour(6), "Ohayou");
        assert_eq!(greeting_for_hour(11), "Ohayou");
        assert_eq!(greeting_for_hour(12), "Konnichiwa");
        assert_eq!(greeting_for_hour(18), "Konbanwa");
        assert_eq!(greeting_for_hour(22), "Konbanwa");
        assert_eq!(greeting_for_hour(23), "Oyasumi nasai");
        assert_eq!(greeting_for_hour(3), "Oyasumi nasai");
    }

    #[test]
    fn only_member_messages_in_restricted_channels_are_forbidden() {
        let restricted = [100, 200];

        assert!(is_forbidden_message(&restricted, ChannelId::new(100), false));
        assert!(!is_forbidden_message(&restricted, ChannelId::new(100), true));
        assert!(!is_forbidden_message(&restricted, ChannelId::new(300), false));
    }
}
