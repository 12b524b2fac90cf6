//! The per-guild "now playing" message.
//!
//! Each guild has at most one live message. Every access goes through the
//! guild's slot lock, which serializes track-start refreshes with button
//! presses on the same message.

use dashmap::DashMap;
use serenity::{
    builder::{CreateActionRow, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage},
    http::{Http, HttpError},
    model::id::{ChannelId, GuildId, MessageId},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    audio::session::SessionSnapshot,
    ui::{
        buttons::player_controls,
        embeds::{colors, format_duration},
    },
};

const UPCOMING_SHOWN: usize = 5;

const FOOTER: &str = "If the queue stays empty,\nI'll leave the voice channel after a minute!";

/// Discord JSON error code for a deleted or unknown message.
const UNKNOWN_MESSAGE: isize = 10008;

/// Everything the now-playing message displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingView {
    pub title: String,
    pub author: String,
    /// Provenance tag, e.g. `youtube`.
    pub source: String,
    pub url: String,
    pub artwork: Option<String>,
    pub duration: String,
    pub queued: usize,
    /// `n. author - title` lines for the next few tracks.
    pub upcoming: Vec<String>,
    pub volume: u8,
    pub paused: bool,
}

/// Builds the view for a session, `None` when nothing is playing.
pub fn render(snapshot: &SessionSnapshot) -> Option<NowPlayingView> {
    let current = snapshot.current.as_ref()?;

    Some(NowPlayingView {
        title: current.title.clone(),
        author: current.author.clone(),
        source: current.source.clone(),
        url: current.url.clone(),
        artwork: current.artwork.clone(),
        duration: current
            .duration
            .map(format_duration)
            .unwrap_or_else(|| "🔴 live".to_string()),
        queued: snapshot.upcoming.len(),
        upcoming: snapshot
            .upcoming
            .iter()
            .take(UPCOMING_SHOWN)
            .enumerate()
            .map(|(i, track)| format!("{}. {} - {}", i + 1, track.author, track.title))
            .collect(),
        volume: snapshot.volume,
        paused: snapshot.paused,
    })
}

impl NowPlayingView {
    pub fn embed(&self) -> CreateEmbed {
        let queue = if self.upcoming.is_empty() {
            "The queue is empty".to_string()
        } else {
            self.upcoming.join("\n")
        };

        let mut embed = CreateEmbed::default()
            .title(if self.paused { "⏸️ Paused" } else { "🎵 Now playing" })
            .description(format!("[{}]({})", self.title, self.url))
            .color(colors::MAIN_PURPLE)
            .field("Artist", format!("`{}`", self.author), true)
            .field("Duration", format!("`{}`", self.duration), true)
            .field("Source", format!("`{}`", self.source), true)
            .field("In queue", format!("`{}`", self.queued), true)
            .field("Volume", format!("`{}%`", self.volume), true)
            .field(format!("Queue [first {}]", UPCOMING_SHOWN), queue, false)
            .footer(CreateEmbedFooter::new(FOOTER));

        if let Some(artwork) = &self.artwork {
            embed = embed.thumbnail(artwork);
        }

        embed
    }

    pub fn components(&self) -> Vec<CreateActionRow> {
        player_controls(self.paused)
    }
}

/// Location of a posted now-playing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

pub type Slot = Arc<Mutex<Option<LiveMessage>>>;

#[derive(Default)]
pub struct NowPlayingRegistry {
    slots: DashMap<GuildId, Slot>,
}

impl NowPlayingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding the guild's live message.
    pub fn slot(&self, guild_id: GuildId) -> Slot {
        Arc::clone(self.slots.entry(guild_id).or_default().value())
    }

    /// Re-renders the live message from `snapshot`, deleting it when nothing plays.
    pub async fn refresh(
        &self,
        http: &Http,
        snapshot: &SessionSnapshot,
    ) -> Result<(), serenity::Error> {
        let slot = self.slot(snapshot.guild_id);
        let mut live = slot.lock().await;
        Self::publish(&mut live, http, snapshot).await
    }

    /// Deletes the live message and forgets the guild.
    pub async fn clear(&self, http: &Http, guild_id: GuildId) {
        let Some((_, slot)) = self.slots.remove(&guild_id) else {
            return;
        };
        let mut live = slot.lock().await;
        Self::retire(&mut live, http).await;
    }

    /// Edits the live message in place, or posts a new one in the session's
    /// text channel when there is none or it was deleted.
    ///
    /// Any other edit failure is returned and the slot keeps pointing at the
    /// existing message.
    pub async fn publish(
        live: &mut Option<LiveMessage>,
        http: &Http,
        snapshot: &SessionSnapshot,
    ) -> Result<(), serenity::Error> {
        let Some(view) = render(snapshot) else {
            Self::retire(live, http).await;
            return Ok(());
        };

        if let Some(current) = *live {
            let edit = EditMessage::new()
                .embed(view.embed())
                .components(view.components());
            match current.channel_id.edit_message(http, current.message_id, edit).await {
                Ok(_) => return Ok(()),
                Err(e) if message_is_gone(&e) => {
                    debug!("Now-playing message in guild {} is gone: {}", snapshot.guild_id, e);
                }
                Err(e) => return Err(e),
            }
        }

        let message = snapshot
            .text_channel
            .send_message(
                http,
                CreateMessage::new()
                    .embed(view.embed())
                    .components(view.components()),
            )
            .await?;

        *live = Some(LiveMessage {
            channel_id: message.channel_id,
            message_id: message.id,
        });
        Ok(())
    }

    /// Deletes the live message, if any.
    pub async fn retire(live: &mut Option<LiveMessage>, http: &Http) {
        if let Some(message) = live.take() {
            if let Err(e) = message.channel_id.delete_message(http, message.message_id).await {
                warn!("Could not delete now-playing message {}: {}", message.message_id, e);
            }
        }
    }

    /// Adopts a message the user interacted with when the slot is empty.
    pub fn adopt(live: &mut Option<LiveMessage>, channel_id: ChannelId, message_id: MessageId) {
        live.get_or_insert(LiveMessage {
            channel_id,
            message_id,
        });
    }
}

fn message_is_gone(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            is_missing_message(response.status_code.as_u16(), response.error.code)
        }
        _ => false,
    }
}

/// Only a 404 or an Unknown Message code means the message no longer exists.
fn is_missing_message(status: u16, code: isize) -> bool {
    status == 404 || code == UNKNOWN_MESSAGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::queue::track;
    use pretty_assertions::assert_eq;

    fn snapshot(current: bool, upcoming: usize) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: GuildId::new(1),
            voice_channel: ChannelId::new(2),
            text_channel: ChannelId::new(3),
            current: current.then(|| track("current")),
            upcoming: (0..upcoming).map(|i| track(&format!("song{}", i))).collect(),
            volume: 80,
            paused: false,
        }
    }

    #[test]
    fn nothing_to_render_when_idle() {
        assert_eq!(render(&snapshot(false, 3)), None);
    }

    #[test]
    fn shows_first_five_upcoming() {
        let view = render(&snapshot(true, 7)).unwrap();

        assert_eq!(view.title, "current");
        assert_eq!(view.duration, "0:03:00");
        assert_eq!(view.source, "youtube");
        assert_eq!(view.queued, 7);
        assert_eq!(view.upcoming.len(), 5);
        assert_eq!(view.upcoming[0], "1. artist - song0");
        assert_eq!(view.upcoming[4], "5. artist - song4");
        assert_eq!(view.volume, 80);
    }

    #[test]
    fn adopt_keeps_existing_message() {
        let existing = LiveMessage {
            channel_id: ChannelId::new(3),
            message_id: MessageId::new(100),
        };
        let mut live = Some(existing);

        NowPlayingRegistry::adopt(&mut live, ChannelId::new(3), MessageId::new(200));
        assert_eq!(live, Some(existing));

        let mut empty = None;
        NowPlayingRegistry::adopt(&mut empty, ChannelId::new(3), MessageId::new(200));
        assert_eq!(empty.map(|m| m.message_id), Some(MessageId::new(200)));
    }

    #[tokio::test]
    async fn slots_are_shared_per_guild() {
        let registry = NowPlayingRegistry::new();
        let first = registry.slot(GuildId::new(1));
        let again = registry.slot(GuildId::new(1));
        let other = registry.slot(GuildId::new(2));

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn only_unknown_message_counts_as_gone() {
        assert!(is_missing_message(404, UNKNOWN_MESSAGE));
        assert!(is_missing_message(404, 10003));

        // rate limit, server error and an oversized embed keep the live message
        assert!(!is_missing_message(429, 0));
        assert!(!is_missing_message(502, 0));
        assert!(!is_missing_message(400, 50035));
    }
}
