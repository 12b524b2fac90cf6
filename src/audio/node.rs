//! Seam between the queue manager and whatever actually produces sound.
//!
//! The queue manager never touches songbird directly: it issues requests
//! through [`AudioNode`] and learns about playback progress from
//! [`NodeEvent`]s delivered on a channel.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::time::Duration;

use crate::{audio::queue::Track, error::NodeError};

/// Identifies one playback started by the queue manager.
///
/// Events carry the id of the playback they belong to so that events of a
/// replaced track can be told apart from the current one.
pub type PlayId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    TrackStarted { guild_id: GuildId, play_id: PlayId },
    TrackEnded { guild_id: GuildId, play_id: PlayId },
    /// The session has been idle for longer than the grace period.
    Inactive { guild_id: GuildId },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioNode: Send + Sync {
    /// Resolves a query or URL to the first matching track.
    async fn search(&self, query: &str) -> Result<Option<Track>, NodeError>;

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), NodeError>;

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), NodeError>;

    /// Replaces whatever is playing in the guild with `track`.
    async fn play(
        &self,
        guild_id: GuildId,
        track: &Track,
        volume: u8,
        play_id: PlayId,
    ) -> Result<(), NodeError>;

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<(), NodeError>;

    async fn is_paused(&self, guild_id: GuildId) -> Result<bool, NodeError>;

    async fn position(&self, guild_id: GuildId) -> Result<Duration, NodeError>;

    async fn seek(&self, guild_id: GuildId, position: Duration) -> Result<(), NodeError>;

    async fn set_volume(&self, guild_id: GuildId, volume: u8) -> Result<(), NodeError>;

    async fn stop(&self, guild_id: GuildId) -> Result<(), NodeError>;
}
