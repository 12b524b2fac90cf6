use async_trait::async_trait;
use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{AuxMetadata, Input, YoutubeDl},
    tracks::{PlayMode, TrackHandle},
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        node::{AudioNode, NodeEvent, PlayId},
        queue::Track,
    },
    error::NodeError,
};

/// [`AudioNode`] backed by songbird and yt-dlp.
pub struct SongbirdNode {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    tracks: DashMap<GuildId, TrackHandle>,
    events: UnboundedSender<NodeEvent>,
}

impl SongbirdNode {
    pub fn new(manager: Arc<Songbird>, events: UnboundedSender<NodeEvent>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
            tracks: DashMap::new(),
            events,
        }
    }

    fn handle(&self, guild_id: GuildId) -> Result<TrackHandle, NodeError> {
        self.tracks
            .get(&guild_id)
            .map(|h| h.clone())
            .ok_or(NodeError::NoTrack(guild_id.get()))
    }

    fn notifier(&self, guild_id: GuildId, play_id: PlayId, started: bool) -> PlaybackNotifier {
        PlaybackNotifier {
            guild_id,
            play_id,
            started,
            events: self.events.clone(),
        }
    }
}

#[async_trait]
impl AudioNode for SongbirdNode {
    async fn search(&self, query: &str) -> Result<Option<Track>, NodeError> {
        let query = query.trim();
        let mut ytdl = if is_url(query) {
            YoutubeDl::new(self.http.clone(), query.to_string())
        } else {
            YoutubeDl::new_search(self.http.clone(), query.to_string())
        };

        let mut results = ytdl
            .search(Some(1))
            .await
            .map_err(|e| NodeError::Lookup(e.to_string()))?;

        Ok(results.next().and_then(track_from_metadata))
    }

    async fn connect(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), NodeError> {
        self.manager
            .join(guild_id, channel_id)
            .await
            .map_err(|e| NodeError::Join(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&self, guild_id: GuildId) -> Result<(), NodeError> {
        self.tracks.remove(&guild_id);
        self.manager
            .remove(guild_id)
            .await
            .map_err(|e| NodeError::Join(e.to_string()))
    }

    async fn play(
        &self,
        guild_id: GuildId,
        track: &Track,
        volume: u8,
        play_id: PlayId,
    ) -> Result<(), NodeError> {
        let call = self
            .manager
            .get(guild_id)
            .ok_or(NodeError::NotConnected(guild_id.get()))?;

        let input: Input = YoutubeDl::new(self.http.clone(), track.url.clone()).into();
        let handle = {
            let mut call = call.lock().await;
            call.stop();
            call.play_input(input)
        };

        handle
            .set_volume(volume_scale(volume))
            .map_err(|e| NodeError::Control(e.to_string()))?;
        for (event, started) in [
            (TrackEvent::Play, true),
            (TrackEvent::End, false),
            (TrackEvent::Error, false),
        ] {
            handle
                .add_event(Event::Track(event), self.notifier(guild_id, play_id, started))
                .map_err(|e| NodeError::Control(e.to_string()))?;
        }

        debug!("🎧 Handing {} to the driver in guild {}", track.title, guild_id);
        self.tracks.insert(guild_id, handle);
        Ok(())
    }

    async fn set_paused(&self, guild_id: GuildId, paused: bool) -> Result<(), NodeError> {
        let handle = self.handle(guild_id)?;
        let result = if paused { handle.pause() } else { handle.play() };
        result.map_err(|e| NodeError::Control(e.to_string()))
    }

    async fn is_paused(&self, guild_id: GuildId) -> Result<bool, NodeError> {
        let info = self
            .handle(guild_id)?
            .get_info()
            .await
            .map_err(|e| NodeError::Control(e.to_string()))?;
        Ok(info.playing == PlayMode::Pause)
    }

    async fn position(&self, guild_id: GuildId) -> Result<Duration, NodeError> {
        let info = self
            .handle(guild_id)?
            .get_info()
            .await
            .map_err(|e| NodeError::Control(e.to_string()))?;
        Ok(info.position)
    }

    async fn seek(&self, guild_id: GuildId, position: Duration) -> Result<(), NodeError> {
        self.handle(guild_id)?
            .seek_async(position)
            .await
            .map(|_| ())
            .map_err(|e| NodeError::Control(e.to_string()))
    }

    async fn set_volume(&self, guild_id: GuildId, volume: u8) -> Result<(), NodeError> {
        self.handle(guild_id)?
            .set_volume(volume_scale(volume))
            .map_err(|e| NodeError::Control(e.to_string()))
    }

    async fn stop(&self, guild_id: GuildId) -> Result<(), NodeError> {
        let (_, handle) = self
            .tracks
            .remove(&guild_id)
            .ok_or(NodeError::NoTrack(guild_id.get()))?;
        handle.stop().map_err(|e| NodeError::Control(e.to_string()))?;
        info!("⏹️ Driver stopped in guild {}", guild_id);
        Ok(())
    }
}

/// Forwards songbird track events into the player's event channel.
struct PlaybackNotifier {
    guild_id: GuildId,
    play_id: PlayId,
    started: bool,
    events: UnboundedSender<NodeEvent>,
}

#[async_trait]
impl VoiceEventHandler for PlaybackNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(states) = ctx {
            for (state, _) in states.iter() {
                if let PlayMode::Errored(e) = &state.playing {
                    error!("❌ Track error in guild {}: {:?}", self.guild_id, e);
                }
            }
        }

        let event = if self.started {
            NodeEvent::TrackStarted {
                guild_id: self.guild_id,
                play_id: self.play_id,
            }
        } else {
            NodeEvent::TrackEnded {
                guild_id: self.guild_id,
                play_id: self.play_id,
            }
        };

        if self.events.send(event).is_err() {
            warn!("Event channel closed, dropping {:?}", event);
        }

        None
    }
}

fn volume_scale(volume: u8) -> f32 {
    f32::from(volume.min(100)) / 100.0
}

fn is_url(query: &str) -> bool {
    url::Url::parse(query).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Provenance tag derived from the page url host.
fn source_of(page_url: &str) -> String {
    let host = url::Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();

    if host.contains("youtu") {
        "youtube".to_string()
    } else if host.contains("soundcloud") {
        "soundcloud".to_string()
    } else if host.is_empty() {
        "unknown".to_string()
    } else {
        host.trim_start_matches("www.").to_string()
    }
}

fn track_from_metadata(meta: AuxMetadata) -> Option<Track> {
    let url = meta.source_url?;
    Some(Track {
        title: meta
            .track
            .or(meta.title)
            .unwrap_or_else(|| "Unknown title".to_string()),
        author: meta
            .artist
            .or(meta.channel)
            .unwrap_or_else(|| "Unknown artist".to_string()),
        duration: meta.duration,
        source: source_of(&url),
        url,
        artwork: meta.thumbnail,
    })
}
