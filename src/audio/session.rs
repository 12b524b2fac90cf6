use serenity::model::id::{ChannelId, GuildId};
use std::time::Instant;

use crate::audio::{
    node::PlayId,
    queue::{PlaybackQueue, Track},
};

/// Per-guild voice state owned by the queue manager.
#[derive(Debug)]
pub struct VoiceSession {
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
    /// Channel where the now-playing message is posted.
    pub text_channel: ChannelId,
    /// Always within 0..=100.
    pub volume: u8,
    pub autoplay: bool,
    pub paused: bool,
    pub queue: PlaybackQueue,
    /// Playback id of the current track, if one is playing.
    pub play_id: Option<PlayId>,
    next_play_id: PlayId,
    /// Set while the session has nothing to play.
    pub idle_deadline: Option<Instant>,
}

impl VoiceSession {
    pub fn new(
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
        volume: u8,
        autoplay: bool,
    ) -> Self {
        Self {
            guild_id,
            voice_channel,
            text_channel,
            volume: volume.min(100),
            autoplay,
            paused: false,
            queue: PlaybackQueue::new(),
            play_id: None,
            next_play_id: 1,
            idle_deadline: None,
        }
    }

    /// Moves the queue head into the current slot and tags it with a fresh id.
    pub fn begin_next(&mut self) -> Option<(Track, PlayId)> {
        if self.queue.is_empty() {
            return None;
        }
        let track = self.queue.advance()?;
        let id = self.next_play_id;
        self.next_play_id += 1;
        self.play_id = Some(id);
        self.paused = false;
        self.idle_deadline = None;
        Some((track, id))
    }

    /// Clears the current slot and arms the idle deadline.
    pub fn go_idle(&mut self, deadline: Instant) {
        self.queue.finish_current();
        self.play_id = None;
        self.paused = false;
        self.idle_deadline = Some(deadline);
    }

    pub fn is_current(&self, play_id: PlayId) -> bool {
        self.play_id == Some(play_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            guild_id: self.guild_id,
            voice_channel: self.voice_channel,
            text_channel: self.text_channel,
            current: self.queue.current().cloned(),
            upcoming: self.queue.upcoming().cloned().collect(),
            volume: self.volume,
            paused: self.paused,
        }
    }
}

/// Read-only copy of a session, safe to hold across awaits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub guild_id: GuildId,
    pub voice_channel: ChannelId,
    pub text_channel: ChannelId,
    pub current: Option<Track>,
    pub upcoming: Vec<Track>,
    pub volume: u8,
    pub paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::queue::track;
    use pretty_assertions::assert_eq;

    fn session() -> VoiceSession {
        VoiceSession::new(GuildId::new(1), ChannelId::new(2), ChannelId::new(3), 100, true)
    }

    #[test]
    fn play_ids_are_unique_per_playback() {
        let mut session = session();
        session.queue.push(track("a"));
        session.queue.push(track("b"));

        let (_, first) = session.begin_next().unwrap();
        let (_, second) = session.begin_next().unwrap();

        assert_ne!(first, second);
        assert!(session.is_current(second));
        assert!(!session.is_current(first));
    }

    #[test]
    fn begin_next_on_empty_queue_keeps_state() {
        let mut session = session();
        assert!(session.begin_next().is_none());
        assert_eq!(session.play_id, None);
    }

    #[test]
    fn going_idle_clears_current_and_arms_deadline() {
        let mut session = session();
        session.queue.push(track("a"));
        session.begin_next();
        session.paused = true;

        let deadline = Instant::now();
        session.go_idle(deadline);

        assert_eq!(session.snapshot().current, None);
        assert_eq!(session.idle_deadline, Some(deadline));
        assert!(!session.paused);
    }

    #[test]
    fn volume_is_capped() {
        let session =
            VoiceSession::new(GuildId::new(1), ChannelId::new(2), ChannelId::new(3), 250, true);
        assert_eq!(session.volume, 100);
    }
}
