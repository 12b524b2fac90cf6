use dashmap::DashMap;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    audio::{
        node::{AudioNode, NodeEvent, PlayId},
        queue::Track,
        session::{SessionSnapshot, VoiceSession},
    },
    config::Config,
    error::PlayerError,
};

/// Result of adding a track to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Nothing was playing, the queue head started immediately.
    Started(Track),
    /// Appended behind the current track; `position` is 1-based.
    Queued { track: Track, position: usize },
}

/// What happened when the session moved past its current track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Started(Track),
    /// Autoplay is off, the session waits for the idle timeout.
    Idle,
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekOutcome {
    Seeked(Duration),
    /// The target was past the end of the track.
    Skipped(Advance),
    /// The track changed while the position was being read.
    Superseded,
}

/// Per-guild playback queue manager.
///
/// Sessions sit behind `parking_lot` mutexes that are never held across an
/// await. Every operation that talks to the node re-reads the session after
/// the call returns, since a concurrent stop may have removed it.
pub struct AudioPlayer {
    node: Arc<dyn AudioNode>,
    sessions: DashMap<GuildId, Arc<Mutex<VoiceSession>>>,
    default_volume: u8,
    autoplay: bool,
    idle_timeout: Duration,
}

impl AudioPlayer {
    pub fn new(
        node: Arc<dyn AudioNode>,
        default_volume: u8,
        autoplay: bool,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            node,
            sessions: DashMap::new(),
            default_volume: default_volume.min(100),
            autoplay,
            idle_timeout,
        }
    }

    pub fn from_config(node: Arc<dyn AudioNode>, config: &Config) -> Self {
        Self::new(
            node,
            config.default_volume,
            config.enable_autoplay,
            Duration::from_secs(config.inactivity_timeout),
        )
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    pub fn voice_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.sessions.get(&guild_id).map(|s| s.lock().voice_channel)
    }

    pub fn snapshot(&self, guild_id: GuildId) -> Option<SessionSnapshot> {
        self.sessions.get(&guild_id).map(|s| s.lock().snapshot())
    }

    /// Resolves a query to a track. Engine failures are reported as not found.
    pub async fn search(&self, query: &str) -> Result<Track, PlayerError> {
        match self.node.search(query).await {
            Ok(Some(track)) => Ok(track),
            Ok(None) => {
                debug!("🔍 No results for {:?}", query);
                Err(PlayerError::NotFound)
            }
            Err(e) => {
                warn!("🔍 Search for {:?} failed: {}", query, e);
                Err(PlayerError::NotFound)
            }
        }
    }

    /// Joins `voice_channel` unless the guild already has a session.
    ///
    /// When a concurrent call created the session while this one was joining,
    /// the bot is moved back to that session's channel.
    pub async fn connect(
        &self,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
    ) -> Result<(), PlayerError> {
        if self.has_session(guild_id) {
            return Ok(());
        }

        self.node.connect(guild_id, voice_channel).await?;

        let mut session = VoiceSession::new(
            guild_id,
            voice_channel,
            text_channel,
            self.default_volume,
            self.autoplay,
        );
        session.idle_deadline = Some(Instant::now() + self.idle_timeout);

        let mut created = false;
        let stored = self
            .sessions
            .entry(guild_id)
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(session))
            })
            .clone();

        if !created {
            let channel = stored.lock().voice_channel;
            if channel != voice_channel {
                debug!("🔀 Guild {} already joined {}, moving back", guild_id, channel);
                self.node.connect(guild_id, channel).await?;
            }
            return Ok(());
        }

        info!("🔊 Connected to voice channel {} in guild {}", voice_channel, guild_id);
        Ok(())
    }

    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        track: Track,
    ) -> Result<EnqueueOutcome, PlayerError> {
        let session = self.session(guild_id)?;

        let next = {
            let mut s = session.lock();
            let position = s.queue.push(track.clone());
            if s.play_id.is_some() {
                return Ok(EnqueueOutcome::Queued { track, position });
            }
            s.begin_next()
        };

        let Some((next, play_id)) = next else {
            return Ok(EnqueueOutcome::Queued { track, position: 1 });
        };

        self.start(guild_id, &session, &next, play_id).await?;
        Ok(EnqueueOutcome::Started(next))
    }

    /// Starts the next queued track, or tears the session down when the queue is empty.
    pub async fn skip(&self, guild_id: GuildId) -> Result<Advance, PlayerError> {
        let session = self.session(guild_id)?;
        let next = session.lock().begin_next();
        self.advance_to(guild_id, &session, next).await
    }

    /// Stores the volume and forwards it to the node when something is playing.
    pub async fn set_volume(&self, guild_id: GuildId, volume: i64) -> Result<u8, PlayerError> {
        let volume = u8::try_from(volume)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(PlayerError::VolumeOutOfRange(volume))?;
        let session = self.session(guild_id)?;

        let playing = {
            let mut s = session.lock();
            s.volume = volume;
            s.play_id.is_some()
        };

        if playing {
            self.node.set_volume(guild_id, volume).await?;
        }

        info!("🔊 Volume set to {}% in guild {}", volume, guild_id);
        Ok(volume)
    }

    /// Flips the engine's pause state and returns the new one.
    pub async fn toggle_pause(&self, guild_id: GuildId) -> Result<bool, PlayerError> {
        let session = self.session(guild_id)?;
        if session.lock().play_id.is_none() {
            return Err(PlayerError::NothingPlaying);
        }

        let paused = !self.node.is_paused(guild_id).await?;
        self.node.set_paused(guild_id, paused).await?;

        if let Some(session) = self.sessions.get(&guild_id) {
            session.lock().paused = paused;
        }

        let verb = if paused { "⏸️ Paused" } else { "▶️ Resumed" };
        info!("{} playback in guild {}", verb, guild_id);
        Ok(paused)
    }

    /// Moves the playhead by `delta_ms`, clamped at zero.
    ///
    /// Seeking at or beyond the end of the track skips to the next one. If the
    /// track changed while the position was read, nothing happens.
    pub async fn seek(
        &self,
        guild_id: GuildId,
        delta_ms: i64,
    ) -> Result<SeekOutcome, PlayerError> {
        let session = self.session(guild_id)?;
        let (duration, play_id) = {
            let s = session.lock();
            let current = s.queue.current().ok_or(PlayerError::NothingPlaying)?;
            (current.duration, s.play_id)
        };

        let position = self.node.position(guild_id).await?;
        let position_ms = i64::try_from(position.as_millis()).unwrap_or(i64::MAX);
        let target = Duration::from_millis(position_ms.saturating_add(delta_ms).max(0) as u64);
        let past_end = duration.is_some_and(|length| target >= length);

        let next = {
            let mut s = session.lock();
            if s.play_id != play_id {
                return Ok(SeekOutcome::Superseded);
            }
            past_end.then(|| s.begin_next())
        };

        if let Some(next) = next {
            debug!("⏩ Seek past the end in guild {}, skipping", guild_id);
            let advance = self.advance_to(guild_id, &session, next).await?;
            return Ok(SeekOutcome::Skipped(advance));
        }

        self.node.seek(guild_id, target).await?;
        Ok(SeekOutcome::Seeked(target))
    }

    pub async fn stop(&self, guild_id: GuildId) -> Result<(), PlayerError> {
        if !self.teardown(guild_id).await {
            return Err(PlayerError::NoSession(guild_id.get()));
        }
        Ok(())
    }

    /// Handles a start notification. Returns the snapshot to render, or `None`
    /// when the event belongs to a replaced playback.
    pub fn track_started(&self, guild_id: GuildId, play_id: PlayId) -> Option<SessionSnapshot> {
        let session = self.sessions.get(&guild_id)?;
        let mut s = session.lock();
        if !s.is_current(play_id) {
            debug!("Ignoring stale start {} in guild {}", play_id, guild_id);
            return None;
        }
        s.idle_deadline = None;
        Some(s.snapshot())
    }

    /// Handles an end notification; stale playback ids are ignored.
    pub async fn track_ended(&self, guild_id: GuildId, play_id: PlayId) -> Option<Advance> {
        let session = self.sessions.get(&guild_id)?.clone();

        let next = {
            let mut s = session.lock();
            if !s.is_current(play_id) {
                debug!("Ignoring stale end {} in guild {}", play_id, guild_id);
                return None;
            }
            if !s.autoplay {
                s.go_idle(Instant::now() + self.idle_timeout);
                return Some(Advance::Idle);
            }
            s.begin_next()
        };

        match next {
            Some((track, play_id)) => match self.start(guild_id, &session, &track, play_id).await {
                Ok(()) => Some(Advance::Started(track)),
                Err(_) => {
                    self.teardown(guild_id).await;
                    Some(Advance::TornDown)
                }
            },
            None => {
                self.teardown(guild_id).await;
                Some(Advance::TornDown)
            }
        }
    }

    /// Idle timeout fired: disconnect unconditionally.
    pub async fn inactive(&self, guild_id: GuildId) -> bool {
        info!("💤 Inactivity timeout in guild {}", guild_id);
        self.teardown(guild_id).await
    }

    /// The bot left voice without going through `stop`.
    pub async fn forget(&self, guild_id: GuildId) -> bool {
        self.teardown(guild_id).await
    }

    /// Returns sessions whose idle deadline passed, disarming their deadline.
    pub fn take_expired(&self, now: Instant) -> Vec<GuildId> {
        self.sessions
            .iter()
            .filter_map(|entry| {
                let mut s = entry.value().lock();
                match s.idle_deadline {
                    Some(deadline) if deadline <= now => {
                        s.idle_deadline = None;
                        Some(*entry.key())
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Periodically reports idle sessions as [`NodeEvent::Inactive`].
    pub fn spawn_idle_watchdog(
        self: &Arc<Self>,
        events: UnboundedSender<NodeEvent>,
    ) -> JoinHandle<()> {
        let player = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                for guild_id in player.take_expired(Instant::now()) {
                    if events.send(NodeEvent::Inactive { guild_id }).is_err() {
                        return;
                    }
                }
            }
        })
    }

    fn session(&self, guild_id: GuildId) -> Result<Arc<Mutex<VoiceSession>>, PlayerError> {
        self.sessions
            .get(&guild_id)
            .map(|s| Arc::clone(s.value()))
            .ok_or(PlayerError::NoSession(guild_id.get()))
    }

    /// Starts `next`, or tears the session down when there is nothing to start.
    async fn advance_to(
        &self,
        guild_id: GuildId,
        session: &Arc<Mutex<VoiceSession>>,
        next: Option<(Track, PlayId)>,
    ) -> Result<Advance, PlayerError> {
        let Some((track, play_id)) = next else {
            self.teardown(guild_id).await;
            return Ok(Advance::TornDown);
        };

        match self.start(guild_id, session, &track, play_id).await {
            Ok(()) => Ok(Advance::Started(track)),
            Err(e) => {
                self.teardown(guild_id).await;
                Err(e)
            }
        }
    }

    async fn start(
        &self,
        guild_id: GuildId,
        session: &Arc<Mutex<VoiceSession>>,
        track: &Track,
        play_id: PlayId,
    ) -> Result<(), PlayerError> {
        let volume = session.lock().volume;

        if let Err(e) = self.node.play(guild_id, track, volume, play_id).await {
            warn!("❌ Could not play {} in guild {}: {}", track.title, guild_id, e);
            let mut s = session.lock();
            if s.is_current(play_id) {
                s.go_idle(Instant::now() + self.idle_timeout);
            }
            return Err(e.into());
        }

        info!("🎵 Playing {} in guild {}", track.title, guild_id);
        Ok(())
    }

    async fn teardown(&self, guild_id: GuildId) -> bool {
        let Some((_, session)) = self.sessions.remove(&guild_id) else {
            return false;
        };
        {
            let mut s = session.lock();
            s.queue.clear();
            s.play_id = None;
        }

        if let Err(e) = self.node.stop(guild_id).await {
            debug!("Stop during teardown of guild {}: {}", guild_id, e);
        }
        if let Err(e) = self.node.disconnect(guild_id).await {
            warn!("Disconnect during teardown of guild {}: {}", guild_id, e);
        }

        info!("👋 Voice session closed in guild {}", guild_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::{node::MockAudioNode, queue::track},
        error::NodeError,
    };
    use pretty_assertions::assert_eq;

    const GUILD: GuildId = GuildId::new(10);
    const VOICE: ChannelId = ChannelId::new(20);
    const TEXT: ChannelId = ChannelId::new(30);

    fn expect_session(node: &mut MockAudioNode) {
        node.expect_connect().returning(|_, _| Ok(()));
        node.expect_play().returning(|_, _, _, _| Ok(()));
    }

    fn expect_teardown(node: &mut MockAudioNode) {
        node.expect_stop().times(1).returning(|_| Ok(()));
        node.expect_disconnect().times(1).returning(|_| Ok(()));
    }

    async fn connected(node: MockAudioNode, autoplay: bool) -> AudioPlayer {
        let player = AudioPlayer::new(Arc::new(node), 100, autoplay, Duration::from_secs(60));
        player.connect(GUILD, VOICE, TEXT).await.unwrap();
        player
    }

    #[tokio::test]
    async fn first_track_starts_and_second_is_queued() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        let player = connected(node, true).await;

        let first = player.enqueue(GUILD, track("song A")).await.unwrap();
        let second = player.enqueue(GUILD, track("song B")).await.unwrap();

        assert_eq!(first, EnqueueOutcome::Started(track("song A")));
        assert_eq!(
            second,
            EnqueueOutcome::Queued {
                track: track("song B"),
                position: 1
            }
        );
    }

    #[tokio::test]
    async fn skip_follows_fifo_and_tears_down_on_empty_queue() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        expect_teardown(&mut node);
        let player = connected(node, true).await;

        for title in ["a", "b", "c"] {
            player.enqueue(GUILD, track(title)).await.unwrap();
        }

        assert_eq!(player.skip(GUILD).await.unwrap(), Advance::Started(track("b")));
        assert_eq!(player.skip(GUILD).await.unwrap(), Advance::Started(track("c")));
        assert_eq!(player.skip(GUILD).await.unwrap(), Advance::TornDown);
        assert!(!player.has_session(GUILD));
    }

    #[tokio::test]
    async fn out_of_range_volume_leaves_session_unchanged() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_set_volume().never();
        let player = connected(node, true).await;

        for volume in [101, 150, -1] {
            assert!(matches!(
                player.set_volume(GUILD, volume).await,
                Err(PlayerError::VolumeOutOfRange(v)) if v == volume
            ));
        }
        assert_eq!(player.snapshot(GUILD).unwrap().volume, 100);
    }

    #[tokio::test]
    async fn volume_bounds_are_inclusive() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_set_volume().never();
        let player = connected(node, true).await;

        assert_eq!(player.set_volume(GUILD, 0).await.unwrap(), 0);
        assert_eq!(player.snapshot(GUILD).unwrap().volume, 0);
        assert_eq!(player.set_volume(GUILD, 100).await.unwrap(), 100);
        assert_eq!(player.snapshot(GUILD).unwrap().volume, 100);
    }

    #[tokio::test]
    async fn volume_reaches_the_node_while_playing() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_set_volume()
            .withf(|_, volume| *volume == 40)
            .times(1)
            .returning(|_, _| Ok(()));
        let player = connected(node, true).await;
        player.enqueue(GUILD, track("a")).await.unwrap();

        assert_eq!(player.set_volume(GUILD, 40).await.unwrap(), 40);
        assert_eq!(player.snapshot(GUILD).unwrap().volume, 40);
    }

    #[tokio::test]
    async fn stale_track_end_does_not_advance() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        let player = connected(node, true).await;

        player.enqueue(GUILD, track("a")).await.unwrap();
        player.enqueue(GUILD, track("b")).await.unwrap();
        player.enqueue(GUILD, track("c")).await.unwrap();
        player.skip(GUILD).await.unwrap();

        // play id 1 belonged to "a", which was replaced by the skip
        assert_eq!(player.track_ended(GUILD, 1).await, None);
        assert_eq!(player.snapshot(GUILD).unwrap().current, Some(track("b")));
        assert_eq!(player.track_started(GUILD, 1), None);
    }

    #[tokio::test]
    async fn track_end_advances_then_tears_down() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        expect_teardown(&mut node);
        let player = connected(node, true).await;

        player.enqueue(GUILD, track("a")).await.unwrap();
        player.enqueue(GUILD, track("b")).await.unwrap();

        assert_eq!(player.track_ended(GUILD, 1).await, Some(Advance::Started(track("b"))));
        assert_eq!(player.track_ended(GUILD, 2).await, Some(Advance::TornDown));
        assert!(!player.has_session(GUILD));
    }

    #[tokio::test]
    async fn track_end_without_autoplay_goes_idle() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        let player = connected(node, false).await;

        player.enqueue(GUILD, track("a")).await.unwrap();
        player.enqueue(GUILD, track("b")).await.unwrap();

        assert_eq!(player.track_ended(GUILD, 1).await, Some(Advance::Idle));
        let snapshot = player.snapshot(GUILD).unwrap();
        assert_eq!(snapshot.current, None);
        assert_eq!(snapshot.upcoming, vec![track("b")]);
    }

    #[tokio::test]
    async fn rewind_clamps_at_zero() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_position().returning(|_| Ok(Duration::from_secs(5)));
        node.expect_seek()
            .withf(|_, position| *position == Duration::ZERO)
            .times(1)
            .returning(|_, _| Ok(()));
        let player = connected(node, true).await;
        player.enqueue(GUILD, track("a")).await.unwrap();

        assert_eq!(
            player.seek(GUILD, -10_000).await.unwrap(),
            SeekOutcome::Seeked(Duration::ZERO)
        );
    }

    #[tokio::test]
    async fn fast_forward_past_the_end_skips() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        expect_teardown(&mut node);
        node.expect_position().returning(|_| Ok(Duration::from_secs(175)));
        node.expect_seek().never();
        let player = connected(node, true).await;
        player.enqueue(GUILD, track("a")).await.unwrap();

        assert_eq!(
            player.seek(GUILD, 10_000).await.unwrap(),
            SeekOutcome::Skipped(Advance::TornDown)
        );
    }

    #[tokio::test]
    async fn pause_toggle_reads_engine_state() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_is_paused().returning(|_| Ok(true));
        node.expect_set_paused()
            .withf(|_, paused| !*paused)
            .times(1)
            .returning(|_, _| Ok(()));
        let player = connected(node, true).await;
        player.enqueue(GUILD, track("a")).await.unwrap();

        assert!(!player.toggle_pause(GUILD).await.unwrap());
        assert!(!player.snapshot(GUILD).unwrap().paused);
    }

    #[tokio::test]
    async fn pause_without_track_fails() {
        let mut node = MockAudioNode::new();
        expect_session(&mut node);
        node.expect_is_paused().never();
        let player = connected(node, true).await;

        assert!(matches!(
            player.toggle_pause(GUILD).await,
            Err(PlayerError::NothingPlaying)
        ));
    }

    #[tokio::test]
    async fn search_failures_surface_as_not_found() {
        let mut node = MockAudioNode::new();
        node.expect_search()
            .withf(|query| query.starts_with("missing"))
            .returning(|_| Ok(None));
        node.expect_search()
            .withf(|query| query.starts_with("broken"))
            .returning(|_| Err(NodeError::Lookup("yt-dlp exited".into())));
        let player = AudioPlayer::new(Arc::new(node), 100, true, Duration::from_secs(60));

        assert!(matches!(player.search("missing").await, Err(PlayerError::NotFound)));
        assert!(matches!(player.search("broken").await, Err(PlayerError::NotFound)));
    }

    #[tokio::test]
    async fn enqueue_without_session_fails() {
        let node = MockAudioNode::new();
        let player = AudioPlayer::new(Arc::new(node), 100, true, Duration::from_secs(60));

        assert!(matches!(
            player.enqueue(GUILD, track("a")).await,
            Err(PlayerError::NoSession(10))
        ));
    }

    #[tokio::test]
    async fn idle_sessions_are_reported_once_and_torn_down() {
        let mut node = MockAudioNode::new();
        node.expect_connect().returning(|_, _| Ok(()));
        expect_teardown(&mut node);
        let player = AudioPlayer::new(Arc::new(node), 100, true, Duration::ZERO);
        player.connect(GUILD, VOICE, TEXT).await.unwrap();

        let now = Instant::now();
        assert_eq!(player.take_expired(now), vec![GUILD]);
        assert_eq!(player.take_expired(now), Vec::<GuildId>::new());

        assert!(player.inactive(GUILD).await);
        assert!(!player.inactive(GUILD).await);
    }

    /// Node that records joins, yields while joining and, when wired to a
    /// player, ends the first playback while a position read is in flight.
    #[derive(Default)]
    struct RacingNode {
        joins: Mutex<Vec<ChannelId>>,
        player: std::sync::OnceLock<std::sync::Weak<AudioPlayer>>,
    }

    #[async_trait::async_trait]
    impl AudioNode for RacingNode {
        async fn search(&self, _: &str) -> Result<Option<Track>, NodeError> {
            Ok(None)
        }

        async fn connect(&self, _: GuildId, channel_id: ChannelId) -> Result<(), NodeError> {
            tokio::task::yield_now().await;
            self.joins.lock().push(channel_id);
            Ok(())
        }

        async fn disconnect(&self, _: GuildId) -> Result<(), NodeError> {
            Ok(())
        }

        async fn play(&self, _: GuildId, _: &Track, _: u8, _: PlayId) -> Result<(), NodeError> {
            Ok(())
        }

        async fn set_paused(&self, _: GuildId, _: bool) -> Result<(), NodeError> {
            Ok(())
        }

        async fn is_paused(&self, _: GuildId) -> Result<bool, NodeError> {
            Ok(false)
        }

        async fn position(&self, guild_id: GuildId) -> Result<Duration, NodeError> {
            if let Some(player) = self.player.get().and_then(std::sync::Weak::upgrade) {
                player.track_ended(guild_id, 1).await;
            }
            // the old handle still reports a position near its end
            Ok(Duration::from_secs(175))
        }

        async fn seek(&self, _: GuildId, _: Duration) -> Result<(), NodeError> {
            Ok(())
        }

        async fn set_volume(&self, _: GuildId, _: u8) -> Result<(), NodeError> {
            Ok(())
        }

        async fn stop(&self, _: GuildId) -> Result<(), NodeError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn seek_of_a_replaced_track_does_not_skip_its_successor() {
        let node = Arc::new(RacingNode::default());
        let player = Arc::new(AudioPlayer::new(node.clone(), 100, true, Duration::from_secs(60)));
        node.player.set(Arc::downgrade(&player)).unwrap();
        player.connect(GUILD, VOICE, TEXT).await.unwrap();

        for title in ["a", "b", "c"] {
            player.enqueue(GUILD, track(title)).await.unwrap();
        }

        assert_eq!(player.seek(GUILD, 10_000).await.unwrap(), SeekOutcome::Superseded);
        let snapshot = player.snapshot(GUILD).unwrap();
        assert_eq!(snapshot.current, Some(track("b")));
        assert_eq!(snapshot.upcoming, vec![track("c")]);
    }

    #[tokio::test]
    async fn concurrent_connects_settle_on_the_session_channel() {
        let node = Arc::new(RacingNode::default());
        let player = AudioPlayer::new(node.clone(), 100, true, Duration::from_secs(60));
        let other = ChannelId::new(21);

        let (first, second) = tokio::join!(
            player.connect(GUILD, VOICE, TEXT),
            player.connect(GUILD, other, TEXT)
        );
        first.unwrap();
        second.unwrap();

        let joins = node.joins.lock().clone();
        assert_eq!(joins.len(), 3);
        assert_eq!(joins.last().copied(), player.voice_channel(GUILD));
    }
}
