use std::{collections::VecDeque, time::Duration};
use tracing::{debug, info};

/// A resolved, immutable playable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub author: String,
    /// `None` for live streams.
    pub duration: Option<Duration>,
    /// Where the track was resolved from, e.g. `youtube`.
    pub source: String,
    pub url: String,
    pub artwork: Option<String>,
}

/// FIFO of upcoming tracks plus the one currently playing.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    items: VecDeque<Track>,
    current: Option<Track>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a track and returns its 1-based position among the upcoming items.
    pub fn push(&mut self, track: Track) -> usize {
        info!("➕ Queued: {}", track.title);
        self.items.push_back(track);
        self.items.len()
    }

    /// Pops the head and makes it the current track.
    ///
    /// The previous current track, if any, is dropped. Returns `None` and
    /// clears the current slot when the queue is empty.
    pub fn advance(&mut self) -> Option<Track> {
        self.current = self.items.pop_front();
        match &self.current {
            Some(track) => debug!("➡️ Next in queue: {}", track.title),
            None => debug!("📭 Queue is empty"),
        }
        self.current.clone()
    }

    /// Forgets the current track without touching the upcoming items.
    pub fn finish_current(&mut self) -> Option<Track> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn upcoming(&self) -> impl Iterator<Item = &Track> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn track(title: &str) -> Track {
    Track {
        title: title.to_string(),
        author: "artist".to_string(),
        duration: Some(Duration::from_secs(180)),
        source: "youtube".to_string(),
        url: format!("https://youtube.com/watch?v={}", title),
        artwork: None,
    }
}
