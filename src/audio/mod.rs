//! # Audio Module
//!
//! Playback queue management for the music commands.
//!
//! ## Architecture
//!
//! ### [`player`] - Queue Manager
//! - One [`session::VoiceSession`] per guild connected to voice
//! - Starts, skips, seeks and tears down playback
//! - Reacts to [`node::NodeEvent`]s; events of replaced playbacks are ignored
//!
//! ### [`node`] - Engine Seam
//! - [`node::AudioNode`] trait issued commands go through
//! - [`songbird_node::SongbirdNode`] is the production implementation
//!
//! ### [`queue`] - Queue
//! - Strict FIFO, no shuffle or repeat

pub mod node;
pub mod player;
pub mod queue;
pub mod session;
pub mod songbird_node;
