//! # Favorites
//!
//! Users register five favorite characters from the Shikimori catalog. The
//! registration is all-or-nothing: every reference is validated and looked
//! up before anything is written, and the writes share one transaction.
//!
//! - [`reference`] - parsing of character links
//! - [`catalog`] - the Shikimori API client behind [`catalog::CatalogApi`]
//! - [`leaderboard`] - popularity ranking of stored characters
//! - [`service`] - the operations used by the command handlers

pub mod catalog;
pub mod leaderboard;
pub mod reference;
pub mod service;

pub use catalog::{CatalogApi, Character, ShikimoriClient};
pub use leaderboard::LeaderboardRow;
pub use reference::CharacterRef;
pub use service::{FavoriteEntry, FavoritesService};

/// Number of characters a registration must contain.
pub const REQUIRED_REFERENCES: usize = 5;
