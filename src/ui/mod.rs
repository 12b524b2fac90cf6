//! Discord-facing presentation: embeds, button rows, the per-guild
//! now-playing message and the leaderboard pager.

pub mod buttons;
pub mod embeds;
pub mod now_playing;
pub mod pager;
