use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter},
};
use std::time::Duration;

use crate::{
    audio::session::SessionSnapshot,
    favorites::{FavoriteEntry, LeaderboardRow},
};

/// Embed colours
pub mod colors {
    use serenity::all::Colour;

    pub const MAIN_PURPLE: Colour = Colour::new(0x9966cc);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

const STANDARD_FOOTER: &str = "🌸 ShikiBot";

/// Rows listed by the `/queue` command.
const QUEUE_PREVIEW: usize = 15;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Formats a duration as `H:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn queue_embed(snapshot: &SessionSnapshot) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("📋 Queue")
        .color(colors::MAIN_PURPLE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    embed = match &snapshot.current {
        Some(track) => embed.field(
            "🎵 Now playing",
            format!(
                "[{}]({}) - `{}`",
                track.title,
                track.url,
                track.duration.map(format_duration).unwrap_or_else(|| "live".to_string())
            ),
            false,
        ),
        None => embed.field("🎵 Now playing", "Nothing", false),
    };

    if snapshot.upcoming.is_empty() {
        return embed.description("The queue is empty");
    }

    let mut lines: Vec<String> = snapshot
        .upcoming
        .iter()
        .take(QUEUE_PREVIEW)
        .enumerate()
        .map(|(i, track)| format!("`{}.` {} - {}", i + 1, track.author, track.title))
        .collect();
    if snapshot.upcoming.len() > QUEUE_PREVIEW {
        lines.push(format!("... and {} more", snapshot.upcoming.len() - QUEUE_PREVIEW));
    }

    embed.description(lines.join("\n"))
}

/// Lists the characters of `owner`, marking the favorite one.
pub fn favorites_embed(owner: &str, entries: &[FavoriteEntry]) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(format!("⭐ Favorites of {}", owner))
        .color(colors::MAIN_PURPLE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    if let Some(favorite) = entries.iter().find(|e| e.favorite) {
        embed = embed.thumbnail(&favorite.entry.image);
    }

    for item in entries {
        let marker = if item.favorite { "💖 " } else { "" };
        embed = embed.field(
            format!("{}{}", marker, item.entry.russian_name),
            format!("{}\n{}", item.entry.name, item.entry.url),
            false,
        );
    }

    embed
}

/// Leaderboard ranks shown per page.
pub const LEADERBOARD_PAGE_SIZE: usize = 10;

/// Renders page `page` (0-based) of the leaderboard.
///
/// The header always describes the overall leader, not the first row of the page.
pub fn leaderboard_page(rows: &[LeaderboardRow], page: usize, total_pages: usize) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .author(CreateEmbedAuthor::new("Most registered characters"))
        .color(colors::MAIN_PURPLE)
        .footer(CreateEmbedFooter::new(format!("Page {} of {}", page + 1, total_pages)));

    if let Some(leader) = rows.first() {
        let mut about = String::new();
        if let Some(alt) = &leader.entry.alt_name {
            about.push_str(&format!("Also known as: {}\n", alt));
        }
        if let Some(japanese) = &leader.entry.japanese_name {
            about.push_str(&format!("Japanese name: {}\n", japanese));
        }
        embed = embed
            .title(format!("Most popular character:\n{}", leader.entry.russian_name))
            .url(&leader.entry.url)
            .thumbnail(&leader.entry.image);
        if !about.is_empty() {
            embed = embed.description(about);
        }
    }

    let start = page * LEADERBOARD_PAGE_SIZE;
    for (rank, row) in rows.iter().enumerate().skip(start).take(LEADERBOARD_PAGE_SIZE) {
        let name = match MEDALS.get(rank) {
            Some(medal) => format!("{} {}", medal, row.entry.russian_name.to_uppercase()),
            None => row.entry.russian_name.to_uppercase(),
        };
        embed = embed.field(
            format!("**{}**\n{}", name, row.entry.url),
            format!(
                "```Total score | {}\n\nRegistered  | {}\nFavorite    | {}```",
                row.score(),
                row.links,
                row.favorites
            ),
            false,
        );
    }

    embed
}

pub fn leaderboard_closed() -> CreateEmbed {
    CreateEmbed::default()
        .title("⌛ Time is up, the leaderboard was closed")
        .description("Use /leaderboard to open it again")
        .color(colors::NEUTRAL_GRAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_duration(Duration::from_secs(180)), "0:03:00");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1:02:03");
        assert_eq!(format_duration(Duration::from_millis(59_999)), "0:00:59");
    }
}
