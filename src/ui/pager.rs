use serenity::{
    all::{CommandInteraction, Context},
    builder::{
        CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
    },
    collector::ComponentInteractionCollector,
};
use std::time::Duration;
use tracing::debug;

use crate::{
    favorites::LeaderboardRow,
    ui::{
        buttons::{button_ids, pager_controls},
        embeds::{leaderboard_closed, leaderboard_page, LEADERBOARD_PAGE_SIZE},
    },
};

/// Number of pages needed for `len` rows; at least one.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(LEADERBOARD_PAGE_SIZE).max(1)
}

/// Page reached by pressing `custom_id` on `page`, clamped to the valid range.
pub fn turn(page: usize, total_pages: usize, custom_id: &str) -> usize {
    match custom_id {
        button_ids::PREVIOUS_PAGE => page.saturating_sub(1),
        button_ids::NEXT_PAGE => (page + 1).min(total_pages.saturating_sub(1)),
        _ => page,
    }
}

/// Answers `interaction` with a paged leaderboard.
///
/// Each press restarts the `idle` timer. Once it runs out the message is
/// replaced with a closed notice and the buttons are removed.
pub async fn run_leaderboard(
    ctx: &Context,
    interaction: &CommandInteraction,
    rows: Vec<LeaderboardRow>,
    idle: Duration,
) -> Result<(), serenity::Error> {
    let total = page_count(rows.len());
    let mut page = 0;

    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(leaderboard_page(&rows, page, total))
                    .components(pager_controls(page, total)),
            ),
        )
        .await?;
    let message = interaction.get_response(&ctx.http).await?;

    while let Some(press) = ComponentInteractionCollector::new(ctx)
        .message_id(message.id)
        .timeout(idle)
        .await
    {
        page = turn(page, total, &press.data.custom_id);
        debug!("📄 Leaderboard page {} of {}", page + 1, total);

        press
            .create_response(
                &ctx.http,
                CreateInteractionResponse::UpdateMessage(
                    CreateInteractionResponseMessage::new()
                        .embed(leaderboard_page(&rows, page, total))
                        .components(pager_controls(page, total)),
                ),
            )
            .await?;
    }

    interaction
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new()
                .embed(leaderboard_closed())
                .components(Vec::new()),
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
        assert_eq!(page_count(25), 3);
    }

    #[test]
    fn turning_is_clamped() {
        assert_eq!(turn(0, 3, button_ids::PREVIOUS_PAGE), 0);
        assert_eq!(turn(0, 3, button_ids::NEXT_PAGE), 1);
        assert_eq!(turn(2, 3, button_ids::NEXT_PAGE), 2);
        assert_eq!(turn(2, 3, button_ids::PREVIOUS_PAGE), 1);
        assert_eq!(turn(1, 3, "unknown"), 1);
    }
}
