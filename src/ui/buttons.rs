use serenity::{
    all::{ButtonStyle, ComponentInteraction, Context},
    builder::{CreateActionRow, CreateButton, CreateInteractionResponseFollowup},
};
use tracing::debug;

use crate::{
    audio::player::{Advance, SeekOutcome},
    bot::{
        preconditions::{Invocation, CONTROL_CHAIN},
        ShikiBot,
    },
    error::CommandError,
    ui::now_playing::NowPlayingRegistry,
};

/// Custom ids of every button the bot renders.
pub mod button_ids {
    pub const REWIND: &str = "player_rewind";
    pub const STOP: &str = "player_stop";
    pub const PLAY_PAUSE: &str = "player_play_pause";
    pub const FAST_FORWARD: &str = "player_fast_forward";
    pub const SKIP: &str = "player_skip";

    pub const PREVIOUS_PAGE: &str = "pager_previous";
    pub const NEXT_PAGE: &str = "pager_next";
}

/// A press on one of the now-playing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Rewind,
    Stop,
    PlayPause,
    FastForward,
    Skip,
}

impl ControlAction {
    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            button_ids::REWIND => Some(Self::Rewind),
            button_ids::STOP => Some(Self::Stop),
            button_ids::PLAY_PAUSE => Some(Self::PlayPause),
            button_ids::FAST_FORWARD => Some(Self::FastForward),
            button_ids::SKIP => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Rewind, stop, pause/play, fast-forward and skip in one row.
///
/// While paused the pause button is replaced by a play button.
pub fn player_controls(paused: bool) -> Vec<CreateActionRow> {
    let (toggle_emoji, toggle_style) = if paused {
        ('▶', ButtonStyle::Success)
    } else {
        ('⏸', ButtonStyle::Primary)
    };

    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::REWIND)
            .emoji('⏪')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::STOP)
            .emoji('⏹')
            .style(ButtonStyle::Danger),
        CreateButton::new(button_ids::PLAY_PAUSE)
            .emoji(toggle_emoji)
            .style(toggle_style),
        CreateButton::new(button_ids::FAST_FORWARD)
            .emoji('⏩')
            .style(ButtonStyle::Secondary),
        CreateButton::new(button_ids::SKIP)
            .emoji('⏭')
            .style(ButtonStyle::Secondary),
    ])]
}

/// Previous/next buttons; `page` is 0-based.
pub fn pager_controls(page: usize, total_pages: usize) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(button_ids::PREVIOUS_PAGE)
            .label("Previous page")
            .emoji('⏮')
            .style(ButtonStyle::Primary)
            .disabled(page == 0),
        CreateButton::new(button_ids::NEXT_PAGE)
            .label("Next page")
            .emoji('⏭')
            .style(ButtonStyle::Primary)
            .disabled(page + 1 >= total_pages),
    ])]
}

/// Handles a press on the now-playing controls.
///
/// The action runs while holding the guild's now-playing lock, so the message
/// is re-rendered from the state the action left behind.
pub async fn handle_player_component(
    ctx: &Context,
    interaction: &ComponentInteraction,
    bot: &ShikiBot,
) -> Result<(), CommandError> {
    let Some(action) = ControlAction::from_custom_id(&interaction.data.custom_id) else {
        debug!("Unhandled component: {}", interaction.data.custom_id);
        return Ok(());
    };

    let invocation = Invocation::from_component(ctx, interaction, &bot.player);
    let guild_id = invocation.check(CONTROL_CHAIN)?;

    interaction.defer(&ctx.http).await?;

    let slot = bot.now_playing.slot(guild_id);
    let mut live = slot.lock().await;
    NowPlayingRegistry::adopt(&mut live, interaction.channel_id, interaction.message.id);

    let step = bot.config.seek_step_ms;
    let result = match action {
        ControlAction::Rewind => bot.player.seek(guild_id, -step).await.map(seek_notice),
        ControlAction::FastForward => bot.player.seek(guild_id, step).await.map(seek_notice),
        ControlAction::PlayPause => bot
            .player
            .toggle_pause(guild_id)
            .await
            .map(|paused| Some(if paused { "⏸️ Paused" } else { "▶️ Resumed" })),
        ControlAction::Skip => bot.player.skip(guild_id).await.map(|advance| match advance {
            Advance::Started(_) => Some("⏭️ Skipped"),
            _ => Some("⏹️ The queue is empty, leaving the channel"),
        }),
        ControlAction::Stop => bot.player.stop(guild_id).await.map(|_| Some("⏹️ Stopped")),
    };

    match bot.player.snapshot(guild_id) {
        Some(snapshot) => NowPlayingRegistry::publish(&mut live, &ctx.http, &snapshot).await?,
        None => NowPlayingRegistry::retire(&mut live, &ctx.http).await,
    }
    drop(live);

    if let Some(notice) = result? {
        interaction
            .create_followup(
                &ctx.http,
                CreateInteractionResponseFollowup::new()
                    .content(notice)
                    .ephemeral(true),
            )
            .await?;
    }

    Ok(())
}

fn seek_notice(outcome: SeekOutcome) -> Option<&'static str> {
    match outcome {
        SeekOutcome::Seeked(_) | SeekOutcome::Superseded => None,
        SeekOutcome::Skipped(Advance::Started(_)) => {
            Some("⏭️ Reached the end, playing the next track")
        }
        SeekOutcome::Skipped(_) => Some("⏹️ Reached the end of the queue"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_custom_ids_to_actions() {
        assert_eq!(ControlAction::from_custom_id("player_rewind"), Some(ControlAction::Rewind));
        assert_eq!(ControlAction::from_custom_id("player_skip"), Some(ControlAction::Skip));
        assert_eq!(ControlAction::from_custom_id(button_ids::NEXT_PAGE), None);
    }

    #[test]
    fn seeking_within_the_track_is_silent() {
        assert_eq!(seek_notice(SeekOutcome::Superseded), None);
        assert_eq!(
            seek_notice(SeekOutcome::Skipped(Advance::TornDown)),
            Some("⏹️ Reached the end of the queue")
        );
    }

    /// `disabled` flag of each pager button, previous first.
    fn disabled_flags(page: usize, total_pages: usize) -> Vec<bool> {
        let rows = serde_json::to_value(pager_controls(page, total_pages)).unwrap();
        rows[0]["components"]
            .as_array()
            .unwrap()
            .iter()
            .map(|button| button["disabled"].as_bool().unwrap_or(false))
            .collect()
    }

    #[test]
    fn pager_disables_buttons_at_the_edges() {
        assert_eq!(disabled_flags(0, 3), vec![true, false]);
        assert_eq!(disabled_flags(1, 3), vec![false, false]);
        assert_eq!(disabled_flags(2, 3), vec![false, true]);
    }

    #[test]
    fn single_page_disables_both_buttons() {
        assert_eq!(disabled_flags(0, 1), vec![true, true]);
    }
}
