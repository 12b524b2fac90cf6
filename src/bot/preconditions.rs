//! Explicit precondition chains checked before a command runs.
//!
//! Gathering the facts ([`Invocation`]) is separated from judging them, so
//! the rules are plain functions over plain data.

use serenity::{
    all::{CommandInteraction, ComponentInteraction, Context},
    model::{
        guild::Member,
        id::{ChannelId, GuildId, UserId},
    },
};

use crate::{audio::player::AudioPlayer, error::PreconditionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    GuildOnly,
    UserInVoice,
    BotInVoice,
    /// Passes when the bot is not connected anywhere yet.
    SameVoiceChannel,
    Administrator,
}

use Precondition::*;

/// `/play`: the bot follows the user when it is not connected yet.
pub const PLAY_CHAIN: &[Precondition] = &[GuildOnly, UserInVoice, SameVoiceChannel];
/// Playback controls, both commands and buttons.
pub const CONTROL_CHAIN: &[Precondition] = &[GuildOnly, BotInVoice, UserInVoice, SameVoiceChannel];
/// Read-only playback views.
pub const STATUS_CHAIN: &[Precondition] = &[GuildOnly, BotInVoice];
pub const ADMIN_CHAIN: &[Precondition] = &[GuildOnly, Administrator];
pub const GUILD_CHAIN: &[Precondition] = &[GuildOnly];

/// Facts about who invoked a command and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invocation {
    pub guild_id: Option<GuildId>,
    pub user_channel: Option<ChannelId>,
    pub bot_channel: Option<ChannelId>,
    pub is_admin: bool,
}

impl Invocation {
    pub fn from_command(ctx: &Context, command: &CommandInteraction, player: &AudioPlayer) -> Self {
        Self::gather(ctx, command.guild_id, command.user.id, command.member.as_deref(), player)
    }

    pub fn from_component(
        ctx: &Context,
        component: &ComponentInteraction,
        player: &AudioPlayer,
    ) -> Self {
        Self::gather(ctx, component.guild_id, component.user.id, component.member.as_ref(), player)
    }

    fn gather(
        ctx: &Context,
        guild_id: Option<GuildId>,
        user_id: UserId,
        member: Option<&Member>,
        player: &AudioPlayer,
    ) -> Self {
        let Some(guild_id) = guild_id else {
            return Self::default();
        };

        let user_channel = ctx.cache.guild(guild_id).and_then(|guild| {
            guild
                .voice_states
                .get(&user_id)
                .and_then(|state| state.channel_id)
        });

        Self {
            guild_id: Some(guild_id),
            user_channel,
            bot_channel: player.voice_channel(guild_id),
            is_admin: member
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator()),
        }
    }

    /// Runs `chain` in order and stops at the first failure.
    pub fn check(&self, chain: &[Precondition]) -> Result<GuildId, PreconditionError> {
        for precondition in chain {
            self.check_one(*precondition)?;
        }
        self.guild_id.ok_or(PreconditionError::NotInGuild)
    }

    fn check_one(&self, precondition: Precondition) -> Result<(), PreconditionError> {
        let passed = match precondition {
            GuildOnly => self.guild_id.is_some(),
            UserInVoice => self.user_channel.is_some(),
            BotInVoice => self.bot_channel.is_some(),
            SameVoiceChannel => match self.bot_channel {
                Some(bot) => self.user_channel == Some(bot),
                None => true,
            },
            Administrator => self.is_admin,
        };

        if passed {
            return Ok(());
        }

        Err(match precondition {
            GuildOnly => PreconditionError::NotInGuild,
            UserInVoice => PreconditionError::UserNotInVoice,
            BotInVoice => PreconditionError::BotNotInVoice,
            SameVoiceChannel => PreconditionError::DifferentChannels,
            Administrator => PreconditionError::MissingAdministrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GUILD: GuildId = GuildId::new(1);
    const ROOM_A: ChannelId = ChannelId::new(10);
    const ROOM_B: ChannelId = ChannelId::new(11);

    fn invocation(user: Option<ChannelId>, bot: Option<ChannelId>) -> Invocation {
        Invocation {
            guild_id: Some(GUILD),
            user_channel: user,
            bot_channel: bot,
            is_admin: false,
        }
    }

    #[test]
    fn direct_messages_fail_first() {
        assert_eq!(
            Invocation::default().check(CONTROL_CHAIN),
            Err(PreconditionError::NotInGuild)
        );
    }

    #[test]
    fn play_follows_user_when_bot_is_free() {
        assert_eq!(invocation(Some(ROOM_A), None).check(PLAY_CHAIN), Ok(GUILD));
        assert_eq!(
            invocation(None, None).check(PLAY_CHAIN),
            Err(PreconditionError::UserNotInVoice)
        );
    }

    #[test]
    fn controls_require_the_same_channel() {
        assert_eq!(invocation(Some(ROOM_A), Some(ROOM_A)).check(CONTROL_CHAIN), Ok(GUILD));
        assert_eq!(
            invocation(Some(ROOM_B), Some(ROOM_A)).check(CONTROL_CHAIN),
            Err(PreconditionError::DifferentChannels)
        );
        assert_eq!(
            invocation(Some(ROOM_A), None).check(CONTROL_CHAIN),
            Err(PreconditionError::BotNotInVoice)
        );
        assert_eq!(
            invocation(None, Some(ROOM_A)).check(CONTROL_CHAIN),
            Err(PreconditionError::UserNotInVoice)
        );
    }

    #[test]
    fn admin_chain_checks_permission() {
        let mut admin = invocation(None, None);
        assert_eq!(admin.check(ADMIN_CHAIN), Err(PreconditionError::MissingAdministrator));

        admin.is_admin = true;
        assert_eq!(admin.check(ADMIN_CHAIN), Ok(GUILD));
    }
}
