//! Administrator relay: post or edit messages as the bot.

use futures::future::try_join_all;
use serenity::{
    all::{ChannelType, Context},
    builder::{CreateAttachment, CreateMessage, EditMessage},
    model::{
        channel::Message,
        id::{ChannelId, GuildId, MessageId},
    },
};
use tracing::{debug, info};

use crate::error::{CommandError, RelayError};

/// Where the relayed text comes from. A source message wins over inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaySource {
    Content(String),
    Message(MessageId),
}

impl RelaySource {
    pub fn from_options(
        content: Option<&str>,
        message_id: Option<&str>,
    ) -> Result<Self, RelayError> {
        if let Some(id) = message_id.map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(Self::Message(MessageId::new(parse_id(id)?)));
        }
        match content.filter(|c| !c.trim().is_empty()) {
            Some(content) => Ok(Self::Content(content.to_string())),
            None => Err(RelayError::MissingContent),
        }
    }
}

/// Parses a Discord snowflake typed by hand.
pub fn parse_id(input: &str) -> Result<u64, RelayError> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| RelayError::InvalidId(input.to_string()))
}

/// Scans the guild's text channels for `message_id`.
async fn find_message(ctx: &Context, guild_id: GuildId, message_id: MessageId) -> Option<Message> {
    let channels: Vec<ChannelId> = ctx
        .cache
        .guild(guild_id)
        .map(|guild| {
            guild
                .channels
                .values()
                .filter(|channel| channel.kind == ChannelType::Text)
                .map(|channel| channel.id)
                .collect()
        })
        .unwrap_or_default();

    for channel_id in channels {
        match channel_id.message(&ctx.http, message_id).await {
            Ok(message) => return Some(message),
            Err(e) => debug!("🔍 Message {} not in channel {}: {}", message_id, channel_id, e),
        }
    }
    None
}

/// Sends a message to `channel_id`, copying attachments when relaying a message.
pub async fn send_message(
    ctx: &Context,
    guild_id: GuildId,
    channel_id: &str,
    source: RelaySource,
) -> Result<ChannelId, CommandError> {
    let channel_id = ChannelId::new(parse_id(channel_id)?);

    let builder = match source {
        RelaySource::Content(content) => CreateMessage::new().content(content),
        RelaySource::Message(id) => {
            let original = find_message(ctx, guild_id, id)
                .await
                .ok_or(RelayError::MessageNotFound(id.get()))?;

            let files = try_join_all(
                original
                    .attachments
                    .iter()
                    .map(|attachment| CreateAttachment::url(&ctx.http, &attachment.url)),
            )
            .await?;
            CreateMessage::new().content(original.content).add_files(files)
        }
    };

    channel_id.send_message(&ctx.http, builder).await?;
    info!("📨 Relayed a message to channel {} in guild {}", channel_id, guild_id);
    Ok(channel_id)
}

/// Replaces the content of one of the bot's own messages.
pub async fn edit_message(
    ctx: &Context,
    guild_id: GuildId,
    target_id: &str,
    source: RelaySource,
) -> Result<Message, CommandError> {
    let target_id = MessageId::new(parse_id(target_id)?);
    let bot_id = ctx.cache.current_user().id;

    let target = find_message(ctx, guild_id, target_id)
        .await
        .filter(|message| message.author.id == bot_id)
        .ok_or(RelayError::MessageNotFound(target_id.get()))?;

    let content = match source {
        RelaySource::Content(content) => content,
        RelaySource::Message(id) => {
            find_message(ctx, guild_id, id)
                .await
                .ok_or(RelayError::MessageNotFound(id.get()))?
                .content
        }
    };

    let edited = target
        .channel_id
        .edit_message(&ctx.http, target.id, EditMessage::new().content(content))
        .await?;
    info!("✏️ Edited message {} in guild {}", edited.id, guild_id);
    Ok(edited)
}
