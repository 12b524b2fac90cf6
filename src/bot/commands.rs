use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId, Permissions},
    prelude::Context,
};

use crate::favorites::REQUIRED_REFERENCES;

/// Option names of the five character links of `/register_favorites`.
pub const REFERENCE_OPTIONS: [&str; REQUIRED_REFERENCES] =
    ["first", "second", "third", "fourth", "fifth"];

fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command(),
        stop_command(),
        pause_command(),
        skip_command(),
        volume_command(),
        nowplaying_command(),
        queue_command(),
        register_favorites_command(),
        show_favorites_command(),
        set_favorite_command(),
        clear_favorite_command(),
        leaderboard_command(),
        change_role_color_command(),
        change_role_name_command(),
        send_message_command(),
        edit_message_command(),
    ]
}

/// Registers global commands
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registers commands for a single guild (development)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

// Music

fn play_command() -> CreateCommand {
    CreateCommand::new("play")
        .description("Play a track or add it to the queue")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "query", "URL or search terms")
                .required(true),
        )
}

fn stop_command() -> CreateCommand {
    CreateCommand::new("stop")
        .description("Stop playback, clear the queue and leave the channel")
        .dm_permission(false)
}

fn pause_command() -> CreateCommand {
    CreateCommand::new("pause")
        .description("Pause or resume playback")
        .dm_permission(false)
}

fn skip_command() -> CreateCommand {
    CreateCommand::new("skip")
        .description("Skip to the next track")
        .dm_permission(false)
}

fn volume_command() -> CreateCommand {
    CreateCommand::new("volume")
        .description("Set the playback volume")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(CommandOptionType::Integer, "level", "Volume from 0 to 100")
                .required(true),
        )
}

fn nowplaying_command() -> CreateCommand {
    CreateCommand::new("np")
        .description("Show the track that is playing")
        .dm_permission(false)
}

fn queue_command() -> CreateCommand {
    CreateCommand::new("queue")
        .description("Show the playback queue")
        .dm_permission(false)
}

// Favorites

fn register_favorites_command() -> CreateCommand {
    let mut command = CreateCommand::new("register_favorites")
        .description("Register five favorite characters from Shikimori and get your own role")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "role",
                "Name of the role to create",
            )
            .required(true),
        );

    for name in REFERENCE_OPTIONS {
        command = command.add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                name,
                "Link to a character on shikimori.one",
            )
            .required(true),
        );
    }

    command
}

fn show_favorites_command() -> CreateCommand {
    CreateCommand::new("show_favorites")
        .description("Show the favorite characters of a member")
        .dm_permission(false)
        .add_option(CreateCommandOption::new(
            CommandOptionType::User,
            "user",
            "Member to look up, yourself by default",
        ))
}

fn set_favorite_command() -> CreateCommand {
    CreateCommand::new("set_favorite")
        .description("Mark one of your characters as your favorite")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "reference",
                "Link to one of your registered characters",
            )
            .required(true),
        )
}

fn clear_favorite_command() -> CreateCommand {
    CreateCommand::new("clear_favorite")
        .description("Remove your favorite marker")
        .dm_permission(false)
}

fn leaderboard_command() -> CreateCommand {
    CreateCommand::new("leaderboard")
        .description("Most registered characters of the server")
        .dm_permission(false)
}

// Roles

fn change_role_color_command() -> CreateCommand {
    CreateCommand::new("change_role_color")
        .description("Change the colour of your role")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "role", "Name of your role")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "color", "Hex colour, e.g. #9966CC")
                .required(true),
        )
}

fn change_role_name_command() -> CreateCommand {
    CreateCommand::new("change_role_name")
        .description("Rename your role")
        .dm_permission(false)
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "role", "Current name of your role")
                .required(true),
        )
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "name", "New name")
                .required(true),
        )
}

// Admin

fn send_message_command() -> CreateCommand {
    CreateCommand::new("send_message")
        .description("Send a message as the bot")
        .dm_permission(false)
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "channel_id", "Target channel id")
                .required(true),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "content",
            "Text to send",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "message_id",
            "Id of a message to copy, attachments included",
        ))
}

fn edit_message_command() -> CreateCommand {
    CreateCommand::new("edit_message")
        .description("Edit a message previously sent by the bot")
        .dm_permission(false)
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "target_message_id",
                "Id of the bot message to edit",
            )
            .required(true),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "content",
            "New text",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "message_id",
            "Id of a message whose text replaces the content",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_unique() {
        let names: Vec<String> = all_commands()
            .iter()
            .map(|c| serde_json::to_value(c).unwrap()["name"].as_str().unwrap().to_string())
            .collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();

        assert_eq!(names.len(), 16);
        assert_eq!(unique.len(), names.len());
    }
}
