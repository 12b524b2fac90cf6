//! Self-service roles handed out on favorites registration.

use futures::{Stream, TryStreamExt};
use rand::Rng;
use regex::Regex;
use serenity::{
    all::{Colour, Context},
    builder::EditRole,
    model::{
        channel::{PermissionOverwrite, PermissionOverwriteType},
        guild::{Member, Role},
        id::{ChannelId, GuildId, RoleId, UserId},
        Permissions,
    },
};
use std::{collections::HashSet, future::Future, sync::LazyLock};
use tracing::{info, warn};

use crate::{config::Config, error::{CommandError, RoleError}};

static HEX_COLOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").unwrap());

/// Granted on every configured category.
const GENERAL_ALLOW: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::USE_EXTERNAL_EMOJIS)
    .union(Permissions::USE_EXTERNAL_STICKERS)
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::SEND_MESSAGES_IN_THREADS)
    .union(Permissions::READ_MESSAGE_HISTORY);

const GENERAL_DENY: Permissions = Permissions::USE_APPLICATION_COMMANDS;

const VOICE_ALLOW: Permissions = Permissions::CONNECT
    .union(Permissions::SPEAK)
    .union(Permissions::STREAM)
    .union(Permissions::USE_SOUNDBOARD)
    .union(Permissions::REQUEST_TO_SPEAK)
    .union(Permissions::USE_VAD);

const TEXT_ALLOW: Permissions = Permissions::EMBED_LINKS;

/// Role names are stored lower-cased and trimmed.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parses `#RGB` or `#RRGGBB`.
pub fn parse_colour(input: &str) -> Result<Colour, RoleError> {
    let hex = input.trim();
    if !HEX_COLOUR.is_match(hex) {
        return Err(RoleError::InvalidColour(hex.to_string()));
    }

    let digits = &hex[1..];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    u32::from_str_radix(&expanded, 16)
        .map(Colour::new)
        .map_err(|_| RoleError::InvalidColour(hex.to_string()))
}

/// Minimal role facts needed to decide on cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub managed: bool,
}

/// Roles no member holds, skipping `@everyone` and integration roles.
pub fn roles_without_holders(
    roles: &[RoleInfo],
    held: &HashSet<RoleId>,
    everyone: RoleId,
) -> Vec<RoleId> {
    roles
        .iter()
        .filter(|role| role.id != everyone && !role.managed && !held.contains(&role.id))
        .map(|role| role.id)
        .collect()
}

/// Looks up a role of the cached guild by its normalized name.
pub fn find_role(ctx: &Context, guild_id: GuildId, name: &str) -> Option<Role> {
    let name = normalize_name(name);
    let guild = ctx.cache.guild(guild_id)?;
    guild.roles.values().find(|role| role.name == name).cloned()
}

/// Union of the roles held by every member the stream yields.
///
/// Fails on the first failed page, so callers never see a partial set.
pub async fn held_roles<S, E>(members: S) -> Result<HashSet<RoleId>, E>
where
    S: Stream<Item = Result<Vec<RoleId>, E>>,
{
    members
        .try_fold(HashSet::new(), |mut held, roles| async move {
            held.extend(roles);
            Ok(held)
        })
        .await
}

/// Creates a hoisted role with a random colour, assigns it to `user_id` and
/// grants it access to the configured categories.
///
/// The role is deleted again when assigning it or granting access fails.
///
/// # Arguments
/// - `name` - Requested role name, normalized before use
///
/// # Returns
/// - `Ok(Role)` - The created role
/// - `Err(serenity::Error)` - Discord rejected one of the calls
pub async fn provision_role(
    ctx: &Context,
    config: &Config,
    guild_id: GuildId,
    user_id: UserId,
    name: &str,
) -> Result<Role, serenity::Error> {
    let colour = Colour::new(rand::thread_rng().gen_range(0..=0xFFFFFF));
    let role = guild_id
        .create_role(
            &ctx.http,
            EditRole::new()
                .name(normalize_name(name))
                .colour(colour)
                .hoist(true),
        )
        .await?;

    let (http, role_id) = (&ctx.http, role.id);
    undo_on_failure(
        grant_role(ctx, config, guild_id, user_id, &role),
        move || async move {
            if let Err(e) = guild_id.delete_role(http, role_id).await {
                warn!("Could not delete half-provisioned role {}: {}", role_id, e);
            }
        },
    )
    .await?;

    info!("🎭 Created role {} for user {} in guild {}", role.name, user_id, guild_id);
    Ok(role)
}

/// Awaits `step`; when it fails, awaits `undo` before returning the error.
async fn undo_on_failure<T, E, U>(
    step: impl Future<Output = Result<T, E>>,
    undo: impl FnOnce() -> U,
) -> Result<T, E>
where
    U: Future<Output = ()>,
{
    match step.await {
        Ok(value) => Ok(value),
        Err(e) => {
            undo().await;
            Err(e)
        }
    }
}

async fn grant_role(
    ctx: &Context,
    config: &Config,
    guild_id: GuildId,
    user_id: UserId,
    role: &Role,
) -> Result<(), serenity::Error> {
    ctx.http
        .add_member_role(guild_id, user_id, role.id, Some("favorites registered"))
        .await?;

    let categories = config
        .voice_category_ids
        .iter()
        .map(|id| (*id, GENERAL_ALLOW | VOICE_ALLOW))
        .chain(
            config
                .text_category_ids
                .iter()
                .map(|id| (*id, GENERAL_ALLOW | TEXT_ALLOW)),
        );

    for (category_id, allow) in categories {
        let overwrite = PermissionOverwrite {
            allow,
            deny: GENERAL_DENY,
            kind: PermissionOverwriteType::Role(role.id),
        };
        ChannelId::new(category_id)
            .create_permission(&ctx.http, overwrite)
            .await?;
    }
    Ok(())
}

/// Resolves a role the invoking member holds.
fn held_role(
    ctx: &Context,
    guild_id: GuildId,
    member: &Member,
    name: &str,
) -> Result<Role, RoleError> {
    let role = find_role(ctx, guild_id, name)
        .ok_or_else(|| RoleError::NotFound(normalize_name(name)))?;
    if !member.roles.contains(&role.id) {
        return Err(RoleError::NotHolder(role.name));
    }
    Ok(role)
}

pub async fn change_colour(
    ctx: &Context,
    guild_id: GuildId,
    member: &Member,
    name: &str,
    hex: &str,
) -> Result<Role, CommandError> {
    let role = held_role(ctx, guild_id, member, name)?;
    let colour = parse_colour(hex)?;

    let updated = guild_id
        .edit_role(&ctx.http, role.id, EditRole::new().colour(colour))
        .await?;
    info!("🎨 Role {} recoloured to {}", updated.name, hex);
    Ok(updated)
}

pub async fn rename(
    ctx: &Context,
    guild_id: GuildId,
    member: &Member,
    name: &str,
    new_name: &str,
) -> Result<Role, CommandError> {
    let role = held_role(ctx, guild_id, member, name)?;
    let new_name = normalize_name(new_name);

    if role.name == new_name {
        return Err(RoleError::SameName.into());
    }
    if find_role(ctx, guild_id, &new_name).is_some() {
        return Err(RoleError::NameTaken(new_name).into());
    }

    let updated = guild_id
        .edit_role(&ctx.http, role.id, EditRole::new().name(&new_name))
        .await?;
    info!("🏷️ Role {} renamed to {}", role.name, updated.name);
    Ok(updated)
}

/// Deletes roles without holders in every cached guild. Best effort.
///
/// Holders come from the full member list fetched over HTTP; the gateway
/// cache only knows a fraction of the members. A guild whose member list
/// cannot be fetched completely is skipped.
pub async fn remove_unused_roles(ctx: &Context) {
    for guild_id in ctx.cache.guilds() {
        let members = guild_id
            .members_iter(&ctx.http)
            .map_ok(|member| member.roles);
        let held = match held_roles(members).await {
            Ok(held) => held,
            Err(e) => {
                warn!("Skipping role cleanup in guild {}: {}", guild_id, e);
                continue;
            }
        };

        let roles: Vec<RoleInfo> = match ctx.cache.guild(guild_id) {
            Some(guild) => guild
                .roles
                .values()
                .map(|role| RoleInfo {
                    id: role.id,
                    managed: role.managed,
                })
                .collect(),
            None => continue,
        };

        for role_id in roles_without_holders(&roles, &held, guild_id.everyone_role()) {
            match guild_id.delete_role(&ctx.http, role_id).await {
                Ok(()) => info!("🧹 Deleted unused role {} in guild {}", role_id, guild_id),
                Err(e) => warn!("Could not delete role {} in guild {}: {}", role_id, guild_id, e),
            }
        }
    }
}
