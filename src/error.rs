//! Error taxonomy shared by the command handlers.
//!
//! Each component owns a `thiserror` enum. [`CommandError`] aggregates them at
//! the interaction boundary and decides what the invoking user gets to read.

use sea_orm::DbErr;
use thiserror::Error;

/// A precondition of a command chain was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("command used outside of a server")]
    NotInGuild,
    #[error("user is not connected to a voice channel")]
    UserNotInVoice,
    #[error("bot is not connected to a voice channel")]
    BotNotInVoice,
    #[error("user and bot are in different voice channels")]
    DifferentChannels,
    #[error("administrator permission required")]
    MissingAdministrator,
}

/// Failure reported by the audio node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("no voice connection for guild {0}")]
    NotConnected(u64),
    #[error("no active track for guild {0}")]
    NoTrack(u64),
    #[error("voice connection failed: {0}")]
    Join(String),
    #[error("track control failed: {0}")]
    Control(String),
    #[error("track lookup failed: {0}")]
    Lookup(String),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("volume {0} is outside 0..=100")]
    VolumeOutOfRange(i64),
    #[error("nothing found for the query")]
    NotFound,
    #[error("no voice session for guild {0}")]
    NoSession(u64),
    #[error("nothing is playing")]
    NothingPlaying,
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Failure talking to the character catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog answered with status {0}")]
    Status(u16),
    #[error("invalid catalog url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("user already registered favorites")]
    AlreadyRegistered,
    #[error("expected {expected} references, got {got}")]
    WrongReferenceCount { expected: usize, got: usize },
    #[error("invalid character reference: {0}")]
    InvalidReference(String),
    #[error("the same character was referenced more than once")]
    DuplicateReference,
    #[error("character not found in catalog: {0}")]
    CharacterNotFound(String),
    #[error("catalog unavailable")]
    CatalogUnavailable(#[source] CatalogError),
    #[error("user has no registered favorites")]
    UserNotFound,
    #[error("character is not stored: {0}")]
    EntryNotFound(String),
    #[error("character is not in the user's list: {0}")]
    NotLinked(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Validation failures of the self-service role commands.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("role name already exists: {0}")]
    NameTaken(String),
    #[error("role not found: {0}")]
    NotFound(String),
    #[error("user does not hold role {0}")]
    NotHolder(String),
    #[error("invalid hex colour: {0}")]
    InvalidColour(String),
    #[error("new role name equals the current one")]
    SameName,
}

/// Failures of the admin relay commands.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("either content or a source message id is required")]
    MissingContent,
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("message not found: {0}")]
    MessageNotFound(u64),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error(transparent)]
    Favorites(#[from] FavoritesError),
    #[error(transparent)]
    Role(#[from] RoleError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error("missing option: {0}")]
    MissingOption(&'static str),
    #[error(transparent)]
    Discord(Box<serenity::Error>),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<serenity::Error> for CommandError {
    fn from(err: serenity::Error) -> Self {
        Self::Discord(Box::new(err))
    }
}

impl CommandError {
    /// Whether the error is an ordinary user mistake rather than a failure.
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Precondition(_)
            | Self::Role(_)
            | Self::Relay(_)
            | Self::MissingOption(_) => true,
            Self::Player(err) => !matches!(err, PlayerError::Node(_)),
            Self::Favorites(err) => !matches!(
                err,
                FavoritesError::Db(_) | FavoritesError::CatalogUnavailable(_)
            ),
            Self::Discord(_) | Self::Db(_) => false,
        }
    }

    /// Message shown to the invoking user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Precondition(err) => match err {
                PreconditionError::NotInGuild => "❌ This command only works inside a server".into(),
                PreconditionError::UserNotInVoice => {
                    "❌ You need to join a voice channel first".into()
                }
                PreconditionError::BotNotInVoice => "❌ I'm not connected to a voice channel".into(),
                PreconditionError::DifferentChannels => {
                    "❌ You need to be in the same voice channel as me".into()
                }
                PreconditionError::MissingAdministrator => {
                    "❌ You need the administrator permission for this".into()
                }
            },
            Self::Player(err) => match err {
                PlayerError::VolumeOutOfRange(_) => "❌ Volume must be between 0 and 100".into(),
                PlayerError::NotFound => "❌ Nothing was found for that query".into(),
                PlayerError::NoSession(_) => "❌ I'm not connected to a voice channel".into(),
                PlayerError::NothingPlaying => "❌ Nothing is playing right now".into(),
                PlayerError::Node(_) => "❌ The audio engine failed, try again later".into(),
            },
            Self::Favorites(err) => match err {
                FavoritesError::AlreadyRegistered => {
                    "❌ You have already registered your favorites".into()
                }
                FavoritesError::WrongReferenceCount { expected, .. } => {
                    format!("❌ Send exactly {} character links", expected)
                }
                FavoritesError::InvalidReference(url) => {
                    format!("❌ `{}` is not a Shikimori character link", url)
                }
                FavoritesError::DuplicateReference => {
                    "❌ Every character must be different".into()
                }
                FavoritesError::CharacterNotFound(url) => {
                    format!("❌ Character `{}` was not found on Shikimori", url)
                }
                FavoritesError::CatalogUnavailable(_) => {
                    "❌ Shikimori is not answering, try again later".into()
                }
                FavoritesError::UserNotFound => "❌ No favorites registered yet".into(),
                FavoritesError::EntryNotFound(url) | FavoritesError::NotLinked(url) => {
                    format!("❌ `{}` is not in your favorites", url)
                }
                FavoritesError::Db(_) => "❌ Something went wrong, try again later".into(),
            },
            Self::Role(err) => match err {
                RoleError::NameTaken(name) => format!("❌ A role named `{}` already exists", name),
                RoleError::NotFound(name) => format!("❌ Role `{}` does not exist", name),
                RoleError::NotHolder(name) => format!("❌ You don't have the role `{}`", name),
                RoleError::InvalidColour(hex) => {
                    format!("❌ `{}` is not a colour, use `#RGB` or `#RRGGBB`", hex)
                }
                RoleError::SameName => "❌ The new name is the same as the old one".into(),
            },
            Self::Relay(err) => match err {
                RelayError::MissingContent => {
                    "❌ Provide a message or the id of a message to copy".into()
                }
                RelayError::InvalidId(id) => format!("❌ `{}` is not a valid id", id),
                RelayError::MessageNotFound(id) => format!("❌ Message `{}` was not found", id),
            },
            Self::MissingOption(name) => format!("❌ Missing option `{}`", name),
            Self::Discord(_) | Self::Db(_) => "❌ Something went wrong, try again later".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn precondition_errors_are_expected() {
        let err = CommandError::from(PreconditionError::DifferentChannels);
        assert!(err.is_expected());
        assert_eq!(
            err.user_message(),
            "❌ You need to be in the same voice channel as me"
        );
    }

    #[test]
    fn node_failures_are_not_expected() {
        let node = NodeError::Join("gateway timed out".into());
        let err = CommandError::from(PlayerError::Node(node));
        assert!(!err.is_expected());
    }

    #[test]
    fn volume_out_of_range_is_expected() {
        let err = CommandError::from(PlayerError::VolumeOutOfRange(150));
        assert!(err.is_expected());
        assert_eq!(err.user_message(), "❌ Volume must be between 0 and 100");
    }
}
