use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Development command registration

    // Storage
    pub database_url: String,

    // Audio
    pub default_volume: u8,
    pub inactivity_timeout: u64, // Seconds
    pub seek_step_ms: i64,
    pub enable_autoplay: bool,

    // Favorites
    pub catalog_base_url: String,
    pub leaderboard_timeout: u64, // Seconds

    // Guild layout
    pub voice_category_ids: Vec<u64>,
    pub text_category_ids: Vec<u64>,
    pub restricted_channel_ids: Vec<u64>,
    pub greetings_channel_id: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/shikibot.db?mode=rwc".to_string()),

            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            inactivity_timeout: std::env::var("INACTIVITY_TIMEOUT")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            seek_step_ms: std::env::var("SEEK_STEP_MS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            enable_autoplay: std::env::var("ENABLE_AUTOPLAY")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            catalog_base_url: std::env::var("CATALOG_BASE_URL")
                .unwrap_or_else(|_| "https://shikimori.one".to_string()),
            leaderboard_timeout: std::env::var("LEADERBOARD_TIMEOUT")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,

            voice_category_ids: parse_id_list(
                &std::env::var("VOICE_CATEGORY_IDS").unwrap_or_default(),
            )?,
            text_category_ids: parse_id_list(
                &std::env::var("TEXT_CATEGORY_IDS").unwrap_or_default(),
            )?,
            restricted_channel_ids: parse_id_list(
                &std::env::var("RESTRICTED_CHANNEL_IDS").unwrap_or_default(),
            )?,
            greetings_channel_id: std::env::var("GREETINGS_CHANNEL_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
        };

        if let Some(dir) = sqlite_parent_dir(&config.database_url) {
            std::fs::create_dir_all(dir)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Volume must be between 0 and 100
    /// - Timeouts must be greater than zero
    /// - Seek step must be positive
    /// - Catalog base url must parse
    pub fn validate(&self) -> Result<()> {
        if self.default_volume > 100 {
            anyhow::bail!("Default volume must be between 0 and 100, got: {}", self.default_volume);
        }

        if self.inactivity_timeout == 0 {
            anyhow::bail!("Inactivity timeout must be greater than 0");
        }

        if self.leaderboard_timeout == 0 {
            anyhow::bail!("Leaderboard timeout must be greater than 0");
        }

        if self.seek_step_ms <= 0 {
            anyhow::bail!("Seek step must be positive, got: {}", self.seek_step_ms);
        }

        url::Url::parse(&self.catalog_base_url).map_err(|e| {
            anyhow::anyhow!("Invalid catalog base url {}: {}", self.catalog_base_url, e)
        })?;

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token and database credentials are left out.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: commands {}\n  \
            Audio: {}% vol, {}s inactivity, {}ms seek step, Autoplay={}\n  \
            Favorites: catalog {}, {}s leaderboard\n  \
            Guild: {} voice categories, {} text categories, {} restricted channels, greetings {}",
            self.guild_id.map_or("global".to_string(), |id| format!("guild {}", id)),
            self.default_volume,
            self.inactivity_timeout,
            self.seek_step_ms,
            self.enable_autoplay,
            self.catalog_base_url,
            self.leaderboard_timeout,
            self.voice_category_ids.len(),
            self.text_category_ids.len(),
            self.restricted_channel_ids.len(),
            self.greetings_channel_id.map_or("off".to_string(), |id| id.to_string()),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            guild_id: None,
            database_url: "sqlite://data/shikibot.db?mode=rwc".to_string(),
            default_volume: 100,
            inactivity_timeout: 60,
            seek_step_ms: 10_000,
            enable_autoplay: true,
            catalog_base_url: "https://shikimori.one".to_string(),
            leaderboard_timeout: 300,
            voice_category_ids: Vec::new(),
            text_category_ids: Vec::new(),
            restricted_channel_ids: Vec::new(),
            greetings_channel_id: None,
        }
    }
}

/// Parses a comma separated list of snowflakes, ignoring blanks.
fn parse_id_list(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().map_err(|e| anyhow::anyhow!("Invalid id {:?}: {}", s, e)))
        .collect()
}

fn sqlite_parent_dir(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_id_lists() {
        assert_eq!(parse_id_list("1, 2,,3 ").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("").unwrap(), Vec::<u64>::new());
        assert!(parse_id_list("12,abc").is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_loud_default_volume() {
        let config = Config {
            default_volume: 101,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn finds_sqlite_parent_dir() {
        assert_eq!(
            sqlite_parent_dir("sqlite://data/shikibot.db?mode=rwc"),
            Some(std::path::Path::new("data"))
        );
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_parent_dir("sqlite://bot.db"), None);
    }
}
