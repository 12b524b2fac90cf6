use regex::Regex;
use std::sync::LazyLock;

use crate::error::FavoritesError;

static CHARACTER_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://shikimori\.(?:me|one)/characters/(\w+)-").unwrap());

/// A validated link to a Shikimori character page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRef {
    /// The link as the user sent it, trimmed.
    pub url: String,
    pub id: u64,
}

impl CharacterRef {
    /// Parses `https://shikimori.(me|one)/characters/<id>-<slug>`.
    ///
    /// The id segment may carry letter prefixes (`z1234`); only its digits
    /// form the catalog id.
    pub fn parse(input: &str) -> Result<Self, FavoritesError> {
        let url = input.trim();
        let invalid = || FavoritesError::InvalidReference(url.to_string());

        let segment = CHARACTER_URL
            .captures(url)
            .and_then(|caps| caps.get(1))
            .ok_or_else(invalid)?
            .as_str();

        let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
        let id = digits.parse().map_err(|_| invalid())?;

        Ok(Self {
            url: url.to_string(),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_both_domains() {
        let one = CharacterRef::parse("https://shikimori.one/characters/136685-rem").unwrap();
        let me = CharacterRef::parse("  https://shikimori.me/characters/136685-rem ").unwrap();

        assert_eq!(one.id, 136685);
        assert_eq!(me.id, 136685);
        assert_eq!(me.url, "https://shikimori.me/characters/136685-rem");
    }

    #[test]
    fn keeps_only_digits_of_prefixed_ids() {
        let parsed = CharacterRef::parse("https://shikimori.one/characters/z40881-asuka").unwrap();
        assert_eq!(parsed.id, 40881);
    }

    #[test]
    fn rejects_other_links() {
        for input in [
            "https://shikimori.one/animes/1-cowboy-bebop",
            "http://shikimori.one/characters/1-spike",
            "https://example.com/characters/1-spike",
            "https://shikimori.one/characters/1",
            "https://shikimori.one/characters/abc-spike",
            "rem",
        ] {
            assert!(
                matches!(CharacterRef::parse(input), Err(FavoritesError::InvalidReference(_))),
                "{input} should be rejected"
            );
        }
    }
}
