use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::{error::CatalogError, storage::repository::NewCatalogEntry};

/// Character data with absolute urls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: u64,
    pub name: String,
    pub russian: String,
    pub image: String,
    pub url: String,
    pub alt_name: Option<String>,
    pub japanese_name: Option<String>,
}

impl From<Character> for NewCatalogEntry {
    fn from(character: Character) -> Self {
        Self {
            shikimori_id: character.id,
            name: character.name,
            russian_name: character.russian,
            image: character.image,
            url: character.url,
            alt_name: character.alt_name,
            japanese_name: character.japanese_name,
        }
    }
}

/// Lookup of characters by catalog id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `Ok(None)` when the catalog does not know the id.
    async fn character(&self, id: u64) -> Result<Option<Character>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct CharacterResponse {
    id: u64,
    name: String,
    #[serde(default)]
    russian: Option<String>,
    image: ImageResponse,
    url: String,
    #[serde(default)]
    altname: Option<String>,
    #[serde(default)]
    japanese: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    original: String,
}

impl CharacterResponse {
    /// The API returns site-relative paths; resolve them against `base`.
    fn into_character(self, base: &Url) -> Result<Character, CatalogError> {
        Ok(Character {
            id: self.id,
            russian: self.russian.filter(|r| !r.is_empty()).unwrap_or_else(|| self.name.clone()),
            name: self.name,
            image: base.join(&self.image.original)?.to_string(),
            url: base.join(&self.url)?.to_string(),
            alt_name: self.altname.filter(|a| !a.is_empty()),
            japanese_name: self.japanese.filter(|j| !j.is_empty()),
        })
    }
}

/// HTTP client for the public Shikimori API.
pub struct ShikimoriClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ShikimoriClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }
}

#[async_trait]
impl CatalogApi for ShikimoriClient {
    async fn character(&self, id: u64) -> Result<Option<Character>, CatalogError> {
        let endpoint = self.base_url.join(&format!("api/characters/{}", id))?;
        debug!("📡 GET {}", endpoint);

        let response = self.http.get(endpoint).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: CharacterResponse = response.json().await?;
                body.into_character(&self.base_url).map(Some)
            }
            status => Err(CatalogError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
pub(crate) fn character(id: u64, name: &str) -> Character {
    Character {
        id,
        name: name.to_string(),
        russian: format!("{} (ru)", name),
        image: format!("https://shikimori.one/system/characters/original/{}.jpg", id),
        url: format!("https://shikimori.one/characters/{}-{}", id, name.to_lowercase()),
        alt_name: None,
        japanese_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_relative_paths_against_base() {
        let body = r#"{
            "id": 136685,
            "name": "Rem",
            "russian": "Рем",
            "image": { "original": "/system/characters/original/136685.jpg", "preview": "/x.jpg" },
            "url": "/characters/136685-rem",
            "altname": "",
            "japanese": "レム",
            "description": null
        }"#;
        let response: CharacterResponse = serde_json::from_str(body).unwrap();
        let base = Url::parse("https://shikimori.one").unwrap();

        let character = response.into_character(&base).unwrap();

        assert_eq!(character.url, "https://shikimori.one/characters/136685-rem");
        assert_eq!(
            character.image,
            "https://shikimori.one/system/characters/original/136685.jpg"
        );
        assert_eq!(character.alt_name, None);
        assert_eq!(character.japanese_name.as_deref(), Some("レム"));
    }

    #[test]
    fn falls_back_to_name_without_russian() {
        let body = r#"{
            "id": 1,
            "name": "Spike Spiegel",
            "russian": null,
            "image": { "original": "/a.jpg" },
            "url": "/characters/1-spike-spiegel"
        }"#;
        let response: CharacterResponse = serde_json::from_str(body).unwrap();
        let base = Url::parse("https://shikimori.one").unwrap();

        assert_eq!(response.into_character(&base).unwrap().russian, "Spike Spiegel");
    }
}
