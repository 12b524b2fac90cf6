use sea_orm::{DatabaseConnection, TransactionTrait};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    error::FavoritesError,
    favorites::{
        catalog::CatalogApi,
        leaderboard::{self, LeaderboardRow},
        reference::CharacterRef,
        REQUIRED_REFERENCES,
    },
    storage::{
        entity::catalog_entry,
        repository::{CatalogEntryRepository, LinkRepository, NewCatalogEntry, UserRepository},
    },
};

/// A character in a user's list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub entry: catalog_entry::Model,
    pub favorite: bool,
}

/// Outcome of a lookup made before the registration transaction opens.
enum Resolved {
    Stored(catalog_entry::Model),
    Fetched(NewCatalogEntry),
}

pub struct FavoritesService {
    db: DatabaseConnection,
    catalog: Arc<dyn CatalogApi>,
}

impl FavoritesService {
    pub fn new(db: DatabaseConnection, catalog: Arc<dyn CatalogApi>) -> Self {
        Self { db, catalog }
    }

    /// Whether the user has any registered characters.
    pub async fn is_registered(&self, discord_id: u64) -> Result<bool, FavoritesError> {
        let Some(user) = UserRepository::new(&self.db).find_by_discord_id(discord_id).await? else {
            return Ok(false);
        };
        Ok(LinkRepository::new(&self.db).count_for_user(user.id).await? > 0)
    }

    /// Registers exactly [`REQUIRED_REFERENCES`] characters for the user.
    ///
    /// Validation and catalog lookups complete before the first write; on any
    /// error nothing is stored.
    ///
    /// # Arguments
    /// - `discord_id` - Discord ID of the registering user
    /// - `references` - Character links as typed by the user
    ///
    /// # Returns
    /// - `Ok(Vec<Model>)` - The stored catalog entries, in reference order
    /// - `Err(FavoritesError)` - The first failed check
    pub async fn register(
        &self,
        discord_id: u64,
        references: &[String],
    ) -> Result<Vec<catalog_entry::Model>, FavoritesError> {
        if self.is_registered(discord_id).await? {
            return Err(FavoritesError::AlreadyRegistered);
        }

        if references.len() != REQUIRED_REFERENCES {
            return Err(FavoritesError::WrongReferenceCount {
                expected: REQUIRED_REFERENCES,
                got: references.len(),
            });
        }

        let refs = references
            .iter()
            .map(|r| CharacterRef::parse(r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        if !refs.iter().all(|r| seen.insert(r.id)) {
            return Err(FavoritesError::DuplicateReference);
        }

        let mut resolved = Vec::with_capacity(refs.len());
        for reference in &refs {
            resolved.push(self.resolve(reference).await?);
        }

        let txn = self.db.begin().await?;
        let user = UserRepository::new(&txn).find_or_create(discord_id).await?;
        let entries = CatalogEntryRepository::new(&txn);
        let links = LinkRepository::new(&txn);

        let mut stored = Vec::with_capacity(resolved.len());
        for item in resolved {
            let entry = match item {
                Resolved::Stored(entry) => entry,
                Resolved::Fetched(new) => entries.insert_if_missing(new).await?,
            };
            links.create(user.id, entry.id).await?;
            stored.push(entry);
        }
        txn.commit().await?;

        info!("⭐ User {} registered {} characters", discord_id, stored.len());
        Ok(stored)
    }

    /// Marks one of the user's characters as favorite, clearing any other.
    pub async fn set_favorite(
        &self,
        discord_id: u64,
        reference: &str,
    ) -> Result<catalog_entry::Model, FavoritesError> {
        let reference = CharacterRef::parse(reference)?;

        let user = UserRepository::new(&self.db)
            .find_by_discord_id(discord_id)
            .await?
            .ok_or(FavoritesError::UserNotFound)?;
        let entry = CatalogEntryRepository::new(&self.db)
            .find_by_shikimori_id(reference.id)
            .await?
            .ok_or_else(|| FavoritesError::EntryNotFound(reference.url.clone()))?;
        let link = LinkRepository::new(&self.db)
            .find(user.id, entry.id)
            .await?
            .ok_or_else(|| FavoritesError::NotLinked(reference.url.clone()))?;

        let txn = self.db.begin().await?;
        let links = LinkRepository::new(&txn);
        links.clear_favorites(user.id).await?;
        links.mark_favorite(link.id).await?;
        txn.commit().await?;

        info!("💖 User {} marked {} as favorite", discord_id, entry.name);
        Ok(entry)
    }

    pub async fn clear_favorite(&self, discord_id: u64) -> Result<(), FavoritesError> {
        let user = UserRepository::new(&self.db)
            .find_by_discord_id(discord_id)
            .await?
            .ok_or(FavoritesError::UserNotFound)?;

        let cleared = LinkRepository::new(&self.db).clear_favorites(user.id).await?;
        debug!("Cleared favorite marker on {} links of user {}", cleared, discord_id);
        Ok(())
    }

    /// The user's characters in registration order.
    pub async fn list(&self, discord_id: u64) -> Result<Vec<FavoriteEntry>, FavoritesError> {
        let user = UserRepository::new(&self.db)
            .find_by_discord_id(discord_id)
            .await?
            .ok_or(FavoritesError::UserNotFound)?;

        let rows = LinkRepository::new(&self.db).for_user(user.id).await?;
        if rows.is_empty() {
            return Err(FavoritesError::UserNotFound);
        }

        Ok(rows
            .into_iter()
            .map(|(link, entry)| FavoriteEntry {
                entry,
                favorite: link.favorite,
            })
            .collect())
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, FavoritesError> {
        let entries = CatalogEntryRepository::new(&self.db).all().await?;
        let links = LinkRepository::new(&self.db).all().await?;
        Ok(leaderboard::rank(entries, &links))
    }

    /// Deletes the user and their links. Returns whether the user existed.
    pub async fn remove_user(&self, discord_id: u64) -> Result<bool, FavoritesError> {
        let removed = UserRepository::new(&self.db).delete_by_discord_id(discord_id).await?;
        if removed {
            info!("🗑️ Removed favorites of user {}", discord_id);
        }
        Ok(removed)
    }

    async fn resolve(&self, reference: &CharacterRef) -> Result<Resolved, FavoritesError> {
        if let Some(entry) = CatalogEntryRepository::new(&self.db)
            .find_by_shikimori_id(reference.id)
            .await?
        {
            return Ok(Resolved::Stored(entry));
        }

        match self.catalog.character(reference.id).await {
            Ok(Some(character)) => Ok(Resolved::Fetched(character.into())),
            Ok(None) => Err(FavoritesError::CharacterNotFound(reference.url.clone())),
            Err(e) => {
                warn!("📡 Catalog lookup for {} failed: {}", reference.id, e);
                Err(FavoritesError::CatalogUnavailable(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::CatalogError,
        favorites::catalog::{character, MockCatalogApi},
        storage::memory_db,
    };
    use pretty_assertions::assert_eq;

    const USER: u64 = 555;

    fn references(ids: [u64; 5]) -> Vec<String> {
        ids.iter()
            .map(|id| format!("https://shikimori.one/characters/{}-name", id))
            .collect()
    }

    fn catalog_knowing_everything() -> MockCatalogApi {
        let mut catalog = MockCatalogApi::new();
        catalog
            .expect_character()
            .returning(|id| Ok(Some(character(id, &format!("Character{}", id)))));
        catalog
    }

    async fn service(catalog: MockCatalogApi) -> FavoritesService {
        let db = memory_db().await.unwrap();
        FavoritesService::new(db, Arc::new(catalog))
    }

    /// Tests a full registration followed by a second attempt.
    ///
    /// Expected: five entries stored, second call fails with AlreadyRegistered
    #[tokio::test]
    async fn registers_once() {
        let favorites = service(catalog_knowing_everything()).await;

        let stored = favorites.register(USER, &references([1, 2, 3, 4, 5])).await.unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(stored[0].name, "Character1");
        assert!(favorites.is_registered(USER).await.unwrap());

        let again = favorites.register(USER, &references([6, 7, 8, 9, 10])).await;
        assert!(matches!(again, Err(FavoritesError::AlreadyRegistered)));
    }

    /// Tests that a character stored by another user is not fetched again.
    ///
    /// Expected: only the five ids of the first user hit the catalog
    #[tokio::test]
    async fn reuses_stored_entries() {
        let mut catalog = MockCatalogApi::new();
        catalog
            .expect_character()
            .times(6)
            .returning(|id| Ok(Some(character(id, "x"))));
        let favorites = service(catalog).await;

        favorites.register(1, &references([1, 2, 3, 4, 5])).await.unwrap();
        favorites.register(2, &references([1, 2, 3, 4, 6])).await.unwrap();

        let board = favorites.leaderboard().await.unwrap();
        assert_eq!(board.len(), 6);
        assert_eq!(board[0].links, 2);
    }

    /// Tests the count check.
    ///
    /// Expected: WrongReferenceCount without touching the catalog
    #[tokio::test]
    async fn rejects_wrong_count() {
        let favorites = service(MockCatalogApi::new()).await;
        let four = references([1, 2, 3, 4, 5])[..4].to_vec();

        let result = favorites.register(USER, &four).await;

        assert!(matches!(
            result,
            Err(FavoritesError::WrongReferenceCount { expected: 5, got: 4 })
        ));
    }

    /// Tests that a malformed link aborts the registration.
    ///
    /// Expected: InvalidReference and no user stored
    #[tokio::test]
    async fn rejects_malformed_reference() {
        let favorites = service(MockCatalogApi::new()).await;
        let mut refs = references([1, 2, 3, 4, 5]);
        refs[2] = "https://shikimori.one/animes/3-x".to_string();

        let result = favorites.register(USER, &refs).await;

        assert!(matches!(result, Err(FavoritesError::InvalidReference(_))));
        assert!(!favorites.is_registered(USER).await.unwrap());
    }

    /// Tests that repeated ids are caught before any lookup.
    ///
    /// Expected: DuplicateReference, catalog never called
    #[tokio::test]
    async fn rejects_duplicates_before_lookup() {
        let favorites = service(MockCatalogApi::new()).await;

        let result = favorites.register(USER, &references([1, 2, 3, 2, 5])).await;

        assert!(matches!(result, Err(FavoritesError::DuplicateReference)));
    }

    /// Tests a lookup miss in the middle of the list.
    ///
    /// Expected: CharacterNotFound with the link, nothing stored
    #[tokio::test]
    async fn missing_character_stores_nothing() {
        let mut catalog = MockCatalogApi::new();
        catalog
            .expect_character()
            .returning(|id| Ok((id != 3).then(|| character(id, "x"))));
        let favorites = service(catalog).await;

        let result = favorites.register(USER, &references([1, 2, 3, 4, 5])).await;

        match result {
            Err(FavoritesError::CharacterNotFound(url)) => {
                assert_eq!(url, "https://shikimori.one/characters/3-name")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(favorites.leaderboard().await.unwrap().is_empty());
    }

    /// Tests a catalog outage.
    ///
    /// Expected: CatalogUnavailable
    #[tokio::test]
    async fn catalog_failure_is_reported() {
        let mut catalog = MockCatalogApi::new();
        catalog
            .expect_character()
            .returning(|_| Err(CatalogError::Status(503)));
        let favorites = service(catalog).await;

        let result = favorites.register(USER, &references([1, 2, 3, 4, 5])).await;

        assert!(matches!(result, Err(FavoritesError::CatalogUnavailable(_))));
    }

    /// Tests the single favorite rule.
    ///
    /// Expected: after two calls only the second entry is favorite
    #[tokio::test]
    async fn only_last_favorite_survives() {
        let favorites = service(catalog_knowing_everything()).await;
        let refs = references([1, 2, 3, 4, 5]);
        favorites.register(USER, &refs).await.unwrap();

        favorites.set_favorite(USER, &refs[0]).await.unwrap();
        favorites.set_favorite(USER, &refs[3]).await.unwrap();

        let marked: Vec<_> = favorites
            .list(USER)
            .await
            .unwrap()
            .into_iter()
            .filter(|f| f.favorite)
            .map(|f| f.entry.shikimori_id)
            .collect();
        assert_eq!(marked, vec![4]);

        favorites.clear_favorite(USER).await.unwrap();
        assert!(favorites.list(USER).await.unwrap().iter().all(|f| !f.favorite));
    }

    /// Tests set_favorite error cases.
    ///
    /// Expected: UserNotFound, then EntryNotFound, then NotLinked
    #[tokio::test]
    async fn set_favorite_errors() {
        let favorites = service(catalog_knowing_everything()).await;
        let refs = references([1, 2, 3, 4, 5]);
        let unknown = "https://shikimori.one/characters/99-unknown";

        assert!(matches!(
            favorites.set_favorite(USER, &refs[0]).await,
            Err(FavoritesError::UserNotFound)
        ));

        favorites.register(USER, &refs).await.unwrap();
        assert!(matches!(
            favorites.set_favorite(USER, unknown).await,
            Err(FavoritesError::EntryNotFound(_))
        ));

        favorites.register(2, &references([6, 7, 8, 9, 10])).await.unwrap();
        assert!(matches!(
            favorites.set_favorite(USER, "https://shikimori.one/characters/6-name").await,
            Err(FavoritesError::NotLinked(_))
        ));
    }

    /// Tests removal of a departed member.
    ///
    /// Expected: links gone, catalog entries kept
    #[tokio::test]
    async fn removing_user_keeps_entries() {
        let favorites = service(catalog_knowing_everything()).await;
        favorites.register(USER, &references([1, 2, 3, 4, 5])).await.unwrap();

        assert!(favorites.remove_user(USER).await.unwrap());
        assert!(!favorites.remove_user(USER).await.unwrap());

        assert!(!favorites.is_registered(USER).await.unwrap());
        let board = favorites.leaderboard().await.unwrap();
        assert_eq!(board.len(), 5);
        assert!(board.iter().all(|row| row.score() == 0));
    }
}
