use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};

use crate::storage::entity::{catalog_entry, prelude::*};

/// Character data needed to store a new catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCatalogEntry {
    pub shikimori_id: u64,
    pub name: String,
    pub russian_name: String,
    pub image: String,
    pub url: String,
    pub alt_name: Option<String>,
    pub japanese_name: Option<String>,
}

pub struct CatalogEntryRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> CatalogEntryRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find_by_shikimori_id(
        &self,
        shikimori_id: u64,
    ) -> Result<Option<catalog_entry::Model>, DbErr> {
        CatalogEntry::find()
            .filter(catalog_entry::Column::ShikimoriId.eq(shikimori_id as i64))
            .one(self.db)
            .await
    }

    /// Stores `entry` unless a row with the same Shikimori id already exists.
    ///
    /// # Returns
    /// - `Ok(Model)` - The existing or newly inserted row
    /// - `Err(DbErr)` - Database error during query or insert
    pub async fn insert_if_missing(
        &self,
        entry: NewCatalogEntry,
    ) -> Result<catalog_entry::Model, DbErr> {
        if let Some(existing) = self.find_by_shikimori_id(entry.shikimori_id).await? {
            return Ok(existing);
        }

        catalog_entry::ActiveModel {
            shikimori_id: ActiveValue::Set(entry.shikimori_id as i64),
            name: ActiveValue::Set(entry.name),
            russian_name: ActiveValue::Set(entry.russian_name),
            image: ActiveValue::Set(entry.image),
            url: ActiveValue::Set(entry.url),
            alt_name: ActiveValue::Set(entry.alt_name),
            japanese_name: ActiveValue::Set(entry.japanese_name),
            ..Default::default()
        }
        .insert(self.db)
        .await
    }

    /// All entries in insertion order.
    pub async fn all(&self) -> Result<Vec<catalog_entry::Model>, DbErr> {
        CatalogEntry::find()
            .order_by_asc(catalog_entry::Column::Id)
            .all(self.db)
            .await
    }
}

#[cfg(test)]
pub(crate) fn new_entry(shikimori_id: u64, name: &str) -> NewCatalogEntry {
    NewCatalogEntry {
        shikimori_id,
        name: name.to_string(),
        russian_name: format!("{} (ru)", name),
        image: format!("https://shikimori.one/images/{}.jpg", shikimori_id),
        url: format!("https://shikimori.one/characters/{}", shikimori_id),
        alt_name: None,
        japanese_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_db;

    /// Tests that inserting the same Shikimori id twice keeps a single row.
    ///
    /// Expected: one row, original name preserved
    #[tokio::test]
    async fn insert_if_missing_keeps_first_row() -> Result<(), DbErr> {
        let db = memory_db().await?;
        let repo = CatalogEntryRepository::new(&db);

        let first = repo.insert_if_missing(new_entry(1, "Rem")).await?;
        let second = repo.insert_if_missing(new_entry(1, "Ram")).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Rem");
        assert_eq!(repo.all().await?.len(), 1);

        Ok(())
    }
}
