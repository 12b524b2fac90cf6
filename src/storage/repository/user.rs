use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
};

use crate::storage::entity::{prelude::*, user, user_catalog_link};

pub struct UserRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Finds a user by their Discord ID.
    ///
    /// # Returns
    /// - `Ok(Some(Model))` - User found
    /// - `Ok(None)` - User never registered
    /// - `Err(DbErr)` - Database error during query
    pub async fn find_by_discord_id(&self, discord_id: u64) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::DiscordId.eq(discord_id as i64))
            .one(self.db)
            .await
    }

    /// Returns the user row for `discord_id`, inserting it first when missing.
    pub async fn find_or_create(&self, discord_id: u64) -> Result<user::Model, DbErr> {
        if let Some(existing) = self.find_by_discord_id(discord_id).await? {
            return Ok(existing);
        }

        user::ActiveModel {
            discord_id: ActiveValue::Set(discord_id as i64),
            ..Default::default()
        }
        .insert(self.db)
        .await
    }

    /// Deletes a user together with all of their links.
    ///
    /// # Returns
    /// - `Ok(true)` - User existed and was removed
    /// - `Ok(false)` - No such user
    /// - `Err(DbErr)` - Database error during delete
    pub async fn delete_by_discord_id(&self, discord_id: u64) -> Result<bool, DbErr> {
        let Some(existing) = self.find_by_discord_id(discord_id).await? else {
            return Ok(false);
        };

        UserCatalogLink::delete_many()
            .filter(user_catalog_link::Column::UserId.eq(existing.id))
            .exec(self.db)
            .await?;
        User::delete_by_id(existing.id).exec(self.db).await?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_db;

    /// Tests that a second lookup reuses the row created by the first.
    ///
    /// Expected: both calls return the same id
    #[tokio::test]
    async fn find_or_create_is_idempotent() -> Result<(), DbErr> {
        let db = memory_db().await?;
        let repo = UserRepository::new(&db);

        let first = repo.find_or_create(42).await?;
        let second = repo.find_or_create(42).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(first.discord_id, 42);

        Ok(())
    }

    /// Tests deleting a user that was never registered.
    ///
    /// Expected: Ok(false)
    #[tokio::test]
    async fn delete_missing_user_returns_false() -> Result<(), DbErr> {
        let db = memory_db().await?;
        let repo = UserRepository::new(&db);

        assert!(!repo.delete_by_discord_id(7).await?);

        Ok(())
    }
}
