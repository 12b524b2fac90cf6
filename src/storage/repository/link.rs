use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::storage::entity::{catalog_entry, prelude::*, user_catalog_link};

pub struct LinkRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> LinkRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        catalog_entry_id: i32,
    ) -> Result<user_catalog_link::Model, DbErr> {
        user_catalog_link::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            catalog_entry_id: ActiveValue::Set(catalog_entry_id),
            favorite: ActiveValue::Set(false),
            ..Default::default()
        }
        .insert(self.db)
        .await
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64, DbErr> {
        UserCatalogLink::find()
            .filter(user_catalog_link::Column::UserId.eq(user_id))
            .count(self.db)
            .await
    }

    /// Links of a user joined with their catalog entries, in insertion order.
    pub async fn for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<(user_catalog_link::Model, catalog_entry::Model)>, DbErr> {
        let rows = UserCatalogLink::find()
            .filter(user_catalog_link::Column::UserId.eq(user_id))
            .order_by_asc(user_catalog_link::Column::Id)
            .find_also_related(CatalogEntry)
            .all(self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(link, entry)| entry.map(|entry| (link, entry)))
            .collect())
    }

    pub async fn find(
        &self,
        user_id: i32,
        catalog_entry_id: i32,
    ) -> Result<Option<user_catalog_link::Model>, DbErr> {
        UserCatalogLink::find()
            .filter(user_catalog_link::Column::UserId.eq(user_id))
            .filter(user_catalog_link::Column::CatalogEntryId.eq(catalog_entry_id))
            .one(self.db)
            .await
    }

    /// Clears the favorite marker on every link of the user.
    ///
    /// # Returns
    /// - `Ok(u64)` - Number of rows touched
    /// - `Err(DbErr)` - Database error during update
    pub async fn clear_favorites(&self, user_id: i32) -> Result<u64, DbErr> {
        let result = UserCatalogLink::update_many()
            .col_expr(user_catalog_link::Column::Favorite, Expr::value(false))
            .filter(user_catalog_link::Column::UserId.eq(user_id))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn mark_favorite(&self, link_id: i32) -> Result<(), DbErr> {
        UserCatalogLink::update_many()
            .col_expr(user_catalog_link::Column::Favorite, Expr::value(true))
            .filter(user_catalog_link::Column::Id.eq(link_id))
            .exec(self.db)
            .await?;
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<user_catalog_link::Model>, DbErr> {
        UserCatalogLink::find()
            .order_by_asc(user_catalog_link::Column::Id)
            .all(self.db)
            .await
    }
}
