//! Relational storage for the favorites feature.
//!
//! The schema is derived from the entities and created on startup; every
//! statement is idempotent so restarts against an existing database are safe.

use sea_orm::{
    sea_query::Index, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};
use tracing::info;

pub mod entity;
pub mod repository;

use entity::{prelude::*, user_catalog_link};

/// Opens the database and makes sure all tables exist.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;
    create_schema(&db).await?;
    info!("🗄️ Database ready");
    Ok(db)
}

/// Creates tables in dependency order plus the unique (user, entry) index.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    let tables = [
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(CatalogEntry),
        schema.create_table_from_entity(UserCatalogLink),
    ];
    for mut stmt in tables {
        stmt.if_not_exists();
        db.execute(&stmt).await?;
    }

    let pair_index = Index::create()
        .if_not_exists()
        .name("idx_user_catalog_link_pair")
        .table(UserCatalogLink)
        .col(user_catalog_link::Column::UserId)
        .col(user_catalog_link::Column::CatalogEntryId)
        .unique()
        .to_owned();
    db.execute(&pair_index).await?;

    Ok(())
}

/// In-memory database with the full schema, for tests.
#[cfg(test)]
pub(crate) async fn memory_db() -> Result<DatabaseConnection, DbErr> {
    connect("sqlite::memory:").await
}
