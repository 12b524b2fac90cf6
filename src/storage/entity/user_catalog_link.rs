use sea_orm::entity::prelude::*;

/// Join row between a user and one of their characters.
///
/// A (user, entry) pair is unique and at most one row per user has
/// `favorite` set.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_catalog_link")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub catalog_entry_id: i32,
    pub favorite: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::catalog_entry::Entity",
        from = "Column::CatalogEntryId",
        to = "super::catalog_entry::Column::Id",
        on_delete = "Cascade"
    )]
    CatalogEntry,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::catalog_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogEntry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
