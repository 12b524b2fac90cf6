use sea_orm::entity::prelude::*;

/// A Shikimori character referenced by at least one registration.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub shikimori_id: i64,
    pub name: String,
    pub russian_name: String,
    pub image: String,
    pub url: String,
    pub alt_name: Option<String>,
    pub japanese_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_catalog_link::Entity")]
    UserCatalogLink,
}

impl Related<super::user_catalog_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCatalogLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
