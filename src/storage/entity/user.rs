use sea_orm::entity::prelude::*;

/// A Discord user who registered favorites.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub discord_id: i64,
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
