//! Database entities for registered users, catalog characters and the links between them.

pub mod catalog_entry;
pub mod user;
pub mod user_catalog_link;

pub mod prelude {
    pub use super::catalog_entry::Entity as CatalogEntry;
    pub use super::user::Entity as User;
    pub use super::user_catalog_link::Entity as UserCatalogLink;
}
