//! Repositories over the favorites tables.
//!
//! Each repository borrows any [`sea_orm::ConnectionTrait`] so the same code
//! runs against the pool or inside a transaction.

pub mod catalog_entry;
pub mod link;
pub mod user;

pub use catalog_entry::{CatalogEntryRepository, NewCatalogEntry};
pub use link::LinkRepository;
pub use user::UserRepository;
