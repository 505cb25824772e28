mod catalog;
pub mod connection;
mod memory;
mod postgres;

pub use catalog::CatalogStore;
pub use connection::{check_health, create_pool};
pub use memory::{CatalogSeed, MemoryCatalog};
pub use postgres::PgCatalog;
