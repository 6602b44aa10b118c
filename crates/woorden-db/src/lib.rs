pub mod memory;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use memory::MemoryLocalStore;
pub use sqlite::SqliteLocalStore;
pub use store::LocalStore;
