pub mod migrate;

pub use migrate::{MigrationFailure, MigrationReport, migrate_local_to_remote};
