//! Persistence layer for error records.

pub mod error;
pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteErrorStore;
