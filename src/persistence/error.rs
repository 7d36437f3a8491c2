//! Error types for the error record store.

use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A query or connection failed.
    #[error("A data store operation failed: {0}")]
    OperationFailed(String),

    /// No record with the given id exists.
    #[error("The requested error record was not found: {0}")]
    NotFound(String),

    /// The stored details column could not be encoded or decoded.
    #[error("Failed to serialize or deserialize error details: {0}")]
    SerializationError(String),

    /// Applying the embedded migrations failed.
    #[error("A data migration failed: {0}")]
    MigrationError(String),

    /// The database URL or a stored value was malformed.
    #[error("An invalid configuration or input was provided: {0}")]
    InvalidInput(String),

    /// A record with the same id was already inserted.
    #[error("Error record already exists: {0}")]
    AlreadyExists(String),
}
