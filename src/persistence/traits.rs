//! The storage interface the intake pipeline and throttler depend on.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::error::PersistenceError;
use crate::models::ErrorRecord;

/// Durable storage for error records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ErrorStore: Send + Sync {
    /// Inserts a new record. Fails with `AlreadyExists` if the id is taken.
    async fn add(&self, record: &ErrorRecord) -> Result<(), PersistenceError>;

    /// Persists the `alerted` flag of an existing record. The flag never
    /// reverts from `true` to `false`. Fails with `NotFound` if the id is
    /// unknown.
    async fn update(&self, record: &ErrorRecord) -> Result<(), PersistenceError>;

    /// Returns the most recent record for the given service and operation
    /// whose `alerted` flag equals `alerted`, or `None` if there is none.
    async fn find_last(
        &self,
        service: &str,
        operation: &str,
        alerted: bool,
    ) -> Result<Option<ErrorRecord>, PersistenceError>;

    /// Fetches a record by id.
    async fn get(&self, id: &str) -> Result<Option<ErrorRecord>, PersistenceError>;
}
