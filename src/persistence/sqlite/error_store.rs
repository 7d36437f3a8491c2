//! Implementation of the ErrorStore trait for SqliteErrorStore

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    models::ErrorRecord,
    persistence::{error::PersistenceError, sqlite::SqliteErrorStore, traits::ErrorStore},
};

// Helper struct for mapping from the database row
#[derive(sqlx::FromRow)]
struct ErrorRow {
    id: String,
    code: String,
    message: String,
    details: String,
    service: String,
    operation: String,
    created_at_us: i64,
    alerted: bool,
}

impl TryFrom<ErrorRow> for ErrorRecord {
    type Error = PersistenceError;

    fn try_from(row: ErrorRow) -> Result<Self, Self::Error> {
        let details: BTreeMap<String, String> = serde_json::from_str(&row.details)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(row.created_at_us).ok_or_else(
            || {
                PersistenceError::InvalidInput(format!(
                    "created_at_us out of range: {}",
                    row.created_at_us
                ))
            },
        )?;
        Ok(ErrorRecord {
            id: row.id,
            code: row.code,
            message: row.message,
            details,
            service: row.service,
            operation: row.operation,
            created_at,
            alerted: row.alerted,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, code, message, details, service, operation, created_at_us, alerted FROM errors";

#[async_trait]
impl ErrorStore for SqliteErrorStore {
    #[tracing::instrument(skip(self, record), fields(error_id = %record.id), level = "debug")]
    async fn add(&self, record: &ErrorRecord) -> Result<(), PersistenceError> {
        let details = serde_json::to_string(&record.details)
            .map_err(|e| PersistenceError::SerializationError(e.to_string()))?;

        self.execute_query_with_error_handling(
            "insert error record",
            sqlx::query(
                "INSERT INTO errors (id, code, message, details, service, operation, \
                 created_at_us, alerted) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&record.id)
            .bind(&record.code)
            .bind(&record.message)
            .bind(details)
            .bind(&record.service)
            .bind(&record.operation)
            .bind(record.created_at.timestamp_micros())
            .bind(record.alerted)
            .execute(&self.pool),
        )
        .await?;

        tracing::debug!(service = %record.service, operation = %record.operation, "Error record inserted.");
        Ok(())
    }

    #[tracing::instrument(skip(self, record), fields(error_id = %record.id), level = "debug")]
    async fn update(&self, record: &ErrorRecord) -> Result<(), PersistenceError> {
        // MAX keeps the flag from going back to false.
        let result = self
            .execute_query_with_error_handling(
                "update error record",
                sqlx::query("UPDATE errors SET alerted = MAX(alerted, ?) WHERE id = ?")
                    .bind(record.alerted)
                    .bind(&record.id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!("Attempted to update a non-existent error record.");
            return Err(PersistenceError::NotFound(record.id.clone()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn find_last(
        &self,
        service: &str,
        operation: &str,
        alerted: bool,
    ) -> Result<Option<ErrorRecord>, PersistenceError> {
        let query = format!(
            "{SELECT_COLUMNS} WHERE service = ? AND operation = ? AND alerted = ? \
             ORDER BY created_at_us DESC, rowid DESC LIMIT 1"
        );
        let row = self
            .execute_query_with_error_handling(
                "find last error record",
                sqlx::query_as::<_, ErrorRow>(&query)
                    .bind(service)
                    .bind(operation)
                    .bind(alerted)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => {
                tracing::debug!("No matching error record found.");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn get(&self, id: &str) -> Result<Option<ErrorRecord>, PersistenceError> {
        let query = format!("{SELECT_COLUMNS} WHERE id = ?");
        let row = self
            .execute_query_with_error_handling(
                "get error record",
                sqlx::query_as::<_, ErrorRow>(&query).bind(id).fetch_optional(&self.pool),
            )
            .await?;

        row.map(ErrorRecord::try_from).transpose()
    }
}
