use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ErrorRecord, ErrorReport};

/// A builder for creating `ErrorRecord` instances for testing.
pub struct ErrorRecordBuilder {
    id: String,
    code: String,
    message: String,
    details: BTreeMap<String, String>,
    service: String,
    operation: String,
    created_at: DateTime<Utc>,
    alerted: bool,
}

impl ErrorRecordBuilder {
    /// Creates a new builder for a record from `service` / `operation`.
    pub fn new(service: &str, operation: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code: "INTERNAL".to_string(),
            message: "something went wrong".to_string(),
            details: BTreeMap::new(),
            service: service.to_string(),
            operation: operation.to_string(),
            created_at: Utc::now(),
            alerted: false,
        }
    }

    /// Sets the id.
    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets the error code.
    pub fn code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    /// Sets the message.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Adds a detail entry.
    pub fn detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the intake timestamp.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Sets the alerted flag.
    pub fn alerted(mut self, alerted: bool) -> Self {
        self.alerted = alerted;
        self
    }

    /// Builds the `ErrorRecord`.
    pub fn build(self) -> ErrorRecord {
        ErrorRecord {
            id: self.id,
            code: self.code,
            message: self.message,
            details: self.details,
            service: self.service,
            operation: self.operation,
            created_at: self.created_at,
            alerted: self.alerted,
        }
    }

    /// Builds the matching `ErrorReport`, dropping id, timestamp and flag.
    pub fn build_report(self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            message: self.message,
            details: self.details,
            service: self.service,
            operation: self.operation,
        }
    }
}
