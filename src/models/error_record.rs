//! Data models for error reports and the records persisted from them.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An error report as submitted by a client service, before intake assigns
/// its identity and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Short machine-readable error classifier.
    pub code: String,

    /// Human-readable description of the error.
    #[serde(default)]
    pub message: String,

    /// Free-form key/value context attached by the reporting service.
    #[serde(default)]
    pub details: BTreeMap<String, String>,

    /// The service that produced the error.
    pub service: String,

    /// The operation within the service that produced the error.
    pub operation: String,
}

/// A persisted error occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unique identifier assigned at intake.
    pub id: String,

    /// Short machine-readable error classifier.
    pub code: String,

    /// Human-readable description of the error.
    pub message: String,

    /// Key/value context. Ordered so that rendering is deterministic.
    pub details: BTreeMap<String, String>,

    /// The service that produced the error.
    pub service: String,

    /// The operation within the service that produced the error.
    pub operation: String,

    /// When the record was taken in.
    pub created_at: DateTime<Utc>,

    /// Whether an alert was successfully dispatched for this record.
    pub alerted: bool,
}

impl ErrorRecord {
    /// Builds a fresh record from a report, assigning a new id and the given
    /// intake time. The record starts out not alerted.
    pub fn from_report(report: ErrorReport, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            code: report.code,
            message: report.message,
            details: report.details,
            service: report.service,
            operation: report.operation,
            created_at,
            alerted: false,
        }
    }

    /// The key used to correlate this record with earlier alerts.
    pub fn throttle_key(&self) -> ThrottleKey {
        ThrottleKey::new(&self.service, &self.operation)
    }
}

/// Identifies the (service, operation) pair that alerts are throttled by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThrottleKey {
    /// The originating service.
    pub service: String,
    /// The originating operation.
    pub operation: String,
}

impl ThrottleKey {
    /// Creates a new key.
    pub fn new(service: &str, operation: &str) -> Self {
        Self { service: service.to_string(), operation: operation.to_string() }
    }
}

impl fmt::Display for ThrottleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.operation)
    }
}
