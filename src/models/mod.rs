//! This module contains the data models for the Sentinel application.

pub mod error_record;
pub mod notification;
pub mod notifier;

pub use error_record::{ErrorRecord, ErrorReport, ThrottleKey};
pub use notification::NotificationMessage;
