//! Cooldown-based alert suppression per service and operation.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::persistence::{error::PersistenceError, traits::ErrorStore};

/// Errors that can occur while deciding whether to alert.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The most recent alerted record could not be looked up.
    #[error("Failed to look up last alerted error: {0}")]
    Lookup(#[from] PersistenceError),
}

/// Decides whether an error warrants a new alert, based on when the last
/// alert for the same service and operation was sent.
pub struct AlertThrottler {
    store: Arc<dyn ErrorStore>,
    cooldown: Duration,
}

impl AlertThrottler {
    /// Creates a new throttler.
    pub fn new(store: Arc<dyn ErrorStore>, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    /// Returns `true` when no alert was sent for the key yet, or when at
    /// least `cooldown` has passed between the last alerted record and `now`.
    /// A last alerted record that lies after `now` keeps the key suppressed.
    pub async fn should_alert(
        &self,
        service: &str,
        operation: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, ThrottleError> {
        let Some(last) = self.store.find_last(service, operation, true).await? else {
            return Ok(true);
        };

        match now.signed_duration_since(last.created_at).to_std() {
            Ok(elapsed) => Ok(elapsed >= self.cooldown),
            Err(_) => {
                tracing::warn!(
                    service,
                    operation,
                    last_alerted_at = %last.created_at,
                    "Last alert is timestamped in the future; suppressing."
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mockall::predicate::eq;

    use super::*;
    use crate::{persistence::traits::MockErrorStore, test_helpers::ErrorRecordBuilder};

    const COOLDOWN: Duration = Duration::from_secs(5 * 60);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn throttler_with_last(last: Option<DateTime<Utc>>) -> AlertThrottler {
        let mut store = MockErrorStore::new();
        store
            .expect_find_last()
            .with(eq("billing"), eq("charge"), eq(true))
            .returning(move |service, operation, _| {
                Ok(last.map(|at| {
                    ErrorRecordBuilder::new(service, operation).alerted(true).created_at(at).build()
                }))
            });
        AlertThrottler::new(Arc::new(store), COOLDOWN)
    }

    #[tokio::test]
    async fn test_alerts_when_no_prior_alert() {
        let throttler = throttler_with_last(None);
        assert!(throttler.should_alert("billing", "charge", t0()).await.unwrap());
    }

    #[tokio::test]
    async fn test_suppresses_within_cooldown() {
        let throttler = throttler_with_last(Some(t0()));
        let now = t0() + chrono::Duration::seconds(299);
        assert!(!throttler.should_alert("billing", "charge", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_alerts_exactly_at_cooldown() {
        let throttler = throttler_with_last(Some(t0()));
        let now = t0() + chrono::Duration::minutes(5);
        assert!(throttler.should_alert("billing", "charge", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_suppresses_when_last_alert_is_in_the_future() {
        let throttler = throttler_with_last(Some(t0() + chrono::Duration::hours(1)));
        assert!(!throttler.should_alert("billing", "charge", t0()).await.unwrap());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_returned() {
        let mut store = MockErrorStore::new();
        store
            .expect_find_last()
            .returning(|_, _, _| Err(PersistenceError::OperationFailed("disk I/O error".into())));
        let throttler = AlertThrottler::new(Arc::new(store), COOLDOWN);

        let result = throttler.should_alert("billing", "charge", t0()).await;
        assert!(matches!(result, Err(ThrottleError::Lookup(_))));
    }
}
