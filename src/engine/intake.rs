//! The intake pipeline: persist an error, then decide in the background
//! whether to alert on it.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;

use super::{clock::Clock, throttler::AlertThrottler};
use crate::{
    models::{ErrorRecord, ErrorReport, ThrottleKey},
    notification::{AlertRenderer, Notifier},
    persistence::{error::PersistenceError, traits::ErrorStore},
};

/// Errors returned to the caller of [`IntakePipeline::submit`].
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The report could not be stored.
    #[error("Failed to persist error record: {0}")]
    Persistence(#[from] PersistenceError),
}

/// How a background evaluation of a record ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// An alert for the same key was sent within the cooldown.
    Suppressed,
    /// The alert was delivered and the record marked as alerted.
    Sent,
    /// The throttling lookup failed; nothing was sent.
    LookupFailed,
    /// The notifier failed; the record stays unalerted.
    SendFailed,
    /// The alert was delivered but the record could not be marked. A later
    /// error for the same key may alert again.
    UpdateFailed,
}

struct PipelineInner {
    store: Arc<dyn ErrorStore>,
    throttler: AlertThrottler,
    renderer: AlertRenderer,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    key_locks: DashMap<ThrottleKey, Arc<Mutex<()>>>,
}

impl PipelineInner {
    fn get_key_lock(&self, key: &ThrottleKey) -> Arc<Mutex<()>> {
        self.key_locks.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Drops the lock entry for `key` once no evaluation holds or waits on it.
    fn release_key_lock(&self, key: &ThrottleKey, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.key_locks.remove_if(key, |_, l| Arc::strong_count(l) == 1);
    }

    #[tracing::instrument(
        skip(self, record),
        fields(error_id = %record.id, service = %record.service, operation = %record.operation)
    )]
    async fn evaluate(&self, record: ErrorRecord) -> AlertOutcome {
        let key = record.throttle_key();
        let lock = self.get_key_lock(&key);
        let outcome = {
            // Held across check, send and update so two errors for the same
            // key cannot both pass the check.
            let _guard = lock.lock().await;
            self.evaluate_locked(record).await
        };
        self.release_key_lock(&key, lock);
        outcome
    }

    async fn evaluate_locked(&self, mut record: ErrorRecord) -> AlertOutcome {
        let now = self.clock.now();
        match self.throttler.should_alert(&record.service, &record.operation, now).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Alert suppressed by cooldown.");
                return AlertOutcome::Suppressed;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to evaluate alert cooldown.");
                return AlertOutcome::LookupFailed;
            }
        }

        let message = self.renderer.render(&record, self.notifier.channel_kind());
        if let Err(e) = self.notifier.send(&message.title, &message.body).await {
            tracing::error!(error = %e, notifier = self.notifier.name(), "Failed to send alert.");
            return AlertOutcome::SendFailed;
        }

        record.alerted = true;
        if let Err(e) = self.store.update(&record).await {
            tracing::error!(
                error = %e,
                "Alert was sent but the record could not be marked as alerted; a duplicate alert is possible."
            );
            return AlertOutcome::UpdateFailed;
        }

        tracing::info!(notifier = self.notifier.name(), "Alert sent.");
        AlertOutcome::Sent
    }
}

/// Accepts error reports and dispatches alerts for them.
///
/// `submit` stores the record and returns immediately; the alert decision
/// runs on a tracked background task so that shutdown can wait for it.
#[derive(Clone)]
pub struct IntakePipeline {
    inner: Arc<PipelineInner>,
    tracker: TaskTracker,
}

impl IntakePipeline {
    /// Creates a new pipeline.
    pub fn new(
        store: Arc<dyn ErrorStore>,
        notifier: Arc<dyn Notifier>,
        renderer: AlertRenderer,
        cooldown: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let throttler = AlertThrottler::new(Arc::clone(&store), cooldown);
        Self {
            inner: Arc::new(PipelineInner {
                store,
                throttler,
                renderer,
                notifier,
                clock,
                key_locks: DashMap::new(),
            }),
            tracker: TaskTracker::new(),
        }
    }

    /// Persists a new record built from `report` and schedules the alert
    /// evaluation. Returns the stored record. If storing fails nothing is
    /// scheduled.
    pub async fn submit(&self, report: ErrorReport) -> Result<ErrorRecord, IntakeError> {
        let record = ErrorRecord::from_report(report, self.inner.clock.now());

        if let Err(e) = self.inner.store.add(&record).await {
            tracing::error!(
                error = %e,
                service = %record.service,
                operation = %record.operation,
                "Failed to persist error record."
            );
            return Err(e.into());
        }
        tracing::debug!(error_id = %record.id, service = %record.service, operation = %record.operation, "Error record persisted.");

        let inner = Arc::clone(&self.inner);
        let pending = record.clone();
        self.tracker.spawn(async move {
            inner.evaluate(pending).await;
        });

        Ok(record)
    }

    /// Runs the alert evaluation for an already stored record on the current
    /// task and returns its outcome. The cooldown is measured against the
    /// clock at the time the key lock is acquired.
    pub async fn evaluate(&self, record: ErrorRecord) -> AlertOutcome {
        self.inner.evaluate(record).await
    }

    /// Number of evaluations still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits for every scheduled evaluation to finish. New submissions are
    /// accepted again afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Waits up to `timeout` for scheduled evaluations. Returns `false` if
    /// some were still running when the timeout elapsed.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for in-flight alerts to finish.");
        }
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.tracker.len(),
                    "Shutdown timeout elapsed with alerts still in flight."
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, TimeZone, Utc};
    use mockall::predicate::eq;

    use super::*;
    use crate::{
        notification::{ChannelKind, MockNotifier, error::NotificationError},
        persistence::traits::MockErrorStore,
        test_helpers::{ErrorRecordBuilder, ManualClock},
    };

    const COOLDOWN: Duration = Duration::from_secs(5 * 60);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn report() -> ErrorReport {
        ErrorReport {
            code: "DB_TIMEOUT".to_string(),
            message: "query timed out".to_string(),
            details: BTreeMap::from([
                ("trace_id".to_string(), "abc".to_string()),
                ("secret".to_string(), "xyz".to_string()),
            ]),
            service: "billing".to_string(),
            operation: "charge".to_string(),
        }
    }

    fn plain_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_name().return_const("mock");
        notifier.expect_channel_kind().return_const(ChannelKind::Plain);
        notifier
    }

    fn pipeline(store: MockErrorStore, notifier: MockNotifier) -> IntakePipeline {
        pipeline_with_clock(store, notifier, Arc::new(ManualClock::new(t0())))
    }

    fn pipeline_with_clock(
        store: MockErrorStore,
        notifier: MockNotifier,
        clock: Arc<ManualClock>,
    ) -> IntakePipeline {
        IntakePipeline::new(
            Arc::new(store),
            Arc::new(notifier),
            AlertRenderer::new("test", &["trace_id".to_string()]),
            COOLDOWN,
            clock,
        )
    }

    #[tokio::test]
    async fn test_submit_persists_and_returns_unalerted_record() {
        let mut store = MockErrorStore::new();
        store
            .expect_add()
            .withf(|r| r.service == "billing" && !r.alerted && r.created_at == t0())
            .times(1)
            .returning(|_| Ok(()));
        store.expect_find_last().returning(|_, _, _| Ok(None));
        store.expect_update().returning(|_| Ok(()));
        let mut notifier = plain_notifier();
        notifier.expect_send().returning(|_, _| Ok(()));

        let pipeline = pipeline(store, notifier);
        let record = pipeline.submit(report()).await.unwrap();
        pipeline.drain().await;

        assert!(!record.alerted);
        assert_eq!(record.created_at, t0());
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
    }

    #[tokio::test]
    async fn test_submit_failure_schedules_nothing() {
        let mut store = MockErrorStore::new();
        store
            .expect_add()
            .returning(|_| Err(PersistenceError::OperationFailed("database is locked".into())));
        store.expect_find_last().never();
        let mut notifier = plain_notifier();
        notifier.expect_send().never();

        let pipeline = pipeline(store, notifier);
        let result = pipeline.submit(report()).await;

        assert!(matches!(result, Err(IntakeError::Persistence(_))));
        assert_eq!(pipeline.in_flight(), 0);
        pipeline.drain().await;
    }

    #[tokio::test]
    async fn test_first_error_is_sent_and_marked_alerted() {
        let mut store = MockErrorStore::new();
        store
            .expect_find_last()
            .with(eq("billing"), eq("charge"), eq(true))
            .times(1)
            .returning(|_, _, _| Ok(None));
        store.expect_update().withf(|r| r.alerted).times(1).returning(|_| Ok(()));
        let mut notifier = plain_notifier();
        notifier
            .expect_send()
            .withf(|title, body| {
                title.contains("Error alert")
                    && body.contains("trace_id: abc")
                    && !body.contains("xyz")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let pipeline = pipeline(store, notifier);
        let record = ErrorRecord::from_report(report(), t0());

        assert_eq!(pipeline.evaluate(record).await, AlertOutcome::Sent);
    }

    #[tokio::test]
    async fn test_error_within_cooldown_is_suppressed() {
        let mut store = MockErrorStore::new();
        store.expect_find_last().returning(|service, operation, _| {
            Ok(Some(ErrorRecordBuilder::new(service, operation).alerted(true).created_at(t0()).build()))
        });
        store.expect_update().never();
        let mut notifier = plain_notifier();
        notifier.expect_send().never();

        let pipeline = pipeline(store, notifier);
        let record = ErrorRecord::from_report(report(), t0() + chrono::Duration::minutes(2));

        assert_eq!(pipeline.evaluate(record).await, AlertOutcome::Suppressed);
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_without_sending() {
        let mut store = MockErrorStore::new();
        store
            .expect_find_last()
            .returning(|_, _, _| Err(PersistenceError::OperationFailed("disk I/O error".into())));
        store.expect_update().never();
        let mut notifier = plain_notifier();
        notifier.expect_send().never();

        let pipeline = pipeline(store, notifier);
        let record = ErrorRecord::from_report(report(), t0());

        assert_eq!(pipeline.evaluate(record).await, AlertOutcome::LookupFailed);
    }

    #[tokio::test]
    async fn test_send_failure_leaves_record_unalerted() {
        let mut store = MockErrorStore::new();
        store.expect_find_last().returning(|_, _, _| Ok(None));
        store.expect_update().never();
        let mut notifier = plain_notifier();
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Err(NotificationError::NotifyFailed("status 502".into())));

        let pipeline = pipeline(store, notifier);
        let record = ErrorRecord::from_report(report(), t0());

        assert_eq!(pipeline.evaluate(record).await, AlertOutcome::SendFailed);
    }

    #[tokio::test]
    async fn test_update_failure_after_send_is_reported() {
        let mut store = MockErrorStore::new();
        store.expect_find_last().returning(|_, _, _| Ok(None));
        store
            .expect_update()
            .times(1)
            .returning(|r| Err(PersistenceError::NotFound(r.id.clone())));
        let mut notifier = plain_notifier();
        notifier.expect_send().times(1).returning(|_, _| Ok(()));

        let pipeline = pipeline(store, notifier);
        let record = ErrorRecord::from_report(report(), t0());

        assert_eq!(pipeline.evaluate(record).await, AlertOutcome::UpdateFailed);
    }

    #[tokio::test]
    async fn test_shutdown_reports_timeout_with_pending_work() {
        let mut store = MockErrorStore::new();
        store.expect_add().returning(|_| Ok(()));
        store.expect_find_last().returning(|_, _, _| Ok(None));
        store.expect_update().returning(|_| Ok(()));
        let mut notifier = plain_notifier();
        notifier.expect_send().returning(|_, _| Ok(()));

        let pipeline = pipeline(store, notifier);
        // Holding the key lock keeps the evaluation from finishing.
        let lock = pipeline.inner.get_key_lock(&ThrottleKey::new("billing", "charge"));
        let guard = lock.lock().await;

        pipeline.submit(report()).await.unwrap();
        assert!(!pipeline.shutdown(Duration::from_millis(50)).await);

        drop(guard);
        assert!(pipeline.shutdown(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_cooldown_is_measured_when_evaluation_runs() {
        let mut store = MockErrorStore::new();
        store.expect_add().returning(|_| Ok(()));
        store.expect_find_last().returning(|service, operation, _| {
            Ok(Some(ErrorRecordBuilder::new(service, operation).alerted(true).created_at(t0()).build()))
        });
        store.expect_update().times(1).returning(|_| Ok(()));
        let mut notifier = plain_notifier();
        notifier.expect_send().times(1).returning(|_, _| Ok(()));

        let clock = Arc::new(ManualClock::new(t0() + chrono::Duration::seconds(299)));
        let pipeline = pipeline_with_clock(store, notifier, clock.clone());
        // The evaluation waits on the key lock until the cooldown has passed.
        let lock = pipeline.inner.get_key_lock(&ThrottleKey::new("billing", "charge"));
        let guard = lock.lock().await;

        let record = pipeline.submit(report()).await.unwrap();
        assert_eq!(record.created_at, t0() + chrono::Duration::seconds(299));
        clock.set(t0() + chrono::Duration::seconds(301));
        drop(guard);
        pipeline.drain().await;
    }

    #[tokio::test]
    async fn test_key_locks_are_released_after_drain() {
        let mut store = MockErrorStore::new();
        store.expect_add().returning(|_| Ok(()));
        store.expect_find_last().returning(|_, _, _| Ok(None));
        store.expect_update().returning(|_| Ok(()));
        let mut notifier = plain_notifier();
        notifier.expect_send().returning(|_, _| Ok(()));

        let pipeline = pipeline(store, notifier);
        for i in 0..50 {
            let mut report = report();
            report.operation = format!("op-{i}");
            pipeline.submit(report.clone()).await.unwrap();
            pipeline.submit(report).await.unwrap();
        }
        pipeline.drain().await;

        assert!(pipeline.inner.key_locks.is_empty());
    }
}
