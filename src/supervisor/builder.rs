//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use super::{Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    engine::{Clock, IntakePipeline, SystemClock},
    notification::{AlertRenderer, Notifier, build_notifier},
    persistence::SqliteErrorStore,
};

/// A builder for creating a `Supervisor` instance.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    store: Option<Arc<SqliteErrorStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the error store (database connection) for the `Supervisor`.
    pub fn store(mut self, store: Arc<SqliteErrorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the notifier. When unset, one is built from the `notifier`
    /// configuration section.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Overrides the clock used to timestamp incoming errors.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let store = self.store.ok_or(SupervisorError::MissingStore)?;

        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => build_notifier(&config.notifier, &config.http_base_config)?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let renderer = AlertRenderer::new(&config.environment, &config.alert.visible_details);
        let pipeline = IntakePipeline::new(
            Arc::clone(&store) as _,
            notifier,
            renderer,
            config.alert.cooldown,
            clock,
        );

        Ok(Supervisor::new(config, store, pipeline))
    }
}
