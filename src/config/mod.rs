//! # Dispatcher Configuration
//!
//! The two options the dispatch core recognises, and the settings object that
//! owns the session's event queue.
//!
//! ## Architecture
//!
//! - [`DispatcherConfig`] holds `event_queue_max_size`; it can be built in
//!   code, read from the environment, or loaded from layered sources with
//!   [`ConfigLoader`]
//! - [`EventSettings`] pairs a config with the `event_queue` option: the queue
//!   is created from `event_queue_max_size` on first use and then reused for
//!   as long as the settings object lives
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::config::{DispatcherConfig, EventSettings};
//! use std::sync::Arc;
//!
//! let settings = EventSettings::new(DispatcherConfig::with_max_size(64));
//! let queue = settings.event_queue();
//! assert_eq!(queue.capacity(), Some(64));
//! assert!(Arc::ptr_eq(&queue, &settings.event_queue()));
//! ```

pub mod error;
pub mod loader;

use crate::constants::{system, MAX_EVENT_QUEUE_SIZE};
use crate::events::EventQueue;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Options recognised by the dispatch core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Bound on the event queue; `None` means unbounded
    pub event_queue_max_size: Option<usize>,
}

impl DispatcherConfig {
    /// Config with a bounded event queue
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            event_queue_max_size: Some(max_size),
        }
    }

    /// Read the config from process environment variables.
    ///
    /// `DISPATCH_EVENT_QUEUE_MAX_SIZE` may be unset, empty or `none` for an
    /// unbounded queue, or a non-negative integer.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Ok(max_size) = std::env::var(system::EVENT_QUEUE_MAX_SIZE_ENV) {
            config.event_queue_max_size =
                parse_max_size(system::EVENT_QUEUE_MAX_SIZE_ENV, &max_size)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config against hard limits
    pub fn validate(&self) -> ConfigResult<()> {
        match self.event_queue_max_size {
            Some(size) if size > MAX_EVENT_QUEUE_SIZE => Err(ConfigurationError::Validation(
                format!("event_queue_max_size {size} exceeds the maximum of {MAX_EVENT_QUEUE_SIZE}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Parse an `event_queue_max_size` value from text
pub(crate) fn parse_max_size(key: &str, raw: &str) -> ConfigResult<Option<usize>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    trimmed
        .parse::<usize>()
        .map(Some)
        .map_err(|e| ConfigurationError::invalid_value(key, raw, e.to_string()))
}

/// Build the event queue described by `config`
pub fn event_queue_factory(config: &DispatcherConfig) -> Arc<EventQueue> {
    Arc::new(EventQueue::new(config.event_queue_max_size))
}

/// Settings object owning the session's event queue
#[derive(Debug, Default)]
pub struct EventSettings {
    config: DispatcherConfig,
    event_queue: OnceLock<Arc<EventQueue>>,
}

impl EventSettings {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            event_queue: OnceLock::new(),
        }
    }

    /// Settings that use an existing queue instead of building one
    pub fn with_event_queue(config: DispatcherConfig, queue: Arc<EventQueue>) -> Self {
        let event_queue = OnceLock::new();
        // A fresh OnceLock always accepts its first value
        let _ = event_queue.set(queue);
        Self {
            config,
            event_queue,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// The `event_queue` option, built on first use and reused afterwards
    pub fn event_queue(&self) -> Arc<EventQueue> {
        Arc::clone(self.event_queue.get_or_init(|| {
            debug!(
                event_queue_max_size = ?self.config.event_queue_max_size,
                "Creating event queue"
            );
            event_queue_factory(&self.config)
        }))
    }
}
