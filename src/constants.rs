//! # System Constants
//!
//! Limits and environment variable names that define the operational
//! boundaries of the dispatch core.

/// Largest accepted `event_queue_max_size`
pub const MAX_EVENT_QUEUE_SIZE: usize = 1 << 20;

/// Environment variable names and prefixes
pub mod system {
    /// Prefix for layered configuration loaded from the environment
    pub const ENV_PREFIX: &str = "DISPATCH";

    /// Bound on the event queue; empty or `none` means unbounded
    pub const EVENT_QUEUE_MAX_SIZE_ENV: &str = "DISPATCH_EVENT_QUEUE_MAX_SIZE";

    /// Deployment environment, consulted before `APP_ENV`
    pub const ENVIRONMENT_ENV: &str = "DISPATCH_ENV";

    /// Generic deployment environment fallback
    pub const APP_ENVIRONMENT_ENV: &str = "APP_ENV";

    /// `json` switches console logging to JSON records
    pub const LOG_FORMAT_ENV: &str = "DISPATCH_LOG_FORMAT";
}

/// Operation names used in structured registry log records
pub mod operations {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
}
