//! Error types for the dispatch core.

use crate::config::ConfigurationError;
use crate::events::QueueError;
use crate::registry::HandlerError;
use thiserror::Error;

/// Registration errors, raised synchronously by `add`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid event handler '{provider}': {reason}")]
    InvalidHandler { provider: String, reason: String },
}

/// Errors surfaced by `dispatch`, `run_loop` and `flush`
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler callback failed; `source` is the handler's own error
    #[error("Handler '{provider}.{handler}' failed: {source}")]
    HandlerInvocation {
        provider: String,
        handler: String,
        #[source]
        source: HandlerError,
    },
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl DispatchError {
    /// The handler's error, if this is a handler failure
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            Self::HandlerInvocation { source, .. } => Some(source),
            Self::Queue(_) => None,
        }
    }
}

/// Umbrella error for callers that drive several parts of the core
#[derive(Debug, Error)]
pub enum DispatchCoreError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type Result<T> = std::result::Result<T, DispatchCoreError>;
