//! # Events
//!
//! The event capability, the `QUIT` sentinel and the queue that carries them
//! from producers to dispatchers.

pub mod queue;
pub mod types;

// Re-export key types for convenience
pub use queue::{CompletionGuard, EventQueue, QueueError};
pub use types::{AsAny, Event, QueueItem, QUIT};
