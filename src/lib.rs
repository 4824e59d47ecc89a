#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Dispatch Core
//!
//! Queue-backed, in-process event dispatch for protocol-handling systems.
//!
//! ## Overview
//!
//! Producers place opaque events onto a shared [`EventQueue`]; handler
//! providers registered with an [`EventDispatcher`] receive them on whichever
//! thread drives dispatch. The core only moves events: it does not define
//! what they mean, performs no I/O, and never leaves the process.
//!
//! ## Architecture
//!
//! ```text
//!  producer threads                          driving thread
//!  ────────────────                          ──────────────
//!  queue.put(event) ──┐                 ┌──► dispatcher.run_loop()
//!  queue.quit()     ──┼─► EventQueue ───┤    dispatcher.flush(process)
//!                     │  (FIFO, bound)  └──► dispatcher.dispatch(block, timeout)
//!                     │                               │
//!                     │                               ▼
//!                     │                    HandlerRegistry::snapshot()
//!                     │                    resolve(TypeId) ─► [handlers in
//!                     │                                        registration order]
//!                     │                               │
//!                     │                               ▼
//!                     │                    Continue ─► next │ Consumed ─► stop
//!                     │                    Err(e)   ─► stop, propagate
//! ```
//!
//! ## Module Organization
//!
//! - [`events`] - Event capability, `QUIT` sentinel, the event queue
//! - [`registry`] - Handler providers and the handler registry
//! - [`dispatch`] - Dispatcher, loop and flush
//! - [`config`] - Queue configuration and the settings object
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use config::{ConfigLoader, ConfigurationError, DispatcherConfig, EventSettings};
pub use dispatch::{Dispatched, DispatcherStats, EventDispatcher};
pub use error::{DispatchCoreError, DispatchError, RegistryError, Result};
pub use events::{Event, EventQueue, QueueError, QueueItem, QUIT};
pub use registry::{
    EventHandler, Handled, HandlerDeclarations, HandlerError, HandlerRegistry, HandlerResult,
};
