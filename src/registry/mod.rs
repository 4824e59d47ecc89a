//! # Handler Registry Infrastructure
//!
//! Handler providers and the registry that routes events to them.
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── EventHandler          (provider capability, explicit declarations)
//! ├── HandlerDeclarations   (typed and wildcard callbacks, in order)
//! └── HandlerRegistry       (ordered providers → immutable HandlerMap)
//! ```

pub mod handler;
pub mod handler_registry;

// Re-export main types for easy access
pub use handler::{
    DeclaredHandler, EventHandler, Handled, HandlerDeclarations, HandlerError, HandlerFn,
    HandlerKey, HandlerResult,
};
pub use handler_registry::{HandlerEntry, HandlerMap, HandlerRegistry, RegistryStats};
