//! # Handler Providers
//!
//! The capability a type implements to receive events from a dispatcher.
//!
//! ## Overview
//!
//! A handler provider lists its callbacks explicitly in
//! [`EventHandler::declare_handlers`]. Each callback is keyed either by a
//! concrete event type or by the wildcard [`HandlerKey::Any`], and reports an
//! explicit [`Handled`] outcome: `Consumed` stops the remaining handlers for
//! that event, `Continue` passes it on.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::events::Event;
//! use dispatch_core::registry::{EventHandler, Handled, HandlerDeclarations};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Debug)]
//! struct StanzaReceived(String);
//! impl Event for StanzaReceived {}
//!
//! #[derive(Default)]
//! struct StanzaCounter {
//!     seen: AtomicUsize,
//! }
//!
//! impl EventHandler for StanzaCounter {
//!     fn declare_handlers(self: std::sync::Arc<Self>, handlers: &mut HandlerDeclarations) {
//!         let counter = self.clone();
//!         handlers.on::<StanzaReceived, _>("count_stanza", move |_stanza| {
//!             counter.seen.fetch_add(1, Ordering::SeqCst);
//!             Ok(Handled::Continue)
//!         });
//!     }
//! }
//! ```

use crate::events::Event;
use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Error raised by a handler callback; surfaced to the dispatch caller unmodified
pub type HandlerError = anyhow::Error;

/// Result of a single handler invocation
pub type HandlerResult = Result<Handled, HandlerError>;

/// Type-erased handler callback
pub type HandlerFn = Arc<dyn Fn(&dyn Event) -> HandlerResult + Send + Sync>;

/// Outcome reported by a handler for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handled {
    /// Let the remaining handlers see the event
    Continue,
    /// The event is fully handled; skip the remaining handlers
    Consumed,
}

impl Handled {
    pub fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }
}

impl From<bool> for Handled {
    fn from(consumed: bool) -> Self {
        if consumed {
            Self::Consumed
        } else {
            Self::Continue
        }
    }
}

/// Routing key of a handler callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    /// Receives every event type
    Any,
    /// Receives events whose concrete type has this `TypeId`
    Type(TypeId),
}

impl HandlerKey {
    /// Key for events of concrete type `E`
    pub fn of<E: Event>() -> Self {
        Self::Type(TypeId::of::<E>())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// One callback declared by a provider
#[derive(Clone)]
pub struct DeclaredHandler {
    pub name: String,
    pub key: HandlerKey,
    pub event_name: &'static str,
    pub callback: HandlerFn,
}

impl fmt::Debug for DeclaredHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredHandler")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("event_name", &self.event_name)
            .field("callback", &"<HandlerFn>")
            .finish()
    }
}

/// Collects the callbacks a provider declares, in declaration order
#[derive(Debug, Default)]
pub struct HandlerDeclarations {
    handlers: Vec<DeclaredHandler>,
}

impl HandlerDeclarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a callback for events of concrete type `E`
    pub fn on<E, F>(&mut self, name: &str, callback: F) -> &mut Self
    where
        E: Event,
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: HandlerFn = Arc::new(move |event: &dyn Event| {
            match event.downcast_ref::<E>() {
                Some(event) => callback(event),
                None => Ok(Handled::Continue),
            }
        });

        self.handlers.push(DeclaredHandler {
            name: name.to_string(),
            key: HandlerKey::of::<E>(),
            event_name: std::any::type_name::<E>(),
            callback: erased,
        });
        self
    }

    /// Declare a wildcard callback receiving every event type
    pub fn on_any<F>(&mut self, name: &str, callback: F) -> &mut Self
    where
        F: Fn(&dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.push(DeclaredHandler {
            name: name.to_string(),
            key: HandlerKey::Any,
            event_name: "*",
            callback: Arc::new(callback),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclaredHandler> {
        self.handlers.iter()
    }

    /// Check the declarations are usable for routing.
    ///
    /// Callback names identify handlers in logs and errors, so they must be
    /// non-empty and unique within one provider.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(self.handlers.len());
        for handler in &self.handlers {
            if handler.name.trim().is_empty() {
                return Err(format!(
                    "handler for '{}' has an empty name",
                    handler.event_name
                ));
            }
            if !seen.insert(handler.name.as_str()) {
                return Err(format!("duplicate handler name '{}'", handler.name));
            }
        }
        Ok(())
    }

    pub(crate) fn into_handlers(self) -> Vec<DeclaredHandler> {
        self.handlers
    }
}

/// Capability of an object that owns event callbacks.
///
/// Declarations are collected once, when the provider is added to a
/// registry; the registry keeps them for as long as the provider stays
/// registered.
pub trait EventHandler: Send + Sync + 'static {
    /// Declare every callback of this provider, in the order they should run
    fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations);

    /// Provider name used in log records and errors
    fn handler_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
