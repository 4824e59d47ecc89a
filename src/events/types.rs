//! # Event Types
//!
//! The opaque event capability carried by the queue, and the queue item that
//! wraps either a real event or the `QUIT` sentinel.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::sync::Arc;

/// Object-safe access to `Any` for every sized `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Capability shared by every value that can travel through the event queue.
///
/// The concrete Rust type of an event is its routing key: handlers declared
/// for `E` receive only values whose concrete type is `E`.
pub trait Event: AsAny + Debug + Send + Sync + 'static {
    /// Human readable name used in log records
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Routing key of the concrete event value
    fn event_type(&self) -> TypeId {
        self.as_any().type_id()
    }
}

impl dyn Event {
    /// Borrow the event as its concrete type, if it is a `T`
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check whether the concrete type of the event is `T`
    pub fn is<T: Event>(&self) -> bool {
        self.event_type() == TypeId::of::<T>()
    }
}

/// A value held by the event queue: a real event or the termination sentinel.
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// A real event, routed to handlers by its concrete type
    Event(Arc<dyn Event>),
    /// Termination sentinel; never routed to handlers
    Quit,
}

/// The process-wide termination sentinel
pub const QUIT: QueueItem = QueueItem::Quit;

impl QueueItem {
    /// Wrap a concrete event
    pub fn event<E: Event>(event: E) -> Self {
        Self::Event(Arc::new(event))
    }

    /// Check if this item is the termination sentinel
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }

    /// Borrow the wrapped event, if any
    pub fn as_event(&self) -> Option<&Arc<dyn Event>> {
        match self {
            Self::Event(event) => Some(event),
            Self::Quit => None,
        }
    }

    /// Name used in log records
    pub fn name(&self) -> &'static str {
        match self {
            Self::Event(event) => event.event_name(),
            Self::Quit => "QUIT",
        }
    }
}

impl From<Arc<dyn Event>> for QueueItem {
    fn from(event: Arc<dyn Event>) -> Self {
        Self::Event(event)
    }
}
