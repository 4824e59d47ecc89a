//! # Event Dispatcher
//!
//! Pulls one item from the event queue and routes it to the registered
//! handlers.
//!
//! ## Dispatch Protocol
//!
//! ```text
//! dequeue(block, timeout) ──► Empty ─────────────────────────► Dispatched::Empty
//!        │
//!        ├─► QUIT ──► mark done ─────────────────────────────► Dispatched::Quit
//!        │
//!        └─► event ─► resolve(TypeId) from one map snapshot
//!                     for handler in order:
//!                       ├─ Ok(Continue) ─► next handler
//!                       ├─ Ok(Consumed) ─► stop
//!                       └─ Err(e)       ─► stop, mark done ─► Err(HandlerInvocation)
//!                     mark done ─────────────────────────────► Dispatched::Event(event)
//! ```
//!
//! The dequeued item is marked done exactly once on every path, before the
//! caller sees the result or the error.

use crate::config::EventSettings;
use crate::error::{DispatchError, RegistryError};
use crate::events::{Event, EventQueue, QueueError, QueueItem};
use crate::registry::{EventHandler, Handled, HandlerRegistry};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Result of one dispatch call
#[derive(Debug, Clone)]
pub enum Dispatched {
    /// An event was dequeued and offered to its handlers
    Event(Arc<dyn Event>),
    /// The termination sentinel was dequeued
    Quit,
    /// Nothing was available within the requested mode
    Empty,
}

impl Dispatched {
    pub fn is_quit(&self) -> bool {
        matches!(self, Self::Quit)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// `Quit` and `Empty` end a flush
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Event(_))
    }

    /// The dispatched event, if one was dequeued
    pub fn event(&self) -> Option<&Arc<dyn Event>> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }
}

/// Dispatcher counters; never affect dispatch semantics
#[derive(Debug, Default)]
struct DispatchCounters {
    events_dispatched: AtomicU64,
    quits_received: AtomicU64,
    empty_polls: AtomicU64,
    handler_invocations: AtomicU64,
    events_consumed: AtomicU64,
    handler_failures: AtomicU64,
    events_discarded: AtomicU64,
}

impl DispatchCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time dispatcher statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub events_dispatched: u64,
    pub quits_received: u64,
    pub empty_polls: u64,
    pub handler_invocations: u64,
    /// Events whose handler chain was stopped by `Handled::Consumed`
    pub events_consumed: u64,
    pub handler_failures: u64,
    /// Items dropped by `flush(false)`
    pub events_discarded: u64,
}

/// Queue-backed event dispatcher
pub struct EventDispatcher {
    queue: Arc<EventQueue>,
    registry: HandlerRegistry,
    counters: DispatchCounters,
}

impl EventDispatcher {
    /// Create a dispatcher reading from `queue`, seeded with `handlers`
    pub fn new<I>(queue: Arc<EventQueue>, handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn EventHandler>>,
    {
        Ok(Self {
            queue,
            registry: HandlerRegistry::with_handlers(handlers)?,
            counters: DispatchCounters::default(),
        })
    }

    /// Create a dispatcher reading from the queue owned by `settings`
    pub fn from_settings<I>(settings: &EventSettings, handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn EventHandler>>,
    {
        Self::new(settings.event_queue(), handlers)
    }

    /// Register a handler provider; `Ok(false)` if it was already registered
    pub fn add_handler(&self, handler: Arc<dyn EventHandler>) -> Result<bool, RegistryError> {
        self.registry.add(handler)
    }

    /// Unregister a handler provider; `false` if it was not registered
    pub fn remove_handler(&self, handler: &Arc<dyn EventHandler>) -> bool {
        self.registry.remove(handler)
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dequeue one item and pass it to the matching handlers.
    ///
    /// Handler errors propagate as [`DispatchError::HandlerInvocation`]
    /// carrying the handler's error unchanged; the handlers after the failing
    /// one do not run. The returned event is the dequeued one whether or not
    /// a handler consumed it.
    pub fn dispatch(
        &self,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<Dispatched, DispatchError> {
        trace!(block = block, timeout = ?timeout, "Dispatching");

        let item = match self.queue.dequeue(block, timeout) {
            Ok(item) => item,
            Err(QueueError::Empty) => {
                trace!("Queue empty");
                DispatchCounters::bump(&self.counters.empty_polls);
                return Ok(Dispatched::Empty);
            }
            Err(error) => return Err(error.into()),
        };

        let completion = self.queue.completion_guard();
        debug!(event = item.name(), "Dispatching event");

        let outcome = match item {
            QueueItem::Quit => {
                DispatchCounters::bump(&self.counters.quits_received);
                Ok(Dispatched::Quit)
            }
            QueueItem::Event(event) => {
                DispatchCounters::bump(&self.counters.events_dispatched);
                self.invoke_handlers(&event)
                    .map(|()| Dispatched::Event(event))
            }
        };

        let released = completion.release();
        let dispatched = outcome?;
        released?;
        Ok(dispatched)
    }

    /// Run the handlers for one event, in resolved order
    fn invoke_handlers(&self, event: &Arc<dyn Event>) -> Result<(), DispatchError> {
        let handlers = self.registry.snapshot().resolve(event.event_type());
        debug!(
            event = event.event_name(),
            handlers = handlers.len(),
            "Resolved handlers"
        );

        for entry in &handlers {
            trace!(
                provider = %entry.provider_name,
                handler = %entry.handler_name,
                "Passing the event to handler"
            );
            DispatchCounters::bump(&self.counters.handler_invocations);

            match (entry.callback)(&**event) {
                Ok(Handled::Continue) => {}
                Ok(Handled::Consumed) => {
                    DispatchCounters::bump(&self.counters.events_consumed);
                    debug!(
                        event = event.event_name(),
                        provider = %entry.provider_name,
                        handler = %entry.handler_name,
                        "Event consumed by handler"
                    );
                    return Ok(());
                }
                Err(source) => {
                    DispatchCounters::bump(&self.counters.handler_failures);
                    warn!(
                        event = event.event_name(),
                        provider = %entry.provider_name,
                        handler = %entry.handler_name,
                        error = %source,
                        "Handler failed"
                    );
                    return Err(DispatchError::HandlerInvocation {
                        provider: entry.provider_name.to_string(),
                        handler: entry.handler_name.to_string(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    pub(crate) fn record_discarded(&self) {
        DispatchCounters::bump(&self.counters.events_discarded);
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        DispatcherStats {
            events_dispatched: load(&self.counters.events_dispatched),
            quits_received: load(&self.counters.quits_received),
            empty_polls: load(&self.counters.empty_polls),
            handler_invocations: load(&self.counters.handler_invocations),
            events_consumed: load(&self.counters.events_consumed),
            handler_failures: load(&self.counters.handler_failures),
            events_discarded: load(&self.counters.events_discarded),
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("queue", &self.queue)
            .field("registry", &self.registry)
            .finish()
    }
}
