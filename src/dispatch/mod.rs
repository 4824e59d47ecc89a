//! # Dispatch
//!
//! The dispatcher and the loop/flush drivers built on top of it.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::dispatch::EventDispatcher;
//! use dispatch_core::events::{Event, EventQueue};
//! use dispatch_core::registry::{EventHandler, Handled, HandlerDeclarations};
//! use std::sync::Arc;
//! use std::thread;
//!
//! #[derive(Debug)]
//! struct SessionStarted;
//! impl Event for SessionStarted {}
//!
//! struct Greeter;
//! impl EventHandler for Greeter {
//!     fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations) {
//!         handlers.on::<SessionStarted, _>("greet", |_| Ok(Handled::Consumed));
//!     }
//! }
//!
//! let queue = Arc::new(EventQueue::unbounded());
//! let greeter: Arc<dyn EventHandler> = Arc::new(Greeter);
//! let dispatcher = EventDispatcher::new(queue.clone(), vec![greeter]).unwrap();
//!
//! let producer = thread::spawn(move || {
//!     queue.put(SessionStarted).unwrap();
//!     queue.quit().unwrap();
//! });
//!
//! dispatcher.run_loop().unwrap();
//! producer.join().unwrap();
//! ```

pub mod dispatcher;
pub mod driver;

pub use dispatcher::{Dispatched, DispatcherStats, EventDispatcher};
