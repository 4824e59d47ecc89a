//! # Loop and Flush
//!
//! Compositions of [`EventDispatcher::dispatch`] for the driving context:
//! run until `QUIT`, or drain whatever is queued right now.

use super::dispatcher::{Dispatched, EventDispatcher};
use crate::error::DispatchError;
use crate::events::QueueError;
use tracing::{debug, info};

impl EventDispatcher {
    /// Dispatch with blocking dequeues until `QUIT` is dequeued.
    ///
    /// A handler error ends the loop and is returned to the caller.
    pub fn run_loop(&self) -> Result<(), DispatchError> {
        info!("Event loop started");
        while !self.dispatch(true, None)?.is_quit() {}
        info!("Event loop stopped on QUIT");
        Ok(())
    }

    /// Drain the queue without waiting for new arrivals.
    ///
    /// With `process == true` every queued event is dispatched until the
    /// queue is empty or `QUIT` is dequeued, and that terminal value is
    /// returned. With `process == false` queued items, `QUIT` included, are
    /// dropped without touching any handler and `Dispatched::Empty` is
    /// returned.
    pub fn flush(&self, process: bool) -> Result<Dispatched, DispatchError> {
        if process {
            loop {
                let dispatched = self.dispatch(false, None)?;
                if dispatched.is_terminal() {
                    debug!(terminal = ?dispatched, "Flush finished");
                    return Ok(dispatched);
                }
            }
        }

        let mut discarded = 0usize;
        loop {
            match self.queue().dequeue(false, None) {
                Ok(_) => {
                    self.queue().completion_guard().release()?;
                    self.record_discarded();
                    discarded += 1;
                }
                Err(QueueError::Empty) => {
                    debug!(discarded = discarded, "Queue flushed without processing");
                    return Ok(Dispatched::Empty);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}
