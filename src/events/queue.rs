//! # Event Queue
//!
//! Thread-safe FIFO of [`QueueItem`]s with an optional bound, shared by every
//! producer and dispatcher of one session.
//!
//! ## Overview
//!
//! Items travel through a `crossbeam` channel (bounded or unbounded). Beside
//! the channel the queue keeps an *unfinished* counter: every successful
//! enqueue increments it and every [`EventQueue::mark_item_done`] decrements
//! it, so [`EventQueue::join`] can wait until everything enqueued so far has
//! been fully processed.
//!
//! ## Usage
//!
//! ```rust
//! use dispatch_core::events::{EventQueue, QUIT};
//!
//! let queue = EventQueue::new(Some(16));
//! queue.enqueue(QUIT, false, None).unwrap();
//!
//! let item = queue.dequeue(false, None).unwrap();
//! assert!(item.is_quit());
//! queue.mark_item_done().unwrap();
//! queue.join();
//! ```

use super::types::{Event, QueueItem};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use crossbeam::channel::{TryRecvError, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::trace;

/// Errors raised by queue operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Event queue is full")]
    Full,
    #[error("Event queue is empty")]
    Empty,
    #[error("Item completion marked more times than items were enqueued")]
    DoneOverflow,
}

/// Bounded (or unbounded) multi-producer multi-consumer event queue
pub struct EventQueue {
    sender: Sender<QueueItem>,
    receiver: Receiver<QueueItem>,
    max_size: Option<usize>,
    unfinished: Mutex<usize>,
    all_done: Condvar,
}

impl EventQueue {
    /// Create a queue holding at most `max_size` items.
    ///
    /// `None` and `Some(0)` both mean no upper limit.
    pub fn new(max_size: Option<usize>) -> Self {
        let max_size = max_size.filter(|size| *size > 0);
        let (sender, receiver) = match max_size {
            Some(size) => channel::bounded(size),
            None => channel::unbounded(),
        };

        Self {
            sender,
            receiver,
            max_size,
            unfinished: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    /// Create a queue without an upper limit
    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Insert an item at the tail of the queue.
    ///
    /// With `block == false` a full queue fails immediately with
    /// [`QueueError::Full`]. With `block == true` the call waits for room,
    /// forever when `timeout` is `None`, otherwise at most `timeout`.
    pub fn enqueue(
        &self,
        item: QueueItem,
        block: bool,
        timeout: Option<Duration>,
    ) -> Result<(), QueueError> {
        let name = item.name();

        // Count the item before it becomes visible so a fast consumer can
        // never mark it done ahead of the increment.
        *self.unfinished.lock() += 1;

        let sent = if !block {
            self.sender.try_send(item).map_err(|error| match error {
                TrySendError::Full(_) | TrySendError::Disconnected(_) => QueueError::Full,
            })
        } else if let Some(timeout) = timeout {
            self.sender
                .send_timeout(item, timeout)
                .map_err(|error| match error {
                    SendTimeoutError::Timeout(_) | SendTimeoutError::Disconnected(_) => {
                        QueueError::Full
                    }
                })
        } else {
            self.sender.send(item).map_err(|_| QueueError::Full)
        };

        match sent {
            Ok(()) => {
                trace!(event = name, queued = self.len(), "Event enqueued");
                Ok(())
            }
            Err(error) => {
                self.release_one();
                Err(error)
            }
        }
    }

    /// Remove the item at the head of the queue.
    ///
    /// Fails with [`QueueError::Empty`] when nothing becomes available within
    /// the requested mode: immediately when `block == false`, after `timeout`
    /// when one is given, never otherwise.
    pub fn dequeue(&self, block: bool, timeout: Option<Duration>) -> Result<QueueItem, QueueError> {
        if !block {
            return self.receiver.try_recv().map_err(|error| match error {
                TryRecvError::Empty | TryRecvError::Disconnected => QueueError::Empty,
            });
        }

        match timeout {
            Some(timeout) => self
                .receiver
                .recv_timeout(timeout)
                .map_err(|error| match error {
                    RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected => {
                        QueueError::Empty
                    }
                }),
            None => self.receiver.recv().map_err(|_| QueueError::Empty),
        }
    }

    /// Signal that one previously dequeued item has been fully processed.
    ///
    /// Must be called exactly once per successful [`dequeue`](Self::dequeue).
    pub fn mark_item_done(&self) -> Result<(), QueueError> {
        let mut unfinished = self.unfinished.lock();
        if *unfinished == 0 {
            return Err(QueueError::DoneOverflow);
        }
        *unfinished -= 1;
        if *unfinished == 0 {
            self.all_done.notify_all();
        }
        Ok(())
    }

    /// Take a guard that marks one dequeued item done when dropped
    pub fn completion_guard(&self) -> CompletionGuard<'_> {
        CompletionGuard {
            queue: self,
            released: false,
        }
    }

    /// Block until every enqueued item has been marked done
    pub fn join(&self) {
        let mut unfinished = self.unfinished.lock();
        while *unfinished > 0 {
            self.all_done.wait(&mut unfinished);
        }
    }

    /// Like [`join`](Self::join) but gives up after `timeout`.
    ///
    /// Returns `true` when all items were done before the deadline.
    pub fn join_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut unfinished = self.unfinished.lock();
        while *unfinished > 0 {
            if self.all_done.wait_until(&mut unfinished, deadline).timed_out() {
                return *unfinished == 0;
            }
        }
        true
    }

    /// Enqueue an event, waiting for room if necessary
    pub fn put<E: Event>(&self, event: E) -> Result<(), QueueError> {
        self.enqueue(QueueItem::event(event), true, None)
    }

    /// Enqueue an event without waiting
    pub fn try_put<E: Event>(&self, event: E) -> Result<(), QueueError> {
        self.enqueue(QueueItem::event(event), false, None)
    }

    /// Enqueue the termination sentinel, waiting for room if necessary
    pub fn quit(&self) -> Result<(), QueueError> {
        self.enqueue(QueueItem::Quit, true, None)
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Configured bound, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.max_size
    }

    /// Items enqueued but not yet marked done
    pub fn unfinished(&self) -> usize {
        *self.unfinished.lock()
    }

    fn release_one(&self) {
        let mut unfinished = self.unfinished.lock();
        *unfinished = unfinished.saturating_sub(1);
        if *unfinished == 0 {
            self.all_done.notify_all();
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .field("unfinished", &self.unfinished())
            .finish()
    }
}

/// Marks one dequeued item done exactly once, at the latest when dropped.
///
/// Dropping covers every way out of a processing scope: normal return,
/// early return, `?` propagation and unwinding.
#[must_use = "dropping the guard immediately marks the item done"]
pub struct CompletionGuard<'a> {
    queue: &'a EventQueue,
    released: bool,
}

impl CompletionGuard<'_> {
    /// Mark the item done now and report accounting errors
    pub fn release(mut self) -> Result<(), QueueError> {
        self.released = true;
        self.queue.mark_item_done()
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(error) = self.queue.mark_item_done() {
                tracing::warn!(error = %error, "Failed to mark dequeued event as done");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Debug)]
    struct Tick(u32);

    impl Event for Tick {}

    fn tick_of(item: &QueueItem) -> u32 {
        item.as_event()
            .and_then(|event| event.downcast_ref::<Tick>())
            .map(|tick| tick.0)
            .expect("expected a Tick event")
    }

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::unbounded();
        for i in 0..5 {
            queue.put(Tick(i)).unwrap();
        }

        let received: Vec<u32> = (0..5)
            .map(|_| tick_of(&queue.dequeue(false, None).unwrap()))
            .collect();
        assert_eq!(received, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_bounded_queue_rejects_when_full() {
        let queue = EventQueue::new(Some(1));
        queue.try_put(Tick(1)).unwrap();

        assert_eq!(queue.try_put(Tick(2)), Err(QueueError::Full));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.unfinished(), 1);
    }

    #[test]
    fn test_blocking_enqueue_times_out() {
        let queue = EventQueue::new(Some(1));
        queue.try_put(Tick(1)).unwrap();

        let started = Instant::now();
        let result = queue.enqueue(
            QueueItem::event(Tick(2)),
            true,
            Some(Duration::from_millis(20)),
        );
        assert_eq!(result, Err(QueueError::Full));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_zero_bound_means_unbounded() {
        let queue = EventQueue::new(Some(0));
        assert_eq!(queue.capacity(), None);
        for i in 0..100 {
            queue.try_put(Tick(i)).unwrap();
        }
        assert_eq!(queue.len(), 100);
    }

    #[test]
    fn test_dequeue_empty_non_blocking() {
        let queue = EventQueue::unbounded();
        assert_eq!(queue.dequeue(false, None).unwrap_err(), QueueError::Empty);
    }

    #[test]
    fn test_dequeue_empty_with_timeout() {
        let queue = EventQueue::unbounded();
        let result = queue.dequeue(true, Some(Duration::from_millis(10)));
        assert_eq!(result.unwrap_err(), QueueError::Empty);
    }

    #[test]
    fn test_blocking_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(EventQueue::unbounded());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.put(Tick(7)).unwrap();
            })
        };

        let item = queue.dequeue(true, None).unwrap();
        assert_eq!(tick_of(&item), 7);
        producer.join().unwrap();
    }

    #[test]
    fn test_mark_item_done_accounting() {
        let queue = EventQueue::unbounded();
        assert_eq!(queue.mark_item_done(), Err(QueueError::DoneOverflow));

        queue.put(Tick(1)).unwrap();
        assert_eq!(queue.unfinished(), 1);
        queue.dequeue(false, None).unwrap();
        assert_eq!(queue.unfinished(), 1);
        queue.mark_item_done().unwrap();
        assert_eq!(queue.unfinished(), 0);
    }

    #[test]
    fn test_completion_guard_marks_done_once() {
        let queue = EventQueue::unbounded();
        queue.put(Tick(1)).unwrap();
        queue.put(Tick(2)).unwrap();

        queue.dequeue(false, None).unwrap();
        {
            let _guard = queue.completion_guard();
        }
        assert_eq!(queue.unfinished(), 1);

        queue.dequeue(false, None).unwrap();
        queue.completion_guard().release().unwrap();
        assert_eq!(queue.unfinished(), 0);
    }

    #[test]
    fn test_join_waits_for_completion() {
        let queue = Arc::new(EventQueue::unbounded());
        queue.put(Tick(1)).unwrap();
        assert!(!queue.join_timeout(Duration::from_millis(5)));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                queue.dequeue(true, None).unwrap();
                queue.mark_item_done().unwrap();
            })
        };

        queue.join();
        assert_eq!(queue.unfinished(), 0);
        consumer.join().unwrap();
    }

    #[test]
    fn test_concurrent_producers() {
        let queue = Arc::new(EventQueue::new(Some(8)));
        let producers: Vec<_> = (0..4)
            .map(|p| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..25 {
                        queue.put(Tick(p * 100 + i)).unwrap();
                    }
                })
            })
            .collect();

        let mut received = Vec::new();
        while received.len() < 100 {
            let item = queue.dequeue(true, Some(Duration::from_secs(5))).unwrap();
            received.push(tick_of(&item));
            queue.mark_item_done().unwrap();
        }
        for producer in producers {
            producer.join().unwrap();
        }

        // Per-producer order is preserved
        for p in 0..4 {
            let from_producer: Vec<u32> = received
                .iter()
                .copied()
                .filter(|tick| tick / 100 == p)
                .collect();
            let expected: Vec<u32> = (0..25).map(|i| p * 100 + i).collect();
            assert_eq!(from_producer, expected);
        }
        assert!(queue.is_empty());
    }
}
