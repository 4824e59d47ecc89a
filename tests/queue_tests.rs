//! Event Queue Integration Tests

mod common;

use common::*;
use dispatch_core::{EventQueue, QueueError, QueueItem, QUIT};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn quit_keeps_its_place_in_fifo_order() {
    let queue = EventQueue::unbounded();
    queue.put(Ping(1)).unwrap();
    queue.enqueue(QUIT, false, None).unwrap();
    queue.put(Ping(2)).unwrap();

    assert!(queue.dequeue(false, None).unwrap().as_event().is_some());
    assert!(queue.dequeue(false, None).unwrap().is_quit());
    let last = queue.dequeue(false, None).unwrap();
    assert_eq!(
        last.as_event().and_then(|event| event.downcast_ref::<Ping>()),
        Some(&Ping(2))
    );
}

#[test]
fn full_queue_with_timeout_gives_up() {
    let queue = EventQueue::new(Some(1));
    queue.put(Ping(1)).unwrap();

    let started = Instant::now();
    let result = queue.enqueue(QueueItem::event(Ping(2)), true, Some(Duration::from_millis(20)));

    assert_eq!(result, Err(QueueError::Full));
    assert!(started.elapsed() >= Duration::from_millis(20));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.unfinished(), 1);
}

#[test]
fn blocked_producer_resumes_when_room_appears() {
    let queue = Arc::new(EventQueue::new(Some(1)));
    queue.put(Ping(1)).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.put(Ping(2)))
    };

    thread::sleep(Duration::from_millis(20));
    queue.dequeue(true, None).unwrap();
    queue.mark_item_done().unwrap();

    producer.join().unwrap().unwrap();
    let second = queue.dequeue(true, Some(Duration::from_secs(5))).unwrap();
    assert_eq!(
        second.as_event().and_then(|event| event.downcast_ref::<Ping>()),
        Some(&Ping(2))
    );
}

#[test]
fn empty_queue_with_timeout_reports_empty() {
    let queue = EventQueue::unbounded();
    let started = Instant::now();

    assert_eq!(
        queue.dequeue(true, Some(Duration::from_millis(20))).unwrap_err(),
        QueueError::Empty
    );
    assert!(started.elapsed() >= Duration::from_millis(20));
}

#[test]
fn join_waits_for_consumer_to_finish() {
    let queue = Arc::new(EventQueue::unbounded());
    for seq in 0..5 {
        queue.put(Ping(seq)).unwrap();
    }

    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for _ in 0..5 {
                let _item = queue.dequeue(true, None).unwrap();
                let _done = queue.completion_guard();
                thread::sleep(Duration::from_millis(2));
            }
        })
    };

    queue.join();
    assert_eq!(queue.unfinished(), 0);
    assert!(queue.is_empty());
    consumer.join().unwrap();
}

#[test]
fn join_timeout_reports_outstanding_work() {
    let queue = EventQueue::unbounded();
    queue.put(Ping(1)).unwrap();
    assert!(!queue.join_timeout(Duration::from_millis(10)));

    queue.dequeue(false, None).unwrap();
    queue.mark_item_done().unwrap();
    assert!(queue.join_timeout(Duration::from_millis(10)));
}

#[test]
fn extra_done_is_rejected() {
    let queue = EventQueue::unbounded();
    assert_eq!(queue.mark_item_done(), Err(QueueError::DoneOverflow));
}
