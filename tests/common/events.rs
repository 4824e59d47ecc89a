//! Event types shared by the integration tests.

use dispatch_core::{Event, QueueItem};
use std::any::TypeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping(pub u32);
impl Event for Ping {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub body: String,
}
impl Event for Message {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub available: bool,
}
impl Event for Presence {
    fn event_name(&self) -> &'static str {
        "presence"
    }
}

/// Concrete event types used to build test traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ping,
    Message,
    Presence,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Ping, EventKind::Message, EventKind::Presence];

    /// Build a queue item of this kind carrying `seq`
    pub fn item(self, seq: u32) -> QueueItem {
        match self {
            EventKind::Ping => QueueItem::event(Ping(seq)),
            EventKind::Message => QueueItem::event(Message {
                body: format!("message {seq}"),
            }),
            EventKind::Presence => QueueItem::event(Presence {
                available: seq % 2 == 0,
            }),
        }
    }

    pub fn routing_type(self) -> TypeId {
        match self {
            EventKind::Ping => TypeId::of::<Ping>(),
            EventKind::Message => TypeId::of::<Message>(),
            EventKind::Presence => TypeId::of::<Presence>(),
        }
    }
}
