//! Handler providers shared by the integration tests.

use super::events::{EventKind, Message, Ping, Presence};
use dispatch_core::{Event, EventHandler, Handled, HandlerDeclarations, HandlerResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared record of handler invocations, as "provider:handler"
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().clone()
}

/// What a recording callback is declared for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Kind(EventKind),
    Any,
}

impl Target {
    pub fn matches(self, kind: EventKind) -> bool {
        match self {
            Target::Any => true,
            Target::Kind(target) => target == kind,
        }
    }
}

/// Provider whose callbacks append to a [`CallLog`] and return fixed outcomes
pub struct RecordingHandler {
    name: String,
    callbacks: Vec<(Target, Handled)>,
    log: CallLog,
}

impl RecordingHandler {
    pub fn new(name: &str, callbacks: Vec<(Target, Handled)>, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            callbacks,
            log: Arc::clone(log),
        })
    }

    /// Name a callback is logged under
    pub fn entry(&self, index: usize) -> String {
        format!("{}:cb{}", self.name, index)
    }

    fn record(&self, index: usize, outcome: Handled) -> HandlerResult {
        self.log.lock().push(self.entry(index));
        Ok(outcome)
    }
}

impl EventHandler for RecordingHandler {
    fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations) {
        for (index, (target, outcome)) in self.callbacks.iter().copied().enumerate() {
            let this = Arc::clone(&self);
            let name = format!("cb{index}");
            match target {
                Target::Any => {
                    handlers.on_any(&name, move |_: &dyn Event| this.record(index, outcome));
                }
                Target::Kind(EventKind::Ping) => {
                    handlers.on::<Ping, _>(&name, move |_| this.record(index, outcome));
                }
                Target::Kind(EventKind::Message) => {
                    handlers.on::<Message, _>(&name, move |_| this.record(index, outcome));
                }
                Target::Kind(EventKind::Presence) => {
                    handlers.on::<Presence, _>(&name, move |_| this.record(index, outcome));
                }
            }
        }
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Provider that fails on every `Ping`
pub struct FailingHandler {
    name: String,
    log: CallLog,
}

impl FailingHandler {
    pub fn new(name: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: Arc::clone(log),
        })
    }
}

impl EventHandler for FailingHandler {
    fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations) {
        let this = Arc::clone(&self);
        handlers.on::<Ping, _>("explode", move |ping| {
            this.log.lock().push(format!("{}:explode", this.name));
            Err(anyhow::anyhow!("ping {} rejected", ping.0))
        });
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Provider declaring two callbacks under the same name
pub struct DuplicateNameHandler;

impl EventHandler for DuplicateNameHandler {
    fn declare_handlers(self: Arc<Self>, handlers: &mut HandlerDeclarations) {
        handlers
            .on::<Ping, _>("on_event", |_| Ok(Handled::Continue))
            .on_any("on_event", |_| Ok(Handled::Continue));
    }

    fn handler_name(&self) -> &str {
        "duplicate"
    }
}

/// Erase a concrete provider to the registry's provider type
pub fn provider<H: EventHandler>(handler: &Arc<H>) -> Arc<dyn EventHandler> {
    handler.clone()
}
