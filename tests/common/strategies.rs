//! Proptest strategies for registry layouts and event traffic.

use super::events::EventKind;
use super::handlers::Target;
use dispatch_core::Handled;
use proptest::prelude::*;

pub fn event_kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Ping),
        Just(EventKind::Message),
        Just(EventKind::Presence),
    ]
}

pub fn target_strategy() -> impl Strategy<Value = Target> {
    prop_oneof![
        1 => Just(Target::Any),
        3 => event_kind_strategy().prop_map(Target::Kind),
    ]
}

/// Callbacks that never short-circuit
pub fn passive_callbacks_strategy() -> impl Strategy<Value = Vec<(Target, Handled)>> {
    prop::collection::vec(
        target_strategy().prop_map(|target| (target, Handled::Continue)),
        0..4,
    )
}

/// Callbacks that may short-circuit
pub fn callbacks_strategy() -> impl Strategy<Value = Vec<(Target, Handled)>> {
    prop::collection::vec(
        (target_strategy(), any::<bool>().prop_map(Handled::from)),
        0..4,
    )
}

/// Providers in registration order, each with its declared callbacks
pub fn layout_strategy(
    callbacks: impl Strategy<Value = Vec<(Target, Handled)>>,
) -> impl Strategy<Value = Vec<Vec<(Target, Handled)>>> {
    prop::collection::vec(callbacks, 0..6)
}

pub fn traffic_strategy() -> impl Strategy<Value = Vec<EventKind>> {
    prop::collection::vec(event_kind_strategy(), 0..24)
}
