//! Per-object publish/subscribe event bus.
//!
//! Every [`GameObject`](crate::object::GameObject) owns an [`EventBus`] mapping
//! event names to an ordered list of listeners. Raising an event through
//! [`World::trigger`](crate::world::World::trigger) invokes every listener
//! registered for that name, synchronously and in registration order, with an
//! [`ObjectContext`] for the owning object. Events never cross objects.
//!
//! Dispatch works on a snapshot of the listener list taken when the event is
//! raised: listeners added or removed by a running listener only affect later
//! dispatches. A listener that returns an error is logged and counted in the
//! [`DispatchReport`]; the remaining listeners still run.
//!
//! # Event contracts
//!
//! | name | payload | raised by |
//! |------|---------|-----------|
//! | [`names::COLLISION_START`] | [`EventPayload::Contact`] | world, from physics contacts |
//! | [`names::CHASE_START`] | [`EventPayload::Object`] (chased object) | chase task |
//! | [`names::ATTACK_START`] | [`EventPayload::Object`] (victim) | attack behaviors |
//! | [`names::ENTITY_DEATH`] | [`EventPayload::None`] | health behaviors |
//! | [`names::COLLECT_CURRENCY`] | [`EventPayload::Amount`] | loot behaviors |
//! | [`names::PATH_COMPLETE`] | [`EventPayload::None`] | waypoint task |
//! | [`names::DISPOSE`] | [`EventPayload::None`] | world, once per disposal |

use std::collections::HashMap;
use std::rc::Rc;

use crate::body::CollisionContact;
use crate::id::ObjectId;
use crate::math::Vec2;
use crate::world::ObjectContext;

/// Well-known event names.
pub mod names {
    pub const COLLISION_START: &str = "collisionStart";
    pub const CHASE_START: &str = "chaseStart";
    pub const ATTACK_START: &str = "attackStart";
    pub const ENTITY_DEATH: &str = "entityDeath";
    pub const COLLECT_CURRENCY: &str = "collectCurrency";
    pub const PATH_COMPLETE: &str = "pathComplete";
    pub const DISPOSE: &str = "dispose";
}

// ---------------------------------------------------------------------------
// Payloads and errors
// ---------------------------------------------------------------------------

/// Arguments carried by an event. The shape is fixed per event name.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,
    Object(ObjectId),
    Contact(CollisionContact),
    Amount(i64),
    Point(Vec2),
}

/// Failure reported by a listener.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Error for a payload that does not match the event's contract.
    pub fn unexpected_payload(event: &str, payload: &EventPayload) -> Self {
        Self(format!("unexpected payload for '{event}': {payload:?}"))
    }
}

/// Handle for removing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A type-erased event listener.
pub type Listener = Rc<dyn Fn(&mut ObjectContext<'_>, &EventPayload) -> Result<(), ListenerError>>;

/// Outcome of one [`World::trigger`](crate::world::World::trigger) call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that ran.
    pub invoked: usize,
    /// Listeners that returned an error.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Name → ordered listener list for one object.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `name`. It runs after every listener already
    /// registered for that name.
    pub fn add_listener(&mut self, name: &str, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(name.to_owned())
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        for list in self.listeners.values_mut() {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// The listeners for `name` at this instant, in registration order.
    pub fn snapshot(&self, name: &str) -> Vec<(ListenerId, Listener)> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .listeners
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ignore(_ctx: &mut ObjectContext<'_>, _payload: &EventPayload) -> Result<(), ListenerError> {
        Ok(())
    }

    fn noop() -> Listener {
        Rc::new(ignore)
    }

    #[test]
    fn listeners_keep_registration_order() {
        let mut bus = EventBus::new();
        let a = bus.add_listener("ping", noop());
        let b = bus.add_listener("ping", noop());
        let order: Vec<ListenerId> = bus.snapshot("ping").into_iter().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn remove_listener_only_once() {
        let mut bus = EventBus::new();
        let id = bus.add_listener("ping", noop());
        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));
        assert_eq!(bus.listener_count("ping"), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_changes() {
        let mut bus = EventBus::new();
        bus.add_listener("ping", noop());
        let snapshot = bus.snapshot("ping");
        bus.add_listener("ping", noop());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(bus.listener_count("ping"), 2);
    }
}
