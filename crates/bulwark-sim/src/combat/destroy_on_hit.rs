//! Destroy the owner when it touches something on a given layer.

use std::cell::Cell;
use std::rc::Rc;

use bulwark_core::body::Body;
use bulwark_core::command::CausalReason;
use bulwark_core::component::Component;
use bulwark_core::event::{names, EventPayload, ListenerError, ListenerId};
use bulwark_core::world::ObjectContext;
use tracing::{debug, trace};

/// Listens for `collisionStart` and queues the owner's disposal when the
/// other participant is on one of `target_layers`.
///
/// Contacts addressed to an earlier incarnation of the owner (a surface with
/// a stale epoch) are ignored, as is anything after the first hit.
#[derive(Debug)]
pub struct DestroyOnHitComponent {
    target_layers: u32,
    listener: Option<ListenerId>,
    fired: Rc<Cell<bool>>,
}

impl DestroyOnHitComponent {
    pub fn new(target_layers: u32) -> Self {
        Self {
            target_layers,
            listener: None,
            fired: Rc::new(Cell::new(false)),
        }
    }

    pub fn target_layers(&self) -> u32 {
        self.target_layers
    }

    /// Whether a hit has been accepted since the last registration.
    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }
}

impl Component for DestroyOnHitComponent {
    fn create(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(old) = self.listener.take() {
            ctx.remove_listener(old);
        }
        self.fired.set(false);

        let target_layers = self.target_layers;
        let fired = Rc::clone(&self.fired);
        self.listener = ctx.add_listener(names::COLLISION_START, move |ctx, payload| {
            let EventPayload::Contact(contact) = payload else {
                return Err(ListenerError::unexpected_payload(
                    names::COLLISION_START,
                    payload,
                ));
            };
            if ctx.body().and_then(Body::surface) != Some(contact.own) {
                trace!(object = %ctx.id(), "stale contact ignored");
                return Ok(());
            }
            if contact.other_layer & target_layers == 0 || fired.get() {
                return Ok(());
            }
            fired.set(true);
            let id = ctx.id();
            debug!(object = %id, other = %contact.other.owner, "destroyed on hit");
            ctx.commands()
                .dispose(id, CausalReason::CollisionResponse(id, contact.other.owner));
            Ok(())
        });
    }

    fn dispose(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(listener) = self.listener.take() {
            ctx.remove_listener(listener);
        }
    }
}
