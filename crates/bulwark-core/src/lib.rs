//! Bulwark core -- game objects, per-object event buses, and a pooled object
//! registry with deferred mutation.
//!
//! A [`World`](world::World) owns every game object. Objects carry a transform,
//! an optional physics [`Body`](body::Body), a type-keyed table of
//! [`Component`](component::Component)s, and an [`EventBus`](event::EventBus).
//! Each frame the world iterates a snapshot of its live list; anything that
//! would add to or remove from that list mid-frame is queued in the
//! [`CommandBuffer`](command::CommandBuffer) and applied once the iteration has
//! returned.
//!
//! # Quick Start
//!
//! ```
//! use bulwark_core::prelude::*;
//!
//! struct Drift(Vec2);
//!
//! impl Component for Drift {
//!     fn update(&mut self, ctx: &mut ObjectContext<'_>) {
//!         let Some(frame) = ctx.frame() else { return };
//!         let next = ctx.position() + self.0 * frame.scaled_delta();
//!         ctx.set_position(next);
//!     }
//! }
//!
//! let mut world = World::new();
//! let id = world
//!     .create(ObjectBuilder::new("mote").component(Drift(Vec2::new(2.0, 0.0))))
//!     .unwrap();
//! world.register(id);
//!
//! world.begin_frame(&ManualClock::new(0.5));
//! world.update();
//! assert_eq!(world.position(id), Some(Vec2::new(1.0, 0.0)));
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod command;
pub mod component;
pub mod event;
pub mod id;
pub mod math;
pub mod object;
pub mod time;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by object construction.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The object does not exist (disposed or never created).
    #[error("object {object} does not exist (disposed or never created)")]
    UnknownObject { object: id::ObjectId },

    /// A second component of a type already attached to the object.
    #[error("object already has a component of type '{component}'")]
    DuplicateComponent { component: &'static str },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::body::{Body, ColliderShape, CollisionContact, CollisionStart, Surface};
    pub use crate::command::{ApplyReport, CausalReason, Command, CommandBuffer, CommandKind};
    pub use crate::component::Component;
    pub use crate::event::{names, DispatchReport, EventPayload, ListenerError, ListenerId};
    pub use crate::id::ObjectId;
    pub use crate::math::Vec2;
    pub use crate::object::{GameObject, ObjectBuilder, ObjectState};
    pub use crate::time::{FrameTime, ManualClock, TimeSource};
    pub use crate::world::{ObjectContext, World};
    pub use crate::CoreError;
}
