//! Physics backends.
//!
//! A [`PhysicsBackend`] reads the [`Body`] settings of every live object,
//! advances positions by one step, and reports the contacts that began during
//! that step. The [`TickLoop`](crate::tick::TickLoop) turns each reported
//! [`CollisionStart`] into `collisionStart` events on both participants.
//!
//! Two backends ship with the crate:
//!
//! - [`KinematicPhysics`]: straight-line integration and bounding-circle
//!   overlap. No solver, no dependencies, exact and cheap.
//! - [`RapierPhysics`]: a rapier2d world mirrored from the object bodies, with
//!   continuous collision detection for fast-moving bodies.

use std::collections::HashSet;

use bulwark_core::body::{Body, CollisionStart, Surface};
use bulwark_core::math::Vec2;
use bulwark_core::world::World;
use tracing::trace;

mod rapier;

pub use self::rapier::RapierPhysics;

/// Steps object bodies and reports new contacts.
pub trait PhysicsBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Advance every live, active body by `dt` simulation seconds and return
    /// the contacts that started during the step, in a deterministic order.
    fn step(&mut self, world: &mut World, dt: f64) -> Vec<CollisionStart>;
}

// ---------------------------------------------------------------------------
// KinematicPhysics
// ---------------------------------------------------------------------------

/// Integrates velocities and detects bounding-circle overlaps.
///
/// A contact is reported once when two surfaces start overlapping and again
/// only after they have separated. Contacts are keyed by surface, so a pooled
/// object that comes back with a new epoch starts fresh.
#[derive(Debug, Default)]
pub struct KinematicPhysics {
    touching: HashSet<(Surface, Surface)>,
}

struct Collider {
    surface: Surface,
    position: Vec2,
    radius: f64,
    body: Body,
}

impl KinematicPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of surface pairs currently overlapping.
    pub fn contact_count(&self) -> usize {
        self.touching.len()
    }
}

impl PhysicsBackend for KinematicPhysics {
    fn name(&self) -> &'static str {
        "kinematic"
    }

    fn step(&mut self, world: &mut World, dt: f64) -> Vec<CollisionStart> {
        let ids = world.live_ids().to_vec();
        let mut colliders = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(object) = world.object_mut(id) else {
                continue;
            };
            let Some(body) = object.body().cloned() else {
                continue;
            };
            if !body.is_active() {
                continue;
            }
            let position = object.position() + body.velocity() * dt;
            object.set_position(position);
            if let Some(surface) = body.surface() {
                colliders.push(Collider {
                    surface,
                    position,
                    radius: body.shape().bounding_radius(),
                    body,
                });
            }
        }

        let mut current = HashSet::new();
        let mut started = Vec::new();
        for (i, a) in colliders.iter().enumerate() {
            for b in &colliders[i + 1..] {
                if !a.body.interacts_with(&b.body) {
                    continue;
                }
                if a.position.distance(b.position) > a.radius + b.radius {
                    continue;
                }
                let key = if a.surface <= b.surface {
                    (a.surface, b.surface)
                } else {
                    (b.surface, a.surface)
                };
                if !self.touching.contains(&key) {
                    trace!(a = %a.surface.owner, b = %b.surface.owner, "contact started");
                    started.push(CollisionStart {
                        a: a.surface,
                        b: b.surface,
                        a_layer: a.body.layer(),
                        b_layer: b.body.layer(),
                    });
                }
                current.insert(key);
            }
        }
        self.touching = current;
        started
    }
}
