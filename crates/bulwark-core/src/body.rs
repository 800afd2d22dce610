//! The physics-body contract consumed by gameplay components.
//!
//! A [`Body`] is plain data attached to a [`GameObject`](crate::object::GameObject).
//! Components drive it through [`Body::set_velocity`], [`Body::set_active`],
//! and [`Body::set_fast_moving`]; a physics backend reads those settings each
//! step and reports contacts back as [`CollisionStart`]s, which the world turns
//! into `collisionStart` events on both participants.
//!
//! Every registration of an object bumps its surface epoch, so a contact
//! reported for an earlier incarnation of a recycled object no longer matches
//! [`Body::surface`] and is rejected by listeners.

use serde::{Deserialize, Serialize};

use crate::id::ObjectId;
use crate::math::Vec2;

// ---------------------------------------------------------------------------
// ColliderShape
// ---------------------------------------------------------------------------

/// Collider geometry for a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Circle with radius.
    Circle {
        /// Radius of the circle.
        radius: f64,
    },
    /// Axis-aligned box with half-extents.
    Box {
        /// Half-width along the x-axis.
        half_width: f64,
        /// Half-height along the y-axis.
        half_height: f64,
    },
}

impl ColliderShape {
    /// Radius of the smallest circle enclosing the shape.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            ColliderShape::Circle { radius } => *radius,
            ColliderShape::Box {
                half_width,
                half_height,
            } => half_width.hypot(*half_height),
        }
    }
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Identifies one incarnation of an object's collision surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Surface {
    /// Object the surface belongs to.
    pub owner: ObjectId,
    /// Registration epoch of the owner when the surface was issued.
    pub epoch: u32,
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// Physics-body settings owned by a game object.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    velocity: Vec2,
    active: bool,
    fast_moving: bool,
    sensor: bool,
    layer: u32,
    mask: u32,
    shape: ColliderShape,
    surface: Option<Surface>,
}

impl Body {
    /// An active body on layer 1 that collides with everything.
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            velocity: Vec2::ZERO,
            active: true,
            fast_moving: false,
            sensor: false,
            layer: 1,
            mask: u32::MAX,
            shape,
            surface: None,
        }
    }

    /// Set the membership layer bits and the mask of layers it collides with.
    pub fn with_layers(mut self, layer: u32, mask: u32) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// Mark the body as a sensor (reports contacts without a physical response).
    pub fn with_sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable the body. Inactive bodies neither move nor collide.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_fast_moving(&self) -> bool {
        self.fast_moving
    }

    /// Request continuous collision detection so the body cannot tunnel
    /// through thin colliders.
    pub fn set_fast_moving(&mut self, fast_moving: bool) {
        self.fast_moving = fast_moving;
    }

    /// Zero the velocity and deactivate the body.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.active = false;
    }

    pub fn is_sensor(&self) -> bool {
        self.sensor
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Replace the collider. Physics backends pick it up at the next
    /// registration.
    pub fn set_shape(&mut self, shape: ColliderShape) {
        self.shape = shape;
    }

    /// The surface issued at the owner's latest registration, if any.
    pub fn surface(&self) -> Option<Surface> {
        self.surface
    }

    pub(crate) fn issue_surface(&mut self, surface: Surface) {
        self.surface = Some(surface);
    }

    /// Whether two bodies' layer settings allow them to interact.
    pub fn interacts_with(&self, other: &Body) -> bool {
        self.layer & other.mask != 0 && other.layer & self.mask != 0
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// A contact as seen from one participant: the payload of `collisionStart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionContact {
    /// The receiving object's own surface.
    pub own: Surface,
    /// The other participant's surface.
    pub other: Surface,
    /// Layer bits of the other participant.
    pub other_layer: u32,
}

/// A contact that began during a physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionStart {
    pub a: Surface,
    pub b: Surface,
    pub a_layer: u32,
    pub b_layer: u32,
}

impl CollisionStart {
    /// The two per-participant views of this contact, `a` first.
    pub fn contacts(&self) -> [CollisionContact; 2] {
        [
            CollisionContact {
                own: self.a,
                other: self.b,
                other_layer: self.b_layer,
            },
            CollisionContact {
                own: self.b,
                other: self.a,
                other_layer: self.a_layer,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_zeroes_and_deactivates() {
        let mut body = Body::new(ColliderShape::Circle { radius: 1.0 });
        body.set_velocity(Vec2::new(3.0, 4.0));
        body.stop();
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert!(!body.is_active());
    }

    #[test]
    fn layers_must_match_both_ways() {
        let turret_shot = Body::new(ColliderShape::Circle { radius: 1.0 }).with_layers(0b01, 0b10);
        let enemy = Body::new(ColliderShape::Circle { radius: 1.0 }).with_layers(0b10, 0b01);
        let wall = Body::new(ColliderShape::Circle { radius: 1.0 }).with_layers(0b100, 0b100);
        assert!(turret_shot.interacts_with(&enemy));
        assert!(!turret_shot.interacts_with(&wall));
    }

    #[test]
    fn box_bounding_radius_is_half_diagonal() {
        let shape = ColliderShape::Box {
            half_width: 3.0,
            half_height: 4.0,
        };
        assert_eq!(shape.bounding_radius(), 5.0);
    }

    #[test]
    fn set_shape_replaces_collider() {
        let mut body = Body::new(ColliderShape::Circle { radius: 0.2 });
        body.set_shape(ColliderShape::Circle { radius: 0.5 });
        assert_eq!(body.shape(), &ColliderShape::Circle { radius: 0.5 });
        assert_eq!(body.shape().bounding_radius(), 0.5);
    }
}
