//! rapier2d backend.
//!
//! The rapier world is a mirror of the object bodies, rebuilt incrementally
//! each step:
//!
//! 1. Mirrors whose object left the live list, or whose surface epoch no
//!    longer matches, are removed.
//! 2. Every live object with a body and a surface is inserted or re-synced
//!    (translation, velocity, CCD, enabled flag, collision groups).
//! 3. rapier steps with the given dt.
//! 4. Collision-started events are collected, mapped back to surfaces, and
//!    sorted by owner id.
//! 5. Translations of enabled bodies are written back to the objects.
//!
//! Bodies are kinematic and velocity-based: gameplay code owns velocities and
//! rapier contributes contact detection and CCD, not a collision response.
//! rapier2d is compiled with `enhanced-determinism`.

use std::collections::HashMap;

use bulwark_core::body::{Body, ColliderShape, CollisionStart, Surface};
use bulwark_core::id::ObjectId;
use bulwark_core::math::Vec2;
use bulwark_core::world::World;
use rapier2d::prelude::*;
use tracing::trace;

use super::PhysicsBackend;

struct Mirror {
    body: RigidBodyHandle,
    surface: Surface,
}

/// A rapier2d world kept in sync with the object bodies.
pub struct RapierPhysics {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    mirrors: HashMap<ObjectId, Mirror>,
    /// Collider -> (surface, layer bits) for contact lookup.
    colliders: HashMap<ColliderHandle, (Surface, u32)>,
}

impl RapierPhysics {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, 0.0],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            mirrors: HashMap::new(),
            colliders: HashMap::new(),
        }
    }

    /// Number of rapier bodies currently mirrored.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn is_mirrored(&self, id: ObjectId) -> bool {
        self.mirrors.contains_key(&id)
    }

    fn insert(&mut self, id: ObjectId, position: Vec2, body: &Body, surface: Surface) {
        let rb = RigidBodyBuilder::kinematic_velocity_based()
            .translation(vector![position.x as Real, position.y as Real])
            .linvel(vector![body.velocity().x as Real, body.velocity().y as Real])
            .ccd_enabled(body.is_fast_moving())
            .enabled(body.is_active())
            .user_data(u128::from(id.to_raw()))
            .build();
        let handle = self.rigid_body_set.insert(rb);

        let shape = match body.shape() {
            ColliderShape::Box {
                half_width,
                half_height,
            } => SharedShape::cuboid(*half_width as Real, *half_height as Real),
            ColliderShape::Circle { radius } => SharedShape::ball(*radius as Real),
        };
        let collider = ColliderBuilder::new(shape)
            .sensor(body.is_sensor())
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(body.layer()),
                Group::from_bits_truncate(body.mask()),
            ))
            .active_collision_types(ActiveCollisionTypes::all())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.colliders
            .insert(collider_handle, (surface, body.layer()));
        self.mirrors.insert(
            id,
            Mirror {
                body: handle,
                surface,
            },
        );
        trace!(object = %id, epoch = surface.epoch, "rapier body inserted");
    }

    fn remove(&mut self, id: ObjectId) {
        let Some(mirror) = self.mirrors.remove(&id) else {
            return;
        };
        self.rigid_body_set.remove(
            mirror.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.colliders.retain(|_, (surface, _)| surface.owner != id);
        trace!(object = %id, "rapier body removed");
    }

    fn sync(&mut self, world: &World) {
        let mut stale: Vec<ObjectId> = self
            .mirrors
            .iter()
            .filter(|(id, mirror)| {
                !world.is_live(**id)
                    || world.body(**id).and_then(Body::surface) != Some(mirror.surface)
            })
            .map(|(id, _)| *id)
            .collect();
        stale.sort();
        for id in stale {
            self.remove(id);
        }

        for &id in world.live_ids() {
            let Some(object) = world.object(id) else {
                continue;
            };
            let Some(body) = object.body() else {
                continue;
            };
            let Some(surface) = body.surface() else {
                continue;
            };
            let position = object.position();
            match self.mirrors.get(&id) {
                None => self.insert(id, position, body, surface),
                Some(mirror) => {
                    if let Some(rb) = self.rigid_body_set.get_mut(mirror.body) {
                        rb.set_translation(vector![position.x as Real, position.y as Real], true);
                        rb.set_linvel(
                            vector![body.velocity().x as Real, body.velocity().y as Real],
                            true,
                        );
                        rb.enable_ccd(body.is_fast_moving());
                        rb.set_enabled(body.is_active());
                    }
                }
            }
        }
    }
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsBackend for RapierPhysics {
    fn name(&self) -> &'static str {
        "rapier2d"
    }

    fn step(&mut self, world: &mut World, dt: f64) -> Vec<CollisionStart> {
        self.sync(world);
        if dt <= 0.0 {
            return Vec::new();
        }
        self.integration_params.dt = dt as Real;

        let (collision_send, collision_recv) =
            rapier2d::crossbeam::channel::unbounded::<CollisionEvent>();
        let (force_send, _force_recv) =
            rapier2d::crossbeam::channel::unbounded::<ContactForceEvent>();
        let event_handler = ChannelEventCollector::new(collision_send, force_send);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &event_handler,
        );

        let mut collisions = Vec::new();
        while let Ok(event) = collision_recv.try_recv() {
            if let CollisionEvent::Started(h1, h2, _flags) = event {
                let a = self.colliders.get(&h1).copied();
                let b = self.colliders.get(&h2).copied();
                if let (Some((a, a_layer)), Some((b, b_layer))) = (a, b) {
                    collisions.push(CollisionStart {
                        a,
                        b,
                        a_layer,
                        b_layer,
                    });
                }
            }
        }
        // Channel delivery order is not stable across runs.
        collisions.sort_by_key(|c| {
            let a = c.a.owner.to_raw();
            let b = c.b.owner.to_raw();
            (a.min(b), a.max(b))
        });

        for (&id, mirror) in &self.mirrors {
            let Some(rb) = self.rigid_body_set.get(mirror.body) else {
                continue;
            };
            if !rb.is_enabled() {
                continue;
            }
            let translation = rb.translation();
            if let Some(object) = world.object_mut(id) {
                object.set_position(Vec2::new(translation.x as f64, translation.y as f64));
            }
        }

        collisions
    }
}
