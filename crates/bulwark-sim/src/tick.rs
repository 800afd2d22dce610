//! Fixed-timestep tick loop.
//!
//! The [`TickLoop`] drives a [`World`] forward. Each tick:
//!
//! 1. The world captures this tick's [`FrameTime`] from the loop's clock.
//! 2. Every live object's components run (early update, then update).
//! 3. The physics backend, if any, steps `fixed_dt * time_scale` seconds and
//!    each reported contact is raised as `collisionStart` on both objects.
//! 4. The command buffer is flushed (FIFO).
//! 5. The tick counter and simulation clock advance.
//!
//! Object iteration order is registration order, the command buffer is
//! FIFO, and randomness comes from seeded generators, so two loops built the
//! same way produce the same [`state_digest`](TickLoop::state_digest).
//!
//! # Example
//!
//! ```
//! use bulwark_core::prelude::*;
//! use bulwark_sim::config::TickConfig;
//! use bulwark_sim::physics::KinematicPhysics;
//! use bulwark_sim::tick::TickLoop;
//!
//! let mut tick_loop = TickLoop::new(World::new(), TickConfig::default())
//!     .unwrap()
//!     .with_physics(KinematicPhysics::new());
//!
//! tick_loop.run_ticks(10);
//! assert_eq!(tick_loop.tick_count(), 10);
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use bulwark_core::time::{FrameTime, TimeSource};
use bulwark_core::world::World;
use tracing::{debug, trace};

use crate::config::{ensure_non_negative, ConfigError, TickConfig};
use crate::physics::PhysicsBackend;

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

/// The loop's time source: a constant delta, an adjustable time scale, and a
/// clock that advances by the scaled delta each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedClock {
    delta: f64,
    time_scale: f64,
    time: f64,
}

impl FixedClock {
    fn advance(&mut self) {
        self.time += self.delta * self.time_scale;
    }
}

impl TimeSource for FixedClock {
    fn delta_time(&self) -> f64 {
        self.delta
    }

    fn time_scale(&self) -> f64 {
        self.time_scale
    }

    fn time(&self) -> f64 {
        self.time
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// What happened during the last tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickDiagnostics {
    /// Live objects after the flush.
    pub live_objects: usize,
    pub commands_applied: usize,
    pub commands_skipped: usize,
    /// Contacts reported by the physics backend.
    pub collisions: usize,
    /// Wall-clock time for the whole tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// Owns a [`World`] and an optional physics backend and advances them in
/// fixed steps.
pub struct TickLoop {
    world: World,
    physics: Option<Box<dyn PhysicsBackend>>,
    clock: FixedClock,
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a loop around `world`. Fails if `config` does not validate.
    pub fn new(world: World, config: TickConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            world,
            physics: None,
            clock: FixedClock {
                delta: config.fixed_dt,
                time_scale: config.time_scale,
                time: 0.0,
            },
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    /// Step bodies with `physics` after each component pass.
    pub fn with_physics(mut self, physics: impl PhysicsBackend + 'static) -> Self {
        self.physics = Some(Box::new(physics));
        self
    }

    /// Change the simulation speed. `0.0` pauses time-driven behavior
    /// while the loop keeps ticking.
    pub fn set_time_scale(&mut self, time_scale: f64) -> Result<(), ConfigError> {
        ensure_non_negative("tick.time_scale", time_scale)?;
        self.clock.time_scale = time_scale;
        Ok(())
    }

    pub fn time_scale(&self) -> f64 {
        self.clock.time_scale
    }

    /// Execute one tick and return its diagnostics.
    pub fn tick(&mut self) -> &TickDiagnostics {
        let tick_start = Instant::now();

        self.world.begin_frame(&self.clock);
        self.world.run_components();

        let mut collisions = 0;
        if let Some(physics) = self.physics.as_mut() {
            let dt = FrameTime::capture(&self.clock).scaled_delta();
            let contacts = physics.step(&mut self.world, dt);
            collisions = contacts.len();
            for contact in &contacts {
                let delivered = self.world.dispatch_collision(contact);
                trace!(a = %contact.a.owner, b = %contact.b.owner, delivered, "collision start");
            }
        }

        let report = self.world.flush_commands();
        self.tick_counter += 1;
        self.clock.advance();

        self.last_diagnostics = TickDiagnostics {
            live_objects: self.world.live_count(),
            commands_applied: report.applied,
            commands_skipped: report.skipped,
            collisions,
            total_time: tick_start.elapsed(),
        };
        debug!(
            tick = self.tick_counter,
            live = self.last_diagnostics.live_objects,
            applied = report.applied,
            collisions,
            "tick complete"
        );
        &self.last_diagnostics
    }

    /// Run `count` ticks and return the total number of commands applied.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut applied = 0u64;
        for _ in 0..count {
            applied += self.tick().commands_applied as u64;
        }
        applied
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Scaled simulation seconds elapsed. Paused ticks add nothing.
    pub fn sim_time(&self) -> f64 {
        self.clock.time
    }

    pub fn fixed_dt(&self) -> f64 {
        self.clock.delta
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests. During a tick,
    /// mutation goes through the command buffer.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn physics_name(&self) -> Option<&'static str> {
        self.physics.as_ref().map(|physics| physics.name())
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Digest of the world's live objects and positions.
    pub fn state_digest(&self) -> String {
        self.world.state_digest()
    }
}

impl fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_counter", &self.tick_counter)
            .field("clock", &self.clock)
            .field("physics", &self.physics_name())
            .field("live_objects", &self.world.live_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::KinematicPhysics;
    use bulwark_core::prelude::*;

    struct Drift(Vec2);

    impl Component for Drift {
        fn update(&mut self, ctx: &mut ObjectContext<'_>) {
            let Some(frame) = ctx.frame() else { return };
            let next = ctx.position() + self.0 * frame.scaled_delta();
            ctx.set_position(next);
        }
    }

    fn drifting_world(velocity: Vec2) -> (World, ObjectId) {
        let mut world = World::new();
        let id = world
            .create(ObjectBuilder::new("mote").component(Drift(velocity)))
            .unwrap();
        world.register(id);
        (world, id)
    }

    fn config(fixed_dt: f64) -> TickConfig {
        TickConfig {
            fixed_dt,
            ..TickConfig::default()
        }
    }

    #[test]
    fn new_tick_loop_starts_at_zero() {
        let tick_loop = TickLoop::new(World::new(), TickConfig::default()).unwrap();
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.sim_time(), 0.0);
        assert_eq!(tick_loop.physics_name(), None);
    }

    #[test]
    fn rejects_bad_timestep() {
        assert!(TickLoop::new(World::new(), config(0.0)).is_err());
        assert!(TickLoop::new(World::new(), config(-1.0)).is_err());
        assert!(TickLoop::new(World::new(), config(f64::INFINITY)).is_err());
    }

    #[test]
    fn components_see_fixed_delta() {
        let (world, id) = drifting_world(Vec2::new(1.0, 0.0));
        let mut tick_loop = TickLoop::new(world, config(0.25)).unwrap();
        tick_loop.run_ticks(4);
        assert_eq!(tick_loop.world().position(id), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(tick_loop.sim_time(), 1.0);
    }

    #[test]
    fn zero_time_scale_pauses_motion_but_not_ticks() {
        let (world, id) = drifting_world(Vec2::new(1.0, 0.0));
        let mut tick_loop = TickLoop::new(world, config(0.5)).unwrap();
        tick_loop.set_time_scale(0.0).unwrap();
        tick_loop.run_ticks(3);
        assert_eq!(tick_loop.tick_count(), 3);
        assert_eq!(tick_loop.sim_time(), 0.0);
        assert_eq!(tick_loop.world().position(id), Some(Vec2::ZERO));
        assert!(tick_loop.set_time_scale(-1.0).is_err());
    }

    #[test]
    fn physics_moves_bodies_and_reports_contacts() {
        let mut world = World::new();
        let mut body = Body::new(ColliderShape::Circle { radius: 0.5 });
        body.set_velocity(Vec2::new(1.0, 0.0));
        let mover = world.create(ObjectBuilder::new("mover").body(body)).unwrap();
        let wall = world
            .create(
                ObjectBuilder::new("wall")
                    .at(Vec2::new(1.5, 0.0))
                    .body(Body::new(ColliderShape::Circle { radius: 0.5 })),
            )
            .unwrap();
        world.register(mover);
        world.register(wall);

        let mut tick_loop = TickLoop::new(world, config(0.25))
            .unwrap()
            .with_physics(KinematicPhysics::new());
        assert_eq!(tick_loop.tick().collisions, 0);
        assert_eq!(tick_loop.tick().collisions, 1);
        assert_eq!(tick_loop.tick().collisions, 0, "reported once per contact");
        assert_eq!(tick_loop.world().position(mover), Some(Vec2::new(0.75, 0.0)));
    }

    #[test]
    fn diagnostics_count_flushed_commands() {
        let mut world = World::new();
        let id = world.create(ObjectBuilder::new("crate")).unwrap();
        world.register(id);
        world.commands_mut().dispose(id, CausalReason::GameRule("test".to_owned()));
        world.commands_mut().dispose(id, CausalReason::GameRule("test".to_owned()));

        let mut tick_loop = TickLoop::new(world, TickConfig::default()).unwrap();
        let diagnostics = tick_loop.tick().clone();
        assert_eq!(diagnostics.commands_applied, 1);
        assert_eq!(diagnostics.commands_skipped, 1);
        assert_eq!(diagnostics.live_objects, 0);
    }
}
