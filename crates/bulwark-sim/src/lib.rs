//! Bulwark sim -- tower-defense behavior on top of [`bulwark_core`].
//!
//! This crate provides the simulation driver and the gameplay components: a
//! fixed-timestep [`TickLoop`](tick::TickLoop), pluggable physics backends,
//! a priority [`TaskScheduler`](ai::TaskScheduler) with chase, path,
//! waypoint and patrol tasks, and the projectile and interception
//! components in [`combat`].
//!
//! # Quick Start
//!
//! ```
//! use bulwark_sim::prelude::*;
//!
//! let mut world = World::new();
//! let shell = world
//!     .create(
//!         ObjectBuilder::new("shell")
//!             .body(Body::new(ColliderShape::Circle { radius: 0.1 }))
//!             .component(ProjectileComponent::new(Vec2::new(10.0, 0.0), 0.1).unwrap()),
//!     )
//!     .unwrap();
//! world.register(shell);
//!
//! let config = TickConfig { fixed_dt: 0.2, ..Default::default() };
//! let mut tick_loop = TickLoop::new(world, config)
//!     .unwrap()
//!     .with_physics(KinematicPhysics::new());
//!
//! tick_loop.tick();
//! assert!(!tick_loop.world().contains(shell));
//! ```

#![deny(unsafe_code)]

pub mod ai;
pub mod combat;
pub mod config;
pub mod physics;
pub mod tick;

/// Re-export the core crate for convenience.
pub use bulwark_core;

/// Install a `tracing` subscriber for binaries and demos.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Does nothing if
/// a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use bulwark_core::prelude::*;

    pub use crate::ai::chase::ChaseTask;
    pub use crate::ai::movement::MoveToPoint;
    pub use crate::ai::path::PathFollowingTask;
    pub use crate::ai::patrol::PatrolTask;
    pub use crate::ai::waypoint::{rebind_and_snap, WaypointComponent, WaypointTask};
    pub use crate::ai::{Task, TaskScheduler, TaskStatus};

    pub use crate::combat::{
        spawn_interceptor, AntiProjectileShooterComponent, DestroyOnHitComponent,
        InterceptOnHitComponent, ProjectileComponent, INTERCEPTOR_POOL, INTERCEPTOR_TAG,
    };

    pub use crate::config::{
        ChaseConfig, ConfigError, InterceptConfig, PathConfig, PatrolConfig, ProjectileConfig,
        ShooterConfig, SimConfig, TickConfig,
    };
    pub use crate::physics::{KinematicPhysics, PhysicsBackend, RapierPhysics};
    pub use crate::tick::{TickDiagnostics, TickLoop};
}
