//! Constant-velocity projectiles with a lifetime.

use bulwark_core::command::CausalReason;
use bulwark_core::component::Component;
use bulwark_core::math::Vec2;
use bulwark_core::world::ObjectContext;
use tracing::trace;

use crate::config::{ensure_finite_vec, ensure_positive, ConfigError, ProjectileConfig};

/// Flies at a fixed velocity until its lifetime runs out.
///
/// Every registration re-arms the projectile: the lifetime restarts, the
/// velocity is applied to the body, and the body is activated and flagged
/// fast-moving. On expiry the body is stopped in the same tick and a despawn
/// is queued, which parks the object in its pool or disposes it when it has
/// no pool key. Expiry happens at most once per registration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileComponent {
    velocity: Vec2,
    lifetime: f64,
    remaining: f64,
    dead: bool,
}

impl ProjectileComponent {
    pub fn new(velocity: Vec2, lifetime: f64) -> Result<Self, ConfigError> {
        ensure_finite_vec("projectile velocity", velocity)?;
        ensure_positive("projectile lifetime", lifetime)?;
        Ok(Self::armed(velocity, lifetime))
    }

    /// A projectile flying along `direction` at the configured speed.
    pub fn from_config(direction: Vec2, config: &ProjectileConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        ensure_finite_vec("projectile direction", direction)?;
        Ok(Self::armed(direction.normalized() * config.speed, config.lifetime))
    }

    pub(crate) fn armed(velocity: Vec2, lifetime: f64) -> Self {
        Self {
            velocity,
            lifetime,
            remaining: lifetime,
            dead: false,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn lifetime(&self) -> f64 {
        self.lifetime
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.dead
    }

    /// Set the velocity and lifetime applied at the next registration.
    pub fn reset(&mut self, velocity: Vec2, lifetime: f64) {
        self.velocity = velocity;
        self.lifetime = lifetime;
        self.remaining = lifetime;
        self.dead = false;
    }

    /// Mark the projectile spent without queueing anything. Used when
    /// something else is already removing it.
    pub fn neutralize(&mut self) {
        self.dead = true;
    }
}

impl Component for ProjectileComponent {
    fn create(&mut self, ctx: &mut ObjectContext<'_>) {
        self.remaining = self.lifetime;
        self.dead = false;
        if let Some(body) = ctx.body_mut() {
            body.set_velocity(self.velocity);
            body.set_fast_moving(true);
            body.set_active(true);
        }
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        if self.dead {
            return;
        }
        let Some(frame) = ctx.frame() else {
            return;
        };
        self.remaining -= frame.scaled_delta();
        if self.remaining > 0.0 {
            return;
        }

        self.dead = true;
        if let Some(body) = ctx.body_mut() {
            body.stop();
        }
        let id = ctx.id();
        trace!(object = %id, "projectile expired");
        ctx.commands().despawn(id, None, CausalReason::LifetimeExpired);
    }
}
