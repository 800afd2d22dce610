//! Turrets that shoot down hostile projectiles.

use bulwark_core::body::{Body, ColliderShape};
use bulwark_core::command::CausalReason;
use bulwark_core::component::Component;
use bulwark_core::id::ObjectId;
use bulwark_core::math::Vec2;
use bulwark_core::object::ObjectBuilder;
use bulwark_core::world::{ObjectContext, World};
use bulwark_core::CoreError;
use tracing::{debug, warn};

use super::{
    approximate_radius, find_nearest_hostile, InterceptOnHitComponent, ProjectileComponent,
    INTERCEPTOR_POOL, INTERCEPTOR_TAG,
};
use crate::config::{ConfigError, ShooterConfig};

/// Fires an interceptor at the nearest hostile projectile in range whenever
/// its cooldown has elapsed.
///
/// The cooldown only restarts when a shot is fired. With nothing to shoot
/// the timer keeps running, so a projectile entering range after a quiet
/// spell is engaged on the very next tick.
#[derive(Debug)]
pub struct AntiProjectileShooterComponent {
    config: ShooterConfig,
    timer: f64,
    shots: u64,
}

impl AntiProjectileShooterComponent {
    pub fn new(config: ShooterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            timer: 0.0,
            shots: 0,
        })
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    /// Seconds accumulated since the last shot.
    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn shots_fired(&self) -> u64 {
        self.shots
    }
}

impl Component for AntiProjectileShooterComponent {
    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        let Some(frame) = ctx.frame() else {
            return;
        };
        self.timer += frame.scaled_delta();
        if self.timer < self.config.cooldown {
            return;
        }

        let origin = ctx.position();
        let Some((target, aim)) =
            find_nearest_hostile(ctx.world(), origin, self.config.range, ctx.id())
        else {
            return;
        };

        self.timer = 0.0;
        match spawn_interceptor(ctx.world_mut(), origin, aim, &self.config) {
            Ok(interceptor) => {
                self.shots += 1;
                debug!(turret = %ctx.id(), %target, %interceptor, "interceptor fired");
            }
            Err(err) => warn!(turret = %ctx.id(), error = %err, "failed to spawn interceptor"),
        }
    }
}

/// Build or recycle an interceptor at `origin` heading for `aim`, and queue
/// its registration.
///
/// Interceptors live in the [`INTERCEPTOR_POOL`]. A recycled one keeps its
/// components but takes position, velocity, lifetime, collider size and
/// overlap settings from `config`, since turrets with different configs
/// share the pool. Registration re-arms its lifetime and intercept guard.
pub fn spawn_interceptor(
    world: &mut World,
    origin: Vec2,
    aim: Vec2,
    config: &ShooterConfig,
) -> Result<ObjectId, CoreError> {
    let velocity = (aim - origin).normalized() * config.interceptor_speed;
    let scale = Vec2::new(config.interceptor_scale, config.interceptor_scale);

    let shape = ColliderShape::Circle {
        radius: approximate_radius(scale),
    };

    let id = world.obtain(INTERCEPTOR_POOL, |w| {
        let body = Body::new(shape.clone()).with_sensor(true);
        w.create(
            ObjectBuilder::new("interceptor")
                .tag(INTERCEPTOR_TAG)
                .pool_key(INTERCEPTOR_POOL)
                .scale(scale)
                .body(body)
                .component(ProjectileComponent::armed(
                    velocity,
                    config.interceptor_lifetime,
                ))
                .component(InterceptOnHitComponent::armed(config.intercept.clone())),
        )
    })?;

    let object = world
        .object_mut(id)
        .ok_or(CoreError::UnknownObject { object: id })?;
    object.set_position(origin);
    object.set_scale(scale);
    if let Some(body) = object.body_mut() {
        body.set_shape(shape);
    }
    if let Some(projectile) = object.component_mut::<ProjectileComponent>() {
        projectile.reset(velocity, config.interceptor_lifetime);
    }
    if let Some(intercept) = object.component_mut::<InterceptOnHitComponent>() {
        intercept.reconfigure(config.intercept.clone());
    }
    world
        .commands_mut()
        .register(id, CausalReason::Spawn("anti-projectile turret".to_owned()));
    Ok(id)
}
