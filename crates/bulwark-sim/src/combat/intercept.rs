//! Interceptor hit detection.

use bulwark_core::command::CausalReason;
use bulwark_core::component::Component;
use bulwark_core::id::ObjectId;
use bulwark_core::world::ObjectContext;
use tracing::debug;

use super::{approximate_radius, halt_projectile, is_hostile_projectile, ProjectileComponent};
use crate::config::{ConfigError, InterceptConfig};

/// Destroys the first hostile projectile its owner overlaps, and itself
/// with it.
///
/// Overlap is a radius-sum test on scale-derived radii, so it works with or
/// without a physics backend. On a hit both objects are halted at once and
/// their pool returns are queued; the `scheduled_dispose` guard keeps the
/// interceptor from acting again until it is re-registered.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptOnHitComponent {
    config: InterceptConfig,
    scheduled_dispose: bool,
}

impl InterceptOnHitComponent {
    pub fn new(config: InterceptConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::armed(config))
    }

    pub(crate) fn armed(config: InterceptConfig) -> Self {
        Self {
            config,
            scheduled_dispose: false,
        }
    }

    pub fn is_scheduled_for_dispose(&self) -> bool {
        self.scheduled_dispose
    }

    pub fn config(&self) -> &InterceptConfig {
        &self.config
    }

    /// Swap the overlap settings, for an interceptor taken from a pool.
    pub(crate) fn reconfigure(&mut self, config: InterceptConfig) {
        self.config = config;
    }

    fn first_overlap(&self, ctx: &ObjectContext<'_>) -> Option<ObjectId> {
        let own_id = ctx.id();
        let own_position = ctx.position();
        let own_radius = approximate_radius(ctx.scale()) * self.config.radius_scale;
        let world = ctx.world();

        world.live_ids().iter().copied().find(|&other| {
            if other == own_id || !is_hostile_projectile(world, other) {
                return false;
            }
            let Some(object) = world.object(other) else {
                return false;
            };
            let reach = own_radius + approximate_radius(object.scale()) * self.config.radius_scale;
            own_position.distance(object.position()) <= reach
        })
    }
}

impl Component for InterceptOnHitComponent {
    fn create(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.scheduled_dispose = false;
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        if self.scheduled_dispose {
            return;
        }
        // An interceptor spent earlier this tick no longer hits anything.
        let spent = ctx
            .component::<ProjectileComponent>()
            .is_some_and(ProjectileComponent::is_expired);
        if spent || ctx.body().is_some_and(|body| !body.is_active()) {
            return;
        }
        let Some(target) = self.first_overlap(ctx) else {
            return;
        };

        self.scheduled_dispose = true;
        let own = ctx.id();
        let world = ctx.world_mut();
        halt_projectile(world, own);
        halt_projectile(world, target);
        let commands = world.commands_mut();
        commands.despawn(own, None, CausalReason::Interception(own, target));
        commands.despawn(target, None, CausalReason::Interception(own, target));
        debug!(interceptor = %own, %target, "projectile intercepted");
    }
}
