//! Projectiles, turrets, and interception.
//!
//! Hostile projectiles are objects carrying a [`ProjectileComponent`]. An
//! [`AntiProjectileShooterComponent`] turret fires interceptors at the
//! nearest one in range; interceptors are projectiles too, tagged with
//! [`INTERCEPTOR_TAG`] so turrets and other interceptors ignore them, and
//! carry an [`InterceptOnHitComponent`] that destroys the first hostile
//! projectile they overlap.
//!
//! Every removal goes through the command buffer, so nothing leaves the live
//! list while the world is iterating it.

use bulwark_core::id::ObjectId;
use bulwark_core::math::Vec2;
use bulwark_core::world::World;

pub mod destroy_on_hit;
pub mod intercept;
pub mod projectile;
pub mod shooter;

pub use self::destroy_on_hit::DestroyOnHitComponent;
pub use self::intercept::InterceptOnHitComponent;
pub use self::projectile::ProjectileComponent;
pub use self::shooter::{spawn_interceptor, AntiProjectileShooterComponent};

/// Tag carried by friendly interceptors.
pub const INTERCEPTOR_TAG: &str = "interceptor";

/// Pool key interceptors are recycled under.
pub const INTERCEPTOR_POOL: &str = "interceptor";

/// Collision radius implied by an object's visual scale.
pub fn approximate_radius(scale: Vec2) -> f64 {
    scale.max_abs() * 0.5
}

/// Whether `id` is a live, unexpired projectile that is not an interceptor.
pub fn is_hostile_projectile(world: &World, id: ObjectId) -> bool {
    if !world.is_live(id) {
        return false;
    }
    let Some(object) = world.object(id) else {
        return false;
    };
    if object.has_tag(INTERCEPTOR_TAG) {
        return false;
    }
    object
        .component::<ProjectileComponent>()
        .is_some_and(|projectile| !projectile.is_expired())
}

/// Nearest hostile projectile within `range` of `from`, skipping `exclude`.
/// Ties go to the earlier-registered projectile.
pub fn find_nearest_hostile(
    world: &World,
    from: Vec2,
    range: f64,
    exclude: ObjectId,
) -> Option<(ObjectId, Vec2)> {
    let mut best: Option<(ObjectId, Vec2, f64)> = None;
    for &id in world.live_ids() {
        if id == exclude || !is_hostile_projectile(world, id) {
            continue;
        }
        let Some(position) = world.position(id) else {
            continue;
        };
        let distance = from.distance(position);
        if distance > range {
            continue;
        }
        if best.map_or(true, |(_, _, d)| distance < d) {
            best = Some((id, position, distance));
        }
    }
    best.map(|(id, position, _)| (id, position))
}

/// Stop an object's body and mark its projectile spent. Returns `false` if
/// the object is gone.
pub fn halt_projectile(world: &mut World, id: ObjectId) -> bool {
    let Some(object) = world.object_mut(id) else {
        return false;
    };
    if let Some(body) = object.body_mut() {
        body.stop();
    }
    if let Some(projectile) = object.component_mut::<ProjectileComponent>() {
        projectile.neutralize();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulwark_core::prelude::*;

    fn projectile(world: &mut World, x: f64, tag: Option<&str>) -> ObjectId {
        let mut builder = ObjectBuilder::new("shell")
            .at(Vec2::new(x, 0.0))
            .component(ProjectileComponent::new(Vec2::ZERO, 5.0).unwrap());
        if let Some(tag) = tag {
            builder = builder.tag(tag);
        }
        let id = world.create(builder).unwrap();
        world.register(id);
        id
    }

    #[test]
    fn radius_comes_from_larger_scale_axis() {
        assert_eq!(approximate_radius(Vec2::new(0.4, 1.2)), 0.6);
        assert_eq!(approximate_radius(Vec2::new(-2.0, 1.0)), 1.0);
    }

    #[test]
    fn hostility_excludes_interceptors_spent_and_parked_shells() {
        let mut world = World::new();
        let hostile = projectile(&mut world, 1.0, None);
        let friendly = projectile(&mut world, 2.0, Some(INTERCEPTOR_TAG));
        let spent = projectile(&mut world, 3.0, None);
        halt_projectile(&mut world, spent);
        let parked = projectile(&mut world, 4.0, None);
        world.unregister(parked);

        assert!(is_hostile_projectile(&world, hostile));
        assert!(!is_hostile_projectile(&world, friendly));
        assert!(!is_hostile_projectile(&world, spent));
        assert!(!is_hostile_projectile(&world, parked));
    }

    #[test]
    fn nearest_hostile_respects_range_and_exclusion() {
        let mut world = World::new();
        let near = projectile(&mut world, 2.0, None);
        let far = projectile(&mut world, 9.0, None);

        assert_eq!(
            find_nearest_hostile(&world, Vec2::ZERO, 10.0, ObjectId::new(99, 0)),
            Some((near, Vec2::new(2.0, 0.0)))
        );
        assert_eq!(
            find_nearest_hostile(&world, Vec2::ZERO, 10.0, near).map(|(id, _)| id),
            Some(far)
        );
        assert_eq!(find_nearest_hostile(&world, Vec2::ZERO, 1.0, ObjectId::new(99, 0)), None);
    }
}
