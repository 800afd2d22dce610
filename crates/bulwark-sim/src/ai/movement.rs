//! The move-toward-a-point primitive shared by every movement task.

use bulwark_core::math::Vec2;
use bulwark_core::world::ObjectContext;

/// Steers its owner toward a target point.
///
/// Owners with an active body are steered through the body velocity, so the
/// physics backend does the moving; owners without one are translated
/// directly. A step that would overshoot lands exactly on the target.
///
/// Speed is per axis, so a chain can slow horizontal and vertical movement
/// independently. [`MoveToPoint::new`] uses the same speed on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveToPoint {
    target: Vec2,
    speed: Vec2,
    arrival_radius: f64,
    arrived: bool,
}

impl MoveToPoint {
    pub fn new(target: Vec2, speed: f64, arrival_radius: f64) -> Self {
        Self::with_axis_speed(target, Vec2::new(speed, speed), arrival_radius)
    }

    pub fn with_axis_speed(target: Vec2, speed: Vec2, arrival_radius: f64) -> Self {
        Self {
            target,
            speed,
            arrival_radius,
            arrived: false,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Aim at a new point. Clears the arrival flag.
    pub fn retarget(&mut self, target: Vec2) {
        self.target = target;
        self.arrived = false;
    }

    pub fn speed(&self) -> Vec2 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Vec2) {
        self.speed = speed;
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Advance one tick. Returns `true` once the owner is within the arrival
    /// radius. Without frame timing, or while paused, nothing moves.
    pub fn update(&mut self, ctx: &mut ObjectContext<'_>) -> bool {
        let Some(frame) = ctx.frame() else {
            return self.arrived;
        };
        let dt = frame.scaled_delta();
        let position = ctx.position();
        let offset = self.target - position;
        let distance = offset.length();

        if distance <= self.arrival_radius {
            self.arrived = true;
            self.halt(ctx);
            return true;
        }
        if dt <= 0.0 {
            return false;
        }

        let direction = offset.normalized();
        let velocity = Vec2::new(direction.x * self.speed.x, direction.y * self.speed.y);
        let overshoots = (velocity * dt).length() >= distance;

        let steered = match ctx.body_mut() {
            Some(body) if body.is_active() => {
                body.set_velocity(if overshoots { offset * (1.0 / dt) } else { velocity });
                true
            }
            _ => false,
        };
        if !steered {
            let next = if overshoots {
                self.target
            } else {
                position + velocity * dt
            };
            ctx.set_position(next);
            if next.distance(self.target) <= self.arrival_radius {
                self.arrived = true;
            }
        }
        self.arrived
    }

    /// Zero the owner's body velocity, if it has a body.
    pub fn halt(&self, ctx: &mut ObjectContext<'_>) {
        if let Some(body) = ctx.body_mut() {
            body.set_velocity(Vec2::ZERO);
        }
    }
}
