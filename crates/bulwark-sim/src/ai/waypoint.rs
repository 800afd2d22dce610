//! Navigation along a chain of live waypoint objects.
//!
//! [`WaypointComponent`] holds the chain and the progress along it;
//! [`WaypointTask`] does the walking. Waypoints are objects rather than
//! points, so they can move or be replaced while enemies are on the way.
//!
//! When the path is regenerated, a chain can be rebound in two ways:
//! [`WaypointComponent::rebind_waypoints`] restarts at the first waypoint,
//! while [`WaypointComponent::rebind_waypoints_and_snap`] picks up at the
//! nearest waypoint, moving on to the one after it when the entity already
//! sits between the two, so rebinding never sends an enemy backward.

use std::collections::HashMap;

use bulwark_core::component::Component;
use bulwark_core::event::{names, EventPayload};
use bulwark_core::id::ObjectId;
use bulwark_core::math::Vec2;
use bulwark_core::world::{ObjectContext, World};
use tracing::debug;

use super::movement::MoveToPoint;
use super::{Task, TaskStatus};
use crate::config::{ensure_finite_vec, ensure_non_negative, ensure_positive, ConfigError};

// ---------------------------------------------------------------------------
// WaypointComponent
// ---------------------------------------------------------------------------

/// A waypoint chain and the owner's progress along it.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointComponent {
    waypoints: Vec<ObjectId>,
    index: usize,
    finished: bool,
    current_target: Option<Vec2>,
    speed: Vec2,
    base_speed: Vec2,
}

impl WaypointComponent {
    pub fn new(waypoints: Vec<ObjectId>, base_speed: Vec2) -> Result<Self, ConfigError> {
        if waypoints.is_empty() {
            return Err(ConfigError::EmptyWaypoints);
        }
        ensure_finite_vec("base_speed", base_speed)?;
        Ok(Self {
            waypoints,
            index: 0,
            finished: false,
            current_target: None,
            speed: base_speed,
            base_speed,
        })
    }

    pub fn waypoints(&self) -> &[ObjectId] {
        &self.waypoints
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    /// The waypoint being walked to, `None` once the chain is finished.
    pub fn current_waypoint(&self) -> Option<ObjectId> {
        if self.finished {
            None
        } else {
            self.waypoints.get(self.index).copied()
        }
    }

    /// Cached position of the current waypoint, refreshed every frame.
    pub fn current_target(&self) -> Option<Vec2> {
        self.current_target
    }

    /// Index after the current one, or `None` at the end of the chain.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.index + 1;
        (next < self.waypoints.len()).then_some(next)
    }

    /// Move on to the next waypoint. At the last one the chain is marked
    /// finished instead and the index stays put. Returns `true` if the index
    /// moved.
    pub fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.current_target = None;
        match self.next_index() {
            Some(next) => {
                self.index = next;
                true
            }
            None => {
                self.finished = true;
                false
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn speed(&self) -> Vec2 {
        self.speed
    }

    pub fn base_speed(&self) -> Vec2 {
        self.base_speed
    }

    /// Set the speed to `base_speed * multiplier`.
    pub fn scale_speed(&mut self, multiplier: f64) -> Result<(), ConfigError> {
        let multiplier = ensure_positive("speed multiplier", multiplier)?;
        self.speed = self.base_speed * multiplier;
        Ok(())
    }

    pub fn reset_speed(&mut self) {
        self.speed = self.base_speed;
    }

    /// Re-read the current waypoint's position through `lookup`.
    pub fn refresh_target(&mut self, lookup: impl Fn(ObjectId) -> Option<Vec2>) {
        self.current_target = self.current_waypoint().and_then(lookup);
    }

    /// Replace the chain and restart at its first waypoint.
    pub fn rebind_waypoints(&mut self, waypoints: Vec<ObjectId>) -> Result<(), ConfigError> {
        if waypoints.is_empty() {
            return Err(ConfigError::EmptyWaypoints);
        }
        self.waypoints = waypoints;
        self.index = 0;
        self.finished = false;
        self.current_target = None;
        Ok(())
    }

    /// Replace the chain and continue from the waypoint nearest to
    /// `position`, preferring the following waypoint when `position` is no
    /// farther from it than the nearest waypoint is. Waypoints `lookup`
    /// cannot place are skipped. Returns the chosen index.
    pub fn rebind_waypoints_and_snap(
        &mut self,
        waypoints: Vec<ObjectId>,
        position: Vec2,
        lookup: impl Fn(ObjectId) -> Option<Vec2>,
    ) -> Result<usize, ConfigError> {
        self.rebind_waypoints(waypoints)?;
        let placed: Vec<Option<Vec2>> = self.waypoints.iter().map(|&id| lookup(id)).collect();

        let mut nearest: Option<(usize, f64)> = None;
        for (index, point) in placed.iter().enumerate() {
            let Some(point) = point else { continue };
            let distance = position.distance(*point);
            if nearest.map_or(true, |(_, best)| distance < best) {
                nearest = Some((index, distance));
            }
        }

        let mut index = nearest.map_or(0, |(index, _)| index);
        if let (Some(current), Some(Some(next))) = (placed[index], placed.get(index + 1)) {
            if position.distance(*next) <= current.distance(*next) {
                index += 1;
            }
        }

        self.index = index;
        self.current_target = placed[index];
        Ok(index)
    }
}

impl Component for WaypointComponent {
    fn create(&mut self, ctx: &mut ObjectContext<'_>) {
        self.refresh_target(|id| ctx.world().position(id));
    }

    fn early_update(&mut self, ctx: &mut ObjectContext<'_>) {
        self.refresh_target(|id| ctx.world().position(id));
    }
}

/// Snap-rebind the chain of `owner` using waypoint positions from `world`.
/// `Ok(None)` if the owner has no [`WaypointComponent`].
pub fn rebind_and_snap(
    world: &mut World,
    owner: ObjectId,
    waypoints: Vec<ObjectId>,
) -> Result<Option<usize>, ConfigError> {
    let Some(position) = world.position(owner) else {
        return Ok(None);
    };
    let positions: HashMap<ObjectId, Vec2> = waypoints
        .iter()
        .filter_map(|&id| world.position(id).map(|p| (id, p)))
        .collect();
    let Some(chain) = world.component_mut::<WaypointComponent>(owner) else {
        return Ok(None);
    };
    let index =
        chain.rebind_waypoints_and_snap(waypoints, position, |id| positions.get(&id).copied())?;
    debug!(object = %owner, index, "waypoint chain snapped");
    Ok(Some(index))
}

// ---------------------------------------------------------------------------
// WaypointTask
// ---------------------------------------------------------------------------

/// Walks the owner's [`WaypointComponent`] chain at the chain's current
/// speed and raises `pathComplete` at the end.
#[derive(Debug)]
pub struct WaypointTask {
    priority: i32,
    arrival_radius: f64,
    status: TaskStatus,
    mover: Option<MoveToPoint>,
}

impl WaypointTask {
    pub fn new(priority: i32, arrival_radius: f64) -> Result<Self, ConfigError> {
        ensure_non_negative("waypoint arrival_radius", arrival_radius)?;
        Ok(Self {
            priority,
            arrival_radius,
            status: TaskStatus::Inactive,
            mover: None,
        })
    }

    fn finish(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(mover) = self.mover.take() {
            mover.halt(ctx);
        }
        self.status = TaskStatus::Finished;
        let at = ctx.position();
        debug!(object = %ctx.id(), "waypoint chain complete");
        ctx.trigger(names::PATH_COMPLETE, &EventPayload::Point(at));
    }
}

impl Task for WaypointTask {
    fn name(&self) -> &str {
        "waypoints"
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn priority(&self, _status: TaskStatus, ctx: &ObjectContext<'_>) -> i32 {
        match ctx.component::<WaypointComponent>() {
            Some(chain) if !chain.is_finished() => self.priority,
            _ => -1,
        }
    }

    fn start(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.status = TaskStatus::Active;
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        let Some(chain) = ctx.component::<WaypointComponent>() else {
            return;
        };
        if chain.is_finished() {
            self.finish(ctx);
            return;
        }
        let Some(target) = chain.current_target() else {
            return;
        };
        let speed = chain.speed();

        let arrival_radius = self.arrival_radius;
        let mover = self
            .mover
            .get_or_insert_with(|| MoveToPoint::with_axis_speed(target, speed, arrival_radius));
        mover.retarget(target);
        mover.set_speed(speed);
        if !mover.update(ctx) {
            return;
        }

        let next = ctx.component_mut::<WaypointComponent>().map(|chain| {
            chain.advance();
            chain.current_waypoint()
        });
        match next {
            Some(Some(waypoint)) => {
                let position = ctx.world().position(waypoint);
                if let Some(chain) = ctx.component_mut::<WaypointComponent>() {
                    chain.refresh_target(|_| position);
                }
            }
            Some(None) => self.finish(ctx),
            None => {}
        }
    }

    fn stop(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(mover) = self.mover.take() {
            mover.halt(ctx);
        }
        self.status = TaskStatus::Inactive;
    }
}
