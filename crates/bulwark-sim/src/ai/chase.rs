//! Pursuit of a moving target.

use bulwark_core::event::{names, EventPayload};
use bulwark_core::id::ObjectId;
use bulwark_core::math::Vec2;
use bulwark_core::world::ObjectContext;
use tracing::trace;

use super::movement::MoveToPoint;
use super::{Task, TaskStatus};
use crate::config::{ChaseConfig, ConfigError};

/// Chases another object, re-aiming at its current position every tick.
///
/// Eligibility has hysteresis: an idle chaser only notices a target within
/// `view_distance`, while a running chase holds on until the target is
/// beyond `max_chase_distance`. Arrival only finishes the chase after
/// `min_active_duration` seconds of simulation time, so a chase that starts
/// with the target already in reach does not complete on its first tick.
#[derive(Debug)]
pub struct ChaseTask {
    target: Option<ObjectId>,
    config: ChaseConfig,
    status: TaskStatus,
    mover: Option<MoveToPoint>,
    active_time: f64,
}

impl ChaseTask {
    pub fn new(target: Option<ObjectId>, config: ChaseConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            target,
            config,
            status: TaskStatus::Inactive,
            mover: None,
            active_time: 0.0,
        })
    }

    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<ObjectId>) {
        self.target = target;
    }

    /// Simulation seconds since the chase last started.
    pub fn active_time(&self) -> f64 {
        self.active_time
    }

    fn target_position(&self, ctx: &ObjectContext<'_>) -> Option<Vec2> {
        let target = self.target?;
        let world = ctx.world();
        if world.is_live(target) {
            world.position(target)
        } else {
            None
        }
    }
}

impl Task for ChaseTask {
    fn name(&self) -> &str {
        "chase"
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn priority(&self, status: TaskStatus, ctx: &ObjectContext<'_>) -> i32 {
        let Some(target) = self.target_position(ctx) else {
            return -1;
        };
        let distance = ctx.position().distance(target);
        let limit = match status {
            TaskStatus::Active => self.config.max_chase_distance,
            TaskStatus::Inactive | TaskStatus::Finished => self.config.view_distance,
        };
        if distance > limit {
            -1
        } else {
            self.config.priority
        }
    }

    fn start(&mut self, ctx: &mut ObjectContext<'_>) {
        self.status = TaskStatus::Active;
        self.active_time = 0.0;
        let aim = self.target_position(ctx).unwrap_or_else(|| ctx.position());
        self.mover = Some(MoveToPoint::new(
            aim,
            self.config.speed,
            self.config.arrival_radius,
        ));
        if let Some(target) = self.target {
            ctx.trigger(names::CHASE_START, &EventPayload::Object(target));
        }
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        let Some(frame) = ctx.frame() else {
            return;
        };
        if frame.is_paused() {
            return;
        }
        self.active_time += frame.scaled_delta();
        let aim = self.target_position(ctx);
        let Some(mover) = self.mover.as_mut() else {
            return;
        };
        if let Some(aim) = aim {
            mover.retarget(aim);
        }
        let arrived = mover.update(ctx);
        if arrived && self.active_time >= self.config.min_active_duration {
            trace!(object = %ctx.id(), elapsed = self.active_time, "chase reached target");
            mover.halt(ctx);
            self.mover = None;
            self.status = TaskStatus::Finished;
        }
    }

    fn stop(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(mover) = self.mover.take() {
            mover.halt(ctx);
        }
        self.status = TaskStatus::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TaskScheduler;
    use bulwark_core::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> ChaseConfig {
        ChaseConfig {
            priority: 7,
            view_distance: 5.0,
            max_chase_distance: 8.0,
            speed: 2.0,
            arrival_radius: 0.5,
            min_active_duration: 0.05,
        }
    }

    fn setup(target_at: Vec2) -> (World, ObjectId, ObjectId) {
        let mut world = World::new();
        let target = world
            .create(ObjectBuilder::new("hero").at(target_at))
            .unwrap();
        world.register(target);
        let chase = ChaseTask::new(Some(target), config()).unwrap();
        let chaser = world
            .create(ObjectBuilder::new("grunt").component(TaskScheduler::new().with_task(chase)))
            .unwrap();
        world.register(chaser);
        (world, chaser, target)
    }

    fn priority_of(
        world: &mut World,
        chaser: ObjectId,
        target: ObjectId,
        status: TaskStatus,
    ) -> i32 {
        let chase = ChaseTask::new(Some(target), config()).unwrap();
        world
            .with_context(chaser, |ctx| chase.priority(status, ctx))
            .unwrap()
    }

    #[test]
    fn priority_has_hysteresis() {
        let (mut world, chaser, target) = setup(Vec2::new(6.0, 0.0));
        assert_eq!(priority_of(&mut world, chaser, target, TaskStatus::Inactive), -1);
        assert_eq!(priority_of(&mut world, chaser, target, TaskStatus::Active), 7);

        world.object_mut(target).unwrap().set_position(Vec2::new(9.0, 0.0));
        assert_eq!(priority_of(&mut world, chaser, target, TaskStatus::Active), -1);

        world.object_mut(target).unwrap().set_position(Vec2::new(4.0, 0.0));
        assert_eq!(priority_of(&mut world, chaser, target, TaskStatus::Inactive), 7);
    }

    #[test]
    fn missing_target_is_ineligible() {
        let (mut world, chaser, target) = setup(Vec2::new(1.0, 0.0));
        world.dispose(target);
        assert_eq!(priority_of(&mut world, chaser, target, TaskStatus::Inactive), -1);
        let no_target = ChaseTask::new(None, config()).unwrap();
        let p = world
            .with_context(chaser, |ctx| no_target.priority(TaskStatus::Active, ctx))
            .unwrap();
        assert_eq!(p, -1);
    }

    #[test]
    fn start_raises_chase_start_with_target() {
        let (mut world, chaser, target) = setup(Vec2::new(3.0, 0.0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        world.add_listener(chaser, names::CHASE_START, move |_ctx, payload| {
            sink.borrow_mut().push(payload.clone());
            Ok(())
        });

        world.begin_frame(&ManualClock::new(0.1));
        world.update();
        assert_eq!(*seen.borrow(), vec![EventPayload::Object(target)]);
    }

    #[test]
    fn follows_moving_target() {
        let (mut world, chaser, target) = setup(Vec2::new(4.0, 0.0));
        let clock = ManualClock::new(0.5);
        world.begin_frame(&clock);
        world.update();

        world.object_mut(target).unwrap().set_position(Vec2::new(0.0, 4.0));
        world.begin_frame(&clock);
        world.update();
        assert_eq!(world.position(chaser), Some(Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn paused_chase_does_nothing() {
        let (mut world, chaser, _target) = setup(Vec2::new(4.0, 0.0));
        let mut clock = ManualClock::new(0.5);
        clock.time_scale = 0.0;
        for _ in 0..3 {
            world.begin_frame(&clock);
            world.update();
        }
        assert_eq!(world.position(chaser), Some(Vec2::ZERO));
        let scheduler = world.component::<TaskScheduler>(chaser).unwrap();
        assert_eq!(scheduler.status_of("chase"), Some(TaskStatus::Active));
    }

    #[test]
    fn arrival_is_ignored_until_minimum_duration() {
        let (mut world, chaser, _target) = setup(Vec2::new(0.2, 0.0));
        let clock = ManualClock::new(0.01);

        // Tick 1 starts the chase; ticks 2..=5 accumulate 0.04 s in reach.
        for _ in 0..5 {
            world.begin_frame(&clock);
            world.update();
        }
        let scheduler = world.component::<TaskScheduler>(chaser).unwrap();
        assert_eq!(scheduler.status_of("chase"), Some(TaskStatus::Active));

        let mut finished_at = None;
        for tick in 6..=8 {
            world.begin_frame(&clock);
            world.update();
            let scheduler = world.component::<TaskScheduler>(chaser).unwrap();
            if scheduler.status_of("chase") == Some(TaskStatus::Finished) {
                finished_at = Some(tick);
                break;
            }
        }
        assert!(matches!(finished_at, Some(6) | Some(7)), "{finished_at:?}");
    }
}
