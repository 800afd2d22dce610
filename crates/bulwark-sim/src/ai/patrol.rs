//! Idle wandering around a home point.

use std::f64::consts::TAU;

use bulwark_core::math::Vec2;
use bulwark_core::world::ObjectContext;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::movement::MoveToPoint;
use super::{Task, TaskStatus};
use crate::config::{ConfigError, PatrolConfig};

/// Low-priority fallback that walks between random points near home.
///
/// Points come from a seeded PCG stream, so two runs with the same seed
/// wander identically. Home defaults to wherever the owner stands the first
/// time the patrol starts.
#[derive(Debug)]
pub struct PatrolTask {
    config: PatrolConfig,
    home: Option<Vec2>,
    rng: Pcg32,
    status: TaskStatus,
    mover: Option<MoveToPoint>,
    legs: u64,
}

impl PatrolTask {
    pub fn new(config: PatrolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            home: None,
            status: TaskStatus::Inactive,
            mover: None,
            legs: 0,
        })
    }

    pub fn with_home(mut self, home: Vec2) -> Self {
        self.home = Some(home);
        self
    }

    pub fn home(&self) -> Option<Vec2> {
        self.home
    }

    /// Patrol points reached or abandoned so far.
    pub fn legs(&self) -> u64 {
        self.legs
    }

    pub fn current_point(&self) -> Option<Vec2> {
        self.mover.as_ref().map(MoveToPoint::target)
    }

    fn next_point(&mut self, home: Vec2) -> Vec2 {
        let angle = self.rng.gen_range(0.0..TAU);
        let reach = self.rng.gen_range(0.0..=self.config.radius);
        home + Vec2::new(angle.cos(), angle.sin()) * reach
    }
}

impl Task for PatrolTask {
    fn name(&self) -> &str {
        "patrol"
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn priority(&self, _status: TaskStatus, _ctx: &ObjectContext<'_>) -> i32 {
        self.config.priority
    }

    fn start(&mut self, ctx: &mut ObjectContext<'_>) {
        self.status = TaskStatus::Active;
        let home = *self.home.get_or_insert(ctx.position());
        let point = self.next_point(home);
        self.mover = Some(MoveToPoint::new(
            point,
            self.config.speed,
            self.config.arrival_radius,
        ));
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        let Some(mover) = self.mover.as_mut() else {
            return;
        };
        if !mover.update(ctx) {
            return;
        }
        self.legs += 1;
        let home = self.home.unwrap_or_else(|| ctx.position());
        let point = self.next_point(home);
        if let Some(mover) = self.mover.as_mut() {
            mover.retarget(point);
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

    fn patrol(seed: u64) -> PatrolTask {
        PatrolTask::new(PatrolConfig {
            seed,
            radius: 2.0,
            speed: 4.0,
            arrival_radius: 0.1,
            ..PatrolConfig::default()
        })
        .unwrap()
    }

    fn run(seed: u64, ticks: usize) -> Vec<Vec2> {
        let mut world = World::new();
        let id = world
            .create(
                ObjectBuilder::new("sentry")
                    .at(Vec2::new(5.0, 5.0))
                    .component(TaskScheduler::new().with_task(patrol(seed))),
            )
            .unwrap();
        world.register(id);
        let clock = ManualClock::new(0.1);
        (0..ticks)
            .map(|_| {
                world.begin_frame(&clock);
                world.update();
                world.position(id).unwrap_or_default()
            })
            .collect()
    }

    #[test]
    fn same_seed_same_route() {
        assert_eq!(run(7, 60), run(7, 60));
        assert_ne!(run(7, 60), run(8, 60));
    }

    #[test]
    fn stays_near_home() {
        let home = Vec2::new(5.0, 5.0);
        for position in run(3, 200) {
            assert!(position.distance(home) <= 2.0 + 1e-9, "{position:?}");
        }
    }

    #[test]
    fn points_are_drawn_within_radius() {
        let mut task = patrol(11);
        let home = Vec2::new(-3.0, 1.0);
        for _ in 0..100 {
            assert!(task.next_point(home).distance(home) <= 2.0 + 1e-9);
        }
    }

    #[test]
    fn rejects_zero_radius() {
        let config = PatrolConfig {
            radius: 0.0,
            ..PatrolConfig::default()
        };
        assert!(PatrolTask::new(config).is_err());
    }
}
