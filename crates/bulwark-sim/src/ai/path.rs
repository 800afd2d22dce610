//! Following a fixed list of world points.

use bulwark_core::math::Vec2;
use bulwark_core::world::ObjectContext;

use super::movement::MoveToPoint;
use super::{Task, TaskStatus};
use crate::config::{ensure_finite_vec, ConfigError, PathConfig};

/// Visits each point in order, then becomes ineligible until reset.
#[derive(Debug)]
pub struct PathFollowingTask {
    points: Vec<Vec2>,
    index: usize,
    config: PathConfig,
    status: TaskStatus,
    mover: Option<MoveToPoint>,
}

impl PathFollowingTask {
    pub fn new(points: Vec<Vec2>, config: PathConfig) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        for &point in &points {
            ensure_finite_vec("path point", point)?;
        }
        config.validate()?;
        Ok(Self {
            points,
            index: 0,
            config,
            status: TaskStatus::Inactive,
            mover: None,
        })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Index of the point being walked to; equals the point count once done.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.points.len()
    }

    /// Start over from the first point.
    pub fn reset_path(&mut self) {
        self.index = 0;
        if let (Some(mover), Some(&first)) = (self.mover.as_mut(), self.points.first()) {
            mover.retarget(first);
        }
    }
}

impl Task for PathFollowingTask {
    fn name(&self) -> &str {
        "path"
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn priority(&self, _status: TaskStatus, _ctx: &ObjectContext<'_>) -> i32 {
        if self.is_exhausted() {
            -1
        } else {
            self.config.priority
        }
    }

    fn start(&mut self, _ctx: &mut ObjectContext<'_>) {
        self.status = TaskStatus::Active;
        if let Some(&point) = self.points.get(self.index) {
            self.mover = Some(MoveToPoint::new(
                point,
                self.config.speed,
                self.config.arrival_radius,
            ));
        }
    }

    fn update(&mut self, ctx: &mut ObjectContext<'_>) {
        let Some(mover) = self.mover.as_mut() else {
            self.status = TaskStatus::Finished;
            return;
        };
        if !mover.update(ctx) {
            return;
        }
        self.index += 1;
        match self.points.get(self.index) {
            Some(&next) => mover.retarget(next),
            None => {
                mover.halt(ctx);
                self.mover = None;
                self.status = TaskStatus::Finished;
            }
        }
    }

    fn stop(&mut self, ctx: &mut ObjectContext<'_>) {
        if let Some(mover) = self.mover.take() {
            mover.halt(ctx);
        }
        self.status = TaskStatus::Inactive;
    }
}
