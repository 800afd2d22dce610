//! Frame timing as seen by components.
//!
//! The world captures a [`FrameTime`] from a [`TimeSource`] at the start of
//! each frame. Components read it through
//! [`ObjectContext::frame`](crate::world::ObjectContext::frame); before the
//! first frame there is no time and time-driven components do nothing.

/// Supplies per-frame timing to the world.
pub trait TimeSource {
    /// Seconds of real time since the previous frame.
    fn delta_time(&self) -> f64;
    /// Simulation speed multiplier. `0.0` means the game is paused.
    fn time_scale(&self) -> f64;
    /// Monotonic simulation clock in seconds.
    fn time(&self) -> f64;
}

/// Timing snapshot for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub delta: f64,
    pub time_scale: f64,
    pub time: f64,
}

impl FrameTime {
    pub fn capture(source: &dyn TimeSource) -> Self {
        Self {
            delta: source.delta_time(),
            time_scale: source.time_scale(),
            time: source.time(),
        }
    }

    /// Delta in simulation seconds (`delta * time_scale`).
    pub fn scaled_delta(&self) -> f64 {
        self.delta * self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.time_scale == 0.0
    }
}

/// A hand-driven clock for tests and tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualClock {
    pub delta: f64,
    pub time_scale: f64,
    pub time: f64,
}

impl ManualClock {
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            time_scale: 1.0,
            time: 0.0,
        }
    }

    /// Move the clock forward by one scaled delta.
    pub fn advance(&mut self) {
        self.time += self.delta * self.time_scale;
    }
}

impl TimeSource for ManualClock {
    fn delta_time(&self) -> f64 {
        self.delta
    }

    fn time_scale(&self) -> f64 {
        self.time_scale
    }

    fn time(&self) -> f64 {
        self.time
    }
}
