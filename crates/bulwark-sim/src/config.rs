//! Simulation configuration.
//!
//! Every tunable lives in a serde-derived struct with sensible defaults and a
//! `validate()` method. Constructors that take a config validate it first and
//! reject bad values with a [`ConfigError`] instead of silently clamping.
//!
//! ```
//! use bulwark_sim::config::SimConfig;
//!
//! let config = SimConfig::from_json(r#"{ "tick": { "fixed_dt": 0.02 } }"#).unwrap();
//! assert_eq!(config.tick.fixed_dt, 0.02);
//! assert_eq!(config.tick.time_scale, 1.0);
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Rejection of an invalid configuration or constructor argument.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be finite, got ({x}, {y})")]
    NonFiniteVector { field: &'static str, x: f64, y: f64 },

    #[error("waypoint chain must contain at least one waypoint")]
    EmptyWaypoints,

    #[error("path must contain at least one point")]
    EmptyPath,

    #[error("failed to parse simulation config: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

pub(crate) fn ensure_finite_vec(
    field: &'static str,
    value: bulwark_core::math::Vec2,
) -> Result<bulwark_core::math::Vec2, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFiniteVector {
            field,
            x: value.x,
            y: value.y,
        })
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Fixed-timestep settings for the [`TickLoop`](crate::tick::TickLoop).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per tick.
    pub fixed_dt: f64,
    /// Simulation speed multiplier; `0.0` pauses time-driven behavior.
    pub time_scale: f64,
}

impl Default for TickConfig {
    /// 60 Hz at normal speed.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            time_scale: 1.0,
        }
    }
}

impl TickConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("tick.fixed_dt", self.fixed_dt)?;
        ensure_non_negative("tick.time_scale", self.time_scale)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AI
// ---------------------------------------------------------------------------

/// Tuning for [`ChaseTask`](crate::ai::chase::ChaseTask).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    pub priority: i32,
    /// An idle chaser notices targets within this distance.
    pub view_distance: f64,
    /// An active chase gives up beyond this distance.
    pub max_chase_distance: f64,
    pub speed: f64,
    pub arrival_radius: f64,
    /// Arrival is not honored until the chase has run this long (seconds).
    pub min_active_duration: f64,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            priority: 10,
            view_distance: 6.0,
            max_chase_distance: 9.0,
            speed: 3.0,
            arrival_radius: 0.75,
            min_active_duration: 0.05,
        }
    }
}

impl ChaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("chase.view_distance", self.view_distance)?;
        ensure_positive("chase.max_chase_distance", self.max_chase_distance)?;
        ensure_positive("chase.speed", self.speed)?;
        ensure_non_negative("chase.arrival_radius", self.arrival_radius)?;
        ensure_non_negative("chase.min_active_duration", self.min_active_duration)?;
        Ok(())
    }
}

/// Tuning for [`PatrolTask`](crate::ai::patrol::PatrolTask).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    pub priority: i32,
    /// Patrol points are drawn within this distance of home.
    pub radius: f64,
    pub speed: f64,
    pub arrival_radius: f64,
    pub seed: u64,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            priority: 1,
            radius: 3.0,
            speed: 1.5,
            arrival_radius: 0.25,
            seed: 0x5eed,
        }
    }
}

impl PatrolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("patrol.radius", self.radius)?;
        ensure_positive("patrol.speed", self.speed)?;
        ensure_non_negative("patrol.arrival_radius", self.arrival_radius)?;
        Ok(())
    }
}

/// Tuning for point-to-point movement along a fixed path or waypoint chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub priority: i32,
    pub speed: f64,
    pub arrival_radius: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            priority: 5,
            speed: 2.0,
            arrival_radius: 0.2,
        }
    }
}

impl PathConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("path.speed", self.speed)?;
        ensure_non_negative("path.arrival_radius", self.arrival_radius)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Hostile projectile defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    pub speed: f64,
    /// Seconds before the projectile expires.
    pub lifetime: f64,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            speed: 6.0,
            lifetime: 2.0,
        }
    }
}

impl ProjectileConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("projectile.speed", self.speed)?;
        ensure_positive("projectile.lifetime", self.lifetime)?;
        Ok(())
    }
}

/// Overlap test used by interceptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterceptConfig {
    /// Multiplier applied to the scale-derived radius of both participants.
    pub radius_scale: f64,
}

impl Default for InterceptConfig {
    fn default() -> Self {
        Self { radius_scale: 1.0 }
    }
}

impl InterceptConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("intercept.radius_scale", self.radius_scale)?;
        Ok(())
    }
}

/// Anti-projectile turret tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub range: f64,
    /// Seconds between shots.
    pub cooldown: f64,
    pub interceptor_speed: f64,
    pub interceptor_lifetime: f64,
    /// Visual size of spawned interceptors; their collision radius derives
    /// from it.
    pub interceptor_scale: f64,
    pub intercept: InterceptConfig,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            range: 8.0,
            cooldown: 0.5,
            interceptor_speed: 12.0,
            interceptor_lifetime: 1.5,
            interceptor_scale: 0.4,
            intercept: InterceptConfig::default(),
        }
    }
}

impl ShooterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("shooter.range", self.range)?;
        ensure_non_negative("shooter.cooldown", self.cooldown)?;
        ensure_positive("shooter.interceptor_speed", self.interceptor_speed)?;
        ensure_positive("shooter.interceptor_lifetime", self.interceptor_lifetime)?;
        ensure_positive("shooter.interceptor_scale", self.interceptor_scale)?;
        self.intercept.validate()
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Every tunable in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick: TickConfig,
    pub chase: ChaseConfig,
    pub patrol: PatrolConfig,
    pub path: PathConfig,
    pub projectile: ProjectileConfig,
    pub shooter: ShooterConfig,
}

impl SimConfig {
    /// Parse and validate a JSON document. Missing sections use defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tick.validate()?;
        self.chase.validate()?;
        self.patrol.validate()?;
        self.path.validate()?;
        self.projectile.validate()?;
        self.shooter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_dt_is_rejected() {
        let err = SimConfig::from_json(r#"{ "tick": { "fixed_dt": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NonPositive {
                field: "tick.fixed_dt",
                ..
            }
        ));
    }

    #[test]
    fn nested_sections_override_defaults() {
        let config = SimConfig::from_json(
            r#"{ "shooter": { "range": 3.5, "intercept": { "radius_scale": 2.0 } } }"#,
        )
        .unwrap();
        assert_eq!(config.shooter.range, 3.5);
        assert_eq!(config.shooter.intercept.radius_scale, 2.0);
        assert_eq!(config.shooter.cooldown, ShooterConfig::default().cooldown);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            SimConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn nan_speed_is_rejected() {
        let chase = ChaseConfig {
            speed: f64::NAN,
            ..ChaseConfig::default()
        };
        assert!(chase.validate().is_err());
    }
}
