use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};
use crate::math::Vec2;

/// Tuning for a `PhysicsWorld`.
///
/// Missing fields in serialized form fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Positive y points down, as in screen space.
    pub gravity: Vec2,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    /// Fraction of the remaining penetration removed per position iteration.
    pub baumgarte: f64,
    /// Penetration tolerated without correction.
    pub collision_slop: f64,
    pub max_linear_correction: f64,
    pub allow_sleep: bool,
    pub sleep_linear_tolerance: f64,
    /// Radians per second.
    pub sleep_angular_tolerance: f64,
    /// Consecutive quiet steps before a body falls asleep.
    pub sleep_steps: u32,
    /// Step length used by `PhysicsWorld::advance`.
    pub fixed_timestep: f64,
    pub max_substeps: u32,
    pub linear_damping: f64,
    pub angular_damping: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            gravity: Vec2::new(0.0, 9.8),
            velocity_iterations: 8,
            position_iterations: 4,
            baumgarte: 0.28,
            collision_slop: 0.01,
            max_linear_correction: 1.0,
            allow_sleep: true,
            sleep_linear_tolerance: 0.5,
            sleep_angular_tolerance: 2.0f64.to_radians(),
            sleep_steps: 30,
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 8,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite".into()));
        }
        if self.velocity_iterations == 0 {
            return Err(PhysicsError::InvalidConfig("velocity_iterations must be at least 1".into()));
        }
        if !(self.baumgarte > 0.0 && self.baumgarte <= 1.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "baumgarte must be in (0, 1], got {}",
                self.baumgarte
            )));
        }
        let non_negative = [
            ("collision_slop", self.collision_slop),
            ("max_linear_correction", self.max_linear_correction),
            ("sleep_linear_tolerance", self.sleep_linear_tolerance),
            ("sleep_angular_tolerance", self.sleep_angular_tolerance),
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(PhysicsError::InvalidConfig(format!("{name} must be a non-negative number, got {value}")));
            }
        }
        if !(self.fixed_timestep > 0.0 && self.fixed_timestep.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed_timestep must be positive, got {}",
                self.fixed_timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig("max_substeps must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{ "gravity": { "x": 0.0, "y": 20.0 }, "allow_sleep": false }"#).unwrap();
        assert_eq!(config.gravity, Vec2::new(0.0, 20.0));
        assert!(!config.allow_sleep);
        assert_eq!(config.velocity_iterations, 8);
        assert_eq!(config.sleep_steps, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WorldConfig {
            fixed_timestep: 0.0,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(PhysicsError::InvalidConfig(_))));

        let config = WorldConfig {
            baumgarte: 1.5,
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());

        let config = WorldConfig {
            collision_slop: -0.1,
            ..WorldConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("collision_slop"));
    }
}
