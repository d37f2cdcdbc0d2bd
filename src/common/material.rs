//! Surface and mass properties attached to each collider.

use serde::{Deserialize, Serialize};

/// Physical properties of a collider affecting collision response and mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Coefficient of restitution (bounciness). Range [0, 1].
    /// A contact bounces with the larger of the two coefficients.
    pub restitution: f64,
    /// Coulomb friction coefficient. Range [0, infinity).
    /// A contact uses the geometric mean of the two coefficients.
    pub friction: f64,
    /// Mass per unit area, used when the owning body recomputes its mass.
    pub density: f64,
}

impl Material {
    pub fn new(restitution: f64, friction: f64, density: f64) -> Self {
        Material {
            restitution: restitution.clamp(0.0, 1.0),
            friction: friction.max(0.0),
            density: density.max(0.0),
        }
    }

    pub fn mixed_restitution(&self, other: &Material) -> f64 {
        self.restitution.max(other.restitution)
    }

    pub fn mixed_friction(&self, other: &Material) -> f64 {
        (self.friction * other.friction).sqrt()
    }
}

impl Default for Material {
    fn default() -> Self {
        Material {
            restitution: 0.2,
            friction: 0.5,
            density: 1.0,
        }
    }
}
