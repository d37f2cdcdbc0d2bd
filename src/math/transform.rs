use super::vec2::Vec2;

/// Rigid transform: rotation about the origin followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    position: Vec2,
    rotation: f64,
    cos: f64,
    sin: f64,
}

impl Transform {
    pub fn new(position: Vec2, rotation: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Self {
            position,
            rotation,
            cos,
            sin,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 0.0)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set(&mut self, position: Vec2, rotation: f64) {
        *self = Self::new(position, rotation);
    }

    /// Rotates a direction without translating it.
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos - v.y * self.sin, v.x * self.sin + v.y * self.cos)
    }

    /// Inverse of [`Transform::rotate`].
    pub fn unrotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(v.x * self.cos + v.y * self.sin, -v.x * self.sin + v.y * self.cos)
    }

    /// Local point to world point.
    pub fn apply(&self, point: Vec2) -> Vec2 {
        self.rotate(point) + self.position
    }

    /// World point to local point.
    pub fn apply_inverse(&self, point: Vec2) -> Vec2 {
        self.unrotate(point - self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
