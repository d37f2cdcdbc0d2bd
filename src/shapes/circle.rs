use std::f64::consts::PI;

use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    /// Center in body-local space.
    pub center: Vec2,
    pub radius: f64,
    world_center: Vec2,
    cached: bool,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        Self::with_center(Vec2::ZERO, radius)
    }

    pub fn with_center(center: Vec2, radius: f64) -> Self {
        assert!(radius > 0.0, "Circle radius must be positive");
        Self {
            center,
            radius,
            world_center: center,
            cached: false,
        }
    }

    pub fn world_center(&self) -> Vec2 {
        debug_assert!(self.cached, "circle read before cache_data");
        self.world_center
    }

    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    pub fn centroid(&self) -> Vec2 {
        self.center
    }

    /// Moment of inertia about the body origin.
    pub fn inertia(&self, mass: f64) -> f64 {
        mass * (0.5 * self.radius * self.radius + self.center.magnitude_squared())
    }

    pub fn recenter(&mut self, offset: Vec2) {
        self.center -= offset;
    }

    pub fn transform(&mut self, xf: &Transform) {
        self.center = xf.apply(self.center);
    }

    pub fn untransform(&mut self, xf: &Transform) {
        self.center = xf.apply_inverse(self.center);
    }

    pub fn cache_data(&mut self, xf: &Transform) -> Bounds {
        self.world_center = xf.apply(self.center);
        self.cached = true;
        Bounds::from_extents(self.world_center, self.radius, self.radius)
    }

    pub fn point_query(&self, p: Vec2) -> bool {
        self.world_center().distance_squared(p) < self.radius * self.radius
    }

    /// Signed distance from the plane `dot(n, x) = d` to the nearest surface point.
    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        n.dot(self.world_center()) - self.radius - d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_circle_new() {
        let c = Circle::new(5.0);
        assert_eq!(c.radius, 5.0);
        assert_eq!(c.center, Vec2::ZERO);
    }

    #[test]
    #[should_panic]
    fn test_circle_new_negative_radius() {
        Circle::new(-1.0);
    }

    #[test]
    #[should_panic]
    fn test_circle_new_zero_radius() {
        Circle::new(0.0);
    }

    #[test]
    fn test_circle_mass_properties() {
        let c = Circle::with_center(Vec2::new(3.0, 4.0), 2.0);
        assert!((c.area() - 4.0 * PI).abs() < EPSILON);
        assert_eq!(c.centroid(), Vec2::new(3.0, 4.0));
        // 0.5 * r^2 + |c|^2 = 2 + 25
        assert!((c.inertia(2.0) - 54.0).abs() < EPSILON);
    }

    #[test]
    fn test_circle_cache_data_bounds() {
        let mut c = Circle::with_center(Vec2::new(1.0, 0.0), 0.5);
        let xf = Transform::new(Vec2::new(10.0, 10.0), std::f64::consts::FRAC_PI_2);
        let b = c.cache_data(&xf);
        let wc = c.world_center();
        assert!((wc.x - 10.0).abs() < EPSILON);
        assert!((wc.y - 11.0).abs() < EPSILON);
        assert!((b.mins.x - 9.5).abs() < EPSILON);
        assert!((b.maxs.y - 11.5).abs() < EPSILON);
    }

    #[test]
    fn test_circle_point_query_and_plane_distance() {
        let mut c = Circle::new(2.0);
        c.cache_data(&Transform::new(Vec2::new(5.0, 0.0), 0.0));
        assert!(c.point_query(Vec2::new(6.0, 1.0)));
        assert!(!c.point_query(Vec2::new(7.5, 0.0)));

        // Plane x = 1 facing +x: nearest surface point is at x = 3.
        assert!((c.distance_on_plane(Vec2::UNIT_X, 1.0) - 2.0).abs() < EPSILON);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "cache_data")]
    fn test_circle_query_before_cache_panics() {
        let c = Circle::new(1.0);
        c.point_query(Vec2::ZERO);
    }
}
