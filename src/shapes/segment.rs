use std::f64::consts::PI;

use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};

/// A line segment with rounded caps (a capsule).
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
    pub radius: f64,
    normal: Vec2,
    world_a: Vec2,
    world_b: Vec2,
    world_normal: Vec2,
    cached: bool,
}

/// Unit normal `perp(b - a)`, or +y for a zero-length segment.
fn segment_normal(a: Vec2, b: Vec2) -> Vec2 {
    (b - a).perpendicular().normalize_or(Vec2::UNIT_Y)
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2, radius: f64) -> Self {
        assert!(radius >= 0.0, "Segment radius cannot be negative");
        let normal = segment_normal(a, b);
        Self {
            a,
            b,
            radius,
            normal,
            world_a: a,
            world_b: b,
            world_normal: normal,
            cached: false,
        }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    pub fn world_a(&self) -> Vec2 {
        debug_assert!(self.cached, "segment read before cache_data");
        self.world_a
    }

    pub fn world_b(&self) -> Vec2 {
        debug_assert!(self.cached, "segment read before cache_data");
        self.world_b
    }

    pub fn world_normal(&self) -> Vec2 {
        debug_assert!(self.cached, "segment read before cache_data");
        self.world_normal
    }

    /// Unit direction of the world-space segment. Along this axis,
    /// `world_a` projects before `world_b`.
    pub fn world_direction(&self) -> Vec2 {
        -self.world_normal().perpendicular()
    }

    pub fn area(&self) -> f64 {
        self.radius * (PI * self.radius + 2.0 * self.length())
    }

    pub fn centroid(&self) -> Vec2 {
        self.a.lerp(self.b, 0.5)
    }

    pub fn inertia(&self, mass: f64) -> f64 {
        mass * (self.a.distance_squared(self.b) / 12.0 + self.centroid().magnitude_squared())
    }

    pub fn recenter(&mut self, offset: Vec2) {
        self.a -= offset;
        self.b -= offset;
    }

    pub fn transform(&mut self, xf: &Transform) {
        self.a = xf.apply(self.a);
        self.b = xf.apply(self.b);
        self.normal = segment_normal(self.a, self.b);
    }

    pub fn untransform(&mut self, xf: &Transform) {
        self.a = xf.apply_inverse(self.a);
        self.b = xf.apply_inverse(self.b);
        self.normal = segment_normal(self.a, self.b);
    }

    pub fn cache_data(&mut self, xf: &Transform) -> Bounds {
        self.world_a = xf.apply(self.a);
        self.world_b = xf.apply(self.b);
        self.world_normal = xf.rotate(self.normal);
        self.cached = true;

        let mut bounds = Bounds::new(self.world_a, self.world_b);
        bounds.expand(self.radius);
        bounds
    }

    pub fn point_query(&self, p: Vec2) -> bool {
        let n = self.world_normal();
        let dn = n.dot(p) - n.dot(self.world_a);
        if dn.abs() > self.radius {
            return false;
        }

        // Position of p along the segment relative to its two endpoints.
        let dir = self.world_direction();
        let dt = dir.dot(p);
        let dt_min = dir.dot(self.world_a);
        let dt_max = dir.dot(self.world_b);
        let r_sq = self.radius * self.radius;

        if dt <= dt_min {
            if dt < dt_min - self.radius {
                return false;
            }
            return self.world_a.distance_squared(p) < r_sq;
        }
        if dt > dt_max {
            if dt > dt_max + self.radius {
                return false;
            }
            return self.world_b.distance_squared(p) < r_sq;
        }
        true
    }

    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        let a = n.dot(self.world_a());
        let b = n.dot(self.world_b());
        a.min(b) - self.radius - d
    }
}
