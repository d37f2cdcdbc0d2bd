use crate::collision::bounds::Bounds;
use crate::common::Material;
use crate::math::{Transform, Vec2};
use crate::objects::BodyHandle;

use super::Shape;

/// A shape attached to a body, with its material and world-space cache.
///
/// `stamp` records the world generation of the last `cache_data`. Zero means
/// the cache is empty: never filled, or dropped because the owning body was
/// moved. Readers assert the cache is filled; the world also checks the
/// stamp against its own generation before reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Collider {
    pub shape: Shape,
    pub material: Material,
    body: Option<BodyHandle>,
    bounds: Bounds,
    stamp: u64,
}

impl Collider {
    pub fn new(shape: Shape) -> Self {
        Collider {
            shape,
            material: Material::default(),
            body: None,
            bounds: Bounds::empty(),
            stamp: 0,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Owning body, once the collider has been attached and the body added to a world.
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub(crate) fn set_body(&mut self, body: Option<BodyHandle>) {
        self.body = body;
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    pub fn is_cached(&self) -> bool {
        self.stamp != 0
    }

    /// Cached for exactly `generation`.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_cached() && self.stamp == generation
    }

    pub(crate) fn invalidate(&mut self) {
        self.stamp = 0;
    }

    pub fn bounds(&self) -> &Bounds {
        debug_assert!(self.is_cached(), "collider bounds read without a cache_data since the last move");
        &self.bounds
    }

    /// Refreshes the world-space geometry and bounds for `generation`.
    pub fn cache_data(&mut self, xf: &Transform, generation: u64) {
        debug_assert!(generation != 0, "generation zero is reserved for never-cached");
        self.bounds = self.shape.cache_data(xf);
        self.stamp = generation;
    }

    pub fn point_query(&self, p: Vec2) -> bool {
        debug_assert!(self.is_cached(), "collider queried without a cache_data since the last move");
        self.bounds.contain_point(p) && self.shape.point_query(p)
    }

    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        debug_assert!(self.is_cached(), "collider queried without a cache_data since the last move");
        self.shape.distance_on_plane(n, d)
    }

    /// Detached copy with the same geometry and material.
    pub fn duplicate(&self) -> Collider {
        Collider::new(self.shape.duplicate()).with_material(self.material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collider_stamp_tracks_generation() {
        let mut c = Collider::new(Shape::circle(1.0));
        assert!(!c.is_cached());
        c.cache_data(&Transform::identity(), 7);
        assert_eq!(c.stamp(), 7);
        assert!(c.point_query(Vec2::new(0.5, 0.0)));
        assert!(!c.point_query(Vec2::new(1.5, 0.0)));
    }

    #[test]
    fn test_collider_duplicate_is_detached() {
        let mut c = Collider::new(Shape::rectangle(1.0, 1.0)).with_material(Material::new(0.9, 0.1, 2.0));
        c.set_body(Some(BodyHandle::from_raw(3)));
        c.cache_data(&Transform::identity(), 1);
        let d = c.duplicate();
        assert_eq!(d.body(), None);
        assert!(!d.is_cached());
        assert_eq!(d.material, c.material);
    }

    #[test]
    fn test_collider_invalidate_clears_stamp() {
        let mut c = Collider::new(Shape::circle(1.0));
        c.cache_data(&Transform::identity(), 3);
        assert!(c.is_current(3));
        assert!(!c.is_current(4));
        c.invalidate();
        assert!(!c.is_cached());
        assert!(!c.is_current(3));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without a cache_data")]
    fn test_collider_read_after_invalidate_panics() {
        let mut c = Collider::new(Shape::circle(1.0));
        c.cache_data(&Transform::identity(), 1);
        c.invalidate();
        let _ = c.bounds();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without a cache_data")]
    fn test_collider_query_before_cache_panics() {
        let c = Collider::new(Shape::circle(1.0));
        c.point_query(Vec2::ZERO);
    }
}
