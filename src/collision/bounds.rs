//! Axis-aligned bounding boxes used by the broad phase.

use crate::math::vec2::Vec2;

/// An axis-aligned box given by its minimum and maximum corners.
///
/// A cleared box holds the empty sentinel `mins = +inf, maxs = -inf` so that
/// the first `add_*` call snaps it to the added geometry. Every `add_*` only
/// ever grows the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub mins: Vec2,
    pub maxs: Vec2,
}

impl Bounds {
    /// Creates a box from two corners in any order.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Bounds {
            mins: a.min(b),
            maxs: a.max(b),
        }
    }

    pub fn empty() -> Self {
        Bounds {
            mins: Vec2::new(f64::INFINITY, f64::INFINITY),
            maxs: Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box centered on `center` with half-extents `ex`, `ey`.
    pub fn from_extents(center: Vec2, ex: f64, ey: f64) -> Self {
        let mut b = Bounds::empty();
        b.add_extents(center, ex, ey);
        b
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Bounds::new(*first, *first);
        for p in rest {
            b.add_point(*p);
        }
        Some(b)
    }

    pub fn clear(&mut self) {
        *self = Bounds::empty();
    }

    pub fn is_empty(&self) -> bool {
        self.mins.x > self.maxs.x || self.mins.y > self.maxs.y
    }

    pub fn add_point(&mut self, p: Vec2) {
        self.mins = self.mins.min(p);
        self.maxs = self.maxs.max(p);
    }

    pub fn add_bounds(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.mins = self.mins.min(other.mins);
        self.maxs = self.maxs.max(other.maxs);
    }

    pub fn add_extents(&mut self, center: Vec2, ex: f64, ey: f64) {
        self.add_point(Vec2::new(center.x - ex, center.y - ey));
        self.add_point(Vec2::new(center.x + ex, center.y + ey));
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&mut self, margin: f64) {
        if self.is_empty() {
            return;
        }
        self.mins -= Vec2::new(margin, margin);
        self.maxs += Vec2::new(margin, margin);
    }

    pub fn center(&self) -> Vec2 {
        (self.mins + self.maxs) * 0.5
    }

    /// Half-width and half-height.
    pub fn extents(&self) -> Vec2 {
        (self.maxs - self.mins) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.maxs.x - self.mins.x
    }

    pub fn height(&self) -> f64 {
        self.maxs.y - self.mins.y
    }

    pub fn perimeter(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        2.0 * (self.width() + self.height())
    }

    /// Inclusive on the boundary.
    pub fn contain_point(&self, p: Vec2) -> bool {
        p.x >= self.mins.x && p.x <= self.maxs.x && p.y >= self.mins.y && p.y <= self.maxs.y
    }

    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.is_empty() || (self.contain_point(other.mins) && self.contain_point(other.maxs))
    }

    /// Touching boxes intersect. An empty box intersects nothing.
    pub fn intersects_bounds(&self, other: &Bounds) -> bool {
        !(self.mins.x > other.maxs.x
            || self.maxs.x < other.mins.x
            || self.mins.y > other.maxs.y
            || self.maxs.y < other.mins.y)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Bounds::empty()
    }
}
