pub mod circle;
pub mod collider;
pub mod polygon;
pub mod segment;
pub mod tile;

pub use circle::Circle;
pub use collider::Collider;
pub use polygon::{Plane, Polygon};
pub use segment::Segment;
pub use tile::{TileCell, TileKind};

use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};

/// Discriminant used to index the narrow-phase dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    Circle = 0,
    Segment = 1,
    Polygon = 2,
    Tile = 3,
}

/// Geometry of a collider.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Segment(Segment),
    Polygon(Polygon),
    Tile(TileCell),
}

impl Shape {
    pub fn circle(radius: f64) -> Self {
        Shape::Circle(Circle::new(radius))
    }

    pub fn segment(a: Vec2, b: Vec2, radius: f64) -> Self {
        Shape::Segment(Segment::new(a, b, radius))
    }

    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Shape::Polygon(Polygon::new(vertices))
    }

    pub fn rectangle(half_width: f64, half_height: f64) -> Self {
        Shape::Polygon(Polygon::rectangle(Vec2::ZERO, half_width, half_height))
    }

    pub fn tile(kind: TileKind, xw: f64, yw: f64, signx: i8, signy: i8) -> Self {
        Shape::Tile(TileCell::new(kind, xw, yw, signx, signy))
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle(_) => ShapeType::Circle,
            Shape::Segment(_) => ShapeType::Segment,
            Shape::Polygon(_) => ShapeType::Polygon,
            Shape::Tile(_) => ShapeType::Tile,
        }
    }

    /// Fresh copy of the local geometry with no cached world data.
    pub fn duplicate(&self) -> Shape {
        match self {
            Shape::Circle(c) => Shape::Circle(Circle::with_center(c.center, c.radius)),
            Shape::Segment(s) => Shape::Segment(Segment::new(s.a, s.b, s.radius)),
            Shape::Polygon(p) => Shape::Polygon(Polygon::new(p.vertices().to_vec())),
            Shape::Tile(t) => Shape::Tile(TileCell::new(t.kind, t.xw, t.yw, t.signx, t.signy).at(t.offset)),
        }
    }

    /// Shifts the local geometry so that `offset` becomes the origin.
    pub fn recenter(&mut self, offset: Vec2) {
        match self {
            Shape::Circle(c) => c.recenter(offset),
            Shape::Segment(s) => s.recenter(offset),
            Shape::Polygon(p) => p.recenter(offset),
            Shape::Tile(t) => t.recenter(offset),
        }
    }

    /// Applies `xf` to the local geometry.
    pub fn transform(&mut self, xf: &Transform) {
        match self {
            Shape::Circle(c) => c.transform(xf),
            Shape::Segment(s) => s.transform(xf),
            Shape::Polygon(p) => p.transform(xf),
            Shape::Tile(t) => t.transform(xf),
        }
    }

    /// Applies the inverse of `xf` to the local geometry.
    pub fn untransform(&mut self, xf: &Transform) {
        match self {
            Shape::Circle(c) => c.untransform(xf),
            Shape::Segment(s) => s.untransform(xf),
            Shape::Polygon(p) => p.untransform(xf),
            Shape::Tile(t) => t.untransform(xf),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Shape::Circle(c) => c.area(),
            Shape::Segment(s) => s.area(),
            Shape::Polygon(p) => p.area(),
            Shape::Tile(t) => t.area(),
        }
    }

    pub fn centroid(&self) -> Vec2 {
        match self {
            Shape::Circle(c) => c.centroid(),
            Shape::Segment(s) => s.centroid(),
            Shape::Polygon(p) => p.centroid(),
            Shape::Tile(t) => t.centroid(),
        }
    }

    /// Moment of inertia about the local origin for the given mass.
    pub fn inertia(&self, mass: f64) -> f64 {
        match self {
            Shape::Circle(c) => c.inertia(mass),
            Shape::Segment(s) => s.inertia(mass),
            Shape::Polygon(p) => p.inertia(mass),
            Shape::Tile(t) => t.inertia(mass),
        }
    }

    /// Recomputes the world-space geometry from `xf` and returns its bounds.
    pub fn cache_data(&mut self, xf: &Transform) -> Bounds {
        match self {
            Shape::Circle(c) => c.cache_data(xf),
            Shape::Segment(s) => s.cache_data(xf),
            Shape::Polygon(p) => p.cache_data(xf),
            Shape::Tile(t) => t.cache_data(xf),
        }
    }

    pub fn point_query(&self, p: Vec2) -> bool {
        match self {
            Shape::Circle(c) => c.point_query(p),
            Shape::Segment(s) => s.point_query(p),
            Shape::Polygon(poly) => poly.point_query(p),
            Shape::Tile(t) => t.point_query(p),
        }
    }

    /// Signed distance of the shape's nearest point from the plane `dot(n, x) = d`.
    /// Negative when the shape crosses the plane.
    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        match self {
            Shape::Circle(c) => c.distance_on_plane(n, d),
            Shape::Segment(s) => s.distance_on_plane(n, d),
            Shape::Polygon(p) => p.distance_on_plane(n, d),
            Shape::Tile(t) => t.distance_on_plane(n, d),
        }
    }
}
