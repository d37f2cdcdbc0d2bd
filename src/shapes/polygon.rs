use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};

/// A half-plane `dot(normal, x) <= d` bounding one polygon edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec2,
    pub d: f64,
}

/// A convex polygon in body-local space.
///
/// The vertex ring is stored counter-clockwise (positive signed area)
/// whatever the input winding, so every plane normal points outward.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    planes: Vec<Plane>,
    world_vertices: Vec<Vec2>,
    world_planes: Vec<Plane>,
    cached: bool,
}

pub(crate) fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    let mut sum = 0.0;
    for i in 0..n {
        sum += vertices[i].cross(vertices[(i + 1) % n]);
    }
    sum * 0.5
}

fn edge_planes(vertices: &[Vec2]) -> Vec<Plane> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let v0 = vertices[i];
            let v1 = vertices[(i + 1) % n];
            let normal = (v1 - v0).rperpendicular().normalize_or(Vec2::UNIT_Y);
            Plane {
                normal,
                d: normal.dot(v0),
            }
        })
        .collect()
}

pub(crate) fn is_convex(vertices: &[Vec2]) -> bool {
    let n = vertices.len();
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        (b - a).cross(c - b) >= -1e-9
    })
}

impl Polygon {
    /// Creates a polygon from a convex vertex ring of either winding.
    ///
    /// Panics if fewer than 3 vertices are provided.
    pub fn new(mut vertices: Vec<Vec2>) -> Self {
        assert!(vertices.len() >= 3, "Polygon must have at least 3 vertices");
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }
        debug_assert!(is_convex(&vertices), "Polygon must be convex");

        let planes = edge_planes(&vertices);
        Polygon {
            world_vertices: vertices.clone(),
            world_planes: planes.clone(),
            vertices,
            planes,
            cached: false,
        }
    }

    /// Axis-aligned box centered on `center`.
    pub fn rectangle(center: Vec2, half_width: f64, half_height: f64) -> Self {
        Polygon::new(vec![
            center + Vec2::new(-half_width, -half_height),
            center + Vec2::new(half_width, -half_height),
            center + Vec2::new(half_width, half_height),
            center + Vec2::new(-half_width, half_height),
        ])
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn world_vertices(&self) -> &[Vec2] {
        debug_assert!(self.cached, "polygon read before cache_data");
        &self.world_vertices
    }

    pub fn world_planes(&self) -> &[Plane] {
        debug_assert!(self.cached, "polygon read before cache_data");
        &self.world_planes
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    pub fn centroid(&self) -> Vec2 {
        let n = self.vertices.len();
        let mut sum = Vec2::ZERO;
        let mut area_sum = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            let cross = v1.cross(v2);
            area_sum += cross;
            sum += (v1 + v2) * cross;
        }

        if area_sum.abs() < 1e-10 {
            // Collinear ring: fall back to the vertex average.
            let total = self.vertices.iter().fold(Vec2::ZERO, |acc, v| acc + *v);
            return total / n as f64;
        }
        sum / (3.0 * area_sum)
    }

    /// Moment of inertia about the body origin for a polygon of uniform `mass`.
    pub fn inertia(&self, mass: f64) -> f64 {
        let n = self.vertices.len();
        let mut numer = 0.0;
        let mut denom = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            let cross = v1.cross(v2).abs();
            numer += cross * (v1.magnitude_squared() + v1.dot(v2) + v2.magnitude_squared());
            denom += cross;
        }
        if denom < 1e-12 {
            return 0.0;
        }
        mass * numer / (6.0 * denom)
    }

    pub fn recenter(&mut self, offset: Vec2) {
        for v in &mut self.vertices {
            *v -= offset;
        }
        self.planes = edge_planes(&self.vertices);
    }

    pub fn transform(&mut self, xf: &Transform) {
        for v in &mut self.vertices {
            *v = xf.apply(*v);
        }
        self.planes = edge_planes(&self.vertices);
    }

    pub fn untransform(&mut self, xf: &Transform) {
        for v in &mut self.vertices {
            *v = xf.apply_inverse(*v);
        }
        self.planes = edge_planes(&self.vertices);
    }

    pub fn cache_data(&mut self, xf: &Transform) -> Bounds {
        let mut bounds = Bounds::empty();
        for (world, local) in self.world_vertices.iter_mut().zip(&self.vertices) {
            *world = xf.apply(*local);
            bounds.add_point(*world);
        }
        for (world, local) in self.world_planes.iter_mut().zip(&self.planes) {
            let normal = xf.rotate(local.normal);
            *world = Plane {
                normal,
                d: normal.dot(xf.position()) + local.d,
            };
        }
        self.cached = true;
        bounds
    }

    /// Inclusive containment test against every edge plane.
    pub fn point_query(&self, p: Vec2) -> bool {
        self.world_planes()
            .iter()
            .all(|plane| plane.normal.dot(p) - plane.d <= 0.0)
    }

    /// Containment test restricted to planes facing along `n`.
    pub fn contain_point_partial(&self, p: Vec2, n: Vec2) -> bool {
        self.world_planes()
            .iter()
            .filter(|plane| plane.normal.dot(n) >= 0.0001)
            .all(|plane| plane.normal.dot(p) - plane.d <= 0.0)
    }

    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        self.world_vertices()
            .iter()
            .map(|v| n.dot(*v))
            .fold(f64::INFINITY, f64::min)
            - d
    }
}
