//! Axis-aligned tile cells, optionally with a sloped or rounded solid region.
//!
//! A cell is described by its half-widths and by `signx`/`signy`, which
//! say which way the solid region's surface faces. For the sloped kinds the
//! surface unit normal is `(sx, sy)` and always points out of the solid.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Whole cell is solid.
    Full,
    /// Half of the cell is solid, split at the center line facing `(signx, signy)`.
    Half,
    /// Diagonal half.
    Slope45,
    /// Shallow slope, small triangle (rises one half-height over the full width).
    Slope22Small,
    /// Shallow slope, large remainder of the cell.
    Slope22Big,
    /// Steep slope, small triangle (rises the full height over one half-width).
    Slope67Small,
    /// Steep slope, large remainder of the cell.
    Slope67Big,
    /// Quarter disc centered on the solid corner.
    Convex,
    /// Full cell minus a quarter disc centered on the open corner.
    Concave,
}

impl TileKind {
    /// Checks that `signx`/`signy` are meaningful for this kind.
    pub fn accepts_signs(self, signx: i8, signy: i8) -> bool {
        let unit = |s: i8| s == 1 || s == -1;
        match self {
            TileKind::Full => true,
            TileKind::Half => (signx == 0) != (signy == 0) && (unit(signx) || unit(signy)),
            _ => unit(signx) && unit(signy),
        }
    }
}

/// A tile cell participating in narrow phase as a static obstacle.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCell {
    pub kind: TileKind,
    /// Cell center in body-local space.
    pub offset: Vec2,
    pub xw: f64,
    pub yw: f64,
    pub signx: i8,
    pub signy: i8,
    pub sx: f64,
    pub sy: f64,
    world_center: Vec2,
    cached: bool,
}

impl TileCell {
    /// Panics if a half-width is not positive or the signs do not fit `kind`.
    pub fn new(kind: TileKind, xw: f64, yw: f64, signx: i8, signy: i8) -> Self {
        assert!(xw > 0.0 && yw > 0.0, "Tile half-widths must be positive");
        assert!(
            kind.accepts_signs(signx, signy),
            "Tile signs ({signx}, {signy}) are invalid for {kind:?}"
        );
        let (fx, fy) = (f64::from(signx), f64::from(signy));
        let (sx, sy) = match kind {
            TileKind::Full => (0.0, 0.0),
            TileKind::Half => (fx, fy),
            TileKind::Slope45 => (fx / 2.0f64.sqrt(), fy / 2.0f64.sqrt()),
            TileKind::Slope22Small | TileKind::Slope22Big => (fx / 5.0f64.sqrt(), 2.0 * fy / 5.0f64.sqrt()),
            TileKind::Slope67Small | TileKind::Slope67Big => (2.0 * fx / 5.0f64.sqrt(), fy / 5.0f64.sqrt()),
            TileKind::Convex | TileKind::Concave => (fx / 2.0f64.sqrt(), fy / 2.0f64.sqrt()),
        };
        TileCell {
            kind,
            offset: Vec2::ZERO,
            xw,
            yw,
            signx,
            signy,
            sx,
            sy,
            world_center: Vec2::ZERO,
            cached: false,
        }
    }

    pub fn full(xw: f64, yw: f64) -> Self {
        TileCell::new(TileKind::Full, xw, yw, 0, 0)
    }

    pub fn at(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn signs(&self) -> Vec2 {
        Vec2::new(f64::from(self.signx), f64::from(self.signy))
    }

    /// Unit normal of the sloped surface.
    pub fn slope_normal(&self) -> Vec2 {
        Vec2::new(self.sx, self.sy)
    }

    pub fn world_center(&self) -> Vec2 {
        debug_assert!(self.cached, "tile read before cache_data");
        self.world_center
    }

    /// A point on the slope line, relative to the cell center.
    pub fn slope_anchor(&self) -> Vec2 {
        let (fx, fy) = (f64::from(self.signx), f64::from(self.signy));
        match self.kind {
            TileKind::Slope22Small | TileKind::Slope67Big => Vec2::new(fx * self.xw, -fy * self.yw),
            TileKind::Slope22Big | TileKind::Slope67Small => Vec2::new(-fx * self.xw, fy * self.yw),
            _ => Vec2::ZERO,
        }
    }

    /// Radius of the quarter disc used by the rounded kinds.
    pub fn arc_radius(&self) -> f64 {
        2.0 * self.xw
    }

    fn corners(&self, center: Vec2) -> [Vec2; 4] {
        [
            center + Vec2::new(-self.xw, -self.yw),
            center + Vec2::new(self.xw, -self.yw),
            center + Vec2::new(self.xw, self.yw),
            center + Vec2::new(-self.xw, self.yw),
        ]
    }

    /// Outline of the solid region around `center`. The rounded kinds
    /// report the whole cell.
    fn solid_outline(&self, center: Vec2) -> Vec<Vec2> {
        let corners = self.corners(center);
        match self.kind {
            TileKind::Full | TileKind::Convex | TileKind::Concave => corners.to_vec(),
            _ => clip_to_half_plane(&corners, center + self.slope_anchor(), self.slope_normal()),
        }
    }

    pub fn area(&self) -> f64 {
        let cell = 4.0 * self.xw * self.yw;
        match self.kind {
            TileKind::Full => cell,
            TileKind::Half | TileKind::Slope45 => cell * 0.5,
            TileKind::Slope22Small | TileKind::Slope67Small => cell * 0.25,
            TileKind::Slope22Big | TileKind::Slope67Big => cell * 0.75,
            TileKind::Convex => PI * self.xw * self.xw,
            TileKind::Concave => cell - PI * self.xw * self.xw,
        }
    }

    /// Mass properties treat the cell as a full box; tiles are meant for static bodies.
    pub fn centroid(&self) -> Vec2 {
        self.offset
    }

    pub fn inertia(&self, mass: f64) -> f64 {
        let (w, h) = (2.0 * self.xw, 2.0 * self.yw);
        mass * ((w * w + h * h) / 12.0 + self.offset.magnitude_squared())
    }

    pub fn recenter(&mut self, offset: Vec2) {
        self.offset -= offset;
    }

    /// Cells stay axis-aligned; only the center is moved.
    pub fn transform(&mut self, xf: &Transform) {
        self.offset = xf.apply(self.offset);
    }

    pub fn untransform(&mut self, xf: &Transform) {
        self.offset = xf.apply_inverse(self.offset);
    }

    pub fn cache_data(&mut self, xf: &Transform) -> Bounds {
        self.world_center = xf.apply(self.offset);
        self.cached = true;
        Bounds::from_extents(self.world_center, self.xw, self.yw)
    }

    pub fn point_query(&self, p: Vec2) -> bool {
        let c = self.world_center();
        if !Bounds::from_extents(c, self.xw, self.yw).contain_point(p) {
            return false;
        }
        let signs = self.signs();
        match self.kind {
            TileKind::Full => true,
            TileKind::Convex => {
                let corner = c - Vec2::new(signs.x * self.xw, signs.y * self.yw);
                corner.distance_squared(p) <= self.arc_radius() * self.arc_radius()
            }
            TileKind::Concave => {
                let corner = c + Vec2::new(signs.x * self.xw, signs.y * self.yw);
                corner.distance_squared(p) >= self.arc_radius() * self.arc_radius()
            }
            _ => (p - (c + self.slope_anchor())).dot(self.slope_normal()) <= 0.0,
        }
    }

    /// Whether the cell corner at `(oh * xw, ov * yw)` from the center belongs
    /// to the solid region, boundary included. `oh` and `ov` are `1.0` or `-1.0`.
    pub fn corner_is_solid(&self, oh: f64, ov: f64) -> bool {
        let v = Vec2::new(oh * self.xw, ov * self.yw);
        let eps = 1e-9 * self.xw.max(self.yw);
        let signs = self.signs();
        let r = self.arc_radius();
        match self.kind {
            TileKind::Full => true,
            TileKind::Convex => {
                let disc = -Vec2::new(signs.x * self.xw, signs.y * self.yw);
                v.distance(disc) <= r + eps
            }
            TileKind::Concave => {
                let hollow = Vec2::new(signs.x * self.xw, signs.y * self.yw);
                v.distance(hollow) >= r - eps
            }
            _ => (v - self.slope_anchor()).dot(self.slope_normal()) <= eps,
        }
    }

    pub fn distance_on_plane(&self, n: Vec2, d: f64) -> f64 {
        self.solid_outline(self.world_center())
            .iter()
            .map(|v| n.dot(*v))
            .fold(f64::INFINITY, f64::min)
            - d
    }
}

/// Clips a convex ring to `dot(p - anchor, normal) <= 0`.
fn clip_to_half_plane(ring: &[Vec2], anchor: Vec2, normal: Vec2) -> Vec<Vec2> {
    let side = |p: Vec2| (p - anchor).dot(normal);
    let mut out = Vec::with_capacity(ring.len() + 1);
    for i in 0..ring.len() {
        let cur = ring[i];
        let next = ring[(i + 1) % ring.len()];
        let (sc, sn) = (side(cur), side(next));
        if sc <= 0.0 {
            out.push(cur);
        }
        if (sc < 0.0 && sn > 0.0) || (sc > 0.0 && sn < 0.0) {
            out.push(cur.lerp(next, sc / (sc - sn)));
        }
    }
    out
}
