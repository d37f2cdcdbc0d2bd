//! Projection of a moving object out of a tile cell.
//!
//! Each routine receives the axis-aligned penetration vector of the object's
//! bounding box against the cell and decides whether the object is resolved
//! along that axis, along the tile surface, or not at all. The returned
//! vector is the displacement that pushes the object out of the solid.

use crate::math::vec2::Vec2;
use crate::shapes::tile::{TileCell, TileKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileCollision {
    None,
    /// Resolved along a cardinal axis.
    Axis(Vec2),
    /// Resolved along a slope, arc, or secondary edge.
    Other(Vec2),
}

impl TileCollision {
    pub fn vector(&self) -> Option<Vec2> {
        match *self {
            TileCollision::None => None,
            TileCollision::Axis(v) | TileCollision::Other(v) => Some(v),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TileCollision::None)
    }
}

/// The object being pushed out of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Probe {
    Circle { center: Vec2, radius: f64 },
    Box { center: Vec2, xw: f64, yw: f64 },
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Probe {
    pub fn center(&self) -> Vec2 {
        match *self {
            Probe::Circle { center, .. } | Probe::Box { center, .. } => center,
        }
    }

    /// Half-widths of the probe's bounding box.
    pub fn extents(&self) -> (f64, f64) {
        match *self {
            Probe::Circle { radius, .. } => (radius, radius),
            Probe::Box { xw, yw, .. } => (xw, yw),
        }
    }

    /// Farthest point of the probe in direction `dir`, which must be unit length.
    pub fn support(&self, dir: Vec2) -> Vec2 {
        match *self {
            Probe::Circle { center, radius } => center + dir * radius,
            Probe::Box { center, xw, yw } => center + Vec2::new(sign(dir.x) * xw, sign(dir.y) * yw),
        }
    }
}

/// Tests `probe` against `tile` and computes the displacement that resolves it.
pub fn collide_vs_tile(probe: &Probe, tile: &TileCell) -> TileCollision {
    let tc = tile.world_center();
    let (xw, yw) = probe.extents();
    let delta = probe.center() - tc;

    let px = (tile.xw + xw) - delta.x.abs();
    if px <= 0.0 {
        return TileCollision::None;
    }
    let py = (tile.yw + yw) - delta.y.abs();
    if py <= 0.0 {
        return TileCollision::None;
    }

    let axis = if px < py {
        Vec2::new(if delta.x < 0.0 { -px } else { px }, 0.0)
    } else {
        Vec2::new(0.0, if delta.y < 0.0 { -py } else { py })
    };

    if let Some(hit) = project_corner(probe, tile) {
        return hit;
    }

    match tile.kind {
        TileKind::Full => TileCollision::Axis(axis),
        TileKind::Half | TileKind::Slope45 => project_center_slope(axis, probe, tile),
        TileKind::Slope22Small => project_22_small(axis, probe, tile),
        TileKind::Slope22Big => project_22_big(axis, probe, tile),
        TileKind::Slope67Small => project_67_small(axis, probe, tile),
        TileKind::Slope67Big => project_67_big(axis, probe, tile),
        TileKind::Convex => project_convex(axis, probe, tile),
        TileKind::Concave => project_concave(axis, probe, tile),
    }
}

/// Picks the shorter of the axis vector and the slope projection.
/// `dp` is the signed distance of the leading point from the slope;
/// zero or above means no contact.
fn resolve_against_slope(axis: Vec2, normal: Vec2, dp: f64) -> TileCollision {
    if dp >= 0.0 {
        return TileCollision::None;
    }
    let projection = normal * -dp;
    if axis.magnitude() < projection.magnitude() {
        TileCollision::Axis(axis)
    } else {
        TileCollision::Other(projection)
    }
}

/// A circle whose center lies diagonally outside the cell touches the solid
/// only through the corner vertex, provided that vertex is solid. Returns
/// `None` when the probe is not in that region or the corner is open.
fn project_corner(probe: &Probe, tile: &TileCell) -> Option<TileCollision> {
    let Probe::Circle { center, radius } = *probe else {
        return None;
    };
    let tc = tile.world_center();
    let delta = center - tc;
    let oh = if delta.x < -tile.xw {
        -1.0
    } else if delta.x > tile.xw {
        1.0
    } else {
        0.0
    };
    let ov = if delta.y < -tile.yw {
        -1.0
    } else if delta.y > tile.yw {
        1.0
    } else {
        0.0
    };
    if oh == 0.0 || ov == 0.0 || !tile.corner_is_solid(oh, ov) {
        return None;
    }
    let vertex = tc + Vec2::new(oh * tile.xw, ov * tile.yw);
    let to_center = center - vertex;
    let pen = radius - to_center.magnitude();
    if pen <= 0.0 {
        return Some(TileCollision::None);
    }
    let dir = to_center.normalize_or(Vec2::new(oh, ov) / 2.0f64.sqrt());
    Some(TileCollision::Other(dir * pen))
}

/// Half cells and 45 degree slopes: the surface passes through the cell center.
fn project_center_slope(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let s = tile.slope_normal();
    let offset = probe.support(-s) - tile.world_center();
    resolve_against_slope(axis, s, offset.dot(s))
}

fn project_22_small(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let tc = tile.world_center();
    let (signx, signy) = (f64::from(tile.signx), f64::from(tile.signy));
    let (_, yw) = probe.extents();

    // Vertical distance from the probe's inner edge to the top of the small triangle.
    let inner_y = probe.center().y - signy * yw;
    let pen_y = tc.y - inner_y;
    if pen_y * signy <= 0.0 {
        return TileCollision::None;
    }

    let s = tile.slope_normal();
    let anchor = tc + Vec2::new(signx * tile.xw, -signy * tile.yw);
    let dp = (probe.support(-s) - anchor).dot(s);
    if dp >= 0.0 {
        return TileCollision::None;
    }

    let projection = s * -dp;
    let len_n = projection.magnitude();
    let len_p = axis.magnitude();
    let a_y = pen_y.abs();
    if len_p < len_n {
        if a_y < len_p {
            TileCollision::Other(Vec2::new(0.0, pen_y))
        } else {
            TileCollision::Axis(axis)
        }
    } else if a_y < len_n {
        TileCollision::Other(Vec2::new(0.0, pen_y))
    } else {
        TileCollision::Other(projection)
    }
}

fn project_22_big(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let tc = tile.world_center();
    let (signx, signy) = (f64::from(tile.signx), f64::from(tile.signy));

    let s = tile.slope_normal();
    let anchor = tc + Vec2::new(-signx * tile.xw, signy * tile.yw);
    let dp = (probe.support(-s) - anchor).dot(s);
    resolve_against_slope(axis, s, dp)
}

fn project_67_small(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let tc = tile.world_center();
    let (signx, signy) = (f64::from(tile.signx), f64::from(tile.signy));
    let (xw, _) = probe.extents();

    // Horizontal distance from the probe's inner edge to the tip of the small triangle.
    let inner_x = probe.center().x - signx * xw;
    let pen_x = tc.x - inner_x;
    if pen_x * signx <= 0.0 {
        return TileCollision::None;
    }

    let s = tile.slope_normal();
    let anchor = tc + Vec2::new(-signx * tile.xw, signy * tile.yw);
    let dp = (probe.support(-s) - anchor).dot(s);
    if dp >= 0.0 {
        return TileCollision::None;
    }

    let projection = s * -dp;
    let len_n = projection.magnitude();
    let len_p = axis.magnitude();
    let a_x = pen_x.abs();
    if len_p < len_n {
        if a_x < len_p {
            TileCollision::Other(Vec2::new(pen_x, 0.0))
        } else {
            TileCollision::Axis(axis)
        }
    } else if a_x < len_n {
        TileCollision::Other(Vec2::new(pen_x, 0.0))
    } else {
        TileCollision::Other(projection)
    }
}

fn project_67_big(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let tc = tile.world_center();
    let (signx, signy) = (f64::from(tile.signx), f64::from(tile.signy));

    let s = tile.slope_normal();
    let anchor = tc + Vec2::new(signx * tile.xw, -signy * tile.yw);
    let dp = (probe.support(-s) - anchor).dot(s);
    resolve_against_slope(axis, s, dp)
}

fn project_convex(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let signs = tile.signs();
    let corner = tile.world_center() - Vec2::new(signs.x * tile.xw, signs.y * tile.yw);
    let rad = tile.arc_radius();

    let (offset, pen) = match *probe {
        Probe::Circle { center, radius } => {
            let offset = center - corner;
            (offset, rad + radius - offset.magnitude())
        }
        Probe::Box { center, xw, yw } => {
            let offset = center - Vec2::new(signs.x * xw, signs.y * yw) - corner;
            (offset, rad - offset.magnitude())
        }
    };

    // Outside the arc's quadrant the flat cell faces apply.
    if signs.x * offset.x < 0.0 || signs.y * offset.y < 0.0 {
        return TileCollision::Axis(axis);
    }
    if pen <= 0.0 {
        return TileCollision::None;
    }
    let dir = offset.normalize_or(tile.slope_normal());
    TileCollision::Other(dir * pen)
}

fn project_concave(axis: Vec2, probe: &Probe, tile: &TileCell) -> TileCollision {
    let signs = tile.signs();
    let corner = tile.world_center() + Vec2::new(signs.x * tile.xw, signs.y * tile.yw);
    let rad = tile.arc_radius();

    let (offset, pen) = match *probe {
        Probe::Circle { center, radius } => {
            let offset = corner - center;
            (offset, offset.magnitude() + radius - rad)
        }
        Probe::Box { center, xw, yw } => {
            let offset = corner - (center - Vec2::new(signs.x * xw, signs.y * yw));
            (offset, offset.magnitude() - rad)
        }
    };

    if pen <= 0.0 {
        return TileCollision::None;
    }
    if axis.magnitude() < pen {
        return TileCollision::Axis(axis);
    }
    let dir = offset.normalize_or(tile.slope_normal());
    TileCollision::Other(dir * pen)
}
