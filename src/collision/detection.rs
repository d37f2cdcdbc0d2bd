//! Narrow phase: exact contact generation for each pair of shape types.
//!
//! Every pair function reads world-space data refreshed by `cache_data` and
//! returns contacts whose normal points from the first argument toward the
//! second, with a positive penetration depth.

use std::cmp::Ordering;

use crate::math::vec2::Vec2;
use crate::shapes::{Circle, Collider, Plane, Polygon, Segment, Shape, TileCell};

use super::manifold::Contact;
use super::tile_projection::{collide_vs_tile, Probe};

/// Canonical order for a circle pair, so both argument orders share the
/// concentric fallback normal. Equal for any other shape pair.
fn circle_order(a: &Collider, b: &Collider) -> Ordering {
    let (Shape::Circle(c1), Shape::Circle(c2)) = (&a.shape, &b.shape) else {
        return Ordering::Equal;
    };
    let (p1, p2) = (c1.world_center(), c2.world_center());
    c1.radius
        .total_cmp(&c2.radius)
        .then(p1.x.total_cmp(&p2.x))
        .then(p1.y.total_cmp(&p2.y))
        .then(a.body().cmp(&b.body()))
        .then((a as *const Collider).cmp(&(b as *const Collider)))
}

/// Contact between two discs. Touching discs report a zero-depth contact.
fn circle_circle_at(c1: Vec2, r1: f64, c2: Vec2, r2: f64) -> Option<Contact> {
    let rsum = r1 + r2;
    let t = c2 - c1;
    let dist_sq = t.magnitude_squared();
    if dist_sq > rsum * rsum {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist == 0.0 {
        // Concentric: no preferred direction, push along +y. `collide` orders
        // the pair so the reverse call gets the opposite normal.
        return Some(Contact::new(c1, Vec2::UNIT_Y, rsum));
    }

    // Midway between the two surface points along the center line.
    let point = c1.mul_add(t, 0.5 + (r1 - r2) * 0.5 / dist);
    Some(Contact::new(point, t / dist, rsum - dist))
}

pub fn check_circle_circle(a: &Circle, b: &Circle) -> Option<Contact> {
    circle_circle_at(a.world_center(), a.radius, b.world_center(), b.radius)
}

pub fn check_circle_segment(circle: &Circle, seg: &Segment) -> Option<Contact> {
    let center = circle.world_center();
    let rsum = circle.radius + seg.radius;
    let tn = seg.world_normal();

    // Normal distance from the segment's line.
    let dn = center.dot(tn) - seg.world_a().dot(tn);
    let dist = dn.abs() - rsum;
    if dist > 0.0 {
        return None;
    }

    // Tangential position along the segment.
    let dir = seg.world_direction();
    let dt = center.dot(dir);
    let dt_min = seg.world_a().dot(dir);
    let dt_max = seg.world_b().dot(dir);

    if dt < dt_min {
        if dt < dt_min - rsum {
            return None;
        }
        return circle_circle_at(center, circle.radius, seg.world_a(), seg.radius);
    }
    if dt > dt_max {
        if dt > dt_max + rsum {
            return None;
        }
        return circle_circle_at(center, circle.radius, seg.world_b(), seg.radius);
    }

    // `n` faces the circle's side of the segment.
    let n = if dn > 0.0 { tn } else { -tn };
    let point = center.mul_add(n, -(circle.radius + dist * 0.5));
    Some(Contact::new(point, -n, -dist))
}

pub fn check_circle_polygon(circle: &Circle, poly: &Polygon) -> Option<Contact> {
    let center = circle.world_center();
    let planes = poly.world_planes();
    let verts = poly.world_vertices();

    let mut min_dist = f64::NEG_INFINITY;
    let mut min_idx = 0;
    for (i, plane) in planes.iter().enumerate() {
        let dist = center.dot(plane.normal) - plane.d - circle.radius;
        if dist > 0.0 {
            return None;
        }
        if dist > min_dist {
            min_dist = dist;
            min_idx = i;
        }
    }

    let n = planes[min_idx].normal;
    let a = verts[min_idx];
    let b = verts[(min_idx + 1) % verts.len()];

    // Past either end of the closest edge the circle meets a vertex instead.
    let edge = (b - a).normalize_or(n.perpendicular());
    let t = center.dot(edge);
    if t < a.dot(edge) {
        return circle_circle_at(center, circle.radius, a, 0.0);
    }
    if t > b.dot(edge) {
        return circle_circle_at(center, circle.radius, b, 0.0);
    }

    let point = center.mul_add(n, -(circle.radius + min_dist * 0.5));
    Some(Contact::new(point, -n, -min_dist))
}

/// Squared distance from `p` to the world-space segment.
fn segment_point_distance_sq(seg: &Segment, p: Vec2) -> f64 {
    let w = p - seg.world_a();
    let d = seg.world_b() - seg.world_a();
    let proj = w.dot(d);
    if proj <= 0.0 {
        return w.dot(w);
    }
    let vsq = d.dot(d);
    if proj >= vsq {
        return w.dot(w) - 2.0 * proj + vsq;
    }
    w.dot(w) - proj * proj / vsq
}

/// Parameter of the point on `a + u * s` closest to `p`, clamped to `[0, 1]`.
fn clamped_param(a: Vec2, u: Vec2, p: Vec2) -> f64 {
    let len_sq = u.dot(u);
    if len_sq == 0.0 {
        return 0.0;
    }
    ((p - a).dot(u) / len_sq).clamp(0.0, 1.0)
}

pub fn check_segment_segment(seg1: &Segment, seg2: &Segment) -> Option<Contact> {
    let (a1, b1) = (seg1.world_a(), seg1.world_b());
    let (a2, b2) = (seg2.world_a(), seg2.world_b());
    let u = b1 - a1;
    let v = b2 - a2;

    // The closest pair always involves at least one endpoint.
    let candidates = [
        segment_point_distance_sq(seg1, a2),
        segment_point_distance_sq(seg1, b2),
        segment_point_distance_sq(seg2, a1),
        segment_point_distance_sq(seg2, b1),
    ];
    let idx1 = if candidates[0] < candidates[1] { 0 } else { 1 };
    let idx2 = if candidates[2] < candidates[3] { 2 } else { 3 };
    let idx = if candidates[idx1] < candidates[idx2] { idx1 } else { idx2 };

    let (s, t) = match idx {
        0 => (clamped_param(a1, u, a2), 0.0),
        1 => (clamped_param(a1, u, b2), 1.0),
        2 => (0.0, clamped_param(a2, v, a1)),
        _ => (1.0, clamped_param(a2, v, b1)),
    };

    circle_circle_at(a1.mul_add(u, s), seg1.radius, a2.mul_add(v, t), seg2.radius)
}

/// Polygon vertices that have crossed the segment's face on the side selected by `coef`.
fn find_points_behind_segment(contacts: &mut Vec<Contact>, seg: &Segment, poly: &Polygon, dist: f64, coef: f64) {
    let tn = seg.world_normal();
    let dir = seg.world_direction();
    let dt_min = dir.dot(seg.world_a());
    let dt_max = dir.dot(seg.world_b());
    let n = tn * coef;
    let face = tn.dot(seg.world_a()) * coef + seg.radius;

    for v in poly.world_vertices() {
        if v.dot(n) < face {
            let dt = dir.dot(*v);
            if dt_min <= dt && dt <= dt_max {
                contacts.push(Contact::new(*v, n, -dist));
            }
        }
    }
}

pub fn check_segment_polygon(seg: &Segment, poly: &Polygon) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let tn = seg.world_normal();
    let seg_td = tn.dot(seg.world_a());

    let seg_d1 = poly.distance_on_plane(tn, seg_td) - seg.radius;
    if seg_d1 > 0.0 {
        return contacts;
    }
    let seg_d2 = poly.distance_on_plane(-tn, -seg_td) - seg.radius;
    if seg_d2 > 0.0 {
        return contacts;
    }

    let planes = poly.world_planes();
    let mut poly_d = f64::NEG_INFINITY;
    let mut poly_i = 0;
    for (i, plane) in planes.iter().enumerate() {
        let dist = seg.distance_on_plane(plane.normal, plane.d);
        if dist > 0.0 {
            return contacts;
        }
        if dist > poly_d {
            poly_d = dist;
            poly_i = i;
        }
    }

    let poly_n = -planes[poly_i].normal;
    let va = seg.world_a().mul_add(poly_n, seg.radius);
    let vb = seg.world_b().mul_add(poly_n, seg.radius);
    if poly.point_query(va) {
        contacts.push(Contact::new(va, poly_n, -poly_d));
    }
    if poly.point_query(vb) {
        contacts.push(Contact::new(vb, poly_n, -poly_d));
    }

    // Slack for the comparison of the two separations.
    let poly_d = poly_d - 0.1;
    if seg_d1 >= poly_d || seg_d2 >= poly_d {
        if seg_d1 > seg_d2 {
            find_points_behind_segment(&mut contacts, seg, poly, seg_d1, 1.0);
        } else {
            find_points_behind_segment(&mut contacts, seg, poly, seg_d2, -1.0);
        }
    }

    if contacts.is_empty() {
        // Fall back to the segment caps against the closest edge's endpoints.
        let verts = poly.world_vertices();
        let poly_a = verts[poly_i];
        let poly_b = verts[(poly_i + 1) % verts.len()];
        let pairs = [
            (seg.world_a(), poly_a),
            (seg.world_b(), poly_a),
            (seg.world_a(), poly_b),
            (seg.world_b(), poly_b),
        ];
        if let Some(contact) = pairs
            .iter()
            .find_map(|&(cap, vertex)| circle_circle_at(cap, seg.radius, vertex, 0.0))
        {
            contacts.push(contact);
        }
    }

    contacts
}

/// Minimum separating axis of `poly` against `planes`: the shallowest
/// penetration and its plane index, or `None` once a plane separates them.
fn find_min_separating_axis(poly: &Polygon, planes: &[Plane]) -> Option<(f64, usize)> {
    let mut min_dist = f64::NEG_INFINITY;
    let mut min_index = 0;
    for (i, plane) in planes.iter().enumerate() {
        let dist = poly.distance_on_plane(plane.normal, plane.d);
        if dist > 0.0 {
            return None;
        }
        if dist > min_dist {
            min_dist = dist;
            min_index = i;
        }
    }
    Some((min_dist, min_index))
}

fn find_verts(poly1: &Polygon, poly2: &Polygon, n: Vec2, dist: f64) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = poly1
        .world_vertices()
        .iter()
        .filter(|v| poly2.point_query(**v))
        .chain(poly2.world_vertices().iter().filter(|v| poly1.point_query(**v)))
        .map(|v| Contact::new(*v, n, -dist))
        .collect();

    if contacts.is_empty() {
        // Rounding can leave every vertex a hair outside; test only the planes facing `n`.
        contacts = poly1
            .world_vertices()
            .iter()
            .filter(|v| poly2.contain_point_partial(**v, n))
            .chain(poly2.world_vertices().iter().filter(|v| poly1.contain_point_partial(**v, n)))
            .map(|v| Contact::new(*v, n, -dist))
            .collect();
    }
    contacts
}

pub fn check_polygon_polygon(poly1: &Polygon, poly2: &Polygon) -> Vec<Contact> {
    let Some((dist1, index1)) = find_min_separating_axis(poly2, poly1.world_planes()) else {
        return Vec::new();
    };
    let Some((dist2, index2)) = find_min_separating_axis(poly1, poly2.world_planes()) else {
        return Vec::new();
    };

    if dist1 > dist2 {
        find_verts(poly1, poly2, poly1.world_planes()[index1].normal, dist1)
    } else {
        find_verts(poly1, poly2, -poly2.world_planes()[index2].normal, dist2)
    }
}

/// Contact between a probe and a tile cell, from the probe toward the cell.
pub fn check_probe_tile(probe: &Probe, tile: &TileCell) -> Option<Contact> {
    let push = collide_vs_tile(probe, tile).vector()?;
    let depth = push.magnitude();
    let out = push.normalize_or(Vec2::UNIT_Y);
    let normal = -out;
    let point = probe.support(normal).mul_add(out, depth * 0.5);
    Some(Contact::new(point, normal, depth))
}

/// Probe used when `collider` meets a tile: circles keep their shape,
/// everything else collides through its world bounds.
fn tile_probe(collider: &Collider) -> Probe {
    match &collider.shape {
        Shape::Circle(c) => Probe::Circle {
            center: c.world_center(),
            radius: c.radius,
        },
        _ => {
            let bounds = collider.bounds();
            let ext = bounds.extents();
            Probe::Box {
                center: bounds.center(),
                xw: ext.x,
                yw: ext.y,
            }
        }
    }
}

/// Runs the pair function for the two colliders' shape types.
///
/// Pairs are evaluated with the lower shape type first and the normals
/// flipped back when the arguments came in the other order. Two tiles
/// never collide.
pub fn collide(a: &Collider, b: &Collider) -> Vec<Contact> {
    if a.shape.shape_type() > b.shape.shape_type() || circle_order(a, b) == Ordering::Greater {
        return collide(b, a).into_iter().map(Contact::flipped).collect();
    }

    match (&a.shape, &b.shape) {
        (Shape::Circle(c1), Shape::Circle(c2)) => check_circle_circle(c1, c2).into_iter().collect(),
        (Shape::Circle(c), Shape::Segment(s)) => check_circle_segment(c, s).into_iter().collect(),
        (Shape::Circle(c), Shape::Polygon(p)) => check_circle_polygon(c, p).into_iter().collect(),
        (Shape::Segment(s1), Shape::Segment(s2)) => check_segment_segment(s1, s2).into_iter().collect(),
        (Shape::Segment(s), Shape::Polygon(p)) => check_segment_polygon(s, p),
        (Shape::Polygon(p1), Shape::Polygon(p2)) => check_polygon_polygon(p1, p2),
        (Shape::Tile(_), Shape::Tile(_)) => Vec::new(),
        (_, Shape::Tile(t)) => check_probe_tile(&tile_probe(a), t).into_iter().collect(),
        // Remaining combinations are the reversed orders handled above.
        _ => Vec::new(),
    }
}
