//! Sequential-impulse contact resolution.
//!
//! Constraints are rebuilt from the step's manifolds every step; impulses
//! start at zero (no warm starting).

use log::trace;

use crate::collision::Manifold;
use crate::math::Vec2;
use crate::objects::RigidBody;

use super::config::WorldConfig;

#[derive(Debug, Clone)]
struct ContactPoint {
    normal: Vec2,
    depth: f64,
    r1: Vec2,
    r2: Vec2,
    r1_local: Vec2,
    r2_local: Vec2,
    /// Effective mass along the normal.
    emn: f64,
    /// Effective mass along the tangent.
    emt: f64,
    bounce: f64,
    lambda_n: f64,
    lambda_t: f64,
}

#[derive(Debug, Clone)]
struct ContactConstraint {
    body_a: usize,
    body_b: usize,
    // (inverse mass, inverse inertia) as seen by this step's solve.
    inv_a: (f64, f64),
    inv_b: (f64, f64),
    friction: f64,
    points: Vec<ContactPoint>,
}

#[derive(Debug, Clone)]
pub struct ContactSolver {
    constraints: Vec<ContactConstraint>,
    baumgarte: f64,
    slop: f64,
    max_correction: f64,
}

/// Two distinct bodies borrowed mutably from the same slice.
fn pair_mut(bodies: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    assert_ne!(a, b, "a body cannot collide with itself");
    if a < b {
        let (lo, hi) = bodies.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = bodies.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Sleeping bodies take part as immovable targets.
fn solver_inverse_mass(body: &RigidBody) -> (f64, f64) {
    if body.is_awake() {
        (body.inv_mass, body.inv_inertia)
    } else {
        (0.0, 0.0)
    }
}

fn velocity_at(body: &RigidBody, r: Vec2) -> Vec2 {
    body.linear_velocity + r.perpendicular() * body.angular_velocity
}

impl ContactSolver {
    /// Prepares one constraint per manifold against the current body state.
    pub fn new(manifolds: &[Manifold], bodies: &[RigidBody], config: &WorldConfig) -> Self {
        let constraints = manifolds
            .iter()
            .filter(|m| !m.contacts.is_empty())
            .map(|m| {
                let body1 = &bodies[m.body_a_idx];
                let body2 = &bodies[m.body_b_idx];
                let (m1_inv, i1_inv) = solver_inverse_mass(body1);
                let (m2_inv, i2_inv) = solver_inverse_mass(body2);
                let sum_m_inv = m1_inv + m2_inv;

                let points = m
                    .contacts
                    .iter()
                    .map(|contact| {
                        let n = contact.normal;
                        let t = n.perpendicular();
                        let r1 = contact.point - body1.position;
                        let r2 = contact.point - body2.position;

                        let sn1 = r1.cross(n);
                        let sn2 = r2.cross(n);
                        let emn_inv = sum_m_inv + i1_inv * sn1 * sn1 + i2_inv * sn2 * sn2;

                        let st1 = r1.cross(t);
                        let st2 = r2.cross(t);
                        let emt_inv = sum_m_inv + i1_inv * st1 * st1 + i2_inv * st2 * st2;

                        let rv = velocity_at(body2, r2) - velocity_at(body1, r1);

                        ContactPoint {
                            normal: n,
                            depth: contact.depth,
                            r1,
                            r2,
                            r1_local: r1.rotate(-body1.rotation),
                            r2_local: r2.rotate(-body2.rotation),
                            emn: if emn_inv == 0.0 { 0.0 } else { 1.0 / emn_inv },
                            emt: if emt_inv == 0.0 { 0.0 } else { 1.0 / emt_inv },
                            bounce: rv.dot(n) * m.restitution,
                            lambda_n: 0.0,
                            lambda_t: 0.0,
                        }
                    })
                    .collect();

                ContactConstraint {
                    body_a: m.body_a_idx,
                    body_b: m.body_b_idx,
                    inv_a: (m1_inv, i1_inv),
                    inv_b: (m2_inv, i2_inv),
                    friction: m.friction,
                    points,
                }
            })
            .collect();

        ContactSolver {
            constraints,
            baumgarte: config.baumgarte,
            slop: config.collision_slop,
            max_correction: config.max_linear_correction,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// One pass of normal and friction impulses over every contact.
    pub fn solve_velocity_constraints(&mut self, bodies: &mut [RigidBody]) {
        for constraint in &mut self.constraints {
            let (body1, body2) = pair_mut(bodies, constraint.body_a, constraint.body_b);
            let (m1_inv, i1_inv) = constraint.inv_a;
            let (m2_inv, i2_inv) = constraint.inv_b;

            for con in &mut constraint.points {
                let n = con.normal;
                let t = n.perpendicular();
                let rv = velocity_at(body2, con.r2) - velocity_at(body1, con.r1);

                let lambda_n = -con.emn * (n.dot(rv) + con.bounce);
                let lambda_n_old = con.lambda_n;
                con.lambda_n = (lambda_n_old + lambda_n).max(0.0);
                let lambda_n = con.lambda_n - lambda_n_old;

                // Coulomb friction bounded by the accumulated normal impulse.
                let lambda_t = -con.emt * t.dot(rv);
                let lambda_t_max = con.lambda_n * constraint.friction;
                let lambda_t_old = con.lambda_t;
                con.lambda_t = (lambda_t_old + lambda_t).clamp(-lambda_t_max, lambda_t_max);
                let lambda_t = con.lambda_t - lambda_t_old;

                let impulse = n * lambda_n + t * lambda_t;

                body1.linear_velocity += impulse * -m1_inv;
                body1.angular_velocity -= con.r1.cross(impulse) * i1_inv;
                body2.linear_velocity += impulse * m2_inv;
                body2.angular_velocity += con.r2.cross(impulse) * i2_inv;
            }
        }
    }

    /// One pass of positional correction. Returns true once the deepest
    /// remaining penetration is within three times the slop.
    pub fn solve_position_constraints(&mut self, bodies: &mut [RigidBody]) -> bool {
        let mut max_penetration: f64 = 0.0;

        for constraint in &self.constraints {
            let (body1, body2) = pair_mut(bodies, constraint.body_a, constraint.body_b);
            let (m1_inv, i1_inv) = constraint.inv_a;
            let (m2_inv, i2_inv) = constraint.inv_b;
            let sum_m_inv = m1_inv + m2_inv;

            for con in &constraint.points {
                let n = con.normal;
                let r1 = con.r1_local.rotate(body1.rotation);
                let r2 = con.r2_local.rotate(body2.rotation);
                let p1 = body1.position + r1;
                let p2 = body2.position + r2;

                // Signed separation; negative while still overlapping.
                let c = (p2 - p1).dot(n) - con.depth;
                let correction = (self.baumgarte * (c + self.slop)).clamp(-self.max_correction, 0.0);
                if correction == 0.0 {
                    continue;
                }
                max_penetration = max_penetration.max(-c);

                let sn1 = r1.cross(n);
                let sn2 = r2.cross(n);
                let em_inv = sum_m_inv + i1_inv * sn1 * sn1 + i2_inv * sn2 * sn2;
                let lambda_dt = if em_inv == 0.0 { 0.0 } else { -correction / em_inv };
                let impulse_dt = n * lambda_dt;

                body1.position += impulse_dt * -m1_inv;
                body1.rotation -= sn1 * lambda_dt * i1_inv;
                body2.position += impulse_dt * m2_inv;
                body2.rotation += sn2 * lambda_dt * i2_inv;
            }
        }

        trace!("position pass: max penetration {max_penetration:.5}");
        max_penetration <= self.slop * 3.0
    }
}
