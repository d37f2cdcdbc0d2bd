use crate::math::vec2::Vec2;
use crate::objects::RigidBody;

/// Semi-implicit Euler velocity update for awake dynamic bodies.
///
/// Gravity and the accumulated force feed the velocity, then damping scales it
/// by `clamp(1 - dt * (world + body), 0, 1)`. Accumulators are cleared.
pub fn integrate_velocity(body: &mut RigidBody, gravity: Vec2, linear_damping: f64, angular_damping: f64, dt: f64) {
    if !body.is_dynamic() || !body.is_awake() {
        return;
    }

    let acceleration = gravity + body.force * body.inv_mass;
    body.linear_velocity += acceleration * dt;
    body.angular_velocity += body.torque * body.inv_inertia * dt;

    body.linear_velocity *= (1.0 - dt * (linear_damping + body.linear_damping)).clamp(0.0, 1.0);
    body.angular_velocity *= (1.0 - dt * (angular_damping + body.angular_damping)).clamp(0.0, 1.0);

    body.clear_accumulators();
}

/// Moves awake dynamic and kinematic bodies by their velocities.
pub fn integrate_position(body: &mut RigidBody, dt: f64) {
    if body.is_static() || !body.is_awake() {
        return;
    }
    body.position += body.linear_velocity * dt;
    body.rotation = wrap_angle(body.rotation + body.angular_velocity * dt);
}

/// Wraps an angle in radians to the range [-PI, PI].
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    angle.sin().atan2(angle.cos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::objects::BodyType;
    use crate::shapes::{Collider, Shape};
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-9;

    /// Dynamic body of mass 1 and inertia 0.5.
    fn unit_body() -> RigidBody {
        let density = 1.0 / PI;
        let collider = Collider::new(Shape::circle(1.0)).with_material(Material::new(0.0, 0.5, density));
        RigidBody::new_dynamic(collider, Vec2::ZERO)
    }

    #[test]
    fn test_integrate_linear_motion_no_force() {
        let mut rb = unit_body();
        rb.set_velocity(Vec2::new(10.0, -5.0));
        let dt = 0.1;

        integrate_velocity(&mut rb, Vec2::ZERO, 0.0, 0.0, dt);
        integrate_position(&mut rb, dt);

        assert!((rb.position().x - 1.0).abs() < EPSILON);
        assert!((rb.position().y - -0.5).abs() < EPSILON);
        assert_eq!(rb.linear_velocity(), Vec2::new(10.0, -5.0));
    }

    #[test]
    fn test_integrate_constant_force_and_gravity() {
        let mut rb = unit_body();
        rb.apply_force(Vec2::new(5.0, 0.0));
        let dt = 0.1;

        integrate_velocity(&mut rb, Vec2::new(0.0, 10.0), 0.0, 0.0, dt);
        integrate_position(&mut rb, dt);

        assert!((rb.linear_velocity().x - 0.5).abs() < EPSILON);
        assert!((rb.linear_velocity().y - 1.0).abs() < EPSILON);
        // Semi-implicit: the new velocity moves the body.
        assert!((rb.position().x - 0.05).abs() < EPSILON);
        assert!((rb.position().y - 0.1).abs() < EPSILON);
        assert_eq!(rb.force(), Vec2::ZERO);
    }

    #[test]
    fn test_integrate_angular_motion_constant_torque() {
        let mut rb = unit_body();
        rb.apply_torque(1.0);
        let expected_alpha = 1.0 / rb.inertia();
        let dt = 0.1;

        integrate_velocity(&mut rb, Vec2::ZERO, 0.0, 0.0, dt);
        integrate_position(&mut rb, dt);

        assert!((rb.angular_velocity() - expected_alpha * dt).abs() < EPSILON);
        assert!((rb.rotation() - expected_alpha * dt * dt).abs() < EPSILON);
        assert_eq!(rb.torque(), 0.0);
    }

    #[test]
    fn test_damping_scales_velocity() {
        let mut rb = unit_body();
        rb.linear_damping = 1.0;
        rb.set_velocity(Vec2::new(10.0, 0.0));

        integrate_velocity(&mut rb, Vec2::ZERO, 1.0, 0.0, 0.1);
        // 1 - 0.1 * (1 + 1) = 0.8
        assert!((rb.linear_velocity().x - 8.0).abs() < EPSILON);

        // Heavy damping clamps to a full stop rather than reversing.
        integrate_velocity(&mut rb, Vec2::ZERO, 100.0, 0.0, 0.1);
        assert_eq!(rb.linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut rb = unit_body();
        rb.set_velocity(Vec2::new(3.0, 4.0));
        let before = rb.clone();
        integrate_velocity(&mut rb, Vec2::new(0.0, 9.8), 0.0, 0.0, 0.0);
        integrate_position(&mut rb, 0.0);
        assert_eq!(rb.position(), before.position());
        assert_eq!(rb.linear_velocity(), before.linear_velocity());
    }

    #[test]
    fn test_integrate_static_object() {
        let mut rb = RigidBody::new_static(Collider::new(Shape::circle(1.0)), Vec2::new(1.0, 1.0), 0.0);
        let initial_state = rb.clone();
        integrate_velocity(&mut rb, Vec2::new(0.0, 9.8), 0.0, 0.0, 0.1);
        integrate_position(&mut rb, 0.1);
        assert_eq!(rb, initial_state);
    }

    #[test]
    fn test_kinematic_moves_without_gravity() {
        let mut rb = RigidBody::new(BodyType::Kinematic, Vec2::ZERO, 0.0).with_collider(Collider::new(Shape::circle(1.0)));
        rb.set_velocity(Vec2::new(2.0, 0.0));
        integrate_velocity(&mut rb, Vec2::new(0.0, 9.8), 0.0, 0.0, 0.5);
        integrate_position(&mut rb, 0.5);
        assert_eq!(rb.linear_velocity(), Vec2::new(2.0, 0.0));
        assert!((rb.position().x - 1.0).abs() < EPSILON);
        assert_eq!(rb.position().y, 0.0);
    }

    #[test]
    fn test_sleeping_body_is_frozen() {
        let mut rb = unit_body();
        rb.set_awake(false);
        integrate_velocity(&mut rb, Vec2::new(0.0, 9.8), 0.0, 0.0, 0.1);
        integrate_position(&mut rb, 0.1);
        assert_eq!(rb.position(), Vec2::ZERO);
        assert_eq!(rb.linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(0.0) - 0.0).abs() < EPSILON);
        assert!((wrap_angle(PI) - PI).abs() < EPSILON);
        assert!((wrap_angle(PI + 0.1) - (-PI + 0.1)).abs() < EPSILON);
        assert!((wrap_angle(-PI - 0.1) - (PI - 0.1)).abs() < EPSILON);
        assert!((wrap_angle(2.0 * PI) - 0.0).abs() < EPSILON);
    }
}
