use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collision::bounds::Bounds;
use crate::math::{Transform, Vec2};
use crate::shapes::Collider;

/// Stable, non-owning reference to a body inside a `PhysicsWorld`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u32);

impl BodyHandle {
    pub fn from_raw(raw: u32) -> Self {
        BodyHandle(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    /// Infinite mass, never moves.
    Static,
    /// Infinite mass, moved only by its velocity.
    Kinematic,
    #[default]
    Dynamic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    handle: Option<BodyHandle>,
    body_type: BodyType,
    colliders: Vec<Collider>,
    bounds: Bounds,

    // World position of the center of mass; the body origin sits at
    // `position - rotate(local_center, rotation)`.
    pub(crate) position: Vec2,
    pub(crate) rotation: f64,
    pub(crate) local_center: Vec2,

    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f64,

    // Accumulated until the next velocity integration.
    pub(crate) force: Vec2,
    pub(crate) torque: f64,

    pub(crate) mass: f64,
    pub(crate) inv_mass: f64,
    pub(crate) inertia: f64,
    pub(crate) inv_inertia: f64,

    pub linear_damping: f64,
    pub angular_damping: f64,
    fixed_rotation: bool,

    pub category_bits: u32,
    pub mask_bits: u32,

    awake: bool,
    pub(crate) quiet_steps: u32,
}

impl RigidBody {
    /// Creates a body with its origin at `position`. Colliders are added afterwards.
    pub fn new(body_type: BodyType, position: Vec2, rotation: f64) -> Self {
        Self {
            handle: None,
            body_type,
            colliders: Vec::new(),
            bounds: Bounds::empty(),
            position,
            rotation,
            local_center: Vec2::ZERO,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            awake: true,
            quiet_steps: 0,
        }
    }

    /// Dynamic body with a single collider.
    pub fn new_dynamic(collider: Collider, position: Vec2) -> Self {
        RigidBody::new(BodyType::Dynamic, position, 0.0).with_collider(collider)
    }

    /// Static body with a single collider.
    pub fn new_static(collider: Collider, position: Vec2, rotation: f64) -> Self {
        RigidBody::new(BodyType::Static, position, rotation).with_collider(collider)
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.add_collider(collider);
        self
    }

    /// Attaches a collider and recomputes the mass data.
    pub fn add_collider(&mut self, mut collider: Collider) {
        collider.set_body(self.handle);
        collider.invalidate();
        self.colliders.push(collider);
        self.reset_mass_data();
        self.bounds.clear();
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: Option<BodyHandle>) {
        self.handle = handle;
        for collider in &mut self.colliders {
            collider.set_body(handle);
        }
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        if self.body_type == body_type {
            return;
        }
        self.body_type = body_type;
        if body_type == BodyType::Static {
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
        }
        self.reset_mass_data();
        self.set_awake(true);
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_kinematic(&self) -> bool {
        self.body_type == BodyType::Kinematic
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// World position of the center of mass.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn local_center(&self) -> Vec2 {
        self.local_center
    }

    /// World position of the body origin, where the colliders' local space is anchored.
    pub fn origin(&self) -> Vec2 {
        self.position - self.local_center.rotate(self.rotation)
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.origin(), self.rotation)
    }

    /// Moves the center of mass to `position`.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate_caches();
    }

    /// Places the body origin at `origin` with the given angle.
    pub fn set_transform(&mut self, origin: Vec2, rotation: f64) {
        self.rotation = rotation;
        self.position = origin + self.local_center.rotate(rotation);
        self.invalidate_caches();
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Sets the linear velocity. A non-zero write wakes the body; a zero write
    /// leaves a sleeping body asleep.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        if self.is_static() {
            return;
        }
        if velocity != Vec2::ZERO {
            self.set_awake(true);
        }
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, omega: f64) {
        if self.is_static() {
            return;
        }
        if omega != 0.0 {
            self.set_awake(true);
        }
        self.angular_velocity = omega;
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.reset_mass_data();
    }

    /// Recomputes mass, center of mass and rotational inertia from the colliders.
    ///
    /// The body origin stays in place; the center of mass moves to the new
    /// centroid. Non-dynamic bodies get zero inverse mass and inertia.
    pub fn reset_mass_data(&mut self) {
        let origin = self.origin();

        self.local_center = Vec2::ZERO;
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;

        if !self.is_dynamic() {
            self.position = origin;
            return;
        }

        let mut total_mass = 0.0;
        let mut mass_centroid = Vec2::ZERO;
        let mut total_inertia = 0.0;
        for collider in &self.colliders {
            let mass = collider.shape.area() * collider.material.density;
            mass_centroid += collider.shape.centroid() * mass;
            total_mass += mass;
            total_inertia += collider.shape.inertia(mass);
        }

        if total_mass > 0.0 {
            self.local_center = mass_centroid / total_mass;
            self.mass = total_mass;
        } else {
            // Massless geometry still needs to respond to forces.
            self.mass = 1.0;
        }
        self.inv_mass = 1.0 / self.mass;

        if !self.fixed_rotation {
            // Parallel axis: move the inertia from the origin to the centroid.
            let inertia = total_inertia - total_mass * self.local_center.magnitude_squared();
            if inertia > 0.0 {
                self.inertia = inertia;
                self.inv_inertia = 1.0 / inertia;
            }
        }

        let old_position = self.position;
        self.position = origin + self.local_center.rotate(self.rotation);
        // Keep the velocity of the material points unchanged.
        self.linear_velocity += (old_position - self.position).perpendicular() * self.angular_velocity;
    }

    /// Refreshes every collider's world-space cache and the body bounds.
    pub fn cache_data(&mut self, generation: u64) {
        let xf = self.transform();
        self.bounds.clear();
        for collider in &mut self.colliders {
            collider.cache_data(&xf, generation);
            self.bounds.add_bounds(collider.bounds());
        }
    }

    /// Whether every collider was cached for `generation` and not moved since.
    pub fn is_current(&self, generation: u64) -> bool {
        self.colliders.iter().all(|collider| collider.is_current(generation))
    }

    /// Drops the world-space caches after a teleport.
    fn invalidate_caches(&mut self) {
        self.bounds.clear();
        for collider in &mut self.colliders {
            collider.invalidate();
        }
    }

    /// Union of the collider bounds as of the last `cache_data`. Empty after
    /// a pose write until the next `cache_data`.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Applies a force at the center of mass.
    pub fn apply_force(&mut self, force: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_for(force != Vec2::ZERO);
        self.force += force;
    }

    /// Applies a force at a specific point (in world coordinates).
    /// This generates both linear force and torque.
    pub fn apply_force_at_point(&mut self, force: Vec2, point_world: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_for(force != Vec2::ZERO);
        self.force += force;
        self.torque += (point_world - self.position).cross(force);
    }

    pub fn apply_torque(&mut self, torque: f64) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_for(torque != 0.0);
        self.torque += torque;
    }

    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point_world: Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_for(impulse != Vec2::ZERO);
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += (point_world - self.position).cross(impulse) * self.inv_inertia;
    }

    pub fn apply_angular_impulse(&mut self, impulse: f64) {
        if !self.is_dynamic() {
            return;
        }
        self.wake_for(impulse != 0.0);
        self.angular_velocity += impulse * self.inv_inertia;
    }

    fn wake_for(&mut self, nonzero: bool) {
        if nonzero && !self.awake {
            self.set_awake(true);
        }
    }

    /// Should typically be called after integration in each simulation step.
    pub fn clear_accumulators(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * (self.mass * self.linear_velocity.magnitude_squared()
            + self.inertia * self.angular_velocity * self.angular_velocity)
    }

    pub fn is_awake(&self) -> bool {
        self.awake
    }

    /// Putting a body to sleep zeroes its velocities and accumulators.
    pub fn set_awake(&mut self, awake: bool) {
        self.awake = awake;
        self.quiet_steps = 0;
        if !awake {
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.clear_accumulators();
        }
    }

    /// Awake and able to move: the bodies that drive pair generation.
    pub fn is_mover(&self) -> bool {
        self.awake && !self.is_static()
    }

    /// Whether contacts between `self` and `other` should be generated.
    pub fn is_collidable(&self, other: &RigidBody) -> bool {
        if self.handle.is_some() && self.handle == other.handle {
            return false;
        }
        if !self.is_dynamic() && !other.is_dynamic() {
            return false;
        }
        (self.mask_bits & other.category_bits) != 0 && (other.mask_bits & self.category_bits) != 0
    }
}
