use std::collections::HashMap;
use std::fmt;

use log::{debug, trace, warn};

use crate::collision::{self, Bounds, Manifold};
use crate::error::{PhysicsError, Result};
use crate::integration::{integrate_position, integrate_velocity};
use crate::math::vec2::Vec2;
use crate::objects::{BodyHandle, RigidBody};

use super::config::WorldConfig;
use super::contact_solver::ContactSolver;

/// Where the world is inside `step`. Outside of a step it is always `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPhase {
    #[default]
    Idle,
    Integrating,
    BroadPhase,
    NarrowPhase,
    Resolving,
}

/// Reported once per colliding collider pair, using its deepest contact.
///
/// `normal` points from `body_a` toward `body_b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub normal: Vec2,
    pub penetration: f64,
}

/// Removal requests collected while a step is running. They are applied
/// once the step has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredRemovals {
    handles: Vec<BodyHandle>,
}

impl DeferredRemovals {
    pub fn remove(&mut self, handle: BodyHandle) {
        if !self.handles.contains(&handle) {
            self.handles.push(handle);
        }
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.handles.contains(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }
}

/// Counters from the most recent `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepStats {
    /// Broad-phase pairs left after filtering.
    pub candidate_pairs: usize,
    pub manifolds: usize,
    pub contacts: usize,
    /// Whether the position iterations brought every contact within tolerance.
    pub position_solved: bool,
}

type CollisionListener = Box<dyn FnMut(&CollisionEvent, &mut DeferredRemovals)>;

pub struct PhysicsWorld {
    bodies: Vec<RigidBody>,
    // Parallel to `bodies`.
    handles: Vec<BodyHandle>,
    index: HashMap<BodyHandle, usize>,
    next_handle: u32,
    config: WorldConfig,
    // Stamp handed to `cache_data`; zero is reserved for "never cached".
    generation: u64,
    phase: StepPhase,
    accumulator: f64,
    listener: Option<CollisionListener>,
    stats: StepStats,
}

impl PhysicsWorld {
    /// Creates a new, empty physics world with default settings.
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            handles: Vec::new(),
            index: HashMap::new(),
            next_handle: 0,
            config: WorldConfig::default(),
            generation: 1,
            phase: StepPhase::Idle,
            accumulator: 0.0,
            listener: None,
            stats: StepStats::default(),
        }
    }

    pub fn with_config(config: WorldConfig) -> Result<Self> {
        let mut world = Self::new();
        world.set_config(config)?;
        Ok(world)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: WorldConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn stats(&self) -> StepStats {
        self.stats
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Adds a body to the world and returns its handle.
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyHandle {
        let handle = BodyHandle::from_raw(self.next_handle);
        self.next_handle += 1;

        body.set_handle(Some(handle));
        body.cache_data(self.generation);
        debug!(
            "added {handle}: {:?} with {} collider(s)",
            body.body_type(),
            body.colliders().len()
        );

        self.index.insert(handle, self.bodies.len());
        self.bodies.push(body);
        self.handles.push(handle);
        handle
    }

    /// Removes a body and hands it back, detached. Sleeping bodies that were
    /// touching it are woken so they can fall into the gap.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let Some(idx) = self.index.get(&handle).copied() else {
            warn!("remove_body: unknown handle {handle}");
            return Err(PhysicsError::UnknownBody(handle));
        };

        self.refresh_caches();
        let mut body = self.bodies.remove(idx);
        self.handles.remove(idx);
        self.rebuild_index();

        let gap = *body.bounds();
        for (other, other_handle) in self.bodies.iter_mut().zip(&self.handles) {
            if other.is_dynamic() && !other.is_awake() && other.bounds().intersects_bounds(&gap) {
                other.set_awake(true);
                debug!("{other_handle} woken by removal of {handle}");
            }
        }

        body.set_handle(None);
        debug!("removed {handle}");
        Ok(body)
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (idx, handle) in self.handles.iter().enumerate() {
            self.index.insert(*handle, idx);
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.index.get(&handle).map(|&idx| &self.bodies[idx])
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        match self.index.get(&handle) {
            Some(&idx) => Some(&mut self.bodies[idx]),
            None => None,
        }
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index.contains_key(&handle)
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn handles(&self) -> &[BodyHandle] {
        &self.handles
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Installs the callback invoked for every colliding pair during the
    /// resolving phase. Bodies queued on the `DeferredRemovals` argument are
    /// removed once the step completes.
    pub fn set_collision_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&CollisionEvent, &mut DeferredRemovals) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_collision_listener(&mut self) {
        self.listener = None;
    }

    fn enter(&mut self, phase: StepPhase) {
        trace!("step phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Advances the simulation by one time step `dt`.
    ///
    /// With `dt == 0` nothing moves: contacts are still detected, counted and
    /// reported, but neither the solver nor the sleep bookkeeping runs.
    pub fn step(&mut self, dt: f64) {
        if !(dt >= 0.0 && dt.is_finite()) {
            warn!("step: ignoring invalid dt {dt}");
            return;
        }

        self.enter(StepPhase::Integrating);
        let (gravity, linear_damping, angular_damping) =
            (self.config.gravity, self.config.linear_damping, self.config.angular_damping);
        for body in &mut self.bodies {
            integrate_velocity(body, gravity, linear_damping, angular_damping, dt);
            integrate_position(body, dt);
        }
        self.generation += 1;
        for body in &mut self.bodies {
            body.cache_data(self.generation);
        }

        self.enter(StepPhase::BroadPhase);
        let pairs = self.find_candidate_pairs();

        self.enter(StepPhase::NarrowPhase);
        let manifolds = self.build_manifolds(&pairs);

        self.enter(StepPhase::Resolving);
        let removals = self.report_collisions(&manifolds);

        let mut position_solved = true;
        if dt > 0.0 {
            self.wake_touched_sleepers(&manifolds);
            position_solved = self.solve_contacts(&manifolds);
            if self.config.allow_sleep {
                self.update_sleep(&manifolds, position_solved);
            }
        }

        self.stats = StepStats {
            candidate_pairs: pairs.len(),
            manifolds: manifolds.len(),
            contacts: manifolds.iter().map(|m| m.contacts.len()).sum(),
            position_solved,
        };

        for handle in removals.handles {
            if let Err(err) = self.remove_body(handle) {
                trace!("deferred removal skipped: {err}");
            }
        }

        self.enter(StepPhase::Idle);
    }

    /// Runs as many `fixed_timestep` steps as the accumulated frame time
    /// allows, up to `max_substeps`, and returns how many were taken.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        if !(frame_dt >= 0.0 && frame_dt.is_finite()) {
            warn!("advance: ignoring invalid frame time {frame_dt}");
            return 0;
        }

        let fixed = self.config.fixed_timestep;
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= fixed && steps < self.config.max_substeps {
            self.step(fixed);
            self.accumulator -= fixed;
            steps += 1;
        }

        if self.accumulator >= fixed {
            warn!(
                "advance: dropping {:.4}s of simulation after {steps} substeps",
                self.accumulator - self.accumulator % fixed
            );
            self.accumulator %= fixed;
        }
        steps
    }

    /// Bounds-overlapping pairs in which at least one body can move and the
    /// filter bits allow contact.
    fn find_candidate_pairs(&self) -> Vec<(usize, usize)> {
        let bounds: Vec<Bounds> = self.bodies.iter().map(|b| *b.bounds()).collect();
        let pairs: Vec<(usize, usize)> = collision::sort_and_sweep_pairs(&bounds)
            .into_iter()
            .filter(|&(i, j)| {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                (a.is_mover() || b.is_mover()) && a.is_collidable(b)
            })
            .collect();
        trace!("broad phase: {} candidate pairs", pairs.len());
        pairs
    }

    /// One manifold per touching collider pair.
    fn build_manifolds(&self, pairs: &[(usize, usize)]) -> Vec<Manifold> {
        let mut manifolds = Vec::new();
        for &(i, j) in pairs {
            let (body_a, body_b) = (&self.bodies[i], &self.bodies[j]);
            debug_assert!(
                body_a.is_current(self.generation) && body_b.is_current(self.generation),
                "stale collider cache in the narrow phase"
            );
            for collider_a in body_a.colliders() {
                for collider_b in body_b.colliders() {
                    if !collider_a.bounds().intersects_bounds(collider_b.bounds()) {
                        continue;
                    }
                    let contacts = collision::collide(collider_a, collider_b);
                    if contacts.is_empty() {
                        continue;
                    }
                    trace!(
                        "{} vs {}: {} contact(s)",
                        self.handles[i],
                        self.handles[j],
                        contacts.len()
                    );
                    manifolds.push(Manifold {
                        body_a_idx: i,
                        body_b_idx: j,
                        body_a: self.handles[i],
                        body_b: self.handles[j],
                        contacts,
                        restitution: collider_a.material.mixed_restitution(&collider_b.material),
                        friction: collider_a.material.mixed_friction(&collider_b.material),
                    });
                }
            }
        }
        manifolds
    }

    fn report_collisions(&mut self, manifolds: &[Manifold]) -> DeferredRemovals {
        let mut removals = DeferredRemovals::default();
        let Some(listener) = self.listener.as_mut() else {
            return removals;
        };
        for manifold in manifolds {
            if let Some(deepest) = manifold.deepest() {
                let event = CollisionEvent {
                    body_a: manifold.body_a,
                    body_b: manifold.body_b,
                    normal: deepest.normal,
                    penetration: deepest.depth,
                };
                listener(&event, &mut removals);
            }
        }
        removals
    }

    /// Wakes sleeping bodies that touch an awake dynamic body or a moving
    /// kinematic one. A resting partner counts as well: it may be about to
    /// push, and `update_sleep` only lets touching bodies sleep together.
    fn wake_touched_sleepers(&mut self, manifolds: &[Manifold]) {
        for manifold in manifolds {
            for (sleeper, partner) in [
                (manifold.body_a_idx, manifold.body_b_idx),
                (manifold.body_b_idx, manifold.body_a_idx),
            ] {
                let wakes = {
                    let (s, p) = (&self.bodies[sleeper], &self.bodies[partner]);
                    s.is_dynamic() && !s.is_awake() && self.disturbs(p)
                };
                if wakes {
                    self.bodies[sleeper].set_awake(true);
                    debug!("{} woken by contact with {}", self.handles[sleeper], self.handles[partner]);
                }
            }
        }
    }

    /// Awake dynamic bodies, and kinematic bodies outside the sleep tolerances.
    fn disturbs(&self, body: &RigidBody) -> bool {
        body.is_mover() && (body.is_dynamic() || !self.is_quiet(body))
    }

    fn is_quiet(&self, body: &RigidBody) -> bool {
        let lin_tol = self.config.sleep_linear_tolerance;
        let ang_tol = self.config.sleep_angular_tolerance;
        body.linear_velocity.magnitude_squared() <= lin_tol * lin_tol
            && body.angular_velocity * body.angular_velocity <= ang_tol * ang_tol
    }

    /// Velocity iterations, then position iterations until solved. Returns
    /// whether the position pass converged.
    fn solve_contacts(&mut self, manifolds: &[Manifold]) -> bool {
        let mut solver = ContactSolver::new(manifolds, &self.bodies, &self.config);
        if solver.is_empty() {
            return true;
        }

        for _ in 0..self.config.velocity_iterations {
            solver.solve_velocity_constraints(&mut self.bodies);
        }

        let mut solved = false;
        for _ in 0..self.config.position_iterations {
            if solver.solve_position_constraints(&mut self.bodies) {
                solved = true;
                break;
            }
        }
        if !solved {
            warn!(
                "position correction hit the {} iteration cap with penetration remaining",
                self.config.position_iterations
            );
        }

        // Keep the cached geometry in sync with the corrected positions.
        for body in &mut self.bodies {
            if body.is_mover() {
                body.cache_data(self.generation);
            }
        }
        solved
    }

    /// Counts quiet steps and puts ready bodies to sleep. A body is ready
    /// after `sleep_steps` quiet steps in a converged step. Ready bodies that
    /// touch a disturbing body which is not ready stay awake, so touching
    /// bodies fall asleep in the same step.
    fn update_sleep(&mut self, manifolds: &[Manifold], position_solved: bool) {
        let sleep_steps = self.config.sleep_steps;
        let mut ready = vec![false; self.bodies.len()];
        for idx in 0..self.bodies.len() {
            let body = &self.bodies[idx];
            if !body.is_dynamic() || !body.is_awake() {
                continue;
            }
            let quiet = self.is_quiet(body);

            let body = &mut self.bodies[idx];
            if !quiet {
                body.quiet_steps = 0;
                continue;
            }
            body.quiet_steps = body.quiet_steps.saturating_add(1);
            ready[idx] = position_solved && body.quiet_steps >= sleep_steps;
        }

        let mut changed = true;
        while changed {
            changed = false;
            for manifold in manifolds {
                for (body, partner) in [
                    (manifold.body_a_idx, manifold.body_b_idx),
                    (manifold.body_b_idx, manifold.body_a_idx),
                ] {
                    if ready[body] && !ready[partner] && self.disturbs(&self.bodies[partner]) {
                        ready[body] = false;
                        changed = true;
                    }
                }
            }
        }

        for (idx, ready) in ready.into_iter().enumerate() {
            if ready {
                self.bodies[idx].set_awake(false);
                debug!("{} fell asleep", self.handles[idx]);
            }
        }
    }

    /// Re-caches bodies whose colliders are not current, such as bodies
    /// moved with `set_position` since the last step.
    fn refresh_caches(&mut self) {
        let generation = self.generation;
        for (body, handle) in self.bodies.iter_mut().zip(&self.handles) {
            if !body.is_current(generation) {
                trace!("re-caching {handle} outside of a step");
                body.cache_data(generation);
            }
        }
    }

    /// First collider (body handle and collider index) containing `point`.
    pub fn find_collider_by_point(&mut self, point: Vec2) -> Option<(BodyHandle, usize)> {
        self.refresh_caches();
        self.bodies
            .iter()
            .zip(&self.handles)
            .filter(|(body, _)| body.bounds().contain_point(point))
            .find_map(|(body, &handle)| {
                body.colliders()
                    .iter()
                    .position(|collider| collider.point_query(point))
                    .map(|idx| (handle, idx))
            })
    }

    pub fn find_body_by_point(&mut self, point: Vec2) -> Option<BodyHandle> {
        self.find_collider_by_point(point).map(|(handle, _)| handle)
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("bodies", &self.bodies.len())
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .field("has_listener", &self.listener.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Material;
    use crate::objects::BodyType;
    use crate::shapes::{Collider, Shape, TileCell, TileKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPSILON: f64 = 1e-9;
    const DT: f64 = 1.0 / 60.0;

    fn ball(position: Vec2, radius: f64) -> RigidBody {
        RigidBody::new_dynamic(Collider::new(Shape::circle(radius)), position)
    }

    fn zero_gravity_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.set_gravity(Vec2::ZERO);
        world
    }

    #[test]
    fn test_world_new() {
        let world = PhysicsWorld::new();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.gravity(), Vec2::new(0.0, 9.8));
        assert_eq!(world.phase(), StepPhase::Idle);
        assert_eq!(world.generation(), 1);
    }

    #[test]
    fn test_with_config_validates() {
        let config = WorldConfig {
            velocity_iterations: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(PhysicsWorld::with_config(config), Err(PhysicsError::InvalidConfig(_))));
    }

    #[test]
    fn test_add_and_remove_body() {
        let mut world = PhysicsWorld::new();
        let h1 = world.add_body(ball(Vec2::ZERO, 1.0));
        let h2 = world.add_body(ball(Vec2::new(5.0, 0.0), 1.0));
        assert_ne!(h1, h2);
        assert_eq!(world.body_count(), 2);
        assert_eq!(world.body(h2).map(|b| b.position()), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(world.body(h1).and_then(|b| b.handle()), Some(h1));
        assert_eq!(world.body(h1).map(|b| b.colliders()[0].body()), Some(Some(h1)));

        let removed = world.remove_body(h1).unwrap();
        assert_eq!(removed.handle(), None);
        assert!(!world.contains(h1));
        // The survivor is still reachable after the index shift.
        assert_eq!(world.body(h2).map(|b| b.position()), Some(Vec2::new(5.0, 0.0)));
        assert_eq!(world.handles(), &[h2]);
    }

    #[test]
    fn test_remove_unknown_body_errors() {
        let mut world = PhysicsWorld::new();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        world.remove_body(h).unwrap();
        let err = world.remove_body(h).unwrap_err();
        assert!(matches!(err, PhysicsError::UnknownBody(x) if x == h));
        assert!(err.to_string().contains("body#0"));
    }

    #[test]
    fn test_step_gravity() {
        let mut world = PhysicsWorld::new();
        world.set_gravity(Vec2::new(0.0, 10.0));
        let h = world.add_body(ball(Vec2::ZERO, 1.0));

        world.step(0.1);
        let body = world.body(h).unwrap();
        assert!((body.linear_velocity().y - 1.0).abs() < EPSILON);
        assert!((body.position().y - 0.1).abs() < EPSILON);
        assert_eq!(body.position().x, 0.0);
        assert_eq!(world.phase(), StepPhase::Idle);
    }

    #[test]
    fn test_step_no_gravity_on_static() {
        let mut world = PhysicsWorld::new();
        let h = world.add_body(RigidBody::new_static(Collider::new(Shape::circle(1.0)), Vec2::new(1.0, 1.0), 0.0));
        world.step(0.1);
        let body = world.body(h).unwrap();
        assert_eq!(body.position(), Vec2::new(1.0, 1.0));
        assert_eq!(body.linear_velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_zero_dt_detects_without_moving() {
        let mut world = PhysicsWorld::new();
        let a = world.add_body(ball(Vec2::ZERO, 1.0));
        let b = world.add_body(ball(Vec2::new(1.5, 0.0), 1.0));
        let generation = world.generation();

        world.step(0.0);
        assert_eq!(world.body(a).unwrap().position(), Vec2::ZERO);
        assert_eq!(world.body(b).unwrap().position(), Vec2::new(1.5, 0.0));
        assert_eq!(world.body(a).unwrap().linear_velocity(), Vec2::ZERO);
        assert_eq!(world.stats().manifolds, 1);
        assert_eq!(world.stats().contacts, 1);
        assert_eq!(world.generation(), generation + 1);
    }

    #[test]
    fn test_invalid_dt_is_ignored() {
        let mut world = PhysicsWorld::new();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        world.step(f64::NAN);
        world.step(-1.0);
        assert_eq!(world.body(h).unwrap().position(), Vec2::ZERO);
        assert_eq!(world.generation(), 1);
    }

    #[test]
    fn test_overlapping_balls_are_pushed_apart() {
        let mut world = zero_gravity_world();
        let a = world.add_body(ball(Vec2::ZERO, 1.0));
        let b = world.add_body(ball(Vec2::new(1.5, 0.0), 1.0));
        for _ in 0..60 {
            world.step(DT);
        }
        let gap = world.body(b).unwrap().position().x - world.body(a).unwrap().position().x;
        assert!(gap > 1.95, "gap {gap}");
    }

    #[test]
    fn test_identical_worlds_are_deterministic() {
        fn build() -> PhysicsWorld {
            let mut world = PhysicsWorld::new();
            world.add_body(RigidBody::new_static(
                Collider::new(Shape::rectangle(20.0, 1.0)),
                Vec2::new(0.0, 10.0),
                0.0,
            ));
            for i in 0..4 {
                let mut body = ball(Vec2::new(i as f64 * 0.7, -2.5 * i as f64), 1.0);
                body.set_angular_velocity(0.3 * i as f64);
                world.add_body(body);
            }
            world.add_body(RigidBody::new_dynamic(
                Collider::new(Shape::rectangle(1.0, 0.5)),
                Vec2::new(-3.0, 0.0),
            ));
            world
        }

        let mut w1 = build();
        let mut w2 = build();
        for _ in 0..240 {
            w1.step(DT);
            w2.step(DT);
        }
        for (b1, b2) in w1.bodies().iter().zip(w2.bodies()) {
            assert_eq!(b1.position(), b2.position());
            assert_eq!(b1.rotation(), b2.rotation());
            assert_eq!(b1.linear_velocity(), b2.linear_velocity());
        }
    }

    #[test]
    fn test_quiet_body_falls_asleep_after_sleep_steps() {
        let mut world = zero_gravity_world();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        let sleep_steps = world.config().sleep_steps;

        for _ in 0..sleep_steps - 1 {
            world.step(DT);
        }
        assert!(world.body(h).unwrap().is_awake());
        world.step(DT);
        assert!(!world.body(h).unwrap().is_awake());
    }

    #[test]
    fn test_sleep_disabled() {
        let config = WorldConfig {
            gravity: Vec2::ZERO,
            allow_sleep: false,
            ..WorldConfig::default()
        };
        let mut world = PhysicsWorld::with_config(config).unwrap();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        for _ in 0..100 {
            world.step(DT);
        }
        assert!(world.body(h).unwrap().is_awake());
    }

    #[test]
    fn test_zero_velocity_write_does_not_wake() {
        let mut world = zero_gravity_world();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        world.body_mut(h).unwrap().set_awake(false);

        world.body_mut(h).unwrap().set_velocity(Vec2::ZERO);
        world.step(DT);
        assert!(!world.body(h).unwrap().is_awake());

        world.body_mut(h).unwrap().set_velocity(Vec2::new(1.0, 0.0));
        assert!(world.body(h).unwrap().is_awake());
        world.step(DT);
        assert!(world.body(h).unwrap().position().x > 0.0);
    }

    #[test]
    fn test_sleeping_body_ignores_gravity() {
        let mut world = PhysicsWorld::new();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));
        world.body_mut(h).unwrap().set_awake(false);
        for _ in 0..10 {
            world.step(DT);
        }
        assert_eq!(world.body(h).unwrap().position(), Vec2::ZERO);
    }

    #[test]
    fn test_moving_contact_wakes_sleeper() {
        let mut world = zero_gravity_world();
        let sleeper = world.add_body(ball(Vec2::ZERO, 1.0));
        world.body_mut(sleeper).unwrap().set_awake(false);
        let mut striker = ball(Vec2::new(3.0, 0.0), 1.0);
        striker.set_velocity(Vec2::new(-20.0, 0.0));
        world.add_body(striker);

        for _ in 0..10 {
            world.step(DT);
        }
        let body = world.body(sleeper).unwrap();
        assert!(body.is_awake());
        assert!(body.linear_velocity().x < 0.0);
    }

    #[test]
    fn test_resting_contact_wakes_sleeper() {
        let mut world = zero_gravity_world();
        let sleeper = world.add_body(ball(Vec2::ZERO, 1.0));
        world.body_mut(sleeper).unwrap().set_awake(false);
        // Awake but motionless, overlapping the sleeper by 0.5.
        world.add_body(ball(Vec2::new(1.5, 0.0), 1.0));

        world.step(DT);
        assert!(world.body(sleeper).unwrap().is_awake());
        for _ in 0..5 {
            world.step(DT);
        }
        assert!(world.body(sleeper).unwrap().position().x < 0.0);
    }

    #[test]
    fn test_touching_bodies_fall_asleep_together() {
        let mut world = zero_gravity_world();
        let a = world.add_body(ball(Vec2::ZERO, 1.0));
        let b = world.add_body(ball(Vec2::new(1.995, 0.0), 1.0));
        // `b` has already been resting for a while when `a` is woken.
        world.body_mut(b).unwrap().quiet_steps = 20;

        let sleep_steps = world.config().sleep_steps;
        for _ in 0..sleep_steps - 1 {
            world.step(DT);
            let (body_a, body_b) = (world.body(a).unwrap(), world.body(b).unwrap());
            assert!(body_a.is_awake());
            assert_eq!(body_a.is_awake(), body_b.is_awake());
        }
        world.step(DT);
        assert!(!world.body(a).unwrap().is_awake());
        assert!(!world.body(b).unwrap().is_awake());

        for _ in 0..10 {
            world.step(DT);
        }
        assert!(!world.body(a).unwrap().is_awake());
        assert!(!world.body(b).unwrap().is_awake());
    }

    #[test]
    fn test_collision_listener_defers_removal() {
        let mut world = zero_gravity_world();
        let floor = world.add_body(RigidBody::new_static(
            Collider::new(Shape::rectangle(10.0, 1.0)),
            Vec2::ZERO,
            0.0,
        ));
        let falling = world.add_body(ball(Vec2::new(0.0, -1.9), 1.0));

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        world.set_collision_listener(move |event, removals| {
            sink.borrow_mut().push(*event);
            removals.remove(event.body_b);
            removals.remove(event.body_b);
        });

        world.step(DT);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].body_a, floor);
        assert_eq!(events[0].body_b, falling);
        assert!((events[0].normal.y - -1.0).abs() < EPSILON);
        assert!((events[0].penetration - 0.1).abs() < 1e-6);

        assert!(!world.contains(falling));
        assert_eq!(world.body_count(), 1);
        assert_eq!(world.phase(), StepPhase::Idle);
    }

    #[test]
    fn test_removal_wakes_sleeping_neighbours() {
        let mut world = PhysicsWorld::new();
        let support = world.add_body(RigidBody::new_static(
            Collider::new(Shape::rectangle(2.0, 1.0)),
            Vec2::ZERO,
            0.0,
        ));
        let resting = world.add_body(ball(Vec2::new(0.0, -2.0), 1.0));
        let far = world.add_body(ball(Vec2::new(50.0, 0.0), 1.0));
        world.body_mut(resting).unwrap().set_awake(false);
        world.body_mut(far).unwrap().set_awake(false);

        world.remove_body(support).unwrap();
        assert!(world.body(resting).unwrap().is_awake());
        assert!(!world.body(far).unwrap().is_awake());
    }

    #[test]
    fn test_filter_bits_suppress_contacts() {
        let mut world = zero_gravity_world();
        let mut a = ball(Vec2::ZERO, 1.0);
        a.category_bits = 0b01;
        a.mask_bits = 0b01;
        let mut b = ball(Vec2::new(1.0, 0.0), 1.0);
        b.category_bits = 0b10;
        b.mask_bits = 0b11;
        world.add_body(a);
        world.add_body(b);

        world.step(DT);
        assert_eq!(world.stats().candidate_pairs, 0);
        assert_eq!(world.stats().manifolds, 0);
    }

    #[test]
    fn test_static_pairs_are_never_candidates() {
        let mut world = PhysicsWorld::new();
        world.add_body(RigidBody::new_static(Collider::new(Shape::circle(1.0)), Vec2::ZERO, 0.0));
        world.add_body(RigidBody::new_static(Collider::new(Shape::circle(1.0)), Vec2::new(0.5, 0.0), 0.0));
        world.add_body(RigidBody::new(BodyType::Kinematic, Vec2::new(1.0, 0.0), 0.0).with_collider(Collider::new(Shape::circle(1.0))));
        world.step(DT);
        assert_eq!(world.stats().candidate_pairs, 0);
    }

    #[test]
    fn test_advance_caps_substeps() {
        let mut world = zero_gravity_world();
        world.add_body(ball(Vec2::ZERO, 1.0));

        assert_eq!(world.advance(0.04), 2);
        assert_eq!(world.advance(1.0), world.config().max_substeps);
        assert_eq!(world.advance(f64::INFINITY), 0);
        // The backlog beyond the cap was dropped.
        assert!(world.advance(0.0) <= 1);
    }

    #[test]
    fn test_point_queries() {
        let mut world = PhysicsWorld::new();
        let body = RigidBody::new(BodyType::Dynamic, Vec2::new(5.0, 5.0), 0.0)
            .with_collider(Collider::new(Shape::circle(1.0)))
            .with_collider(Collider::new(Shape::Circle(crate::shapes::Circle::with_center(Vec2::new(4.0, 0.0), 1.0))));
        let h = world.add_body(body);

        assert_eq!(world.find_body_by_point(Vec2::new(5.5, 5.0)), Some(h));
        assert_eq!(world.find_collider_by_point(Vec2::new(9.5, 5.0)), Some((h, 1)));
        // Inside the body bounds but between the two circles.
        assert_eq!(world.find_body_by_point(Vec2::new(7.0, 5.9)), None);
        assert_eq!(world.find_body_by_point(Vec2::new(20.0, 20.0)), None);
    }

    #[test]
    fn test_point_queries_follow_teleported_body() {
        let mut world = zero_gravity_world();
        let h = world.add_body(ball(Vec2::ZERO, 1.0));

        world.body_mut(h).unwrap().set_position(Vec2::new(100.0, 0.0));
        assert_eq!(world.find_body_by_point(Vec2::new(100.0, 0.0)), Some(h));
        assert_eq!(world.find_body_by_point(Vec2::ZERO), None);
        assert!(world.body(h).unwrap().is_current(world.generation()));
    }

    #[test]
    fn test_removal_uses_teleported_bounds() {
        let mut world = PhysicsWorld::new();
        let support = world.add_body(RigidBody::new_static(
            Collider::new(Shape::rectangle(2.0, 1.0)),
            Vec2::new(50.0, 0.0),
            0.0,
        ));
        let resting = world.add_body(ball(Vec2::new(0.0, -2.0), 1.0));
        world.body_mut(resting).unwrap().set_awake(false);

        world.body_mut(support).unwrap().set_position(Vec2::ZERO);
        world.remove_body(support).unwrap();
        assert!(world.body(resting).unwrap().is_awake());
    }

    #[test]
    fn test_ball_comes_to_rest_in_tile_valley() {
        let solid = Material::new(0.0, 0.5, 1.0);
        let mut world = PhysicsWorld::new();
        world.add_body(RigidBody::new_static(
            Collider::new(Shape::Tile(TileCell::new(TileKind::Slope45, 16.0, 16.0, 1, -1))).with_material(solid),
            Vec2::new(-16.0, 16.0),
            0.0,
        ));
        world.add_body(RigidBody::new_static(
            Collider::new(Shape::Tile(TileCell::new(TileKind::Slope45, 16.0, 16.0, -1, -1))).with_material(solid),
            Vec2::new(16.0, 16.0),
            0.0,
        ));
        let h = world.add_body(RigidBody::new_dynamic(
            Collider::new(Shape::circle(10.0)).with_material(solid),
            Vec2::new(0.0, -100.0),
        ));

        for _ in 0..1200 {
            world.step(DT);
        }

        let body = world.body(h).unwrap();
        let slop = world.config().collision_slop;
        assert!(body.position().x.abs() < 0.1, "x {}", body.position().x);
        // Each face line passes through its tile's center. At rest the ball
        // sits on both, sunk by no more than the solver's tolerance.
        let faces = [
            (Vec2::new(-16.0, 16.0), Vec2::new(1.0, -1.0)),
            (Vec2::new(16.0, 16.0), Vec2::new(-1.0, -1.0)),
        ];
        for (tile_center, signs) in faces {
            let gap = (body.position() - tile_center).dot(signs.normalize()) - 10.0;
            assert!(gap <= slop && gap >= -3.0 * slop, "gap {gap} to the face through {tile_center:?}");
        }
        assert!(!body.is_awake());
        assert!(body.linear_velocity().magnitude() < 1e-6);
    }
}
