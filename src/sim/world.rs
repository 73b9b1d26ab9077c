//! Fixed-fraction substep driver
//!
//! Advances borrowed particle state by one external frame, split into equal
//! substeps. Each substep: rebuild broadphase, gravity/wind/drag, integrate,
//! attractors, pair collisions, wall collisions.

use std::collections::HashSet;

use glam::Vec2;

use super::attractor::Attractor;
use super::collision::{PairOutcome, resolve_bounds, resolve_pair};
use super::params::WorldParameters;
use super::particle::Particle;
use super::spatial::SpatialIndex;
use crate::clamp;

/// Owns the broadphase and the collision counter
///
/// Particles and attractors are owned by the caller and lent to
/// [`PhysicsWorld::advance`] for the duration of the call.
#[derive(Debug, Clone, Default)]
pub struct PhysicsWorld {
    index: SpatialIndex,
    /// Scratch buffer for broadphase queries
    candidates: Vec<usize>,
    /// Unordered pairs already handled this substep
    resolved: HashSet<(usize, usize)>,
    collision_count: u64,
    /// Substeps run since creation
    substeps: u64,
}

impl PhysicsWorld {
    pub fn new(cell_size: f32) -> Self {
        Self {
            index: SpatialIndex::new(cell_size),
            ..Default::default()
        }
    }

    /// Cumulative pair and wall collisions (diagnostic only)
    #[inline]
    pub fn collision_count(&self) -> u64 {
        self.collision_count
    }

    pub fn reset_collision_count(&mut self) {
        self.collision_count = 0;
    }

    #[inline]
    pub fn substeps_run(&self) -> u64 {
        self.substeps
    }

    /// Broadphase as left by the last substep
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Advance by `dt_frame` seconds, returning collisions during this call
    ///
    /// Non-finite or non-positive `dt_frame` does nothing, which is how a
    /// paused driver looks from here.
    pub fn advance(
        &mut self,
        params: &WorldParameters,
        particles: &mut [Particle],
        attractors: &[Attractor],
        dt_frame: f32,
    ) -> u64 {
        if !dt_frame.is_finite() || dt_frame <= 0.0 {
            return 0;
        }
        let sub = params.substep_count();
        let dt = dt_frame / sub as f32;
        self.index.set_cell_size(params.cell_size);

        let before = self.collision_count;
        for _ in 0..sub {
            self.substep(params, particles, attractors, dt);
        }
        let collisions = self.collision_count - before;

        log::debug!(
            "advance dt={dt_frame:.4} substeps={sub} particles={} collisions={collisions}",
            particles.len()
        );
        collisions
    }

    /// One substep of length `dt`
    pub fn substep(
        &mut self,
        params: &WorldParameters,
        particles: &mut [Particle],
        attractors: &[Attractor],
        dt: f32,
    ) {
        self.rebuild_index(particles, dt);
        apply_forces(params, particles, dt);
        apply_attractors(particles, attractors, dt);
        self.resolve_pairs(particles, clamp(params.correction_percent, 0.0, 1.0));
        self.resolve_boundaries(particles, params.bounds());
        self.substeps += 1;
    }

    /// Rebuild the broadphase from current positions
    ///
    /// Each particle's square is grown by the distance it can cover in `dt`
    /// so the buckets still hold it after integration. The growth ignores
    /// the `g * dt²` term and the positional corrections made later in the
    /// substep, so a pair can miss by a sliver here; the next substep's
    /// rebuild picks it up.
    fn rebuild_index(&mut self, particles: &[Particle], dt: f32) {
        self.index.rebuild(
            particles
                .iter()
                .enumerate()
                .map(|(i, p)| (i, p.pos, p.radius() + p.vel.length() * dt)),
        );
    }

    /// Resolve every overlapping pair once
    fn resolve_pairs(&mut self, particles: &mut [Particle], correction_percent: f32) {
        self.resolved.clear();
        for i in 0..particles.len() {
            let (pos, radius) = (particles[i].pos, particles[i].radius());
            self.index.candidates(i, pos, radius, &mut self.candidates);
            for &j in &self.candidates {
                let key = (i.min(j), i.max(j));
                if !self.resolved.insert(key) {
                    continue;
                }
                let (a, b) = pair_mut(particles, key.0, key.1);
                if let PairOutcome::Collided { .. } = resolve_pair(a, b, correction_percent) {
                    self.collision_count += 1;
                }
            }
        }
    }

    fn resolve_boundaries(&mut self, particles: &mut [Particle], bounds: Vec2) {
        for p in particles.iter_mut() {
            self.collision_count += u64::from(resolve_bounds(p, bounds));
        }
    }
}

/// Gravity, wind-relative drag and semi-implicit Euler integration
///
/// Velocity is updated first and the new velocity moves the particle.
pub fn apply_forces(params: &WorldParameters, particles: &mut [Particle], dt: f32) {
    let gravity = Vec2::new(0.0, params.gravity);
    for p in particles.iter_mut() {
        p.vel += gravity * dt;

        let rel = p.vel - params.wind;
        let speed = rel.length();
        let inv_mass = p.inv_mass();
        // Quadratic: -k * rel * |rel| / m, zero when at rest in the air
        let k = params.quadratic_drag + p.drag;
        let mut accel = -rel * (k * speed * inv_mass);
        // Linear term layered on top
        accel -= rel * (params.linear_drag * inv_mass);

        p.vel += accel * dt;
        p.pos += p.vel * dt;
    }
}

/// Inverse-square pull of every active attractor on every particle
pub fn apply_attractors(particles: &mut [Particle], attractors: &[Attractor], dt: f32) {
    for attractor in attractors.iter().filter(|a| a.active) {
        for p in particles.iter_mut() {
            p.vel += attractor.acceleration_at(p.pos, p.mass()) * dt;
        }
    }
}

/// Two distinct mutable particles, `i < j`
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert!(i < j);
    let (head, tail) = particles.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}
