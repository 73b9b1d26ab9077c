//! Particle Sandbox - real-time 2D particle physics core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (forces, broadphase, collisions, world stepping)
//! - `error`: Crate-wide error type
//!
//! Rendering, input and scene files belong to the driver. The driver calls
//! [`sim::Simulation::advance`] once per animation tick and reads particle
//! state back as plain data.

pub mod error;
pub mod sim;

pub use error::{Error, Result};
pub use sim::{
    Attractor, AttractorId, Particle, ParticleDesc, ParticleId, ParticleKind, PhysicsWorld,
    Simulation, SpatialIndex, WorldParameters,
};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Default gravity (pixels/s², +y is down)
    pub const GRAVITY: f32 = 980.0;
    /// Default global quadratic air drag coefficient
    pub const QUADRATIC_DRAG: f32 = 0.001;
    /// Default global linear drag coefficient
    pub const LINEAR_DRAG: f32 = 0.0;
    /// Default substeps per advance call
    pub const SUBSTEPS: u32 = 2;
    /// Default broadphase cell size (pixels)
    pub const CELL_SIZE: f32 = 80.0;
    /// Smallest accepted broadphase cell size
    pub const MIN_CELL_SIZE: f32 = 1.0;
    /// Fraction of pair overlap removed per substep
    pub const CORRECTION_PERCENT: f32 = 0.8;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 1000.0;
    pub const WORLD_HEIGHT: f32 = 660.0;

    /// Particle defaults
    pub const PARTICLE_RADIUS: f32 = 18.0;
    pub const PARTICLE_RESTITUTION: f32 = 0.8;
    pub const PARTICLE_FRICTION: f32 = 0.15;

    /// Softening term added to squared distance in attractor pulls
    pub const ATTRACTOR_EPSILON: f32 = 1e-6;
    /// Default attractor strength and radius
    pub const ATTRACTOR_STRENGTH: f32 = 50_000.0;
    pub const ATTRACTOR_RADIUS: f32 = 120.0;

    /// Distance substituted for coincident particle centers
    pub const COINCIDENT_DISTANCE: f32 = 0.01;
}

/// Length of a 2D vector given as components
#[inline]
pub fn vec_len(x: f32, y: f32) -> f32 {
    x.hypot(y)
}

/// Unit vector in the direction of `v`, or zero when `v` has no length
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    let len = v.length();
    if len == 0.0 { Vec2::ZERO } else { v / len }
}

/// Clamp `v` into `[lo, hi]`
///
/// Unlike `f32::clamp` this never panics when `lo > hi`; `lo` wins.
#[inline]
pub fn clamp(v: f32, lo: f32, hi: f32) -> f32 {
    lo.max(hi.min(v))
}

/// Mass derived from radius for particles without an explicit mass
#[inline]
pub fn mass_from_radius(radius: f32) -> f32 {
    std::f32::consts::PI * radius * radius / 1000.0 + 0.2
}
