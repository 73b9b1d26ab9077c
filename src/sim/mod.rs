//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by particle index, which follows creation order)
//! - No rendering or platform dependencies

pub mod attractor;
pub mod collision;
pub mod params;
pub mod particle;
pub mod simulation;
pub mod spatial;
pub mod world;

pub use attractor::{Attractor, AttractorId};
pub use collision::{Contact, PairOutcome, particle_contact, resolve_bounds, resolve_pair};
pub use params::WorldParameters;
pub use particle::{Particle, ParticleDesc, ParticleId, ParticleKind};
pub use simulation::Simulation;
pub use spatial::SpatialIndex;
pub use world::{PhysicsWorld, apply_attractors, apply_forces};
