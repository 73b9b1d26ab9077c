//! Stationary point-mass attractors

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ATTRACTOR_EPSILON, ATTRACTOR_RADIUS, ATTRACTOR_STRENGTH};

/// Stable attractor handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttractorId(pub u32);

impl fmt::Display for AttractorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inverse-square point attractor (gravity well)
///
/// `radius` is descriptive only: the pull is applied at every distance.
/// Negative strength repels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attractor {
    pub id: AttractorId,
    pub pos: Vec2,
    pub strength: f32,
    pub radius: f32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Attractor {
    pub fn new(id: AttractorId, pos: Vec2, strength: f32, radius: f32) -> Self {
        Self {
            id,
            pos,
            strength,
            radius,
            active: true,
        }
    }

    /// Default well strength and radius at `pos`
    pub fn well(id: AttractorId, pos: Vec2) -> Self {
        Self::new(id, pos, ATTRACTOR_STRENGTH, ATTRACTOR_RADIUS)
    }

    /// Acceleration on a body of `mass` at `pos`
    ///
    /// a = strength * d / (|d|^2 + eps) / mass, with d pointing at the
    /// attractor. Zero when inactive.
    #[inline]
    pub fn acceleration_at(&self, pos: Vec2, mass: f32) -> Vec2 {
        if !self.active {
            return Vec2::ZERO;
        }
        let d = self.pos - pos;
        let dist2 = d.length_squared() + ATTRACTOR_EPSILON;
        d * (self.strength / dist2 / mass)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        (point - self.pos).length() <= self.radius
    }
}
