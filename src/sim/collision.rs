//! Narrow-phase collision detection and impulse response
//!
//! Pairs of circles resolve with positional correction, a normal impulse
//! using the smaller restitution, and Coulomb-clamped tangential friction.
//! World walls reflect with each particle's own restitution.

use glam::Vec2;

use super::particle::Particle;
use crate::clamp;
use crate::consts::COINCIDENT_DISTANCE;

/// Result of a pair overlap check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal from the first particle toward the second
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

/// What happened to a candidate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    /// Circles do not overlap
    Apart,
    /// Overlap corrected, but the pair was already moving apart
    Separating,
    /// Overlap corrected and impulses exchanged
    Collided {
        /// Normal impulse magnitude
        normal_impulse: f32,
        /// Signed friction impulse along the tangent
        friction_impulse: f32,
    },
}

/// Check overlap between two particles
///
/// Coincident centers get an arbitrary +x normal and a tiny distance so the
/// pair is still pushed apart.
pub fn particle_contact(a: &Particle, b: &Particle) -> Option<Contact> {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let (normal, dist) = if dist == 0.0 {
        (Vec2::X, COINCIDENT_DISTANCE)
    } else {
        (delta / dist, dist)
    };
    let penetration = a.radius() + b.radius() - dist;
    (penetration > 0.0).then_some(Contact {
        normal,
        penetration,
    })
}

/// Resolve one overlapping pair in place
///
/// `correction_percent` is the fraction of the overlap removed this call;
/// the remainder is left for later substeps to avoid jitter.
pub fn resolve_pair(a: &mut Particle, b: &mut Particle, correction_percent: f32) -> PairOutcome {
    let Some(contact) = particle_contact(a, b) else {
        return PairOutcome::Apart;
    };
    let n = contact.normal;
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let total_inv_mass = inv_a + inv_b;

    // Push apart proportional to inverse mass
    let correction = contact.penetration / total_inv_mass * correction_percent;
    a.pos -= n * (correction * inv_a);
    b.pos += n * (correction * inv_b);

    let rel = b.vel - a.vel;
    let vel_along_normal = rel.dot(n);
    if vel_along_normal > 0.0 {
        return PairOutcome::Separating;
    }

    // The less bouncy particle dominates
    let e = a.restitution.min(b.restitution);
    let j = -(1.0 + e) * vel_along_normal / total_inv_mass;
    let impulse = n * j;
    a.vel -= impulse * inv_a;
    b.vel += impulse * inv_b;

    // Tangential friction from the pre-impulse relative velocity
    let t = n.perp();
    let vel_tangent = rel.dot(t);
    let mu = (a.friction + b.friction) * 0.5;
    let max_jt = j.abs() * mu;
    let jt = clamp(-vel_tangent / total_inv_mass, -max_jt, max_jt);
    let friction = t * jt;
    a.vel -= friction * inv_a;
    b.vel += friction * inv_b;

    PairOutcome::Collided {
        normal_impulse: j,
        friction_impulse: jt,
    }
}

/// Keep a particle inside the [0, width] x [0, height] rectangle
///
/// Returns how many walls reflected its velocity. The floor (y = height)
/// also damps horizontal speed by the particle's friction.
pub fn resolve_bounds(p: &mut Particle, bounds: Vec2) -> u32 {
    let r = p.radius();
    let mut bounces = 0;

    // Floor
    if p.pos.y + r > bounds.y {
        p.pos.y = bounds.y - r;
        if p.vel.y > 0.0 {
            p.vel.y = -p.vel.y * p.restitution;
            p.vel.x *= 1.0 - p.friction;
            bounces += 1;
        }
    }
    // Ceiling
    if p.pos.y - r < 0.0 {
        p.pos.y = r;
        if p.vel.y < 0.0 {
            p.vel.y = -p.vel.y * p.restitution;
            bounces += 1;
        }
    }
    // Left wall
    if p.pos.x - r < 0.0 {
        p.pos.x = r;
        if p.vel.x < 0.0 {
            p.vel.x = -p.vel.x * p.restitution;
            bounces += 1;
        }
    }
    // Right wall
    if p.pos.x + r > bounds.x {
        p.pos.x = bounds.x - r;
        if p.vel.x > 0.0 {
            p.vel.x = -p.vel.x * p.restitution;
            bounces += 1;
        }
    }

    bounces
}
