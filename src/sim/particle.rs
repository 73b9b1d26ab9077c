//! Particle bodies and construction presets

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::mass_from_radius;

/// Stable particle handle, never reused within a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Property presets selected at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Normal,
    /// Larger and three times denser
    Heavy,
    /// Small and light, catches the wind
    Light,
    /// Nearly elastic
    Bouncy,
    /// Dead bounce, high friction
    Sticky,
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 5] = [
        ParticleKind::Normal,
        ParticleKind::Heavy,
        ParticleKind::Light,
        ParticleKind::Bouncy,
        ParticleKind::Sticky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleKind::Normal => "normal",
            ParticleKind::Heavy => "heavy",
            ParticleKind::Light => "light",
            ParticleKind::Bouncy => "bouncy",
            ParticleKind::Sticky => "sticky",
        }
    }

    /// Construction preset scaled from a base radius
    pub fn desc(&self, base_radius: f32) -> ParticleDesc {
        let base_mass = mass_from_radius(base_radius);
        let (radius, mass, restitution, friction, drag) = match self {
            ParticleKind::Normal => (base_radius, base_mass, 0.8, 0.15, 0.0),
            ParticleKind::Heavy => (base_radius * 1.5, base_mass * 3.0, 0.6, 0.2, 0.0),
            ParticleKind::Light => (base_radius * 0.7, base_mass * 0.3, 0.8, 0.1, 0.01),
            ParticleKind::Bouncy => (base_radius, base_mass * 0.8, 0.98, 0.05, 0.0),
            ParticleKind::Sticky => (base_radius, base_mass, 0.1, 0.9, 0.0),
        };
        ParticleDesc {
            kind: *self,
            radius,
            mass: Some(mass),
            restitution,
            friction,
            drag,
            ..Default::default()
        }
    }
}

impl std::str::FromStr for ParticleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(ParticleKind::Normal),
            "heavy" => Ok(ParticleKind::Heavy),
            "light" => Ok(ParticleKind::Light),
            "bouncy" => Ok(ParticleKind::Bouncy),
            "sticky" => Ok(ParticleKind::Sticky),
            other => Err(Error::InvalidParam(format!("unknown particle kind '{other}'"))),
        }
    }
}

/// Everything needed to create a particle
///
/// Plain data so drivers can build it from their own scene formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleDesc {
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Explicit mass; derived from radius when `None`
    pub mass: Option<f32>,
    pub restitution: f32,
    pub friction: f32,
    /// Per-particle quadratic drag added to the global coefficient
    pub drag: f32,
}

impl Default for ParticleDesc {
    fn default() -> Self {
        Self {
            kind: ParticleKind::Normal,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: PARTICLE_RADIUS,
            mass: None,
            restitution: PARTICLE_RESTITUTION,
            friction: PARTICLE_FRICTION,
            drag: 0.0,
        }
    }
}

impl ParticleDesc {
    /// Desc from raw per-particle parameters, mass derived from radius
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        radius: f32,
        restitution: f32,
        friction: f32,
        drag: f32,
    ) -> Self {
        Self {
            pos: Vec2::new(x, y),
            vel: Vec2::new(vx, vy),
            radius,
            restitution,
            friction,
            drag,
            ..Default::default()
        }
    }

    pub fn at(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }
}

/// A simulated body
///
/// Position, velocity and material coefficients are plain data the driver
/// may edit between ticks. Radius and mass go through validated setters
/// because the solver divides by mass.
#[derive(Debug, Clone, Serialize)]
pub struct Particle {
    pub id: ParticleId,
    pub kind: ParticleKind,
    pub pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    mass: f32,
    /// Bounciness in [0, 1]
    pub restitution: f32,
    /// Contact friction in [0, 1]
    pub friction: f32,
    /// Extra quadratic drag (>= 0)
    pub drag: f32,
}

impl Particle {
    /// Create a particle after validating the desc
    ///
    /// Errors: `Error::InvalidParam` for non-finite values, radius or mass
    /// <= 0, restitution or friction outside [0, 1], or negative drag.
    pub fn new(id: ParticleId, desc: &ParticleDesc) -> Result<Self> {
        check_radius(desc.radius)?;
        let mass = desc.mass.unwrap_or_else(|| mass_from_radius(desc.radius));
        check_mass(mass)?;
        if !desc.pos.is_finite() {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !desc.vel.is_finite() {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        check_unit("restitution", desc.restitution)?;
        check_unit("friction", desc.friction)?;
        if !desc.drag.is_finite() || desc.drag < 0.0 {
            return Err(Error::InvalidParam("drag must be finite and >= 0".into()));
        }
        Ok(Self {
            id,
            kind: desc.kind,
            pos: desc.pos,
            vel: desc.vel,
            radius: desc.radius,
            mass,
            restitution: desc.restitution,
            friction: desc.friction,
            drag: desc.drag,
        })
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.vel
    }

    /// Change the radius; mass is left as is
    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        check_radius(radius)?;
        self.radius = radius;
        Ok(())
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        check_mass(mass)?;
        self.mass = mass;
        Ok(())
    }

    /// 1/2 m |v|^2
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.vel.length_squared()
    }

    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.vel * self.mass
    }

    /// Whether `point` lies inside the particle's circle
    pub fn contains_point(&self, point: Vec2) -> bool {
        (point - self.pos).length() <= self.radius
    }
}

fn check_radius(radius: f32) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(Error::InvalidParam("radius must be finite and > 0".into()));
    }
    Ok(())
}

fn check_mass(mass: f32) -> Result<()> {
    if !mass.is_finite() || mass <= 0.0 {
        return Err(Error::InvalidParam("mass must be finite and > 0".into()));
    }
    Ok(())
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidParam(format!("{name} must be within [0, 1]")));
    }
    Ok(())
}
