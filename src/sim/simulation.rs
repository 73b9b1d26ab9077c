//! Driver-facing simulation state
//!
//! Bundles the particle and attractor collections, world parameters and the
//! physics world behind handle-based create/remove calls.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::attractor::{Attractor, AttractorId};
use super::params::WorldParameters;
use super::particle::{Particle, ParticleDesc, ParticleId, ParticleKind};
use super::world::PhysicsWorld;
use crate::error::{Error, Result};

/// Complete sandbox state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Seed the spawner RNG started from
    pub seed: u64,
    params: WorldParameters,
    world: PhysicsWorld,
    /// Active particles (sorted by id, creation order)
    particles: Vec<Particle>,
    /// Active attractors (sorted by id)
    attractors: Vec<Attractor>,
    rng: Pcg32,
    /// Simulated seconds
    time: f64,
    next_particle_id: u32,
    next_attractor_id: u32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(WorldParameters::default(), 0)
    }
}

impl Simulation {
    /// Empty simulation; `seed` drives the random spawners
    pub fn new(params: WorldParameters, seed: u64) -> Self {
        let params = params.sanitized();
        Self {
            seed,
            world: PhysicsWorld::new(params.cell_size),
            params,
            particles: Vec::new(),
            attractors: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            next_particle_id: 1,
            next_attractor_id: 1,
        }
    }

    /// 20 random particles of mixed kinds and 3 attractors
    pub fn demo(seed: u64) -> Self {
        let mut sim = Self::new(WorldParameters::default(), seed);
        let margin = 100.0;
        for _ in 0..20 {
            let kind = ParticleKind::ALL[sim.rng.random_range(0..ParticleKind::ALL.len())];
            let pos = sim.random_point(margin);
            let angle = sim.rng.random_range(0.0..std::f32::consts::TAU);
            let speed: f32 = sim.rng.random_range(50.0..200.0);
            let desc = kind
                .desc(10.0)
                .at(pos)
                .with_velocity(Vec2::from_angle(angle) * speed);
            // Presets are valid by construction
            if let Err(e) = sim.create_particle(desc) {
                log::error!("demo particle rejected: {e}");
            }
        }
        for _ in 0..3 {
            let pos = sim.random_point(margin);
            let strength: f32 = sim.rng.random_range(20_000.0..80_000.0);
            let radius: f32 = sim.rng.random_range(50.0..150.0);
            if let Err(e) = sim.create_attractor(pos.x, pos.y, strength, radius) {
                log::error!("demo attractor rejected: {e}");
            }
        }
        log::info!(
            "demo scene (seed {seed}): {} particles, {} attractors",
            sim.particles.len(),
            sim.attractors.len()
        );
        sim
    }

    fn random_point(&mut self, margin: f32) -> Vec2 {
        let (w, h) = (self.params.width, self.params.height);
        Vec2::new(
            self.rng.random_range(margin.min(w * 0.5)..=(w - margin).max(w * 0.5)),
            self.rng.random_range(margin.min(h * 0.5)..=(h - margin).max(h * 0.5)),
        )
    }

    // === Particles ===

    /// Validate and add a particle
    pub fn create_particle(&mut self, desc: ParticleDesc) -> Result<ParticleId> {
        let id = ParticleId(self.next_particle_id);
        let particle = Particle::new(id, &desc)?;
        self.next_particle_id += 1;
        self.particles.push(particle);
        Ok(id)
    }

    /// Remove a particle, returning its final state
    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle> {
        let index = self.particle_index(id).ok_or(Error::UnknownParticle(id))?;
        Ok(self.particles.remove(index))
    }

    /// Particles are kept in id order, so lookups are a binary search
    fn particle_index(&self, id: ParticleId) -> Option<usize> {
        self.particles.binary_search_by_key(&id, |p| p.id).ok()
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particle_index(id).map(|i| &self.particles[i])
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particle_index(id).map(move |i| &mut self.particles[i])
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Direct access for drivers that edit positions/velocities in bulk
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Topmost (most recently created) particle under `point`
    pub fn find_particle_at(&self, point: Vec2) -> Option<ParticleId> {
        self.particles
            .iter()
            .rev()
            .find(|p| p.contains_point(point))
            .map(|p| p.id)
    }

    /// Random particle somewhere in the upper half of the world
    pub fn spawn_random(&mut self) -> Result<ParticleId> {
        let w = self.params.width;
        let h = self.params.height;
        let radius = self.rng.random_range(8..=28_u32) as f32;
        let x_lo = (radius + 5.0).min(w * 0.5);
        let x_hi = (w - radius - 5.0).max(x_lo);
        let y_hi = (h * 0.5).max(50.0);
        let desc = ParticleDesc {
            kind: ParticleKind::Normal,
            pos: Vec2::new(
                self.rng.random_range(x_lo..=x_hi),
                self.rng.random_range(50.0_f32.min(y_hi)..=y_hi),
            ),
            vel: Vec2::new(
                self.rng.random_range(-200.0..=200.0),
                self.rng.random_range(-50.0..=50.0),
            ),
            radius,
            mass: None,
            restitution: self.rng.random_range(0.4..=0.95),
            friction: self.rng.random_range(0.0..=0.25),
            drag: self.rng.random_range(0.0..=0.02),
        };
        self.create_particle(desc)
    }

    pub fn spawn_many(&mut self, n: usize) -> Result<Vec<ParticleId>> {
        let ids = (0..n)
            .map(|_| self.spawn_random())
            .collect::<Result<Vec<_>>>()?;
        log::info!("spawned {n} particles ({} total)", self.particles.len());
        Ok(ids)
    }

    /// Remove every particle and reset the collision counter
    pub fn clear_particles(&mut self) {
        log::info!("clearing {} particles", self.particles.len());
        self.particles.clear();
        self.world.reset_collision_count();
    }

    // === Attractors ===

    pub fn create_attractor(
        &mut self,
        x: f32,
        y: f32,
        strength: f32,
        radius: f32,
    ) -> Result<AttractorId> {
        if !x.is_finite() || !y.is_finite() {
            return Err(Error::InvalidParam("attractor position must be finite".into()));
        }
        if !strength.is_finite() {
            return Err(Error::InvalidParam("attractor strength must be finite".into()));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParam(
                "attractor radius must be finite and >= 0".into(),
            ));
        }
        let id = AttractorId(self.next_attractor_id);
        self.next_attractor_id += 1;
        self.attractors
            .push(Attractor::new(id, Vec2::new(x, y), strength, radius));
        Ok(id)
    }

    pub fn remove_attractor(&mut self, id: AttractorId) -> Result<Attractor> {
        let index = self.attractor_index(id)?;
        Ok(self.attractors.remove(index))
    }

    pub fn set_attractor_active(&mut self, id: AttractorId, active: bool) -> Result<()> {
        let index = self.attractor_index(id)?;
        self.attractors[index].active = active;
        Ok(())
    }

    /// Attractors are kept in id order, like particles
    fn attractor_index(&self, id: AttractorId) -> Result<usize> {
        self.attractors
            .binary_search_by_key(&id, |a| a.id)
            .map_err(|_| Error::UnknownAttractor(id))
    }

    pub fn attractors(&self) -> &[Attractor] {
        &self.attractors
    }

    /// Topmost attractor whose radius covers `point`
    pub fn find_attractor_at(&self, point: Vec2) -> Option<AttractorId> {
        self.attractors
            .iter()
            .rev()
            .find(|a| a.contains_point(point))
            .map(|a| a.id)
    }

    pub fn clear_attractors(&mut self) {
        self.attractors.clear();
    }

    // === World ===

    pub fn params(&self) -> &WorldParameters {
        &self.params
    }

    /// Replace all world parameters (tunables are clamped)
    pub fn set_params(&mut self, params: WorldParameters) {
        self.params = params.sanitized();
    }

    /// Update forces and tunables, keeping bounds and correction percent
    #[allow(clippy::too_many_arguments)]
    pub fn set_world_parameters(
        &mut self,
        gravity: f32,
        quadratic_drag: f32,
        linear_drag: f32,
        wind_x: f32,
        wind_y: f32,
        substeps: u32,
        cell_size: f32,
    ) {
        self.set_params(WorldParameters {
            gravity,
            quadratic_drag,
            linear_drag,
            wind: Vec2::new(wind_x, wind_y),
            substeps,
            cell_size,
            ..self.params.clone()
        });
    }

    /// Run one external tick of `dt` seconds
    pub fn advance(&mut self, dt: f32) -> u64 {
        let collisions =
            self.world
                .advance(&self.params, &mut self.particles, &self.attractors, dt);
        if dt.is_finite() && dt > 0.0 {
            self.time += f64::from(dt);
        }
        collisions
    }

    /// Radial kick away from `center` for every particle within `radius`
    ///
    /// Speed gained is `force / (distance + 1)`. Particles exactly at the
    /// center have no direction and are left alone.
    pub fn explode(&mut self, center: Vec2, force: f32, radius: f32) -> usize {
        let mut hit = 0;
        for p in self.particles.iter_mut() {
            let d = p.pos - center;
            let dist = d.length();
            if dist > 0.0 && dist < radius {
                p.vel += d / dist * (force / (dist + 1.0));
                hit += 1;
            }
        }
        log::debug!("explosion at {center} hit {hit} particles");
        hit
    }

    // === Diagnostics ===

    pub fn collision_count(&self) -> u64 {
        self.world.collision_count()
    }

    /// Simulated seconds since creation
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    pub fn momentum(&self) -> Vec2 {
        self.particles.iter().map(Particle::momentum).sum()
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn test_handles_are_stable_and_not_reused() -> Result<()> {
        let mut sim = Simulation::default();
        let a = sim.create_particle(ParticleDesc::default().at(Vec2::new(100.0, 100.0)))?;
        let b = sim.create_particle(ParticleDesc::default().at(Vec2::new(200.0, 100.0)))?;
        let c = sim.create_particle(ParticleDesc::default().at(Vec2::new(300.0, 100.0)))?;

        let removed = sim.remove_particle(b)?;
        assert_eq!(removed.id, b);
        assert!(sim.particle(b).is_none());
        assert_eq!(sim.particle(c).map(|p| p.pos.x), Some(300.0));

        let d = sim.create_particle(ParticleDesc::default())?;
        assert!(d > c);
        assert_ne!(d, b);
        assert_eq!(sim.particles().len(), 3);
        assert!(sim.particle(a).is_some());
        Ok(())
    }

    #[test]
    fn test_remove_unknown_particle_errors() {
        let mut sim = Simulation::default();
        let err = sim.remove_particle(ParticleId(99)).unwrap_err();
        assert!(matches!(err, Error::UnknownParticle(ParticleId(99))));
    }

    #[test]
    fn test_invalid_particle_rejected_without_consuming_id() -> Result<()> {
        let mut sim = Simulation::default();
        let bad = ParticleDesc {
            radius: 0.0,
            ..Default::default()
        };
        assert!(sim.create_particle(bad).is_err());
        assert!(sim.particles().is_empty());
        assert_eq!(sim.create_particle(ParticleDesc::default())?, ParticleId(1));
        Ok(())
    }

    #[test]
    fn test_attractor_lifecycle() -> Result<()> {
        let mut sim = Simulation::default();
        let id = sim.create_attractor(500.0, 300.0, 50_000.0, 120.0)?;
        assert_eq!(sim.find_attractor_at(Vec2::new(510.0, 300.0)), Some(id));
        sim.set_attractor_active(id, false)?;
        assert!(!sim.attractors()[0].active);
        assert_eq!(sim.remove_attractor(id)?.id, id);
        assert!(matches!(
            sim.remove_attractor(id),
            Err(Error::UnknownAttractor(_))
        ));
        assert!(sim.create_attractor(f32::NAN, 0.0, 1.0, 1.0).is_err());
        Ok(())
    }

    #[test]
    fn test_set_active_finds_attractor_among_many() -> Result<()> {
        let mut sim = Simulation::default();
        let ids = (0..5)
            .map(|i| sim.create_attractor(100.0 * i as f32, 100.0, 1000.0, 50.0))
            .collect::<Result<Vec<_>>>()?;
        sim.remove_attractor(ids[1])?;
        sim.set_attractor_active(ids[3], false)?;
        let inactive: Vec<_> = sim.attractors().iter().filter(|a| !a.active).map(|a| a.id).collect();
        assert_eq!(inactive, vec![ids[3]]);
        assert!(matches!(
            sim.set_attractor_active(ids[1], true),
            Err(Error::UnknownAttractor(_))
        ));
        Ok(())
    }

    #[test]
    fn test_non_finite_wind_is_zeroed_and_advance_returns() -> Result<()> {
        let mut sim = Simulation::default();
        sim.create_particle(ParticleDesc::default().at(Vec2::new(300.0, 300.0)))?;
        sim.set_world_parameters(980.0, 0.001, 0.0, f32::INFINITY, 0.0, 2, 80.0);
        assert_eq!(sim.params().wind, Vec2::ZERO);
        sim.advance(FRAME);
        assert!(sim.particles()[0].pos.is_finite());
        Ok(())
    }

    #[test]
    fn test_huge_particle_advances() -> Result<()> {
        let mut sim = Simulation::default();
        sim.set_world_parameters(980.0, 0.001, 0.0, 0.0, 0.0, 2, 1.0);
        sim.create_particle(ParticleDesc {
            radius: 1.0e5,
            ..ParticleDesc::default().at(Vec2::new(500.0, 300.0))
        })?;
        sim.create_particle(ParticleDesc::default().at(Vec2::new(200.0, 300.0)))?;
        sim.advance(FRAME);
        assert_eq!(sim.world().index().oversized_count(), 1);
        Ok(())
    }

    #[test]
    fn test_set_world_parameters_clamps() {
        let mut sim = Simulation::default();
        sim.set_world_parameters(500.0, 0.002, 0.1, 20.0, -10.0, 0, 0.0);
        let params = sim.params();
        assert_eq!(params.gravity, 500.0);
        assert_eq!(params.wind, Vec2::new(20.0, -10.0));
        assert_eq!(params.substeps, 1);
        assert_eq!(params.cell_size, crate::consts::MIN_CELL_SIZE);
        assert_eq!(params.correction_percent, crate::consts::CORRECTION_PERCENT);
    }

    #[test]
    fn test_spawning_is_seeded() -> Result<()> {
        let mut a = Simulation::new(WorldParameters::default(), 7);
        let mut b = Simulation::new(WorldParameters::default(), 7);
        a.spawn_many(25)?;
        b.spawn_many(25)?;
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.pos, pb.pos);
            assert_eq!(pa.vel, pb.vel);
            assert_eq!(pa.radius(), pb.radius());
        }
        for p in a.particles() {
            assert!((8.0..=28.0).contains(&p.radius()));
            assert!((0.4..=0.95).contains(&p.restitution));
            assert!(p.pos.y <= a.params().height * 0.5);
        }
        Ok(())
    }

    #[test]
    fn test_clear_resets_collision_count() -> Result<()> {
        let mut sim = Simulation::new(WorldParameters::default(), 3);
        sim.spawn_many(30)?;
        for _ in 0..120 {
            sim.advance(FRAME);
        }
        assert!(sim.collision_count() > 0);
        sim.clear_particles();
        assert_eq!(sim.collision_count(), 0);
        assert!(sim.particles().is_empty());
        Ok(())
    }

    #[test]
    fn test_explode_pushes_nearby_particles_outward() -> Result<()> {
        let mut sim = Simulation::new(WorldParameters::frictionless(), 0);
        let near = sim.create_particle(ParticleDesc::default().at(Vec2::new(520.0, 300.0)))?;
        let far = sim.create_particle(ParticleDesc::default().at(Vec2::new(900.0, 300.0)))?;
        let center = sim.create_particle(ParticleDesc::default().at(Vec2::new(500.0, 300.0)))?;

        let hit = sim.explode(Vec2::new(500.0, 300.0), 210.0, 200.0);
        assert_eq!(hit, 1);
        // 210 / (20 + 1) = 10
        let v = sim.particle(near).map(|p| p.vel).unwrap_or_default();
        assert!((v - Vec2::new(10.0, 0.0)).length() < 1e-4);
        assert_eq!(sim.particle(far).map(|p| p.vel), Some(Vec2::ZERO));
        assert_eq!(sim.particle(center).map(|p| p.vel), Some(Vec2::ZERO));
        Ok(())
    }

    #[test]
    fn test_find_particle_prefers_topmost() -> Result<()> {
        let mut sim = Simulation::default();
        let _below = sim.create_particle(ParticleDesc::default().at(Vec2::new(100.0, 100.0)))?;
        let above = sim.create_particle(ParticleDesc::default().at(Vec2::new(105.0, 100.0)))?;
        assert_eq!(sim.find_particle_at(Vec2::new(102.0, 100.0)), Some(above));
        assert_eq!(sim.find_particle_at(Vec2::new(400.0, 400.0)), None);
        Ok(())
    }

    #[test]
    fn test_advance_tracks_time_and_skips_pause() {
        let mut sim = Simulation::default();
        sim.advance(FRAME);
        sim.advance(0.0);
        assert!((sim.time() - f64::from(FRAME)).abs() < 1e-9);
    }

    #[test]
    fn test_random_scene_settles_without_deep_overlap() -> Result<()> {
        let params = WorldParameters::frictionless().with_substeps(4);
        let mut sim = Simulation::new(params, 11);
        sim.spawn_many(20)?;
        // Let initial spawn overlaps work themselves out
        for _ in 0..60 {
            sim.advance(FRAME);
        }
        for _ in 0..60 {
            sim.advance(FRAME);
            let ps = sim.particles();
            for i in 0..ps.len() {
                for j in (i + 1)..ps.len() {
                    let gap = ps[i].pos.distance(ps[j].pos) - (ps[i].radius() + ps[j].radius());
                    assert!(gap >= -3.0, "pair {i}/{j} overlaps by {}", -gap);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_demo_scene() {
        let sim = Simulation::demo(42);
        assert_eq!(sim.particles().len(), 20);
        assert_eq!(sim.attractors().len(), 3);
        let first = sim.particles()[0].kind;
        assert!(sim.particles().iter().any(|p| p.kind != first));
    }
}
