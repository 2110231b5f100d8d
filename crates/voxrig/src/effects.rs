//! Debris particles spawned from destroyed voxels.
//!
//! Each destroyed voxel becomes one particle thrown away from the impact
//! center. Speeds come from a seeded ChaCha stream so a replayed impact
//! sequence produces the same debris.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxrig_core::VoxelDestroyed;

/// Downward acceleration applied to debris (m/s²).
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// Initial speed range of a debris particle.
pub const SPEED_RANGE: std::ops::Range<f32> = 1.0..2.0;

/// Seconds a particle lives.
pub const DEFAULT_LIFETIME: f32 = 2.0;

/// One debris particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// World position.
    pub position: Vec3,
    /// World velocity.
    pub velocity: Vec3,
    /// RGBA8 color of the source voxel.
    pub color: [u8; 4],
    /// Seconds since spawn.
    pub age: f32,
    /// Seconds until expiry.
    pub lifetime: f32,
}

/// Spawns and integrates debris.
#[derive(Clone, Debug)]
pub struct DebrisEmitter {
    rng: ChaCha8Rng,
    particles: Vec<Particle>,
    lifetime: f32,
}

impl DebrisEmitter {
    /// Creates an emitter with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), particles: Vec::new(), lifetime: DEFAULT_LIFETIME }
    }

    /// Overrides the particle lifetime.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Spawns one particle for a destroyed voxel.
    ///
    /// A voxel sitting exactly on the impact center gets no direction and
    /// only falls.
    pub fn emit(&mut self, event: &VoxelDestroyed) {
        let direction = (event.world_point - event.impact_center).normalize_or_zero();
        let speed = self.rng.gen_range(SPEED_RANGE);
        self.particles.push(Particle {
            position: event.world_point,
            velocity: direction * speed,
            color: event.color,
            age: 0.0,
            lifetime: self.lifetime,
        });
    }

    /// Advances every particle by `dt` seconds and drops expired ones.
    pub fn update(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.velocity += GRAVITY * dt;
            p.position += p.velocity * dt;
            p.age += dt;
            p.age < p.lifetime
        });
    }

    /// Live particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}
