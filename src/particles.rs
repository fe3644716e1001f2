use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LIFE_DECAY: f32 = 0.01;
/// Sparks fall much faster than the bodies that made them.
const GRAVITY_FACTOR: f32 = 0.002;
const FLOOR_RESTITUTION: f32 = 0.6;
const MIN_SPEED: f32 = 1.0;
const MAX_SPEED: f32 = 6.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    /// World units per tick.
    pub velocity: Vec2,
    /// In `(0, 1]` while alive.
    pub life: f32,
    pub color: Color,
}

#[derive(Resource)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    floor_y: f32,
    rng: StdRng,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            particles: Vec::new(),
            floor_y: f32::INFINITY,
            rng,
        }
    }

    pub fn set_floor(&mut self, floor_y: f32) {
        self.floor_y = floor_y;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn spawn(&mut self, at: Vec2, count: usize) {
        self.particles.reserve(count);
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.gen_range(MIN_SPEED..MAX_SPEED);
            let hue = self.rng.gen_range(180.0..240.0);
            self.particles.push(Particle {
                position: at,
                velocity: Vec2::from_angle(angle) * speed,
                life: 1.0,
                color: Color::hsl(hue, 0.7, 0.6),
            });
        }
    }

    /// One tick. `gravity` is the world gravity setting, not px/s².
    pub fn update(&mut self, gravity: Vec2) {
        let floor_y = self.floor_y;
        for p in &mut self.particles {
            p.position += p.velocity;
            p.velocity += gravity * GRAVITY_FACTOR;
            p.life -= LIFE_DECAY;
            if p.position.y > floor_y {
                p.position.y = floor_y;
                p.velocity.y *= -FLOOR_RESTITUTION;
            }
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}
