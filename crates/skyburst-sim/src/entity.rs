use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use skyburst_core::color::PackedColor;

use crate::trail::Trail;

/// Engine-assigned identity, unique for the engine's lifetime.
pub type EntityId = u64;

/// A rising shell on its way to its detonation height.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// World height at which the shell detonates.
    pub target_y: f32,
    pub trail: Trail,
    pub color: PackedColor,
    pub scale: f32,
    pub opacity: f32,
}

impl Projectile {
    /// Eviction rank; the lowest goes first when the cap is reached.
    pub fn priority(&self) -> f32 {
        self.scale * self.opacity
    }

    /// Whether this shell should turn into a burst on the current tick.
    pub fn should_detonate(&self) -> bool {
        self.position.y >= self.target_y || self.velocity.y <= 0.0
    }
}

/// One spark of a burst.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub trail: Trail,
}

impl Particle {
    /// Spark leaving `origin` in a uniformly random direction. The z component
    /// is flattened so bursts read as discs facing the viewer.
    pub fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        origin: Vec3,
        scale: f32,
        trail_len: usize,
    ) -> Self {
        let theta = rng.random::<f32>() * TAU;
        let phi = (2.0 * rng.random::<f32>() - 1.0).acos();
        let speed = (rng.random::<f32>() * 0.6 + 0.3) * scale;
        let velocity = Vec3::new(
            phi.sin() * theta.cos() * speed,
            phi.sin() * theta.sin() * speed,
            phi.cos() * speed * 0.3,
        );
        Self {
            position: origin,
            velocity,
            trail: Trail::starting_at(trail_len, origin),
        }
    }
}

/// An exploded shell: a fixed particle set fading out over its lifetime.
#[derive(Debug, Clone)]
pub struct Burst {
    pub id: EntityId,
    pub particles: Vec<Particle>,
    /// Remaining frames; the burst is removed on the tick this reaches zero.
    pub life: u32,
    pub life_max: u32,
    pub color: PackedColor,
    pub scale: f32,
    /// Opacity inherited from the projectile.
    pub base_opacity: f32,
    /// Current opacity, `base_opacity * life / life_max`.
    pub opacity: f32,
}

impl Burst {
    /// Eviction rank, fixed at creation.
    pub fn priority(&self) -> f32 {
        self.scale * self.base_opacity
    }

    pub fn life_fraction(&self) -> f32 {
        if self.life_max == 0 {
            0.0
        } else {
            self.life as f32 / self.life_max as f32
        }
    }

    pub(crate) fn refresh_opacity(&mut self) {
        self.opacity = (self.base_opacity * self.life_fraction()).max(0.0);
    }

    pub fn is_expired(&self) -> bool {
        self.life == 0
    }
}
