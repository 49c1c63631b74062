use serde::Deserialize;

use skyburst_core::coords::WorldExtent;

use crate::engine::MAX_SCALE;

/// Floor on projectile gravity relative to the fastest possible ascent.
const MIN_GRAVITY_RATIO: f32 = 1e-6;

/// Tuning for the firework simulation. Rates are per display frame (60 Hz).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on projectiles in flight.
    pub max_projectiles: usize,
    /// Cap on live bursts.
    pub max_bursts: usize,
    pub particles_per_burst: usize,
    /// Frames a burst lives after detonation.
    pub burst_life_frames: u32,
    pub projectile_trail_len: usize,
    pub particle_trail_len: usize,
    /// World height every projectile launches from.
    pub launch_altitude: f32,
    /// Vertical launch speed at scale 1.0.
    pub ascent_speed: f32,
    /// Vertical speed lost per frame while ascending.
    pub projectile_gravity: f32,
    /// Particle fall acceleration per frame at scale 1.0.
    pub burst_gravity: f32,
    /// Spawns queued by one epoch celebration.
    pub celebration_count: usize,
    /// Frames the celebration spawns are spread across.
    pub celebration_window_frames: u64,
    pub world: WorldExtent,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_projectiles: 64,
            max_bursts: 32,
            particles_per_burst: 60,
            burst_life_frames: 100,
            projectile_trail_len: 5,
            particle_trail_len: 10,
            launch_altitude: -30.0,
            ascent_speed: 1.2,
            projectile_gravity: 0.0005,
            burst_gravity: 0.01,
            celebration_count: 20,
            celebration_window_frames: 120,
            world: WorldExtent::default(),
        }
    }
}

impl EngineConfig {
    /// Smallest projectile gravity that still slows the fastest launch.
    pub fn min_projectile_gravity(&self) -> f32 {
        self.ascent_speed * MAX_SCALE * MIN_GRAVITY_RATIO
    }

    /// Replace values that would break the engine's guarantees (zero caps,
    /// non-positive gravity, a degenerate world) with defaults, logging each fix.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.max_projectiles == 0 {
            tracing::warn!("max_projectiles must be > 0, using default");
            self.max_projectiles = defaults.max_projectiles;
        }
        if self.max_bursts == 0 {
            tracing::warn!("max_bursts must be > 0, using default");
            self.max_bursts = defaults.max_bursts;
        }
        if self.burst_life_frames == 0 {
            tracing::warn!("burst_life_frames must be > 0, using default");
            self.burst_life_frames = defaults.burst_life_frames;
        }
        if !(self.ascent_speed.is_finite() && self.ascent_speed > 0.0) {
            tracing::warn!("ascent_speed must be > 0, using default");
            self.ascent_speed = defaults.ascent_speed;
        }
        // Gravity too small to register against the fastest ascent in f32
        // leaves a projectile aimed above the sky rising forever.
        let min_gravity = self.min_projectile_gravity();
        if !(self.projectile_gravity.is_finite() && self.projectile_gravity >= min_gravity) {
            tracing::warn!(
                gravity = self.projectile_gravity,
                min_gravity,
                "projectile_gravity too small, using default"
            );
            self.projectile_gravity = defaults.projectile_gravity.max(min_gravity);
        }
        if !self.burst_gravity.is_finite() {
            self.burst_gravity = defaults.burst_gravity;
        }
        if !self.launch_altitude.is_finite() {
            self.launch_altitude = defaults.launch_altitude;
        }
        if !(self.world.width.is_finite()
            && self.world.width > 0.0
            && self.world.height.is_finite()
            && self.world.height > 0.0)
        {
            tracing::warn!("world extent must be positive, using default");
            self.world = defaults.world;
        }
        self
    }
}
