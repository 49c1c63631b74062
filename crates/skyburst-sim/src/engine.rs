use std::collections::VecDeque;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skyburst_core::color::PackedColor;
use skyburst_core::scaling::VisualScale;

use crate::audio::AudioSettings;
use crate::config::EngineConfig;
use crate::entity::{Burst, EntityId, Particle, Projectile};
use crate::trail::Trail;

/// Smallest scale or opacity a spawn is allowed to carry.
pub const MIN_SCALE: f32 = 0.05;
pub const MIN_OPACITY: f32 = 0.05;
/// Largest scale a spawn is allowed to carry.
pub const MAX_SCALE: f32 = 4.0;
/// Bounds for the per-tick frame delta.
pub const MIN_DELTA: f32 = 0.25;
pub const MAX_DELTA: f32 = 4.0;

/// Notifications not drained within this many entries are dropped oldest first.
const MAX_PENDING_EVENTS: usize = 4096;

/// Per-spawn overrides. The default is a random color at full local scale.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpawnOptions {
    pub color: Option<PackedColor>,
    pub visual: VisualScale,
}

impl SpawnOptions {
    pub fn with_color(color: PackedColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

/// Something the shell may want to react to (sound cues, counters).
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A projectile left the ground; `gain` is the launch sound volume.
    Launched { id: EntityId, gain: f32 },
    /// A projectile turned into a burst; `gain` is the explosion sound volume.
    Detonated {
        projectile: EntityId,
        burst: EntityId,
        position: Vec3,
        gain: f32,
    },
    ProjectileEvicted { id: EntityId },
    BurstEvicted { id: EntityId },
    BurstExpired { id: EntityId },
}

/// Snapshot of engine counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frame: u64,
    pub projectiles: usize,
    pub bursts: usize,
    pub particles: usize,
    pub pending_spawns: usize,
    pub launched: u64,
    pub detonated: u64,
    pub evicted: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingSpawn {
    due_frame: u64,
    x: f32,
    y: f32,
    color: PackedColor,
}

/// All in-flight projectiles and bursts for one display.
///
/// Spawns from local input and from the network go through the same
/// [`spawn_projectile`](Self::spawn_projectile) call. All mutation of existing
/// entities happens inside [`tick`](Self::tick).
pub struct Engine {
    config: EngineConfig,
    audio: AudioSettings,
    rng: StdRng,
    projectiles: Vec<Projectile>,
    bursts: Vec<Burst>,
    pending: Vec<PendingSpawn>,
    events: VecDeque<SimEvent>,
    next_id: EntityId,
    frame: u64,
    visible: bool,
    launched: u64,
    detonated: u64,
    evicted: u64,
}

impl Engine {
    pub fn new(config: EngineConfig, audio: AudioSettings) -> Self {
        Self::with_rng(config, audio, StdRng::from_os_rng())
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(config: EngineConfig, audio: AudioSettings, seed: u64) -> Self {
        Self::with_rng(config, audio, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, audio: AudioSettings, rng: StdRng) -> Self {
        let config = config.sanitized();
        Self {
            projectiles: Vec::with_capacity(config.max_projectiles),
            bursts: Vec::with_capacity(config.max_bursts),
            config,
            audio,
            rng,
            pending: Vec::new(),
            events: VecDeque::new(),
            next_id: 1,
            frame: 0,
            visible: true,
            launched: 0,
            detonated: 0,
            evicted: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn audio(&self) -> &AudioSettings {
        &self.audio
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            frame: self.frame,
            projectiles: self.projectiles.len(),
            bursts: self.bursts.len(),
            particles: self.bursts.iter().map(|b| b.particles.len()).sum(),
            pending_spawns: self.pending.len(),
            launched: self.launched,
            detonated: self.detonated,
            evicted: self.evicted,
        }
    }

    /// Take every notification produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    /// Upper bound on the ticks any projectile spends in flight, given the
    /// clamps applied to scale and delta. Carries 1% slack for f32 rounding.
    pub fn max_flight_ticks(&self) -> u64 {
        let max_ascent = self.config.ascent_speed * MAX_SCALE;
        let min_drop = self.config.projectile_gravity * MIN_DELTA;
        let ideal = (max_ascent / min_drop).ceil() as u64;
        ideal.saturating_add(ideal / 100).saturating_add(1)
    }

    /// Launch a projectile from the ground towards world `(target_x, target_y)`
    /// and return the color it will burst in.
    ///
    /// While the engine is hidden nothing is spawned; the resolved color is
    /// still returned.
    pub fn spawn_projectile(
        &mut self,
        target_x: f32,
        target_y: f32,
        opts: SpawnOptions,
    ) -> PackedColor {
        let color = match opts.color {
            Some(c) if c.is_valid() => c,
            _ => PackedColor::random(&mut self.rng),
        };
        if !self.visible {
            return color;
        }

        let scale = sanitize_scale(opts.visual.scale);
        let opacity = sanitize_opacity(opts.visual.opacity);
        let depth = if opts.visual.depth_offset.is_finite() {
            opts.visual.depth_offset.min(0.0)
        } else {
            0.0
        };
        let x = if target_x.is_finite() { target_x } else { 0.0 };
        let target_y = if target_y.is_finite() {
            target_y
        } else {
            self.config.launch_altitude
        };

        if self.projectiles.len() >= self.config.max_projectiles {
            self.evict_projectile();
        }

        let id = self.allocate_id();
        let start = Vec3::new(x, self.config.launch_altitude, depth);
        let velocity = Vec3::new(
            (self.rng.random::<f32>() - 0.5) * 0.15,
            self.config.ascent_speed * scale,
            (self.rng.random::<f32>() - 0.5) * 0.1,
        );
        self.projectiles.push(Projectile {
            id,
            position: start,
            velocity,
            target_y,
            trail: Trail::starting_at(self.config.projectile_trail_len, start),
            color,
            scale,
            opacity,
        });
        self.launched += 1;
        let gain = self.audio.launch_gain() * opacity;
        self.push_event(SimEvent::Launched { id, gain });
        tracing::trace!(id, x, target_y, scale, opacity, "projectile launched");
        color
    }

    /// Advance the display by `delta_frames` (1.0 at the nominal 60 Hz).
    pub fn tick(&mut self, delta_frames: f32) {
        if !self.visible {
            return;
        }
        let dt = if delta_frames.is_finite() {
            delta_frames.clamp(MIN_DELTA, MAX_DELTA)
        } else {
            1.0
        };
        self.frame += 1;
        let sample_trail = self.frame % 2 == 0;

        self.release_pending();
        self.update_bursts(dt, sample_trail);
        self.update_projectiles(dt, sample_trail);
        self.detonate_ready();
    }

    /// Drop every projectile, burst, queued celebration spawn and undrained
    /// notification.
    pub fn clear_all(&mut self) {
        self.projectiles.clear();
        self.bursts.clear();
        self.pending.clear();
        self.events.clear();
    }

    /// Hiding clears the sky and pauses `tick`; showing resumes from empty.
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        self.clear_all();
        tracing::debug!(visible, "engine visibility changed");
    }

    /// Queue the epoch celebration: random fireworks spread across the next
    /// `celebration_window_frames` ticks. Overlapping calls stack.
    pub fn schedule_celebration(&mut self) {
        if !self.visible {
            return;
        }
        let count = self.config.celebration_count;
        let window = self.config.celebration_window_frames;
        for i in 0..count {
            let offset = (i as u64 * window) / count.max(1) as u64;
            let nx = self.rng.random_range(0.05..0.95);
            let ny = self.rng.random_range(0.5..0.95);
            let (x, y) = self.config.world.denormalize(nx, ny);
            let color = PackedColor::random(&mut self.rng);
            self.pending.push(PendingSpawn {
                due_frame: self.frame + offset,
                x,
                y,
                color,
            });
        }
        tracing::debug!(count, window, "celebration scheduled");
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_event(&mut self, event: SimEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn release_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let frame = self.frame;
        let (due, later): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|s| s.due_frame < frame);
        self.pending = later;
        for spawn in due {
            self.spawn_projectile(spawn.x, spawn.y, SpawnOptions::with_color(spawn.color));
        }
    }

    fn update_bursts(&mut self, dt: f32, sample_trail: bool) {
        let gravity = self.config.burst_gravity;
        for burst in &mut self.bursts {
            let fall = gravity * burst.scale * dt;
            for particle in &mut burst.particles {
                particle.velocity.y -= fall;
                particle.position += particle.velocity * dt;
                if sample_trail {
                    particle.trail.push(particle.position);
                }
            }
            burst.life = burst.life.saturating_sub(1);
            burst.refresh_opacity();
        }

        let mut expired = Vec::new();
        self.bursts.retain(|b| {
            if b.is_expired() {
                expired.push(b.id);
                false
            } else {
                true
            }
        });
        for id in expired {
            self.push_event(SimEvent::BurstExpired { id });
        }
    }

    fn update_projectiles(&mut self, dt: f32, sample_trail: bool) {
        let gravity = self.config.projectile_gravity;
        for p in &mut self.projectiles {
            p.velocity.y -= gravity * dt;
            p.velocity.x += (self.rng.random::<f32>() - 0.5) * 0.2 * dt;
            p.velocity.z += (self.rng.random::<f32>() - 0.5) * 0.1 * dt;
            p.position += p.velocity * dt;
            if sample_trail {
                p.trail.push(p.position);
            }
        }
    }

    fn detonate_ready(&mut self) {
        let (ready, flying): (Vec<_>, Vec<_>) = std::mem::take(&mut self.projectiles)
            .into_iter()
            .partition(Projectile::should_detonate);
        self.projectiles = flying;
        for projectile in ready {
            self.detonate(projectile);
        }
    }

    fn detonate(&mut self, projectile: Projectile) {
        if self.bursts.len() >= self.config.max_bursts {
            self.evict_burst();
        }
        let id = self.allocate_id();
        let origin = projectile.position;
        let particles = (0..self.config.particles_per_burst)
            .map(|_| {
                Particle::spawn(
                    &mut self.rng,
                    origin,
                    projectile.scale,
                    self.config.particle_trail_len,
                )
            })
            .collect();
        let life = self.config.burst_life_frames;
        self.bursts.push(Burst {
            id,
            particles,
            life,
            life_max: life,
            color: projectile.color,
            scale: projectile.scale,
            base_opacity: projectile.opacity,
            opacity: projectile.opacity,
        });
        self.detonated += 1;
        let gain = self.audio.explosion_gain() * projectile.opacity;
        self.push_event(SimEvent::Detonated {
            projectile: projectile.id,
            burst: id,
            position: origin,
            gain,
        });
    }

    fn evict_projectile(&mut self) {
        let victim = self
            .projectiles
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.priority()
                    .total_cmp(&b.priority())
                    .then(a.id.cmp(&b.id))
            })
            .map(|(i, _)| i);
        if let Some(i) = victim {
            let removed = self.projectiles.swap_remove(i);
            self.evicted += 1;
            tracing::debug!(id = removed.id, "projectile evicted at cap");
            self.push_event(SimEvent::ProjectileEvicted { id: removed.id });
        }
    }

    fn evict_burst(&mut self) {
        let victim = self
            .bursts
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.priority()
                    .total_cmp(&b.priority())
                    .then(a.life.cmp(&b.life))
                    .then(a.id.cmp(&b.id))
            })
            .map(|(i, _)| i);
        if let Some(i) = victim {
            let removed = self.bursts.swap_remove(i);
            self.evicted += 1;
            tracing::debug!(id = removed.id, "burst evicted at cap");
            self.push_event(SimEvent::BurstEvicted { id: removed.id });
        }
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        MIN_SCALE
    }
}

fn sanitize_opacity(opacity: f32) -> f32 {
    if opacity.is_finite() && opacity > 0.0 {
        opacity.clamp(MIN_OPACITY, 1.0)
    } else {
        MIN_OPACITY
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn engine() -> Engine {
        Engine::with_seed(EngineConfig::default(), AudioSettings::default(), 42)
    }

    fn small_engine(max_projectiles: usize, max_bursts: usize) -> Engine {
        let config = EngineConfig {
            max_projectiles,
            max_bursts,
            ..EngineConfig::default()
        };
        Engine::with_seed(config, AudioSettings::default(), 42)
    }

    fn visual(scale: f32, opacity: f32) -> SpawnOptions {
        SpawnOptions {
            color: None,
            visual: VisualScale::new(scale, opacity, 0.0),
        }
    }

    #[test]
    fn spawn_returns_supplied_color() {
        let mut e = engine();
        let c = e.spawn_projectile(0.0, 0.0, SpawnOptions::with_color(PackedColor(0xff0000)));
        assert_eq!(c, PackedColor(0xff0000));
        let p = &e.projectiles()[0];
        assert_eq!(p.color, PackedColor(0xff0000));
        assert_eq!(p.position.y, -30.0);
        assert!((p.velocity.y - 1.2).abs() < 1e-6);
        assert!(p.velocity.x.abs() <= 0.075);
        assert!(p.velocity.z.abs() <= 0.05);
    }

    #[test]
    fn spawn_random_color_is_valid() {
        let mut e = engine();
        let c = e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        assert!(c.is_valid());
        assert_eq!(e.projectiles()[0].color, c);
    }

    #[test]
    fn spawn_applies_visual_scale() {
        let mut e = engine();
        e.spawn_projectile(
            10.0,
            20.0,
            SpawnOptions {
                color: None,
                visual: VisualScale::new(0.8, 0.9, -10.0),
            },
        );
        let p = &e.projectiles()[0];
        assert!((p.scale - 0.8).abs() < 1e-6);
        assert!((p.opacity - 0.9).abs() < 1e-6);
        assert_eq!(p.position.z, -10.0);
        assert!((p.velocity.y - 1.2 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn spawn_sanitizes_inputs() {
        let mut e = engine();
        e.spawn_projectile(f32::NAN, f32::INFINITY, visual(f32::NAN, -1.0));
        e.spawn_projectile(0.0, 0.0, visual(100.0, 3.0));
        let [a, b] = e.projectiles() else {
            panic!("expected two projectiles");
        };
        assert_eq!(a.position.x, 0.0);
        assert_eq!(a.target_y, -30.0);
        assert_eq!(a.scale, MIN_SCALE);
        assert_eq!(a.opacity, MIN_OPACITY);
        assert_eq!(b.scale, MAX_SCALE);
        assert_eq!(b.opacity, 1.0);
    }

    #[test]
    fn launch_event_carries_gain() {
        let mut e = engine();
        e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        let events = e.drain_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SimEvent::Launched { gain, .. } => {
                assert!((gain - 0.5 * 0.7).abs() < 1e-6);
            },
            other => panic!("unexpected event {other:?}"),
        }
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn muted_audio_gives_zero_gain() {
        let audio = AudioSettings::default();
        let mut e = Engine::with_seed(EngineConfig::default(), audio.clone(), 1);
        audio.set_muted(true);
        e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        assert_eq!(
            e.drain_events()[0],
            SimEvent::Launched { id: 1, gain: 0.0 }
        );
    }

    #[test]
    fn cap_evicts_lowest_priority_first() {
        let mut e = small_engine(3, 4);
        e.spawn_projectile(0.0, 50.0, visual(1.0, 1.0));
        e.spawn_projectile(0.0, 50.0, visual(0.35, 0.45));
        e.spawn_projectile(0.0, 50.0, visual(0.8, 0.9));
        let dim_id = e.projectiles()[1].id;
        e.drain_events();

        e.spawn_projectile(0.0, 50.0, visual(1.0, 1.0));
        assert_eq!(e.projectiles().len(), 3);
        assert!(e.projectiles().iter().all(|p| p.id != dim_id));
        assert!(
            e.drain_events()
                .contains(&SimEvent::ProjectileEvicted { id: dim_id })
        );
    }

    #[test]
    fn equal_priority_evicts_earliest_spawned() {
        let mut e = small_engine(2, 4);
        e.spawn_projectile(0.0, 50.0, SpawnOptions::default());
        e.spawn_projectile(0.0, 50.0, SpawnOptions::default());
        let first = e.projectiles()[0].id;
        e.spawn_projectile(0.0, 50.0, SpawnOptions::default());
        assert!(e.projectiles().iter().all(|p| p.id != first));
    }

    #[test]
    fn projectile_detonates_at_target() {
        let mut e = engine();
        e.spawn_projectile(0.0, -20.0, SpawnOptions::with_color(PackedColor(0x00ff00)));
        let mut ticks = 0;
        while e.bursts().is_empty() {
            e.tick(1.0);
            ticks += 1;
            assert!(ticks < 100, "projectile never detonated");
        }
        assert!(e.projectiles().is_empty());
        let burst = &e.bursts()[0];
        assert_eq!(burst.particles.len(), 60);
        assert_eq!(burst.color, PackedColor(0x00ff00));
        assert_eq!(burst.life, 100);
        assert!(
            e.drain_events()
                .iter()
                .any(|ev| matches!(ev, SimEvent::Detonated { .. }))
        );
    }

    #[test]
    fn unreachable_target_detonates_at_apex() {
        let mut e = engine();
        e.spawn_projectile(0.0, 1.0e6, visual(MAX_SCALE, 1.0));
        let bound = e.max_flight_ticks();
        let mut ticks = 0;
        while !e.projectiles().is_empty() {
            e.tick(MIN_DELTA);
            ticks += 1;
            assert!(ticks <= bound, "exceeded flight bound {bound}");
        }
        assert_eq!(e.bursts().len(), 1);
    }

    #[test]
    fn burst_life_decreases_and_expires() {
        let config = EngineConfig {
            burst_life_frames: 5,
            ..EngineConfig::default()
        };
        let mut e = Engine::with_seed(config, AudioSettings::default(), 3);
        e.spawn_projectile(0.0, -30.0, SpawnOptions::default());
        e.tick(1.0);
        assert_eq!(e.bursts().len(), 1);
        let id = e.bursts()[0].id;
        let mut last_life = e.bursts()[0].life;
        let mut last_opacity = e.bursts()[0].opacity;
        e.drain_events();

        for _ in 0..4 {
            e.tick(1.0);
            let b = &e.bursts()[0];
            assert_eq!(b.life, last_life - 1);
            assert!(b.opacity < last_opacity);
            assert!(b.opacity >= 0.0);
            last_life = b.life;
            last_opacity = b.opacity;
        }
        e.tick(1.0);
        assert!(e.bursts().is_empty());
        assert!(e.drain_events().contains(&SimEvent::BurstExpired { id }));
    }

    #[test]
    fn burst_cap_evicts_and_reports() {
        let mut e = small_engine(8, 2);
        for _ in 0..3 {
            e.spawn_projectile(0.0, -30.0, SpawnOptions::default());
        }
        e.tick(1.0);
        assert_eq!(e.bursts().len(), 2);
        let evicted: Vec<_> = e
            .drain_events()
            .into_iter()
            .filter(|ev| matches!(ev, SimEvent::BurstEvicted { .. }))
            .collect();
        assert_eq!(evicted.len(), 1);
    }

    #[test]
    fn trails_stay_bounded() {
        let mut e = engine();
        e.spawn_projectile(0.0, 70.0, SpawnOptions::default());
        for _ in 0..400 {
            e.tick(1.0);
            for p in e.projectiles() {
                assert!(p.trail.len() <= 5);
            }
            for b in e.bursts() {
                for particle in &b.particles {
                    assert!(particle.trail.len() <= 10);
                }
            }
        }
    }

    #[test]
    fn clear_all_discards_everything() {
        let mut e = engine();
        e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        e.schedule_celebration();
        e.clear_all();
        let stats = e.stats();
        assert_eq!(stats.projectiles, 0);
        assert_eq!(stats.bursts, 0);
        assert_eq!(stats.pending_spawns, 0);
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn event_queue_drops_oldest_when_full() {
        let mut e = engine();
        for id in 0..(MAX_PENDING_EVENTS as u64 + 3) {
            e.push_event(SimEvent::BurstExpired { id });
        }
        let events = e.drain_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert_eq!(events[0], SimEvent::BurstExpired { id: 3 });
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn tiny_gravity_still_detonates_far_targets() {
        let cfg = EngineConfig {
            projectile_gravity: 1e-12,
            ..EngineConfig::default()
        };
        let mut e = Engine::with_seed(cfg, AudioSettings::default(), 3);
        e.spawn_projectile(0.0, 1e9, SpawnOptions::default());
        let bound = e.max_flight_ticks();
        for _ in 0..bound {
            if e.projectiles().is_empty() {
                break;
            }
            e.tick(1.0);
        }
        assert!(e.projectiles().is_empty());
        assert_eq!(e.stats().detonated, 1);
    }

    #[test]
    fn hidden_engine_is_inert() {
        let mut e = engine();
        e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        e.set_visible(false);
        assert!(!e.is_visible());
        assert!(e.projectiles().is_empty());
        // No launch cue survives for the discarded projectile
        assert!(e.drain_events().is_empty());

        let c = e.spawn_projectile(0.0, 0.0, SpawnOptions::with_color(PackedColor(0x123456)));
        assert_eq!(c, PackedColor(0x123456));
        assert!(e.projectiles().is_empty());
        let frame = e.frame();
        e.tick(1.0);
        assert_eq!(e.frame(), frame);

        e.set_visible(true);
        assert!(e.is_visible());
        e.spawn_projectile(0.0, 0.0, SpawnOptions::default());
        assert_eq!(e.projectiles().len(), 1);
    }

    #[test]
    fn celebration_spawns_are_staggered() {
        let mut e = engine();
        e.schedule_celebration();
        assert_eq!(e.stats().pending_spawns, 20);
        assert!(e.projectiles().is_empty());

        e.tick(1.0);
        let early = e.stats().launched;
        assert!(early >= 1 && early < 20);

        for _ in 0..120 {
            e.tick(1.0);
        }
        assert_eq!(e.stats().launched, 20);
        assert_eq!(e.stats().pending_spawns, 0);
    }

    #[test]
    fn celebrations_overlay() {
        let mut e = engine();
        e.schedule_celebration();
        e.schedule_celebration();
        assert_eq!(e.stats().pending_spawns, 40);
    }

    #[test]
    fn seeded_engines_agree() {
        let mut a = engine();
        let mut b = engine();
        for i in 0..10 {
            let x = i as f32 * 10.0 - 50.0;
            assert_eq!(
                a.spawn_projectile(x, 20.0, SpawnOptions::default()),
                b.spawn_projectile(x, 20.0, SpawnOptions::default())
            );
        }
        for _ in 0..50 {
            a.tick(1.0);
            b.tick(1.0);
        }
        assert_eq!(a.stats(), b.stats());
    }

    proptest! {
        #[test]
        fn caps_hold_and_evictions_name_tracked_ids(
            spawns in proptest::collection::vec((-150.0f32..150.0, -75.0f32..75.0, 0.0f32..2.0, 0.0f32..1.5), 1..200),
            ticks_between in 0usize..4,
        ) {
            let mut e = small_engine(16, 8);
            let mut tracked = HashSet::new();
            for (x, y, scale, opacity) in spawns {
                e.spawn_projectile(x, y, visual(scale, opacity));
                for _ in 0..ticks_between {
                    e.tick(1.0);
                }
                prop_assert!(e.projectiles().len() <= 16);
                prop_assert!(e.bursts().len() <= 8);
                for ev in e.drain_events() {
                    match ev {
                        SimEvent::Launched { id, .. } => { tracked.insert(id); },
                        SimEvent::Detonated { projectile, burst, .. } => {
                            prop_assert!(tracked.contains(&projectile));
                            tracked.insert(burst);
                        },
                        SimEvent::ProjectileEvicted { id }
                        | SimEvent::BurstEvicted { id }
                        | SimEvent::BurstExpired { id } => {
                            prop_assert!(tracked.contains(&id));
                        },
                    }
                }
            }
        }

        #[test]
        fn any_delta_keeps_engine_finite(deltas in proptest::collection::vec(proptest::num::f32::ANY, 1..64)) {
            let mut e = engine();
            e.spawn_projectile(0.0, 40.0, SpawnOptions::default());
            for d in deltas {
                e.tick(d);
            }
            for p in e.projectiles() {
                prop_assert!(p.position.is_finite());
            }
            for b in e.bursts() {
                prop_assert!(b.opacity >= 0.0);
            }
        }
    }
}
