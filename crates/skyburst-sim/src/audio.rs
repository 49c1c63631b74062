use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Base gain of the launch whoosh before the master volume is applied.
pub const LAUNCH_GAIN: f32 = 0.5;
/// Base gain of the detonation bang before the master volume is applied.
pub const EXPLOSION_GAIN: f32 = 0.7;
/// Master volume before the viewer touches the slider.
pub const DEFAULT_VOLUME: f32 = 0.7;

struct AudioState {
    volume_bits: AtomicU32,
    muted: AtomicBool,
}

/// Shared audio settings. The volume control writes, the engine reads the
/// current gain each time it launches or detonates something.
#[derive(Clone)]
pub struct AudioSettings {
    inner: Arc<AudioState>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::with_volume(DEFAULT_VOLUME)
    }
}

impl std::fmt::Debug for AudioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSettings")
            .field("volume", &self.volume())
            .field("muted", &self.is_muted())
            .finish()
    }
}

impl AudioSettings {
    pub fn with_volume(volume: f32) -> Self {
        let settings = Self {
            inner: Arc::new(AudioState {
                volume_bits: AtomicU32::new(0),
                muted: AtomicBool::new(false),
            }),
        };
        settings.set_volume(volume);
        settings
    }

    /// Master volume in `0.0..=1.0`; out-of-range and NaN values are clamped.
    pub fn set_volume(&self, volume: f32) {
        let v = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.inner.volume_bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.inner.volume_bits.load(Ordering::Relaxed))
    }

    pub fn set_muted(&self, muted: bool) {
        self.inner.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.inner.muted.load(Ordering::Relaxed)
    }

    /// Effective master gain (zero while muted).
    pub fn master_gain(&self) -> f32 {
        if self.is_muted() { 0.0 } else { self.volume() }
    }

    pub fn launch_gain(&self) -> f32 {
        LAUNCH_GAIN * self.master_gain()
    }

    pub fn explosion_gain(&self) -> f32 {
        EXPLOSION_GAIN * self.master_gain()
    }
}
