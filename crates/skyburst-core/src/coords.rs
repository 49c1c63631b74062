use serde::{Deserialize, Serialize};

/// Full world-space width of the shared sky.
pub const WORLD_WIDTH: f32 = 300.0;
/// Full world-space height of the shared sky.
pub const WORLD_HEIGHT: f32 = 150.0;

/// World-space extent centred on the origin. Events travel between viewers in
/// normalized `[0, 1]` coordinates so screens of any size share one sky.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldExtent {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldExtent {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
        }
    }
}

impl WorldExtent {
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    pub fn half_height(&self) -> f32 {
        self.height / 2.0
    }

    /// `(world + half) / full` on both axes.
    pub fn normalize(&self, world_x: f32, world_y: f32) -> (f32, f32) {
        (
            (world_x + self.half_width()) / self.width,
            (world_y + self.half_height()) / self.height,
        )
    }

    /// `norm * full - half` on both axes.
    pub fn denormalize(&self, norm_x: f32, norm_y: f32) -> (f32, f32) {
        (
            norm_x * self.width - self.half_width(),
            norm_y * self.height - self.half_height(),
        )
    }
}

/// Whether a normalized coordinate is usable on the wire.
pub fn is_normalized(v: f32) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}
