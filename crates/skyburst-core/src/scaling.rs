//! Distance-based visual scaling for remotely originated fireworks.
//!
//! A firework launched far away from the viewer renders smaller, dimmer and
//! further back, so every viewer reads the display as one global sky rather
//! than a pile of local ones. The mapping is a step function over distance
//! bands; the band table is configuration.

use serde::{Deserialize, Serialize};

use crate::geo::{GeoPoint, distance_km};

/// Rendering parameters derived from origin distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualScale {
    pub scale: f32,
    pub opacity: f32,
    /// Z shift applied at spawn; never positive.
    pub depth_offset: f32,
}

impl VisualScale {
    /// Full-size, fully opaque, at the front of the sky.
    pub const LOCAL: VisualScale = VisualScale {
        scale: 1.0,
        opacity: 1.0,
        depth_offset: 0.0,
    };

    pub const fn new(scale: f32, opacity: f32, depth_offset: f32) -> Self {
        Self {
            scale,
            opacity,
            depth_offset,
        }
    }
}

impl Default for VisualScale {
    fn default() -> Self {
        Self::LOCAL
    }
}

/// One distance tier: events strictly closer than `below_km` use this visual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBand {
    pub below_km: f64,
    pub scale: f32,
    pub opacity: f32,
    pub depth_offset: f32,
}

impl ScaleBand {
    pub const fn new(below_km: f64, scale: f32, opacity: f32, depth_offset: f32) -> Self {
        Self {
            below_km,
            scale,
            opacity,
            depth_offset,
        }
    }

    pub fn visual(&self) -> VisualScale {
        VisualScale::new(self.scale, self.opacity, self.depth_offset)
    }
}

/// Ordered distance bands plus the visual used beyond the last band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleTable {
    pub bands: Vec<ScaleBand>,
    pub beyond: VisualScale,
}

impl Default for ScaleTable {
    /// Neighbourhood-first table: only events within 2 km render full size.
    fn default() -> Self {
        Self {
            bands: vec![
                ScaleBand::new(2.0, 1.0, 1.0, 0.0),
                ScaleBand::new(200.0, 0.8, 0.9, -10.0),
                ScaleBand::new(1000.0, 0.65, 0.75, -20.0),
                ScaleBand::new(3000.0, 0.45, 0.6, -30.0),
                ScaleBand::new(8000.0, 0.35, 0.45, -40.0),
            ],
            beyond: VisualScale::new(0.175, 0.3, -50.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScaleTableError {
    /// A band threshold is non-finite or not positive.
    InvalidThreshold(usize),
    /// Thresholds must strictly increase.
    UnsortedBands(usize),
    /// Scale or opacity is non-finite or not positive.
    InvalidVisual(usize),
    /// Scale grows with distance at this tier.
    ScaleIncreases(usize),
    /// Opacity grows with distance at this tier.
    OpacityIncreases(usize),
    /// Depth offset is positive or moves forward with distance at this tier.
    DepthIncreases(usize),
}

impl std::fmt::Display for ScaleTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidThreshold(i) => write!(f, "band {i}: threshold must be finite and > 0"),
            Self::UnsortedBands(i) => write!(f, "band {i}: thresholds must strictly increase"),
            Self::InvalidVisual(i) => {
                write!(f, "tier {i}: scale and opacity must be finite and > 0")
            },
            Self::ScaleIncreases(i) => write!(f, "tier {i}: scale increases with distance"),
            Self::OpacityIncreases(i) => write!(f, "tier {i}: opacity increases with distance"),
            Self::DepthIncreases(i) => {
                write!(f, "tier {i}: depth offset must be <= 0 and non-increasing")
            },
        }
    }
}

impl std::error::Error for ScaleTableError {}

impl ScaleTable {
    /// City-first variant: everything within 50 km renders full size.
    pub fn regional() -> Self {
        let mut table = Self::default();
        table.bands[0].below_km = 50.0;
        table
    }

    /// Map a distance to its visual. NaN and negative distances count as 0;
    /// an infinite distance lands beyond the last band.
    pub fn scale_for(&self, distance_km: f64) -> VisualScale {
        let d = if distance_km.is_nan() {
            0.0
        } else {
            distance_km.max(0.0)
        };
        self.bands
            .iter()
            .find(|band| d < band.below_km)
            .map(ScaleBand::visual)
            .unwrap_or(self.beyond)
    }

    /// Visual for an event from `origin` seen by a viewer at `receiver`.
    pub fn scale_between(
        &self,
        receiver: Option<&GeoPoint>,
        origin: Option<&GeoPoint>,
    ) -> VisualScale {
        self.scale_for(distance_km(receiver, origin))
    }

    /// Check the monotonicity contract: scale, opacity and depth offset never
    /// grow with distance, depth offset is never positive.
    pub fn validate(&self) -> Result<(), ScaleTableError> {
        let mut last_threshold = 0.0;
        for (i, band) in self.bands.iter().enumerate() {
            if !band.below_km.is_finite() || band.below_km <= 0.0 {
                return Err(ScaleTableError::InvalidThreshold(i));
            }
            if i > 0 && band.below_km <= last_threshold {
                return Err(ScaleTableError::UnsortedBands(i));
            }
            last_threshold = band.below_km;
        }

        let tiers = self
            .bands
            .iter()
            .map(ScaleBand::visual)
            .chain(std::iter::once(self.beyond));

        let mut prev: Option<VisualScale> = None;
        for (i, v) in tiers.enumerate() {
            if !v.scale.is_finite() || v.scale <= 0.0 || !v.opacity.is_finite() || v.opacity <= 0.0
            {
                return Err(ScaleTableError::InvalidVisual(i));
            }
            if !v.depth_offset.is_finite() || v.depth_offset > 0.0 {
                return Err(ScaleTableError::DepthIncreases(i));
            }
            if let Some(p) = prev {
                if v.scale > p.scale {
                    return Err(ScaleTableError::ScaleIncreases(i));
                }
                if v.opacity > p.opacity {
                    return Err(ScaleTableError::OpacityIncreases(i));
                }
                if v.depth_offset > p.depth_offset {
                    return Err(ScaleTableError::DepthIncreases(i));
                }
            }
            prev = Some(v);
        }
        Ok(())
    }
}
