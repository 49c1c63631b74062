use serde::{Deserialize, Serialize};

use crate::color::PackedColor;
use crate::geo::GeoPoint;

/// Network message type discriminator (first byte of every binary frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    NewFirework = 0x01,
    HappyNewYear = 0x02,
}

impl MessageType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::NewFirework),
            0x02 => Some(Self::HappyNewYear),
            _ => None,
        }
    }

    /// Event name on the broadcast channel (also the SSE `event:` field).
    pub fn name(self) -> &'static str {
        match self {
            Self::NewFirework => "new-firework",
            Self::HappyNewYear => "happy-new-year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "new-firework" => Some(Self::NewFirework),
            "happy-new-year" => Some(Self::HappyNewYear),
            _ => None,
        }
    }
}

/// A firework launched by one viewer, relayed to every other viewer.
///
/// This is also the body of the ingress request, so the field names follow the
/// browser shell's JSON (`clientId`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireworkEvent {
    /// Normalized horizontal target in `[0, 1]`.
    pub x: f32,
    /// Normalized vertical target in `[0, 1]`.
    pub y: f32,
    /// Opaque per-viewer id used for self-echo suppression.
    pub client_id: String,
    pub color: PackedColor,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl FireworkEvent {
    /// Origin location, present only when both coordinates were sent.
    pub fn origin(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.latitude, self.longitude)
    }
}

/// Everything that travels on the shared channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    NewFirework(FireworkEvent),
    /// Countdown reached its target; every viewer runs a celebration.
    HappyNewYear,
}

impl ChannelMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::NewFirework(_) => MessageType::NewFirework,
            Self::HappyNewYear => MessageType::HappyNewYear,
        }
    }

    pub fn event_name(&self) -> &'static str {
        self.message_type().name()
    }
}
