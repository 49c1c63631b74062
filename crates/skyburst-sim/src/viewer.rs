use skyburst_core::color::PackedColor;
use skyburst_core::coords::is_normalized;
use skyburst_core::geo::GeoPoint;
use skyburst_core::net::messages::{ChannelMessage, FireworkEvent};
use skyburst_core::scaling::{ScaleTable, VisualScale};

use crate::engine::{Engine, SpawnOptions};

/// What [`Viewer::apply`] did with a channel message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Applied {
    /// Our own firework coming back; already shown locally.
    SelfEcho,
    /// A remote firework was spawned with this color and visual.
    Spawned {
        color: PackedColor,
        visual: VisualScale,
    },
    /// Epoch celebration queued.
    Celebration,
    /// Coordinates outside `[0, 1]`; nothing spawned.
    Ignored,
}

/// One browser session: identity, optional location and the distance table
/// used to scale everyone else's fireworks.
#[derive(Debug, Clone)]
pub struct Viewer {
    client_id: String,
    location: Option<GeoPoint>,
    scale_table: ScaleTable,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewer {
    /// A viewer with a fresh random id and no location.
    pub fn new() -> Self {
        Self::with_client_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_client_id(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            location: None,
            scale_table: ScaleTable::default(),
        }
    }

    /// Use `table` for remote fireworks. A table that would render farther
    /// events larger, brighter or nearer is rejected and the default kept.
    pub fn with_scale_table(mut self, table: ScaleTable) -> Self {
        match table.validate() {
            Ok(()) => self.scale_table = table,
            Err(e) => tracing::warn!("Ignoring scale table: {e}, using default"),
        }
        self
    }

    pub fn scale_table(&self) -> &ScaleTable {
        &self.scale_table
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Set or clear the viewer's location. Invalid coordinates count as unknown.
    pub fn set_location(&mut self, location: Option<GeoPoint>) {
        self.location = location.filter(GeoPoint::is_valid);
    }

    /// Spawn a full-size local firework at a world point and build the event
    /// to publish for everyone else.
    pub fn launch_local(&self, engine: &mut Engine, world_x: f32, world_y: f32) -> FireworkEvent {
        let color = engine.spawn_projectile(world_x, world_y, SpawnOptions::default());
        let (x, y) = engine.config().world.normalize(world_x, world_y);
        FireworkEvent {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
            client_id: self.client_id.clone(),
            color,
            latitude: self.location.map(|l| l.latitude),
            longitude: self.location.map(|l| l.longitude),
        }
    }

    /// Visual for a firework launched at `origin` as seen from here.
    pub fn visual_for(&self, origin: Option<&GeoPoint>) -> VisualScale {
        self.scale_table.scale_between(self.location.as_ref(), origin)
    }

    /// Apply a message received from the shared channel.
    pub fn apply(&self, engine: &mut Engine, msg: &ChannelMessage) -> Applied {
        match msg {
            ChannelMessage::NewFirework(ev) => self.apply_firework(engine, ev),
            ChannelMessage::HappyNewYear => {
                engine.schedule_celebration();
                Applied::Celebration
            },
        }
    }

    fn apply_firework(&self, engine: &mut Engine, ev: &FireworkEvent) -> Applied {
        if ev.client_id == self.client_id {
            return Applied::SelfEcho;
        }
        if !is_normalized(ev.x) || !is_normalized(ev.y) {
            tracing::debug!(
                client_id = %ev.client_id,
                x = ev.x,
                y = ev.y,
                "Dropping out-of-range firework"
            );
            return Applied::Ignored;
        }
        let origin = ev.origin();
        let visual = self.visual_for(origin.as_ref());
        let (x, y) = engine.config().world.denormalize(ev.x, ev.y);
        let color = engine.spawn_projectile(
            x,
            y,
            SpawnOptions {
                color: Some(ev.color),
                visual,
            },
        );
        Applied::Spawned { color, visual }
    }
}
