pub mod color;
pub mod coords;
pub mod geo;
pub mod net;
pub mod scaling;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::color::PackedColor;
    use crate::geo::GeoPoint;
    use crate::net::messages::FireworkEvent;

    /// Origin used by the shared-sky scenarios (lower Manhattan).
    pub const NEW_YORK: GeoPoint = GeoPoint {
        latitude: 40.0,
        longitude: -74.0,
    };

    /// Roughly 14 km north-west of [`NEW_YORK`].
    pub const NEAR_NEW_YORK: GeoPoint = GeoPoint {
        latitude: 40.1,
        longitude: -74.1,
    };

    /// A centred red firework with no origin location.
    pub fn make_firework_event(client_id: &str) -> FireworkEvent {
        FireworkEvent {
            x: 0.5,
            y: 0.5,
            client_id: client_id.to_string(),
            color: PackedColor(0xff0000),
            latitude: None,
            longitude: None,
        }
    }

    /// A centred red firework launched from `origin`.
    pub fn make_located_event(client_id: &str, origin: GeoPoint) -> FireworkEvent {
        FireworkEvent {
            latitude: Some(origin.latitude),
            longitude: Some(origin.longitude),
            ..make_firework_event(client_id)
        }
    }
}
