use serde::{Deserialize, Serialize};
use stroll_geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    Start,
    #[default]
    Manual,
    Discovered,
}

/// A named stop. `id` is unique within one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: WaypointKind,
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: WaypointKind, at: GeoPoint) -> Self {
        Self { id: id.into(), name: name.into(), kind, lat: at.lat, lng: at.lng }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    pub fn with_kind(mut self, kind: WaypointKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Waypoint placed on the route. Recomputed whenever the path or the stop
/// set changes, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderedStop {
    pub waypoint: Waypoint,
    /// Km from the route start to the stop's projection; `None` when the
    /// path was too short to project onto.
    pub progress_km: Option<f64>,
}

impl OrderedStop {
    pub fn point(&self) -> GeoPoint {
        self.waypoint.point()
    }
}

/// Anything that can be looked up by stop id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Waypoint {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for OrderedStop {
    fn id(&self) -> &str {
        &self.waypoint.id
    }
}
