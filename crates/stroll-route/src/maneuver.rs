//! Maneuver steps from the routing provider, normalised at the boundary.
//!
//! The provider speaks OSRM-style JSON. Everything loose about it (missing
//! fields, free-text types and modifiers, bad coordinates) is resolved here
//! so the scheduler only ever sees a closed set of variants.

use serde::Deserialize;
use stroll_geo::{is_valid_coord, GeoPoint, Path};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing provider returned no route (code: {0})")]
    NoRoute(String),
    #[error("route geometry has {0} usable point(s); need at least 2")]
    TooShort(usize),
    #[error("malformed routing response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Left,
    Right,
    SharpLeft,
    SharpRight,
    SlightLeft,
    SlightRight,
    Straight,
    UTurn,
    None,
}

/// Which way a modifier points, ignoring how sharply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Modifier {
    /// Accepts both `"sharp left"` and `"sharp_left"`; unknown text maps to `None`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().replace('_', " ").as_str() {
            "left" => Modifier::Left,
            "right" => Modifier::Right,
            "sharp left" => Modifier::SharpLeft,
            "sharp right" => Modifier::SharpRight,
            "slight left" => Modifier::SlightLeft,
            "slight right" => Modifier::SlightRight,
            "straight" => Modifier::Straight,
            "uturn" | "u-turn" => Modifier::UTurn,
            _ => Modifier::None,
        }
    }

    pub fn side(self) -> Option<Side> {
        match self {
            Modifier::Left | Modifier::SharpLeft | Modifier::SlightLeft => Some(Side::Left),
            Modifier::Right | Modifier::SharpRight | Modifier::SlightRight => Some(Side::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverKind {
    Turn,
    Depart,
    Arrive,
    Roundabout,
    Rotary,
}

impl ManeuverKind {
    /// Unknown provider types (`new name`, `fork`, `merge`, ...) are plain turns.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "depart" => ManeuverKind::Depart,
            "arrive" => ManeuverKind::Arrive,
            "roundabout" => ManeuverKind::Roundabout,
            "rotary" => ManeuverKind::Rotary,
            _ => ManeuverKind::Turn,
        }
    }

    pub fn is_roundabout(self) -> bool {
        matches!(self, ManeuverKind::Roundabout | ManeuverKind::Rotary)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManeuverStep {
    /// Length of the step leading away from this maneuver, metres.
    pub distance_m: f64,
    pub modifier: Modifier,
    pub kind: ManeuverKind,
    pub road_name: Option<String>,
    pub exit: Option<u32>,
    pub location: Option<GeoPoint>,
}

impl ManeuverStep {
    pub fn new(kind: ManeuverKind, modifier: Modifier) -> Self {
        Self { distance_m: 0.0, modifier, kind, road_name: None, exit: None, location: None }
    }

    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn on(mut self, road: impl Into<String>) -> Self {
        self.road_name = Some(road.into());
        self
    }

    pub fn exit(mut self, exit: u32) -> Self {
        self.exit = Some(exit);
        self
    }

    pub fn length(mut self, distance_m: f64) -> Self {
        self.distance_m = distance_m;
        self
    }

    fn from_raw(raw: RawStep) -> Self {
        let m = raw.maneuver.unwrap_or_default();
        let distance_m = match raw.distance {
            Some(d) if d.is_finite() && d >= 0.0 => d,
            Some(d) => {
                warn!("maneuver: dropping bad step distance {}", d);
                0.0
            }
            None => 0.0,
        };
        let location = m
            .location
            .filter(|c| is_valid_coord(c))
            .map(|c| GeoPoint::from_lng_lat([c[0], c[1]]));
        let road_name = raw.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        Self {
            distance_m,
            modifier: m.modifier.as_deref().map(Modifier::parse).unwrap_or(Modifier::None),
            kind: m.kind.as_deref().map(ManeuverKind::parse).unwrap_or(ManeuverKind::Turn),
            road_name,
            exit: m.exit,
            location,
        }
    }
}

/// Everything the navigation core needs from one routing request.
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub path: Path,
    pub steps: Vec<ManeuverStep>,
    pub total_km: f64,
}

impl RoutePlan {
    pub fn new(path: Path, steps: Vec<ManeuverStep>) -> Self {
        let total_km = path.total_km();
        Self { path, steps, total_km }
    }

    /// Parse an OSRM-style route response; the first route wins.
    pub fn from_provider_json(json: &str) -> Result<Self, RouteError> {
        let resp: RawResponse = serde_json::from_str(json)?;
        let code = resp.code.unwrap_or_else(|| "Ok".to_string());
        if code != "Ok" {
            return Err(RouteError::NoRoute(code));
        }
        let route = resp.routes.into_iter().next().ok_or_else(|| RouteError::NoRoute(code.clone()))?;

        let path = Path::from_lng_lat(&route.geometry.coordinates);
        if !path.is_routable() {
            return Err(RouteError::TooShort(path.len()));
        }

        let steps: Vec<ManeuverStep> = route
            .legs
            .into_iter()
            .flat_map(|leg| leg.steps)
            .map(ManeuverStep::from_raw)
            .collect();
        debug!("route: {} points, {} steps", path.len(), steps.len());

        let mut plan = Self::new(path, steps);
        // Trust the provider's length when it reports one
        if let Some(d) = route.distance.filter(|d| d.is_finite() && *d > 0.0) {
            plan.total_km = d / 1000.0;
        }
        Ok(plan)
    }
}

// ----- provider wire shapes -----

#[derive(Debug, Deserialize)]
struct RawResponse {
    code: Option<String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    distance: Option<f64>,
    geometry: RawGeometry,
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(default)]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    distance: Option<f64>,
    name: Option<String>,
    maneuver: Option<RawManeuver>,
}

#[derive(Debug, Default, Deserialize)]
struct RawManeuver {
    #[serde(rename = "type")]
    kind: Option<String>,
    modifier: Option<String>,
    location: Option<Vec<f64>>,
    exit: Option<u32>,
}
