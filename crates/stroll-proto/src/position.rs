use serde::{Deserialize, Serialize};

/// One position sample from a GPS receiver or the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub lat: f64,
    pub lng: f64,
    /// Course over ground, degrees clockwise from north.
    pub heading: Option<f64>,
    /// Horizontal accuracy estimate in metres.
    pub accuracy_m: Option<f64>,
    /// Ground speed in m/s.
    pub speed_mps: Option<f64>,
}

impl PositionFix {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self { lat, lng, heading: None, accuracy_m: None, speed_mps: None }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}
