use serde::{Deserialize, Serialize};

/// WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// From a `[lat, lng]` pair (the order used for stored route paths).
    pub fn from_lat_lng(pair: [f64; 2]) -> Self {
        Self { lat: pair[0], lng: pair[1] }
    }

    /// From a `[lng, lat]` pair (GeoJSON / routing-provider order).
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self { lat: pair[1], lng: pair[0] }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.lat.abs() <= 90.0 && self.lng.abs() <= 180.0
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(pair: [f64; 2]) -> Self {
        Self::from_lat_lng(pair)
    }
}

/// Loose check for a raw coordinate pair coming from outside (either axis order).
pub fn is_valid_coord(coord: &[f64]) -> bool {
    coord.len() >= 2 && coord[0].is_finite() && coord[1].is_finite()
}
