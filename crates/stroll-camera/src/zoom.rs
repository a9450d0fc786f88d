use stroll_geo::{distance_km, GeoPoint, Path};

/// How far ahead on the route the camera looks.
pub const LOOK_AHEAD_M: f64 = 300.0;

/// Zoom out when a lot of route lies ahead, in when it is close.
pub fn auto_zoom_for(distance_m: f64) -> f64 {
    if distance_m > 500.0 {
        15.0
    } else if distance_m < 150.0 {
        18.0
    } else {
        16.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAhead {
    pub point: GeoPoint,
    /// Straight-line metres from the traveller to `point`.
    pub distance_m: f64,
    pub zoom: f64,
}

/// Point `ahead_m` further along `path` and the zoom that fits it. Near the
/// end of the route the point is the destination and the zoom tightens.
pub fn look_ahead(path: &Path, user: GeoPoint, ahead_m: f64) -> Option<LookAhead> {
    let point = path.find_point_ahead(user, ahead_m)?;
    let distance_m = distance_km(user, point) * 1000.0;
    Some(LookAhead { point, distance_m, zoom: auto_zoom_for(distance_m) })
}
