//! Spherical helpers used by every other crate.
//!
//! None of these functions fail. Non-finite input yields a sentinel
//! (`f64::INFINITY` for distances, `0.0` for bearings and progress) and the
//! caller decides what "undecidable" means for it.

use crate::point::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Segments closer than this (1 µm) count as tied.
const TIE_EPSILON_KM: f64 = 1e-9;

/// Haversine great-circle distance in km.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return f64::INFINITY;
    }
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` to `b`, degrees in [0, 360).
pub fn bearing_degrees(a: GeoPoint, b: GeoPoint) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wraps any angle into [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if b >= 360.0 { 0.0 } else { b }
}

/// Distance in km from `point` to the segment `start..end`.
///
/// The projection is done on a local equirectangular plane anchored at
/// `start` and clamped to the segment; the final distance to the clamped
/// foot point is a true great-circle distance.
pub fn distance_to_segment_km(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> f64 {
    let (foot, _) = project_onto_segment(point, start, end);
    distance_km(point, foot)
}

/// Foot of `point` on `start..end` and the clamped segment parameter in [0, 1].
pub fn project_onto_segment(point: GeoPoint, start: GeoPoint, end: GeoPoint) -> (GeoPoint, f64) {
    let (px, py) = to_xy(point, start);
    let (bx, by) = to_xy(end, start);

    let len_sq = bx * bx + by * by;
    let t = if len_sq > 0.0 && len_sq.is_finite() {
        ((px * bx + py * by) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let t = if t.is_finite() { t } else { 0.0 };

    let foot = GeoPoint {
        lat: start.lat + t * (end.lat - start.lat),
        lng: start.lng + t * (end.lng - start.lng),
    };
    (foot, t)
}

/// Cumulative km along `path` at the projection of `point` onto its nearest segment.
///
/// Ties keep the first segment in path order, so on a self-crossing path the
/// earlier pass wins even if a later one is equally close.
pub fn progress_along_path(point: GeoPoint, path: &[GeoPoint]) -> f64 {
    if path.len() < 2 {
        return 0.0;
    }

    let mut best_dist = f64::INFINITY;
    let mut best_progress = 0.0;
    let mut walked = 0.0;

    for seg in path.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let (foot, _) = project_onto_segment(point, a, b);
        let d = distance_km(point, foot);
        if d < best_dist - TIE_EPSILON_KM {
            best_dist = d;
            best_progress = walked + distance_km(a, foot);
        }
        let seg_len = distance_km(a, b);
        if seg_len.is_finite() {
            walked += seg_len;
        }
    }
    best_progress
}

/// Destination reached travelling `distance_km` from `center` on `bearing_deg`.
pub fn point_ahead_of(center: GeoPoint, bearing_deg: f64, distance_km: f64) -> GeoPoint {
    let delta = distance_km / EARTH_RADIUS_KM;
    let theta = bearing_deg.to_radians();
    let lat1 = center.lat.to_radians();
    let lng1 = center.lng.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    GeoPoint {
        lat: lat2.to_degrees(),
        lng: (lng2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0,
    }
}

/// Flat-earth displacement in metres (111 km per degree), good to a few
/// percent over tens of metres.
pub fn approx_displacement_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let dlat = b.lat - a.lat;
    let dlng = b.lng - a.lng;
    (dlat * dlat + dlng * dlng).sqrt() * 111_000.0
}

// local plane in km, x east / y north
fn to_xy(p: GeoPoint, origin: GeoPoint) -> (f64, f64) {
    let x = (p.lng - origin.lng).to_radians() * EARTH_RADIUS_KM * origin.lat.to_radians().cos();
    let y = (p.lat - origin.lat).to_radians() * EARTH_RADIUS_KM;
    (x, y)
}
