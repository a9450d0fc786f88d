use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geometry::{distance_km, distance_to_segment_km, progress_along_path};
use crate::point::{is_valid_coord, GeoPoint};

/// Route polyline. Built once per route session and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<GeoPoint>);

impl Path {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }

    /// `[lat, lng]` pairs; entries with non-finite values are dropped.
    pub fn from_lat_lng(pairs: &[[f64; 2]]) -> Self {
        Self::collect_valid(pairs, GeoPoint::from_lat_lng, "lat_lng")
    }

    /// `[lng, lat]` pairs as emitted by routing providers; entries with
    /// non-finite values are dropped.
    pub fn from_lng_lat(pairs: &[[f64; 2]]) -> Self {
        Self::collect_valid(pairs, GeoPoint::from_lng_lat, "lng_lat")
    }

    fn collect_valid(pairs: &[[f64; 2]], f: fn([f64; 2]) -> GeoPoint, name: &str) -> Self {
        let points: Vec<GeoPoint> = pairs.iter().filter(|c| is_valid_coord(&c[..])).map(|c| f(*c)).collect();
        let removed = pairs.len() - points.len();
        if removed > 0 {
            warn!("path {}: removed {} invalid coordinate(s)", name, removed);
        }
        Self(points)
    }

    /// Copy without non-finite points.
    pub fn sanitized(&self) -> Self {
        let points: Vec<GeoPoint> = self.0.iter().copied().filter(GeoPoint::is_finite).collect();
        if points.len() != self.0.len() {
            warn!("path: removed {} invalid coordinate(s)", self.0.len() - points.len());
        }
        Self(points)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Can something be projected onto this path?
    pub fn is_routable(&self) -> bool {
        self.0.len() >= 2
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.0.last().copied()
    }

    /// Cumulative km at each vertex; `[0.0, d01, d01 + d12, ...]`.
    pub fn cumulative_km(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.0.len());
        let mut total = 0.0;
        if !self.0.is_empty() {
            out.push(0.0);
        }
        for seg in self.0.windows(2) {
            total += distance_km(seg[0], seg[1]);
            out.push(total);
        }
        out
    }

    pub fn total_km(&self) -> f64 {
        self.0.windows(2).map(|s| distance_km(s[0], s[1])).sum()
    }

    pub fn progress_of(&self, point: GeoPoint) -> f64 {
        progress_along_path(point, &self.0)
    }

    /// Within `tolerance_km` of any segment.
    pub fn is_location_on_path(&self, location: GeoPoint, tolerance_km: f64) -> bool {
        if !self.is_routable() {
            return false;
        }
        self.0
            .windows(2)
            .any(|s| distance_to_segment_km(location, s[0], s[1]) <= tolerance_km)
    }

    /// Point `distance_m` further along the path than `user`.
    ///
    /// Snaps to the nearest vertex (not segment) and walks forward from
    /// there; returns the last vertex when the path runs out first.
    pub fn find_point_ahead(&self, user: GeoPoint, distance_m: f64) -> Option<GeoPoint> {
        if !self.is_routable() || !user.is_finite() {
            return None;
        }
        let target_km = distance_m / 1000.0;

        let mut min_d = f64::INFINITY;
        let mut closest = 0;
        for (i, p) in self.0[..self.0.len() - 1].iter().enumerate() {
            let d = distance_km(user, *p);
            if d < min_d {
                min_d = d;
                closest = i;
            }
        }

        let mut walked = 0.0;
        for seg in self.0[closest..].windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let seg_km = distance_km(a, b);
            if walked + seg_km >= target_km {
                let ratio = if seg_km > 0.0 { (target_km - walked) / seg_km } else { 0.0 };
                return Some(GeoPoint {
                    lat: a.lat + (b.lat - a.lat) * ratio,
                    lng: a.lng + (b.lng - a.lng) * ratio,
                });
            }
            walked += seg_km;
        }
        self.last()
    }
}

impl From<Vec<GeoPoint>> for Path {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self(points)
    }
}

impl AsRef<[GeoPoint]> for Path {
    fn as_ref(&self) -> &[GeoPoint] {
        &self.0
    }
}
