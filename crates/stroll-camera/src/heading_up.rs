//! Heading-up follow camera: the direction of travel points up and the
//! traveller sits in the lower part of the viewport.

use std::time::{Duration, Instant};

use serde::Deserialize;
use stroll_geo::{approx_displacement_m, bearing_degrees, normalize_bearing, GeoPoint};
use stroll_proto::position::PositionFix;
use tracing::trace;

const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(100);
/// Fixes worse than this only move the camera after a real displacement.
const POOR_ACCURACY_M: f64 = 20.0;
const POOR_ACCURACY_MIN_MOVE_M: f64 = 10.0;
/// Bearing changes below this are jitter.
const JITTER_DEG: f64 = 5.0;
/// Bearing changes at or above this are turns and are taken as-is.
const TURN_DEG: f64 = 30.0;
// weight of the new bearing in the moving average
const SMOOTHING: f64 = 0.3;

const PITCH_3D: f64 = 60.0;
const BOTTOM_PAD_PX: f64 = 180.0;
const SIDE_PAD_PX: f64 = 24.0;
/// Where the traveller should appear, as a fraction of viewport height.
const ANCHOR_Y: f64 = 0.8;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default = "default_is_3d")]
    pub is_3d: bool,
    #[serde(default = "default_viewport_height_px")]
    pub viewport_height_px: f64,
}

fn default_enable() -> bool { true }
fn default_is_3d() -> bool { true }
fn default_viewport_height_px() -> f64 { 800.0 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self { enable: default_enable(), is_3d: default_is_3d(), viewport_height_px: default_viewport_height_px() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Target camera for the map to ease to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub center: GeoPoint,
    pub bearing: f64,
    pub pitch: f64,
    pub padding: Padding,
}

#[derive(Debug, Clone)]
pub struct HeadingUpController {
    cfg: CameraConfig,
    last_update: Option<Instant>,
    last_position: Option<GeoPoint>,
    bearing: f64,
}

impl HeadingUpController {
    pub fn new(cfg: CameraConfig) -> Self {
        Self { cfg, last_update: None, last_position: None, bearing: 0.0 }
    }

    /// Forget the previous position and throttle window; the bearing is kept.
    pub fn reset(&mut self) {
        self.last_update = None;
        self.last_position = None;
    }

    /// New camera pose for `fix`, or `None` when throttled or filtered out.
    pub fn update(&mut self, fix: &PositionFix, now: Instant) -> Option<CameraPose> {
        if !fix.is_finite() {
            return None;
        }
        if let Some(t) = self.last_update {
            if now.saturating_duration_since(t) < MIN_UPDATE_INTERVAL {
                return None;
            }
        }

        let pos = GeoPoint::new(fix.lat, fix.lng);
        if let (Some(acc), Some(prev)) = (fix.accuracy_m, self.last_position) {
            if acc > POOR_ACCURACY_M && approx_displacement_m(prev, pos) <= POOR_ACCURACY_MIN_MOVE_M {
                trace!("camera: ignoring fix with {:.0} m accuracy", acc);
                return None;
            }
        }

        let observed = match (fix.heading.filter(|h| h.is_finite()), self.last_position) {
            (Some(h), _) => Some(normalize_bearing(h)),
            (None, Some(prev)) if prev != pos => Some(bearing_degrees(prev, pos)),
            _ => None,
        };
        if let Some(b) = observed {
            self.bearing = smooth_bearing(self.bearing, b);
        }

        self.last_update = Some(now);
        self.last_position = Some(pos);
        Some(self.pose(pos))
    }

    fn pose(&self, center: GeoPoint) -> CameraPose {
        let h = self.cfg.viewport_height_px;
        let center_offset = h * ANCHOR_Y - h / 2.0;
        let top = (center_offset * 2.0 + BOTTOM_PAD_PX).max(0.0);
        CameraPose {
            center,
            bearing: self.bearing,
            pitch: if self.cfg.is_3d { PITCH_3D } else { 0.0 },
            padding: Padding { top, right: SIDE_PAD_PX, bottom: BOTTOM_PAD_PX, left: SIDE_PAD_PX },
        }
    }
}

/// Hold on jitter, blend on drift, jump on turns. Blending goes the short
/// way round, so 350° towards 10° passes through north.
pub fn smooth_bearing(current: f64, observed: f64) -> f64 {
    let delta = signed_delta(current, observed);
    let abs = delta.abs();
    if abs < JITTER_DEG {
        current
    } else if abs < TURN_DEG {
        normalize_bearing(current + SMOOTHING * delta)
    } else {
        normalize_bearing(observed)
    }
}

// shortest signed rotation from `from` to `to`, in (-180, 180]
fn signed_delta(from: f64, to: f64) -> f64 {
    let d = (to - from).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}
