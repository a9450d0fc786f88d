//! Replays a route at walking or cycling pace.
//!
//! [`MotionSimulator::advance`] is a pure step function over elapsed time, so
//! it can be driven by a timer ([`crate::driver`]) or directly from tests.

use std::time::Duration;

use stroll_geo::{bearing_degrees, GeoPoint, Path};
use stroll_proto::position::PositionFix;
use stroll_route::{StopTracker, TravelMode, Waypoint};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("path has {0} usable points, need at least 2")]
    TooShort(usize),
    #[error("path has zero length")]
    ZeroLength,
    #[error("speed multiplier must be positive, got {0}")]
    BadMultiplier(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Stopped,
    Running,
}

/// One simulated position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTick {
    pub fix: PositionFix,
    /// Km covered since start, capped at the path length.
    pub distance_km: f64,
    pub active_stop: usize,
    /// Set on the single tick that reaches the end of the path.
    pub finished: bool,
}

pub struct MotionSimulator {
    points: Vec<GeoPoint>,
    cumulative: Vec<f64>,
    total_km: f64,
    baseline_kmh: f64,
    multiplier: f64,

    state: SimState,
    distance_km: f64,
    heading: f64,
    stops: StopTracker,
    targets: Vec<Waypoint>,
}

impl MotionSimulator {
    /// Fails for paths that cannot be walked; no timer should be started then.
    pub fn new(path: &Path, mode: TravelMode, multiplier: f64, targets: Vec<Waypoint>) -> Result<Self, SimError> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(SimError::BadMultiplier(multiplier));
        }
        let path = path.sanitized();
        if !path.is_routable() {
            return Err(SimError::TooShort(path.len()));
        }
        let cumulative = path.cumulative_km();
        let total_km = cumulative.last().copied().unwrap_or(0.0);
        if total_km <= 0.0 {
            return Err(SimError::ZeroLength);
        }
        let points = path.points().to_vec();
        let heading = bearing_degrees(points[0], points[1]);
        Ok(Self {
            points,
            cumulative,
            total_km,
            baseline_kmh: mode.baseline_kmh(),
            multiplier,
            state: SimState::Stopped,
            distance_km: 0.0,
            heading,
            stops: StopTracker::new(targets.clone()),
            targets,
        })
    }

    /// (Re)start from the beginning of the path.
    pub fn start(&mut self) {
        info!(
            "sim: start, {:.2} km at {} km/h x{}",
            self.total_km, self.baseline_kmh, self.multiplier
        );
        self.distance_km = 0.0;
        self.heading = bearing_degrees(self.points[0], self.points[1]);
        self.stops = StopTracker::new(self.targets.clone());
        self.state = SimState::Running;
    }

    pub fn stop(&mut self) {
        self.state = SimState::Stopped;
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn speed_mps(&self) -> f64 {
        self.baseline_kmh * self.multiplier / 3.6
    }

    /// Move forward by `elapsed` wall time. `None` while stopped.
    pub fn advance(&mut self, elapsed: Duration) -> Option<SimTick> {
        if self.state != SimState::Running {
            return None;
        }
        let hours = elapsed.as_secs_f64() / 3600.0;
        self.distance_km += self.baseline_kmh * hours * self.multiplier;

        if self.distance_km >= self.total_km {
            self.distance_km = self.total_km;
            self.state = SimState::Stopped;
            let end = self.points[self.points.len() - 1];
            info!("sim: reached end of route");
            let fix = PositionFix {
                heading: Some(self.heading),
                speed_mps: Some(0.0),
                ..PositionFix::at(end.lat, end.lng)
            };
            self.stops.advance_if_near(end);
            return Some(self.tick(fix, true));
        }

        let d = self.distance_km;
        let mut seg = 0;
        while seg < self.cumulative.len() - 2 && self.cumulative[seg + 1] < d {
            seg += 1;
        }
        let (d0, d1) = (self.cumulative[seg], self.cumulative[seg + 1]);
        let ratio = if d1 > d0 { (d - d0) / (d1 - d0) } else { 0.0 };
        let (a, b) = (self.points[seg], self.points[seg + 1]);
        let pos = GeoPoint::new(a.lat + (b.lat - a.lat) * ratio, a.lng + (b.lng - a.lng) * ratio);
        if d1 > d0 {
            self.heading = bearing_degrees(a, b);
        }

        if self.stops.advance_if_near(pos) {
            debug!("sim: active stop now #{}", self.stops.active_index());
        }
        let fix = PositionFix {
            heading: Some(self.heading),
            speed_mps: Some(self.speed_mps()),
            ..PositionFix::at(pos.lat, pos.lng)
        };
        Some(self.tick(fix, false))
    }

    fn tick(&self, fix: PositionFix, finished: bool) -> SimTick {
        SimTick { fix, distance_km: self.distance_km, active_stop: self.stops.active_index(), finished }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroll_geo::{distance_km, point_ahead_of};
    use stroll_route::WaypointKind;

    const TICK: Duration = Duration::from_millis(50);

    fn straight(km: f64) -> Path {
        let a = GeoPoint::new(52.0, 4.9);
        let mid = point_ahead_of(a, 0.0, km / 2.0);
        Path::new(vec![a, mid, point_ahead_of(mid, 0.0, km / 2.0)])
    }

    fn run_to_end(sim: &mut MotionSimulator) -> (Vec<SimTick>, Duration) {
        let mut ticks = Vec::new();
        let mut t = Duration::ZERO;
        sim.start();
        while let Some(tick) = sim.advance(TICK) {
            t += TICK;
            ticks.push(tick);
        }
        (ticks, t)
    }

    #[test]
    fn one_km_at_walking_pace_takes_twelve_minutes() {
        let mut sim = MotionSimulator::new(&straight(1.0), TravelMode::Walking, 1.0, Vec::new()).unwrap();
        let (ticks, t) = run_to_end(&mut sim);

        assert!((t.as_secs_f64() - 720.0).abs() < 0.1, "took {:?}", t);
        assert!(ticks.windows(2).all(|w| w[1].distance_km >= w[0].distance_km));
        assert_eq!(ticks.iter().filter(|t| t.finished).count(), 1);
        let last = ticks.last().unwrap();
        assert!(last.finished);
        assert_eq!(last.distance_km, sim.total_km());
        assert_eq!(last.fix.speed_mps, Some(0.0));
        assert_eq!(sim.state(), SimState::Stopped);
        assert!(sim.advance(TICK).is_none());
    }

    #[test]
    fn multiplier_and_mode_scale_the_pace() {
        let mut sim = MotionSimulator::new(&straight(1.0), TravelMode::Cycling, 2.0, Vec::new()).unwrap();
        let (_, t) = run_to_end(&mut sim);
        // 1 km at 30 km/h
        assert!((t.as_secs_f64() - 120.0).abs() < 0.1);
        assert!((sim.speed_mps() - 30.0 / 3.6).abs() < 1e-9);
    }

    #[test]
    fn positions_stay_on_the_path_and_head_along_it() {
        let path = straight(0.4);
        let mut sim = MotionSimulator::new(&path, TravelMode::Walking, 10.0, Vec::new()).unwrap();
        let (ticks, _) = run_to_end(&mut sim);
        for t in &ticks[..ticks.len() - 1] {
            let p = GeoPoint::new(t.fix.lat, t.fix.lng);
            assert!(path.is_location_on_path(p, 0.001));
            let h = t.fix.heading.unwrap();
            assert!(h < 0.01 || h > 359.99, "heading {}", h);
        }
        let end = ticks.last().unwrap().fix;
        assert_eq!(GeoPoint::new(end.lat, end.lng), path.last().unwrap());
    }

    #[test]
    fn stops_advance_within_reach() {
        let path = straight(1.0);
        let a = path.first().unwrap();
        let stops = vec![
            Waypoint::new("mint", "Munttoren", WaypointKind::Discovered, point_ahead_of(a, 0.0, 0.3)),
            Waypoint::new("dam", "Dam", WaypointKind::Discovered, point_ahead_of(a, 0.0, 0.7)),
        ];
        let mut sim = MotionSimulator::new(&path, TravelMode::Walking, 5.0, stops).unwrap();
        let (ticks, _) = run_to_end(&mut sim);

        let at = |km: f64| ticks.iter().find(|t| t.distance_km >= km).map(|t| t.active_stop);
        assert_eq!(at(0.1), Some(0));
        assert_eq!(at(0.3), Some(1));
        assert_eq!(ticks.last().map(|t| t.active_stop), Some(1));
        let first = GeoPoint::new(ticks[0].fix.lat, ticks[0].fix.lng);
        assert!(distance_km(first, a) < 0.001);
    }

    #[test]
    fn restart_resets_distance_and_stops() {
        let path = straight(0.2);
        let stops = vec![Waypoint::new("x", "X", WaypointKind::Manual, path.first().unwrap())];
        let mut sim = MotionSimulator::new(&path, TravelMode::Walking, 10.0, stops).unwrap();
        run_to_end(&mut sim);
        sim.start();
        let first = sim.advance(Duration::ZERO).unwrap();
        assert_eq!(first.distance_km, 0.0);
        assert!(!first.finished);
        assert_eq!(sim.state(), SimState::Running);
    }

    #[test]
    fn refuses_unusable_paths() {
        let a = GeoPoint::new(52.0, 4.9);
        let walk = TravelMode::Walking;
        assert_eq!(MotionSimulator::new(&Path::default(), walk, 1.0, Vec::new()).err(), Some(SimError::TooShort(0)));
        assert_eq!(MotionSimulator::new(&Path::new(vec![a]), walk, 1.0, Vec::new()).err(), Some(SimError::TooShort(1)));
        let nan = GeoPoint::new(f64::NAN, 4.9);
        assert_eq!(MotionSimulator::new(&Path::new(vec![a, nan]), walk, 1.0, Vec::new()).err(), Some(SimError::TooShort(1)));
        assert_eq!(MotionSimulator::new(&Path::new(vec![a, a]), walk, 1.0, Vec::new()).err(), Some(SimError::ZeroLength));
        assert_eq!(MotionSimulator::new(&straight(1.0), walk, 0.0, Vec::new()).err(), Some(SimError::BadMultiplier(0.0)));
    }

    #[test]
    fn stopped_simulator_does_not_move() {
        let mut sim = MotionSimulator::new(&straight(1.0), TravelMode::Walking, 1.0, Vec::new()).unwrap();
        assert!(sim.advance(TICK).is_none());
        sim.start();
        sim.advance(Duration::from_secs(60)).unwrap();
        sim.stop();
        assert!(sim.advance(TICK).is_none());
        assert!((sim.distance_km() - 5.0 / 60.0).abs() < 1e-9);
    }
}
