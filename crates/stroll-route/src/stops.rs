use stroll_geo::{distance_km, GeoPoint};
use tracing::info;

use crate::waypoint::Waypoint;

/// Close enough to a stop to move on to the next one.
pub const ADVANCE_RADIUS_KM: f64 = 0.035;
/// Close enough to a stop to announce it.
pub const ARRIVAL_RADIUS_KM: f64 = 0.040;

/// Tracks which stop the traveller is heading for.
#[derive(Debug, Clone, Default)]
pub struct StopTracker {
    targets: Vec<Waypoint>,
    active: usize,
    last_announced: Option<String>,
}

impl StopTracker {
    pub fn new(targets: Vec<Waypoint>) -> Self {
        Self { targets, active: 0, last_announced: None }
    }

    pub fn targets(&self) -> &[Waypoint] {
        &self.targets
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> Option<&Waypoint> {
        self.targets.get(self.active)
    }

    pub fn is_last(&self) -> bool {
        !self.targets.is_empty() && self.active == self.targets.len() - 1
    }

    /// Move to the next stop when within [`ADVANCE_RADIUS_KM`] of the active
    /// one. Stays on the last stop once there. Returns true if the index moved.
    pub fn advance_if_near(&mut self, pos: GeoPoint) -> bool {
        let Some(target) = self.active() else { return false; };
        if distance_km(pos, target.point()) >= ADVANCE_RADIUS_KM {
            return false;
        }
        let next = (self.active + 1).min(self.targets.len() - 1);
        if next == self.active {
            return false;
        }
        info!("stops: reached {} ({}), next is #{}", target.name, target.id, next);
        self.active = next;
        true
    }

    /// Follow an index owned elsewhere (the simulator), clamped to the last
    /// stop. Stops moved past without an arrival are returned in order so
    /// they can still be announced.
    pub fn follow(&mut self, index: usize) -> Vec<(usize, Waypoint)> {
        let Some(last) = self.targets.len().checked_sub(1) else { return Vec::new(); };
        let index = index.min(last);
        let mut passed = Vec::new();
        while self.active < index {
            let target = &self.targets[self.active];
            if self.last_announced.as_deref() != Some(target.id.as_str()) {
                self.last_announced = Some(target.id.clone());
                passed.push((self.active, target.clone()));
            }
            self.active += 1;
        }
        self.active = index;
        passed
    }

    /// Fires once per stop id when within [`ARRIVAL_RADIUS_KM`] of the active stop.
    pub fn check_arrival(&mut self, pos: GeoPoint) -> Option<(usize, Waypoint)> {
        let target = self.targets.get(self.active)?;
        if distance_km(pos, target.point()) >= ARRIVAL_RADIUS_KM {
            return None;
        }
        if self.last_announced.as_deref() == Some(target.id.as_str()) {
            return None;
        }
        self.last_announced = Some(target.id.clone());
        Some((self.active, target.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::WaypointKind;
    use stroll_geo::point_ahead_of;

    fn tracker() -> StopTracker {
        let o = GeoPoint::new(52.0, 4.0);
        StopTracker::new(vec![
            Waypoint::new("a", "Dam", WaypointKind::Discovered, point_ahead_of(o, 90.0, 0.5)),
            Waypoint::new("b", "Spui", WaypointKind::Discovered, point_ahead_of(o, 90.0, 1.0)),
        ])
    }

    #[test]
    fn advances_within_radius_and_stops_at_last() {
        let mut t = tracker();
        let a = t.targets()[0].point();
        assert!(!t.advance_if_near(point_ahead_of(a, 0.0, 0.036)));
        assert!(t.advance_if_near(point_ahead_of(a, 0.0, 0.030)));
        assert_eq!(t.active_index(), 1);
        assert!(t.is_last());

        let b = t.targets()[1].point();
        assert!(!t.advance_if_near(b));
        assert_eq!(t.active_index(), 1);
    }

    #[test]
    fn arrival_fires_once_per_stop() {
        let mut t = tracker();
        let a = t.targets()[0].point();
        let near = point_ahead_of(a, 0.0, 0.038);
        let (idx, wp) = t.check_arrival(near).unwrap();
        assert_eq!((idx, wp.id.as_str()), (0, "a"));
        assert!(t.check_arrival(near).is_none());

        t.advance_if_near(a);
        assert_eq!(t.check_arrival(t.targets()[1].point()).unwrap().1.id, "b");
    }

    #[test]
    fn follow_is_clamped_and_reports_unannounced_stops() {
        let mut t = tracker();
        let passed = t.follow(7);
        assert_eq!(t.active_index(), 1);
        assert_eq!(passed.len(), 1);
        assert_eq!((passed[0].0, passed[0].1.id.as_str()), (0, "a"));

        t.follow(0);
        assert_eq!(t.active().map(|w| w.id.as_str()), Some("a"));
    }

    #[test]
    fn follow_skips_stops_already_announced() {
        let mut t = tracker();
        let a = t.targets()[0].point();
        assert!(t.check_arrival(point_ahead_of(a, 0.0, 0.038)).is_some());
        assert!(t.follow(1).is_empty());
        assert_eq!(t.active_index(), 1);
    }

    #[test]
    fn empty_tracker_is_inert() {
        let mut t = StopTracker::default();
        assert!(!t.advance_if_near(GeoPoint::new(0.0, 0.0)));
        assert!(t.check_arrival(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(!t.is_last());
    }
}
