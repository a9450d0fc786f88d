//! Where the traveller is relative to the maneuver list.

use stroll_geo::{distance_km, GeoPoint};

use crate::maneuver::ManeuverStep;

// Slack when deciding whether progress has passed the end of a step.
const STEP_END_BUFFER_M: f64 = 5.0;

/// The maneuver the traveller is heading for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManeuverTarget {
    pub index: usize,
    /// Distance to the target maneuver, whole metres; infinite when the
    /// target has no usable location.
    pub distance_m: f64,
    /// Distance to the closest maneuver location of any step, metres.
    pub nearest_m: f64,
}

/// Snap to the nearest maneuver location; the target is the one after it.
pub fn locate_by_location(user: GeoPoint, steps: &[ManeuverStep]) -> Option<ManeuverTarget> {
    if steps.is_empty() {
        return None;
    }

    let mut min_km = f64::INFINITY;
    let mut closest = 0;
    for (i, s) in steps.iter().enumerate() {
        if let Some(loc) = s.location {
            let d = distance_km(user, loc);
            if d < min_km {
                min_km = d;
                closest = i;
            }
        }
    }

    let index = (closest + 1).min(steps.len() - 1);
    let distance_m = match steps[index].location {
        Some(loc) => (distance_km(user, loc) * 1000.0).round(),
        None => f64::INFINITY,
    };
    Some(ManeuverTarget { index, distance_m, nearest_m: min_km * 1000.0 })
}

/// Progress-based lookup, robust against the user being closer to a later
/// maneuver point than to the one just passed. Returns the target step index
/// and the metres left until it.
///
/// `None` when the steps carry no lengths at all: the provider left them out
/// and only [`locate_by_location`] can place the user.
pub fn locate_by_progress(progress_m: f64, steps: &[ManeuverStep]) -> Option<(usize, f64)> {
    if steps.iter().map(|s| s.distance_m).sum::<f64>() <= 0.0 {
        return None;
    }

    let mut current = steps.len() - 1;
    let mut walked = 0.0;
    for (i, s) in steps.iter().enumerate() {
        if progress_m < walked + s.distance_m + STEP_END_BUFFER_M {
            current = i;
            break;
        }
        walked += s.distance_m;
    }

    let target = (current + 1).min(steps.len() - 1);
    let target_start: f64 = steps[..target].iter().map(|s| s.distance_m).sum();
    Some((target, (target_start - progress_m).max(0.0)))
}

pub fn remaining_km(progress_km: f64, total_km: f64) -> f64 {
    (total_km - progress_km).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maneuver::{ManeuverKind, Modifier};
    use stroll_geo::point_ahead_of;

    fn origin() -> GeoPoint {
        GeoPoint::new(52.0, 4.0)
    }

    // depart, right after 200 m, left after another 300 m, arrive after 100 m
    fn steps() -> Vec<ManeuverStep> {
        let a = origin();
        let b = point_ahead_of(a, 90.0, 0.2);
        let c = point_ahead_of(b, 180.0, 0.3);
        let d = point_ahead_of(c, 90.0, 0.1);
        vec![
            ManeuverStep::new(ManeuverKind::Depart, Modifier::None).at(a).length(200.0),
            ManeuverStep::new(ManeuverKind::Turn, Modifier::Right).at(b).length(300.0),
            ManeuverStep::new(ManeuverKind::Turn, Modifier::Left).at(c).length(100.0),
            ManeuverStep::new(ManeuverKind::Arrive, Modifier::None).at(d),
        ]
    }

    #[test]
    fn nearest_location_targets_next_step() {
        let user = point_ahead_of(origin(), 90.0, 0.05);
        let t = locate_by_location(user, &steps()).unwrap();
        assert_eq!(t.index, 1);
        assert_eq!(t.distance_m, 150.0);
        assert!((t.nearest_m - 50.0).abs() < 0.5);
    }

    #[test]
    fn target_never_runs_past_last_step() {
        let s = steps();
        let t = locate_by_location(s[3].location.unwrap(), &s).unwrap();
        assert_eq!(t.index, 3);
        assert_eq!(t.distance_m, 0.0);
    }

    #[test]
    fn missing_target_location_is_infinite() {
        let mut s = steps();
        s[1].location = None;
        let t = locate_by_location(origin(), &s).unwrap();
        assert_eq!(t.index, 1);
        assert!(t.distance_m.is_infinite());
        assert!(locate_by_location(origin(), &[]).is_none());
    }

    #[test]
    fn progress_lookup() {
        let s = steps();
        assert_eq!(locate_by_progress(0.0, &s), Some((1, 200.0)));
        assert_eq!(locate_by_progress(150.0, &s), Some((1, 50.0)));
        // inside the end buffer of the first step
        assert_eq!(locate_by_progress(203.0, &s), Some((1, 0.0)));
        assert_eq!(locate_by_progress(250.0, &s), Some((2, 250.0)));
        assert_eq!(locate_by_progress(10_000.0, &s), Some((3, 0.0)));
        assert_eq!(locate_by_progress(0.0, &[]), None);
    }

    #[test]
    fn progress_needs_step_lengths() {
        let mut s = steps();
        for step in &mut s {
            step.distance_m = 0.0;
        }
        assert_eq!(locate_by_progress(0.0, &s), None);
        // the snap still finds the first turn 200 m ahead
        let t = locate_by_location(origin(), &s).unwrap();
        assert_eq!((t.index, t.distance_m), (1, 200.0));
    }

    #[test]
    fn remaining_is_floored() {
        assert_eq!(remaining_km(1.5, 4.0), 2.5);
        assert_eq!(remaining_km(5.0, 4.0), 0.0);
    }
}
