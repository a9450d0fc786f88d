//! Orders manual waypoints and discovered POIs along the route polyline.

use stroll_geo::Path;
use tracing::debug;

use crate::waypoint::{Identified, OrderedStop, Waypoint, WaypointKind};

/// Which stop becomes the head of a rotated cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Id(String),
    Index(usize),
    /// Free text: an id when one matches, otherwise a numeric index.
    Text(String),
}

impl From<&str> for Anchor {
    fn from(s: &str) -> Self {
        Anchor::Text(s.to_string())
    }
}

impl Anchor {
    fn position<T: Identified>(&self, items: &[T]) -> Option<usize> {
        let by_id = |id: &str| items.iter().position(|it| it.id() == id);
        match self {
            Anchor::Index(i) => (*i < items.len()).then_some(*i),
            Anchor::Id(id) => by_id(id.as_str()),
            Anchor::Text(s) => by_id(s.as_str()).or_else(|| s.parse::<usize>().ok().filter(|i| *i < items.len())),
        }
    }
}

/// Merge manual waypoints and discovered POIs into route order.
///
/// The first manual waypoint is the fixed start. Everything else is pooled
/// and sorted by its progress along `path` (stable, so equal progress keeps
/// input order: remaining manual stops first, then discovered ones). With
/// fewer than two path points nothing is projected and the input order is
/// returned as is.
pub fn interleave(manual: &[Waypoint], discovered: &[Waypoint], path: &Path) -> Vec<OrderedStop> {
    let (start, rest) = match manual.split_first() {
        Some((s, rest)) => (Some(s), rest),
        None => (None, manual),
    };
    let start = start.map(|s| s.clone().with_kind(WaypointKind::Start));
    let pooled = rest.iter().chain(discovered.iter()).cloned();

    if !path.is_routable() {
        debug!("interleave: path has {} point(s), keeping input order", path.len());
        return start
            .into_iter()
            .chain(pooled)
            .map(|waypoint| OrderedStop { waypoint, progress_km: None })
            .collect();
    }

    let mut placed: Vec<OrderedStop> = pooled
        .map(|waypoint| {
            let progress = path.progress_of(waypoint.point());
            OrderedStop { waypoint, progress_km: Some(progress) }
        })
        .collect();
    placed.sort_by(|a, b| sort_key(a).total_cmp(&sort_key(b)));

    let mut out = Vec::with_capacity(placed.len() + 1);
    if let Some(waypoint) = start {
        let progress = path.progress_of(waypoint.point());
        out.push(OrderedStop { waypoint, progress_km: Some(progress) });
    }
    out.extend(placed);
    out
}

fn sort_key(s: &OrderedStop) -> f64 {
    match s.progress_km {
        Some(p) if !p.is_nan() => p,
        _ => f64::INFINITY,
    }
}

/// Stops the traveller still has to visit: everything but the fixed start.
pub fn navigation_targets(ordered: &[OrderedStop]) -> Vec<Waypoint> {
    ordered
        .iter()
        .filter(|s| s.waypoint.kind != WaypointKind::Start)
        .map(|s| s.waypoint.clone())
        .collect()
}

/// Rotate a loop so the anchored stop comes first: `[A,B,C,D]` at `C`
/// gives `[C,D,A,B]`. Unknown anchors return an unrotated copy.
pub fn rotate_cycle<T: Identified + Clone>(items: &[T], anchor: &Anchor) -> Vec<T> {
    match anchor.position(items) {
        Some(i) => items[i..].iter().chain(items[..i].iter()).cloned().collect(),
        None => items.to_vec(),
    }
}

/// Walk a loop the other way round from the same start: `[A,B,C,D]` gives
/// `[A,D,C,B]`.
pub fn reverse_cycle<T: Clone>(items: &[T]) -> Vec<T> {
    match items.split_first() {
        Some((head, rest)) => std::iter::once(head).chain(rest.iter().rev()).cloned().collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroll_geo::{point_ahead_of, GeoPoint};

    fn origin() -> GeoPoint {
        GeoPoint::new(52.0, 4.0)
    }

    // 10 km due east, one vertex per km
    fn east_path() -> Path {
        let mut pts = vec![origin()];
        for _ in 0..10 {
            let last = *pts.last().unwrap();
            pts.push(point_ahead_of(last, 90.0, 1.0));
        }
        Path::new(pts)
    }

    fn stop_at_km(id: &str, kind: WaypointKind, km: f64) -> Waypoint {
        let on_route = point_ahead_of(origin(), 90.0, km);
        // a little off the line, like a real POI
        Waypoint::new(id, id.to_uppercase(), kind, point_ahead_of(on_route, 0.0, 0.02))
    }

    fn ids<T: Identified>(items: &[T]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    #[test]
    fn start_only_yields_start() {
        let start = Waypoint::new("s", "Start", WaypointKind::Manual, origin());
        let path = Path::new(vec![origin(), point_ahead_of(origin(), 90.0, 1.0)]);
        let out = interleave(&[start], &[], &path);
        assert_eq!(ids(&out), vec!["s"]);
        assert_eq!(out[0].waypoint.kind, WaypointKind::Start);
    }

    #[test]
    fn pois_sorted_by_progress() {
        let start = Waypoint::new("s", "Start", WaypointKind::Manual, origin());
        let pois = [
            stop_at_km("five", WaypointKind::Discovered, 5.0),
            stop_at_km("one", WaypointKind::Discovered, 1.0),
            stop_at_km("three", WaypointKind::Discovered, 3.0),
        ];
        let out = interleave(&[start], &pois, &east_path());
        assert_eq!(ids(&out), vec!["s", "one", "three", "five"]);

        let progress: Vec<f64> = out[1..].iter().map(|s| s.progress_km.unwrap()).collect();
        assert!((progress[0] - 1.0).abs() < 0.01);
        assert!((progress[1] - 3.0).abs() < 0.01);
        assert!((progress[2] - 5.0).abs() < 0.01);
    }

    #[test]
    fn manual_and_discovered_share_one_pool() {
        let manual = [
            Waypoint::new("s", "Start", WaypointKind::Manual, origin()),
            stop_at_km("m4", WaypointKind::Manual, 4.0),
        ];
        let pois = [stop_at_km("p2", WaypointKind::Discovered, 2.0), stop_at_km("p6", WaypointKind::Discovered, 6.0)];
        let out = interleave(&manual, &pois, &east_path());
        assert_eq!(ids(&out), vec!["s", "p2", "m4", "p6"]);
    }

    #[test]
    fn equal_progress_keeps_input_order() {
        let manual = [
            Waypoint::new("s", "Start", WaypointKind::Manual, origin()),
            stop_at_km("m", WaypointKind::Manual, 2.0),
        ];
        let pois = [stop_at_km("p", WaypointKind::Discovered, 2.0)];
        let out = interleave(&manual, &pois, &east_path());
        assert_eq!(ids(&out), vec!["s", "m", "p"]);
    }

    #[test]
    fn short_path_keeps_input_order() {
        let manual = [
            Waypoint::new("s", "Start", WaypointKind::Manual, origin()),
            stop_at_km("m5", WaypointKind::Manual, 5.0),
        ];
        let pois = [stop_at_km("p1", WaypointKind::Discovered, 1.0)];
        let out = interleave(&manual, &pois, &Path::new(vec![origin()]));
        assert_eq!(ids(&out), vec!["s", "m5", "p1"]);
        assert!(out.iter().all(|s| s.progress_km.is_none()));
    }

    #[test]
    fn no_manual_stops_means_no_fixed_start() {
        let pois = [stop_at_km("b", WaypointKind::Discovered, 3.0), stop_at_km("a", WaypointKind::Discovered, 1.0)];
        let out = interleave(&[], &pois, &east_path());
        assert_eq!(ids(&out), vec!["a", "b"]);
        assert_eq!(navigation_targets(&out).len(), 2);
    }

    #[test]
    fn targets_skip_start() {
        let manual = [Waypoint::new("s", "Start", WaypointKind::Manual, origin())];
        let pois = [stop_at_km("a", WaypointKind::Discovered, 1.0)];
        let out = interleave(&manual, &pois, &east_path());
        assert_eq!(ids(&navigation_targets(&out)), vec!["a"]);
    }

    fn letters() -> Vec<Waypoint> {
        ["A", "B", "C", "D"]
            .iter()
            .map(|id| Waypoint::new(*id, *id, WaypointKind::Manual, origin()))
            .collect()
    }

    #[test]
    fn rotate_by_id() {
        let out = rotate_cycle(&letters(), &Anchor::Id("C".into()));
        assert_eq!(ids(&out), vec!["C", "D", "A", "B"]);
    }

    #[test]
    fn rotate_by_index() {
        let out = rotate_cycle(&letters(), &Anchor::Index(1));
        assert_eq!(ids(&out), vec!["B", "C", "D", "A"]);
    }

    #[test]
    fn rotate_unknown_anchor_is_a_copy() {
        assert_eq!(ids(&rotate_cycle(&letters(), &Anchor::Id("Z".into()))), vec!["A", "B", "C", "D"]);
        assert_eq!(ids(&rotate_cycle(&letters(), &Anchor::Index(9))), vec!["A", "B", "C", "D"]);
        assert!(rotate_cycle::<Waypoint>(&[], &Anchor::Index(0)).is_empty());
    }

    #[test]
    fn reverse_keeps_anchor() {
        assert_eq!(ids(&reverse_cycle(&letters())), vec!["A", "D", "C", "B"]);
        assert!(reverse_cycle::<Waypoint>(&[]).is_empty());
        assert_eq!(ids(&reverse_cycle(&letters()[..1])), vec!["A"]);
    }

    #[test]
    fn text_anchor_prefers_ids_over_indexes() {
        let mut stops = letters();
        stops[3] = Waypoint::new("1", "Nieuwmarkt", WaypointKind::Manual, origin());
        // "1" is the id of the last stop, not index 1
        assert_eq!(ids(&rotate_cycle(&stops, &Anchor::from("1"))), vec!["1", "A", "B", "C"]);
        assert_eq!(ids(&rotate_cycle(&stops, &Anchor::from("2"))), vec!["C", "1", "A", "B"]);
        assert_eq!(ids(&rotate_cycle(&stops, &Anchor::from("B"))), vec!["B", "C", "1", "A"]);
        assert_eq!(ids(&rotate_cycle(&stops, &Anchor::from("9"))), vec!["A", "B", "C", "1"]);
    }
}
