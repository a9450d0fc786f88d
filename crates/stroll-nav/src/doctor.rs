use std::collections::HashSet;

use anyhow::Result;
use stroll_route::{RoutePlan, Waypoint};

use crate::session::SessionConfig;

pub fn check_session(cfg: &SessionConfig) -> Result<()> {
    anyhow::ensure!(cfg.off_route_m >= 10.0 && cfg.off_route_m <= 500.0, "nav.off_route_m should be 10..500");
    anyhow::ensure!(cfg.recalc_interval_s >= 1 && cfg.recalc_interval_s <= 120, "nav.recalc_interval_s should be 1..120");
    Ok(())
}

pub fn check_stops(stops: &[Waypoint]) -> Result<()> {
    let mut ids = HashSet::new();
    for s in stops {
        anyhow::ensure!(!s.id.is_empty(), "stop {:?} has an empty id", s.name);
        anyhow::ensure!(s.point().is_valid(), "stop {} has invalid coordinates", s.id);
        anyhow::ensure!(ids.insert(s.id.as_str()), "duplicate stop id {}", s.id);
    }
    Ok(())
}

pub fn check_route(plan: &RoutePlan) -> Result<()> {
    anyhow::ensure!(plan.path.is_routable(), "route must have >= 2 points");
    anyhow::ensure!(plan.total_km.is_finite() && plan.total_km > 0.0, "route has zero length");
    anyhow::ensure!(!plan.steps.is_empty(), "route has no maneuvers");
    let located = plan.steps.iter().filter(|s| s.location.is_some()).count();
    anyhow::ensure!(located > 0, "no maneuver has a location");
    Ok(())
}

pub fn check_sim(speed_multiplier: f64, tick_ms: u64) -> Result<()> {
    anyhow::ensure!(speed_multiplier > 0.0 && speed_multiplier <= 100.0, "sim.speed_multiplier should be in (0, 100]");
    anyhow::ensure!(tick_ms >= 10 && tick_ms <= 1000, "sim.tick_ms should be 10..1000");
    Ok(())
}
