use std::time::{Duration, Instant};

/// Rate-limited "recalculating" notice for a traveller who left the route.
#[derive(Debug, Clone)]
pub struct OffRouteGuard {
    threshold_m: f64,
    min_interval: Duration,
    last_notice: Option<Instant>,
}

impl OffRouteGuard {
    pub fn new(threshold_m: f64, min_interval: Duration) -> Self {
        Self { threshold_m, min_interval, last_notice: None }
    }

    /// True when a notice should be given now. `nearest_m` is the distance to
    /// the closest maneuver location; simulated positions never count as off
    /// route.
    pub fn check(&mut self, nearest_m: f64, simulating: bool, now: Instant) -> bool {
        if simulating || !nearest_m.is_finite() || nearest_m <= self.threshold_m {
            return false;
        }
        if let Some(t) = self.last_notice {
            if now.saturating_duration_since(t) < self.min_interval { return false; }
        }
        self.last_notice = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_notice = None;
    }
}

impl Default for OffRouteGuard {
    fn default() -> Self {
        Self::new(40.0, Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_at_most_once_per_window() {
        let mut g = OffRouteGuard::default();
        let t0 = Instant::now();
        assert!(g.check(55.0, false, t0));
        assert!(!g.check(55.0, false, t0 + Duration::from_secs(9)));
        assert!(g.check(55.0, false, t0 + Duration::from_secs(10)));
    }

    #[test]
    fn on_route_or_simulating_is_quiet() {
        let mut g = OffRouteGuard::default();
        let t0 = Instant::now();
        assert!(!g.check(40.0, false, t0));
        assert!(!g.check(500.0, true, t0));
        assert!(!g.check(f64::INFINITY, false, t0));
        assert!(g.check(41.0, false, t0));
    }

    #[test]
    fn reset_clears_window() {
        let mut g = OffRouteGuard::default();
        let t0 = Instant::now();
        assert!(g.check(80.0, false, t0));
        g.reset();
        assert!(g.check(80.0, false, t0 + Duration::from_secs(1)));
    }
}
