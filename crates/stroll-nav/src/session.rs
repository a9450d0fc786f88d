//! One navigation session: route, prompts, off-route notices and stops.

use std::time::{Duration, Instant};

use serde::Deserialize;
use stroll_geo::{progress_along_path, GeoPoint};
use stroll_proto::events::{EventKind, NavEvent};
use stroll_proto::position::PositionFix;
use stroll_route::{locate_by_location, locate_by_progress, RoutePlan, StopTracker, TravelMode, Waypoint};
use tracing::{debug, info};

use crate::phrases::{self, Language};
use crate::reroute::OffRouteGuard;
use crate::scheduler::{ManeuverId, NavigationScheduler, StepContext};
use crate::speech::SpeechSink;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_spoken")]
    pub spoken: bool,
    #[serde(default = "default_off_route_m")]
    pub off_route_m: f64,
    #[serde(default = "default_recalc_interval_s")]
    pub recalc_interval_s: u64,
}

fn default_spoken() -> bool { true }
fn default_off_route_m() -> f64 { 40.0 }
fn default_recalc_interval_s() -> u64 { 10 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: TravelMode::default(),
            language: Language::default(),
            spoken: default_spoken(),
            off_route_m: default_off_route_m(),
            recalc_interval_s: default_recalc_interval_s(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Navigating,
    Stopped,
}

pub struct NavSession<S: SpeechSink> {
    cfg: SessionConfig,
    sink: S,
    scheduler: NavigationScheduler,
    guard: OffRouteGuard,
    plan: Option<RoutePlan>,
    stops: StopTracker,
    simulating: bool,
    state: SessionState,
}

impl<S: SpeechSink> NavSession<S> {
    pub fn new(cfg: SessionConfig, sink: S) -> Self {
        let scheduler = NavigationScheduler::new(cfg.mode, cfg.language);
        let guard = OffRouteGuard::new(cfg.off_route_m, Duration::from_secs(cfg.recalc_interval_s));
        Self {
            cfg,
            sink,
            scheduler,
            guard,
            plan: None,
            stops: StopTracker::default(),
            simulating: false,
            state: SessionState::Idle,
        }
    }

    /// Start (or restart) navigating `plan`. Clears every prompt flag.
    pub fn activate_route(&mut self, plan: RoutePlan, targets: Vec<Waypoint>, simulating: bool) {
        info!(
            "session: route active ({} steps, {:.2} km, {} stops, simulated={})",
            plan.steps.len(),
            plan.total_km,
            targets.len(),
            simulating
        );
        self.scheduler.reset_voice_state();
        self.guard.reset();
        self.plan = Some(plan);
        self.stops = StopTracker::new(targets);
        self.simulating = simulating;
        self.state = SessionState::Navigating;
    }

    /// Stop navigating. Prompt flags stay as they are until the next
    /// [`activate_route`](Self::activate_route), and nothing is announced.
    pub fn stop(&mut self) {
        if self.state == SessionState::Navigating {
            info!("session: stopped");
        }
        self.state = SessionState::Stopped;
    }

    /// In simulation the simulator owns stop advancement; mirror its index.
    /// A stop the simulator moved past before any arrival fired is announced
    /// here, with `fix` as the location.
    pub fn follow_stop(&mut self, index: usize, fix: &PositionFix) -> Vec<NavEvent> {
        if self.state != SessionState::Navigating {
            return Vec::new();
        }
        self.stops
            .follow(index)
            .into_iter()
            .map(|(i, stop)| self.stop_event(EventKind::StopReached, fix, i, stop))
            .collect()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn scheduler(&self) -> &NavigationScheduler {
        &self.scheduler
    }

    pub fn stops(&self) -> &StopTracker {
        &self.stops
    }

    pub fn plan(&self) -> Option<&RoutePlan> {
        self.plan.as_ref()
    }

    /// Feed one position. Returns whatever was announced, in order.
    pub fn on_position(&mut self, fix: &PositionFix, now: Instant) -> Vec<NavEvent> {
        let mut events = Vec::new();
        if self.state != SessionState::Navigating || !fix.is_finite() {
            return events;
        }
        let Some(plan) = self.plan.as_ref() else { return events; };
        let pos = GeoPoint::new(fix.lat, fix.lng);
        let lang = self.cfg.language;

        let Some(snap) = locate_by_location(pos, &plan.steps) else { return events; };
        if self.guard.check(snap.nearest_m, self.simulating, now) {
            let text = phrases::recalculating(lang);
            info!("session: off route by {:.0} m", snap.nearest_m);
            self.say(text);
            events.push(NavEvent::new(EventKind::Recalculating, fix.lat, fix.lng, text));
        }

        // Progress along the path does not jump to the following maneuver
        // halfway down a long leg; snapping is the fallback without a path.
        let (index, distance_m) = if plan.path.is_routable() {
            let progress_m = progress_along_path(pos, plan.path.points()) * 1000.0;
            locate_by_progress(progress_m, &plan.steps)
                .map(|(i, d)| (i, d.round()))
                .unwrap_or((snap.index, snap.distance_m))
        } else {
            (snap.index, snap.distance_m)
        };

        let ctx = StepContext {
            id: ManeuverId(index),
            distance_m,
            speed_mps: fix.speed_mps.unwrap_or(0.0),
            step: &plan.steps[index],
            next: plan.steps.get(index + 1),
        };
        if let Some(prompt) = self.scheduler.decide(&ctx) {
            self.say(&prompt.text);
            let mut ev = NavEvent::new(EventKind::Instruction, fix.lat, fix.lng, prompt.text);
            ev.maneuver = Some(prompt.id.0);
            ev.stage = Some(prompt.stage.as_str().to_string());
            events.push(ev);
        }

        // announce the stop being approached before moving past it
        let last = self.stops.is_last();
        if let Some((index, stop)) = self.stops.check_arrival(pos) {
            let kind = if last { EventKind::Arrived } else { EventKind::StopReached };
            events.push(self.stop_event(kind, fix, index, stop));
        }
        if !self.simulating {
            self.stops.advance_if_near(pos);
        }

        events
    }

    fn stop_event(&self, kind: EventKind, fix: &PositionFix, index: usize, stop: Waypoint) -> NavEvent {
        let text = phrases::stop_reached(self.cfg.language, index, &stop.name);
        debug!("session: {:?} {}", kind, stop.id);
        self.say(&text);
        let mut ev = NavEvent::new(kind, fix.lat, fix.lng, text);
        ev.stop_id = Some(stop.id);
        ev.stop_index = Some(index);
        ev
    }

    fn say(&self, text: &str) {
        if self.cfg.spoken {
            self.sink.speak(text);
        }
    }
}
