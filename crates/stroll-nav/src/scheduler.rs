//! Speed-aware voice prompts per maneuver.
//!
//! Each maneuver gets at most three prompts, early, prepare and now, in that
//! order. Which one fires depends on the time-to-maneuver (distance over
//! current speed) and on plain distance, with separate windows for walking and
//! cycling.

use std::collections::HashMap;

use stroll_route::{ManeuverStep, TravelMode};
use tracing::{debug, info};

use crate::phrases::{self, Language};
use crate::speech::SpeechSink;

/// Speeds below this are treated as this, so a stationary user does not get
/// an infinite time-to-maneuver.
pub const MIN_SPEED_MPS: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Time-to-maneuver window for the early prompt, seconds.
    pub early_window_s: (f64, f64),
    pub prepare_window_s: (f64, f64),
    pub now_s: f64,
    /// Early fires at or beyond this distance regardless of speed.
    pub early_m: f64,
    /// Prepare fires at or inside this distance.
    pub prepare_m: f64,
    pub now_m: f64,
}

pub const WALK: Thresholds = Thresholds {
    early_window_s: (10.0, 16.0),
    prepare_window_s: (5.0, 8.0),
    now_s: 2.0,
    early_m: 90.0,
    prepare_m: 40.0,
    now_m: 12.0,
};

pub const BIKE: Thresholds = Thresholds {
    early_window_s: (18.0, 28.0),
    prepare_window_s: (8.0, 12.0),
    now_s: 3.0,
    early_m: 180.0,
    prepare_m: 90.0,
    now_m: 25.0,
};

pub fn thresholds(mode: TravelMode) -> &'static Thresholds {
    match mode {
        TravelMode::Walking => &WALK,
        TravelMode::Cycling => &BIKE,
    }
}

/// Seconds until the maneuver at the current speed.
pub fn time_to_maneuver(distance_m: f64, speed_mps: f64) -> f64 {
    let speed = if speed_mps.is_finite() { speed_mps } else { 0.0 };
    distance_m / speed.max(MIN_SPEED_MPS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Early,
    Prepare,
    Now,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Early => "early",
            Stage::Prepare => "prepare",
            Stage::Now => "now",
        }
    }
}

/// Maneuver key; the step index within the active route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManeuverId(pub usize);

/// Progress of one maneuver through its prompts. A stage counts as spoken
/// once it or any later stage has fired, so stages never go backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceFlags {
    reached: Option<Stage>,
}

impl VoiceFlags {
    pub fn is_spoken(&self, stage: Stage) -> bool {
        self.reached.is_some_and(|r| r >= stage)
    }

    pub fn early_spoken(&self) -> bool {
        self.is_spoken(Stage::Early)
    }

    pub fn prepare_spoken(&self) -> bool {
        self.is_spoken(Stage::Prepare)
    }

    pub fn now_spoken(&self) -> bool {
        self.is_spoken(Stage::Now)
    }

    fn mark(&mut self, stage: Stage) {
        self.reached = Some(self.reached.map_or(stage, |r| r.max(stage)));
    }
}

/// Per-session prompt bookkeeping, keyed by maneuver.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    flags: HashMap<ManeuverId, VoiceFlags>,
}

impl SchedulerState {
    pub fn flags(&self, id: ManeuverId) -> VoiceFlags {
        self.flags.get(&id).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Forget every prompt. Call when the active route changes, never mid-route.
pub fn reset_voice_state(state: &mut SchedulerState) {
    state.flags.clear();
}

/// Inputs for one scheduling decision.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub id: ManeuverId,
    pub distance_m: f64,
    pub speed_mps: f64,
    pub step: &'a ManeuverStep,
    /// Maneuver after this one, chained onto the "now" line.
    pub next: Option<&'a ManeuverStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub id: ManeuverId,
    pub stage: Stage,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct NavigationScheduler {
    mode: TravelMode,
    language: Language,
    state: SchedulerState,
}

impl NavigationScheduler {
    pub fn new(mode: TravelMode, language: Language) -> Self {
        Self { mode, language, state: SchedulerState::default() }
    }

    pub fn mode(&self) -> TravelMode {
        self.mode
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn reset_voice_state(&mut self) {
        if !self.state.is_empty() {
            info!("scheduler: voice state reset ({} maneuvers)", self.state.flags.len());
        }
        reset_voice_state(&mut self.state);
    }

    /// Decide on at most one prompt and record it. Non-finite or negative
    /// distances are ignored.
    pub fn decide(&mut self, ctx: &StepContext<'_>) -> Option<Prompt> {
        let d = ctx.distance_m;
        if !d.is_finite() || d < 0.0 {
            return None;
        }
        let th = thresholds(self.mode);
        let t = time_to_maneuver(d, ctx.speed_mps);
        let flags = self.state.flags(ctx.id);

        let stage = if !flags.early_spoken() && (within(t, th.early_window_s) || d >= th.early_m) {
            Stage::Early
        } else if !flags.prepare_spoken() && (within(t, th.prepare_window_s) || d <= th.prepare_m) && d > th.now_m {
            Stage::Prepare
        } else if !flags.now_spoken() && (t <= th.now_s || d <= th.now_m) {
            Stage::Now
        } else {
            return None;
        };

        let text = match stage {
            Stage::Early => phrases::early_line(self.language, ctx.step, d.max(th.prepare_m)),
            Stage::Prepare => phrases::prepare_line(self.language, ctx.step),
            Stage::Now => phrases::now_line(self.language, ctx.step, ctx.next),
        };
        self.state.flags.entry(ctx.id).or_default().mark(stage);
        debug!("scheduler: maneuver {} {} at {:.0} m, ttm {:.1} s", ctx.id.0, stage.as_str(), d, t);

        Some(Prompt { id: ctx.id, stage, text })
    }

    /// [`decide`](Self::decide), then hand the line to `sink` without waiting
    /// for playback.
    pub fn maybe_speak(&mut self, ctx: &StepContext<'_>, sink: &dyn SpeechSink) -> Option<Prompt> {
        let prompt = self.decide(ctx)?;
        sink.speak(&prompt.text);
        Some(prompt)
    }
}

fn within(t: f64, (lo, hi): (f64, f64)) -> bool {
    t >= lo && t <= hi
}
