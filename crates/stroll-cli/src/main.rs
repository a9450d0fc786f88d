mod event_log;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use stroll_camera::{look_ahead, CameraConfig, HeadingUpController, LOOK_AHEAD_M};
use stroll_geo::{point_ahead_of, GeoPoint, Path};
use stroll_nav::{doctor, gnss, run_speech_worker, ChannelSpeech, ConsoleVoice, NavSession, PositionFeed, SessionConfig};
use stroll_proto::events::{EventKind, NavEvent};
use stroll_proto::position::PositionFix;
use stroll_route::{
    interleave, navigation_targets, remaining_km, reverse_cycle, rotate_cycle, Anchor, OrderedStop, RoutePlan,
    Waypoint, WaypointKind,
};
use stroll_sim::{run_simulation, MotionSimulator};

use crate::event_log::EventLog;

#[derive(Debug, Parser)]
#[command(name = "stroll", version, about = "stroll - turn-by-turn voice navigation for city walks")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the configuration, stops and route.
    Doctor,
    /// Print the stops in walking order.
    Sequence {
        /// Stop id to start the loop at; a number matching no id is an index.
        #[arg(long)]
        start: Option<String>,
        /// Walk the loop the other way round.
        #[arg(long)]
        reverse: bool,
    },
    /// Replay the route without a GPS.
    Simulate {
        /// Overrides sim.speed_multiplier.
        #[arg(long)]
        speed: Option<f64>,
    },
    /// Navigate from a live (or recorded) NMEA GPS.
    Run,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    #[serde(default)]
    nav: SessionConfig,
    route: RouteCfg,
    #[serde(default)]
    stops: StopsCfg,
    #[serde(default)]
    sim: SimCfg,
    gnss: Option<GnssCfg>,
    #[serde(default)]
    camera: CameraConfig,
    #[serde(default)]
    events: EventsCfg,
}

#[derive(Debug, serde::Deserialize)]
struct RouteCfg { file: String }

#[derive(Debug, Default, serde::Deserialize)]
struct StopsCfg {
    #[serde(default)]
    manual: Vec<Waypoint>,
    #[serde(default)]
    discovered: Vec<Waypoint>,
}

#[derive(Debug, serde::Deserialize)]
struct SimCfg {
    #[serde(default)]
    enable: bool,
    #[serde(default = "default_speed_multiplier")]
    speed_multiplier: f64,
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    gps_noise_m: Option<f64>,
}

fn default_speed_multiplier() -> f64 { 1.0 }
fn default_tick_ms() -> u64 { 50 }

impl Default for SimCfg {
    fn default() -> Self {
        Self { enable: false, speed_multiplier: default_speed_multiplier(), tick_ms: default_tick_ms(), gps_noise_m: None }
    }
}

#[derive(Debug, serde::Deserialize)]
struct GnssCfg {
    source: String,
    nmea_device: Option<String>,
    nmea_file: Option<String>,
    #[serde(default = "default_baud")]
    baud: u32,
    /// Delay between replayed fixes.
    replay_interval_ms: Option<u64>,
}

fn default_baud() -> u32 { 115200 }

#[derive(Debug, Default, serde::Deserialize)]
struct EventsCfg { log_file: Option<String> }

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    let mut cfg: Config = toml::from_str(&s).context("parse config toml")?;
    for w in cfg.stops.manual.iter_mut() {
        w.kind = WaypointKind::Manual;
    }
    for w in cfg.stops.discovered.iter_mut() {
        w.kind = WaypointKind::Discovered;
    }
    Ok(cfg)
}

fn load_route(cfg: &Config) -> Result<RoutePlan> {
    let s = std::fs::read_to_string(&cfg.route.file).with_context(|| format!("read route {}", cfg.route.file))?;
    RoutePlan::from_provider_json(&s).with_context(|| format!("parse route {}", cfg.route.file))
}

fn ordered_stops(cfg: &Config, path: &Path) -> Vec<OrderedStop> {
    interleave(&cfg.stops.manual, &cfg.stops.discovered, path)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor_cmd(&cfg)?,
        Command::Sequence { start, reverse } => sequence(&cfg, start.as_deref(), reverse)?,
        Command::Simulate { speed } => simulate(&cfg, speed).await?,
        Command::Run => run(&cfg).await?,
    }
    Ok(())
}

fn doctor_cmd(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    doctor::check_session(&cfg.nav)?;
    let all: Vec<Waypoint> = cfg.stops.manual.iter().chain(cfg.stops.discovered.iter()).cloned().collect();
    doctor::check_stops(&all)?;
    let plan = load_route(cfg)?;
    doctor::check_route(&plan)?;
    doctor::check_sim(cfg.sim.speed_multiplier, cfg.sim.tick_ms)?;

    if let Some(g) = &cfg.gnss {
        match g.source.as_str() {
            "nmea-serial" => {
                anyhow::ensure!(g.nmea_device.as_ref().map(|s| !s.is_empty()).unwrap_or(false), "gnss.nmea_device missing");
                anyhow::ensure!(g.baud > 0, "gnss.baud invalid");
            }
            "nmea-file" => anyhow::ensure!(g.nmea_file.is_some(), "gnss.nmea_file missing"),
            other => anyhow::bail!("unknown gnss.source: {}", other),
        }
    } else if !cfg.sim.enable {
        warn!("doctor: no [gnss] section and sim disabled; only `simulate` will work");
    }
    anyhow::ensure!(cfg.camera.viewport_height_px > 0.0, "camera.viewport_height_px must be positive");

    let off_path = all.iter().filter(|w| !plan.path.is_location_on_path(w.point(), 0.03)).count();
    if off_path > 0 {
        warn!("doctor: {} stop(s) more than 30 m from the route", off_path);
    }

    info!("doctor: OK ({} stops, {:.2} km, {} maneuvers)", all.len(), plan.total_km, plan.steps.len());
    Ok(())
}

fn sequence(cfg: &Config, start: Option<&str>, reverse: bool) -> Result<()> {
    let plan = load_route(cfg)?;
    let mut stops = ordered_stops(cfg, &plan.path);
    if let Some(s) = start {
        stops = rotate_cycle(&stops, &Anchor::from(s));
    }
    if reverse {
        stops = reverse_cycle(&stops);
    }
    for (i, s) in stops.iter().enumerate() {
        let progress = s.progress_km.map(|p| format!("{:6.2} km", p)).unwrap_or_else(|| "     - km".to_string());
        println!("{:>2}. {}  {:<10} {} ({})", i, progress, format!("{:?}", s.waypoint.kind).to_lowercase(), s.waypoint.name, s.waypoint.id);
    }
    println!("total {:.2} km", plan.total_km);
    Ok(())
}

/// Everything downstream of a position: navigation, camera and the event log.
struct Navigator {
    session: NavSession<ChannelSpeech>,
    camera: Option<HeadingUpController>,
    path: Path,
    total_km: f64,
    log: EventLog,
}

impl Navigator {
    async fn new(cfg: &Config, speech: ChannelSpeech) -> Result<Self> {
        Ok(Self {
            session: NavSession::new(cfg.nav.clone(), speech),
            camera: cfg.camera.enable.then(|| HeadingUpController::new(cfg.camera.clone())),
            path: Path::default(),
            total_km: 0.0,
            log: EventLog::open(cfg.events.log_file.as_deref()).await?,
        })
    }

    fn activate(&mut self, plan: RoutePlan, targets: Vec<Waypoint>, simulating: bool) {
        self.path = plan.path.clone();
        self.total_km = plan.total_km;
        if let Some(cam) = self.camera.as_mut() {
            cam.reset();
        }
        self.session.activate_route(plan, targets, simulating);
    }

    /// Returns true once the last stop has been reached.
    async fn on_fix(&mut self, fix: &PositionFix) -> Result<bool> {
        let now = Instant::now();
        let events = self.session.on_position(fix, now);
        let arrived = self.record(events).await?;
        if let Some(cam) = self.camera.as_mut() {
            if let Some(pose) = cam.update(fix, now) {
                let zoom = look_ahead(&self.path, pose.center, LOOK_AHEAD_M).map(|l| l.zoom);
                debug!(
                    "camera: center {:.6},{:.6} bearing {:.0} pitch {:.0} zoom {:?}",
                    pose.center.lat, pose.center.lng, pose.bearing, pose.pitch, zoom
                );
            }
        }
        Ok(arrived)
    }

    /// Navigate on a simulated fix, then take over the simulator's stop
    /// index. The other order would move past a stop before its arrival
    /// check ran.
    async fn on_sim_tick(&mut self, fix: &PositionFix, active_stop: usize) -> Result<bool> {
        let arrived = self.on_fix(fix).await?;
        let passed = self.session.follow_stop(active_stop, fix);
        Ok(self.record(passed).await? || arrived)
    }

    async fn record(&mut self, events: Vec<NavEvent>) -> Result<bool> {
        let mut arrived = false;
        for ev in events {
            let ev = self.log.write(ev).await?;
            let left = remaining_km(self.path.progress_of(GeoPoint::new(ev.lat, ev.lng)), self.total_km);
            info!("{:?}: {} ({:.2} km to go)", ev.kind, ev.text, left);
            arrived |= ev.kind == EventKind::Arrived;
        }
        Ok(arrived)
    }

    async fn finish(mut self) -> Result<()> {
        self.session.stop();
        self.log.flush().await
    }
}

async fn simulate(cfg: &Config, speed: Option<f64>) -> Result<()> {
    let plan = load_route(cfg)?;
    let targets = navigation_targets(&ordered_stops(cfg, &plan.path));
    let multiplier = speed.unwrap_or(cfg.sim.speed_multiplier);
    let sim = MotionSimulator::new(&plan.path, cfg.nav.mode, multiplier, targets.clone())?;

    let (speech, speech_rx) = ChannelSpeech::new();
    let speech_task = tokio::spawn(run_speech_worker(speech_rx, ConsoleVoice::default()));
    let mut nav = Navigator::new(cfg, speech).await?;
    nav.activate(plan, targets, true);

    let (tx, mut rx) = mpsc::channel(64);
    let mut feed = PositionFeed::new();
    feed.switch_to("simulation", run_simulation(sim, Duration::from_millis(cfg.sim.tick_ms), tx));

    let noise_m = cfg.sim.gps_noise_m.filter(|n| *n > 0.0);
    loop {
        tokio::select! {
            tick = rx.recv() => {
                let Some(tick) = tick else { break; };
                let fix = match noise_m {
                    Some(n) => jitter(tick.fix, n),
                    None => tick.fix,
                };
                nav.on_sim_tick(&fix, tick.active_stop).await?;
                if tick.finished {
                    info!("simulate: route complete ({:.2} km)", tick.distance_km);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("simulate: interrupted");
                break;
            }
        }
    }

    feed.stop();
    nav.finish().await?;
    // session (and its speech sender) is gone; let queued lines play out
    let spoken = speech_task.await.context("speech worker")?;
    debug!("simulate: last lines {:?}", spoken.recent().collect::<Vec<_>>());
    Ok(())
}

async fn run(cfg: &Config) -> Result<()> {
    let g = cfg.gnss.as_ref().context("no [gnss] config section")?;
    let src = match g.source.as_str() {
        "nmea-serial" => gnss::GnssSource::serial(g.nmea_device.as_ref().context("gnss.nmea_device missing")?, g.baud)?,
        "nmea-file" => gnss::GnssSource::file(
            g.nmea_file.as_ref().context("gnss.nmea_file missing")?,
            g.replay_interval_ms.map(Duration::from_millis),
        )?,
        other => anyhow::bail!("unknown gnss.source: {}", other),
    };

    let plan = load_route(cfg)?;
    let targets = navigation_targets(&ordered_stops(cfg, &plan.path));

    let (speech, speech_rx) = ChannelSpeech::new();
    let speech_task = tokio::spawn(run_speech_worker(speech_rx, ConsoleVoice::default()));
    let mut nav = Navigator::new(cfg, speech).await?;
    nav.activate(plan, targets, false);

    let (tx, mut rx) = mpsc::channel(16);
    let mut feed = PositionFeed::new();
    feed.adopt("gnss", gnss::spawn_gnss(src, tx));
    info!("run: navigating");

    loop {
        tokio::select! {
            fix = rx.recv() => {
                let Some(fix) = fix else {
                    info!("run: position source ended");
                    break;
                };
                if nav.on_fix(&fix).await? {
                    info!("run: arrived");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("run: interrupted");
                break;
            }
        }
    }

    feed.stop();
    nav.finish().await?;
    speech_task.await.context("speech worker")?;
    Ok(())
}

/// Scatter a simulated fix the way a phone GPS would.
fn jitter(fix: PositionFix, noise_m: f64) -> PositionFix {
    let mut rng = rand::thread_rng();
    let r_km = rng.gen_range(0.0..noise_m) / 1000.0;
    let p = point_ahead_of(GeoPoint::new(fix.lat, fix.lng), rng.gen_range(0.0..360.0), r_km);
    PositionFix { lat: p.lat, lng: p.lng, accuracy_m: Some(noise_m), ..fix }
}
