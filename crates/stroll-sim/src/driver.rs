use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::debug;

use crate::simulator::{MotionSimulator, SimTick};

/// Drive `sim` from a fixed-rate timer until the route ends, the simulator is
/// stopped, or the receiver goes away. Elapsed time is measured per tick, so a
/// late timer moves the position further instead of slowing the walk down.
pub async fn run_simulation(mut sim: MotionSimulator, tick: Duration, tx: mpsc::Sender<SimTick>) {
    sim.start();
    let mut iv = interval(tick);
    iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        iv.tick().await;
        let now = Instant::now();
        let elapsed = now - last;
        last = now;

        let Some(t) = sim.advance(elapsed) else { break; };
        if tx.send(t).await.is_err() {
            debug!("sim: receiver closed");
            break;
        }
        if t.finished {
            break;
        }
    }
}
