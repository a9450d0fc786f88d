pub mod driver;
pub mod simulator;

pub use driver::run_simulation;
pub use simulator::{MotionSimulator, SimError, SimState, SimTick};
