pub mod heading_up;
pub mod zoom;

pub use heading_up::{CameraConfig, CameraPose, HeadingUpController, Padding};
pub use zoom::{auto_zoom_for, look_ahead, LookAhead, LOOK_AHEAD_M};
