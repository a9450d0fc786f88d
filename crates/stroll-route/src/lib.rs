pub mod maneuver;
pub mod mode;
pub mod progress;
pub mod sequencer;
pub mod stops;
pub mod waypoint;

pub use maneuver::{ManeuverKind, ManeuverStep, Modifier, RouteError, RoutePlan, Side};
pub use mode::TravelMode;
pub use progress::{locate_by_location, locate_by_progress, remaining_km, ManeuverTarget};
pub use sequencer::{interleave, navigation_targets, reverse_cycle, rotate_cycle, Anchor};
pub use stops::StopTracker;
pub use waypoint::{Identified, OrderedStop, Waypoint, WaypointKind};
