pub mod geometry;
pub mod path;
pub mod point;

pub use geometry::{
    approx_displacement_m, bearing_degrees, distance_km, distance_to_segment_km, normalize_bearing,
    point_ahead_of, progress_along_path, project_onto_segment, EARTH_RADIUS_KM,
};
pub use path::Path;
pub use point::{is_valid_coord, GeoPoint};
