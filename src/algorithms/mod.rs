//! Core positioning algorithms

pub mod geodesy;
pub mod projection;
pub mod calibration;

pub use geodesy::{haversine_distance_m, initial_bearing_deg, lerp};
pub use projection::GeoProjector;
pub use calibration::{CalibrationEngine, CalibrationStatus};
