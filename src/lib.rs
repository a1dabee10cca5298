//! Map-anchored player positioning
//!
//! Translates between geographic coordinates and screen pixels for a game
//! drawn over a slippy map, moves the player smoothly between positions,
//! enforces the play-area and flag territory rules, and measures and corrects
//! systematic projection error.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{CalibrationParameters, CalibrationSample, GeoPoint, PixelPoint, ProjectionOrigin, EARTH_RADIUS_M};
pub use algorithms::{haversine_distance_m, CalibrationEngine, CalibrationStatus, GeoProjector};
pub use processing::{PlayerMovementState, PlayerPositionTracker, TrackerEvent};
pub use validation::{
    accuracy_percent, AccuracyStatistics, BoundaryPolicy, GeoError, GeoResult, PositionAccuracyMonitor,
    PositionTestRecord, TerritoryRegistry, ViolationKind,
};
pub use utils::{ConfigError, ConfigurationManager, GameConfig};
pub use api::{CalibrationReport, PositionSource, PositioningSession};
