//! Physical constants and gameplay parameters

/// Mean Earth radius used for great-circle distances (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the mean-radius sphere
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Web-Mercator ground resolution at zoom 0 on the equator (meters per pixel)
pub const WEB_MERCATOR_RESOLUTION_M: f64 = 156_543.033_92;

/// Movement duration per meter of travel (milliseconds)
pub const MOVE_MS_PER_METER: f64 = 2.0;

/// Upper bound on a single movement's duration (milliseconds)
pub const MAX_MOVE_DURATION_MS: f64 = 1000.0;

/// Number of position test records retained by the accuracy monitor
pub const POSITION_HISTORY_CAPACITY: usize = 100;

/// Default world origin latitude (degrees)
pub const DEFAULT_ORIGIN_LAT: f64 = 51.505;

/// Default world origin longitude (degrees)
pub const DEFAULT_ORIGIN_LON: f64 = -0.09;

/// Default play radius around the origin (meters)
pub const DEFAULT_BOUNDARY_RADIUS_M: f64 = 600.0;

/// Default exclusion radius around a placed flag (meters)
pub const DEFAULT_TERRITORY_RADIUS_M: f64 = 50.0;

/// Default map zoom level
pub const DEFAULT_ZOOM: f64 = 17.0;

/// Below this magnitude a calibration scale or variance is treated as zero
pub const CALIBRATION_EPSILON: f64 = 1e-12;
