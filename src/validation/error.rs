//! Error taxonomy for the positioning core

use crate::utils::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors raised by the positioning core. Every variant is local and
/// recoverable: the worst outcome is a rejected operation or an identity
/// calibration.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Out-of-range or non-finite coordinate, zoom, or pixel
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },
    /// Candidate position rejected by the boundary or territory rules
    BoundaryViolation {
        distance_m: f64,
        limit_m: f64,
        kind: ViolationKind,
    },
    /// Calibration sample set cannot support a fit
    DegenerateCalibration {
        sample_count: usize,
        reason: String,
    },
    /// Configuration could not be loaded or failed validation
    Config(ConfigError),
}

/// Which placement rule a candidate position broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Farther from the origin than the play radius
    OutsideBoundary,
    /// Closer to an existing flag than the territory radius
    InsideTerritory,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::OutsideBoundary => write!(f, "outside play boundary"),
            ViolationKind::InsideTerritory => write!(f, "inside existing territory"),
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidInput { field, value, reason } => {
                write!(f, "Invalid {} = {}: {}", field, value, reason)
            }
            GeoError::BoundaryViolation { distance_m, limit_m, kind } => {
                write!(f, "Position {} ({:.1}m against a {:.1}m limit)", kind, distance_m, limit_m)
            }
            GeoError::DegenerateCalibration { sample_count, reason } => {
                write!(f, "Degenerate calibration with {} samples: {}", sample_count, reason)
            }
            GeoError::Config(err) => write!(f, "Configuration error: {}", err),
        }
    }
}

impl std::error::Error for GeoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeoError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for GeoError {
    fn from(err: ConfigError) -> Self {
        GeoError::Config(err)
    }
}

impl GeoError {
    /// Configuration failures need operator action; everything else can be
    /// retried with different input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GeoError::Config(_))
    }
}

/// Result type for positioning core operations
pub type GeoResult<T> = Result<T, GeoError>;
