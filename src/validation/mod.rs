//! Placement rules, accuracy monitoring and error types

pub mod accuracy;
pub mod boundary;
pub mod error;

pub use accuracy::{accuracy_percent, AccuracyStatistics, PositionAccuracyMonitor, PositionTestRecord};
pub use boundary::{BoundaryPolicy, TerritoryRegistry};
pub use error::{GeoError, GeoResult, ViolationKind};
