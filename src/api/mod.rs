//! Host-facing session driver and report formatting
//!
//! The rendering layer talks to the core through [`PositioningSession`] and
//! the [`PositionSource`] capability, and displays [`CalibrationReport`]s.

pub mod formatting;
pub mod session;

pub use formatting::{CalibrationReport, CsvFormatter, JsonFormatter, QualityLabel, TextFormatter};
pub use session::{PositionSource, PositioningSession};
