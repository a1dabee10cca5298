//! Calibration report generation and output formatting
//!
//! Reports summarise the accuracy monitor's statistics, grade them and attach
//! recommendations. They render as operator-facing text, JSON, or CSV rows of
//! the underlying position tests.

use crate::algorithms::calibration::CalibrationStatus;
use crate::core::CalibrationParameters;
use crate::validation::accuracy::{AccuracyStatistics, PositionTestRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean distance above which the projection itself is suspect (meters)
const MEAN_DISTANCE_WARNING_M: f64 = 20.0;
/// Spread above which samples are considered inconsistent (meters)
const STD_DEV_WARNING_M: f64 = 10.0;
/// Single error above which an outlier is reported (meters)
const MAX_DISTANCE_WARNING_M: f64 = 50.0;

/// Qualitative grade of the mean accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityLabel {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl QualityLabel {
    pub fn from_accuracy(mean_accuracy_percent: f64) -> Self {
        if mean_accuracy_percent >= 90.0 {
            QualityLabel::Excellent
        } else if mean_accuracy_percent >= 75.0 {
            QualityLabel::Good
        } else if mean_accuracy_percent >= 60.0 {
            QualityLabel::Moderate
        } else if mean_accuracy_percent >= 40.0 {
            QualityLabel::Poor
        } else {
            QualityLabel::VeryPoor
        }
    }
}

impl fmt::Display for QualityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QualityLabel::Excellent => "Excellent",
            QualityLabel::Good => "Good",
            QualityLabel::Moderate => "Moderate",
            QualityLabel::Poor => "Poor",
            QualityLabel::VeryPoor => "Very Poor",
        };
        write!(f, "{}", label)
    }
}

/// Snapshot of calibration quality for operator display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub statistics: AccuracyStatistics,
    /// Absent when no tests have been recorded
    pub quality: Option<QualityLabel>,
    pub calibration: CalibrationParameters,
    pub calibration_status: CalibrationStatus,
    pub calibration_samples: usize,
    pub recommendations: Vec<String>,
}

impl CalibrationReport {
    pub fn new(
        statistics: AccuracyStatistics,
        calibration: CalibrationParameters,
        calibration_status: CalibrationStatus,
        calibration_samples: usize,
    ) -> Self {
        let quality = (statistics.count > 0).then(|| QualityLabel::from_accuracy(statistics.mean_accuracy_percent));

        Self {
            recommendations: Self::recommendations_for(&statistics),
            statistics,
            quality,
            calibration,
            calibration_status,
            calibration_samples,
        }
    }

    /// Threshold checks on mean, spread and worst-case error
    pub fn recommendations_for(statistics: &AccuracyStatistics) -> Vec<String> {
        if statistics.count == 0 {
            return Vec::new();
        }

        let mut recommendations = Vec::new();

        if statistics.mean_distance_m > MEAN_DISTANCE_WARNING_M {
            recommendations.push(format!(
                "Average error {:.2} m exceeds {:.0} m: verify the map origin and zoom, then recalibrate",
                statistics.mean_distance_m, MEAN_DISTANCE_WARNING_M
            ));
        }

        if statistics.std_dev_distance_m > STD_DEV_WARNING_M {
            recommendations.push(format!(
                "Error spread {:.2} m exceeds {:.0} m: samples are inconsistent, collect more calibration points",
                statistics.std_dev_distance_m, STD_DEV_WARNING_M
            ));
        }

        if statistics.max_distance_m > MAX_DISTANCE_WARNING_M {
            recommendations.push(format!(
                "Worst error {:.2} m exceeds {:.0} m: check for outlier reference positions",
                statistics.max_distance_m, MAX_DISTANCE_WARNING_M
            ));
        }

        if recommendations.is_empty() {
            recommendations.push("Positioning is within expected tolerances".to_string());
        }

        recommendations
    }

    pub fn to_text(&self) -> String {
        TextFormatter::new().format_text(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        JsonFormatter::pretty().format_json(self)
    }
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// Human-readable text formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter {
    /// Single-line summary instead of the full report
    pub compact: bool,
    /// Append the fitted calibration parameters
    pub include_calibration: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }

    pub fn with_calibration(mut self) -> Self {
        self.include_calibration = true;
        self
    }

    pub fn format_text(&self, report: &CalibrationReport) -> String {
        let stats = &report.statistics;

        if self.compact {
            return match report.quality {
                Some(quality) => format!(
                    "Tests: {} | Avg: {:.2} m | Acc: {:.1}% | {}",
                    stats.count, stats.mean_distance_m, stats.mean_accuracy_percent, quality
                ),
                None => "Tests: 0 | no position tests recorded".to_string(),
            };
        }

        let mut output = String::new();
        output.push_str("=== Position Calibration Report ===\n");
        output.push_str(&format!("Total tests:        {}\n", stats.count));

        if let Some(quality) = report.quality {
            output.push_str(&format!("Average distance:   {:.2} m\n", stats.mean_distance_m));
            output.push_str(&format!("Average accuracy:   {:.1}%\n", stats.mean_accuracy_percent));
            output.push_str(&format!("Min distance:       {:.2} m\n", stats.min_distance_m));
            output.push_str(&format!("Max distance:       {:.2} m\n", stats.max_distance_m));
            output.push_str(&format!("Standard deviation: {:.2} m\n", stats.std_dev_distance_m));
            output.push_str(&format!("Quality:            {}\n", quality));
        } else {
            output.push_str("No position tests recorded\n");
        }

        if self.include_calibration {
            let params = &report.calibration;
            output.push_str("\nCalibration:\n");
            output.push_str(&format!("  Status:   {:?} ({} samples)\n", report.calibration_status, report.calibration_samples));
            output.push_str(&format!("  Scale:    {:.4} x {:.4}\n", params.scale_x, params.scale_y));
            output.push_str(&format!("  Rotation: {:.3}°\n", params.rotation_degrees));
            output.push_str(&format!("  Offset:   {:.2}, {:.2} px\n", params.offset_x, params.offset_y));
        }

        if !report.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for recommendation in &report.recommendations {
                output.push_str(&format!("  - {}\n", recommendation));
            }
        }

        output
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, report: &CalibrationReport) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        }
    }
}

/// CSV export of individual position tests
#[derive(Debug, Clone, Copy)]
pub struct CsvFormatter {
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> String {
        "timestamp_ms,pixel_x,pixel_y,calculated_lat,calculated_lon,expected_lat,expected_lon,distance_m,accuracy_percent".to_string()
    }

    pub fn format_record(&self, record: &PositionTestRecord) -> String {
        format!(
            "{},{:.2},{:.2},{:.7},{:.7},{:.7},{:.7},{:.3},{:.1}",
            record.timestamp_ms,
            record.player_pixel.x,
            record.player_pixel.y,
            record.calculated_geo.latitude,
            record.calculated_geo.longitude,
            record.expected_geo.latitude,
            record.expected_geo.longitude,
            record.distance_m,
            record.accuracy_percent
        )
    }

    pub fn format_csv<'a, I>(&self, records: I) -> String
    where
        I: IntoIterator<Item = &'a PositionTestRecord>,
    {
        let mut lines = Vec::new();
        if self.include_header {
            lines.push(self.header());
        }
        lines.extend(records.into_iter().map(|record| self.format_record(record)));
        lines.join("\n")
    }
}
