use crate::algorithms::geodesy::haversine_distance_m;
use crate::core::{GeoPoint, PixelPoint, POSITION_HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Accuracy monitoring for the displayed player position
#[derive(Debug, Clone)]
pub struct PositionAccuracyMonitor {
    /// Most recent test records, oldest first
    history: VecDeque<PositionTestRecord>,
    /// Maximum history size
    max_history_size: usize,
}

/// One comparison of the calculated position against a reference position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionTestRecord {
    /// Host timestamp of the test (milliseconds)
    pub timestamp_ms: u64,
    /// Pixel where the player sprite was displayed
    pub player_pixel: PixelPoint,
    /// Geographic position derived from the sprite pixel
    pub calculated_geo: GeoPoint,
    /// Reference position supplied by the host
    pub expected_geo: GeoPoint,
    /// Great-circle error (meters)
    pub distance_m: f64,
    /// Score derived from `distance_m` (0-100)
    pub accuracy_percent: f64,
}

/// Aggregate statistics over the retained history
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccuracyStatistics {
    /// Number of records in the history
    pub count: usize,
    /// Mean position error (meters)
    pub mean_distance_m: f64,
    /// Mean accuracy score (percent)
    pub mean_accuracy_percent: f64,
    /// Maximum observed error (meters)
    pub max_distance_m: f64,
    /// Minimum observed error (meters)
    pub min_distance_m: f64,
    /// Population standard deviation of the error (meters)
    pub std_dev_distance_m: f64,
}

/// Score a position error. 100% up to 1 m, falling linearly to 90% at 10 m,
/// to 50% at 100 m, then one point per 10 m beyond that, floored at 0%.
pub fn accuracy_percent(distance_m: f64) -> f64 {
    if distance_m.is_nan() {
        return 0.0;
    }

    if distance_m <= 1.0 {
        100.0
    } else if distance_m <= 10.0 {
        100.0 - 10.0 * (distance_m - 1.0) / 9.0
    } else if distance_m <= 100.0 {
        90.0 - 40.0 * (distance_m - 10.0) / 90.0
    } else {
        (50.0 - (distance_m - 100.0) / 10.0).max(0.0)
    }
}

impl Default for PositionAccuracyMonitor {
    fn default() -> Self {
        Self::with_capacity(POSITION_HISTORY_CAPACITY)
    }
}

impl PositionAccuracyMonitor {
    /// Create a monitor with the default history size
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a monitor retaining at most `capacity` records (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let max_history_size = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(max_history_size),
            max_history_size,
        }
    }

    /// Score a calculated position against the expected one and keep the record
    pub fn record_sample(
        &mut self,
        timestamp_ms: u64,
        player_pixel: PixelPoint,
        calculated_geo: GeoPoint,
        expected_geo: GeoPoint,
    ) -> PositionTestRecord {
        let distance_m = haversine_distance_m(&calculated_geo, &expected_geo);
        let record = PositionTestRecord {
            timestamp_ms,
            player_pixel,
            calculated_geo,
            expected_geo,
            distance_m,
            accuracy_percent: accuracy_percent(distance_m),
        };

        self.history.push_back(record);
        while self.history.len() > self.max_history_size {
            self.history.pop_front();
        }

        debug!(
            distance_m = record.distance_m,
            accuracy = record.accuracy_percent,
            "Position test recorded"
        );

        record
    }

    /// Aggregate statistics; all zero when nothing has been recorded
    pub fn statistics(&self) -> AccuracyStatistics {
        if self.history.is_empty() {
            return AccuracyStatistics::default();
        }

        let n = self.history.len() as f64;

        let mean_distance_m = self.history.iter().map(|r| r.distance_m).sum::<f64>() / n;
        let mean_accuracy_percent = self.history.iter().map(|r| r.accuracy_percent).sum::<f64>() / n;

        let variance = self
            .history
            .iter()
            .map(|r| (r.distance_m - mean_distance_m).powi(2))
            .sum::<f64>()
            / n;

        let max_distance_m = self.history.iter().map(|r| r.distance_m).fold(0.0, f64::max);
        let min_distance_m = self
            .history
            .iter()
            .map(|r| r.distance_m)
            .fold(f64::INFINITY, f64::min);

        AccuracyStatistics {
            count: self.history.len(),
            mean_distance_m,
            mean_accuracy_percent,
            max_distance_m,
            min_distance_m,
            std_dev_distance_m: variance.sqrt(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &PositionTestRecord> {
        self.history.iter()
    }

    pub fn latest(&self) -> Option<&PositionTestRecord> {
        self.history.back()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_history_size
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geo(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_accuracy_breakpoints() {
        assert_eq!(accuracy_percent(0.0), 100.0);
        assert_eq!(accuracy_percent(0.5), 100.0);
        assert_eq!(accuracy_percent(1.0), 100.0);
        assert!((accuracy_percent(10.0) - 90.0).abs() < 1e-12);
        assert!((accuracy_percent(55.0) - 70.0).abs() < 1e-12);
        assert!((accuracy_percent(100.0) - 50.0).abs() < 1e-12);
        assert!((accuracy_percent(150.0) - 45.0).abs() < 1e-12);
        assert_eq!(accuracy_percent(600.0), 0.0);
        assert_eq!(accuracy_percent(5000.0), 0.0);
    }

    #[test]
    fn test_record_sample_scores_distance() {
        let mut monitor = PositionAccuracyMonitor::new();
        let expected = geo(51.505, -0.09);
        let calculated = geo(51.5051, -0.09);

        let record = monitor.record_sample(1000, PixelPoint::new(400.0, 300.0), calculated, expected);

        assert!((record.distance_m - 11.12).abs() < 0.05);
        assert!((record.accuracy_percent - accuracy_percent(record.distance_m)).abs() < 1e-12);
        assert_eq!(monitor.latest(), Some(&record));
    }

    #[test]
    fn test_statistics_calculation() {
        let mut monitor = PositionAccuracyMonitor::new();
        let expected = geo(0.0, 0.0);

        // Errors of roughly 1.11 m, 2.22 m and 3.34 m along the meridian
        for i in 1..=3 {
            let calculated = geo(0.00001 * i as f64, 0.0);
            monitor.record_sample(i, PixelPoint::default(), calculated, expected);
        }

        let stats = monitor.statistics();
        let step = haversine_distance_m(&geo(0.00001, 0.0), &expected);

        assert_eq!(stats.count, 3);
        assert!((stats.mean_distance_m - 2.0 * step).abs() < 1e-6);
        assert!((stats.min_distance_m - step).abs() < 1e-6);
        assert!((stats.max_distance_m - 3.0 * step).abs() < 1e-6);
        assert!((stats.std_dev_distance_m - step * (2.0f64 / 3.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_empty_statistics_are_zero() {
        let monitor = PositionAccuracyMonitor::new();
        let stats = monitor.statistics();
        assert_eq!(stats, AccuracyStatistics::default());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min_distance_m, 0.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut monitor = PositionAccuracyMonitor::new();
        let expected = geo(0.0, 0.0);

        for i in 0..150u64 {
            monitor.record_sample(i, PixelPoint::default(), expected, expected);
        }

        assert_eq!(monitor.statistics().count, 100);
        let timestamps: Vec<u64> = monitor.records().map(|r| r.timestamp_ms).collect();
        assert_eq!(timestamps.first(), Some(&50));
        assert_eq!(timestamps.last(), Some(&149));

        monitor.clear();
        assert!(monitor.is_empty());
    }

    #[test]
    fn test_custom_capacity() {
        let mut monitor = PositionAccuracyMonitor::with_capacity(0);
        assert_eq!(monitor.capacity(), 1);

        let point = geo(1.0, 1.0);
        monitor.record_sample(1, PixelPoint::default(), point, point);
        monitor.record_sample(2, PixelPoint::default(), point, point);
        assert_eq!(monitor.len(), 1);
        assert_eq!(monitor.latest().map(|r| r.timestamp_ms), Some(2));
    }

    proptest! {
        #[test]
        fn prop_accuracy_is_monotonic(a in 0.0f64..2000.0, b in 0.0f64..2000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(accuracy_percent(near) >= accuracy_percent(far));
        }
    }
}
