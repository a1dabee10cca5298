//! Empirical calibration of the projection from observed pixel/geo pairs
//!
//! Each sample pairs the pixel where the player was displayed with the
//! geographic position it should have represented. The engine fits a
//! similarity transform (rotation, uniform scale, translation) that maps the
//! raw projection of each expected position onto its observed pixel, using
//! the closed-form 2D Procrustes least-squares solution. The result is
//! deterministic for a given sample set.

use crate::algorithms::projection::GeoProjector;
use crate::core::{CalibrationParameters, CalibrationSample, GeoPoint, PixelPoint, ProjectionOrigin};
use crate::validation::error::{GeoError, GeoResult};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum summed squared spread (px²) for a rotation/scale fit
const MIN_SAMPLE_SPREAD_PX2: f64 = 1e-9;

/// Quality of the currently fitted parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationStatus {
    /// No samples; identity transform
    Uncalibrated,
    /// One sample; translation only
    TranslationOnly,
    /// Full similarity fit over two or more samples
    Fitted,
    /// Samples could not support a fit; identity plus mean offset
    Degenerate,
}

/// Collects calibration samples and keeps the fitted parameters current
#[derive(Debug, Clone)]
pub struct CalibrationEngine {
    origin: ProjectionOrigin,
    samples: Vec<CalibrationSample>,
    parameters: CalibrationParameters,
    status: CalibrationStatus,
}

impl CalibrationEngine {
    pub fn new(origin: ProjectionOrigin) -> Self {
        Self {
            origin,
            samples: Vec::new(),
            parameters: CalibrationParameters::identity(),
            status: CalibrationStatus::Uncalibrated,
        }
    }

    /// Record a correspondence and refit
    pub fn add_sample(&mut self, pixel: PixelPoint, expected_geo: GeoPoint) {
        self.samples.push(CalibrationSample { pixel, expected_geo });
        self.refit();
    }

    /// Remove one sample by insertion index and refit
    pub fn remove_sample(&mut self, index: usize) -> Option<CalibrationSample> {
        if index >= self.samples.len() {
            return None;
        }
        let removed = self.samples.remove(index);
        self.refit();
        Some(removed)
    }

    /// Drop every sample; parameters return to identity
    pub fn remove_all_samples(&mut self) {
        self.samples.clear();
        self.parameters = CalibrationParameters::identity();
        self.status = CalibrationStatus::Uncalibrated;
        debug!("Calibration samples cleared");
    }

    /// Re-anchor the engine on a new projection frame and refit.
    ///
    /// Stored pixels were observed in the previous frame. Each one is carried
    /// over through the uncalibrated geographic position it displayed, so the
    /// fitted correction keeps describing the same map misalignment after a
    /// zoom or pan. Samples that cannot be carried over are dropped.
    pub fn set_origin(&mut self, origin: ProjectionOrigin) {
        let previous = std::mem::replace(&mut self.origin, origin);
        let identity = CalibrationParameters::identity();

        self.samples.retain_mut(|sample| {
            let carried = GeoProjector::to_geo(&sample.pixel, &previous, &identity)
                .and_then(|apparent| GeoProjector::to_pixel(&apparent, &origin, &identity));
            match carried {
                Ok(pixel) => {
                    sample.pixel = pixel;
                    true
                }
                Err(e) => {
                    warn!("Dropping calibration sample at {}: {}", sample.pixel, e);
                    false
                }
            }
        });

        self.refit();
    }

    pub fn origin(&self) -> &ProjectionOrigin {
        &self.origin
    }

    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Parameters from the most recent fit
    pub fn parameters(&self) -> CalibrationParameters {
        self.parameters
    }

    pub fn status(&self) -> CalibrationStatus {
        self.status
    }

    pub fn is_degenerate(&self) -> bool {
        self.status == CalibrationStatus::Degenerate
    }

    /// Compute parameters for the current sample set
    pub fn fit(&self) -> CalibrationParameters {
        self.compute().0
    }

    /// Like [`CalibrationEngine::fit`] but refuses fallbacks
    pub fn fit_strict(&self) -> GeoResult<CalibrationParameters> {
        if self.samples.len() < 2 {
            return Err(GeoError::DegenerateCalibration {
                sample_count: self.samples.len(),
                reason: "at least two samples are required for a rotation and scale fit".to_string(),
            });
        }

        match self.compute() {
            (_, CalibrationStatus::Degenerate) => Err(GeoError::DegenerateCalibration {
                sample_count: self.samples.len(),
                reason: "samples have no spread".to_string(),
            }),
            (params, _) => Ok(params),
        }
    }

    /// Pixel distance between each sample's observed pixel and where the
    /// current parameters place its expected position
    pub fn residuals(&self) -> GeoResult<Vec<f64>> {
        self.samples
            .iter()
            .map(|sample| {
                GeoProjector::to_pixel(&sample.expected_geo, &self.origin, &self.parameters)
                    .map(|predicted| predicted.distance_to(&sample.pixel))
            })
            .collect()
    }

    /// Root-mean-square residual in pixels, zero with no samples
    pub fn rms_error_px(&self) -> GeoResult<f64> {
        let residuals = self.residuals()?;
        if residuals.is_empty() {
            return Ok(0.0);
        }
        Ok((residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64).sqrt())
    }

    fn refit(&mut self) {
        let (parameters, status) = self.compute();
        self.parameters = parameters;
        self.status = status;

        debug!(
            samples = self.samples.len(),
            ?status,
            scale = parameters.scale_x,
            rotation_deg = parameters.rotation_degrees,
            offset_x = parameters.offset_x,
            offset_y = parameters.offset_y,
            "Calibration refitted"
        );
    }

    /// Closed-form similarity fit from raw projections onto observed pixels
    fn compute(&self) -> (CalibrationParameters, CalibrationStatus) {
        if self.samples.is_empty() {
            return (CalibrationParameters::identity(), CalibrationStatus::Uncalibrated);
        }

        let mut sources = Vec::with_capacity(self.samples.len());
        let mut targets = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            match GeoProjector::project_raw(&sample.expected_geo, &self.origin) {
                Ok(raw) => sources.push(Vector2::new(raw.x, raw.y)),
                Err(e) => {
                    warn!("Calibration sample cannot be projected: {}", e);
                    return (CalibrationParameters::identity(), CalibrationStatus::Degenerate);
                }
            }
            targets.push(Vector2::new(
                sample.pixel.x - self.origin.screen_center.x,
                sample.pixel.y - self.origin.screen_center.y,
            ));
        }

        let n = sources.len() as f64;
        let source_mean = sources.iter().fold(Vector2::<f64>::zeros(), |acc, v| acc + v) / n;
        let target_mean = targets.iter().fold(Vector2::<f64>::zeros(), |acc, v| acc + v) / n;
        let mean_offset = target_mean - source_mean;

        if sources.len() == 1 {
            return (
                CalibrationParameters::translation(mean_offset.x, mean_offset.y),
                CalibrationStatus::TranslationOnly,
            );
        }

        let mut spread = 0.0;
        let mut dot = 0.0;
        let mut cross = 0.0;
        for (source, target) in sources.iter().zip(&targets) {
            let a = source - source_mean;
            let b = target - target_mean;
            spread += a.norm_squared();
            dot += a.dot(&b);
            cross += a.x * b.y - a.y * b.x;
        }

        let magnitude = (dot * dot + cross * cross).sqrt();
        if spread < MIN_SAMPLE_SPREAD_PX2 || magnitude < MIN_SAMPLE_SPREAD_PX2 {
            warn!(
                samples = self.samples.len(),
                "Calibration samples are coincident; falling back to mean offset"
            );
            return (
                CalibrationParameters::translation(mean_offset.x, mean_offset.y),
                CalibrationStatus::Degenerate,
            );
        }

        let angle = cross.atan2(dot);
        let scale = magnitude / spread;
        let translation = target_mean - Rotation2::new(angle) * source_mean * scale;

        let parameters = CalibrationParameters {
            scale_x: scale,
            scale_y: scale,
            offset_x: translation.x,
            offset_y: translation.y,
            rotation_degrees: angle.to_degrees(),
        };

        if !parameters.is_finite() {
            warn!("Calibration fit produced non-finite parameters; using mean offset");
            return (
                CalibrationParameters::translation(mean_offset.x, mean_offset.y),
                CalibrationStatus::Degenerate,
            );
        }

        (parameters, CalibrationStatus::Fitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_ZOOM;
    use proptest::prelude::*;

    fn origin() -> ProjectionOrigin {
        let center = GeoPoint::new(51.505, -0.09).unwrap();
        ProjectionOrigin::from_zoom(center, DEFAULT_ZOOM, PixelPoint::new(400.0, 300.0)).unwrap()
    }

    fn geo(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn observed(geo: &GeoPoint, origin: &ProjectionOrigin, truth: &CalibrationParameters) -> PixelPoint {
        GeoProjector::to_pixel(geo, origin, truth).unwrap()
    }

    #[test]
    fn test_no_samples_is_identity() {
        let engine = CalibrationEngine::new(origin());
        assert!(engine.fit().is_identity());
        assert_eq!(engine.status(), CalibrationStatus::Uncalibrated);
        assert_eq!(engine.rms_error_px().unwrap(), 0.0);
    }

    #[test]
    fn test_single_sample_is_translation() {
        let origin = origin();
        let mut engine = CalibrationEngine::new(origin);
        let point = geo(51.506, -0.089);

        let raw = GeoProjector::to_pixel(&point, &origin, &CalibrationParameters::identity()).unwrap();
        engine.add_sample(PixelPoint::new(raw.x + 8.0, raw.y - 4.0), point);

        let params = engine.parameters();
        assert_eq!(engine.status(), CalibrationStatus::TranslationOnly);
        assert_eq!(params.scale_x, 1.0);
        assert_eq!(params.rotation_degrees, 0.0);
        assert!((params.offset_x - 8.0).abs() < 1e-9);
        assert!((params.offset_y + 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_recovers_known_similarity_transform() {
        let origin = origin();
        let truth = CalibrationParameters {
            scale_x: 1.05,
            scale_y: 1.05,
            offset_x: -6.0,
            offset_y: 11.0,
            rotation_degrees: 3.0,
        };

        let mut engine = CalibrationEngine::new(origin);
        for point in [geo(51.506, -0.091), geo(51.504, -0.088), geo(51.5055, -0.0895), geo(51.503, -0.092)] {
            engine.add_sample(observed(&point, &origin, &truth), point);
        }

        let params = engine.parameters();
        assert_eq!(engine.status(), CalibrationStatus::Fitted);
        assert!((params.scale_x - truth.scale_x).abs() < 1e-9);
        assert!((params.scale_y - truth.scale_y).abs() < 1e-9);
        assert!((params.rotation_degrees - truth.rotation_degrees).abs() < 1e-7);
        assert!((params.offset_x - truth.offset_x).abs() < 1e-6);
        assert!((params.offset_y - truth.offset_y).abs() < 1e-6);
        assert!(engine.rms_error_px().unwrap() < 1e-6);

        // The fitted transform maps observed pixels back onto expected positions
        let sample = engine.samples()[0];
        let back = GeoProjector::to_geo(&sample.pixel, &origin, &params).unwrap();
        assert!((back.latitude - sample.expected_geo.latitude).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_samples_fall_back_to_mean_offset() {
        let origin = origin();
        let mut engine = CalibrationEngine::new(origin);
        let point = geo(51.506, -0.089);
        let raw = GeoProjector::to_pixel(&point, &origin, &CalibrationParameters::identity()).unwrap();

        engine.add_sample(PixelPoint::new(raw.x + 2.0, raw.y), point);
        engine.add_sample(PixelPoint::new(raw.x + 4.0, raw.y), point);

        let params = engine.parameters();
        assert!(engine.is_degenerate());
        assert!(params.is_finite());
        assert_eq!(params.scale_x, 1.0);
        assert!((params.offset_x - 3.0).abs() < 1e-9);
        assert!(engine.fit_strict().is_err());
    }

    #[test]
    fn test_remove_samples() {
        let origin = origin();
        let mut engine = CalibrationEngine::new(origin);
        engine.add_sample(PixelPoint::new(410.0, 300.0), geo(51.505, -0.09));
        engine.add_sample(PixelPoint::new(500.0, 200.0), geo(51.506, -0.089));

        assert!(engine.remove_sample(5).is_none());
        assert!(engine.remove_sample(1).is_some());
        assert_eq!(engine.status(), CalibrationStatus::TranslationOnly);

        engine.remove_all_samples();
        assert_eq!(engine.sample_count(), 0);
        assert!(engine.parameters().is_identity());
        assert!(engine.fit_strict().is_err());
    }

    #[test]
    fn test_zoom_change_keeps_fitted_correction() {
        let origin = origin();
        let truth = CalibrationParameters::translation(3.0, -2.0);
        let mut engine = CalibrationEngine::new(origin);
        for point in [geo(51.506, -0.091), geo(51.504, -0.088), geo(51.5055, -0.0895)] {
            engine.add_sample(observed(&point, &origin, &truth), point);
        }

        let zoomed = ProjectionOrigin::from_zoom(origin.center, DEFAULT_ZOOM + 1.0, origin.screen_center).unwrap();
        engine.set_origin(zoomed);

        // Same ground misalignment, now twice as many pixels
        let params = engine.parameters();
        assert_eq!(engine.sample_count(), 3);
        assert_eq!(engine.status(), CalibrationStatus::Fitted);
        assert!((params.scale_x - 1.0).abs() < 1e-9);
        assert!(params.rotation_degrees.abs() < 1e-7);
        assert!((params.offset_x - 6.0).abs() < 1e-6);
        assert!((params.offset_y + 4.0).abs() < 1e-6);
        assert!(engine.rms_error_px().unwrap() < 1e-6);
    }

    #[test]
    fn test_origin_near_pole_drops_samples() {
        let mut engine = CalibrationEngine::new(origin());
        engine.add_sample(PixelPoint::new(410.0, 300.0), geo(51.505, -0.09));
        engine.add_sample(PixelPoint::new(500.0, 200.0), geo(51.506, -0.089));

        engine.set_origin(ProjectionOrigin::new(geo(89.99, 0.0), 1.0));
        assert_eq!(engine.sample_count(), 0);
        assert_eq!(engine.status(), CalibrationStatus::Uncalibrated);
    }

    #[test]
    fn test_residuals_report_unprojectable_samples() {
        let mut engine = CalibrationEngine::new(ProjectionOrigin::new(geo(89.99, 0.0), 1.0));
        engine.add_sample(PixelPoint::new(10.0, 0.0), geo(89.99, 0.0));

        assert!(engine.is_degenerate());
        assert!(engine.residuals().is_err());
        assert!(engine.rms_error_px().is_err());
    }

    proptest! {
        #[test]
        fn prop_fit_is_deterministic(
            offsets in proptest::collection::vec((-0.003f64..0.003, -0.003f64..0.003, -20.0f64..20.0, -20.0f64..20.0), 0..8)
        ) {
            let origin = origin();
            let mut engine = CalibrationEngine::new(origin);
            for (dlat, dlon, dx, dy) in offsets {
                let point = geo(51.505 + dlat, -0.09 + dlon);
                let raw = GeoProjector::to_pixel(&point, &origin, &CalibrationParameters::identity()).unwrap();
                engine.add_sample(PixelPoint::new(raw.x + dx, raw.y + dy), point);
            }

            let first = engine.fit();
            let second = engine.fit();
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, engine.parameters());
            prop_assert!(first.is_finite());
        }
    }
}
