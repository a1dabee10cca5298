//! Geographic to pixel projection with an affine calibration stage
//!
//! Positions are projected with an equirectangular approximation centered on
//! the projection origin, which is accurate well below a pixel over the play
//! radius. The raw projected point is then corrected by the calibration
//! transform (rotate, then scale, then translate) and finally shifted onto
//! the container's screen center. Pixel y grows southward.

use crate::core::{CalibrationParameters, GeoPoint, PixelPoint, ProjectionOrigin, METERS_PER_DEGREE, CALIBRATION_EPSILON};
use crate::validation::error::{GeoError, GeoResult};
use nalgebra::{Rotation2, Vector2};

/// Below this cosine the longitude scale is unusable (within ~0.06 degrees of a pole)
const MIN_LONGITUDE_SCALE: f64 = 1e-3;

/// Stateless converter between geographic and pixel coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoProjector;

impl GeoProjector {
    /// Project a geographic point to a container pixel
    pub fn to_pixel(
        geo: &GeoPoint,
        origin: &ProjectionOrigin,
        calibration: &CalibrationParameters,
    ) -> GeoResult<PixelPoint> {
        geo.validate()?;
        let raw = Self::project_raw(geo, origin)?;
        let corrected = Self::apply_calibration(raw, calibration);

        Ok(PixelPoint::new(
            corrected.x + origin.screen_center.x,
            corrected.y + origin.screen_center.y,
        ))
    }

    /// Exact inverse of [`GeoProjector::to_pixel`]
    pub fn to_geo(
        pixel: &PixelPoint,
        origin: &ProjectionOrigin,
        calibration: &CalibrationParameters,
    ) -> GeoResult<GeoPoint> {
        if !pixel.is_finite() {
            return Err(GeoError::InvalidInput {
                field: "pixel".to_string(),
                value: pixel.to_string(),
                reason: "pixel coordinates must be finite".to_string(),
            });
        }

        let relative = PixelPoint::new(pixel.x - origin.screen_center.x, pixel.y - origin.screen_center.y);
        let raw = Self::remove_calibration(relative, calibration)?;
        Self::unproject_raw(raw, origin)
    }

    /// Equirectangular projection relative to the origin, no calibration
    pub fn project_raw(geo: &GeoPoint, origin: &ProjectionOrigin) -> GeoResult<PixelPoint> {
        let (mpp, lon_scale) = Self::frame_scales(origin)?;

        let east_m = (geo.longitude - origin.center.longitude) * METERS_PER_DEGREE * lon_scale;
        let north_m = (geo.latitude - origin.center.latitude) * METERS_PER_DEGREE;

        Ok(PixelPoint::new(east_m / mpp, -north_m / mpp))
    }

    /// Inverse of [`GeoProjector::project_raw`]
    pub fn unproject_raw(raw: PixelPoint, origin: &ProjectionOrigin) -> GeoResult<GeoPoint> {
        let (mpp, lon_scale) = Self::frame_scales(origin)?;

        let east_m = raw.x * mpp;
        let north_m = -raw.y * mpp;

        let latitude = origin.center.latitude + north_m / METERS_PER_DEGREE;
        let longitude = origin.center.longitude + east_m / (METERS_PER_DEGREE * lon_scale);

        Ok(GeoPoint::clamped(latitude, longitude))
    }

    /// Rotate, scale, then translate a raw projected point
    pub fn apply_calibration(raw: PixelPoint, calibration: &CalibrationParameters) -> PixelPoint {
        let rotation = Rotation2::new(calibration.rotation_degrees.to_radians());
        let rotated = rotation * Vector2::new(raw.x, raw.y);

        PixelPoint::new(
            rotated.x * calibration.scale_x + calibration.offset_x,
            rotated.y * calibration.scale_y + calibration.offset_y,
        )
    }

    /// Undo [`GeoProjector::apply_calibration`]
    pub fn remove_calibration(corrected: PixelPoint, calibration: &CalibrationParameters) -> GeoResult<PixelPoint> {
        if calibration.scale_x.abs() < CALIBRATION_EPSILON
            || calibration.scale_y.abs() < CALIBRATION_EPSILON
            || !calibration.is_finite()
        {
            return Err(GeoError::InvalidInput {
                field: "calibration".to_string(),
                value: format!("{:?}", calibration),
                reason: "calibration must be finite with non-zero scale".to_string(),
            });
        }

        let unscaled = Vector2::new(
            (corrected.x - calibration.offset_x) / calibration.scale_x,
            (corrected.y - calibration.offset_y) / calibration.scale_y,
        );
        let rotation = Rotation2::new(calibration.rotation_degrees.to_radians());
        let raw = rotation.inverse() * unscaled;

        Ok(PixelPoint::new(raw.x, raw.y))
    }

    /// Ground distance between two pixels, ignoring calibration
    pub fn meters_between_pixels(a: &PixelPoint, b: &PixelPoint, origin: &ProjectionOrigin) -> f64 {
        a.distance_to(b) * origin.meters_per_pixel
    }

    fn frame_scales(origin: &ProjectionOrigin) -> GeoResult<(f64, f64)> {
        let mpp = origin.meters_per_pixel;
        if !mpp.is_finite() || mpp <= 0.0 {
            return Err(GeoError::InvalidInput {
                field: "meters_per_pixel".to_string(),
                value: mpp.to_string(),
                reason: "pixel scale must be finite and positive".to_string(),
            });
        }

        let lon_scale = origin.center.lat_rad().cos();
        if lon_scale < MIN_LONGITUDE_SCALE {
            return Err(GeoError::InvalidInput {
                field: "origin.latitude".to_string(),
                value: origin.center.latitude.to_string(),
                reason: "projection origin too close to a pole".to_string(),
            });
        }

        Ok((mpp, lon_scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DEFAULT_ZOOM, METERS_PER_DEGREE};
    use proptest::prelude::*;

    fn london_origin() -> ProjectionOrigin {
        let center = GeoPoint::new(51.505, -0.09).unwrap();
        ProjectionOrigin::from_zoom(center, DEFAULT_ZOOM, PixelPoint::new(400.0, 300.0)).unwrap()
    }

    #[test]
    fn test_origin_maps_to_screen_center() {
        let origin = london_origin();
        let pixel = GeoProjector::to_pixel(&origin.center, &origin, &CalibrationParameters::identity()).unwrap();
        assert!((pixel.x - 400.0).abs() < 1e-9);
        assert!((pixel.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let origin = london_origin();
        let identity = CalibrationParameters::identity();

        let north = GeoPoint::new(51.506, -0.09).unwrap();
        let east = GeoPoint::new(51.505, -0.089).unwrap();

        let north_px = GeoProjector::to_pixel(&north, &origin, &identity).unwrap();
        let east_px = GeoProjector::to_pixel(&east, &origin, &identity).unwrap();

        assert!(north_px.y < 300.0);
        assert!((north_px.x - 400.0).abs() < 1e-9);
        assert!(east_px.x > 400.0);

        // 0.001 degrees of latitude in pixels
        let expected = 0.001 * METERS_PER_DEGREE / origin.meters_per_pixel;
        assert!(((300.0 - north_px.y) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_calibration_is_applied_and_inverted() {
        let origin = london_origin();
        let calibration = CalibrationParameters {
            scale_x: 1.1,
            scale_y: 0.9,
            offset_x: 12.0,
            offset_y: -7.5,
            rotation_degrees: 15.0,
        };
        let geo = GeoPoint::new(51.5072, -0.0871).unwrap();

        let pixel = GeoProjector::to_pixel(&geo, &origin, &calibration).unwrap();
        let plain = GeoProjector::to_pixel(&geo, &origin, &CalibrationParameters::identity()).unwrap();
        assert!(pixel.distance_to(&plain) > 1.0);

        let back = GeoProjector::to_geo(&pixel, &origin, &calibration).unwrap();
        assert!((back.latitude - geo.latitude).abs() < 1e-9);
        assert!((back.longitude - geo.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_pure_translation_offsets_pixels() {
        let origin = london_origin();
        let shifted = CalibrationParameters::translation(5.0, -3.0);
        let pixel = GeoProjector::to_pixel(&origin.center, &origin, &shifted).unwrap();
        assert!((pixel.x - 405.0).abs() < 1e-9);
        assert!((pixel.y - 297.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        let origin = london_origin();
        let identity = CalibrationParameters::identity();

        let bad_pixel = PixelPoint::new(f64::NAN, 0.0);
        assert!(GeoProjector::to_geo(&bad_pixel, &origin, &identity).is_err());

        let bad_geo = GeoPoint { latitude: 120.0, longitude: 0.0 };
        assert!(GeoProjector::to_pixel(&bad_geo, &origin, &identity).is_err());

        let flat = CalibrationParameters { scale_x: 0.0, ..identity };
        assert!(GeoProjector::to_geo(&PixelPoint::new(1.0, 1.0), &origin, &flat).is_err());

        let polar = ProjectionOrigin::new(GeoPoint::new(90.0, 0.0).unwrap(), 1.0);
        assert!(GeoProjector::project_raw(&polar.center, &polar).is_err());
    }

    #[test]
    fn test_meters_between_pixels() {
        let origin = ProjectionOrigin::new(GeoPoint::new(0.0, 0.0).unwrap(), 2.0);
        let d = GeoProjector::meters_between_pixels(&PixelPoint::new(0.0, 0.0), &PixelPoint::new(3.0, 4.0), &origin);
        assert!((d - 10.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_round_trip_identity(
            center_lat in -80.0f64..80.0,
            center_lon in -170.0f64..170.0,
            dlat in -0.01f64..0.01,
            dlon in -0.01f64..0.01,
            zoom in 10.0f64..20.0,
        ) {
            let center = GeoPoint::new(center_lat, center_lon).unwrap();
            let origin = ProjectionOrigin::from_zoom(center, zoom, PixelPoint::new(400.0, 300.0)).unwrap();
            let geo = GeoPoint::new(center_lat + dlat, center_lon + dlon).unwrap();
            let identity = CalibrationParameters::identity();

            let pixel = GeoProjector::to_pixel(&geo, &origin, &identity).unwrap();
            let back = GeoProjector::to_geo(&pixel, &origin, &identity).unwrap();

            prop_assert!((back.latitude - geo.latitude).abs() < 1e-9);
            prop_assert!((back.longitude - geo.longitude).abs() < 1e-9);
        }
    }
}
