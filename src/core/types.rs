//! Core data types for the positioning core

use crate::core::constants::{WEB_MERCATOR_RESOLUTION_M, DEFAULT_ORIGIN_LAT, DEFAULT_ORIGIN_LON};
use crate::validation::error::{GeoError, GeoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated geographic point
    pub fn new(latitude: f64, longitude: f64) -> GeoResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidInput {
                field: "latitude".to_string(),
                value: latitude.to_string(),
                reason: "must be a finite value between -90 and 90 degrees".to_string(),
            });
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidInput {
                field: "longitude".to_string(),
                value: longitude.to_string(),
                reason: "must be a finite value between -180 and 180 degrees".to_string(),
            });
        }

        Ok(Self { latitude, longitude })
    }

    /// Create a point, clamping each component into its valid range.
    /// Non-finite components collapse to zero.
    pub fn clamped(latitude: f64, longitude: f64) -> Self {
        let latitude = if latitude.is_finite() { latitude.clamp(-90.0, 90.0) } else { 0.0 };
        let longitude = if longitude.is_finite() { longitude.clamp(-180.0, 180.0) } else { 0.0 };
        Self { latitude, longitude }
    }

    /// Check range and finiteness without constructing a new point
    pub fn validate(&self) -> GeoResult<()> {
        Self::new(self.latitude, self.longitude).map(|_| ())
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude.to_radians()
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_ORIGIN_LAT,
            longitude: DEFAULT_ORIGIN_LON,
        }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Container-relative pixel coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for PixelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}, {:.1}]", self.x, self.y)
    }
}

/// Reference frame for converting between geographic and pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionOrigin {
    /// Geographic point that maps to `screen_center`
    pub center: GeoPoint,
    /// Ground distance covered by one pixel at the center latitude
    pub meters_per_pixel: f64,
    /// Container pixel the center maps to
    pub screen_center: PixelPoint,
}

impl ProjectionOrigin {
    pub fn new(center: GeoPoint, meters_per_pixel: f64) -> Self {
        Self {
            center,
            meters_per_pixel,
            screen_center: PixelPoint::default(),
        }
    }

    /// Derive the pixel scale from a Web-Mercator zoom level
    pub fn from_zoom(center: GeoPoint, zoom: f64, screen_center: PixelPoint) -> GeoResult<Self> {
        center.validate()?;
        if !zoom.is_finite() || zoom < 0.0 {
            return Err(GeoError::InvalidInput {
                field: "zoom".to_string(),
                value: zoom.to_string(),
                reason: "zoom must be a finite, non-negative level".to_string(),
            });
        }

        Ok(Self {
            center,
            meters_per_pixel: Self::meters_per_pixel_at(center.latitude, zoom),
            screen_center,
        })
    }

    /// Ground resolution of a Web-Mercator tile pyramid at `latitude`
    pub fn meters_per_pixel_at(latitude: f64, zoom: f64) -> f64 {
        WEB_MERCATOR_RESOLUTION_M * latitude.to_radians().cos() / 2f64.powf(zoom)
    }

    pub fn with_screen_center(mut self, screen_center: PixelPoint) -> Self {
        self.screen_center = screen_center;
        self
    }
}

/// Affine correction applied to raw projected pixels: rotate, scale, translate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParameters {
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub rotation_degrees: f64,
}

impl CalibrationParameters {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
        rotation_degrees: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Identity plus a pure pixel translation
    pub fn translation(offset_x: f64, offset_y: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn is_finite(&self) -> bool {
        self.scale_x.is_finite()
            && self.scale_y.is_finite()
            && self.offset_x.is_finite()
            && self.offset_y.is_finite()
            && self.rotation_degrees.is_finite()
    }
}

impl Default for CalibrationParameters {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One observed correspondence between a displayed pixel and its true location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub pixel: PixelPoint,
    pub expected_geo: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(51.505, -0.09).is_ok());
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_geo_point_clamping() {
        let p = GeoPoint::clamped(95.0, -200.0);
        assert_eq!(p.latitude, 90.0);
        assert_eq!(p.longitude, -180.0);

        let p = GeoPoint::clamped(f64::NAN, 10.0);
        assert_eq!(p.latitude, 0.0);
        assert_eq!(p.longitude, 10.0);
    }

    #[test]
    fn test_meters_per_pixel_from_zoom() {
        let equator = GeoPoint::new(0.0, 0.0).unwrap();
        let origin = ProjectionOrigin::from_zoom(equator, 0.0, PixelPoint::default()).unwrap();
        assert!((origin.meters_per_pixel - WEB_MERCATOR_RESOLUTION_M).abs() < 1e-6);

        // Each zoom level halves the ground resolution
        let zoomed = ProjectionOrigin::from_zoom(equator, 1.0, PixelPoint::default()).unwrap();
        assert!((zoomed.meters_per_pixel * 2.0 - origin.meters_per_pixel).abs() < 1e-6);

        assert!(ProjectionOrigin::from_zoom(equator, -1.0, PixelPoint::default()).is_err());
    }

    #[test]
    fn test_identity_calibration() {
        let params = CalibrationParameters::default();
        assert!(params.is_identity());
        assert!(!CalibrationParameters::translation(1.0, 0.0).is_identity());
    }
}
