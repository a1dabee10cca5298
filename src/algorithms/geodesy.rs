//! Great-circle distance and interpolation helpers

use crate::core::{GeoPoint, EARTH_RADIUS_M};

/// Haversine great-circle distance between two points (meters)
pub fn haversine_distance_m(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat_rad();
    let lat2 = to.lat_rad();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` to `to` in degrees (0-360, clockwise from north)
pub fn initial_bearing_deg(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let lat1 = from.lat_rad();
    let lat2 = to.lat_rad();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let x = delta_lon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// Component-wise linear interpolation. Not geodesic, which is fine at play
/// radius scale.
pub fn lerp(from: &GeoPoint, to: &GeoPoint, t: f64) -> GeoPoint {
    let t = t.clamp(0.0, 1.0);
    GeoPoint {
        latitude: from.latitude + (to.latitude - from.latitude) * t,
        longitude: from.longitude + (to.longitude - from.longitude) * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_haversine_known_distances() {
        let origin = point(51.505, -0.09);

        // 0.005 degrees of latitude is roughly 556 meters
        let north = point(51.510, -0.09);
        let d = haversine_distance_m(&origin, &north);
        assert!((d - 556.0).abs() < 1.0, "distance was {}", d);

        let farther = point(51.515, -0.09);
        let d = haversine_distance_m(&origin, &farther);
        assert!((d - 1112.0).abs() < 1.0, "distance was {}", d);
    }

    #[test]
    fn test_haversine_zero_and_symmetric() {
        let a = point(48.8566, 2.3522);
        let b = point(48.8606, 2.3376);
        assert_eq!(haversine_distance_m(&a, &a), 0.0);
        assert!((haversine_distance_m(&a, &b) - haversine_distance_m(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = point(0.0, 0.0);
        assert!((initial_bearing_deg(&origin, &point(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &point(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &point(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_deg(&origin, &point(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = point(10.0, 20.0);
        let b = point(12.0, 24.0);

        assert_eq!(lerp(&a, &b, 0.0), a);
        let mid = lerp(&a, &b, 0.5);
        assert!((mid.latitude - 11.0).abs() < 1e-12);
        assert!((mid.longitude - 22.0).abs() < 1e-12);

        // Progress outside [0, 1] is clamped
        assert_eq!(lerp(&a, &b, -1.0), a);
    }
}
