// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Great-circle helpers on a spherical Earth.
//!
//! Coordinates passed to [`destination_point`] and [`GeoInterpolator`] are
//! `(longitude, latitude)` pairs in degrees, matching the map layer's
//! ordering. The distance helpers keep the latitude-first argument order.

use geo::{Haversine, InterpolatePoint, Point};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Wrap a longitude into [-180, 180).
fn normalize_longitude(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

/// Point reached by travelling `distance_m` from `(longitude, latitude)` along
/// a great circle with the given initial bearing (degrees clockwise from north).
///
/// Returns `(longitude, latitude)` in degrees.
#[must_use]
pub fn destination_point(
    longitude: f64,
    latitude: f64,
    distance_m: f64,
    bearing_deg: f64,
) -> (f64, f64) {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = latitude.to_radians();
    let lambda1 = longitude.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();

    let y = theta.sin() * delta.sin() * phi1.cos();
    let x = delta.cos() - phi1.sin() * sin_phi2;
    let lambda2 = lambda1 + y.atan2(x);

    (normalize_longitude(lambda2.to_degrees()), phi2.to_degrees())
}

/// Distance in meters between two lat/lon points (Haversine formula).
#[must_use]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from point 1 to point 2 in degrees (0-360).
#[must_use]
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let x = delta_lon.sin() * lat2_rad.cos();
    let y = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// Great-circle interpolation between two points.
///
/// `at(0.0)` is the start, `at(1.0)` the end. Progress outside [0, 1] is
/// clamped, so a late snapshot leaves the aircraft parked at the end point
/// instead of extrapolating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoInterpolator {
    start: Point<f64>,
    end: Point<f64>,
    distance_m: f64,
}

impl GeoInterpolator {
    /// Build an interpolator from `start` to `end`, both `(longitude, latitude)`.
    #[must_use]
    pub fn new(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            start: Point::new(start.0, start.1),
            end: Point::new(end.0, end.1),
            distance_m: haversine_distance_m(start.1, start.0, end.1, end.0),
        }
    }

    /// A degenerate interpolator that always yields `point`.
    #[must_use]
    pub fn stationary(point: (f64, f64)) -> Self {
        Self::new(point, point)
    }

    #[must_use]
    pub fn start(&self) -> (f64, f64) {
        self.start.x_y()
    }

    #[must_use]
    pub fn end(&self) -> (f64, f64) {
        self.end.x_y()
    }

    /// Great-circle length of the segment in meters.
    #[must_use]
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Sample the path at `t`, returning `(longitude, latitude)`.
    #[must_use]
    pub fn at(&self, t: f64) -> (f64, f64) {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        // Endpoints are returned verbatim so sampling reproduces the inputs exactly.
        if self.distance_m < f64::EPSILON || t <= 0.0 {
            return self.start();
        }
        if t >= 1.0 {
            return self.end();
        }

        Haversine
            .point_at_ratio_between(self.start, self.end, t)
            .x_y()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (f64, f64), expected: (f64, f64), tolerance: f64) {
        assert!(
            (actual.0 - expected.0).abs() < tolerance && (actual.1 - expected.1).abs() < tolerance,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_destination_zero_distance_is_identity() {
        for &(lon, lat) in &[(0.0, 52.0), (-122.4194, 37.7749), (151.2, -33.9), (179.5, 0.0)] {
            for &bearing in &[0.0, 45.0, 90.0, 213.7, 359.0] {
                assert_close(destination_point(lon, lat, 0.0, bearing), (lon, lat), 1e-9);
            }
        }
    }

    #[test]
    fn test_destination_due_east() {
        let (lon, lat) = destination_point(0.0, 52.0, 2000.0, 90.0);
        let distance = haversine_distance_m(52.0, 0.0, lat, lon);

        assert!((distance - 2000.0).abs() < 0.5, "distance {distance}");
        assert!(lon > 0.0);
        assert!((lat - 52.0).abs() < 1e-3);
    }

    #[test]
    fn test_destination_due_north_on_meridian() {
        // One degree of latitude on this sphere
        let one_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        assert_close(destination_point(10.0, 0.0, one_degree, 0.0), (10.0, 1.0), 1e-9);
    }

    #[test]
    fn test_destination_wraps_antimeridian() {
        let (lon, _) = destination_point(179.99, 0.0, 10_000.0, 90.0);
        assert!(lon < -179.0, "lon {lon}");
    }

    #[test]
    fn test_destination_agrees_with_geo() {
        use geo::Destination;

        let (lon, lat) = destination_point(0.0, 52.0, 2000.0, 90.0);
        let expected = Haversine.destination(Point::new(0.0, 52.0), 90.0, 2000.0);
        // geo uses a 6371008.8 m radius, a few millimetres apart at this range
        assert_close((lon, lat), expected.x_y(), 1e-6);
    }

    #[test]
    fn test_haversine_distance() {
        // LAX to JFK is approximately 3,983 km
        let distance = haversine_distance_m(33.9425, -118.4081, 40.6413, -73.7781);
        assert!((distance - 3_983_000.0).abs() < 20_000.0);
    }

    #[test]
    fn test_initial_bearing() {
        assert!((initial_bearing_deg(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_deg(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolator_endpoints() {
        let start = (0.0, 52.0);
        let end = destination_point(0.0, 52.0, 2000.0, 90.0);
        let interp = GeoInterpolator::new(start, end);

        assert_eq!(interp.at(0.0), start);
        assert_eq!(interp.at(1.0), end);
        assert!((interp.distance_m() - 2000.0).abs() < 0.5);
    }

    #[test]
    fn test_interpolator_midpoint_is_on_great_circle() {
        let start = (-10.0, 40.0);
        let end = (20.0, 60.0);
        let interp = GeoInterpolator::new(start, end);
        let mid = interp.at(0.5);

        let total = haversine_distance_m(start.1, start.0, end.1, end.0);
        let first = haversine_distance_m(start.1, start.0, mid.1, mid.0);
        let second = haversine_distance_m(mid.1, mid.0, end.1, end.0);

        assert!((first - total / 2.0).abs() < 1.0);
        assert!((second - total / 2.0).abs() < 1.0);
    }

    #[test]
    fn test_interpolator_quarter_points_are_evenly_spaced() {
        let start = (-0.1276, 51.5072);
        let end = (-73.9857, 40.7484);
        let interp = GeoInterpolator::new(start, end);
        let total = interp.distance_m();

        for &t in &[0.25, 0.5, 0.75] {
            let (lon, lat) = interp.at(t);
            let travelled = haversine_distance_m(start.1, start.0, lat, lon);
            assert!((travelled - t * total).abs() < 10.0, "t {t}: {travelled} of {total}");
        }
    }

    #[test]
    fn test_interpolator_clamps_progress() {
        let interp = GeoInterpolator::new((0.0, 0.0), (1.0, 0.0));
        assert_eq!(interp.at(1.5), interp.end());
        assert_eq!(interp.at(-0.5), interp.start());
        assert_eq!(interp.at(f64::NAN), interp.start());
    }

    #[test]
    fn test_stationary_interpolator() {
        let interp = GeoInterpolator::stationary((3.0, 4.0));
        assert_eq!(interp.at(0.3), (3.0, 4.0));
        assert!(interp.distance_m().abs() < f64::EPSILON);
    }
}
