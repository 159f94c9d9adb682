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

//! Airplane icon geometry, rotation and picking.
//!
//! The icon is a handful of convex polygons in a 20px reference frame with
//! the nose pointing up. The layer angle follows the web map convention
//! (degrees counter-clockwise, artwork pointing north-east at 0), so it has
//! to be flipped before it becomes an egui rotation.

use eframe::egui;

/// Size in pixels the reference shapes are drawn at
pub const REFERENCE_ICON_SIZE: f32 = 20.0;

/// Bearing of the icon artwork at layer angle 0
const ARTWORK_BEARING_DEG: f64 = 45.0;

const FUSELAGE: [egui::Pos2; 5] = [
    egui::pos2(0.0, -10.0), // Nose
    egui::pos2(1.5, -7.0),
    egui::pos2(1.5, 8.0),
    egui::pos2(-1.5, 8.0),
    egui::pos2(-1.5, -7.0),
];

const RIGHT_WING: [egui::Pos2; 4] = [
    egui::pos2(0.0, -3.0),
    egui::pos2(9.0, 3.0),
    egui::pos2(9.0, 4.5),
    egui::pos2(0.0, 1.5),
];

const LEFT_WING: [egui::Pos2; 4] = [
    egui::pos2(0.0, -3.0),
    egui::pos2(0.0, 1.5),
    egui::pos2(-9.0, 4.5),
    egui::pos2(-9.0, 3.0),
];

const TAIL: [egui::Pos2; 3] = [
    egui::pos2(0.0, 5.0),
    egui::pos2(4.0, 10.0),
    egui::pos2(-4.0, 10.0),
];

/// Layer angle in degrees: `45 + true_track`
pub fn icon_rotation_degrees(true_track: Option<f64>) -> f64 {
    ARTWORK_BEARING_DEG + true_track.unwrap_or(0.0)
}

/// Clockwise screen rotation for a north-up shape
#[allow(clippy::cast_possible_truncation, reason = "screen angles fit in f32")]
pub fn screen_rotation(true_track: Option<f64>) -> egui::emath::Rot2 {
    let clockwise = ARTWORK_BEARING_DEG - icon_rotation_degrees(true_track);
    egui::emath::Rot2::from_angle(clockwise.to_radians() as f32)
}

/// Airplane outline as convex polygons placed at `center`
pub fn airplane_parts(
    center: egui::Pos2,
    icon_size: f32,
    rotation: egui::emath::Rot2,
) -> Vec<Vec<egui::Pos2>> {
    let scale = icon_size / REFERENCE_ICON_SIZE;
    let place = |shape: &[egui::Pos2]| {
        shape
            .iter()
            .map(|&p| center + rotation * (p.to_vec2() * scale))
            .collect::<Vec<egui::Pos2>>()
    };

    vec![
        place(&LEFT_WING),
        place(&RIGHT_WING),
        place(&TAIL),
        place(&FUSELAGE),
    ]
}

/// Index of the closest position within `radius` of the pointer
pub fn pick_nearest(positions: &[egui::Pos2], pointer: egui::Pos2, radius: f32) -> Option<usize> {
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.distance_sq(pointer)))
        .filter(|(_, d)| *d <= radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Continuous altitude gradient, cyan near the ground to purple at cruise
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "channel values are clamped to 0..=255"
)]
pub fn altitude_color(altitude_m: Option<f64>, on_ground: bool) -> egui::Color32 {
    if on_ground {
        return egui::Color32::from_rgb(160, 160, 160);
    }

    // (altitude in meters, rgb)
    let stops: [(f64, (f64, f64, f64)); 6] = [
        (0.0, (0.0, 200.0, 200.0)),
        (3000.0, (50.0, 150.0, 200.0)),
        (6000.0, (150.0, 200.0, 0.0)),
        (9000.0, (255.0, 150.0, 0.0)),
        (12000.0, (255.0, 50.0, 150.0)),
        (13700.0, (150.0, 50.0, 255.0)),
    ];

    let alt = altitude_m.unwrap_or(0.0).clamp(0.0, 13700.0);

    for pair in stops.windows(2) {
        let (alt1, c1) = pair[0];
        let (alt2, c2) = pair[1];
        if alt <= alt2 {
            let t = (alt - alt1) / (alt2 - alt1);
            let lerp = |a: f64, b: f64| (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
            return egui::Color32::from_rgb(lerp(c1.0, c2.0), lerp(c1.1, c2.1), lerp(c1.2, c2.2));
        }
    }

    egui::Color32::from_rgb(150, 50, 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nose(true_track: Option<f64>) -> egui::Vec2 {
        screen_rotation(true_track) * egui::vec2(0.0, -1.0)
    }

    #[test]
    fn test_layer_angle() {
        assert_eq!(icon_rotation_degrees(Some(-90.0)), -45.0);
        assert_eq!(icon_rotation_degrees(None), 45.0);
    }

    #[test]
    fn test_nose_follows_heading() {
        // true_track is the negated heading
        let north = nose(Some(0.0));
        assert!(north.x.abs() < 1e-5 && (north.y + 1.0).abs() < 1e-5);

        let east = nose(Some(-90.0));
        assert!((east.x - 1.0).abs() < 1e-5 && east.y.abs() < 1e-5);

        let south = nose(Some(-180.0));
        assert!(south.x.abs() < 1e-5 && (south.y - 1.0).abs() < 1e-5);

        let west = nose(Some(-270.0));
        assert!((west.x + 1.0).abs() < 1e-5 && west.y.abs() < 1e-5);
    }

    #[test]
    fn test_parts_scale_with_icon_size() {
        let center = egui::pos2(100.0, 100.0);
        let parts = airplane_parts(center, 40.0, egui::emath::Rot2::IDENTITY);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3][0], egui::pos2(100.0, 80.0));
    }

    #[test]
    fn test_pick_nearest() {
        let positions = [egui::pos2(0.0, 0.0), egui::pos2(10.0, 0.0), egui::pos2(50.0, 50.0)];
        assert_eq!(pick_nearest(&positions, egui::pos2(8.0, 1.0), 12.0), Some(1));
        assert_eq!(pick_nearest(&positions, egui::pos2(30.0, 30.0), 12.0), None);
        assert_eq!(pick_nearest(&[], egui::pos2(0.0, 0.0), 12.0), None);
    }

    #[test]
    fn test_altitude_color_endpoints() {
        assert_eq!(altitude_color(Some(0.0), false), egui::Color32::from_rgb(0, 200, 200));
        assert_eq!(altitude_color(Some(20000.0), false), egui::Color32::from_rgb(150, 50, 255));
        assert_eq!(altitude_color(Some(5000.0), true), egui::Color32::from_rgb(160, 160, 160));
        assert_eq!(altitude_color(None, false), altitude_color(Some(0.0), false));
    }
}
