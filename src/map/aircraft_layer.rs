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

use std::sync::{Arc, Mutex};

use eframe::egui;
use opensky_client::{Aircraft, Fleet};

use super::icon;

/// Extra pick tolerance around the icon in pixels
const PICK_PADDING: f32 = 4.0;

/// Aircraft picked under the pointer during the last map pass
#[derive(Debug, Clone, PartialEq)]
pub struct HoverHit {
    pub icao24: String,
    pub pointer: egui::Pos2,
}

/// Shared slot the layer writes its pick result into
pub type HoverSink = Arc<Mutex<Option<HoverHit>>>;

#[derive(Debug, Clone)]
struct Sprite {
    icao24: String,
    latitude: f64,
    longitude: f64,
    true_track: Option<f64>,
    altitude: Option<f64>,
    on_ground: bool,
}

impl From<&Aircraft> for Sprite {
    fn from(aircraft: &Aircraft) -> Self {
        Self {
            icao24: aircraft.icao24.clone(),
            latitude: aircraft.latitude(),
            longitude: aircraft.longitude(),
            true_track: aircraft.true_track,
            altitude: aircraft.altitude.or(aircraft.baro_altitude),
            on_ground: aircraft.on_ground,
        }
    }
}

/// `walkers` plugin drawing one airplane per aircraft
#[derive(Debug)]
pub struct AircraftLayer {
    sprites: Vec<Sprite>,
    hovered: Option<String>,
    icon_size: f32,
    hover_sink: HoverSink,
}

impl AircraftLayer {
    #[must_use]
    pub fn new(
        fleet: &Fleet,
        hovered: Option<&str>,
        icon_size: f32,
        hover_sink: HoverSink,
    ) -> Self {
        Self {
            sprites: fleet.aircraft().iter().map(Sprite::from).collect(),
            hovered: hovered.map(str::to_string),
            icon_size,
            hover_sink,
        }
    }
}

impl walkers::Plugin for AircraftLayer {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &walkers::Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        let visible = ui.max_rect().expand(self.icon_size);
        let painter = ui.painter();

        let mut drawn: Vec<(usize, egui::Pos2)> = Vec::with_capacity(self.sprites.len());

        for (i, sprite) in self.sprites.iter().enumerate() {
            let position = projector
                .project(walkers::lat_lon(sprite.latitude, sprite.longitude))
                .to_pos2();

            // skip icons that are off-screen
            if !visible.contains(position) {
                continue;
            }

            let is_hovered = self.hovered.as_deref() == Some(sprite.icao24.as_str());
            let (size, fill, stroke) = if is_hovered {
                (
                    self.icon_size * 1.3,
                    egui::Color32::from_rgb(255, 255, 100),
                    egui::Stroke::new(1.5, egui::Color32::WHITE),
                )
            } else {
                (
                    self.icon_size,
                    icon::altitude_color(sprite.altitude, sprite.on_ground),
                    egui::Stroke::new(1.0, egui::Color32::from_black_alpha(160)),
                )
            };

            let rotation = icon::screen_rotation(sprite.true_track);
            for part in icon::airplane_parts(position, size, rotation) {
                painter.add(egui::Shape::convex_polygon(part, fill, stroke));
            }

            drawn.push((i, position));
        }

        let hit = response.hover_pos().and_then(|pointer| {
            let positions: Vec<egui::Pos2> = drawn.iter().map(|(_, p)| *p).collect();
            let radius = self.icon_size / 2.0 + PICK_PADDING;
            icon::pick_nearest(&positions, pointer, radius).map(|nearest| HoverHit {
                icao24: self.sprites[drawn[nearest].0].icao24.clone(),
                pointer,
            })
        });

        if let Ok(mut slot) = self.hover_sink.lock() {
            *slot = hit;
        }
    }
}
