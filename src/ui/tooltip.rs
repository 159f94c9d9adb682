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

use eframe::egui;

use crate::view_state::Tooltip;

/// Offset from the pointer so the tooltip doesn't cover the icon
const POINTER_OFFSET: egui::Vec2 = egui::vec2(14.0, 14.0);

/// Draw the aircraft tooltip next to the pointer
pub fn show_aircraft_tooltip(ctx: &egui::Context, tooltip: &Tooltip) {
    let anchor = egui::pos2(tooltip.pointer.x, tooltip.pointer.y) + POINTER_OFFSET;

    egui::Area::new(egui::Id::new("aircraft_tooltip"))
        .order(egui::Order::Tooltip)
        .fixed_pos(anchor)
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style())
                .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
                .show(ui, |ui| {
                    for (i, line) in tooltip.lines().into_iter().enumerate() {
                        let text = egui::RichText::new(line).size(11.0).monospace();
                        // first line is the ICAO address
                        let text = if i == 0 {
                            text.color(egui::Color32::from_rgb(100, 180, 220)).strong()
                        } else {
                            text.color(egui::Color32::from_rgb(200, 200, 200))
                        };
                        ui.label(text);
                    }
                });
        });
}
