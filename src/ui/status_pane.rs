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

use chrono::Utc;
use eframe::egui;
use opensky_client::{AnimationScheduler, BoundingBox, PollState};

use crate::status::{DiagnosticLevel, FeedStatus};

const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(130, 130, 130);
const VALUE_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 200, 200);
const SECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(150, 150, 150);

/// Map attribution shown at the bottom of the pane
#[derive(Debug, Clone, Copy)]
pub struct MapAttribution {
    pub text: &'static str,
    pub url: &'static str,
}

/// Query window toggle; `configured` is `None` when no box was configured
#[derive(Debug, Clone, Copy)]
pub struct QueryWindow {
    pub configured: Option<BoundingBox>,
    pub enabled: bool,
}

impl QueryWindow {
    /// Box the poller should currently use
    pub fn active(&self) -> Option<BoundingBox> {
        self.configured.filter(|_| self.enabled)
    }
}

#[derive(Debug)]
pub struct StatusPane {
    pub visible: bool,
    pub collapsed: bool,
}

impl Default for StatusPane {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StatusPane {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            collapsed: false,
        }
    }

    /// Render the status pane as a floating window.
    ///
    /// Returns `true` when the user toggled the query window.
    pub fn render(
        &mut self,
        ctx: &egui::Context,
        status: &FeedStatus,
        animation: &AnimationScheduler,
        attribution: MapAttribution,
        query: &mut QueryWindow,
    ) -> bool {
        if !self.visible {
            // Small button to re-open the pane
            egui::Window::new("show_status")
                .title_bar(false)
                .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
                .fixed_size(egui::vec2(140.0, 35.0))
                .resizable(false)
                .frame(pane_frame(ctx, 200))
                .show(ctx, |ui| {
                    if ui
                        .button(
                            egui::RichText::new("📊 Show Status")
                                .color(egui::Color32::from_rgb(150, 200, 220))
                                .size(11.0),
                        )
                        .clicked()
                    {
                        self.visible = true;
                    }
                });
            return false;
        }

        let mut query_changed = false;
        egui::Window::new("Feed Status")
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(10.0, -10.0))
            .fixed_size(egui::vec2(280.0, if self.collapsed { 40.0 } else { 360.0 }))
            .resizable(false)
            .collapsible(false)
            .title_bar(false)
            .frame(pane_frame(ctx, 230))
            .show(ctx, |ui| {
                self.render_header(ui);

                if self.collapsed {
                    return;
                }

                ui.separator();
                query_changed = render_feed_section(ui, status, query);
                ui.add_space(6.0);
                render_metrics_section(ui, status, animation);
                ui.add_space(6.0);
                render_diagnostics_section(ui, status);
                ui.add_space(6.0);
                ui.separator();
                ui.hyperlink_to(
                    egui::RichText::new(attribution.text).size(8.0).color(LABEL_COLOR),
                    attribution.url,
                );
            });

        query_changed
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new("◈ STATUS")
                    .color(egui::Color32::from_rgb(100, 180, 220))
                    .size(12.0)
                    .strong(),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .button(
                        egui::RichText::new("✕")
                            .size(12.0)
                            .color(egui::Color32::from_rgb(200, 100, 100)),
                    )
                    .on_hover_text("Hide status pane")
                    .clicked()
                {
                    self.visible = false;
                }

                ui.add_space(4.0);

                let collapse_icon = if self.collapsed { "▼" } else { "▲" };
                if ui
                    .button(egui::RichText::new(collapse_icon).size(10.0))
                    .on_hover_text(if self.collapsed { "Expand" } else { "Collapse" })
                    .clicked()
                {
                    self.collapsed = !self.collapsed;
                }
            });
        });
    }
}

fn pane_frame(ctx: &egui::Context, alpha: u8) -> egui::Frame {
    egui::Frame::window(&ctx.style())
        .fill(egui::Color32::from_rgba_unmultiplied(25, 30, 35, alpha))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(60, 80, 100)))
        .corner_radius(6.0)
}

fn section_title(ui: &mut egui::Ui, title: &str) {
    ui.label(egui::RichText::new(title).color(SECTION_COLOR).size(10.0).strong());
    ui.add_space(3.0);
}

fn labeled_value(ui: &mut egui::Ui, label: &str, value: String, color: egui::Color32) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(label).color(LABEL_COLOR).size(9.0));
        ui.label(egui::RichText::new(value).color(color).size(9.0).monospace());
    });
}

/// Indicator color, text and icon for a poll state
fn poll_state_badge(state: Option<&PollState>) -> (egui::Color32, String, &'static str) {
    match state {
        Some(PollState::Fetching) => (egui::Color32::from_rgb(255, 200, 100), "FETCHING".to_string(), "◐"),
        Some(PollState::Idle { aircraft }) => (
            egui::Color32::from_rgb(100, 255, 100),
            format!("IDLE ({aircraft})"),
            "●",
        ),
        Some(PollState::Error(_)) => (egui::Color32::from_rgb(255, 100, 100), "ERROR".to_string(), "✕"),
        None => (egui::Color32::from_rgb(150, 150, 150), "STARTING".to_string(), "○"),
    }
}

fn render_feed_section(ui: &mut egui::Ui, status: &FeedStatus, query: &mut QueryWindow) -> bool {
    section_title(ui, "FEED");

    ui.horizontal(|ui| {
        let (color, text, icon) = poll_state_badge(status.poll_state.as_ref());
        ui.label(egui::RichText::new(icon).color(color).size(10.0));
        ui.label(egui::RichText::new(text).color(color).size(10.0).monospace().strong());
    });

    ui.label(
        egui::RichText::new(&status.endpoint)
            .color(egui::Color32::from_rgb(180, 180, 180))
            .size(8.0)
            .monospace(),
    );

    let last_success = status
        .seconds_since_success(Utc::now())
        .map_or_else(|| "never".to_string(), |secs| format!("{} ago", format_duration(secs)));
    labeled_value(ui, "Last fetch:", last_success, VALUE_COLOR);

    if let Some(error) = &status.last_error {
        if status.is_degraded() {
            labeled_value(ui, "Error:", error.clone(), egui::Color32::from_rgb(255, 100, 100));
        }
    }

    let Some(bbox) = query.configured else {
        labeled_value(ui, "Area:", "whole world".to_string(), VALUE_COLOR);
        return false;
    };

    let label = format!(
        "Limit to {:.1},{:.1} / {:.1},{:.1}",
        bbox.lamin, bbox.lomin, bbox.lamax, bbox.lomax
    );
    ui.checkbox(
        &mut query.enabled,
        egui::RichText::new(label).color(LABEL_COLOR).size(9.0),
    )
    .changed()
}

fn render_metrics_section(ui: &mut egui::Ui, status: &FeedStatus, animation: &AnimationScheduler) {
    section_title(ui, "METRICS");

    labeled_value(ui, "Aircraft:", status.aircraft_count.to_string(), VALUE_COLOR);
    ui.horizontal(|ui| render_sparkline(ui, status));
    labeled_value(
        ui,
        "Fetches:",
        format!("{} ok / {} failed", status.successful_fetches, status.failed_fetches),
        VALUE_COLOR,
    );
    labeled_value(
        ui,
        "Frame:",
        format!(
            "{} / {} ({:.0}%)",
            animation.current_frame(),
            animation.frames_per_fetch(),
            animation.progress().min(1.0) * 100.0
        ),
        egui::Color32::from_rgb(100, 200, 200),
    );
}

#[allow(clippy::cast_precision_loss, reason = "sparkline scaling")]
fn render_sparkline(ui: &mut egui::Ui, status: &FeedStatus) {
    let width = 120.0;
    let height = 18.0;

    let (rect, _response) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());

    let history = &status.aircraft_history;
    if history.len() < 2 {
        return;
    }

    let max_count = history.iter().copied().max().unwrap_or(1).max(1) as f32;
    let last_index = (history.len() - 1) as f32;

    let points: Vec<egui::Pos2> = history
        .iter()
        .enumerate()
        .map(|(i, count)| {
            let x = rect.min.x + (i as f32 / last_index) * width;
            let y = rect.max.y - (*count as f32 / max_count) * height;
            egui::pos2(x, y)
        })
        .collect();

    ui.painter().add(egui::Shape::line(
        points,
        egui::Stroke::new(1.5, egui::Color32::from_rgb(100, 220, 220)),
    ));
}

fn render_diagnostics_section(ui: &mut egui::Ui, status: &FeedStatus) {
    section_title(ui, "DIAGNOSTICS");

    if status.diagnostics.is_empty() {
        ui.label(
            egui::RichText::new("No messages")
                .color(egui::Color32::from_rgb(100, 100, 100))
                .size(8.0)
                .italics(),
        );
        return;
    }

    let line_height = 14.0;
    let max_visible_lines = 6.0;

    egui::ScrollArea::vertical()
        .max_height(line_height * max_visible_lines)
        .auto_shrink([false, true])
        .show(ui, |ui| {
            // Newest first
            for diagnostic in status.diagnostics.iter().rev() {
                ui.horizontal(|ui| {
                    let (icon, color) = match diagnostic.level {
                        DiagnosticLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 180, 255)),
                        DiagnosticLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 200, 100)),
                        DiagnosticLevel::Error => ("✕", egui::Color32::from_rgb(255, 100, 100)),
                    };

                    ui.label(egui::RichText::new(icon).color(color).size(9.0));
                    ui.label(
                        egui::RichText::new(diagnostic.timestamp.format("%H:%M:%S").to_string())
                            .color(egui::Color32::from_rgb(100, 100, 100))
                            .size(8.0)
                            .monospace(),
                    );
                    ui.label(
                        egui::RichText::new(truncate(&diagnostic.message, 32))
                            .color(egui::Color32::from_rgb(180, 180, 180))
                            .size(8.0),
                    );
                });
            }
        });
}

/// Truncate on a character boundary
fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() > max_chars {
        let head: String = message.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5), "5s");
        assert_eq!(format_duration(65), "1m 5s");
        assert_eq!(format_duration(3725), "1h 2m 5s");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("short", 32), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }

    #[test]
    fn test_query_window_active() {
        let bbox = BoundingBox { lamin: 43.0, lomin: -14.0, lamax: 61.0, lomax: 31.0 };
        let mut query = QueryWindow { configured: Some(bbox), enabled: true };
        assert_eq!(query.active(), Some(bbox));
        query.enabled = false;
        assert_eq!(query.active(), None);
    }

    #[test]
    fn test_poll_state_badge() {
        assert_eq!(poll_state_badge(Some(&PollState::Idle { aircraft: 7 })).1, "IDLE (7)");
        assert_eq!(poll_state_badge(None).1, "STARTING");
    }
}
