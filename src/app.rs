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
use std::time::{Duration, Instant};

use eframe::egui;
use log::{debug, info, warn};
use opensky_client::{PollEvent, Poller};

use crate::config::AppConfig;
use crate::map::{AircraftLayer, BaseMap, HoverHit, HoverSink};
use crate::ui::status_pane::{MapAttribution, QueryWindow};
use crate::ui::{show_aircraft_tooltip, StatusPane};
use crate::view_state::{PointerPos, ViewEvent, ViewState};

/// Repaint interval while no animation is running, so poll events are drained
const IDLE_REPAINT: Duration = Duration::from_millis(250);

pub struct SkyTrailApp {
    poller: Poller,
    view: ViewState,
    base_map: BaseMap,
    map_memory: walkers::MapMemory,
    home: walkers::Position,
    hover_sink: HoverSink,
    status_pane: StatusPane,
    query: QueryWindow,
    icon_size: f32,
    // Dropped last so the poll task is cancelled before the runtime goes away
    _runtime: tokio::runtime::Runtime,
}

impl std::fmt::Debug for SkyTrailApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkyTrailApp")
            .field("poller", &self.poller)
            .field("aircraft", &self.view.fleet().len())
            .field("base_map", &self.base_map)
            .finish_non_exhaustive()
    }
}

impl SkyTrailApp {
    pub fn new(
        ctx: &egui::Context,
        config: &AppConfig,
        runtime: tokio::runtime::Runtime,
        poller: Poller,
    ) -> Self {
        let view_config = &config.initial_view;
        if view_config.pitch != 0.0 || view_config.bearing != 0.0 {
            info!(
                "Ignoring pitch {} / bearing {}: the map is drawn top-down",
                view_config.pitch, view_config.bearing
            );
        }

        let mut map_memory = walkers::MapMemory::default();
        if map_memory.set_zoom(view_config.zoom).is_err() {
            warn!("Initial zoom {} is out of range, using default", view_config.zoom);
        }

        let base_map = BaseMap::new(config.resolve_mapbox_token(), &config.map_style, ctx);

        Self {
            poller,
            view: ViewState::new(
                config.fetch_interval(),
                config.frames_per_second,
                config.endpoint.clone(),
            ),
            base_map,
            map_memory,
            home: walkers::lat_lon(view_config.latitude, view_config.longitude),
            hover_sink: Arc::new(Mutex::new(None)),
            status_pane: StatusPane::new(config.show_status_pane),
            query: QueryWindow {
                configured: config.bounding_box,
                enabled: config.bounding_box.is_some(),
            },
            icon_size: config.icon_size,
            _runtime: runtime,
        }
    }

    fn dispatch(&mut self, event: ViewEvent) {
        self.view.apply(event);
    }

    fn drain_poll_events(&mut self) {
        while let Some(event) = self.poller.try_recv() {
            let event = match event {
                PollEvent::Snapshot(fleet) => {
                    debug!("Snapshot with {} aircraft", fleet.len());
                    ViewEvent::SnapshotReceived(fleet)
                }
                PollEvent::StateChanged(state) => ViewEvent::PollStateChanged(state),
            };
            self.dispatch(event);
        }
    }

    fn apply_hover(&mut self, hit: Option<HoverHit>) {
        match hit {
            Some(HoverHit { icao24, pointer }) => self.dispatch(ViewEvent::Hover {
                icao24,
                pointer: PointerPos {
                    x: pointer.x,
                    y: pointer.y,
                },
            }),
            None if self.view.hover().is_some() => self.dispatch(ViewEvent::PointerLeft),
            None => {}
        }
    }

    fn show_map(&mut self, ui: &mut egui::Ui) {
        let layer = AircraftLayer::new(
            self.view.fleet(),
            self.view.hover().map(|h| h.icao24.as_str()),
            self.icon_size,
            Arc::clone(&self.hover_sink),
        );

        walkers::Map::new(Some(&mut self.base_map.tiles), &mut self.map_memory, self.home)
            .zoom_with_ctrl(false)
            .with_plugin(layer)
            .show(ui, |_ui, _projector, _map_memory| {});
    }
}

impl eframe::App for SkyTrailApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_poll_events();

        if self.view.scheduler_mut().frame_due(Instant::now()) {
            self.dispatch(ViewEvent::FrameTick);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.show_map(ui));

        let hit = self.hover_sink.lock().ok().and_then(|mut slot| slot.take());
        self.apply_hover(hit);

        if let Some(tooltip) = self.view.tooltip() {
            show_aircraft_tooltip(ctx, &tooltip);
        }

        let attribution = MapAttribution {
            text: self.base_map.attribution_text,
            url: self.base_map.attribution_url,
        };
        let query_changed = self.status_pane.render(
            ctx,
            &self.view.feed,
            self.view.scheduler(),
            attribution,
            &mut self.query,
        );
        if query_changed {
            info!("Query window changed: {:?}", self.query.active());
            self.poller.set_bounding_box(self.query.active());
        }

        let next_frame = self
            .view
            .scheduler()
            .time_until_next_frame(Instant::now())
            .unwrap_or(IDLE_REPAINT);
        ctx.request_repaint_after(next_frame.min(IDLE_REPAINT));
    }
}
