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

//! View state container.
//!
//! All mutation of the displayed fleet goes through [`ViewState::reduce`],
//! which takes the current state and one [`ViewEvent`] and returns the next
//! state. Nothing here depends on egui, so the whole flow can be driven from
//! tests.

use std::time::Duration;

use log::debug;
use opensky_client::{AnimationScheduler, Fleet, PollState, DEFAULT_FRAMES_PER_SECOND};

use crate::status::FeedStatus;

/// Screen coordinates of the pointer in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

/// Aircraft currently under the pointer
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub icao24: String,
    pub pointer: PointerPos,
}

/// Tooltip content for the hovered aircraft
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub icao24: String,
    pub callsign: Option<String>,
    pub origin_country: String,
    pub velocity: Option<f64>,
    pub true_track: Option<f64>,
    pub pointer: PointerPos,
}

impl Tooltip {
    /// Display lines in tooltip order
    pub fn lines(&self) -> Vec<String> {
        let number = |value: Option<f64>, unit: &str| {
            value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}{unit}"))
        };

        vec![
            format!("ICAO24: {}", self.icao24),
            format!("Callsign: {}", self.callsign.as_deref().unwrap_or("-")),
            format!("Country: {}", self.origin_country),
            format!("Velocity: {}", number(self.velocity, " m/s")),
            format!("Track: {}", number(self.true_track, "°")),
        ]
    }
}

/// Events that drive the view
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// A poll produced a new snapshot
    SnapshotReceived(Fleet),
    /// One animation frame elapsed
    FrameTick,
    /// The pointer is over an aircraft icon
    Hover { icao24: String, pointer: PointerPos },
    /// The pointer left every icon
    PointerLeft,
    /// The poll loop changed state
    PollStateChanged(PollState),
}

#[derive(Debug, Clone)]
pub struct ViewState {
    fleet: Fleet,
    scheduler: AnimationScheduler,
    hover: Option<HoverTarget>,
    pub feed: FeedStatus,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), DEFAULT_FRAMES_PER_SECOND, String::new())
    }
}

impl ViewState {
    pub fn new(fetch_interval: Duration, frames_per_second: u32, endpoint: String) -> Self {
        Self {
            fleet: Fleet::empty(),
            scheduler: AnimationScheduler::new(fetch_interval, frames_per_second),
            hover: None,
            feed: FeedStatus::new(endpoint),
        }
    }

    /// Apply one event and return the next state
    #[must_use]
    pub fn reduce(mut self, event: ViewEvent) -> Self {
        self.apply(event);
        self
    }

    /// In-place form of [`ViewState::reduce`] for the per-frame hot path
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::SnapshotReceived(fleet) => {
                self.feed.record_snapshot(fleet.len(), fleet.received_at);
                self.fleet = fleet;
                self.scheduler.start();

                let stale_hover = self
                    .hover
                    .as_ref()
                    .is_some_and(|h| self.fleet.get_by_icao(&h.icao24).is_none());
                if stale_hover {
                    debug!("Hovered aircraft left the snapshot");
                    self.hover = None;
                }
            }
            ViewEvent::FrameTick => {
                self.scheduler.tick(&mut self.fleet);
            }
            ViewEvent::Hover { icao24, pointer } => {
                self.hover = self
                    .fleet
                    .get_by_icao(&icao24)
                    .is_some()
                    .then_some(HoverTarget { icao24, pointer });
            }
            ViewEvent::PointerLeft => {
                self.hover = None;
            }
            ViewEvent::PollStateChanged(state) => {
                self.feed.apply_poll_state(state);
            }
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AnimationScheduler {
        &mut self.scheduler
    }

    pub fn hover(&self) -> Option<&HoverTarget> {
        self.hover.as_ref()
    }

    /// Tooltip for the hovered aircraft, if any
    pub fn tooltip(&self) -> Option<Tooltip> {
        let hover = self.hover.as_ref()?;
        let aircraft = self.fleet.get_by_icao(&hover.icao24)?;

        Some(Tooltip {
            icao24: aircraft.icao24.clone(),
            callsign: aircraft.callsign.clone(),
            origin_country: aircraft.origin_country.clone(),
            velocity: aircraft.velocity,
            true_track: aircraft.true_track,
            pointer: hover.pointer,
        })
    }
}
