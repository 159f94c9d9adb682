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

//! OpenSky client library for polling and animating live aircraft states.
//!
//! The library is split into layers that can be used independently:
//!
//! - **Geodesy layer**: great-circle destination points and interpolation
//! - **Protocol layer**: decoding of `/api/states/all` responses
//! - **Tracker layer**: per-poll [`Fleet`] of aircraft with precomputed paths
//! - **Animation layer**: fixed-rate scheduler sampling those paths
//! - **Poll layer**: async fetch loop with retry and bounding-box hot reload
//!
//! # Quick Start
//!
//! ```no_run
//! use opensky_client::{AnimationScheduler, Fleet, PollEvent, Poller, PollerConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut poller = Poller::spawn(PollerConfig::default()).expect("http client");
//!     let mut scheduler = AnimationScheduler::new(Duration::from_secs(10), 30);
//!     let mut fleet = Fleet::empty();
//!
//!     while let Some(event) = poller.recv().await {
//!         if let PollEvent::Snapshot(next) = event {
//!             fleet = next;
//!             scheduler.start();
//!             scheduler.tick(&mut fleet);
//!             println!("Tracking {} aircraft", fleet.len());
//!         }
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use opensky_client::geodesy::{destination_point, GeoInterpolator};
//!
//! // 200 m/s for 10 s, heading east
//! let end = destination_point(0.0, 52.0, 2000.0, 90.0);
//! let path = GeoInterpolator::new((0.0, 52.0), end);
//! assert_eq!(path.at(0.0), (0.0, 52.0));
//! assert_eq!(path.at(1.0), end);
//! ```

pub mod animation;
pub mod geodesy;
pub mod poll;
pub mod protocol;
pub mod tracker;

pub use animation::{AnimationScheduler, SchedulerState, DEFAULT_FRAMES_PER_SECOND};
pub use geodesy::{destination_point, GeoInterpolator};
pub use poll::{
    Credentials, FetchError, PollEvent, PollState, Poller, PollerConfig, RetryBackoff,
    DEFAULT_ENDPOINT,
};
pub use protocol::{BoundingBox, ParseError, Protocol, StateVector, StatesParser, StatesSnapshot};
pub use tracker::{Aircraft, Fleet};
