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

//! Aircraft state built from one states snapshot.
//!
//! A [`Fleet`] is rebuilt wholesale from every successful poll. Each
//! [`Aircraft`] carries a great-circle interpolator from its reported position
//! to where it will be one fetch interval later, and its displayed position is
//! only ever written by sampling that interpolator.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use crate::geodesy::{destination_point, GeoInterpolator};
use crate::protocol::{StateVector, StatesSnapshot};

/// Aircraft data for one fetch interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    /// ICAO 24-bit address (hex string).
    pub icao24: String,
    /// Aircraft callsign.
    pub callsign: Option<String>,
    /// Country of registration.
    pub origin_country: String,
    /// Ground speed in meters per second.
    pub velocity: Option<f64>,
    /// Geometric altitude in meters.
    pub altitude: Option<f64>,
    /// Barometric altitude in meters.
    pub baro_altitude: Option<f64>,
    /// Heading in degrees, negated so it rotates counter-clockwise like the icon layer.
    pub true_track: Option<f64>,
    /// Vertical rate in meters per second.
    pub vertical_rate: Option<f64>,
    /// Whether the aircraft reported a surface position.
    pub on_ground: bool,
    /// Transponder code.
    pub squawk: Option<String>,
    /// Unix timestamp of the last upstream contact.
    pub last_contact: Option<i64>,
    longitude: f64,
    latitude: f64,
    interpolator: GeoInterpolator,
}

impl Aircraft {
    /// Build an aircraft and project it `velocity * fetch_interval` meters along its heading.
    #[must_use]
    pub fn from_state(state: StateVector, fetch_interval: Duration) -> Self {
        let start = (state.longitude, state.latitude);

        let interpolator = match (state.velocity, state.true_track) {
            (Some(velocity), Some(heading)) if velocity > 0.0 => {
                let distance = velocity * fetch_interval.as_secs_f64();
                GeoInterpolator::new(
                    start,
                    destination_point(state.longitude, state.latitude, distance, heading),
                )
            }
            _ => GeoInterpolator::stationary(start),
        };

        Self {
            icao24: state.icao24,
            callsign: state.callsign,
            origin_country: state.origin_country,
            velocity: state.velocity,
            altitude: state.geo_altitude,
            baro_altitude: state.baro_altitude,
            true_track: state.true_track.map(|heading| -heading),
            vertical_rate: state.vertical_rate,
            on_ground: state.on_ground,
            squawk: state.squawk,
            last_contact: state.last_contact,
            longitude: state.longitude,
            latitude: state.latitude,
            interpolator,
        }
    }

    /// Currently displayed longitude.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Currently displayed latitude.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Position along this interval's path at `progress` (clamped to [0, 1]).
    #[must_use]
    pub fn interpolate_position(&self, progress: f64) -> (f64, f64) {
        self.interpolator.at(progress)
    }

    /// Projected position at the end of the fetch interval.
    #[must_use]
    pub fn projected_position(&self) -> (f64, f64) {
        self.interpolator.end()
    }

    /// Move the displayed position to the path sample at `progress`.
    pub fn sample(&mut self, progress: f64) {
        let (longitude, latitude) = self.interpolate_position(progress);
        self.longitude = longitude;
        self.latitude = latitude;
    }
}

/// The aircraft decoded from one poll.
#[derive(Debug, Clone)]
pub struct Fleet {
    aircraft: Vec<Aircraft>,
    index: HashMap<String, usize>,
    /// Server time of the snapshot (Unix seconds).
    pub snapshot_time: Option<i64>,
    /// When the snapshot was received.
    pub received_at: DateTime<Utc>,
}

impl Default for Fleet {
    fn default() -> Self {
        Self::empty()
    }
}

impl Fleet {
    /// A fleet with no aircraft.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            aircraft: Vec::new(),
            index: HashMap::new(),
            snapshot_time: None,
            received_at: Utc::now(),
        }
    }

    /// Build a fleet from decoded state vectors.
    ///
    /// Duplicate ICAO addresses collapse to the row with the latest
    /// `last_contact`; ties keep the earlier row.
    #[must_use]
    pub fn from_snapshot(snapshot: StatesSnapshot, fetch_interval: Duration) -> Self {
        let mut fleet = Self {
            aircraft: Vec::with_capacity(snapshot.states.len()),
            index: HashMap::with_capacity(snapshot.states.len()),
            snapshot_time: snapshot.time,
            received_at: Utc::now(),
        };

        for state in snapshot.states {
            match fleet.index.get(&state.icao24) {
                Some(&pos) => {
                    let existing = &mut fleet.aircraft[pos];
                    if state.last_contact > existing.last_contact {
                        debug!("Replacing duplicate state vector for {}", state.icao24);
                        *existing = Aircraft::from_state(state, fetch_interval);
                    }
                }
                None => {
                    fleet.index.insert(state.icao24.clone(), fleet.aircraft.len());
                    fleet.aircraft.push(Aircraft::from_state(state, fetch_interval));
                }
            }
        }

        fleet
    }

    /// Get all aircraft in upstream order.
    #[must_use]
    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    /// Get a specific aircraft by ICAO address.
    #[must_use]
    pub fn get_by_icao(&self, icao24: &str) -> Option<&Aircraft> {
        self.index.get(icao24).map(|&pos| &self.aircraft[pos])
    }

    /// Get the number of aircraft.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aircraft.len()
    }

    /// Check if there are no aircraft.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aircraft.is_empty()
    }

    /// Sample every aircraft at `progress`.
    pub fn sample_all(&mut self, progress: f64) {
        for aircraft in &mut self.aircraft {
            aircraft.sample(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::haversine_distance_m;

    const FETCH_INTERVAL: Duration = Duration::from_secs(10);

    fn state(icao24: &str, velocity: Option<f64>, heading: Option<f64>) -> StateVector {
        StateVector {
            icao24: icao24.to_string(),
            callsign: Some("TEST01".to_string()),
            origin_country: "UK".to_string(),
            last_contact: Some(100),
            longitude: 0.0,
            latitude: 52.0,
            baro_altitude: None,
            on_ground: false,
            velocity,
            true_track: heading,
            vertical_rate: None,
            geo_altitude: Some(10000.0),
            squawk: None,
        }
    }

    #[test]
    fn test_projection_two_km_east() {
        let aircraft = Aircraft::from_state(state("abc123", Some(200.0), Some(90.0)), FETCH_INTERVAL);

        assert_eq!(aircraft.interpolate_position(0.0), (0.0, 52.0));

        let (lon, lat) = aircraft.interpolate_position(1.0);
        assert_eq!((lon, lat), aircraft.projected_position());
        let distance = haversine_distance_m(52.0, 0.0, lat, lon);
        assert!((distance - 2000.0).abs() < 1.0, "distance {distance}");
        assert!(lon > 0.0);
    }

    #[test]
    fn test_true_track_is_inverted() {
        let aircraft = Aircraft::from_state(state("abc123", Some(200.0), Some(90.0)), FETCH_INTERVAL);
        assert_eq!(aircraft.true_track, Some(-90.0));
        assert_eq!(aircraft.altitude, Some(10000.0));
    }

    #[test]
    fn test_missing_velocity_is_stationary() {
        let aircraft = Aircraft::from_state(state("abc123", None, Some(90.0)), FETCH_INTERVAL);
        assert_eq!(aircraft.interpolate_position(1.0), (0.0, 52.0));

        let aircraft = Aircraft::from_state(state("abc123", Some(200.0), None), FETCH_INTERVAL);
        assert_eq!(aircraft.interpolate_position(1.0), (0.0, 52.0));
    }

    #[test]
    fn test_sample_moves_displayed_position() {
        let mut aircraft =
            Aircraft::from_state(state("abc123", Some(200.0), Some(0.0)), FETCH_INTERVAL);
        aircraft.sample(0.5);

        assert!(aircraft.latitude() > 52.0);
        assert!(aircraft.latitude() < aircraft.projected_position().1);
    }

    #[test]
    fn test_fleet_dedups_by_icao() {
        let mut newer = state("abc123", Some(100.0), Some(180.0));
        newer.last_contact = Some(200);
        newer.callsign = Some("NEWER".to_string());

        let snapshot = StatesSnapshot {
            time: Some(1),
            states: vec![
                state("abc123", Some(200.0), Some(90.0)),
                state("def456", None, None),
                newer,
                state("abc123", Some(50.0), Some(0.0)),
            ],
            rejected: 0,
        };

        let fleet = Fleet::from_snapshot(snapshot, FETCH_INTERVAL);

        assert_eq!(fleet.len(), 2);
        assert_eq!(fleet.aircraft()[0].icao24, "abc123");
        assert_eq!(
            fleet.get_by_icao("abc123").unwrap().callsign.as_deref(),
            Some("NEWER")
        );
        assert!(fleet.get_by_icao("zzz999").is_none());
    }

    #[test]
    fn test_sample_all() {
        let snapshot = StatesSnapshot {
            time: None,
            states: vec![state("abc123", Some(200.0), Some(90.0))],
            rejected: 0,
        };
        let mut fleet = Fleet::from_snapshot(snapshot, FETCH_INTERVAL);
        fleet.sample_all(1.0);

        let aircraft = fleet.get_by_icao("abc123").unwrap();
        assert_eq!(
            (aircraft.longitude(), aircraft.latitude()),
            aircraft.projected_position()
        );
    }
}
