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

//! OpenSky `/api/states/all` response parser.
//!
//! Row layout (from the OpenSky REST documentation):
//! ```text
//! 0 icao24, 1 callsign, 2 origin_country, 3 time_position, 4 last_contact,
//! 5 longitude, 6 latitude, 7 baro_altitude, 8 on_ground, 9 velocity,
//! 10 true_track, 11 vertical_rate, 12 sensors, 13 geo_altitude, 14 squawk,
//! 15 spi, 16 position_source
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ParseError, Protocol};

const IDX_ICAO24: usize = 0;
const IDX_CALLSIGN: usize = 1;
const IDX_ORIGIN_COUNTRY: usize = 2;
const IDX_LAST_CONTACT: usize = 4;
const IDX_LONGITUDE: usize = 5;
const IDX_LATITUDE: usize = 6;
const IDX_BARO_ALTITUDE: usize = 7;
const IDX_ON_GROUND: usize = 8;
const IDX_VELOCITY: usize = 9;
const IDX_TRUE_TRACK: usize = 10;
const IDX_VERTICAL_RATE: usize = 11;
const IDX_GEO_ALTITUDE: usize = 13;
const IDX_SQUAWK: usize = 14;

/// Geographic query window for the states endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude in degrees.
    pub lamin: f64,
    /// Minimum longitude in degrees.
    pub lomin: f64,
    /// Maximum latitude in degrees.
    pub lamax: f64,
    /// Maximum longitude in degrees.
    pub lomax: f64,
}

impl BoundingBox {
    /// Create a validated bounding box.
    pub fn new(lamin: f64, lomin: f64, lamax: f64, lomax: f64) -> Result<Self, ParseError> {
        let bbox = Self { lamin, lomin, lamax, lomax };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check ordering and coordinate ranges.
    pub fn validate(&self) -> Result<(), ParseError> {
        let lat_ok = |v: f64| (-90.0..=90.0).contains(&v);
        let lon_ok = |v: f64| (-180.0..=180.0).contains(&v);

        if !lat_ok(self.lamin) || !lat_ok(self.lamax) || self.lamin > self.lamax {
            return Err(ParseError::InvalidValue {
                field: "lamin/lamax",
                value: format!("{}..{}", self.lamin, self.lamax),
            });
        }
        if !lon_ok(self.lomin) || !lon_ok(self.lomax) || self.lomin > self.lomax {
            return Err(ParseError::InvalidValue {
                field: "lomin/lomax",
                value: format!("{}..{}", self.lomin, self.lomax),
            });
        }
        Ok(())
    }

    /// Query parameters in the order the API documents them.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("lamin", self.lamin.to_string()),
            ("lomin", self.lomin.to_string()),
            ("lamax", self.lamax.to_string()),
            ("lomax", self.lomax.to_string()),
        ]
    }
}

/// One decoded state-vector row.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// ICAO 24-bit address (lowercase hex string, e.g. "abc123").
    pub icao24: String,
    /// Callsign with the upstream space padding removed.
    pub callsign: Option<String>,
    /// Country inferred from the ICAO address.
    pub origin_country: String,
    /// Unix timestamp of the last message received from this transponder.
    pub last_contact: Option<i64>,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Barometric altitude in meters.
    pub baro_altitude: Option<f64>,
    /// Whether the position came from a surface report.
    pub on_ground: bool,
    /// Ground speed in meters per second.
    pub velocity: Option<f64>,
    /// Track in degrees clockwise from north.
    pub true_track: Option<f64>,
    /// Vertical rate in meters per second.
    pub vertical_rate: Option<f64>,
    /// Geometric altitude in meters.
    pub geo_altitude: Option<f64>,
    /// Transponder code.
    pub squawk: Option<String>,
}

impl StateVector {
    /// Decode one positional row.
    ///
    /// Rows without a position are rejected, everything else besides the
    /// ICAO address is optional.
    pub fn from_row(row: &[Value]) -> Result<Self, ParseError> {
        let icao24 = opt_str(row, IDX_ICAO24, "icao24")?
            .filter(|s| !s.trim().is_empty())
            .ok_or(ParseError::MissingField("icao24"))?
            .trim()
            .to_lowercase();

        let callsign = opt_str(row, IDX_CALLSIGN, "callsign")?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let longitude =
            opt_f64(row, IDX_LONGITUDE, "longitude")?.ok_or(ParseError::MissingField("longitude"))?;
        let latitude =
            opt_f64(row, IDX_LATITUDE, "latitude")?.ok_or(ParseError::MissingField("latitude"))?;

        Ok(Self {
            icao24,
            callsign,
            origin_country: opt_str(row, IDX_ORIGIN_COUNTRY, "origin_country")?
                .unwrap_or_default()
                .to_string(),
            last_contact: opt_i64(row, IDX_LAST_CONTACT, "last_contact")?,
            longitude,
            latitude,
            baro_altitude: opt_f64(row, IDX_BARO_ALTITUDE, "baro_altitude")?,
            on_ground: opt_bool(row, IDX_ON_GROUND, "on_ground")?.unwrap_or(false),
            velocity: opt_f64(row, IDX_VELOCITY, "velocity")?,
            true_track: opt_f64(row, IDX_TRUE_TRACK, "true_track")?,
            vertical_rate: opt_f64(row, IDX_VERTICAL_RATE, "vertical_rate")?,
            geo_altitude: opt_f64(row, IDX_GEO_ALTITUDE, "geo_altitude")?,
            squawk: opt_str(row, IDX_SQUAWK, "squawk")?.map(str::to_string),
        })
    }
}

/// A decoded response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatesSnapshot {
    /// Server time the snapshot refers to (Unix seconds).
    pub time: Option<i64>,
    /// Rows that decoded successfully.
    pub states: Vec<StateVector>,
    /// Number of rows that were dropped.
    pub rejected: usize,
}

#[derive(Debug, Deserialize)]
struct RawStatesResponse {
    time: Option<i64>,
    states: Option<Vec<Vec<Value>>>,
}

/// Parser for `/api/states/all` response bodies.
#[derive(Debug, Default)]
pub struct StatesParser;

impl StatesParser {
    /// Create a new states parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Protocol for StatesParser {
    type Message = StatesSnapshot;
    type Error = ParseError;

    /// A `null` states array (nothing inside the query window) yields `Ok(None)`.
    fn parse(&mut self, input: &[u8]) -> Result<Option<StatesSnapshot>, ParseError> {
        let raw: RawStatesResponse = serde_json::from_slice(input)?;

        let Some(rows) = raw.states else {
            return Ok(None);
        };

        let mut snapshot = StatesSnapshot {
            time: raw.time,
            states: Vec::with_capacity(rows.len()),
            rejected: 0,
        };

        for row in &rows {
            match StateVector::from_row(row) {
                Ok(state) => snapshot.states.push(state),
                Err(e) => {
                    debug!("Dropping state vector: {}", e);
                    snapshot.rejected += 1;
                }
            }
        }

        Ok(Some(snapshot))
    }
}

fn field<'a>(row: &'a [Value], idx: usize) -> Option<&'a Value> {
    row.get(idx).filter(|v| !v.is_null())
}

fn invalid(field: &'static str, value: &Value) -> ParseError {
    ParseError::InvalidValue { field, value: value.to_string() }
}

fn opt_f64(row: &[Value], idx: usize, name: &'static str) -> Result<Option<f64>, ParseError> {
    match field(row, idx) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(name, v)),
    }
}

fn opt_i64(row: &[Value], idx: usize, name: &'static str) -> Result<Option<i64>, ParseError> {
    match field(row, idx) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| invalid(name, v)),
    }
}

fn opt_bool(row: &[Value], idx: usize, name: &'static str) -> Result<Option<bool>, ParseError> {
    match field(row, idx) {
        None => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| invalid(name, v)),
    }
}

fn opt_str<'a>(
    row: &'a [Value],
    idx: usize,
    name: &'static str,
) -> Result<Option<&'a str>, ParseError> {
    match field(row, idx) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| invalid(name, v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row() -> Value {
        json!([
            "abc123", "TEST01  ", "United Kingdom", 1_700_000_000, 1_700_000_001,
            0.0, 52.0, 9900.0, false, 200.0, 90.0, -1.5, null, 10000.0, "7000", false, 0
        ])
    }

    #[test]
    fn test_parse_state_vector() {
        let row = sample_row();
        let state = StateVector::from_row(row.as_array().unwrap()).unwrap();

        assert_eq!(state.icao24, "abc123");
        assert_eq!(state.callsign.as_deref(), Some("TEST01"));
        assert_eq!(state.origin_country, "United Kingdom");
        assert_eq!(state.last_contact, Some(1_700_000_001));
        assert!((state.longitude - 0.0).abs() < f64::EPSILON);
        assert!((state.latitude - 52.0).abs() < f64::EPSILON);
        assert_eq!(state.velocity, Some(200.0));
        assert_eq!(state.true_track, Some(90.0));
        assert_eq!(state.geo_altitude, Some(10000.0));
        assert_eq!(state.baro_altitude, Some(9900.0));
        assert_eq!(state.vertical_rate, Some(-1.5));
        assert_eq!(state.squawk.as_deref(), Some("7000"));
        assert!(!state.on_ground);
    }

    #[test]
    fn test_missing_position_rejected() {
        let row = json!(["abc123", "TEST01", "UK", null, null, null, null]);
        let err = StateVector::from_row(row.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("longitude")));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let row = json!(["abc123", "TEST01", "UK", null, null, "east", 52.0]);
        let err = StateVector::from_row(row.as_array().unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { field: "longitude", .. }));
    }

    #[test]
    fn test_short_row_treats_tail_as_null() {
        let row = json!(["ABC123", null, "UK", null, null, 1.0, 2.0]);
        let state = StateVector::from_row(row.as_array().unwrap()).unwrap();
        assert_eq!(state.icao24, "abc123");
        assert!(state.callsign.is_none());
        assert!(state.velocity.is_none());
        assert!(state.true_track.is_none());
    }

    #[test]
    fn test_parse_response_skips_bad_rows() {
        let body = json!({
            "time": 1_700_000_001,
            "states": [
                sample_row(),
                ["def456", "BAD", "UK", null, null, null, null],
            ]
        });
        let mut parser = StatesParser::new();
        let snapshot = parser.parse(body.to_string().as_bytes()).unwrap().unwrap();

        assert_eq!(snapshot.time, Some(1_700_000_001));
        assert_eq!(snapshot.states.len(), 1);
        assert_eq!(snapshot.rejected, 1);
    }

    #[test]
    fn test_null_states() {
        let mut parser = StatesParser::new();
        let result = parser.parse(br#"{"time": 1, "states": null}"#).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_malformed_body() {
        let mut parser = StatesParser::new();
        assert!(matches!(parser.parse(b"<html>"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_bounding_box_validation() {
        assert!(BoundingBox::new(43.069, -13.975, 61.164, 30.806).is_ok());
        assert!(BoundingBox::new(61.0, -13.0, 43.0, 30.0).is_err());
        assert!(BoundingBox::new(43.0, -200.0, 61.0, 30.0).is_err());
    }

    #[test]
    fn test_bounding_box_query_pairs() {
        let bbox = BoundingBox::new(43.069, -13.975, 61.164, 30.806).unwrap();
        let pairs = bbox.query_pairs();
        assert_eq!(pairs[0], ("lamin", "43.069".to_string()));
        assert_eq!(pairs[3], ("lomax", "30.806".to_string()));
    }
}
