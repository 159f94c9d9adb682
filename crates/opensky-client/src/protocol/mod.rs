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

//! Protocol layer for OpenSky state-vector responses.
//!
//! The `/api/states/all` endpoint answers with `{ "time": .., "states": [[..], ..] }`
//! where every inner array is a positional state vector. This module turns that
//! body into typed [`StateVector`]s and exposes a [`Protocol`] trait so other
//! snapshot formats can be plugged in behind the same seam.

mod states;

pub use states::{BoundingBox, StateVector, StatesParser, StatesSnapshot};

use thiserror::Error;

/// Errors that can occur during response decoding.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid response format: {0}")]
    InvalidFormat(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for field '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for snapshot parsers.
///
/// Implement this trait to add support for other flight-state feeds.
pub trait Protocol {
    /// The message type produced by this parser.
    type Message;
    /// The error type for parsing failures.
    type Error;

    /// Parse input bytes into a message.
    ///
    /// Returns `Ok(Some(message))` if parsing succeeded,
    /// `Ok(None)` if the input is valid but doesn't produce a message,
    /// or `Err(error)` if parsing failed.
    fn parse(&mut self, input: &[u8]) -> Result<Option<Self::Message>, Self::Error>;
}
