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

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It covers the OpenSky poll settings, the base map provider and the
//! initial viewport. Command-line flags are applied on top after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use opensky_client::{BoundingBox, Credentials, PollerConfig, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "skytrail-desktop";
const CONFIG_NAME: &str = "config";

/// Environment variable that overrides the configured Mapbox token
pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Default Mapbox style (satellite imagery with streets)
pub const DEFAULT_MAP_STYLE: &str = "mapbox/satellite-streets-v10";

/// Initial camera placement
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViewportConfig {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    /// Camera tilt in degrees (the 2D map only supports 0)
    #[serde(default)]
    pub pitch: f64,
    /// Camera rotation in degrees (the 2D map only supports 0)
    #[serde(default)]
    pub bearing: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            longitude: 0.0,
            latitude: 52.0,
            zoom: 5.0,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// OpenSky states endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Query window; `None` fetches the whole world
    #[serde(default = "default_bounding_box")]
    pub bounding_box: Option<BoundingBox>,

    /// Seconds between polls (also the interpolation horizon)
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    /// Animation frame rate
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,

    /// First retry delay after a failed poll
    #[serde(default = "default_retry_initial_delay_secs")]
    pub retry_initial_delay_secs: u64,

    /// Maximum retry delay
    #[serde(default = "default_retry_max_delay_secs")]
    pub retry_max_delay_secs: u64,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// OpenSky account (optional, raises the rate limit)
    #[serde(default)]
    pub opensky_username: Option<String>,

    #[serde(default)]
    pub opensky_password: Option<String>,

    /// Mapbox access token (optional, env var takes precedence)
    #[serde(default)]
    pub mapbox_access_token: Option<String>,

    /// Mapbox style id, e.g. "mapbox/satellite-streets-v10"
    #[serde(default = "default_map_style")]
    pub map_style: String,

    /// Initial camera placement
    #[serde(default)]
    pub initial_view: ViewportConfig,

    /// Aircraft icon size in pixels
    #[serde(default = "default_icon_size")]
    pub icon_size: f32,

    /// Show the status pane on startup
    #[serde(default = "default_true")]
    pub show_status_pane: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

#[allow(clippy::unnecessary_wraps, reason = "serde default for an Option field")]
fn default_bounding_box() -> Option<BoundingBox> {
    // Western and central Europe
    Some(BoundingBox {
        lamin: 43.069,
        lomin: -13.975,
        lamax: 61.164,
        lomax: 30.806,
    })
}

fn default_fetch_interval_secs() -> u64 {
    10
}

fn default_frames_per_second() -> u32 {
    opensky_client::DEFAULT_FRAMES_PER_SECOND
}

fn default_retry_initial_delay_secs() -> u64 {
    5
}

fn default_retry_max_delay_secs() -> u64 {
    120
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_map_style() -> String {
    DEFAULT_MAP_STYLE.to_string()
}

fn default_icon_size() -> f32 {
    20.0
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            endpoint: default_endpoint(),
            bounding_box: default_bounding_box(),
            fetch_interval_secs: default_fetch_interval_secs(),
            frames_per_second: default_frames_per_second(),
            retry_initial_delay_secs: default_retry_initial_delay_secs(),
            retry_max_delay_secs: default_retry_max_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            opensky_username: None,
            opensky_password: None,
            mapbox_access_token: None,
            map_style: default_map_style(),
            initial_view: ViewportConfig::default(),
            icon_size: default_icon_size(),
            show_status_pane: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location or an explicit path
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        let config: AppConfig = match path {
            Some(path) => confy::load_path(path)?,
            None => confy::load(APP_NAME, CONFIG_NAME)?,
        };
        Ok(config.sanitized())
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Replace out-of-range values with defaults
    fn sanitized(mut self) -> Self {
        if let Some(bbox) = self.bounding_box {
            if let Err(e) = bbox.validate() {
                warn!("Ignoring invalid bounding box: {}", e);
                self.bounding_box = None;
            }
        }
        if self.fetch_interval_secs == 0 {
            warn!("fetch_interval_secs must be positive, using default");
            self.fetch_interval_secs = default_fetch_interval_secs();
        }
        if self.frames_per_second == 0 {
            warn!("frames_per_second must be positive, using default");
            self.frames_per_second = default_frames_per_second();
        }
        self
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    /// Build the poll loop configuration
    pub fn poller_config(&self) -> PollerConfig {
        let credentials = match (&self.opensky_username, &self.opensky_password) {
            (Some(username), Some(password)) if !username.is_empty() => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        PollerConfig {
            endpoint: self.endpoint.clone(),
            bounding_box: self.bounding_box,
            fetch_interval: self.fetch_interval(),
            retry_initial_delay: Duration::from_secs(self.retry_initial_delay_secs),
            retry_max_delay: Duration::from_secs(self.retry_max_delay_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            credentials,
            ..Default::default()
        }
    }

    /// Resolve the Mapbox token from environment variable or config
    pub fn resolve_mapbox_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(MAPBOX_TOKEN_ENV) {
            if !token.is_empty() {
                return Some(token);
            }
        }

        self.mapbox_access_token
            .clone()
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let config = AppConfig::default();
        assert_eq!(config.fetch_interval(), Duration::from_secs(10));
        assert_eq!(config.frames_per_second, 30);
        assert_eq!(config.initial_view.latitude, 52.0);
        assert_eq!(config.initial_view.zoom, 5.0);
        assert_eq!(config.map_style, DEFAULT_MAP_STYLE);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"fetch_interval_secs": 20, "bounding_box": null}"#).unwrap();
        assert_eq!(config.fetch_interval_secs, 20);
        assert!(config.bounding_box.is_none());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.show_status_pane);
    }

    #[test]
    fn test_sanitize_rejects_invalid_values() {
        let config = AppConfig {
            fetch_interval_secs: 0,
            frames_per_second: 0,
            bounding_box: Some(BoundingBox { lamin: 60.0, lomin: 0.0, lamax: 40.0, lomax: 10.0 }),
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.fetch_interval_secs, 10);
        assert_eq!(config.frames_per_second, 30);
        assert!(config.bounding_box.is_none());
    }

    #[test]
    fn test_poller_config() {
        let config = AppConfig {
            opensky_username: Some("pilot".to_string()),
            opensky_password: Some("secret".to_string()),
            retry_initial_delay_secs: 2,
            ..Default::default()
        };
        let poller = config.poller_config();

        assert_eq!(poller.fetch_interval, Duration::from_secs(10));
        assert_eq!(poller.retry_initial_delay, Duration::from_secs(2));
        assert_eq!(poller.bounding_box, config.bounding_box);
        assert_eq!(poller.credentials.unwrap().username, "pilot");
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let config = AppConfig {
            opensky_username: Some("pilot".to_string()),
            ..Default::default()
        };
        assert!(config.poller_config().credentials.is_none());
    }
}
