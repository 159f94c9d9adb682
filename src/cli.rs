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

use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

/// Live OpenSky aircraft on a map, animated between polls
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(short, long, default_value_t = log::LevelFilter::Info)]
    pub log_level: log::LevelFilter,

    /// Seconds between polls
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_interval: Option<u64>,

    /// Query the whole world instead of the configured bounding box
    #[arg(long, default_value_t = false)]
    pub no_bbox: bool,

    /// Mapbox access token (overrides the config file)
    #[arg(long)]
    pub mapbox_token: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(secs) = self.fetch_interval {
            config.fetch_interval_secs = secs;
        }
        if self.no_bbox {
            config.bounding_box = None;
        }
        if let Some(token) = &self.mapbox_token {
            config.mapbox_access_token = Some(token.clone());
        }
    }
}
