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

//! Map rendering.
//!
//! Base map tile sources (Mapbox styles, CARTO fallback) and the aircraft
//! icon layer drawn on top of them as a `walkers` plugin.

pub mod aircraft_layer;
pub mod carto;
pub mod icon;
pub mod mapbox;

pub use aircraft_layer::{AircraftLayer, HoverHit, HoverSink};
pub use carto::CartoTileSource;
pub use mapbox::MapboxTileSource;

use std::path::PathBuf;

use eframe::egui;
use log::info;
use walkers::sources::TileSource;
use walkers::{HttpOptions, HttpTiles};

use crate::config::APP_NAME;

/// Which provider is serving the base map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseMapProvider {
    Mapbox,
    Carto,
}

/// Base map tiles plus the attribution to display
pub struct BaseMap {
    pub tiles: HttpTiles,
    pub provider: BaseMapProvider,
    pub attribution_text: &'static str,
    pub attribution_url: &'static str,
}

impl std::fmt::Debug for BaseMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseMap")
            .field("provider", &self.provider)
            .field("attribution_text", &self.attribution_text)
            .finish_non_exhaustive()
    }
}

impl BaseMap {
    /// Build the base map, using Mapbox when a token is available
    pub fn new(mapbox_token: Option<String>, map_style: &str, ctx: &egui::Context) -> Self {
        match mapbox_token {
            Some(token) => {
                info!("Using Mapbox base map style {}", map_style);
                let source = MapboxTileSource::new(map_style, token);
                let cache = tile_cache_dir("mapbox").join(source.style().replace('/', "_"));
                Self::with_source(source, BaseMapProvider::Mapbox, cache, ctx)
            }
            None => {
                info!("No Mapbox token configured, using CARTO base map");
                Self::with_source(
                    CartoTileSource,
                    BaseMapProvider::Carto,
                    tile_cache_dir("carto"),
                    ctx,
                )
            }
        }
    }

    fn with_source<S>(
        source: S,
        provider: BaseMapProvider,
        cache: PathBuf,
        ctx: &egui::Context,
    ) -> Self
    where
        S: TileSource + Sync + Send + 'static,
    {
        let attribution = source.attribution();
        let http_options = HttpOptions {
            cache: Some(cache),
            ..Default::default()
        };

        Self {
            tiles: HttpTiles::with_options(source, http_options, ctx.clone()),
            provider,
            attribution_text: attribution.text,
            attribution_url: attribution.url,
        }
    }
}

fn tile_cache_dir(provider: &str) -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join(APP_NAME)
        .join("tiles")
        .join(provider)
}
