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

//! Mapbox Static Tiles API source.

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

const STYLE_URL_PREFIX: &str = "mapbox://styles/";

/// Raster tiles rendered from a Mapbox style
pub struct MapboxTileSource {
    style: String,
    access_token: String,
}

impl std::fmt::Debug for MapboxTileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxTileSource")
            .field("style", &self.style)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl MapboxTileSource {
    /// Accepts either `owner/style` or a `mapbox://styles/owner/style` URL
    pub fn new(style: &str, access_token: String) -> Self {
        let style = style
            .trim()
            .trim_start_matches(STYLE_URL_PREFIX)
            .trim_matches('/')
            .to_string();
        Self { style, access_token }
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl TileSource for MapboxTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://api.mapbox.com/styles/v1/{}/tiles/256/{}/{}/{}?access_token={}",
            self.style, tile_id.zoom, tile_id.x, tile_id.y, self.access_token
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© Mapbox © OpenStreetMap",
            url: "https://www.mapbox.com/about/maps/",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url() {
        let source = MapboxTileSource::new("mapbox/satellite-streets-v10", "pk.test".to_string());
        assert_eq!(
            source.tile_url(TileId { x: 16, y: 10, zoom: 5 }),
            "https://api.mapbox.com/styles/v1/mapbox/satellite-streets-v10/tiles/256/5/16/10?access_token=pk.test"
        );
    }

    #[test]
    fn test_style_url_is_normalized() {
        let source =
            MapboxTileSource::new("mapbox://styles/mapbox/dark-v10", "pk.test".to_string());
        assert_eq!(source.style(), "mapbox/dark-v10");
    }

    #[test]
    fn test_debug_hides_token() {
        let source = MapboxTileSource::new("mapbox/dark-v10", "pk.secret".to_string());
        assert!(!format!("{source:?}").contains("pk.secret"));
    }
}
