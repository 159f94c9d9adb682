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

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

const SUBDOMAINS: [char; 4] = ['a', 'b', 'c', 'd'];

/// CARTO dark basemap, used when no Mapbox token is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct CartoTileSource;

impl TileSource for CartoTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let subdomain = SUBDOMAINS[((tile_id.x + tile_id.y) % 4) as usize];

        format!(
            "https://{}.basemaps.cartocdn.com/dark_all/{}/{}/{}.png",
            subdomain, tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors, © CARTO",
            url: "https://carto.com/attributions",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomains_rotate() {
        let a = CartoTileSource.tile_url(TileId { x: 0, y: 0, zoom: 3 });
        let b = CartoTileSource.tile_url(TileId { x: 1, y: 0, zoom: 3 });
        assert_eq!(a, "https://a.basemaps.cartocdn.com/dark_all/3/0/0.png");
        assert_eq!(b, "https://b.basemaps.cartocdn.com/dark_all/3/1/0.png");
    }
}
