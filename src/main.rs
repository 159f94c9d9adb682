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

mod app;
mod cli;
mod config;
mod logging;
mod map;
mod status;
mod ui;
mod view_state;

use clap::Parser;
use eframe::egui;
use log::{info, warn};
use mimalloc::MiMalloc;
use opensky_client::Poller;

use crate::app::SkyTrailApp;
use crate::cli::Cli;
use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::setup_logging(cli.log_level);

    info!("Starting SkyTrail Desktop...");

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config, using defaults: {}", e);
            AppConfig::default()
        }
    };
    cli.apply_overrides(&mut config);

    match AppConfig::get_config_path() {
        Ok(path) if cli.config.is_none() => info!("Config file: {}", path.display()),
        _ => {}
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let poller = {
        let _guard = runtime.enter();
        Poller::spawn(config.poller_config())?
    };
    info!(
        "Polling {} every {}s ({:?})",
        config.endpoint,
        config.fetch_interval_secs,
        config.bounding_box
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("SkyTrail Desktop"),
        ..Default::default()
    };

    eframe::run_native(
        "SkyTrail Desktop",
        options,
        Box::new(move |cc| Ok(Box::new(SkyTrailApp::new(&cc.egui_ctx, &config, runtime, poller)))),
    )?;

    Ok(())
}
