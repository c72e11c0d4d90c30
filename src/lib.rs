// live_transcript — Streaming transcript engine for assistant chat clients
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

pub mod agent;
pub mod app;
pub mod error;
pub mod ui;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-replay",
    about = "Replay a recorded assistant stream through the live transcript renderer"
)]
pub struct Cli {
    /// JSON-lines file of recorded stream events
    pub replay: PathBuf,

    /// Playback speed multiplier applied to recorded delays
    #[arg(long, default_value_t = 1.0)]
    pub speed: f32,

    /// Ignore recorded delays and deliver every event immediately
    #[arg(long)]
    pub no_delay: bool,

    /// Distance from bottom (rows) that counts as "at the bottom" while idle
    #[arg(long)]
    pub idle_threshold: Option<f32>,

    /// Distance from bottom (rows) that counts as "at the bottom" while streaming
    #[arg(long)]
    pub streaming_threshold: Option<f32>,

    /// Maximum rows the follow animation may advance per frame
    #[arg(long)]
    pub max_step: Option<f32>,

    /// Write tracing diagnostics to a file (disabled unless explicitly set)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Tracing filter directives (example: `info,live_transcript::app=debug`)
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Append to `--log-file` instead of truncating on startup
    #[arg(long)]
    pub log_append: bool,
}

impl Cli {
    /// Scroll tuning for the terminal host, with CLI overrides applied.
    #[must_use]
    pub fn scroll_config(&self) -> app::ScrollConfig {
        let mut config = app::ScrollConfig::terminal();
        if let Some(idle) = self.idle_threshold {
            config.follow.idle_threshold = idle.max(0.0);
        }
        if let Some(streaming) = self.streaming_threshold {
            config.follow.streaming_threshold = streaming.max(0.0);
        }
        if let Some(step) = self.max_step {
            config.driver.max_step = step.max(config.driver.epsilon);
        }
        config
    }
}
