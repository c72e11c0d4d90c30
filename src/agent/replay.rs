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

//! Recorded stream playback.
//!
//! A replay file is JSON lines: one [`WireEvent`] per line, optionally carrying
//! `delay_ms` (wait before delivering that event). Blank lines are skipped.
//!
//! ```text
//! {"type":"turn_start"}
//! {"type":"reasoning_delta","text":"Looking at the repo","delay_ms":40}
//! {"type":"tool_start","id":"t1","name":"bash"}
//! ```

use super::events::{ClientEvent, WireEvent};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read replay file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("replay line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRecord {
    pub delay: Duration,
    pub event: ClientEvent,
}

/// Delivery pacing for recorded delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub speed: f32,
    pub skip_delays: bool,
}

impl Default for Pacing {
    fn default() -> Self {
        Self { speed: 1.0, skip_delays: false }
    }
}

impl Pacing {
    #[must_use]
    pub fn scaled(&self, delay: Duration) -> Duration {
        if self.skip_delays || delay.is_zero() {
            return Duration::ZERO;
        }
        if self.speed <= f32::EPSILON || !self.speed.is_finite() {
            return delay;
        }
        delay.div_f32(self.speed)
    }
}

pub fn parse_replay(input: &str) -> Result<Vec<ReplayRecord>, ReplayError> {
    let mut records = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let mut value: serde_json::Value =
            serde_json::from_str(raw).map_err(|source| ReplayError::Decode { line, source })?;
        let delay_ms = value
            .as_object_mut()
            .and_then(|obj| obj.remove("delay_ms"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let wire: WireEvent =
            serde_json::from_value(value).map_err(|source| ReplayError::Decode { line, source })?;
        records.push(ReplayRecord { delay: Duration::from_millis(delay_ms), event: wire.into() });
    }
    tracing::debug!(records = records.len(), "parsed replay");
    Ok(records)
}

pub async fn load_replay(path: &Path) -> Result<Vec<ReplayRecord>, ReplayError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    parse_replay(&text)
}

/// Deliver records in order over the event channel, honoring pacing.
///
/// Sends `ReplayFinished` once every record is delivered. Stops early when the
/// receiving side is gone.
pub async fn run_replay(
    records: Vec<ReplayRecord>,
    tx: mpsc::UnboundedSender<ClientEvent>,
    pacing: Pacing,
) {
    let total = records.len();
    for (i, record) in records.into_iter().enumerate() {
        let delay = pacing.scaled(record.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if tx.send(record.event).is_err() {
            tracing::info!(delivered = i, total, "replay receiver closed; stopping playback");
            return;
        }
    }
    let _ = tx.send(ClientEvent::ReplayFinished);
    tracing::info!(total, "replay finished");
}
