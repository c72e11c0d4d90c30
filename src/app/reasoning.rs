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

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Open/close instants recorded by the accumulator for one reasoning segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningTiming {
    /// Arrival of the segment's first delta.
    pub opened_at: Instant,
    /// When a later segment opened or the turn ended.
    pub closed_at: Option<Instant>,
}

impl ReasoningTiming {
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.closed_at.map(|closed| closed.saturating_duration_since(self.opened_at))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningPhase {
    Thinking,
    /// `duration` is `None` when it could not be measured.
    Thought { duration: Option<Duration> },
}

impl ReasoningPhase {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Thought { .. })
    }

    /// Header label. `Thinking` animates its ellipsis with `frame`.
    #[must_use]
    pub fn label(&self, frame: usize) -> String {
        match self {
            Self::Thinking => {
                let dots = ["", ".", "..", "..."][(frame / 4) % 4];
                format!("Thinking{dots}")
            }
            Self::Thought { duration: Some(d) } => format!("Thought for {}s", d.as_secs()),
            Self::Thought { duration: None } => "Thought".to_owned(),
        }
    }
}

/// Per-message reasoning completion state, keyed by segment index.
///
/// A duration is fixed the first time a segment is observed complete and
/// never recomputed on later renders.
#[derive(Debug, Default)]
pub struct ReasoningTracker {
    seen_open: HashMap<usize, Instant>,
    fixed: HashMap<usize, Option<Duration>>,
}

impl ReasoningTracker {
    /// Decide the phase of reasoning segment `index`.
    ///
    /// `is_complete` is false only while the segment is the last one of an
    /// active turn. `recorded` is a duration already frozen into the message.
    pub fn observe(
        &mut self,
        index: usize,
        is_complete: bool,
        timing: Option<ReasoningTiming>,
        recorded: Option<Duration>,
        now: Instant,
    ) -> ReasoningPhase {
        if let Some(duration) = self.fixed.get(&index) {
            return ReasoningPhase::Thought { duration: *duration };
        }

        if !is_complete {
            self.seen_open.entry(index).or_insert_with(|| timing.map_or(now, |t| t.opened_at));
            return ReasoningPhase::Thinking;
        }

        let duration = recorded
            .or_else(|| timing.map(|t| t.closed_at.unwrap_or(now).saturating_duration_since(t.opened_at)))
            .or_else(|| self.seen_open.get(&index).map(|start| now.saturating_duration_since(*start)));
        tracing::trace!(index, ?duration, "reasoning segment completed");
        self.fixed.insert(index, duration);
        ReasoningPhase::Thought { duration }
    }
}
