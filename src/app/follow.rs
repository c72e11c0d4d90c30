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

//! Decides whether the viewport keeps tracking the bottom.
//!
//! Rules, highest priority first:
//! 1. an upward gesture stops following immediately;
//! 2. a scroll or gesture that leaves the viewport within the threshold of the
//!    bottom starts following;
//! 3. while a turn streams the threshold is the larger `streaming_threshold`.
//!
//! A scroll event that moves the viewport up and ends outside the threshold
//! (scrollbar drag, keyboard paging) also stops following. Content growth is
//! not a scroll event and never changes the decision.

use super::viewport::ViewportMetrics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowConfig {
    /// "At the bottom" distance while no turn is streaming.
    pub idle_threshold: f32,
    /// "At the bottom" distance while a turn is streaming.
    pub streaming_threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    /// Toward earlier content.
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowChange {
    Unchanged,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone)]
pub struct FollowController {
    config: FollowConfig,
    should_follow: bool,
    streaming: bool,
    last_scroll_top: Option<f32>,
}

impl FollowController {
    #[must_use]
    pub fn new(config: FollowConfig) -> Self {
        Self { config, should_follow: true, streaming: false, last_scroll_top: None }
    }

    #[must_use]
    pub fn should_follow(&self) -> bool {
        self.should_follow
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        if self.streaming { self.config.streaming_threshold } else { self.config.idle_threshold }
    }

    #[must_use]
    pub fn is_near_bottom(&self, metrics: ViewportMetrics) -> bool {
        metrics.distance_from_bottom() < self.threshold()
    }

    /// Viewport scroll event (user or programmatic).
    pub fn on_scroll(&mut self, metrics: ViewportMetrics) -> FollowChange {
        let moved_up = self.last_scroll_top.is_some_and(|prev| metrics.scroll_top < prev);
        self.last_scroll_top = Some(metrics.scroll_top);
        if self.is_near_bottom(metrics) {
            self.set(true)
        } else if moved_up {
            self.set(false)
        } else {
            FollowChange::Unchanged
        }
    }

    /// Explicit wheel gesture, reported with the metrics after it applied.
    pub fn on_wheel(&mut self, direction: WheelDirection, metrics: ViewportMetrics) -> FollowChange {
        self.last_scroll_top = Some(metrics.scroll_top);
        match direction {
            WheelDirection::Up => self.set(false),
            WheelDirection::Down if self.is_near_bottom(metrics) => self.set(true),
            WheelDirection::Down => FollowChange::Unchanged,
        }
    }

    /// A streaming turn begins: switch to the streaming threshold and re-evaluate.
    pub fn on_turn_start(&mut self, metrics: ViewportMetrics) -> FollowChange {
        self.streaming = true;
        self.last_scroll_top = Some(metrics.scroll_top);
        if self.is_near_bottom(metrics) { self.set(true) } else { FollowChange::Unchanged }
    }

    pub fn on_turn_end(&mut self) {
        self.streaming = false;
    }

    pub fn reset(&mut self) {
        self.should_follow = true;
        self.streaming = false;
        self.last_scroll_top = None;
    }

    fn set(&mut self, follow: bool) -> FollowChange {
        if self.should_follow == follow {
            return FollowChange::Unchanged;
        }
        self.should_follow = follow;
        tracing::debug!(follow, streaming = self.streaming, "follow state changed");
        if follow { FollowChange::Enabled } else { FollowChange::Disabled }
    }
}
