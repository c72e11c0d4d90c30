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

use super::follow::{FollowChange, FollowConfig, FollowController, WheelDirection};
use super::scroll_driver::{DriverConfig, DriverTick, FrameScheduler, ScrollDriver};
use super::viewport::{Viewport, ViewportMetrics};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollConfig {
    pub follow: FollowConfig,
    pub driver: DriverConfig,
}

impl ScrollConfig {
    /// Units are terminal rows.
    #[must_use]
    pub fn terminal() -> Self {
        Self {
            follow: FollowConfig { idle_threshold: 1.0, streaming_threshold: 4.0 },
            driver: DriverConfig { epsilon: 0.5, ease_per_ms: 0.015, max_step: 8.0 },
        }
    }

    /// Units are pixels, for hosts with pixel-addressed viewports.
    #[must_use]
    pub fn pixels() -> Self {
        Self {
            follow: FollowConfig { idle_threshold: 40.0, streaming_threshold: 160.0 },
            driver: DriverConfig { epsilon: 0.5, ease_per_ms: 0.012, max_step: 48.0 },
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::terminal()
    }
}

/// Follow controller wired to the driver it starts and stops.
#[derive(Debug)]
pub struct ScrollState {
    follow: FollowController,
    driver: ScrollDriver<FrameScheduler>,
}

impl ScrollState {
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            follow: FollowController::new(config.follow),
            driver: ScrollDriver::new(config.driver, FrameScheduler::default()),
        }
    }

    #[must_use]
    pub fn should_follow(&self) -> bool {
        self.follow.should_follow()
    }

    #[must_use]
    pub fn driver_running(&self) -> bool {
        self.driver.is_running()
    }

    #[must_use]
    pub fn follow(&self) -> &FollowController {
        &self.follow
    }

    #[must_use]
    pub fn driver(&self) -> &ScrollDriver<FrameScheduler> {
        &self.driver
    }

    pub fn observe_scroll(&mut self, metrics: ViewportMetrics) {
        let change = self.follow.on_scroll(metrics);
        self.apply(change);
    }

    pub fn observe_wheel(&mut self, direction: WheelDirection, metrics: ViewportMetrics) {
        let change = self.follow.on_wheel(direction, metrics);
        self.apply(change);
    }

    /// New content was measured. Starts the driver only while following.
    pub fn observe_content_growth(&mut self) {
        if self.follow.should_follow() {
            self.driver.start();
        }
    }

    pub fn begin_turn(&mut self, metrics: ViewportMetrics) {
        let change = self.follow.on_turn_start(metrics);
        self.apply(change);
    }

    pub fn end_turn(&mut self) {
        self.follow.on_turn_end();
    }

    /// Deliver this frame's tick, if one is due, and report the driver's
    /// own viewport writes back to the controller.
    pub fn on_frame(&mut self, now: Instant, viewport: Option<&mut dyn Viewport>) -> Option<DriverTick> {
        let handle = self.driver.scheduler_mut().take_due()?;
        let Some(viewport) = viewport else {
            return Some(self.driver.tick(handle, now, None));
        };
        let tick = self.driver.tick(handle, now, Some(&mut *viewport));
        if matches!(tick, DriverTick::Advanced { .. } | DriverTick::Settled) {
            let change = self.follow.on_scroll(viewport.metrics());
            self.apply(change);
        }
        Some(tick)
    }

    /// Conversation switch: cancel any animation and follow again.
    pub fn reset(&mut self) {
        self.driver.stop();
        self.follow.reset();
    }

    fn apply(&mut self, change: FollowChange) {
        match change {
            FollowChange::Disabled => self.driver.stop(),
            FollowChange::Enabled => self.driver.start(),
            FollowChange::Unchanged => {}
        }
    }
}
