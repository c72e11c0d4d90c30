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

//! Per-frame easing of the viewport toward the bottom.
//!
//! The driver chases a moving target: every tick re-reads the viewport, so
//! content that grows mid-animation is picked up without restarting.

use super::viewport::Viewport;
use std::time::Instant;

/// Frame length assumed for the first tick after a start.
const NOMINAL_FRAME_MS: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

pub trait Scheduler {
    /// Request one callback on the next frame.
    fn schedule_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
}

/// Frame-polled scheduler: the render loop calls [`FrameScheduler::take_due`]
/// once per frame and hands the handle to the driver.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Vec<TickHandle>,
    scheduled: u64,
    cancelled: u64,
}

impl FrameScheduler {
    /// Oldest pending tick, removed from the queue.
    pub fn take_due(&mut self) -> Option<TickHandle> {
        if self.pending.is_empty() { None } else { Some(self.pending.remove(0)) }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn scheduled(&self) -> u64 {
        self.scheduled
    }

    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for FrameScheduler {
    fn schedule_tick(&mut self) -> TickHandle {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.pending.push(handle);
        self.scheduled += 1;
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle) {
        if let Some(pos) = self.pending.iter().position(|h| *h == handle) {
            self.pending.remove(pos);
            self.cancelled += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverConfig {
    /// Distance below which the driver snaps to the bottom and stops.
    pub epsilon: f32,
    /// Fraction of the remaining distance covered per elapsed millisecond.
    pub ease_per_ms: f32,
    /// Upper bound on a single tick's movement.
    pub max_step: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverTick {
    /// Handle did not belong to the running animation.
    Stale,
    /// Moved part of the way; another tick is scheduled.
    Advanced { scroll_top: f32 },
    /// Reached the bottom and stopped.
    Settled,
    /// No viewport to drive; stopped.
    Detached,
}

#[derive(Debug)]
pub struct ScrollDriver<S: Scheduler> {
    config: DriverConfig,
    scheduler: S,
    handle: Option<TickHandle>,
    last_tick: Option<Instant>,
}

impl<S: Scheduler> ScrollDriver<S> {
    pub fn new(config: DriverConfig, scheduler: S) -> Self {
        Self { config, scheduler, handle: None, last_tick: None }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// No-op while already running.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        tracing::trace!("scroll driver started");
        self.last_tick = None;
        self.handle = Some(self.scheduler.schedule_tick());
    }

    /// No-op while stopped. Always clears the pending handle.
    pub fn stop(&mut self) {
        self.last_tick = None;
        if let Some(handle) = self.handle.take() {
            tracing::trace!("scroll driver stopped");
            self.scheduler.cancel_tick(handle);
        }
    }

    pub fn tick(
        &mut self,
        handle: TickHandle,
        now: Instant,
        viewport: Option<&mut dyn Viewport>,
    ) -> DriverTick {
        if self.handle != Some(handle) {
            return DriverTick::Stale;
        }
        self.handle = None;

        let Some(viewport) = viewport else {
            self.last_tick = None;
            return DriverTick::Detached;
        };

        let metrics = viewport.metrics();
        let target = metrics.max_scroll_top();
        let distance = target - metrics.scroll_top;
        if distance.abs() < self.config.epsilon || distance < 0.0 {
            viewport.set_scroll_top(target);
            self.last_tick = None;
            return DriverTick::Settled;
        }

        let elapsed_ms = self
            .last_tick
            .map_or(NOMINAL_FRAME_MS, |prev| now.saturating_duration_since(prev).as_secs_f32() * 1000.0);
        let step = self.step(distance, elapsed_ms);
        let scroll_top = metrics.scroll_top + step;
        viewport.set_scroll_top(scroll_top);

        self.last_tick = Some(now);
        self.handle = Some(self.scheduler.schedule_tick());
        DriverTick::Advanced { scroll_top: viewport.metrics().scroll_top }
    }

    /// Eased, time-normalized step. Never exceeds `distance`; always makes
    /// at least `epsilon` of progress so a zero-length frame cannot stall.
    fn step(&self, distance: f32, elapsed_ms: f32) -> f32 {
        let fraction = (elapsed_ms * self.config.ease_per_ms).clamp(0.0, 1.0);
        (distance * fraction)
            .min(self.config.max_step)
            .max(self.config.epsilon.min(distance))
            .min(distance)
    }
}
