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

/// Snapshot of a scrollable viewport, in viewport units (rows for the terminal).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    pub scroll_height: f32,
    pub client_height: f32,
}

impl ViewportMetrics {
    #[must_use]
    pub fn max_scroll_top(&self) -> f32 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// `scroll_height - scroll_top - client_height`, never negative.
    #[must_use]
    pub fn distance_from_bottom(&self) -> f32 {
        (self.max_scroll_top() - self.scroll_top).max(0.0)
    }
}

/// What the scroll driver mutates.
pub trait Viewport {
    fn metrics(&self) -> ViewportMetrics;
    fn set_scroll_top(&mut self, scroll_top: f32);
}

/// Scroll geometry of the chat pane. Writes are clamped to `[0, max_scroll_top]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatViewport {
    scroll_top: f32,
    content_height: f32,
    client_height: f32,
}

impl ChatViewport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update content height after a render. Returns true when content grew.
    pub fn set_content_height(&mut self, height: f32) -> bool {
        let grew = height > self.content_height;
        self.content_height = height.max(0.0);
        self.clamp();
        grew
    }

    pub fn set_client_height(&mut self, height: f32) {
        self.client_height = height.max(0.0);
        self.clamp();
    }

    /// Move by `delta` units (negative scrolls toward earlier content).
    pub fn scroll_by(&mut self, delta: f32) {
        self.set_scroll_top(self.scroll_top + delta);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.metrics().max_scroll_top();
    }

    /// First visible row for the terminal renderer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn row_offset(&self) -> u16 {
        self.scroll_top.round().clamp(0.0, f32::from(u16::MAX)) as u16
    }

    pub fn reset(&mut self) {
        self.scroll_top = 0.0;
        self.content_height = 0.0;
    }

    fn clamp(&mut self) {
        self.scroll_top = self.scroll_top.clamp(0.0, self.metrics().max_scroll_top());
    }
}

impl Viewport for ChatViewport {
    fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics {
            scroll_top: self.scroll_top,
            scroll_height: self.content_height,
            client_height: self.client_height,
        }
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = scroll_top;
        self.clamp();
    }
}
