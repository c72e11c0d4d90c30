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

use crate::app::App;
use crate::app::permissions::PermissionCollaborator as _;
use crate::ui::message::{LiveTurn, RenderContext};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::Text;
use ratatui::widgets::{Paragraph, Wrap};

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
    let ctx = RenderContext {
        permission: app.permissions.current(),
        permission_selected: app.permission_selected,
        spinner_frame: app.spinner_frame,
        now: app.frame_instant,
    };
    let live = app.accumulator.state().map_or(LiveTurn::Idle, LiveTurn::Segments);
    let lines = app.renderer.render(&app.history, live, &ctx);

    // line_count gives the real wrapped height
    let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let content_height = paragraph.line_count(area.width);

    app.viewport.set_client_height(f32::from(area.height));
    if app.viewport.set_content_height(content_height as f32) {
        app.scroll.observe_content_growth();
    }
    app.scroll.on_frame(app.frame_instant, Some(&mut app.viewport));

    let viewport_height = usize::from(area.height);
    if content_height <= viewport_height {
        // Short content: bottom-aligned sub-rect above the footer
        let offset = (viewport_height - content_height) as u16;
        let render_area =
            Rect { x: area.x, y: area.y + offset, width: area.width, height: content_height as u16 };
        frame.render_widget(paragraph, render_area);
    } else {
        frame.render_widget(paragraph.scroll((app.viewport.row_offset(), 0)), area);
    }
}
