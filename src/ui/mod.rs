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

mod chat;
pub mod markdown;
pub mod message;
pub mod theme;
mod tool_call;

use crate::app::permissions::PermissionCollaborator as _;
use crate::app::{App, AppStatus};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

const FOOTER_PAD: u16 = 2;
const KEY_HINT: &str = "\u{2191}\u{2193} scroll  ctrl+o reasoning  q quit";

pub fn render(frame: &mut Frame, app: &mut App) {
    let [body, separator, footer] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
            .areas(frame.area());

    chat::render(frame, body, app);
    render_separator(frame, separator);
    render_footer(frame, footer, app);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let rule = theme::SEPARATOR_CHAR.repeat(usize::from(area.width));
    frame.render_widget(Paragraph::new(Span::styled(rule, Style::default().fg(theme::DIM))), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let padded = Rect {
        x: area.x + FOOTER_PAD.min(area.width),
        y: area.y,
        width: area.width.saturating_sub(FOOTER_PAD * 2),
        height: area.height,
    };

    let mut left: Vec<Span<'static>> = Vec::new();
    let (status, color) = status_label(app);
    left.push(Span::styled(status, Style::default().fg(color)));
    left.push(Span::styled("  \u{00b7}  ", Style::default().fg(theme::DIM)));
    if app.scroll.should_follow() {
        left.push(Span::styled("following", Style::default().fg(theme::DIM)));
    } else {
        left.push(Span::styled("paused (End to resume)", Style::default().fg(theme::STATUS_WARNING)));
    }
    if app.permissions.current().is_some() {
        left.push(Span::styled("  \u{00b7}  ", Style::default().fg(theme::DIM)));
        left.push(Span::styled(
            "permission: y allow, a always, n deny",
            Style::default().fg(theme::STATUS_WARNING),
        ));
    }

    let left = Line::from(left);
    let hint = Line::from(Span::styled(KEY_HINT, Style::default().fg(theme::DIM)));
    // Status wins on narrow terminals
    if left.width() + hint.width() + usize::from(FOOTER_PAD) > usize::from(padded.width) {
        frame.render_widget(Paragraph::new(left), padded);
        return;
    }
    #[allow(clippy::cast_possible_truncation)]
    let hint_width = hint.width() as u16;
    let [left_area, right_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(hint_width)]).areas(padded);
    frame.render_widget(Paragraph::new(left), left_area);
    frame.render_widget(Paragraph::new(hint.alignment(Alignment::Right)), right_area);
}

fn status_label(app: &App) -> (String, Color) {
    match app.status {
        AppStatus::Streaming => (format!("{} streaming", theme::spinner(app.spinner_frame)), theme::RUST_ORANGE),
        AppStatus::Error => ("last turn failed".to_owned(), theme::STATUS_ERROR),
        AppStatus::Ready if app.replay_finished => ("replay finished".to_owned(), theme::DIM),
        AppStatus::Ready => ("ready".to_owned(), theme::DIM),
    }
}
