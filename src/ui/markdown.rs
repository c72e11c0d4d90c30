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

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("rich renderer panicked")]
    Panicked,
    #[error("rich renderer produced no lines for non-empty input")]
    Empty,
}

/// Turns raw segment text into styled lines. Failures are per call; the
/// transcript substitutes raw text for that segment only.
pub trait RichContentRenderer {
    fn render(&self, text: &str) -> Result<Vec<Line<'static>>, RenderError>;
}

/// Markdown via `tui-markdown`, with panics caught and reported as errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownRenderer;

impl RichContentRenderer for MarkdownRenderer {
    fn render(&self, text: &str) -> Result<Vec<Line<'static>>, RenderError> {
        render_guarded(text, render_with_tui_markdown)
    }
}

fn render_guarded<F>(text: &str, renderer: F) -> Result<Vec<Line<'static>>, RenderError>
where
    F: FnOnce(&str) -> Vec<Line<'static>>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| renderer(text))) {
        Ok(lines) if lines.is_empty() && !text.trim().is_empty() => Err(RenderError::Empty),
        Ok(lines) => Ok(lines),
        Err(_) => Err(RenderError::Panicked),
    }
}

fn render_with_tui_markdown(text: &str) -> Vec<Line<'static>> {
    let rendered = tui_markdown::from_str(text);
    rendered
        .lines
        .into_iter()
        .map(|line| {
            let owned_spans: Vec<Span<'static>> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.into_owned(), span.style))
                .collect();
            Line::from(owned_spans).style(line.style)
        })
        .collect()
}

/// Raw text, one line per `\n`, in a single style.
pub fn plain_text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n').map(|line| Line::from(Span::styled(line.to_owned(), style))).collect()
}
