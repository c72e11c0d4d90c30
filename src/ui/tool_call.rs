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

use crate::app::permissions::PERMISSION_OPTIONS;
use crate::app::{COMMAND_TOOLS, FILE_TOOLS, ToolPhase, ToolSegment};
use crate::ui::theme;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Max visible result lines; older lines are hidden behind a count.
const RESULT_MAX_LINES: usize = 12;
/// Max display columns of a single summarized argument value.
const ARG_VALUE_MAX_WIDTH: usize = 80;

fn status_icon(phase: ToolPhase, spinner_frame: usize) -> (&'static str, Color) {
    match phase {
        ToolPhase::ArgsStreaming | ToolPhase::AwaitingResult => {
            (theme::spinner(spinner_frame), theme::RUST_ORANGE)
        }
        ToolPhase::AwaitingPermission => (theme::ICON_AWAITING_PERMISSION, theme::STATUS_WARNING),
        ToolPhase::Completed => (theme::ICON_COMPLETED, theme::RUST_ORANGE),
        ToolPhase::Rejected => (theme::ICON_REJECTED, theme::STATUS_ERROR),
        ToolPhase::Interrupted => (theme::ICON_INTERRUPTED, theme::DIM),
    }
}

fn phase_note(phase: ToolPhase) -> Option<&'static str> {
    match phase {
        ToolPhase::AwaitingPermission => Some("needs permission"),
        ToolPhase::Rejected => Some("declined"),
        ToolPhase::Interrupted => Some("interrupted"),
        ToolPhase::ArgsStreaming | ToolPhase::AwaitingResult | ToolPhase::Completed => None,
    }
}

/// Render one tool call: status line, then `│`-prefixed body ending in `└─`.
pub(super) fn render_tool_call(
    tool: &ToolSegment,
    phase: ToolPhase,
    spinner_frame: usize,
    permission_selected: usize,
) -> Vec<Line<'static>> {
    let (icon, icon_color) = status_icon(phase, spinner_frame);
    let mut title = vec![
        Span::styled(format!("  {icon} "), Style::default().fg(icon_color)),
        Span::styled(
            tool.name.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(note) = phase_note(phase) {
        title.push(Span::styled(format!("  {note}"), Style::default().fg(theme::DIM)));
    }
    if phase == ToolPhase::Completed
        && let Some(ms) = tool.duration_ms
    {
        title.push(Span::styled(format!("  {}", format_duration(ms)), Style::default().fg(theme::DIM)));
    }

    let mut body = args_lines(tool, phase);
    if let Some(result) = &tool.result {
        body.extend(result_lines(result, phase));
    }
    if phase == ToolPhase::AwaitingPermission {
        body.extend(permission_lines(permission_selected));
    }

    let mut lines = vec![Line::from(title)];
    let pipe_style = Style::default().fg(theme::DIM);
    let last_idx = body.len().saturating_sub(1);
    for (i, content_line) in body.into_iter().enumerate() {
        let prefix = if i == last_idx { "  \u{2514}\u{2500} " } else { "  \u{2502}  " };
        let mut spans = vec![Span::styled(prefix, pipe_style)];
        spans.extend(content_line.spans);
        lines.push(Line::from(spans));
    }
    lines
}

/// Raw stream while it is still arriving (or when it failed to parse),
/// otherwise a compact summary of the parsed arguments.
fn args_lines(tool: &ToolSegment, phase: ToolPhase) -> Vec<Line<'static>> {
    let raw_style = Style::default().fg(theme::DIM);
    if phase == ToolPhase::ArgsStreaming || tool.args.is_empty() {
        return match tool.args_raw_stream.as_deref() {
            Some(raw) if !raw.is_empty() => {
                raw.lines().map(|l| Line::from(Span::styled(l.to_owned(), raw_style))).collect()
            }
            _ => Vec::new(),
        };
    }
    summarize_args(tool)
}

fn summarize_args(tool: &ToolSegment) -> Vec<Line<'static>> {
    let field = |key: &str| tool.args.get(key).and_then(Value::as_str);
    if COMMAND_TOOLS.contains(&tool.name.as_str())
        && let Some(command) = field("command")
    {
        return vec![Line::from(vec![
            Span::styled("$ ", Style::default().fg(theme::RUST_ORANGE).add_modifier(Modifier::BOLD)),
            Span::styled(command.to_owned(), Style::default().fg(Color::Yellow)),
        ])];
    }
    if FILE_TOOLS.contains(&tool.name.as_str())
        && let Some(path) = field("path").or_else(|| field("file_path"))
    {
        return vec![Line::from(Span::styled(path.to_owned(), Style::default().fg(Color::White)))];
    }
    tool.args
        .iter()
        .map(|(key, value)| {
            Line::from(vec![
                Span::styled(format!("{key}: "), Style::default().fg(theme::DIM)),
                Span::raw(truncate(&compact_value(value), ARG_VALUE_MAX_WIDTH)),
            ])
        })
        .collect()
}

fn compact_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.lines().next().unwrap_or_default().to_owned(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_owned();
    }
    let room = max_width.saturating_sub(3);
    let mut used = 0;
    let kept: String = text
        .chars()
        .take_while(|ch| {
            used += UnicodeWidthChar::width(*ch).unwrap_or(0);
            used <= room
        })
        .collect();
    format!("{kept}...")
}

fn result_lines(result: &str, phase: ToolPhase) -> Vec<Line<'static>> {
    let style = if phase == ToolPhase::Rejected {
        Style::default().fg(theme::STATUS_ERROR)
    } else {
        Style::default().fg(Color::Gray)
    };
    let all: Vec<&str> = result.lines().collect();
    let mut out = Vec::new();
    let skipped = all.len().saturating_sub(RESULT_MAX_LINES);
    if skipped > 0 {
        out.push(Line::from(Span::styled(
            format!("... {skipped} lines hidden ..."),
            Style::default().fg(theme::DIM),
        )));
    }
    out.extend(all.into_iter().skip(skipped).map(|l| Line::from(Span::styled(l.to_owned(), style))));
    out
}

/// Format: `▸ ✓ Allow once (y)  ·  ✓ Always allow (a)  ·  ✗ Deny (n)`
fn permission_lines(selected: usize) -> Vec<Line<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let dot = Span::styled("  \u{00b7}  ", Style::default().fg(theme::DIM));
    for (i, option) in PERMISSION_OPTIONS.iter().enumerate() {
        let is_selected = i == selected;
        let (icon, icon_color) =
            if option.is_allow() { ("\u{2713}", Color::Green) } else { ("\u{2717}", Color::Red) };
        if i > 0 {
            spans.push(dot.clone());
        }
        if is_selected {
            spans.push(Span::styled(
                "\u{25b8} ",
                Style::default().fg(theme::RUST_ORANGE).add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled(format!("{icon} "), Style::default().fg(icon_color)));
        let name_style = if is_selected {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(option.label(), name_style));
        spans.push(Span::styled(format!(" ({})", option.shortcut()), Style::default().fg(theme::DIM)));
    }
    vec![
        Line::from(spans),
        Line::from(Span::styled(
            "\u{2190}\u{2192} select  enter confirm  esc deny",
            Style::default().fg(theme::DIM),
        )),
    ]
}

#[allow(clippy::cast_precision_loss)]
fn format_duration(ms: u64) -> String {
    if ms < 1000 { format!("{ms}ms") } else { format!("{:.1}s", ms as f64 / 1000.0) }
}
