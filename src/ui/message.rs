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

use crate::app::permissions::PermissionRequest;
use crate::app::{
    Message, MessageRole, ReasoningPhase, ReasoningTracker, Segment, StreamingState, ToolSegment,
    tool_phase,
};
use crate::ui::markdown::{MarkdownRenderer, RichContentRenderer, plain_text_lines};
use crate::ui::theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::time::{Duration, Instant};

/// Tracker key for the single reasoning block of a legacy message.
const LEGACY_REASONING_INDEX: usize = usize::MAX;

/// What is currently streaming, if anything.
#[derive(Debug, Clone, Copy)]
pub enum LiveTurn<'a> {
    Idle,
    /// Ordered segments from the accumulator.
    Segments(&'a StreamingState),
    /// For library hosts that still stream the legacy content/reasoning/tools
    /// shape. The bundled client only produces `Segments`.
    Legacy(&'a Message),
}

/// Per-frame inputs that are not part of the transcript itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub permission: Option<&'a PermissionRequest>,
    pub permission_selected: usize,
    pub spinner_frame: usize,
    pub now: Instant,
}

/// Lines of a finalized message. Empty until first rendered and after `invalidate`.
#[derive(Debug, Default)]
pub struct BlockCache {
    lines: Option<Vec<Line<'static>>>,
}

impl BlockCache {
    pub fn invalidate(&mut self) {
        self.lines = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<&Vec<Line<'static>>> {
        self.lines.as_ref()
    }

    pub fn store(&mut self, lines: Vec<Line<'static>>) {
        self.lines = Some(lines);
    }
}

/// Render-local state of one message, kept across frames.
#[derive(Debug, Default)]
pub struct MessageRenderState {
    pub reasoning: ReasoningTracker,
    /// Show reasoning bodies once finalized. Streaming reasoning is always shown.
    pub reasoning_expanded: bool,
    /// Never filled while the message streams.
    pub cache: BlockCache,
}

impl MessageRenderState {
    fn new(reasoning_expanded: bool) -> Self {
        Self { reasoning_expanded, ..Self::default() }
    }

    fn set_reasoning_expanded(&mut self, expanded: bool) {
        if self.reasoning_expanded != expanded {
            self.reasoning_expanded = expanded;
            self.cache.invalidate();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LiveKey {
    Turn(u64),
    Legacy(String),
}

#[derive(Debug)]
struct LiveSlot {
    key: LiveKey,
    message_id: String,
    state: MessageRenderState,
}

/// Turns history plus the live turn into lines, one frame at a time.
///
/// History state is kept by position, not by message id: ids come from the
/// delta source and may repeat across turns. The live turn's state moves to
/// its history position once the finalized message shows up there.
#[derive(Debug, Default)]
pub struct TranscriptRenderer<R: RichContentRenderer = MarkdownRenderer> {
    rich: R,
    history: Vec<MessageRenderState>,
    live: Option<LiveSlot>,
    reasoning_expanded: bool,
}

impl<R: RichContentRenderer> TranscriptRenderer<R> {
    pub fn new(rich: R) -> Self {
        Self { rich, history: Vec::new(), live: None, reasoning_expanded: false }
    }

    /// Drop all per-message state (conversation switch). The reasoning
    /// preference is kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.live = None;
    }

    #[must_use]
    pub fn history_state(&self, position: usize) -> Option<&MessageRenderState> {
        self.history.get(position)
    }

    #[must_use]
    pub fn live_state(&self) -> Option<&MessageRenderState> {
        self.live.as_ref().map(|slot| &slot.state)
    }

    #[must_use]
    pub fn reasoning_expanded(&self) -> bool {
        self.reasoning_expanded
    }

    /// Flip whether finalized reasoning bodies are shown, for every message.
    /// Returns the new setting.
    pub fn toggle_reasoning(&mut self) -> bool {
        self.reasoning_expanded = !self.reasoning_expanded;
        let expanded = self.reasoning_expanded;
        let live = self.live.as_mut().map(|slot| &mut slot.state);
        for state in self.history.iter_mut().chain(live) {
            state.set_reasoning_expanded(expanded);
        }
        expanded
    }

    pub fn render(
        &mut self,
        history: &[Message],
        live: LiveTurn<'_>,
        ctx: &RenderContext<'_>,
    ) -> Vec<Line<'static>> {
        if self.history.len() > history.len() {
            tracing::debug!(
                known = self.history.len(),
                messages = history.len(),
                "history shrank; dropping render state"
            );
            self.history.clear();
        }

        let mut out = Vec::new();
        for (position, msg) in history.iter().enumerate() {
            if position == self.history.len() {
                let state = self.adopt_live(msg);
                self.history.push(state);
            }
            let state = &mut self.history[position];
            if let Some(cached) = state.cache.get() {
                out.extend_from_slice(cached);
                continue;
            }
            let mut lines = Vec::new();
            render_message(&self.rich, state, msg, false, ctx, &mut lines);
            out.extend_from_slice(&lines);
            state.cache.store(lines);
        }

        match live {
            LiveTurn::Idle => self.live = None,
            LiveTurn::Segments(streaming) => {
                let key = LiveKey::Turn(streaming.turn);
                let state =
                    live_slot(&mut self.live, key, &streaming.message_id, self.reasoning_expanded);
                render_streaming(&self.rich, state, streaming, ctx, &mut out);
            }
            LiveTurn::Legacy(msg) => {
                let key = LiveKey::Legacy(msg.id.clone());
                let state = live_slot(&mut self.live, key, &msg.id, self.reasoning_expanded);
                render_message(&self.rich, state, msg, true, ctx, &mut out);
            }
        }
        out
    }

    /// State for a message newly appended to history: the live turn's, when
    /// this is that turn finalized, otherwise fresh.
    fn adopt_live(&mut self, msg: &Message) -> MessageRenderState {
        match self.live.take() {
            Some(slot) if slot.message_id == msg.id => slot.state,
            other => {
                self.live = other;
                MessageRenderState::new(self.reasoning_expanded)
            }
        }
    }
}

fn live_slot<'s>(
    slot: &'s mut Option<LiveSlot>,
    key: LiveKey,
    message_id: &str,
    reasoning_expanded: bool,
) -> &'s mut MessageRenderState {
    if slot.as_ref().is_some_and(|live| live.key != key) {
        *slot = None;
    }
    let live = slot.get_or_insert_with(|| LiveSlot {
        key,
        message_id: message_id.to_owned(),
        state: MessageRenderState::new(reasoning_expanded),
    });
    &mut live.state
}

fn render_message<R: RichContentRenderer>(
    rich: &R,
    state: &mut MessageRenderState,
    msg: &Message,
    streaming: bool,
    ctx: &RenderContext<'_>,
    out: &mut Vec<Line<'static>>,
) {
    match msg.role {
        MessageRole::User => {
            out.push(Line::from(Span::styled(
                "You",
                Style::default().fg(theme::ROLE_USER).add_modifier(Modifier::BOLD),
            )));
            let bg = Style::default().bg(theme::USER_MSG_BG);
            out.extend(rich_or_raw(rich, &msg.content, &msg.id).into_iter().map(|l| l.patch_style(bg)));
        }
        MessageRole::Assistant => {
            push_assistant_header(out);
            if let Some(segments) = &msg.segments {
                render_segments(rich, state, &msg.id, segments, None, ctx, out);
            } else {
                render_legacy(rich, state, msg, streaming, ctx, out);
            }
        }
    }
    out.push(Line::default());
}

fn render_streaming<R: RichContentRenderer>(
    rich: &R,
    state: &mut MessageRenderState,
    streaming: &StreamingState,
    ctx: &RenderContext<'_>,
    out: &mut Vec<Line<'static>>,
) {
    push_assistant_header(out);
    if streaming.segments.is_empty() {
        out.push(Line::from(vec![
            Span::styled(format!("{} ", theme::spinner(ctx.spinner_frame)), Style::default().fg(theme::DIM)),
            Span::styled(theme::STREAM_CURSOR, Style::default().fg(theme::RUST_ORANGE)),
        ]));
    } else {
        let id = streaming.message_id.as_str();
        render_segments(rich, state, id, &streaming.segments, Some(streaming), ctx, out);
    }
    out.push(Line::default());
}

fn push_assistant_header(out: &mut Vec<Line<'static>>) {
    out.push(Line::from(Span::styled(
        "Assistant",
        Style::default().fg(theme::ROLE_ASSISTANT).add_modifier(Modifier::BOLD),
    )));
}

/// Ordered rendering. `live` is the streaming state when these segments
/// belong to the active turn.
fn render_segments<R: RichContentRenderer>(
    rich: &R,
    state: &mut MessageRenderState,
    message_id: &str,
    segments: &[Segment],
    live: Option<&StreamingState>,
    ctx: &RenderContext<'_>,
    out: &mut Vec<Line<'static>>,
) {
    let streaming = live.is_some();
    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            out.push(Line::default());
        }
        let is_tail = index + 1 == segments.len();
        let mut lines = match segment {
            Segment::Text { text } => rich_or_raw(rich, text, message_id),
            Segment::Reasoning { text, duration_ms } => {
                let is_complete = !(streaming && is_tail);
                let timing = live.and_then(|s| s.reasoning_timing(index));
                let recorded = duration_ms.map(Duration::from_millis);
                let phase = state.reasoning.observe(index, is_complete, timing, recorded, ctx.now);
                reasoning_lines(text, phase, streaming || state.reasoning_expanded, ctx.spinner_frame)
            }
            Segment::Tool(tool) => render_tool(tool, ctx),
        };
        if streaming && is_tail {
            append_cursor(&mut lines);
        }
        out.extend(lines);
    }
}

/// Legacy order: every tool call, then reasoning, then content.
fn render_legacy<R: RichContentRenderer>(
    rich: &R,
    state: &mut MessageRenderState,
    msg: &Message,
    streaming: bool,
    ctx: &RenderContext<'_>,
    out: &mut Vec<Line<'static>>,
) {
    for tool in &msg.legacy_tool_calls {
        out.extend(render_tool(tool, ctx));
    }
    if !msg.reasoning.is_empty() {
        if !msg.legacy_tool_calls.is_empty() {
            out.push(Line::default());
        }
        let phase =
            state.reasoning.observe(LEGACY_REASONING_INDEX, !streaming, None, None, ctx.now);
        let expanded = streaming || state.reasoning_expanded;
        out.extend(reasoning_lines(&msg.reasoning, phase, expanded, ctx.spinner_frame));
    }
    if !msg.content.is_empty() {
        if !msg.reasoning.is_empty() || !msg.legacy_tool_calls.is_empty() {
            out.push(Line::default());
        }
        let mut lines = rich_or_raw(rich, &msg.content, &msg.id);
        if streaming {
            append_cursor(&mut lines);
        }
        out.extend(lines);
    }
}

fn render_tool(tool: &ToolSegment, ctx: &RenderContext<'_>) -> Vec<Line<'static>> {
    let phase = tool_phase(tool, ctx.permission);
    super::tool_call::render_tool_call(tool, phase, ctx.spinner_frame, ctx.permission_selected)
}

/// Header line, plus the body when expanded.
fn reasoning_lines(
    text: &str,
    phase: ReasoningPhase,
    expanded: bool,
    spinner_frame: usize,
) -> Vec<Line<'static>> {
    let label_style = if phase.is_complete() {
        Style::default().fg(theme::DIM)
    } else {
        Style::default().fg(theme::RUST_ORANGE)
    };
    let mut header = vec![
        Span::styled(format!("{} ", theme::ICON_REASONING), label_style),
        Span::styled(phase.label(spinner_frame), label_style.add_modifier(Modifier::ITALIC)),
    ];
    if !expanded && !text.trim().is_empty() {
        header.push(Span::styled("  ctrl+o to expand", Style::default().fg(theme::DIM)));
    }
    let mut lines = vec![Line::from(header)];
    if expanded {
        let body = Style::default().fg(theme::DIM).add_modifier(Modifier::ITALIC);
        lines.extend(plain_text_lines(text, body));
    }
    lines
}

/// Rich rendering, or the raw text for this segment alone when it fails.
fn rich_or_raw<R: RichContentRenderer>(rich: &R, text: &str, message_id: &str) -> Vec<Line<'static>> {
    match rich.render(text) {
        Ok(lines) => lines,
        Err(err) => {
            tracing::warn!(%message_id, "rich rendering failed; showing raw text: {err}");
            plain_text_lines(text, Style::default())
        }
    }
}

fn append_cursor(lines: &mut Vec<Line<'static>>) {
    let cursor = Span::styled(theme::STREAM_CURSOR, Style::default().fg(theme::RUST_ORANGE));
    match lines.last_mut() {
        Some(last) => last.spans.push(cursor),
        None => lines.push(Line::from(cursor)),
    }
}
