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

//! Segment accumulation for the message currently being streamed.
//!
//! The accumulator is the only writer of [`StreamingState`]. Segments are
//! appended in the order their opening delta arrives and every segment except
//! the tail is frozen. The one delta allowed to reach behind the tail is
//! `tool-result`, which only moves a tool from loading to finished.

use super::reasoning::ReasoningTiming;
use super::state::{Message, MessageRole, Segment, SegmentKind, TokenUsage, ToolSegment};
use crate::agent::events::{Delta, TurnOutcome};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Notifications emitted after each applied delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    TurnStarted { message_id: String },
    SegmentOpened { index: usize, kind: SegmentKind },
    SegmentUpdated { index: usize },
    TurnFinished { message_id: String, outcome: TurnOutcome },
}

type Observer = Box<dyn FnMut(&TranscriptEvent)>;

/// Ephemeral state for the in-progress assistant message.
#[derive(Debug, Clone)]
pub struct StreamingState {
    pub message_id: String,
    /// Local turn sequence number. Unlike `message_id`, never repeats.
    pub turn: u64,
    pub segments: Vec<Segment>,
    pub started_at: Instant,
    reasoning_timing: HashMap<usize, ReasoningTiming>,
    tool_started_at: HashMap<String, Instant>,
    /// Tail tool segment still receiving argument text.
    active_tool: Option<usize>,
}

impl StreamingState {
    fn new(message_id: String, turn: u64, now: Instant) -> Self {
        Self {
            message_id,
            turn,
            segments: Vec::new(),
            started_at: now,
            reasoning_timing: HashMap::new(),
            tool_started_at: HashMap::new(),
            active_tool: None,
        }
    }

    /// Only the tail of an active turn may still change.
    #[must_use]
    pub fn is_open(&self, index: usize) -> bool {
        index + 1 == self.segments.len()
    }

    #[must_use]
    pub fn reasoning_timing(&self, index: usize) -> Option<ReasoningTiming> {
        self.reasoning_timing.get(&index).copied()
    }

    #[must_use]
    pub fn active_tool_index(&self) -> Option<usize> {
        self.active_tool
    }

    fn push_text(&mut self, text: String, now: Instant) -> TranscriptEvent {
        let tail = self.segments.len().checked_sub(1);
        if let (Some(index), Some(Segment::Text { text: existing })) = (tail, self.segments.last_mut())
        {
            existing.push_str(&text);
            return TranscriptEvent::SegmentUpdated { index };
        }
        self.open(Segment::Text { text }, now)
    }

    fn push_reasoning(&mut self, text: String, now: Instant) -> TranscriptEvent {
        let tail = self.segments.len().checked_sub(1);
        if let (Some(index), Some(Segment::Reasoning { text: existing, .. })) =
            (tail, self.segments.last_mut())
        {
            existing.push_str(&text);
            return TranscriptEvent::SegmentUpdated { index };
        }
        let event = self.open(Segment::Reasoning { text, duration_ms: None }, now);
        let index = self.segments.len() - 1;
        self.reasoning_timing.insert(index, ReasoningTiming { opened_at: now, closed_at: None });
        event
    }

    fn open_tool(&mut self, id: String, name: String, now: Instant) -> TranscriptEvent {
        if self.segments.iter().filter_map(Segment::as_tool).any(|t| t.id == id) {
            tracing::warn!(tool_id = %id, "duplicate tool-start id; later results will target the newest call");
        }
        self.tool_started_at.insert(id.clone(), now);
        let event = self.open(Segment::Tool(ToolSegment::started(id, name)), now);
        self.active_tool = Some(self.segments.len() - 1);
        event
    }

    /// Close the current tail and append `segment` after it.
    fn open(&mut self, segment: Segment, now: Instant) -> TranscriptEvent {
        self.close_tail(now);
        let kind = segment.kind();
        self.segments.push(segment);
        TranscriptEvent::SegmentOpened { index: self.segments.len() - 1, kind }
    }

    /// Freeze the tail: reasoning gets its close time, a tool still streaming
    /// arguments gets them finalized.
    fn close_tail(&mut self, now: Instant) {
        let Some(index) = self.segments.len().checked_sub(1) else {
            return;
        };
        if let Some(timing) = self.reasoning_timing.get_mut(&index)
            && timing.closed_at.is_none()
        {
            timing.closed_at = Some(now);
        }
        if let Some(Segment::Tool(tool)) = self.segments.get_mut(index)
            && !tool.args_final
        {
            finalize_args(tool);
        }
        self.active_tool = None;
    }

    fn append_tool_args(&mut self, id: &str, text: &str) -> Option<TranscriptEvent> {
        let index = self.active_tool_matching(id)?;
        let Some(Segment::Tool(tool)) = self.segments.get_mut(index) else {
            return None;
        };
        tool.args_raw_stream.get_or_insert_with(String::new).push_str(text);
        Some(TranscriptEvent::SegmentUpdated { index })
    }

    fn finalize_tool_args(&mut self, id: &str) -> Option<TranscriptEvent> {
        let index = self.active_tool_matching(id)?;
        let Some(Segment::Tool(tool)) = self.segments.get_mut(index) else {
            return None;
        };
        finalize_args(tool);
        self.active_tool = None;
        Some(TranscriptEvent::SegmentUpdated { index })
    }

    fn active_tool_matching(&self, id: &str) -> Option<usize> {
        let index = self.active_tool.filter(|&i| {
            matches!(self.segments.get(i), Some(Segment::Tool(tool)) if tool.id == id)
        });
        if index.is_none() {
            tracing::warn!(tool_id = %id, "argument text for a tool that is not streaming; dropped");
        }
        index
    }

    fn record_tool_result(&mut self, id: &str, result: String, now: Instant) -> Option<TranscriptEvent> {
        let Some(index) = self
            .segments
            .iter()
            .rposition(|seg| matches!(seg, Segment::Tool(tool) if tool.id == id))
        else {
            tracing::warn!(tool_id = %id, "tool result for unknown tool call; dropped");
            return None;
        };
        let started_at = self.tool_started_at.get(id).copied();
        let Some(Segment::Tool(tool)) = self.segments.get_mut(index) else {
            return None;
        };
        if tool.result.is_some() {
            tracing::warn!(tool_id = %id, "duplicate tool result; keeping the first");
            return None;
        }
        if !tool.args_final {
            finalize_args(tool);
        }
        tool.result = Some(result);
        tool.is_loading = false;
        tool.duration_ms = started_at.map(|at| duration_ms(now.saturating_duration_since(at)));
        if self.active_tool == Some(index) {
            self.active_tool = None;
        }
        Some(TranscriptEvent::SegmentUpdated { index })
    }

    /// Freeze every open segment and produce the finalized message.
    fn freeze(mut self, outcome: TurnOutcome, usage: TokenUsage, now: Instant) -> Message {
        self.close_tail(now);
        let mut content = String::new();
        let mut reasoning = Vec::new();
        for (index, segment) in self.segments.iter_mut().enumerate() {
            match segment {
                Segment::Text { text } => content.push_str(text),
                Segment::Reasoning { text, duration_ms: recorded } => {
                    reasoning.push(text.clone());
                    if let Some(timing) = self.reasoning_timing.get(&index) {
                        *recorded = timing.elapsed().map(duration_ms);
                    }
                }
                Segment::Tool(tool) => {
                    if tool.is_loading {
                        tool.is_loading = false;
                        tool.incomplete = true;
                        tracing::debug!(tool_id = %tool.id, ?outcome, "tool call interrupted by turn end");
                    }
                }
            }
        }
        Message {
            id: self.message_id,
            role: MessageRole::Assistant,
            content,
            reasoning: reasoning.join("\n\n"),
            segments: Some(self.segments),
            legacy_tool_calls: Vec::new(),
            usage,
        }
    }
}

/// Parse the accumulated raw stream. Never fails: malformed text stays in
/// `args_raw_stream` and the structured arguments are left empty.
fn finalize_args(tool: &mut ToolSegment) {
    let raw = tool.args_raw_stream.take().unwrap_or_default();
    match parse_tool_args(&raw) {
        Ok(args) => tool.args = args,
        Err(err) => {
            tracing::warn!(tool_id = %tool.id, tool = %tool.name, "tool arguments did not parse: {err}");
            tool.args = Map::new();
            tool.args_raw_stream = Some(raw);
        }
    }
    tool.args_final = true;
}

#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("arguments are not a JSON object")]
    NotAnObject,
}

pub fn parse_tool_args(raw: &str) -> Result<Map<String, Value>, ArgsError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(ArgsError::NotAnObject),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Single-writer builder of the in-progress assistant message.
#[derive(Default)]
pub struct SegmentAccumulator {
    state: Option<StreamingState>,
    observers: Vec<Observer>,
    implicit_turns: u64,
    turns_started: u64,
}

impl SegmentAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&TranscriptEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state.is_some()
    }

    #[must_use]
    pub fn state(&self) -> Option<&StreamingState> {
        self.state.as_ref()
    }

    /// Start a new assistant turn. A turn still in progress is frozen as
    /// aborted and returned so the caller can move it into history.
    pub fn begin_turn(&mut self, message_id: impl Into<String>, now: Instant) -> Option<Message> {
        let previous = self.finish(TurnOutcome::Aborted, TokenUsage::default(), now);
        let message_id = message_id.into();
        self.turns_started += 1;
        tracing::debug!(%message_id, turn = self.turns_started, "turn started");
        self.state = Some(StreamingState::new(message_id.clone(), self.turns_started, now));
        self.notify(&TranscriptEvent::TurnStarted { message_id });
        previous
    }

    /// Apply one delta. Returns the finalized message when the delta ends the turn.
    pub fn apply(&mut self, delta: Delta, now: Instant) -> Option<Message> {
        tracing::trace!(kind = delta.kind(), "applying delta");
        if let Delta::TurnEnd { outcome, usage } = delta {
            if self.state.is_none() {
                tracing::debug!("turn-end without an active turn; ignored");
            }
            return self.finish(outcome, usage, now);
        }
        if self.state.is_none() {
            self.implicit_turns += 1;
            let id = format!("turn-{}", self.implicit_turns);
            tracing::debug!(message_id = %id, "delta arrived outside a turn; starting one implicitly");
            self.begin_turn(id, now);
        }
        let state = self.state.as_mut()?;
        let event = match delta {
            Delta::TextDelta { text } if text.is_empty() => None,
            Delta::ReasoningDelta { text } if text.is_empty() => None,
            Delta::TextDelta { text } => Some(state.push_text(text, now)),
            Delta::ReasoningDelta { text } => Some(state.push_reasoning(text, now)),
            Delta::ToolStart { id, name } => Some(state.open_tool(id, name, now)),
            Delta::ToolArgsDelta { id, text } => state.append_tool_args(&id, &text),
            Delta::ToolArgsFinal { id } => state.finalize_tool_args(&id),
            Delta::ToolResult { id, result } => state.record_tool_result(&id, result, now),
            Delta::TurnEnd { .. } => None,
        };
        if let Some(event) = event {
            self.notify(&event);
        }
        None
    }

    /// Drop any in-progress turn without producing history. Returns what was
    /// discarded, frozen as aborted.
    pub fn reset(&mut self) -> Option<Message> {
        let now = Instant::now();
        self.state.take().map(|state| state.freeze(TurnOutcome::Aborted, TokenUsage::default(), now))
    }

    fn finish(&mut self, outcome: TurnOutcome, usage: TokenUsage, now: Instant) -> Option<Message> {
        let state = self.state.take()?;
        let message = state.freeze(outcome, usage, now);
        tracing::debug!(
            message_id = %message.id,
            ?outcome,
            segments = message.segments.as_ref().map_or(0, Vec::len),
            "turn finished"
        );
        self.notify(&TranscriptEvent::TurnFinished { message_id: message.id.clone(), outcome });
        Some(message)
    }

    fn notify(&mut self, event: &TranscriptEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }
}
