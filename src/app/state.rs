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

use crate::agent::events::ClientEvent;
use crate::ui::message::TranscriptRenderer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;
use tokio::sync::mpsc;

use super::accumulator::SegmentAccumulator;
use super::permissions::PermissionBroker;
use super::scroll::{ScrollConfig, ScrollState};
use super::viewport::ChatViewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

/// A finalized conversation message. Immutable once its turn has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reasoning: String,
    /// Ordered segments. `None` for legacy messages that only carry
    /// `legacy_tool_calls` plus `content`/`reasoning`.
    #[serde(default)]
    pub segments: Option<Vec<Segment>>,
    #[serde(default)]
    pub legacy_tool_calls: Vec<ToolSegment>,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl Message {
    #[must_use]
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            content: content.into(),
            reasoning: String::new(),
            segments: None,
            legacy_tool_calls: Vec::new(),
            usage: TokenUsage::default(),
        }
    }

    /// Assistant message in the legacy shape: unordered tool calls plus one
    /// content/reasoning block.
    #[must_use]
    pub fn legacy_assistant(
        id: impl Into<String>,
        content: impl Into<String>,
        reasoning: impl Into<String>,
        tool_calls: Vec<ToolSegment>,
    ) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            reasoning: reasoning.into(),
            segments: None,
            legacy_tool_calls: tool_calls,
            usage: TokenUsage::default(),
        }
    }
}

/// One contiguous unit of an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
        /// Measured `close - first delta`, recorded when the turn froze.
        #[serde(default)]
        duration_ms: Option<u64>,
    },
    Tool(ToolSegment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Reasoning,
    Tool,
}

impl Segment {
    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        match self {
            Self::Text { .. } => SegmentKind::Text,
            Self::Reasoning { .. } => SegmentKind::Reasoning,
            Self::Tool(_) => SegmentKind::Tool,
        }
    }

    #[must_use]
    pub fn as_tool(&self) -> Option<&ToolSegment> {
        match self {
            Self::Tool(tool) => Some(tool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSegment {
    pub id: String,
    pub name: String,
    /// Structured arguments. Empty until finalized, or when parsing failed.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Raw argument text as streamed. Cleared after a successful parse,
    /// retained verbatim when parsing failed.
    #[serde(default)]
    pub args_raw_stream: Option<String>,
    /// No more argument text will arrive.
    #[serde(default)]
    pub args_final: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub is_loading: bool,
    /// The turn ended before a result arrived.
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl ToolSegment {
    #[must_use]
    pub fn started(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args: Map::new(),
            args_raw_stream: Some(String::new()),
            args_final: false,
            result: None,
            is_loading: true,
            incomplete: false,
            duration_ms: None,
        }
    }

    /// A finished call with structured arguments, as stored in history.
    #[must_use]
    pub fn finished(
        id: impl Into<String>,
        name: impl Into<String>,
        args: Map<String, Value>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
            args_raw_stream: None,
            args_final: true,
            result: Some(result.into()),
            is_loading: false,
            incomplete: false,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    /// No turn in progress.
    Ready,
    Streaming,
    /// The last turn ended with an error outcome.
    Error,
}

pub struct App {
    /// Finalized conversation, oldest first.
    pub history: Vec<Message>,
    pub accumulator: SegmentAccumulator,
    pub renderer: TranscriptRenderer,
    pub viewport: ChatViewport,
    pub scroll: ScrollState,
    pub permissions: PermissionBroker,
    /// Index into the permission option row that Enter confirms.
    pub permission_selected: usize,
    pub status: AppStatus,
    pub replay_finished: bool,
    pub should_quit: bool,
    pub spinner_frame: usize,
    /// Timestamp of the frame being rendered; the scroll driver's clock.
    pub frame_instant: Instant,
    pub event_tx: mpsc::UnboundedSender<ClientEvent>,
    pub event_rx: mpsc::UnboundedReceiver<ClientEvent>,
    pub(super) next_message_seq: u64,
}

impl App {
    #[must_use]
    pub fn new(scroll_config: ScrollConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            history: Vec::new(),
            accumulator: SegmentAccumulator::new(),
            renderer: TranscriptRenderer::default(),
            viewport: ChatViewport::new(),
            scroll: ScrollState::new(scroll_config),
            permissions: PermissionBroker::default(),
            permission_selected: 0,
            status: AppStatus::Ready,
            replay_finished: false,
            should_quit: false,
            spinner_frame: 0,
            frame_instant: Instant::now(),
            event_tx,
            event_rx,
            next_message_seq: 0,
        }
    }

    /// Minimal app for tests: terminal scroll presets, no replay attached.
    #[must_use]
    pub fn test_default() -> Self {
        Self::new(ScrollConfig::terminal())
    }

    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.accumulator.is_streaming()
    }

    pub(super) fn next_message_id(&mut self, prefix: &str) -> String {
        self.next_message_seq += 1;
        format!("{prefix}-{}", self.next_message_seq)
    }

    /// Reuse the transcript view for a different conversation.
    pub fn load_conversation(&mut self, messages: Vec<Message>) {
        if let Some(aborted) = self.accumulator.reset() {
            tracing::info!(message_id = %aborted.id, "discarding in-progress turn on conversation switch");
        }
        self.history = messages;
        self.renderer.reset();
        self.scroll.reset();
        self.viewport.reset();
        self.permissions.clear();
        self.permission_selected = 0;
        self.status = AppStatus::Ready;
    }
}
