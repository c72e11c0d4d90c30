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
use crate::app::{Message, TokenUsage};
use serde::{Deserialize, Serialize};

/// How an assistant turn terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    #[default]
    Success,
    Aborted,
    Error,
}

/// One already-decoded streaming event for the message currently being produced.
///
/// Applied one at a time, in arrival order, by the segment accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    TextDelta {
        text: String,
    },
    ReasoningDelta {
        text: String,
    },
    ToolStart {
        id: String,
        name: String,
    },
    ToolArgsDelta {
        id: String,
        text: String,
    },
    ToolArgsFinal {
        id: String,
    },
    ToolResult {
        id: String,
        result: String,
    },
    TurnEnd {
        #[serde(default)]
        outcome: TurnOutcome,
        #[serde(default)]
        usage: TokenUsage,
    },
}

impl Delta {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    #[must_use]
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::ReasoningDelta { text: text.into() }
    }

    #[must_use]
    pub fn tool_start(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ToolStart { id: id.into(), name: name.into() }
    }

    #[must_use]
    pub fn tool_args(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::ToolArgsDelta { id: id.into(), text: text.into() }
    }

    #[must_use]
    pub fn tool_args_final(id: impl Into<String>) -> Self {
        Self::ToolArgsFinal { id: id.into() }
    }

    #[must_use]
    pub fn tool_result(id: impl Into<String>, result: impl Into<String>) -> Self {
        Self::ToolResult { id: id.into(), result: result.into() }
    }

    #[must_use]
    pub fn turn_end(outcome: TurnOutcome) -> Self {
        Self::TurnEnd { outcome, usage: TokenUsage::default() }
    }

    /// Short tag used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ReasoningDelta { .. } => "reasoning-delta",
            Self::ToolStart { .. } => "tool-start",
            Self::ToolArgsDelta { .. } => "tool-args-delta",
            Self::ToolArgsFinal { .. } => "tool-args-final",
            Self::ToolResult { .. } => "tool-result",
            Self::TurnEnd { .. } => "turn-end",
        }
    }
}

/// Events delivered to the UI thread over the single event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A new assistant turn begins. `message_id` is generated when absent.
    TurnStarted { message_id: Option<String> },
    Delta(Delta),
    UserMessage(String),
    PermissionRequest(PermissionRequest),
    /// Replace the conversation shown in the transcript view.
    ConversationLoaded(Vec<Message>),
    ReplayFinished,
}

/// Wire shape of one replay line. Every line is tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    TurnStart {
        #[serde(default)]
        message_id: Option<String>,
    },
    UserMessage {
        text: String,
    },
    PermissionRequest {
        operation: String,
        path_or_command: String,
    },
    History {
        messages: Vec<Message>,
    },
    TextDelta {
        text: String,
    },
    ReasoningDelta {
        text: String,
    },
    ToolStart {
        id: String,
        name: String,
    },
    ToolArgsDelta {
        id: String,
        text: String,
    },
    ToolArgsFinal {
        id: String,
    },
    ToolResult {
        id: String,
        result: String,
    },
    TurnEnd {
        #[serde(default)]
        outcome: TurnOutcome,
        #[serde(default)]
        usage: TokenUsage,
    },
}

impl From<WireEvent> for ClientEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::TurnStart { message_id } => Self::TurnStarted { message_id },
            WireEvent::UserMessage { text } => Self::UserMessage(text),
            WireEvent::PermissionRequest { operation, path_or_command } => {
                Self::PermissionRequest(PermissionRequest { operation, path_or_command })
            }
            WireEvent::History { messages } => Self::ConversationLoaded(messages),
            WireEvent::TextDelta { text } => Self::Delta(Delta::TextDelta { text }),
            WireEvent::ReasoningDelta { text } => Self::Delta(Delta::ReasoningDelta { text }),
            WireEvent::ToolStart { id, name } => Self::Delta(Delta::ToolStart { id, name }),
            WireEvent::ToolArgsDelta { id, text } => Self::Delta(Delta::ToolArgsDelta { id, text }),
            WireEvent::ToolArgsFinal { id } => Self::Delta(Delta::ToolArgsFinal { id }),
            WireEvent::ToolResult { id, result } => Self::Delta(Delta::ToolResult { id, result }),
            WireEvent::TurnEnd { outcome, usage } => Self::Delta(Delta::TurnEnd { outcome, usage }),
        }
    }
}
