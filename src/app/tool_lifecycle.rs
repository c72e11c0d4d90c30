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

use super::accumulator::parse_tool_args;
use super::permissions::PermissionRequest;
use super::state::ToolSegment;
use serde_json::{Map, Value};

/// Tools whose permission key is the file they touch.
pub const FILE_TOOLS: &[&str] = &["read_file", "write_file", "edit_file"];
/// Tools whose permission key is the shell command they run.
pub const COMMAND_TOOLS: &[&str] = &["run_command", "bash"];

/// Result prefixes that mean the user declined the call.
const DECLINED_PREFIXES: &[&str] = &[
    "user denied",
    "user rejected",
    "permission denied by user",
    "operation cancelled by user",
    "tool call was declined",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPhase {
    ArgsStreaming,
    AwaitingResult,
    AwaitingPermission,
    Completed,
    Rejected,
    Interrupted,
}

/// Classify a tool segment, gating `AwaitingPermission` on the single pending request.
pub fn tool_phase(tool: &ToolSegment, pending: Option<&PermissionRequest>) -> ToolPhase {
    if let Some(result) = &tool.result {
        return if is_declined_result(result) { ToolPhase::Rejected } else { ToolPhase::Completed };
    }
    if tool.incomplete || !tool.is_loading {
        return ToolPhase::Interrupted;
    }
    if pending.is_some_and(|request| permission_matches(tool, request)) {
        return ToolPhase::AwaitingPermission;
    }
    if tool.args_final { ToolPhase::AwaitingResult } else { ToolPhase::ArgsStreaming }
}

#[must_use]
pub fn is_declined_result(result: &str) -> bool {
    let head = result.trim_start().to_ascii_lowercase();
    DECLINED_PREFIXES.iter().any(|prefix| head.starts_with(prefix))
}

/// Key a permission request must carry to correlate with a call of `name`.
/// Tools with no derivable key never match.
#[must_use]
pub fn derive_permission_key(name: &str, args: &Map<String, Value>) -> Option<String> {
    let field = |key: &str| args.get(key).and_then(Value::as_str).map(str::to_owned);
    if FILE_TOOLS.contains(&name) {
        field("path").or_else(|| field("file_path"))
    } else if COMMAND_TOOLS.contains(&name) {
        field("command")
    } else {
        None
    }
}

/// Arguments usable for correlation: parsed ones, or the raw stream once it is
/// already complete JSON.
fn correlation_key(tool: &ToolSegment) -> Option<String> {
    if !tool.args_final
        && let Some(raw) = tool.args_raw_stream.as_deref()
    {
        let args = parse_tool_args(raw).ok()?;
        return derive_permission_key(&tool.name, &args);
    }
    derive_permission_key(&tool.name, &tool.args)
}

#[must_use]
pub fn permission_matches(tool: &ToolSegment, request: &PermissionRequest) -> bool {
    request.operation == tool.name
        && correlation_key(tool).is_some_and(|key| key == request.path_or_command)
}
