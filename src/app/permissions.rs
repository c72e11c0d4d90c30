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

use super::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A pending confirmation for one in-flight tool call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequest {
    /// Tool name the request gates.
    pub operation: String,
    /// File path or shell command, compared against the tool's derived key.
    pub path_or_command: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionResponse {
    Deny,
    Allow,
    AlwaysAllow,
}

/// Option row order as rendered inline under the tool call.
pub const PERMISSION_OPTIONS: [PermissionResponse; 3] =
    [PermissionResponse::Allow, PermissionResponse::AlwaysAllow, PermissionResponse::Deny];

impl PermissionResponse {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Allow => "Allow once",
            Self::AlwaysAllow => "Always allow",
            Self::Deny => "Deny",
        }
    }

    #[must_use]
    pub fn shortcut(self) -> char {
        match self {
            Self::Allow => 'y',
            Self::AlwaysAllow => 'a',
            Self::Deny => 'n',
        }
    }

    #[must_use]
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow | Self::AlwaysAllow)
    }
}

/// The permission side the transcript consumes: one current request, one answer.
pub trait PermissionCollaborator {
    fn current(&self) -> Option<&PermissionRequest>;

    /// Answer the current request. Returns the request that was answered.
    fn respond(&mut self, response: PermissionResponse) -> Option<PermissionRequest>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Shown to the user; awaits a response.
    Pending,
    /// An earlier "always allow" covers this operation.
    AutoApproved,
}

/// In-process collaborator. Holds at most one request and remembers
/// "always allow" grants per operation for the session.
#[derive(Debug, Default)]
pub struct PermissionBroker {
    current: Option<PermissionRequest>,
    always_allowed: HashSet<String>,
    decisions: Vec<(PermissionRequest, PermissionResponse)>,
}

impl PermissionBroker {
    pub fn request(&mut self, request: PermissionRequest) -> RequestOutcome {
        if self.always_allowed.contains(&request.operation) {
            tracing::info!(operation = %request.operation, "permission auto-approved by earlier grant");
            self.decisions.push((request, PermissionResponse::AlwaysAllow));
            return RequestOutcome::AutoApproved;
        }
        if let Some(previous) = self.current.replace(request) {
            tracing::warn!(
                operation = %previous.operation,
                "permission request superseded before the user answered; treating as denied"
            );
            self.decisions.push((previous, PermissionResponse::Deny));
        }
        RequestOutcome::Pending
    }

    /// Answers given so far, oldest first.
    #[must_use]
    pub fn decisions(&self) -> &[(PermissionRequest, PermissionResponse)] {
        &self.decisions
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl PermissionCollaborator for PermissionBroker {
    fn current(&self) -> Option<&PermissionRequest> {
        self.current.as_ref()
    }

    fn respond(&mut self, response: PermissionResponse) -> Option<PermissionRequest> {
        let request = self.current.take()?;
        if response == PermissionResponse::AlwaysAllow {
            self.always_allowed.insert(request.operation.clone());
        }
        tracing::info!(
            operation = %request.operation,
            target = %request.path_or_command,
            ?response,
            "permission answered"
        );
        self.decisions.push((request.clone(), response));
        Some(request)
    }
}

/// Close the prompt with `response`, forwarding it to the collaborator.
pub fn select_permission_option(
    collaborator: &mut dyn PermissionCollaborator,
    response: PermissionResponse,
) -> Option<PermissionRequest> {
    collaborator.respond(response)
}

fn respond(app: &mut App, response: PermissionResponse) {
    select_permission_option(&mut app.permissions, response);
    app.permission_selected = 0;
}

/// Keyboard handling while a permission prompt is pending.
/// Returns true when the key was consumed.
pub(super) fn handle_permission_key(app: &mut App, key: KeyEvent) -> bool {
    if app.permissions.current().is_none() {
        return false;
    }
    if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return false;
    }
    let option_count = PERMISSION_OPTIONS.len();
    match key.code {
        KeyCode::Left => {
            app.permission_selected = app.permission_selected.saturating_sub(1);
        }
        KeyCode::Right => {
            app.permission_selected = (app.permission_selected + 1).min(option_count - 1);
        }
        KeyCode::Enter => {
            let response =
                PERMISSION_OPTIONS.get(app.permission_selected).copied().unwrap_or(PermissionResponse::Deny);
            respond(app, response);
        }
        KeyCode::Esc => respond(app, PermissionResponse::Deny),
        KeyCode::Char(c) => {
            let Some(response) =
                PERMISSION_OPTIONS.iter().copied().find(|opt| opt.shortcut() == c.to_ascii_lowercase())
            else {
                return false;
            };
            respond(app, response);
        }
        _ => return false,
    }
    true
}
