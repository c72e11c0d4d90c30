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

use super::follow::WheelDirection;
use super::permissions::{
    PermissionCollaborator as _, PermissionResponse, RequestOutcome, handle_permission_key,
};
use super::viewport::Viewport as _;
use super::{App, AppStatus, Message};
use crate::agent::events::{ClientEvent, Delta, TurnOutcome};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use std::time::Instant;

const MOUSE_SCROLL_LINES: f32 = 3.0;

pub fn handle_client_event(app: &mut App, event: ClientEvent) {
    handle_client_event_at(app, event, Instant::now());
}

/// Apply one event from the delta source with an explicit arrival time.
pub fn handle_client_event_at(app: &mut App, event: ClientEvent, now: Instant) {
    match event {
        ClientEvent::TurnStarted { message_id } => {
            let id = message_id.unwrap_or_else(|| app.next_message_id("assistant"));
            if let Some(aborted) = app.accumulator.begin_turn(id, now) {
                tracing::warn!(message_id = %aborted.id, "turn superseded before it ended");
                app.history.push(aborted);
            }
            on_turn_opened(app);
        }
        ClientEvent::Delta(delta) => handle_delta(app, delta, now),
        ClientEvent::UserMessage(text) => {
            let id = app.next_message_id("user");
            app.history.push(Message::user(id, text));
        }
        ClientEvent::PermissionRequest(request) => {
            tracing::info!(operation = %request.operation, target = %request.path_or_command, "permission requested");
            if app.permissions.request(request) == RequestOutcome::Pending {
                app.permission_selected = 0;
            }
        }
        ClientEvent::ConversationLoaded(messages) => {
            tracing::info!(messages = messages.len(), "conversation loaded");
            app.load_conversation(messages);
        }
        ClientEvent::ReplayFinished => {
            tracing::info!("replay finished");
            app.replay_finished = true;
        }
    }
}

fn handle_delta(app: &mut App, delta: Delta, now: Instant) {
    let was_streaming = app.accumulator.is_streaming();
    let outcome = match &delta {
        Delta::TurnEnd { outcome, .. } => Some(*outcome),
        _ => None,
    };
    let finished = app.accumulator.apply(delta, now);
    if !was_streaming && app.accumulator.is_streaming() {
        on_turn_opened(app);
    }
    let Some(message) = finished else {
        return;
    };
    app.history.push(message);
    app.status = if outcome == Some(TurnOutcome::Error) { AppStatus::Error } else { AppStatus::Ready };
    app.scroll.end_turn();
    if app.permissions.current().is_some() {
        tracing::warn!("turn ended with a permission prompt still open; denying");
        app.permissions.respond(PermissionResponse::Deny);
        app.permission_selected = 0;
    }
}

fn on_turn_opened(app: &mut App) {
    app.status = AppStatus::Streaming;
    app.scroll.begin_turn(app.viewport.metrics());
}

pub fn handle_terminal_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if !handle_permission_key(app, key) {
                handle_normal_key(app, key);
            }
        }
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        // Resize is picked up by the next render's measurement
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => scroll_gesture(app, -MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => scroll_gesture(app, MOUSE_SCROLL_LINES),
        _ => {}
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    let page = (app.viewport.metrics().client_height - 1.0).max(1.0);
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => app.should_quit = true,
        (KeyCode::Char('q'), _) => app.should_quit = true,
        (KeyCode::Char('o'), m) if m.contains(KeyModifiers::CONTROL) => {
            let expanded = app.renderer.toggle_reasoning();
            tracing::debug!(expanded, "reasoning visibility toggled");
        }
        (KeyCode::Up | KeyCode::Char('k'), _) => scroll_gesture(app, -1.0),
        (KeyCode::Down | KeyCode::Char('j'), _) => scroll_gesture(app, 1.0),
        (KeyCode::PageUp, _) => scroll_gesture(app, -page),
        (KeyCode::PageDown, _) => scroll_gesture(app, page),
        (KeyCode::Home, _) => {
            let top = app.viewport.metrics().scroll_top;
            scroll_gesture(app, -top);
        }
        (KeyCode::End, _) => {
            app.viewport.scroll_to_bottom();
            app.scroll.observe_scroll(app.viewport.metrics());
        }
        _ => {}
    }
}

/// User-initiated scroll by `delta` rows, reported as a wheel gesture.
fn scroll_gesture(app: &mut App, delta: f32) {
    app.viewport.scroll_by(delta);
    let direction = if delta < 0.0 { WheelDirection::Up } else { WheelDirection::Down };
    app.scroll.observe_wheel(direction, app.viewport.metrics());
}
