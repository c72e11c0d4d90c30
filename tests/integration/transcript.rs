// =====
// TESTS: 7
// =====
//
// Full-frame rendering of the transcript, including the permission prompt.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use live_transcript::agent::events::{ClientEvent, Delta, TurnOutcome};
use live_transcript::app::permissions::{
    PermissionCollaborator as _, PermissionRequest, PermissionResponse,
};
use live_transcript::app::{Message, ToolSegment, handle_terminal_event};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

use crate::helpers::{render_frame, send_client_event, send_deltas, test_app};

fn key(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn bash_call(app: &mut live_transcript::app::App, command: &str) {
    send_deltas(
        app,
        [
            Delta::tool_start("t1", "bash"),
            Delta::tool_args("t1", format!("{{\"command\":\"{command}\"}}")),
            Delta::tool_args_final("t1"),
        ],
    );
}

fn request(command: &str) -> ClientEvent {
    ClientEvent::PermissionRequest(PermissionRequest {
        operation: "bash".to_owned(),
        path_or_command: command.to_owned(),
    })
}

#[test]
fn permission_prompt_renders_and_answers() {
    let mut app = test_app();
    bash_call(&mut app, "rm -rf build");
    send_client_event(&mut app, request("rm -rf build"));

    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(rows.iter().any(|r| r.contains("needs permission")));
    assert!(rows.iter().any(|r| r.contains("Allow once (y)")));

    handle_terminal_event(&mut app, key('y'));
    assert!(app.permissions.current().is_none());
    assert_eq!(app.permissions.decisions().last().unwrap().1, PermissionResponse::Allow);

    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(!rows.iter().any(|r| r.contains("needs permission")));
}

#[test]
fn unrelated_request_does_not_gate_the_tool() {
    let mut app = test_app();
    bash_call(&mut app, "ls");
    send_client_event(&mut app, request("make install"));

    let rows = render_frame(&mut app, 120, 16, Instant::now());
    assert!(!rows.iter().any(|r| r.contains("needs permission")));
    assert!(rows.iter().any(|r| r.contains("permission: y allow")), "footer still shows the pending request");
}

#[test]
fn always_allow_covers_later_requests() {
    let mut app = test_app();
    bash_call(&mut app, "cargo fmt");
    send_client_event(&mut app, request("cargo fmt"));
    handle_terminal_event(&mut app, key('a'));
    send_deltas(&mut app, [Delta::tool_result("t1", "ok"), Delta::turn_end(TurnOutcome::Success)]);

    bash_call(&mut app, "cargo fmt --check");
    send_client_event(&mut app, request("cargo fmt --check"));
    assert!(app.permissions.current().is_none());
    assert_eq!(app.permissions.decisions().len(), 2);
}

#[test]
fn declined_result_is_shown_as_rejected() {
    let mut app = test_app();
    bash_call(&mut app, "rm -rf /");
    send_deltas(&mut app, [Delta::tool_result("t1", "User denied this operation.")]);
    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(rows.iter().any(|r| r.contains("\u{2717}") && r.contains("declined")), "{rows:#?}");
}

#[test]
fn turn_end_closes_open_prompt() {
    let mut app = test_app();
    bash_call(&mut app, "ls");
    send_client_event(&mut app, request("ls"));
    send_deltas(&mut app, [Delta::turn_end(TurnOutcome::Aborted)]);

    assert!(app.permissions.current().is_none());
    assert_eq!(app.permissions.decisions().last().unwrap().1, PermissionResponse::Deny);
    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(rows.iter().any(|r| r.contains("interrupted")));
}

#[test]
fn legacy_history_renders_tools_before_text() {
    let mut app = test_app();
    let args = serde_json::json!({"path": "src/lib.rs"}).as_object().cloned().unwrap();
    let tool = ToolSegment::finished("t1", "read_file", args, "mod app;");
    let legacy = Message::legacy_assistant("a1", "The crate root.", "look at lib.rs", vec![tool]);
    send_client_event(&mut app, ClientEvent::ConversationLoaded(vec![Message::user("u1", "what is this?"), legacy]));

    let rows = render_frame(&mut app, 60, 24, Instant::now() + Duration::from_millis(16));
    let pos = |needle: &str| rows.iter().position(|r| r.contains(needle));
    assert!(pos("read_file").unwrap() < pos("The crate root.").unwrap());
    assert!(pos("Thought").is_some());
    assert!(pos("look at lib.rs").is_none(), "reasoning collapsed for finalized messages");
}

#[test]
fn ctrl_o_reveals_finalized_reasoning() {
    let mut app = test_app();
    send_deltas(
        &mut app,
        [Delta::reasoning("check the lockfile"), Delta::text("Done."), Delta::turn_end(TurnOutcome::Success)],
    );
    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(!rows.iter().any(|r| r.contains("check the lockfile")));
    assert!(rows.iter().any(|r| r.contains("ctrl+o to expand")));

    let ctrl_o = Event::Key(KeyEvent::new(KeyCode::Char('o'), KeyModifiers::CONTROL));
    handle_terminal_event(&mut app, ctrl_o.clone());
    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(rows.iter().any(|r| r.contains("check the lockfile")));

    handle_terminal_event(&mut app, ctrl_o);
    let rows = render_frame(&mut app, 70, 16, Instant::now());
    assert!(!rows.iter().any(|r| r.contains("check the lockfile")));
}
