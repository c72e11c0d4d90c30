// =====
// TESTS: 5
// =====
//
// Replay loading and playback into the app's event channel.

use live_transcript::agent::events::ClientEvent;
use live_transcript::agent::replay::{self, Pacing, ReplayError};
use live_transcript::app::{AppStatus, MessageRole, Segment, ToolPhase, tool_phase};
use live_transcript::error::AppError;
use pretty_assertions::assert_eq;
use std::io::Write as _;
use std::time::Duration;

use crate::helpers::{send_client_event, test_app};

const SESSION: &str = r#"
{"type":"user_message","text":"list the files"}
{"type":"turn_start","message_id":"a1"}
{"type":"reasoning_delta","text":"I should run ls.","delay_ms":40}
{"type":"text_delta","text":"Running it now."}
{"type":"tool_start","id":"t1","name":"bash"}
{"type":"tool_args_delta","id":"t1","text":"{\"command\":"}
{"type":"tool_args_delta","id":"t1","text":"\"ls\"}"}
{"type":"tool_args_final","id":"t1"}
{"type":"tool_result","id":"t1","result":"a.txt\nb.txt","delay_ms":25}
{"type":"text_delta","text":"Two files."}
{"type":"turn_end","outcome":"success","usage":{"input":10,"output":20}}
"#;

fn write_replay(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn recorded_session_plays_into_history() {
    let file = write_replay(SESSION);
    let records = replay::load_replay(file.path()).await.unwrap();
    assert_eq!(records.len(), 11);

    let mut app = test_app();
    let tx = app.event_tx.clone();
    replay::run_replay(records, tx, Pacing { speed: 1.0, skip_delays: true }).await;
    while let Ok(event) = app.event_rx.try_recv() {
        send_client_event(&mut app, event);
    }

    assert!(app.replay_finished);
    assert!(matches!(app.status, AppStatus::Ready));
    assert_eq!(app.history.len(), 2);
    assert_eq!(app.history[0].role, MessageRole::User);

    let assistant = &app.history[1];
    assert_eq!(assistant.id, "a1");
    assert_eq!(assistant.content, "Running it now.Two files.");
    assert_eq!(assistant.usage.output, 20);
    let segments = assistant.segments.as_ref().unwrap();
    assert_eq!(segments.len(), 4);
    assert!(matches!(segments[0], Segment::Reasoning { duration_ms: Some(_), .. }));
    let tool = segments[2].as_tool().unwrap();
    assert_eq!(tool.args.get("command").and_then(|v| v.as_str()), Some("ls"));
    assert_eq!(tool_phase(tool, None), ToolPhase::Completed);
}

#[tokio::test]
async fn history_line_loads_a_conversation() {
    let file = write_replay(
        r#"{"type":"history","messages":[{"id":"u1","role":"user","content":"hi"},{"id":"a1","role":"assistant","content":"hello","reasoning":"greet back"}]}"#,
    );
    let records = replay::load_replay(file.path()).await.unwrap();
    let mut app = test_app();
    for record in records {
        send_client_event(&mut app, record.event);
    }
    assert_eq!(app.history.len(), 2);
    assert!(app.history[1].segments.is_none(), "legacy shape is kept as-is");
}

#[tokio::test]
async fn missing_file_maps_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = replay::load_replay(&dir.path().join("absent.jsonl")).await.unwrap_err();
    assert!(matches!(err, ReplayError::Io { .. }));
    assert_eq!(AppError::from(&err), AppError::ReplayNotFound);
}

#[tokio::test]
async fn malformed_line_reports_its_number() {
    let file = write_replay("{\"type\":\"text_delta\",\"text\":\"ok\"}\n\n{\"type\":\"text_delta\"\n");
    let err = replay::load_replay(file.path()).await.unwrap_err();
    let ReplayError::Decode { line, .. } = &err else {
        panic!("expected decode error, got {err}");
    };
    assert_eq!(*line, 3);
    assert_eq!(AppError::from(&err), AppError::ReplayMalformed);
}

#[tokio::test(start_paused = true)]
async fn recorded_delays_are_honored() {
    let records = replay::parse_replay(
        "{\"type\":\"text_delta\",\"text\":\"a\",\"delay_ms\":500}\n{\"type\":\"text_delta\",\"text\":\"b\",\"delay_ms\":500}",
    )
    .unwrap();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let started = tokio::time::Instant::now();
    replay::run_replay(records, tx, Pacing { speed: 2.0, skip_delays: false }).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(510), "{elapsed:?}");
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    assert_eq!(events.last(), Some(&ClientEvent::ReplayFinished));
}
