// =====
// TESTS: 12
// =====
//
// Segment assembly scenarios and ordering properties.
// Drives the app through client events and inspects the streaming state.

use live_transcript::agent::events::{ClientEvent, Delta, TurnOutcome};
use live_transcript::app::{
    AppStatus, ReasoningPhase, ReasoningTracker, Segment, SegmentAccumulator, ToolPhase, tool_phase,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, Instant};

use crate::helpers::{render_frame, send_at, send_client_event, send_deltas, test_app};

// --- Fixed scenarios ---

#[test]
fn text_then_completed_tool_call() {
    let mut app = test_app();
    send_deltas(
        &mut app,
        [
            Delta::text("Hello"),
            Delta::tool_start("t1", "bash"),
            Delta::tool_args("t1", "{\"command\":\"ls\"}"),
            Delta::tool_result("t1", "a.txt"),
        ],
    );

    let state = app.accumulator.state().unwrap();
    assert_eq!(state.segments.len(), 2);
    assert_eq!(state.segments[0], Segment::Text { text: "Hello".to_owned() });
    let tool = state.segments[1].as_tool().unwrap();
    assert_eq!(tool.name, "bash");
    assert_eq!(serde_json::Value::Object(tool.args.clone()), json!({"command": "ls"}));
    assert_eq!(tool.result.as_deref(), Some("a.txt"));
    assert_eq!(tool_phase(tool, None), ToolPhase::Completed);
}

#[test]
fn reasoning_completes_when_tool_opens() {
    let mut app = test_app();
    let t0 = Instant::now();
    send_at(&mut app, ClientEvent::TurnStarted { message_id: Some("m1".into()) }, t0);
    send_at(&mut app, ClientEvent::Delta(Delta::reasoning("considering")), t0);
    let t1 = t0 + Duration::from_millis(2000);
    send_at(&mut app, ClientEvent::Delta(Delta::tool_start("t1", "bash")), t1);

    assert!(app.is_streaming());
    let state = app.accumulator.state().unwrap();
    let timing = state.reasoning_timing(0).unwrap();
    assert_eq!(timing.elapsed(), Some(Duration::from_millis(2000)));

    let mut tracker = ReasoningTracker::default();
    let phase = tracker.observe(0, !state.is_open(0), Some(timing), None, t1 + Duration::from_millis(16));
    assert_eq!(phase, ReasoningPhase::Thought { duration: Some(Duration::from_millis(2000)) });

    let rows = render_frame(&mut app, 60, 20, t1 + Duration::from_millis(16));
    assert!(rows.iter().any(|r| r.contains("Thought for 2s")));
}

#[test]
fn unterminated_args_become_interrupted_tool() {
    let mut app = test_app();
    send_deltas(
        &mut app,
        [
            Delta::tool_start("t1", "bash"),
            Delta::tool_args("t1", "{\"command\": "),
            Delta::turn_end(TurnOutcome::Success),
        ],
    );

    assert!(!app.is_streaming());
    assert!(matches!(app.status, AppStatus::Ready));
    let message = app.history.last().unwrap();
    let tool = message.segments.as_ref().unwrap()[0].as_tool().unwrap();
    assert_eq!(tool_phase(tool, None), ToolPhase::Interrupted);
    assert!(tool.args.is_empty());
    assert_eq!(tool.args_raw_stream.as_deref(), Some("{\"command\": "));
}

#[test]
fn error_outcome_marks_status() {
    let mut app = test_app();
    send_deltas(&mut app, [Delta::text("partial"), Delta::turn_end(TurnOutcome::Error)]);
    assert!(matches!(app.status, AppStatus::Error));
    assert_eq!(app.history.len(), 1);
}

#[test]
fn new_turn_moves_unfinished_turn_into_history() {
    let mut app = test_app();
    send_client_event(&mut app, ClientEvent::TurnStarted { message_id: Some("a".into()) });
    send_deltas(&mut app, [Delta::text("cut off")]);
    send_client_event(&mut app, ClientEvent::TurnStarted { message_id: Some("b".into()) });

    assert_eq!(app.history.len(), 1);
    assert_eq!(app.history[0].id, "a");
    assert_eq!(app.accumulator.state().unwrap().message_id, "b");
}

#[test]
fn tool_result_after_later_segments_reaches_its_call() {
    let mut app = test_app();
    send_deltas(
        &mut app,
        [
            Delta::tool_start("t1", "read_file"),
            Delta::tool_args("t1", "{\"path\":\"a.md\"}"),
            Delta::text("while that runs"),
            Delta::tool_result("t1", "contents"),
        ],
    );
    let state = app.accumulator.state().unwrap();
    let tool = state.segments[0].as_tool().unwrap();
    assert_eq!(tool.result.as_deref(), Some("contents"));
    assert_eq!(state.segments[1], Segment::Text { text: "while that runs".to_owned() });
}

// --- Properties over generated delta sequences ---

/// Small deterministic generator so the sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opened {
    Text,
    Reasoning,
    Tool,
}

/// A delta sequence plus the segment kinds it should open, in order.
fn generate(seed: u64, len: usize) -> (Vec<Delta>, Vec<Opened>) {
    let mut rng = Lcg(seed);
    let mut deltas = Vec::new();
    let mut opened: Vec<Opened> = Vec::new();
    let mut tools = 0;
    for i in 0..len {
        match rng.next() % 5 {
            0 | 1 => {
                deltas.push(Delta::text(format!("t{i} ")));
                if opened.last() != Some(&Opened::Text) {
                    opened.push(Opened::Text);
                }
            }
            2 => {
                deltas.push(Delta::reasoning(format!("r{i} ")));
                if opened.last() != Some(&Opened::Reasoning) {
                    opened.push(Opened::Reasoning);
                }
            }
            3 => {
                tools += 1;
                let id = format!("tool-{tools}");
                deltas.push(Delta::tool_start(id.clone(), "bash"));
                deltas.push(Delta::tool_args(id.clone(), format!("{{\"command\":\"echo {i}\"}}")));
                opened.push(Opened::Tool);
            }
            _ => {
                if opened.last() == Some(&Opened::Tool) {
                    deltas.push(Delta::tool_result(format!("tool-{tools}"), "ok"));
                }
            }
        }
    }
    (deltas, opened)
}

fn kind_of(segment: &Segment) -> Opened {
    match segment {
        Segment::Text { .. } => Opened::Text,
        Segment::Reasoning { .. } => Opened::Reasoning,
        Segment::Tool(_) => Opened::Tool,
    }
}

#[test]
fn segment_order_follows_first_delta_arrival() {
    for seed in 1..40 {
        let (deltas, expected) = generate(seed, 30);
        let mut acc = SegmentAccumulator::new();
        let now = Instant::now();
        for delta in deltas {
            acc.apply(delta, now);
        }
        let Some(state) = acc.state() else {
            assert!(expected.is_empty(), "seed {seed}");
            continue;
        };
        let kinds: Vec<Opened> = state.segments.iter().map(kind_of).collect();
        assert_eq!(kinds, expected, "seed {seed}");
    }
}

#[test]
fn earlier_segments_are_frozen() {
    for seed in 1..40 {
        let (deltas, _) = generate(seed, 30);
        let mut acc = SegmentAccumulator::new();
        let now = Instant::now();
        for delta in deltas {
            let before = acc.state().map(|s| s.segments.clone()).unwrap_or_default();
            acc.apply(delta, now);
            let after = &acc.state().unwrap().segments;
            let frozen = before.len().saturating_sub(1);
            assert_eq!(&after[..frozen], &before[..frozen], "seed {seed}");
        }
    }
}

#[test]
fn only_tail_reasoning_of_active_turn_is_open() {
    for seed in 1..40 {
        let (deltas, _) = generate(seed, 30);
        let mut acc = SegmentAccumulator::new();
        let start = Instant::now();
        for (step, delta) in deltas.into_iter().enumerate() {
            acc.apply(delta, start + Duration::from_millis(step as u64 * 10));
            let state = acc.state().unwrap();
            for (index, segment) in state.segments.iter().enumerate() {
                if !matches!(segment, Segment::Reasoning { .. }) {
                    continue;
                }
                let timing = state.reasoning_timing(index).unwrap();
                assert_eq!(timing.closed_at.is_none(), state.is_open(index), "seed {seed} index {index}");
            }
        }
    }
}

#[test]
fn finalized_turn_has_no_open_reasoning() {
    for seed in 1..20 {
        let (mut deltas, _) = generate(seed, 20);
        deltas.push(Delta::turn_end(TurnOutcome::Success));
        let mut acc = SegmentAccumulator::new();
        let now = Instant::now();
        let mut finished = None;
        for delta in deltas {
            finished = acc.apply(delta, now).or(finished);
        }
        let Some(message) = finished else { continue };
        for segment in message.segments.unwrap() {
            if let Segment::Reasoning { duration_ms, .. } = segment {
                assert!(duration_ms.is_some(), "seed {seed}");
            }
        }
    }
}

#[test]
fn rendering_never_mutates_history() {
    let mut app = test_app();
    send_deltas(
        &mut app,
        [Delta::reasoning("hmm"), Delta::text("answer"), Delta::turn_end(TurnOutcome::Success)],
    );
    let snapshot = app.history.clone();
    let now = Instant::now();
    render_frame(&mut app, 40, 12, now);
    render_frame(&mut app, 40, 12, now + Duration::from_secs(5));
    assert_eq!(app.history, snapshot);
}

#[test]
fn turns_sharing_a_message_id_render_independently() {
    let mut app = test_app();
    let t0 = Instant::now();
    let turn = |id: &str| ClientEvent::TurnStarted { message_id: Some(id.to_owned()) };

    send_at(&mut app, turn("m1"), t0);
    send_at(&mut app, ClientEvent::Delta(Delta::reasoning("weighing it")), t0);
    send_at(&mut app, ClientEvent::Delta(Delta::text("FIRST")), t0 + Duration::from_secs(1));
    render_frame(&mut app, 60, 30, t0 + Duration::from_secs(1));
    send_at(&mut app, ClientEvent::Delta(Delta::turn_end(TurnOutcome::Success)), t0 + Duration::from_secs(1));
    render_frame(&mut app, 60, 30, t0 + Duration::from_secs(2));

    let t1 = t0 + Duration::from_secs(3);
    send_at(&mut app, turn("m1"), t1);
    send_at(&mut app, ClientEvent::Delta(Delta::reasoning("still thinking")), t1);
    let rows = render_frame(&mut app, 60, 30, t1);
    assert!(rows.iter().any(|r| r.contains("Thinking")), "{rows:#?}");

    send_at(&mut app, ClientEvent::Delta(Delta::text("SECOND")), t1);
    send_at(&mut app, ClientEvent::Delta(Delta::turn_end(TurnOutcome::Success)), t1);
    let rows = render_frame(&mut app, 60, 30, t1);
    assert_eq!(rows.iter().filter(|r| r.contains("FIRST")).count(), 1);
    assert_eq!(rows.iter().filter(|r| r.contains("SECOND")).count(), 1);
}
