// =====
// TESTS: 8
// =====
//
// Follow controller and scroll driver working together against a viewport,
// plus the same behavior driven through app input events.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use live_transcript::agent::events::{ClientEvent, Delta};
use live_transcript::app::{
    ChatViewport, ScrollConfig, ScrollState, Viewport as _, WheelDirection, handle_terminal_event,
};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

use crate::helpers::{FRAME, render_frame, send_client_event, send_deltas, test_app};

struct Rig {
    scroll: ScrollState,
    viewport: ChatViewport,
    now: Instant,
}

impl Rig {
    /// Pixel host, viewport parked at the bottom, turn streaming.
    fn streaming_at_bottom() -> Self {
        let mut viewport = ChatViewport::new();
        viewport.set_client_height(600.0);
        viewport.set_content_height(600.0);
        let mut scroll = ScrollState::new(ScrollConfig::pixels());
        scroll.begin_turn(viewport.metrics());
        Self { scroll, viewport, now: Instant::now() }
    }

    fn grow(&mut self, by: f32) {
        let height = self.viewport.metrics().scroll_height + by;
        if self.viewport.set_content_height(height) {
            self.scroll.observe_content_growth();
        }
    }

    /// Advance one frame; returns the scroll top after it.
    fn frame(&mut self, elapsed: Duration) -> f32 {
        self.now += elapsed;
        self.scroll.on_frame(self.now, Some(&mut self.viewport));
        let metrics = self.viewport.metrics();
        assert!(metrics.scroll_top <= metrics.max_scroll_top(), "overshoot at {metrics:?}");
        metrics.scroll_top
    }

    fn settle(&mut self) {
        for _ in 0..1000 {
            if !self.scroll.driver_running() {
                return;
            }
            self.frame(FRAME);
        }
        panic!("driver never settled");
    }

    fn wheel_up(&mut self, by: f32) {
        self.viewport.scroll_by(-by);
        self.scroll.observe_wheel(WheelDirection::Up, self.viewport.metrics());
    }
}

#[test]
fn successive_growth_converges_without_overshoot() {
    let mut rig = Rig::streaming_at_bottom();
    for _ in 0..10 {
        rig.grow(50.0);
        rig.frame(FRAME);
        rig.frame(FRAME);
    }
    rig.settle();

    let metrics = rig.viewport.metrics();
    assert_eq!(metrics.scroll_top, metrics.max_scroll_top());
    assert_eq!(metrics.max_scroll_top(), 500.0);
    assert!(rig.scroll.should_follow());
}

#[test]
fn irregular_frame_spacing_still_converges() {
    let mut rig = Rig::streaming_at_bottom();
    let gaps = [3, 40, 16, 120, 1, 16, 33];
    rig.grow(2000.0);
    for gap in gaps.iter().cycle().take(400) {
        rig.frame(Duration::from_millis(*gap));
        if !rig.scroll.driver_running() {
            break;
        }
    }
    let metrics = rig.viewport.metrics();
    assert_eq!(metrics.scroll_top, metrics.max_scroll_top());
}

#[test]
fn upward_gesture_freezes_scroll_position() {
    let mut rig = Rig::streaming_at_bottom();
    rig.grow(300.0);
    rig.settle();

    rig.wheel_up(120.0);
    assert!(!rig.scroll.should_follow());
    assert!(!rig.scroll.driver_running());
    let parked = rig.viewport.metrics().scroll_top;

    for _ in 0..5 {
        rig.grow(50.0);
        rig.frame(FRAME);
    }
    assert_eq!(rig.viewport.metrics().scroll_top, parked);
    assert!(!rig.scroll.should_follow());
}

#[test]
fn following_resumes_only_near_bottom() {
    let mut rig = Rig::streaming_at_bottom();
    rig.grow(1000.0);
    rig.settle();
    rig.wheel_up(600.0);

    // Still far away: scrolling down a little does not resume.
    rig.viewport.scroll_by(100.0);
    rig.scroll.observe_wheel(WheelDirection::Down, rig.viewport.metrics());
    assert!(!rig.scroll.should_follow());

    rig.viewport.scroll_to_bottom();
    rig.scroll.observe_scroll(rig.viewport.metrics());
    assert!(rig.scroll.should_follow());

    rig.grow(80.0);
    assert!(rig.scroll.driver_running());
    rig.settle();
    let metrics = rig.viewport.metrics();
    assert_eq!(metrics.scroll_top, metrics.max_scroll_top());
}

#[test]
fn streaming_threshold_is_wider_than_idle() {
    let mut rig = Rig::streaming_at_bottom();
    rig.grow(1000.0);
    rig.settle();
    rig.wheel_up(100.0);
    assert!(!rig.scroll.should_follow());

    // 100px from the bottom: inside the streaming threshold.
    rig.scroll.observe_scroll(rig.viewport.metrics());
    assert!(rig.scroll.should_follow());

    rig.scroll.end_turn();
    rig.viewport.scroll_by(-50.0);
    rig.scroll.observe_scroll(rig.viewport.metrics());
    assert!(!rig.scroll.should_follow(), "150px is outside the idle threshold");
}

// --- Through the app ---

fn wheel(kind: MouseEventKind) -> Event {
    Event::Mouse(MouseEvent { kind, column: 0, row: 0, modifiers: KeyModifiers::NONE })
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn long_text(lines: usize) -> String {
    (0..lines).map(|i| format!("line {i}\n\n")).collect()
}

#[test]
fn app_follows_streaming_text_to_the_last_line() {
    let mut app = test_app();
    let mut now = Instant::now();
    send_client_event(&mut app, ClientEvent::TurnStarted { message_id: None });
    send_deltas(&mut app, [Delta::text(long_text(30))]);

    let mut rows = Vec::new();
    for _ in 0..200 {
        now += FRAME;
        rows = render_frame(&mut app, 40, 12, now);
        if !app.scroll.driver_running() {
            break;
        }
    }
    assert!(rows.iter().any(|r| r.contains("line 29")), "{rows:#?}");
    assert!(app.scroll.should_follow());
}

#[test]
fn app_wheel_up_pauses_and_end_resumes() {
    let mut app = test_app();
    let mut now = Instant::now();
    send_client_event(&mut app, ClientEvent::TurnStarted { message_id: None });
    send_deltas(&mut app, [Delta::text(long_text(30))]);
    for _ in 0..200 {
        now += FRAME;
        render_frame(&mut app, 40, 12, now);
    }

    handle_terminal_event(&mut app, wheel(MouseEventKind::ScrollUp));
    assert!(!app.scroll.should_follow());
    let parked = app.viewport.metrics().scroll_top;

    send_deltas(&mut app, [Delta::text(long_text(10))]);
    for _ in 0..20 {
        now += FRAME;
        render_frame(&mut app, 40, 12, now);
    }
    assert_eq!(app.viewport.metrics().scroll_top, parked);

    handle_terminal_event(&mut app, key(KeyCode::End));
    assert!(app.scroll.should_follow());
    let metrics = app.viewport.metrics();
    assert_eq!(metrics.scroll_top, metrics.max_scroll_top());
}

#[test]
fn conversation_switch_resets_follow_state() {
    let mut app = test_app();
    let now = Instant::now();
    send_client_event(&mut app, ClientEvent::TurnStarted { message_id: None });
    send_deltas(&mut app, [Delta::text(long_text(30))]);
    render_frame(&mut app, 40, 12, now + FRAME);
    handle_terminal_event(&mut app, wheel(MouseEventKind::ScrollUp));
    assert!(!app.scroll.should_follow());

    send_client_event(&mut app, ClientEvent::ConversationLoaded(Vec::new()));
    assert!(app.scroll.should_follow());
    assert!(!app.scroll.driver_running());
    assert!(!app.is_streaming());
    assert_eq!(app.viewport.metrics().scroll_top, 0.0);
}
