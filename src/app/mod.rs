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

mod accumulator;
mod events;
mod follow;
pub mod permissions;
mod reasoning;
mod scroll;
mod scroll_driver;
mod state;
mod tool_lifecycle;
mod viewport;

pub use accumulator::{
    ArgsError, SegmentAccumulator, StreamingState, TranscriptEvent, parse_tool_args,
};
pub use events::{handle_client_event, handle_client_event_at, handle_terminal_event};
pub use follow::{FollowChange, FollowConfig, FollowController, WheelDirection};
pub use reasoning::{ReasoningPhase, ReasoningTiming, ReasoningTracker};
pub use scroll::{ScrollConfig, ScrollState};
pub use scroll_driver::{
    DriverConfig, DriverTick, FrameScheduler, ScrollDriver, Scheduler, TickHandle,
};
pub use state::{
    App, AppStatus, Message, MessageRole, Segment, SegmentKind, TokenUsage, ToolSegment,
};
pub use tool_lifecycle::{
    COMMAND_TOOLS, FILE_TOOLS, ToolPhase, derive_permission_key, is_declined_result,
    permission_matches, tool_phase,
};
pub use viewport::{ChatViewport, Viewport, ViewportMetrics};

use crate::Cli;
use crate::error::AppError;
use crossterm::event::EventStream;
use futures::{FutureExt as _, StreamExt};
use std::time::{Duration, Instant};

#[must_use]
pub fn create_app(cli: &Cli) -> App {
    let config = cli.scroll_config();
    tracing::info!(
        idle_threshold = config.follow.idle_threshold,
        streaming_threshold = config.follow.streaming_threshold,
        max_step = config.driver.max_step,
        "transcript view configured"
    );
    let mut app = App::new(config);
    app.accumulator.subscribe(|event| tracing::trace!(?event, "transcript event"));
    app
}

// ---------------------------------------------------------------------------
// TUI event loop
// ---------------------------------------------------------------------------

pub async fn run_tui(app: &mut App) -> anyhow::Result<()> {
    let mut terminal = ratatui::try_init().map_err(|err| {
        tracing::error!("Failed to initialize terminal: {err}");
        anyhow::Error::new(AppError::TerminalUnavailable).context(err)
    })?;

    // Mouse capture delivers wheel gestures (ignore error on unsupported terminals)
    let _ = crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture);

    let result = event_loop(app, &mut terminal).await;

    let _ = crossterm::execute!(std::io::stdout(), crossterm::event::DisableMouseCapture);
    ratatui::restore();
    result
}

async fn event_loop(app: &mut App, terminal: &mut ratatui::DefaultTerminal) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let frame_duration = Duration::from_millis(16);
    let mut last_render = Instant::now();

    loop {
        // Phase 1: wait for at least one event or the next frame
        let time_to_next = frame_duration.saturating_sub(last_render.elapsed());
        tokio::select! {
            Some(Ok(event)) = events.next() => {
                events::handle_terminal_event(app, event);
            }
            Some(event) = app.event_rx.recv() => {
                events::handle_client_event(app, event);
            }
            () = tokio::time::sleep(time_to_next) => {}
        }

        // Phase 2: drain everything already queued (non-blocking)
        loop {
            if let Some(Some(Ok(event))) = events.next().now_or_never() {
                events::handle_terminal_event(app, event);
                continue;
            }
            match app.event_rx.try_recv() {
                Ok(event) => events::handle_client_event(app, event),
                Err(_) => break,
            }
        }

        if app.should_quit {
            break;
        }

        // Phase 3: render once; the scroll driver ticks inside the render
        if app.is_streaming() {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
        }
        app.frame_instant = Instant::now();
        terminal.draw(|f| crate::ui::render(f, app))?;
        last_render = Instant::now();
    }

    Ok(())
}
