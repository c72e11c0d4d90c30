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

use crate::agent::replay::ReplayError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Replay file not found")]
    ReplayNotFound,
    #[error("Replay file is malformed")]
    ReplayMalformed,
    #[error("Terminal unavailable")]
    TerminalUnavailable,
}

impl AppError {
    pub const REPLAY_NOT_FOUND_EXIT_CODE: i32 = 20;
    pub const REPLAY_MALFORMED_EXIT_CODE: i32 = 21;
    pub const TERMINAL_UNAVAILABLE_EXIT_CODE: i32 = 22;

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ReplayNotFound => Self::REPLAY_NOT_FOUND_EXIT_CODE,
            Self::ReplayMalformed => Self::REPLAY_MALFORMED_EXIT_CODE,
            Self::TerminalUnavailable => Self::TERMINAL_UNAVAILABLE_EXIT_CODE,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ReplayNotFound => "Replay file not found. Pass a path to a JSON-lines recording.",
            Self::ReplayMalformed => {
                "Replay file could not be decoded. Each line must be one JSON stream event."
            }
            Self::TerminalUnavailable => {
                "Could not initialize the terminal. Run from an interactive terminal."
            }
        }
    }
}

impl From<&ReplayError> for AppError {
    fn from(err: &ReplayError) -> Self {
        match err {
            ReplayError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                Self::ReplayNotFound
            }
            ReplayError::Io { .. } | ReplayError::Decode { .. } => Self::ReplayMalformed,
        }
    }
}
