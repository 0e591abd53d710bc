//! Error type for the terminal front end.

use std::path::PathBuf;

use tactics_core::error::GameError;
use thiserror::Error;

use crate::scenario::ScenarioError;

/// Errors surfaced by CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    /// Scenario could not be loaded or built.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The engine rejected something fatally.
    #[error("{0}")]
    Game(#[from] GameError),
    /// Terminal or file IO failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON output could not be produced.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A replay played back to a different final state.
    #[error("Replay {} diverged: expected hash {expected:#018x}, got {actual:#018x}", path.display())]
    ReplayDiverged {
        /// Replay file.
        path: PathBuf,
        /// Recorded hash.
        expected: u64,
        /// Hash after playback.
        actual: u64,
    },
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

impl CliError {
    /// Engine reason code, when the engine produced the error.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::Game(err) | Self::Scenario(ScenarioError::Invalid(err)) => Some(err.code()),
            Self::ReplayDiverged { .. } => Some("replay_diverged"),
            _ => None,
        }
    }
}
