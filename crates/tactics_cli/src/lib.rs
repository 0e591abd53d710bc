//! Terminal front end for the tactics engine.
//!
//! Everything here sits on top of `tactics_core` and only talks to it through
//! intents, queries, and faction views:
//!
//! - **play**: a human at a text prompt against the AI
//! - **autoplay**: AI against AI, optionally as JSON lines
//! - **validate**: check that a scenario file builds a match
//! - **replay**: play back and verify a recorded match
//!
//! # Output
//!
//! The prompt and summaries go to stdout, logs to stderr. With `--json`,
//! stdout carries one [`protocol::Response`] per line.
//!
//! # Example
//!
//! ```bash
//! # Play the built-in skirmish as Blue
//! cargo run -p tactics_cli -- play --seed 7
//!
//! # Watch two AIs play a shipped scenario
//! cargo run -p tactics_cli -- autoplay --scenario crates/tactics_cli/scenarios/river_crossing.ron
//!
//! # Record, then verify
//! cargo run -p tactics_cli -- autoplay --seed 3 --record match.replay
//! cargo run -p tactics_cli -- replay match.replay --verify
//! ```

pub mod autoplay;
pub mod command;
pub mod error;
pub mod prompt;
pub mod protocol;
pub mod render;
pub mod scenario;
pub mod session;

pub use autoplay::{autoplay, AutoplayOptions, AutoplayOutcome};
pub use error::{CliError, Result};
pub use prompt::Prompt;
pub use protocol::Response;
pub use scenario::{Scenario, ScenarioError};
pub use session::{Session, SessionEnd};
