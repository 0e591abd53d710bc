//! JSON lines emitted by `autoplay --json` and `replay --json`.
//!
//! One object per line on stdout; logs go to stderr.
//!
//! # Example Output
//!
//! ```text
//! {"type":"event","turn":1,"event":{"Built":{...}}}
//! {"type":"game_over","scenario":"Skirmish","seed":42,"winner":"Red","turn":17,"faction_turns":33,"state_hash":"0x..."}
//! ```

use serde::{Deserialize, Serialize};
use tactics_core::events::GameEvent;
use tactics_core::factions::FactionId;
use tactics_core::Match;

/// Lines written by the non-interactive subcommands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Something happened in the match.
    Event {
        /// Turn counter when it happened.
        turn: u32,
        /// The event.
        event: GameEvent,
    },

    /// The run stopped, either with a winner or at the turn limit.
    GameOver {
        /// Scenario name.
        scenario: String,
        /// Seed played.
        seed: u64,
        /// Winner, `None` if the turn limit was hit first.
        winner: Option<FactionId>,
        /// Turn counter at the end.
        turn: u32,
        /// Faction turns played.
        faction_turns: u64,
        /// Final state hash, hex encoded.
        state_hash: String,
    },

    /// A replay was played back.
    ReplayChecked {
        /// Scenario name.
        scenario: String,
        /// Steps played.
        steps: usize,
        /// Whether the final hash matched the recording.
        matches: bool,
        /// Final state hash, hex encoded.
        state_hash: String,
    },

    /// A subcommand failed.
    Error {
        /// Stable reason code when the engine produced the error.
        code: Option<String>,
        /// Message.
        message: String,
    },
}

/// Format a state hash the way every report shows it.
#[must_use]
pub fn hex_hash(hash: u64) -> String {
    format!("{hash:#018x}")
}

impl Response {
    /// Final summary of a match.
    #[must_use]
    pub fn game_over(scenario: &str, seed: u64, game: &Match, faction_turns: u64) -> Self {
        Self::GameOver {
            scenario: scenario.to_string(),
            seed,
            winner: game.winner(),
            turn: game.turn(),
            faction_turns,
            state_hash: hex_hash(game.state_hash()),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, code: Option<&str>) -> Self {
        Self::Error {
            code: code.map(String::from),
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","code":null,"message":"Serialization failed: {}"}}"#,
                e
            )
        });
        json.push('\n');
        json
    }
}
