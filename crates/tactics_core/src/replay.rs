//! Replay system for recording and playing back matches.
//!
//! Replays store the match configuration, the seed, and the stream of
//! accepted steps. A step is either an [`Intent`] or a whole AI turn; AI
//! turns are reproduced by running the decision engine again, which is
//! deterministic given the match state. Rejected intents change nothing and
//! are never recorded.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ai::{AiConfig, DecisionEngine};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::player_facade::Intent;
use crate::setup::MatchConfig;
use crate::simulation::Match;

/// One recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplayStep {
    /// An intent issued by a command source.
    Intent(Intent),
    /// A full turn played by the decision engine.
    AiTurn,
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario name.
    pub scenario_id: String,
    /// Random seed used for the match.
    pub seed: u64,
    /// Configuration the match was built from.
    pub config: MatchConfig,
    /// Tuning of the decision engine for AI turns.
    pub ai: AiConfig,
    /// Accepted steps in order.
    pub steps: Vec<ReplayStep>,
    /// Turn counter when recording stopped.
    pub final_turn: u32,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay for a match about to be built from `config`.
    #[must_use]
    pub fn new(scenario_id: impl Into<String>, seed: u64, config: MatchConfig, ai: AiConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed,
            config,
            ai,
            steps: Vec::new(),
            final_turn: 0,
            final_hash: 0,
        }
    }

    /// Record an accepted step.
    pub fn record(&mut self, step: ReplayStep) {
        self.steps.push(step);
    }

    /// Finalize the replay with the end state.
    pub fn finalize(&mut self, game: &Match) {
        self.final_turn = game.turn();
        self.final_hash = game.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or the
    /// version does not match.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::Snapshot(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::Snapshot(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Build the starting match.
    ///
    /// # Errors
    /// Returns the configuration error if the stored config is invalid.
    pub fn initial_state(&self) -> Result<Match> {
        Match::new(self.config.clone(), self.seed)
    }

    /// Get the total number of recorded steps.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    game: Match,
    engine: DecisionEngine,
    /// Index into the step stream.
    step_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned before the first step.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be built.
    pub fn new(replay: Replay) -> Result<Self> {
        let game = replay.initial_state()?;
        let engine = DecisionEngine::new(replay.ai);
        Ok(Self {
            replay,
            game,
            engine,
            step_index: 0,
        })
    }

    /// Play the next step. Returns `None` once every step has been played.
    ///
    /// A recorded intent that is rejected on playback means the replay does
    /// not belong to this engine version; the error is returned.
    pub fn advance(&mut self) -> Option<Result<Vec<GameEvent>>> {
        let step = *self.replay.steps.get(self.step_index)?;
        self.step_index += 1;
        Some(match step {
            ReplayStep::Intent(intent) => self.game.apply(intent),
            ReplayStep::AiTurn => Ok(self.engine.take_turn(&mut self.game)),
        })
    }

    /// Play every remaining step.
    ///
    /// # Errors
    /// Returns the first playback rejection.
    pub fn run_to_end(&mut self) -> Result<()> {
        while let Some(outcome) = self.advance() {
            outcome?;
        }
        Ok(())
    }

    /// Play to the end and compare with the recorded final hash.
    ///
    /// # Errors
    /// Returns the first playback rejection.
    pub fn verify(&mut self) -> Result<bool> {
        self.run_to_end()?;
        Ok(self.game.state_hash() == self.replay.final_hash)
    }

    /// Current match state.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether every step has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.step_index >= self.replay.steps.len()
    }

    /// Steps played so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.step_index
    }
}
