//! Scenario loading and configuration.
//!
//! Scenarios wrap a [`MatchConfig`] with a name and an optional fixed seed so
//! maps can live in RON files next to the binary.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tactics_core::error::GameError;
use tactics_core::setup::MatchConfig;
use tactics_core::Match;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to encode scenario: {0}")]
    EncodeError(#[from] ron::Error),
    /// Parsed, but the engine refused to build a match from it.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] GameError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Seed to use when none is given on the command line.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Grid, placements, and rules.
    pub map: MatchConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Encode as pretty RON.
    pub fn to_ron(&self) -> Result<String, ScenarioError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// The built-in 12x10 skirmish.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Skirmish".to_string(),
            description: "Two bases in opposite corners with mines along the flanks".to_string(),
            seed: None,
            map: MatchConfig::skirmish(),
        }
    }

    /// Load `path` if given, otherwise the built-in skirmish.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ScenarioError> {
        path.map_or_else(|| Ok(Self::skirmish()), Self::load)
    }

    /// Seed to play with: the explicit one, else the scenario's, else 0.
    #[must_use]
    pub fn resolve_seed(&self, explicit: Option<u64>) -> u64 {
        explicit.or(self.seed).unwrap_or(0)
    }

    /// Construct the match.
    pub fn build(&self, seed: u64) -> Result<Match, ScenarioError> {
        Ok(Match::new(self.map.clone(), seed)?)
    }
}
