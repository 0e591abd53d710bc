//! Immutable rule tables injected at match construction.
//!
//! All structs are plain data designed to be deserialized from RON.
//!
//! **Note:** This module contains no IO - it only defines data types and
//! parses strings. File loading is handled by `tactics_cli`.

mod level_data;
mod terrain_data;
mod tuning;
mod unit_data;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

pub use level_data::{LevelStep, LevelTable, StatBonus};
pub use terrain_data::TerrainTable;
pub use tuning::{AbilityTuning, EconomyRules};
pub use unit_data::{UnitStats, UnitTable};

/// Every tunable number of the game.
///
/// Omitted sections fall back to [`GameRules::standard`] values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Terrain properties.
    pub terrain: TerrainTable,
    /// Unit roster.
    pub units: UnitTable,
    /// Level ladder.
    pub levels: LevelTable,
    /// Ability numbers.
    pub abilities: AbilityTuning,
    /// Gold flow.
    pub economy: EconomyRules,
}

impl GameRules {
    /// The standard ruleset.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
    }

    /// Parse rules from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigurationError`] for syntax errors and for
    /// tables that fail validation.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::config(format!("invalid rules: {e}")))
    }

    /// Serialize to pretty RON.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::config(format!("cannot encode rules: {e}")))
    }
}
