//! Load-time match configuration.
//!
//! A [`MatchConfig`] holds everything needed to build a [`crate::Match`]:
//! grid dimensions, terrain layout, starting positions, and rules. It is
//! plain serde data so scenarios can live in RON files.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::GameRules;
use crate::error::{GameError, Result};
use crate::factions::{Controller, FactionId};
use crate::math::GridPos;
use crate::terrain::TerrainGrid;
use crate::unit_kind::UnitKind;

/// Default skirmish map, 12x10. Bases sit on the `B` cells.
pub const SKIRMISH_LAYOUT: [&str; 10] = [
    "PPPPPPPPPPPP",
    "PBFPPPPPPPFP",
    "PPFFPGPPPGPP",
    "PPMMPPPPMMGP",
    "PPPPMPMPPPPP",
    "PPPPMPMPPPPP",
    "PGMMGPPPPMMP",
    "PPGPPPGFFGPP",
    "PFPPPPPPPGBP",
    "PPPPPPPPPPPP",
];

/// A unit placed at match start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingUnit {
    /// Kind.
    pub kind: UnitKind,
    /// Cell.
    pub position: GridPos,
}

/// Starting state of one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionSetup {
    /// Which faction.
    pub faction: FactionId,
    /// Who issues its intents.
    #[serde(default)]
    pub controller: Controller,
    /// Base cell.
    pub base: GridPos,
    /// Units besides the base.
    #[serde(default)]
    pub units: Vec<StartingUnit>,
    /// Overrides the rules' starting gold.
    #[serde(default)]
    pub gold: Option<u32>,
}

/// Everything needed to start a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Terrain rows, one character per cell.
    pub layout: Vec<String>,
    /// Exactly one entry per faction.
    pub factions: Vec<FactionSetup>,
    /// Rule tables.
    #[serde(default)]
    pub rules: GameRules,
}

impl MatchConfig {
    /// The default 12x10 skirmish: human Blue against AI Red.
    #[must_use]
    pub fn skirmish() -> Self {
        let unit = |kind, x, y| StartingUnit {
            kind,
            position: GridPos::new(x, y),
        };
        Self {
            width: 12,
            height: 10,
            layout: SKIRMISH_LAYOUT.iter().map(|row| (*row).to_string()).collect(),
            factions: vec![
                FactionSetup {
                    faction: FactionId::Blue,
                    controller: Controller::Human,
                    base: GridPos::new(1, 1),
                    units: vec![
                        unit(UnitKind::Warrior, 1, 2),
                        unit(UnitKind::Archer, 2, 1),
                    ],
                    gold: None,
                },
                FactionSetup {
                    faction: FactionId::Red,
                    controller: Controller::Ai,
                    base: GridPos::new(10, 8),
                    units: vec![
                        unit(UnitKind::Warrior, 10, 7),
                        unit(UnitKind::Archer, 9, 8),
                    ],
                    gold: None,
                },
            ],
            rules: GameRules::standard(),
        }
    }

    /// Set every faction's controller.
    #[must_use]
    pub fn with_controllers(mut self, blue: Controller, red: Controller) -> Self {
        for setup in &mut self.factions {
            setup.controller = match setup.faction {
                FactionId::Blue => blue,
                FactionId::Red => red,
            };
        }
        self
    }

    /// Setup entry for a faction.
    #[must_use]
    pub fn setup(&self, faction: FactionId) -> Option<&FactionSetup> {
        self.factions.iter().find(|s| s.faction == faction)
    }

    /// Parse the layout and check every placement.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigurationError`] for a malformed layout,
    /// missing or duplicated factions, out-of-bounds, impassable, or
    /// overlapping placements, and attempts to place extra bases.
    pub fn validate(&self) -> Result<TerrainGrid> {
        let grid = TerrainGrid::from_layout(self.width, self.height, &self.layout)?;

        for faction in FactionId::ALL {
            let count = self.factions.iter().filter(|s| s.faction == faction).count();
            if count != 1 {
                return Err(GameError::config(format!(
                    "expected exactly one setup for {}, found {count}",
                    faction.display_name()
                )));
            }
        }
        if self.factions.len() != FactionId::ALL.len() {
            return Err(GameError::config("unexpected extra faction setup"));
        }

        let mut taken = BTreeSet::new();
        for setup in &self.factions {
            let placements = std::iter::once((UnitKind::Base, setup.base))
                .chain(setup.units.iter().map(|u| (u.kind, u.position)));
            for (kind, pos) in placements {
                let Some(terrain) = grid.kind_at(pos) else {
                    return Err(GameError::config(format!(
                        "{kind} for {} at {pos} is out of bounds",
                        setup.faction.display_name()
                    )));
                };
                if self.rules.terrain.move_cost(terrain).is_none() {
                    return Err(GameError::config(format!(
                        "{kind} for {} at {pos} stands on impassable terrain",
                        setup.faction.display_name()
                    )));
                }
                if !taken.insert(pos) {
                    return Err(GameError::config(format!("two units start at {pos}")));
                }
            }
            if setup.units.iter().any(|u| u.kind.is_base()) {
                return Err(GameError::config(format!(
                    "{} lists a base among its starting units",
                    setup.faction.display_name()
                )));
            }
        }

        Ok(grid)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::skirmish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skirmish_is_valid() {
        let config = MatchConfig::skirmish();
        let grid = config.validate().unwrap();
        assert_eq!(grid.width(), 12);
        assert_eq!(grid.height(), 10);
        assert_eq!(
            config.setup(FactionId::Red).map(|s| s.base),
            Some(GridPos::new(10, 8))
        );
    }

    #[test]
    fn test_overlap_is_rejected() {
        let mut config = MatchConfig::skirmish();
        config.factions[0].units[0].position = GridPos::new(1, 1);
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), "configuration_error");
    }

    #[test]
    fn test_missing_faction_is_rejected() {
        let mut config = MatchConfig::skirmish();
        config.factions.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut config = MatchConfig::skirmish();
        config.factions[1].base = GridPos::new(12, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_controllers() {
        let config = MatchConfig::skirmish().with_controllers(Controller::Ai, Controller::Ai);
        assert!(config
            .factions
            .iter()
            .all(|s| s.controller == Controller::Ai));
    }
}
