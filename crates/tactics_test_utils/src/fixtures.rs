//! Test fixtures and helpers.
//!
//! Hand-placed matches on all-plains grids, so tests control exactly which
//! unit stands where without terrain getting in the way.

use fixed::types::I32F32;
use tactics_core::data::GameRules;
use tactics_core::factions::{Controller, FactionId};
use tactics_core::math::GridPos;
use tactics_core::setup::{FactionSetup, MatchConfig, StartingUnit};
use tactics_core::terrain::TerrainKind;
use tactics_core::unit::UnitId;
use tactics_core::unit_kind::UnitKind;
use tactics_core::Match;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Builder for small hand-placed matches.
///
/// Units get sequence numbers in the order they are added, starting at 2
/// (the base is always 1).
#[derive(Debug, Clone)]
pub struct MatchBuilder {
    config: MatchConfig,
}

impl MatchBuilder {
    /// An all-plains grid with Blue's base at the top-left corner and Red's
    /// at the bottom-right. Both sides are human-controlled.
    #[must_use]
    pub fn plains(width: u32, height: u32) -> Self {
        let setup = |faction, base| FactionSetup {
            faction,
            controller: Controller::Human,
            base,
            units: Vec::new(),
            gold: None,
        };
        let row = TerrainKind::Plains.layout_char().to_string().repeat(width as usize);
        Self {
            config: MatchConfig {
                width,
                height,
                layout: vec![row; height as usize],
                factions: vec![
                    setup(FactionId::Blue, GridPos::new(0, 0)),
                    setup(
                        FactionId::Red,
                        GridPos::new(width as i32 - 1, height as i32 - 1),
                    ),
                ],
                rules: GameRules::standard(),
            },
        }
    }

    fn setup_mut(&mut self, faction: FactionId) -> &mut FactionSetup {
        &mut self.config.factions[faction.index()]
    }

    /// Move a faction's base.
    #[must_use]
    pub fn base(mut self, faction: FactionId, x: i32, y: i32) -> Self {
        self.setup_mut(faction).base = GridPos::new(x, y);
        self
    }

    /// Add a starting unit.
    #[must_use]
    pub fn unit(mut self, faction: FactionId, kind: UnitKind, x: i32, y: i32) -> Self {
        self.setup_mut(faction).units.push(StartingUnit {
            kind,
            position: GridPos::new(x, y),
        });
        self
    }

    /// Override a faction's starting gold.
    #[must_use]
    pub fn gold(mut self, faction: FactionId, gold: u32) -> Self {
        self.setup_mut(faction).gold = Some(gold);
        self
    }

    /// Set a faction's controller.
    #[must_use]
    pub fn controller(mut self, faction: FactionId, controller: Controller) -> Self {
        self.setup_mut(faction).controller = controller;
        self
    }

    /// Replace a single terrain cell.
    #[must_use]
    pub fn terrain(mut self, x: i32, y: i32, kind: TerrainKind) -> Self {
        if let Some(row) = self.config.layout.get_mut(y as usize) {
            let mut cells: Vec<char> = row.chars().collect();
            if let Some(cell) = cells.get_mut(x as usize) {
                *cell = kind.layout_char();
            }
            *row = cells.into_iter().collect();
        }
        self
    }

    /// Edit the rule tables.
    #[must_use]
    pub fn rules(mut self, edit: impl FnOnce(&mut GameRules)) -> Self {
        edit(&mut self.config.rules);
        self
    }

    /// The configuration built so far.
    #[must_use]
    pub fn config(self) -> MatchConfig {
        self.config
    }

    /// Build the match.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    #[must_use]
    pub fn build(self, seed: u64) -> Match {
        match Match::new(self.config, seed) {
            Ok(game) => game,
            Err(err) => panic!("fixture match is invalid: {err}"),
        }
    }
}

/// Id of the `n`th unit added to a faction through [`MatchBuilder::unit`].
#[must_use]
pub const fn nth_unit(faction: FactionId, n: u32) -> UnitId {
    UnitId::new(faction, n + 2)
}

/// The default skirmish with both sides driven by the decision engine.
#[must_use]
pub fn ai_skirmish() -> MatchConfig {
    MatchConfig::skirmish().with_controllers(Controller::Ai, Controller::Ai)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_places_units() {
        let game = MatchBuilder::plains(6, 4)
            .unit(FactionId::Blue, UnitKind::Warrior, 1, 1)
            .unit(FactionId::Red, UnitKind::Archer, 4, 2)
            .gold(FactionId::Red, 7)
            .build(1);

        let warrior = game.unit(nth_unit(FactionId::Blue, 0)).unwrap();
        assert_eq!(warrior.kind(), UnitKind::Warrior);
        assert_eq!(warrior.position(), Some(GridPos::new(1, 1)));
        assert_eq!(game.faction(FactionId::Red).gold(), 7);
        assert_eq!(
            game.faction(FactionId::Red).base().position(),
            Some(GridPos::new(5, 3))
        );
    }

    #[test]
    fn test_terrain_override() {
        let config = MatchBuilder::plains(3, 3)
            .terrain(1, 1, TerrainKind::Mountain)
            .config();
        assert_eq!(config.layout[1], "PMP");
    }
}
