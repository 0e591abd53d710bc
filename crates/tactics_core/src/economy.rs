//! Gold and unit production.
//!
//! Gold is only earned during upkeep (see [`crate::systems::income_for`])
//! and only spent here. New units appear on the first free spawnable cell
//! around their base and may act on the turn they are built.

use tracing::debug;

use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::factions::FactionId;
use crate::math::{GridPos, SURROUNDING};
use crate::simulation::Match;
use crate::systems::income_for;
use crate::unit::Unit;
use crate::unit_kind::UnitKind;

impl Match {
    /// First free spawnable cell around a faction's base, searched
    /// orthogonals first, then diagonals.
    #[must_use]
    pub fn spawn_cell(&self, faction: FactionId) -> Option<GridPos> {
        let base = self.faction(faction).base().position()?;
        SURROUNDING
            .iter()
            .map(|&d| base.offset(d))
            .find(|&pos| {
                self.grid
                    .kind_at(pos)
                    .is_some_and(|kind| self.rules.terrain.get(kind).spawnable)
                    && !self.is_occupied(pos)
            })
    }

    /// Gold the active faction would collect at its next upkeep if nothing
    /// moved: `(flat, terrain)`.
    #[must_use]
    pub fn income_preview(&self, faction: FactionId) -> (u32, u32) {
        income_for(self.faction(faction), &self.grid, &self.rules)
    }

    /// Whether the active faction could build `kind` right now.
    #[must_use]
    pub fn can_build(&self, kind: UnitKind) -> bool {
        let stats = self.rules.units.get(kind);
        matches!(stats.cost, Some(cost) if cost <= self.faction(self.active).gold())
            && self.spawn_cell(self.active).is_some()
            && !self.is_over()
    }

    /// Buy a unit for the active faction.
    ///
    /// # Errors
    ///
    /// - [`GameError::ActionUnavailable`] if the match is over or the kind
    ///   cannot be built
    /// - [`GameError::InsufficientResources`] if gold is short
    /// - [`GameError::IllegalPlacement`] if every cell around the base is
    ///   taken or unsuitable
    pub fn build_unit(&mut self, kind: UnitKind) -> Result<Vec<GameEvent>> {
        self.ensure_acting()?;
        let faction = self.active;
        let stats = *self.rules.units.get(kind);
        let cost = stats
            .cost
            .ok_or_else(|| GameError::unavailable(format!("{kind} cannot be built")))?;
        let available = self.faction(faction).gold();
        if cost > available {
            return Err(GameError::InsufficientResources {
                required: cost,
                available,
            });
        }
        let at = self
            .spawn_cell(faction)
            .ok_or_else(|| GameError::placement("no free cell next to the base"))?;

        let state = self.faction_mut(faction);
        state.spend(cost);
        let id = state.next_unit_id();
        state.push_unit(Unit::new(id, stats, at));
        self.recompute_visibility(faction);
        debug!(unit = %id, %kind, %at, cost, "unit built");
        Ok(vec![GameEvent::Built {
            unit: id,
            kind,
            at,
            cost,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::MatchConfig;
    use crate::unit::UnitId;

    #[test]
    fn test_build_spends_gold_and_spawns_south_first() {
        let mut game = Match::new(MatchConfig::skirmish(), 0).unwrap();
        // South of the base (1, 2) holds the warrior; north (1, 0) is free.
        let events = game.build_unit(UnitKind::Scout).unwrap();
        let id = UnitId::new(FactionId::Blue, 4);
        assert_eq!(
            events,
            vec![GameEvent::Built {
                unit: id,
                kind: UnitKind::Scout,
                at: GridPos::new(1, 0),
                cost: 40,
            }]
        );
        assert_eq!(game.faction(FactionId::Blue).gold(), 85);
        assert!(game.unit(id).unwrap().can_act());
    }

    #[test]
    fn test_insufficient_gold_is_rejected() {
        let mut game = Match::new(MatchConfig::skirmish(), 0).unwrap();
        game.build_unit(UnitKind::Knight).unwrap();
        let before = game.state_hash();
        let err = game.build_unit(UnitKind::Cavalry).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientResources {
                required: 80,
                available: 40
            }
        );
        assert_eq!(game.state_hash(), before);
    }

    #[test]
    fn test_base_is_not_buildable() {
        let mut game = Match::new(MatchConfig::skirmish(), 0).unwrap();
        let err = game.build_unit(UnitKind::Base).unwrap_err();
        assert_eq!(err.code(), "action_unavailable");
    }

    #[test]
    fn test_full_ring_is_illegal_placement() {
        let mut config = MatchConfig::skirmish();
        config.factions[0].gold = Some(10_000);
        let mut game = Match::new(config, 0).unwrap();
        // Forest cells at (2, 1) and (2, 2) are not spawnable; (1, 2) holds the warrior.
        let mut built = 0;
        while game.build_unit(UnitKind::Scout).is_ok() {
            built += 1;
        }
        assert_eq!(built, 5);
        assert_eq!(game.spawn_cell(FactionId::Blue), None);
        let err = game.build_unit(UnitKind::Scout).unwrap_err();
        assert_eq!(err.code(), "illegal_placement");
    }

    #[test]
    fn test_income_preview_matches_upkeep() {
        let game = Match::new(MatchConfig::skirmish(), 0).unwrap();
        assert_eq!(game.income_preview(FactionId::Red), (25, 10));
        assert_eq!(game.income_preview(FactionId::Blue), (25, 0));
    }
}
