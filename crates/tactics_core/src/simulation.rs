//! The match: owner of every piece of mutable game state.
//!
//! A [`Match`] holds the terrain grid, both factions, the turn counter and
//! the seeded random source. Every state change goes through one of its
//! operations; rejected operations return a [`GameError`] and leave the
//! state exactly as it was.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (integers, plus fixed-point in the AI)
//! - One seeded ChaCha8 stream for ability rolls and AI ordering
//! - Ordered containers and id-ordered iteration everywhere
//! - Same seed and intent sequence always produce the same state
//!
//! # Example
//!
//! ```
//! use tactics_core::prelude::*;
//!
//! let mut game = Match::new(MatchConfig::skirmish(), 7).unwrap();
//! let warrior = UnitId::new(FactionId::Blue, 2);
//!
//! game.issue_move(warrior, GridPos::new(1, 4)).unwrap();
//! game.end_turn().unwrap();
//! assert_eq!(game.active(), FactionId::Red);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::GameRules;
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::factions::{Faction, FactionId};
use crate::math::GridPos;
use crate::pathfinding::{self, Path};
use crate::setup::MatchConfig;
use crate::terrain::{TerrainGrid, TerrainKind};
use crate::unit::{Unit, UnitId};
use crate::visibility::VisibilityMap;

/// Where the turn state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Automatic start-of-turn processing for the active faction.
    Upkeep,
    /// The active faction is issuing intents.
    Acting,
    /// A base has fallen. No further intents are accepted.
    Finished,
}

/// A running match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub(crate) rules: GameRules,
    pub(crate) grid: TerrainGrid,
    /// Indexed by [`FactionId::index`].
    pub(crate) factions: [Faction; 2],
    pub(crate) active: FactionId,
    pub(crate) turn: u32,
    pub(crate) phase: Phase,
    pub(crate) winner: Option<FactionId>,
    pub(crate) seed: u64,
    pub(crate) rng: ChaCha8Rng,
}

impl Match {
    /// Build a match and run Blue's first upkeep.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigurationError`] if the configuration is
    /// malformed; see [`MatchConfig::validate`].
    pub fn new(config: MatchConfig, seed: u64) -> Result<Self> {
        let grid = config.validate()?;
        let MatchConfig {
            factions: setups,
            rules,
            ..
        } = config;

        let build_faction = |faction: FactionId| -> Result<Faction> {
            let setup = setups
                .iter()
                .find(|s| s.faction == faction)
                .ok_or_else(|| GameError::config("missing faction setup"))?;
            let base = Unit::new(
                UnitId::new(faction, 1),
                *rules.units.get(crate::unit_kind::UnitKind::Base),
                setup.base,
            );
            let mut state = Faction::new(
                faction,
                setup.controller,
                setup.gold.unwrap_or(rules.economy.starting_gold),
                base,
                VisibilityMap::new(grid.width(), grid.height()),
            );
            for placed in &setup.units {
                let id = state.next_unit_id();
                state.push_unit(Unit::new(id, *rules.units.get(placed.kind), placed.position));
            }
            Ok(state)
        };
        let factions = [build_faction(FactionId::Blue)?, build_faction(FactionId::Red)?];

        let mut game = Self {
            rules,
            grid,
            factions,
            active: FactionId::Blue,
            turn: 1,
            phase: Phase::Upkeep,
            winner: None,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        for faction in FactionId::ALL {
            game.recompute_visibility(faction);
        }
        let opening = game.run_upkeep();
        debug!(events = opening.len(), seed, "match started");
        Ok(game)
    }

    // ------------------------------------------------------------------
    // Read-only accessors
    // ------------------------------------------------------------------

    /// Rule tables.
    #[must_use]
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Terrain grid.
    #[must_use]
    pub const fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    /// State of one faction.
    #[must_use]
    pub fn faction(&self, id: FactionId) -> &Faction {
        &self.factions[id.index()]
    }

    pub(crate) fn faction_mut(&mut self, id: FactionId) -> &mut Faction {
        &mut self.factions[id.index()]
    }

    /// Faction whose turn it is.
    #[must_use]
    pub const fn active(&self) -> FactionId {
        self.active
    }

    /// Turn counter. Starts at 1 and increases when play returns to Blue.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Seed the match was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Winner, once a base has fallen.
    #[must_use]
    pub const fn winner(&self) -> Option<FactionId> {
        self.winner
    }

    /// Re-derive the winner from the bases. Agrees with [`winner`](Self::winner).
    #[must_use]
    pub fn check_winner(&self) -> Option<FactionId> {
        FactionId::ALL
            .into_iter()
            .find(|f| !self.faction(*f).base().is_alive())
            .map(FactionId::opponent)
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.faction(id.faction).unit(id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.factions[id.faction.index()].unit_mut(id)
    }

    /// Every unit of both factions, dead ones included, in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.factions.iter().flat_map(|f| f.units().iter())
    }

    /// The live unit standing on a cell.
    #[must_use]
    pub fn unit_at(&self, pos: GridPos) -> Option<&Unit> {
        self.units()
            .find(|u| u.is_alive() && u.position() == Some(pos))
    }

    /// Whether a live unit stands on a cell.
    #[must_use]
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.unit_at(pos).is_some()
    }

    /// Terrain kind of a cell.
    #[must_use]
    pub fn terrain_at(&self, pos: GridPos) -> Option<TerrainKind> {
        self.grid.kind_at(pos)
    }

    /// Whether `faction` currently sees `pos`.
    #[must_use]
    pub fn is_visible_to(&self, faction: FactionId, pos: GridPos) -> bool {
        self.faction(faction).visibility().is_visible(pos)
    }

    /// Entry cost of a terrain kind for a unit. Every unit shares the terrain
    /// table today.
    #[must_use]
    pub fn move_cost_for(&self, _unit: &Unit, kind: TerrainKind) -> Option<u32> {
        self.rules.terrain.move_cost(kind)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Cheapest move cost to every cell the unit could end its move on.
    ///
    /// Only the unit's own cell is returned if it is stunned, already moved,
    /// or cannot move at all.
    pub fn reachable_costs(&self, id: UnitId) -> Result<BTreeMap<GridPos, u32>> {
        let unit = self.live_unit(id)?;
        let start = unit
            .position()
            .ok_or_else(|| GameError::target(format!("unit {id} is not on the map")))?;
        let budget = if unit.actions.moved {
            0
        } else {
            unit.effective_move_range()
        };
        Ok(pathfinding::reachable_costs(
            &self.grid,
            start,
            budget,
            |kind| self.move_cost_for(unit, kind),
            |pos| pos != start && self.is_occupied(pos),
        ))
    }

    /// Every cell the unit could end its move on this turn, its own included.
    pub fn query_reachable(&self, id: UnitId) -> Result<BTreeSet<GridPos>> {
        Ok(self.reachable_costs(id)?.into_keys().collect())
    }

    /// Minimum-cost path for a unit to a cell, ignoring its move budget.
    pub fn find_path(&self, id: UnitId, goal: GridPos) -> Result<Option<Path>> {
        let unit = self.live_unit(id)?;
        let start = unit
            .position()
            .ok_or_else(|| GameError::target(format!("unit {id} is not on the map")))?;
        Ok(pathfinding::find_path(
            &self.grid,
            start,
            goal,
            |kind| self.move_cost_for(unit, kind),
            |pos| pos != start && self.is_occupied(pos),
        ))
    }

    /// Enemy units the unit could attack right now: alive, currently visible
    /// to its faction, within its effective attack range, and not behind
    /// cover. Sorted by id.
    pub fn query_targets(&self, id: UnitId) -> Result<Vec<UnitId>> {
        let unit = self.live_unit(id)?;
        let Some(from) = unit.position() else {
            return Ok(Vec::new());
        };
        let range = unit.effective_attack_range();
        if range == 0 {
            return Ok(Vec::new());
        }
        let enemy = unit.faction().opponent();
        Ok(self
            .faction(enemy)
            .live_units()
            .filter_map(|e| {
                let pos = e.position()?;
                (self.is_visible_to(unit.faction(), pos)
                    && from.manhattan(pos) <= range
                    && self.has_line_of_fire(unit, from, pos))
                    .then(|| e.id())
            })
            .collect())
    }

    /// Live enemy units `faction` can currently see, in id order.
    pub fn visible_enemies(&self, faction: FactionId) -> impl Iterator<Item = &Unit> {
        self.faction(faction.opponent())
            .live_units()
            .filter(move |u| {
                u.position()
                    .is_some_and(|pos| self.is_visible_to(faction, pos))
            })
    }

    // ------------------------------------------------------------------
    // Unit commands
    // ------------------------------------------------------------------

    /// Move a unit along a minimum-cost path.
    ///
    /// # Errors
    ///
    /// - [`GameError::ActionUnavailable`] if the unit already moved, is
    ///   stunned, or cannot move
    /// - [`GameError::IllegalPlacement`] if the destination is out of bounds
    ///   or occupied
    /// - [`GameError::InvalidTarget`] if no path exists or it costs more than
    ///   the unit's move range
    pub fn issue_move(&mut self, id: UnitId, to: GridPos) -> Result<Vec<GameEvent>> {
        let unit = self.commanded_unit(id)?;
        if unit.actions.moved {
            return Err(GameError::unavailable(format!("{id} has already moved")));
        }
        let budget = unit.effective_move_range();
        if budget == 0 {
            return Err(GameError::unavailable(format!("{id} cannot move")));
        }
        let from = unit
            .position()
            .ok_or_else(|| GameError::target(format!("unit {id} is not on the map")))?;
        if !self.grid.in_bounds(to) {
            return Err(GameError::placement(format!("{to} is off the map")));
        }
        if to == from {
            return Err(GameError::target(format!("{id} is already at {to}")));
        }
        if self.is_occupied(to) {
            return Err(GameError::placement(format!("{to} is occupied")));
        }
        let path = self
            .find_path(id, to)?
            .ok_or_else(|| GameError::target(format!("no path from {from} to {to}")))?;
        if path.cost > budget {
            return Err(GameError::target(format!(
                "{to} is out of range: costs {} but {id} can move {budget}",
                path.cost
            )));
        }

        if let Some(unit) = self.unit_mut(id) {
            unit.set_position(to);
            unit.actions.moved = true;
        }
        self.recompute_visibility(id.faction);
        debug!(unit = %id, %from, %to, cost = path.cost, "unit moved");
        Ok(vec![GameEvent::Moved {
            unit: id,
            from,
            to,
            cost: path.cost,
        }])
    }

    /// Spend every remaining action of a unit.
    pub fn issue_wait(&mut self, id: UnitId) -> Result<Vec<GameEvent>> {
        self.commanded_unit(id)?;
        if let Some(unit) = self.unit_mut(id) {
            unit.actions.exhaust();
        }
        debug!(unit = %id, "unit waits");
        Ok(vec![GameEvent::Waited { unit: id }])
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// A live unit by id.
    pub(crate) fn live_unit(&self, id: UnitId) -> Result<&Unit> {
        match self.unit(id) {
            Some(unit) if unit.is_alive() => Ok(unit),
            Some(_) => Err(GameError::target(format!("unit {id} is dead"))),
            None => Err(GameError::target(format!("no unit {id}"))),
        }
    }

    /// A unit the active faction may command right now.
    pub(crate) fn commanded_unit(&self, id: UnitId) -> Result<&Unit> {
        self.ensure_acting()?;
        if id.faction != self.active {
            return Err(GameError::target(format!(
                "unit {id} does not belong to {}",
                self.active.display_name()
            )));
        }
        let unit = self.live_unit(id)?;
        if unit.is_base() {
            return Err(GameError::unavailable("bases cannot act"));
        }
        if unit.is_stunned() {
            return Err(GameError::unavailable(format!("{id} is stunned")));
        }
        Ok(unit)
    }

    /// Reject intents outside the acting phase.
    pub(crate) fn ensure_acting(&self) -> Result<()> {
        match self.phase {
            Phase::Acting => Ok(()),
            Phase::Finished => Err(GameError::unavailable("the match is over")),
            Phase::Upkeep => Err(GameError::unavailable("upkeep in progress")),
        }
    }

    /// Recompute a faction's fog of war from its live units.
    pub(crate) fn recompute_visibility(&mut self, faction: FactionId) {
        let sources: Vec<(GridPos, u32)> = self
            .faction(faction)
            .live_units()
            .filter_map(|u| u.position().map(|p| (p, u.vision_range())))
            .collect();
        let Self {
            grid,
            rules,
            factions,
            ..
        } = self;
        factions[faction.index()]
            .visibility_mut()
            .recompute(grid, &rules.terrain, sources);
    }

    /// End the match in favor of `winner`.
    pub(crate) fn declare_winner(&mut self, winner: FactionId, events: &mut Vec<GameEvent>) {
        if self.winner.is_some() {
            return;
        }
        self.winner = Some(winner);
        self.phase = Phase::Finished;
        info!(winner = winner.display_name(), turn = self.turn, "base destroyed, match over");
        events.push(GameEvent::MatchWon { winner });
    }

    /// Roll a percent chance on the match's random stream.
    pub(crate) fn roll_percent(&mut self, chance: u32) -> bool {
        if chance == 0 {
            return false;
        }
        self.rng.gen_range(0..100) < chance
    }

    /// Live non-base units of a faction in a seeded random order.
    pub fn shuffled_units(&mut self, faction: FactionId) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .faction(faction)
            .live_units()
            .filter(|u| !u.is_base())
            .map(Unit::id)
            .collect();
        ids.shuffle(&mut self.rng);
        ids
    }

    // ------------------------------------------------------------------
    // Hashing and snapshots
    // ------------------------------------------------------------------

    /// Calculate a hash of the current match state.
    ///
    /// Two matches with identical state, including the position of the random
    /// stream, produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.turn.hash(&mut hasher);
        self.active.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        self.grid.to_layout().hash(&mut hasher);
        for faction in &self.factions {
            faction.hash(&mut hasher);
        }
        self.rng.get_seed().hash(&mut hasher);
        self.rng.get_stream().hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the whole match.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to serialize match: {e}")))
    }

    /// Restore a match from [`serialize`](Self::serialize) output.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Snapshot`] if decoding fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::Snapshot(format!("Failed to deserialize match: {e}")))
    }
}
