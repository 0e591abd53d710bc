//! Turn systems.
//!
//! Upkeep runs automatically at the start of each faction's turn, in this
//! order:
//!
//! 1. Income: flat rate plus every income cell a live unit stands on
//! 2. Status effects: damage over time, then every counter ticks down
//! 3. Cooldowns: every ability cooldown ticks down
//! 4. Action slots: reset, or exhausted while a unit is still stunned
//!
//! The opponent's counter-attacks are refreshed at the same time, so every
//! defender may strike back once during each enemy turn.
//!
//! Each step is a plain function over faction data so it can be tested
//! without a full match.

use tracing::{debug, info};

use crate::data::GameRules;
use crate::error::Result;
use crate::events::GameEvent;
use crate::factions::{Faction, FactionId};
use crate::simulation::{Match, Phase};
use crate::terrain::TerrainGrid;

/// Gold a faction collects this upkeep: `(flat, terrain)`.
#[must_use]
pub fn income_for(faction: &Faction, grid: &TerrainGrid, rules: &GameRules) -> (u32, u32) {
    let from_terrain = faction
        .live_units()
        .filter_map(|u| u.position())
        .filter_map(|pos| grid.kind_at(pos))
        .filter_map(|kind| rules.terrain.get(kind).income)
        .sum();
    (rules.economy.income_per_turn, from_terrain)
}

/// Apply damage over time and tick every status counter.
///
/// Returns the events produced and whether the faction's base died.
/// Units killed by burning award no experience.
pub fn status_system(faction: &mut Faction) -> (Vec<GameEvent>, bool) {
    let mut events = Vec::new();
    let mut base_lost = false;
    for unit in faction.units_mut() {
        if !unit.is_alive() {
            continue;
        }
        let burn = unit.statuses.periodic_damage();
        if burn > 0 {
            let died = unit.take_damage(burn);
            events.push(GameEvent::Damaged {
                source: None,
                target: unit.id(),
                amount: burn,
                remaining: unit.hp(),
                retaliation: false,
            });
            if died {
                events.push(GameEvent::Killed {
                    unit: unit.id(),
                    by: None,
                });
                base_lost |= unit.is_base();
                continue;
            }
        }
        for status in unit.statuses.tick() {
            events.push(GameEvent::StatusExpired {
                unit: unit.id(),
                status,
            });
        }
    }
    (events, base_lost)
}

/// Tick every ability cooldown down by one.
pub fn cooldown_system(faction: &mut Faction) {
    for unit in faction.units_mut() {
        unit.cooldown = unit.cooldown.saturating_sub(1);
    }
}

/// Reset action slots. Units still stunned get exhausted slots instead.
pub fn action_reset_system(faction: &mut Faction) {
    for unit in faction.units_mut() {
        if unit.is_stunned() {
            unit.actions.exhaust();
        } else {
            unit.actions.reset();
        }
    }
}

/// Give every unit of the waiting faction its counter-attack back.
pub fn retaliation_reset_system(faction: &mut Faction) {
    for unit in faction.units_mut() {
        unit.actions.retaliated = false;
    }
}

impl Match {
    /// End the active faction's turn and run the next faction's upkeep.
    ///
    /// The turn counter increases when play returns to Blue.
    pub fn end_turn(&mut self) -> Result<Vec<GameEvent>> {
        self.ensure_acting()?;
        let finished = self.active;
        self.active = finished.opponent();
        if self.active == FactionId::Blue {
            self.turn += 1;
        }
        debug!(
            from = finished.display_name(),
            to = self.active.display_name(),
            turn = self.turn,
            "turn ended"
        );
        Ok(self.run_upkeep())
    }

    /// Upkeep for the active faction. Leaves the match in [`Phase::Acting`]
    /// unless a base burned down.
    pub(crate) fn run_upkeep(&mut self) -> Vec<GameEvent> {
        self.phase = Phase::Upkeep;
        let faction = self.active;
        let mut events = vec![GameEvent::TurnStarted {
            faction,
            turn: self.turn,
        }];
        info!(turn = self.turn, faction = faction.display_name(), "turn started");

        let (base, terrain) = income_for(self.faction(faction), &self.grid, &self.rules);
        self.faction_mut(faction).earn(base + terrain);
        events.push(GameEvent::Income {
            faction,
            base,
            terrain,
        });

        let (status_events, base_lost) = status_system(self.faction_mut(faction));
        for event in &status_events {
            if let GameEvent::Killed { unit, .. } = event {
                info!(unit = %unit, "unit burned to death");
            }
        }
        events.extend(status_events);

        cooldown_system(self.faction_mut(faction));
        action_reset_system(self.faction_mut(faction));
        retaliation_reset_system(self.faction_mut(faction.opponent()));
        self.recompute_visibility(faction);

        if base_lost {
            self.declare_winner(faction.opponent(), &mut events);
        } else {
            self.phase = Phase::Acting;
        }
        events
    }
}
