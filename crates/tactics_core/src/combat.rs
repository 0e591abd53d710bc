//! Flat-defense combat.
//!
//! Damage is attack minus total defense, never less than [`MIN_DAMAGE`].
//! Total defense is the unit's leveled defense, plus status bonuses, plus
//! the defense bonus of the terrain it stands on.
//!
//! A surviving defender strikes back once per turn if it can reach the
//! attacker; see [`Match::issue_attack`].
//!
//! Ranged units need a line of fire: the cell just short of the target must
//! not be fire-blocking terrain, unless the shooter stands next to it.

use tracing::{debug, info};

use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::math::GridPos;
use crate::simulation::Match;
use crate::status::StatusKind;
use crate::unit::{Unit, UnitId};

/// Every hit deals at least this much damage.
pub const MIN_DAMAGE: u32 = 1;

/// Damage of one hit.
///
/// # Example
///
/// ```
/// use tactics_core::combat::damage;
///
/// assert_eq!(damage(6, 0), 6);
/// assert_eq!(damage(4, 3), 1);
/// assert_eq!(damage(2, 9), 1);
/// ```
#[must_use]
pub const fn damage(attack: u32, total_defense: u32) -> u32 {
    let raw = attack.saturating_sub(total_defense);
    if raw < MIN_DAMAGE {
        MIN_DAMAGE
    } else {
        raw
    }
}

/// Cell that can block a shot from `from` at `to`.
///
/// One step back from the target along the longer axis, along x on exact
/// diagonals. `None` for adjacent or identical cells.
///
/// # Example
///
/// ```
/// use tactics_core::combat::cover_cell;
/// use tactics_core::math::GridPos;
///
/// let from = GridPos::new(0, 0);
/// assert_eq!(cover_cell(from, GridPos::new(4, 1)), Some(GridPos::new(3, 1)));
/// assert_eq!(cover_cell(from, GridPos::new(1, 3)), Some(GridPos::new(1, 2)));
/// assert_eq!(cover_cell(from, GridPos::new(2, 2)), Some(GridPos::new(1, 2)));
/// assert_eq!(cover_cell(from, GridPos::new(0, 1)), None);
/// ```
#[must_use]
pub fn cover_cell(from: GridPos, to: GridPos) -> Option<GridPos> {
    if from.manhattan(to) <= 1 {
        return None;
    }
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dy.abs() > dx.abs() {
        Some(GridPos::new(to.x, to.y - dy.signum()))
    } else {
        Some(GridPos::new(to.x - dx.signum(), to.y))
    }
}

impl Match {
    /// Whether `shooter`, standing on `from`, can fire at `to`.
    ///
    /// Units with a base attack range of 1 always can; Long Shot does not
    /// make a melee unit subject to cover.
    #[must_use]
    pub fn has_line_of_fire(&self, shooter: &Unit, from: GridPos, to: GridPos) -> bool {
        if shooter.stats().attack_range <= 1 {
            return true;
        }
        let Some(cover) = cover_cell(from, to) else {
            return true;
        };
        let blocked = self
            .grid
            .kind_at(cover)
            .is_some_and(|kind| self.rules.terrain.get(kind).blocks_fire);
        !blocked || from.manhattan(cover) <= 1
    }

    /// Defense of a unit including statuses and the terrain under it.
    #[must_use]
    pub fn total_defense(&self, unit: &Unit) -> u32 {
        let terrain = unit
            .position()
            .and_then(|pos| self.grid.kind_at(pos))
            .map_or(0, |kind| self.rules.terrain.get(kind).defense_bonus);
        unit.effective_defense() + terrain
    }

    /// Damage `attacker` would deal to `defender` right now.
    #[must_use]
    pub fn expected_damage(&self, attacker: &Unit, defender: &Unit) -> u32 {
        damage(attacker.attack(), self.total_defense(defender))
    }

    /// Attack a visible enemy in range.
    ///
    /// The attacker's Long Shot bonus is spent by the attack. A surviving
    /// defender retaliates if it is not stunned, has not already struck back
    /// during this turn, and has the attacker within its own range. What the
    /// defender did on its own previous turn does not matter.
    ///
    /// # Errors
    ///
    /// - [`GameError::ActionUnavailable`] if the attacker already attacked
    ///   or cannot attack at all
    /// - [`GameError::InvalidTarget`] if the target is dead, friendly, not
    ///   currently visible, out of range, or behind cover
    pub fn issue_attack(&mut self, id: UnitId, target: UnitId) -> Result<Vec<GameEvent>> {
        let attacker = self.commanded_unit(id)?;
        if attacker.actions.attacked {
            return Err(GameError::unavailable(format!("{id} has already attacked")));
        }
        let range = attacker.effective_attack_range();
        if range == 0 {
            return Err(GameError::unavailable(format!("{id} cannot attack")));
        }
        let from = attacker
            .position()
            .ok_or_else(|| GameError::target(format!("unit {id} is not on the map")))?;
        if target.faction == id.faction {
            return Err(GameError::target(format!("{target} is friendly")));
        }
        let defender = self.live_unit(target)?;
        let at = defender
            .position()
            .filter(|pos| self.is_visible_to(id.faction, *pos))
            .ok_or_else(|| GameError::target(format!("{target} is not visible")))?;
        if from.manhattan(at) > range {
            return Err(GameError::target(format!(
                "{target} at {at} is out of range {range}"
            )));
        }
        if !self.has_line_of_fire(attacker, from, at) {
            return Err(GameError::target(format!(
                "no line of fire from {from} to {target} at {at}"
            )));
        }

        if let Some(unit) = self.unit_mut(id) {
            unit.actions.attacked = true;
            unit.statuses.remove(StatusKind::LongShot);
        }
        debug!(attacker = %id, defender = %target, "attack");

        let mut events = Vec::new();
        let power = self.unit(id).map_or(0, Unit::attack);
        self.strike(Some(id), target, power, false, &mut events);
        if !self.is_over() && self.can_retaliate(target, id) {
            if let Some(unit) = self.unit_mut(target) {
                unit.actions.retaliated = true;
            }
            let power = self.unit(target).map_or(0, Unit::attack);
            self.strike(Some(target), id, power, true, &mut events);
        }
        Ok(events)
    }

    fn can_retaliate(&self, defender: UnitId, attacker: UnitId) -> bool {
        let (Some(defender), Some(attacker)) = (self.unit(defender), self.unit(attacker)) else {
            return false;
        };
        if !defender.is_alive()
            || !attacker.is_alive()
            || defender.is_stunned()
            || defender.actions.retaliated
            || defender.stats().attack_range == 0
        {
            return false;
        }
        match (defender.position(), attacker.position()) {
            (Some(d), Some(a)) => {
                d.manhattan(a) <= defender.effective_attack_range()
                    && self.has_line_of_fire(defender, d, a)
            }
            _ => false,
        }
    }

    /// Deal one hit of `power` against `target`, resolving death, victory and
    /// experience. Used by attacks, retaliation and damaging abilities.
    pub(crate) fn strike(
        &mut self,
        source: Option<UnitId>,
        target: UnitId,
        power: u32,
        retaliation: bool,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(victim) = self.unit(target) else {
            return;
        };
        if !victim.is_alive() {
            return;
        }
        let amount = damage(power, self.total_defense(victim));
        let xp_value = victim.stats().xp_value;
        let is_base = victim.is_base();

        let Some(victim) = self.unit_mut(target) else {
            return;
        };
        let died = victim.take_damage(amount);
        events.push(GameEvent::Damaged {
            source,
            target,
            amount,
            remaining: victim.hp(),
            retaliation,
        });
        if !died {
            return;
        }

        events.push(GameEvent::Killed {
            unit: target,
            by: source,
        });
        info!(unit = %target, by = ?source, "unit defeated");
        self.recompute_visibility(target.faction);
        if let Some(killer) = source {
            self.award_xp(killer, xp_value, events);
        }
        if is_base {
            self.declare_winner(target.faction.opponent(), events);
        }
    }

    /// Grant experience to a live unit and report level-ups.
    pub(crate) fn award_xp(&mut self, id: UnitId, amount: u32, events: &mut Vec<GameEvent>) {
        let Self {
            factions, rules, ..
        } = self;
        let Some(unit) = factions[id.faction.index()].unit_mut(id) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        let gained = unit.gain_xp(amount, &rules.levels);
        events.push(GameEvent::ExperienceGained { unit: id, amount });
        if gained > 0 {
            info!(unit = %id, level = unit.level(), "level up");
            events.push(GameEvent::LeveledUp {
                unit: id,
                level: unit.level(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::GameRules;
    use crate::factions::{Controller, FactionId};
    use crate::setup::{FactionSetup, MatchConfig, StartingUnit};
    use crate::unit_kind::UnitKind;

    fn blue(seq: u32) -> UnitId {
        UnitId::new(FactionId::Blue, seq)
    }

    fn red(seq: u32) -> UnitId {
        UnitId::new(FactionId::Red, seq)
    }

    /// Blue and Red units facing each other on open plains.
    fn duel(blue_kind: UnitKind, red_kind: UnitKind, gap: i32) -> Match {
        let config = MatchConfig {
            width: 10,
            height: 3,
            layout: vec!["PPPPPPPPPP".to_string(); 3],
            factions: vec![
                FactionSetup {
                    faction: FactionId::Blue,
                    controller: Controller::Human,
                    base: GridPos::new(0, 0),
                    units: vec![StartingUnit {
                        kind: blue_kind,
                        position: GridPos::new(3, 1),
                    }],
                    gold: None,
                },
                FactionSetup {
                    faction: FactionId::Red,
                    controller: Controller::Ai,
                    base: GridPos::new(9, 2),
                    units: vec![StartingUnit {
                        kind: red_kind,
                        position: GridPos::new(3 + gap, 1),
                    }],
                    gold: None,
                },
            ],
            rules: GameRules::standard(),
        };
        Match::new(config, 5).unwrap()
    }

    #[test]
    fn test_damage_floor() {
        assert_eq!(damage(6, 3), 3);
        assert_eq!(damage(3, 3), MIN_DAMAGE);
        assert_eq!(damage(0, 0), MIN_DAMAGE);
    }

    #[test]
    fn test_attack_with_retaliation() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 1);
        let events = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(
            events,
            vec![
                GameEvent::Damaged {
                    source: Some(blue(2)),
                    target: red(2),
                    amount: 3,
                    remaining: 22,
                    retaliation: false,
                },
                GameEvent::Damaged {
                    source: Some(red(2)),
                    target: blue(2),
                    amount: 3,
                    remaining: 22,
                    retaliation: true,
                },
            ]
        );
        assert!(game.unit(red(2)).unwrap().actions.retaliated);
        let err = game.issue_attack(blue(2), red(2)).unwrap_err();
        assert_eq!(err.code(), "action_unavailable");
    }

    #[test]
    fn test_retaliation_once_per_turn() {
        let mut game = duel(UnitKind::Cavalry, UnitKind::Warrior, 1);
        let first = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(first.len(), 2);
        game.unit_mut(blue(2)).unwrap().actions.attacked = false;
        let second = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_own_turn_actions_do_not_block_retaliation() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 1);
        // Blue spends everything on its own turn, then Red attacks.
        game.issue_attack(blue(2), red(2)).unwrap();
        game.end_turn().unwrap();
        assert!(game.unit(blue(2)).unwrap().actions.attacked);

        let events = game.issue_attack(red(2), blue(2)).unwrap();
        assert!(events.iter().any(|event| matches!(
            event,
            GameEvent::Damaged {
                source: Some(source),
                retaliation: true,
                ..
            } if *source == blue(2)
        )));
    }

    #[test]
    fn test_no_retaliation_out_of_range() {
        let mut game = duel(UnitKind::Archer, UnitKind::Warrior, 3);
        let events = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(game.unit(blue(2)).unwrap().hp(), 15);
    }

    #[test]
    fn test_no_retaliation_when_stunned() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 1);
        game.unit_mut(red(2))
            .unwrap()
            .statuses
            .apply(StatusKind::Stunned, 1, 0);
        let events = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_invalid_targets_change_nothing() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 2);
        let before = game.state_hash();

        let err = game.issue_attack(blue(2), red(2)).unwrap_err();
        assert_eq!(err.code(), "invalid_target");
        let err = game.issue_attack(blue(2), blue(1)).unwrap_err();
        assert_eq!(err.code(), "invalid_target");
        let err = game.issue_attack(blue(2), red(9)).unwrap_err();
        assert_eq!(err.code(), "invalid_target");

        assert_eq!(game.state_hash(), before);
    }

    #[test]
    fn test_hidden_enemy_cannot_be_attacked() {
        let mut game = duel(UnitKind::Archer, UnitKind::Warrior, 4);
        assert!(game.is_visible_to(FactionId::Blue, GridPos::new(7, 1)));
        // Current sight is lost; the cell is only remembered now.
        game.factions[0].visibility_mut().downgrade();
        let err = game.issue_attack(blue(2), red(2)).unwrap_err();
        assert_eq!(err.code(), "invalid_target");
    }

    #[test]
    fn test_terrain_defense_applies() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 1);
        game.grid = crate::terrain::TerrainGrid::from_layout(
            10,
            3,
            &["PPPPPPPPPP", "PPPPMPPPPP", "PPPPPPPPPP"],
        )
        .unwrap();
        let attacker = game.unit(blue(2)).unwrap();
        let defender = game.unit(red(2)).unwrap();
        assert_eq!(game.total_defense(defender), 5);
        assert_eq!(game.expected_damage(attacker, defender), 1);
    }

    fn with_row(game: &mut Match, row: &str) {
        game.grid =
            crate::terrain::TerrainGrid::from_layout(10, 3, &["PPPPPPPPPP", row, "PPPPPPPPPP"])
                .unwrap();
        game.recompute_visibility(FactionId::Blue);
    }

    #[test]
    fn test_cover_blocks_ranged_attack() {
        let mut game = duel(UnitKind::Archer, UnitKind::Warrior, 3);
        with_row(&mut game, "PPPPPFPPPP");
        assert!(game.is_visible_to(FactionId::Blue, GridPos::new(6, 1)));
        assert!(game.query_targets(blue(2)).unwrap().is_empty());

        let before = game.state_hash();
        let err = game.issue_attack(blue(2), red(2)).unwrap_err();
        assert_eq!(err.code(), "invalid_target");
        assert_eq!(game.state_hash(), before);
    }

    #[test]
    fn test_shooter_fires_over_adjacent_cover() {
        let mut game = duel(UnitKind::Archer, UnitKind::Warrior, 2);
        with_row(&mut game, "PPPPMPPPPP");
        assert_eq!(game.query_targets(blue(2)).unwrap(), vec![red(2)]);
        assert!(game.issue_attack(blue(2), red(2)).is_ok());
    }

    #[test]
    fn test_cover_blocks_retaliation() {
        let mut game = duel(UnitKind::Archer, UnitKind::Archer, 3);
        with_row(&mut game, "PPPPFPPPPP");
        // Blue's shot passes (5, 1); Red's return shot would pass the forest.
        let events = game.issue_attack(blue(2), red(2)).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(game.unit(red(2)).unwrap().hp(), 12);
    }

    #[test]
    fn test_kill_awards_xp() {
        let mut game = duel(UnitKind::Cavalry, UnitKind::Scout, 1);
        // Cavalry 7 attack vs scout 0 defense, 12 hp: two hits.
        game.issue_attack(blue(2), red(2)).unwrap();
        game.unit_mut(blue(2)).unwrap().actions.attacked = false;
        let events = game.issue_attack(blue(2), red(2)).unwrap();
        assert!(events.contains(&GameEvent::Killed {
            unit: red(2),
            by: Some(blue(2))
        }));
        assert!(events.contains(&GameEvent::ExperienceGained {
            unit: blue(2),
            amount: 6
        }));
        let scout = game.unit(red(2)).unwrap();
        assert!(!scout.is_alive());
        assert_eq!(scout.position(), None);
        assert_eq!(game.unit(blue(2)).unwrap().xp(), 6);
        assert!(!game.is_occupied(GridPos::new(4, 1)));
    }

    #[test]
    fn test_destroying_base_wins() {
        let mut game = duel(UnitKind::Warrior, UnitKind::Warrior, 1);
        let red_base = red(1);
        game.unit_mut(red_base).unwrap().take_damage(99);
        game.unit_mut(blue(2)).unwrap().set_position(GridPos::new(8, 2));
        game.recompute_visibility(FactionId::Blue);

        let events = game.issue_attack(blue(2), red_base).unwrap();
        assert_eq!(
            events.last(),
            Some(&GameEvent::MatchWon {
                winner: FactionId::Blue
            })
        );
        assert_eq!(game.winner(), Some(FactionId::Blue));
        assert!(game.is_over());
        assert!(game.end_turn().is_err());
        // Dead bases stay on the map.
        assert_eq!(
            game.unit(red_base).unwrap().position(),
            Some(GridPos::new(9, 2))
        );
    }
}
