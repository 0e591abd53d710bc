//! Decision engine for AI-controlled factions.
//!
//! The engine plays a whole turn through [`Match::apply`], the same entry
//! point a human uses, and only looks at enemies its faction can currently
//! see. Each turn:
//!
//! 1. Build at most one unit when behind, under the floor, or scoutless
//! 2. For each unit, in a seeded random order: ability, attack, move toward
//!    the nearest visible enemy (or the enemy base), attack again, or wait
//! 3. End the turn
//!
//! It stops the instant the match has a winner.
//!
//! # Determinism
//!
//! Given the same match state the engine always issues the same intents:
//! the unit order comes from the match's seeded stream, and every choice
//! is a minimum or maximum over a fully ordered key.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::abilities::AbilityTarget;
use crate::events::GameEvent;
use crate::factions::FactionId;
use crate::math::{percent, ratio, GridPos};
use crate::player_facade::Intent;
use crate::simulation::Match;
use crate::unit::{Unit, UnitId};
use crate::unit_kind::{AbilityKind, UnitKind};

/// Build order once a scout is owned or the army is large enough.
const BUILD_PRIORITY: [UnitKind; 6] = [
    UnitKind::Warrior,
    UnitKind::Archer,
    UnitKind::Healer,
    UnitKind::Mage,
    UnitKind::Cavalry,
    UnitKind::Knight,
];

/// Tuning for the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Allies below this hp percentage get healed.
    pub heal_below_percent: u32,
    /// Raise Shield Wall when threatened and below this hp percentage.
    pub shield_wall_below_percent: u32,
    /// Keep building until the army has at least this many units.
    pub build_floor: usize,
    /// Extra distance beyond an enemy's attack range that still counts as
    /// threatening.
    pub threat_margin: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            heal_below_percent: 70,
            shield_wall_below_percent: 60,
            build_floor: 4,
            threat_margin: 1,
        }
    }
}

/// Plays turns for AI-controlled factions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionEngine {
    config: AiConfig,
}

impl DecisionEngine {
    /// Create an engine with the given tuning.
    #[must_use]
    pub const fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Play the active faction's whole turn, ending it unless the match ends
    /// first. Returns every event produced, including the next upkeep.
    pub fn take_turn(&self, game: &mut Match) -> Vec<GameEvent> {
        let me = game.active();
        let turn = game.turn();
        let mut events = Vec::new();

        if let Some(kind) = self.choose_build(game) {
            self.issue(game, Intent::Build(kind), &mut events);
        }

        for id in game.shuffled_units(me) {
            if !still_acting(game, me) {
                break;
            }
            self.command_unit(game, id, &mut events);
        }

        if still_acting(game, me) {
            self.issue(game, Intent::EndTurn, &mut events);
        }
        info!(
            faction = me.display_name(),
            turn,
            events = events.len(),
            "ai turn finished"
        );
        events
    }

    /// Unit kind to build this turn, if any.
    #[must_use]
    pub fn choose_build(&self, game: &Match) -> Option<UnitKind> {
        let me = game.active();
        let mine = game.faction(me).army_size();
        let theirs = game.faction(me.opponent()).army_size();
        let has_scout = game
            .faction(me)
            .live_units()
            .any(|u| u.kind() == UnitKind::Scout);
        if mine >= theirs && mine >= self.config.build_floor && has_scout {
            return None;
        }
        let scout_first = !has_scout && mine < self.config.build_floor;
        scout_first
            .then_some(UnitKind::Scout)
            .into_iter()
            .chain(BUILD_PRIORITY)
            .find(|kind| game.can_build(*kind))
    }

    fn command_unit(&self, game: &mut Match, id: UnitId, events: &mut Vec<GameEvent>) {
        let me = id.faction;
        let mut acted = false;

        let act = |game: &Match| game.unit(id).is_some_and(Unit::can_act) && still_acting(game, me);
        if !act(game) {
            return;
        }

        if let Some(target) = self.choose_ability(game, id) {
            acted |= self.issue(game, Intent::Ability { unit: id, target }, events);
        }
        if act(game) {
            if let Some(target) = choose_attack(game, id) {
                acted |= self.issue(game, Intent::Attack { unit: id, target }, events);
            }
        }
        if act(game) {
            if let Some(to) = choose_move(game, id) {
                acted |= self.issue(game, Intent::Move { unit: id, to }, events);
                if act(game) {
                    if let Some(target) = choose_attack(game, id) {
                        self.issue(game, Intent::Attack { unit: id, target }, events);
                    }
                }
            }
        }
        if !acted && act(game) {
            self.issue(game, Intent::Wait(id), events);
        }
    }

    /// Apply an intent, logging rejections. Returns whether it was accepted.
    fn issue(&self, game: &mut Match, intent: Intent, events: &mut Vec<GameEvent>) -> bool {
        match game.apply(intent) {
            Ok(produced) => {
                debug!(?intent, "ai intent accepted");
                events.extend(produced);
                true
            }
            Err(err) => {
                debug!(?intent, reason = err.code(), %err, "ai intent rejected");
                false
            }
        }
    }

    /// Ability target worth using this turn, if any.
    fn choose_ability(&self, game: &Match, id: UnitId) -> Option<AbilityTarget> {
        let unit = game.unit(id)?;
        let ability = unit.ability()?;
        if !unit.ability_ready() || (ability.consumes_attack() && unit.actions.attacked) {
            return None;
        }
        let origin = unit.position()?;
        let me = id.faction;
        let enemies: Vec<&Unit> = game.visible_enemies(me).collect();
        let range = unit.stats().ability_range;

        match ability {
            AbilityKind::Heal => {
                let threshold = percent(self.config.heal_below_percent);
                game.faction(me)
                    .live_units()
                    .filter(|ally| ally.id() != id)
                    .filter(|ally| within(origin, ally, range))
                    .filter(|ally| ratio(ally.hp(), ally.max_hp()) < threshold)
                    .min_by_key(|ally| (ratio(ally.hp(), ally.max_hp()), ally.id()))
                    .map(|ally| AbilityTarget::Unit(ally.id()))
            }
            AbilityKind::ShieldBash => enemies
                .iter()
                .filter(|enemy| within(origin, enemy, range))
                .min_by_key(|enemy| target_key(enemy))
                .map(|enemy| AbilityTarget::Unit(enemy.id())),
            AbilityKind::Fireball => choose_blast(game, unit, origin, &enemies),
            AbilityKind::ShieldWall => {
                let threatened = enemies.iter().any(|enemy| {
                    enemy.position().is_some_and(|pos| {
                        pos.manhattan(origin)
                            <= enemy.effective_attack_range() + self.config.threat_margin
                    })
                });
                let hurt = ratio(unit.hp(), unit.max_hp())
                    < percent(self.config.shield_wall_below_percent);
                (threatened && hurt).then_some(AbilityTarget::NoTarget)
            }
            AbilityKind::LongShot => {
                if unit.actions.attacked {
                    return None;
                }
                let reach = unit.effective_attack_range();
                let boosted = reach + game.rules().abilities.long_shot_range;
                let in_reach = enemies.iter().any(|e| within(origin, e, reach));
                let just_beyond = enemies.iter().any(|e| within(origin, e, boosted));
                (!in_reach && just_beyond).then_some(AbilityTarget::NoTarget)
            }
            AbilityKind::Charge => {
                if unit.actions.moved {
                    return None;
                }
                let reach = unit.effective_attack_range();
                let in_reach = enemies.iter().any(|e| within(origin, e, reach));
                (!in_reach).then_some(AbilityTarget::NoTarget)
            }
        }
    }
}

/// Whether the AI should keep issuing intents for `me`.
fn still_acting(game: &Match, me: FactionId) -> bool {
    !game.is_over() && game.active() == me
}

fn within(origin: GridPos, unit: &Unit, range: u32) -> bool {
    unit.position()
        .is_some_and(|pos| origin.manhattan(pos) <= range)
}

/// Ordering for picking a victim: lowest hp, then type priority, then id.
fn target_key(unit: &Unit) -> (u32, u8, UnitId) {
    (unit.hp(), unit.kind().target_priority(), unit.id())
}

/// Best visible enemy to attack right now.
fn choose_attack(game: &Match, id: UnitId) -> Option<UnitId> {
    let unit = game.unit(id)?;
    if unit.actions.attacked {
        return None;
    }
    game.query_targets(id)
        .ok()?
        .into_iter()
        .filter_map(|target| game.unit(target))
        .min_by_key(|target| target_key(target))
        .map(Unit::id)
}

/// Fireball cell that hits the most visible enemies and no friendly unit.
fn choose_blast(
    game: &Match,
    caster: &Unit,
    origin: GridPos,
    enemies: &[&Unit],
) -> Option<AbilityTarget> {
    let me = caster.faction();
    let radius = game.rules().abilities.fireball_radius;
    let mut best: Option<((usize, u32), GridPos)> = None;

    for center in origin.diamond(caster.stats().ability_range) {
        if !game.grid().in_bounds(center) || !game.is_visible_to(me, center) {
            continue;
        }
        let friendly_hit = game
            .faction(me)
            .live_units()
            .any(|u| within(center, u, radius));
        if friendly_hit {
            continue;
        }
        let hit: Vec<&&Unit> = enemies.iter().filter(|e| within(center, e, radius)).collect();
        if hit.is_empty() {
            continue;
        }
        let score = (hit.len(), hit.iter().map(|e| e.missing_hp()).sum::<u32>());
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, center));
        }
    }
    best.map(|(_, center)| AbilityTarget::Cell(center))
}

/// Destination for this turn's move, if moving helps.
fn choose_move(game: &Match, id: UnitId) -> Option<GridPos> {
    let unit = game.unit(id)?;
    if unit.actions.moved || unit.effective_move_range() == 0 {
        return None;
    }
    let here = unit.position()?;
    let me = id.faction;
    let costs = game.reachable_costs(id).ok()?;
    let enemies: Vec<&Unit> = game.visible_enemies(me).collect();

    // Prefer a cell we could attack from straight away, on the best cover.
    let reach = unit.effective_attack_range();
    if !unit.actions.attacked && reach > 0 {
        let strike_cell = costs
            .iter()
            .filter(|(pos, _)| **pos != here)
            .filter(|(pos, _)| {
                enemies.iter().any(|e| {
                    e.position().is_some_and(|at| {
                        pos.manhattan(at) <= reach && game.has_line_of_fire(unit, **pos, at)
                    })
                })
            })
            .min_by_key(|(pos, cost)| {
                let cover = game
                    .terrain_at(**pos)
                    .map_or(0, |kind| game.rules().terrain.get(kind).defense_bonus);
                (std::cmp::Reverse(cover), **cost, **pos)
            })
            .map(|(pos, _)| *pos);
        if strike_cell.is_some() {
            return strike_cell;
        }
    }

    let goal = enemies
        .iter()
        .filter_map(|e| e.position().map(|pos| (here.manhattan(pos), e.id(), pos)))
        .min()
        .map(|(_, _, pos)| pos)
        .or_else(|| game.faction(me.opponent()).base().position())?;
    let current = here.manhattan(goal);
    costs
        .iter()
        .filter(|(pos, _)| pos.manhattan(goal) < current)
        .min_by_key(|(pos, cost)| (pos.manhattan(goal), **cost, **pos))
        .map(|(pos, _)| *pos)
}
