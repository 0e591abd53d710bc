//! Unit abilities.
//!
//! Every ability is validated completely before anything changes; a rejected
//! use leaves cooldown, action slots and the random stream untouched.
//!
//! | Ability     | Target                | Effect                                 |
//! |-------------|-----------------------|----------------------------------------|
//! | Shield Bash | adjacent visible enemy| normal hit, then stun if it survives   |
//! | Long Shot   | self                  | extra range until the next attack      |
//! | Charge      | self                  | extra move range this turn             |
//! | Fireball    | visible cell in range | attack + bonus to every unit in radius |
//! | Heal        | friendly unit in range| base amount plus healer level          |
//! | Shield Wall | self                  | extra defense for a few upkeeps        |
//!
//! Shield Bash, Fireball and Heal also spend the attack slot.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::math::GridPos;
use crate::simulation::Match;
use crate::status::StatusKind;
use crate::unit::{Unit, UnitId};
use crate::unit_kind::{AbilityKind, TargetMode};

/// Upkeeps a Charge or Long Shot bonus lasts.
const SELF_BUFF_TURNS: u32 = 1;

/// What an ability is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTarget {
    /// Self-targeted abilities.
    NoTarget,
    /// A grid cell.
    Cell(GridPos),
    /// A unit.
    Unit(UnitId),
}

/// A validated ability use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbilityPlan {
    SelfBuff(AbilityKind),
    Blast { center: GridPos },
    Heal { target: UnitId },
    Bash { target: UnitId },
}

impl Match {
    /// Use a unit's ability.
    ///
    /// # Errors
    ///
    /// - [`GameError::ActionUnavailable`] if the unit has no ability, it is
    ///   on cooldown or already used, or the ability needs an attack slot
    ///   that is already spent
    /// - [`GameError::InvalidTarget`] if the target does not suit the ability
    pub fn issue_ability(&mut self, id: UnitId, target: AbilityTarget) -> Result<Vec<GameEvent>> {
        let (ability, plan) = self.plan_ability(id, target)?;
        let cooldown = self.unit(id).map_or(0, |u| u.stats().cooldown);
        if let Some(caster) = self.unit_mut(id) {
            caster.cooldown = cooldown;
            caster.actions.used_ability = true;
            if ability.consumes_attack() {
                caster.actions.attacked = true;
            }
        }
        debug!(unit = %id, %ability, ?target, "ability used");

        let mut events = vec![GameEvent::AbilityUsed { unit: id, ability }];
        match plan {
            AbilityPlan::SelfBuff(kind) => self.apply_self_buff(id, kind, &mut events),
            AbilityPlan::Blast { center } => self.resolve_fireball(id, center, &mut events),
            AbilityPlan::Heal { target } => self.resolve_heal(id, target, &mut events),
            AbilityPlan::Bash { target } => self.resolve_bash(id, target, &mut events),
        }
        Ok(events)
    }

    /// Targets the ability would currently accept. Self abilities yield
    /// [`AbilityTarget::NoTarget`]; Fireball yields every valid cell.
    pub fn query_ability_targets(&self, id: UnitId) -> Result<Vec<AbilityTarget>> {
        let caster = self.commanded_unit(id)?;
        let Some(ability) = caster.ability() else {
            return Ok(Vec::new());
        };
        let Some(origin) = caster.position() else {
            return Ok(Vec::new());
        };
        let candidates: Vec<AbilityTarget> = match ability.target_mode() {
            TargetMode::SelfOnly => vec![AbilityTarget::NoTarget],
            TargetMode::Cell => origin
                .diamond(caster.stats().ability_range)
                .map(AbilityTarget::Cell)
                .collect(),
            TargetMode::Unit => self
                .units()
                .filter(|u| u.is_alive() && u.id() != id)
                .map(|u| AbilityTarget::Unit(u.id()))
                .collect(),
        };
        Ok(candidates
            .into_iter()
            .filter(|t| self.plan_ability(id, *t).is_ok())
            .collect())
    }

    /// Validate an ability use without changing anything.
    fn plan_ability(&self, id: UnitId, target: AbilityTarget) -> Result<(AbilityKind, AbilityPlan)> {
        let caster = self.commanded_unit(id)?;
        let ability = caster
            .ability()
            .ok_or_else(|| GameError::unavailable(format!("{} has no ability", caster.kind())))?;
        if caster.actions.used_ability {
            return Err(GameError::unavailable(format!("{id} already used {ability}")));
        }
        if caster.cooldown > 0 {
            return Err(GameError::unavailable(format!(
                "{ability} is on cooldown for {} more turns",
                caster.cooldown
            )));
        }
        if ability.consumes_attack() && caster.actions.attacked {
            return Err(GameError::unavailable(format!(
                "{ability} needs the attack action, which {id} has spent"
            )));
        }
        let origin = caster
            .position()
            .ok_or_else(|| GameError::target(format!("unit {id} is not on the map")))?;
        let range = caster.stats().ability_range;

        let plan = match ability {
            AbilityKind::LongShot | AbilityKind::Charge | AbilityKind::ShieldWall => match target {
                AbilityTarget::NoTarget => AbilityPlan::SelfBuff(ability),
                AbilityTarget::Unit(t) if t == id => AbilityPlan::SelfBuff(ability),
                _ => return Err(GameError::target(format!("{ability} only affects the caster"))),
            },
            AbilityKind::Fireball => {
                let center = match target {
                    AbilityTarget::Cell(pos) => pos,
                    AbilityTarget::Unit(t) => self
                        .live_unit(t)?
                        .position()
                        .ok_or_else(|| GameError::target(format!("{t} is not on the map")))?,
                    AbilityTarget::NoTarget => {
                        return Err(GameError::target("Fireball needs a target cell"))
                    }
                };
                if !self.grid.in_bounds(center) {
                    return Err(GameError::target(format!("{center} is off the map")));
                }
                if !self.is_visible_to(id.faction, center) {
                    return Err(GameError::target(format!("{center} is not visible")));
                }
                if origin.manhattan(center) > range {
                    return Err(GameError::target(format!(
                        "{center} is out of range {range}"
                    )));
                }
                AbilityPlan::Blast { center }
            }
            AbilityKind::Heal => {
                let AbilityTarget::Unit(t) = target else {
                    return Err(GameError::target("Heal needs a friendly unit"));
                };
                if t == id {
                    return Err(GameError::target("healers cannot heal themselves"));
                }
                if t.faction != id.faction {
                    return Err(GameError::target(format!("{t} is not friendly")));
                }
                let patient = self.live_unit(t)?;
                self.check_ability_reach(origin, patient, range)?;
                AbilityPlan::Heal { target: t }
            }
            AbilityKind::ShieldBash => {
                let AbilityTarget::Unit(t) = target else {
                    return Err(GameError::target("Shield Bash needs an enemy unit"));
                };
                if t.faction == id.faction {
                    return Err(GameError::target(format!("{t} is friendly")));
                }
                let victim = self.live_unit(t)?;
                let at = self.check_ability_reach(origin, victim, range)?;
                if !self.is_visible_to(id.faction, at) {
                    return Err(GameError::target(format!("{t} is not visible")));
                }
                AbilityPlan::Bash { target: t }
            }
        };
        Ok((ability, plan))
    }

    fn check_ability_reach(&self, origin: GridPos, target: &Unit, range: u32) -> Result<GridPos> {
        let at = target
            .position()
            .ok_or_else(|| GameError::target(format!("{} is not on the map", target.id())))?;
        if origin.manhattan(at) > range {
            return Err(GameError::target(format!(
                "{} at {at} is out of range {range}",
                target.id()
            )));
        }
        Ok(at)
    }

    fn apply_self_buff(&mut self, id: UnitId, ability: AbilityKind, events: &mut Vec<GameEvent>) {
        let tuning = self.rules.abilities;
        let (status, turns, magnitude) = match ability {
            AbilityKind::ShieldWall => (
                StatusKind::ShieldWall,
                tuning.shield_wall_turns,
                tuning.shield_wall_defense,
            ),
            AbilityKind::LongShot => (StatusKind::LongShot, SELF_BUFF_TURNS, tuning.long_shot_range),
            AbilityKind::Charge => (StatusKind::Charge, SELF_BUFF_TURNS, tuning.charge_move),
            AbilityKind::Fireball | AbilityKind::Heal | AbilityKind::ShieldBash => return,
        };
        if let Some(unit) = self.unit_mut(id) {
            unit.statuses.apply(status, turns, magnitude);
            events.push(GameEvent::StatusApplied { unit: id, status });
        }
    }

    fn resolve_fireball(&mut self, id: UnitId, center: GridPos, events: &mut Vec<GameEvent>) {
        let tuning = self.rules.abilities;
        let power = self.unit(id).map_or(0, Unit::attack) + tuning.fireball_bonus_damage;
        let hit: Vec<UnitId> = self
            .units()
            .filter(|u| u.is_alive())
            .filter(|u| {
                u.position()
                    .is_some_and(|p| p.manhattan(center) <= tuning.fireball_radius)
            })
            .map(Unit::id)
            .collect();

        for target in hit {
            self.strike(Some(id), target, power, false, events);
            if self.is_over() {
                return;
            }
            let burns = self.roll_percent(tuning.burn_chance_percent);
            if !burns {
                continue;
            }
            if let Some(unit) = self.unit_mut(target).filter(|u| u.is_alive()) {
                unit.statuses
                    .apply(StatusKind::Burning, tuning.burn_turns, tuning.burn_damage);
                events.push(GameEvent::StatusApplied {
                    unit: target,
                    status: StatusKind::Burning,
                });
            }
        }
    }

    fn resolve_heal(&mut self, id: UnitId, target: UnitId, events: &mut Vec<GameEvent>) {
        let amount = self.rules.abilities.heal_base + self.unit(id).map_or(0, Unit::level);
        if let Some(patient) = self.unit_mut(target) {
            let restored = patient.heal(amount);
            events.push(GameEvent::Healed {
                source: id,
                target,
                amount: restored,
            });
        }
    }

    /// Hit, then stun a survivor for two ticks.
    ///
    /// The first tick lands on the victim's own upkeep, which it spends
    /// exhausted. It is still stunned during the basher's next turn and
    /// cannot retaliate then; the stun wears off at its following upkeep.
    fn resolve_bash(&mut self, id: UnitId, target: UnitId, events: &mut Vec<GameEvent>) {
        let power = self.unit(id).map_or(0, Unit::attack);
        self.strike(Some(id), target, power, false, events);
        let stun_turns = self.rules.abilities.stun_turns;
        if let Some(victim) = self.unit_mut(target).filter(|u| u.is_alive()) {
            victim.statuses.apply(StatusKind::Stunned, stun_turns, 0);
            victim.actions.exhaust();
            events.push(GameEvent::StatusApplied {
                unit: target,
                status: StatusKind::Stunned,
            });
        }
    }
}
