//! Units, their identity, and their per-turn action slots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{LevelTable, UnitStats};
use crate::factions::FactionId;
use crate::math::GridPos;
use crate::status::{StatusEffects, StatusKind};
use crate::unit_kind::{AbilityKind, UnitKind};

/// Unit identifier, unique within the match.
///
/// Displayed and parsed as `"{faction index}-{sequence}"`, e.g. `0-3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId {
    /// Owning faction.
    pub faction: FactionId,
    /// Sequence number within the faction, starting at 1.
    pub seq: u32,
}

impl UnitId {
    /// Create a new unit id.
    #[must_use]
    pub const fn new(faction: FactionId, seq: u32) -> Self {
        Self { faction, seq }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.faction.index(), self.seq)
    }
}

impl FromStr for UnitId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (faction, seq) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("unit id '{s}' is not of the form <faction>-<number>"))?;
        let faction = faction
            .parse::<usize>()
            .ok()
            .and_then(FactionId::from_index)
            .ok_or_else(|| format!("unknown faction in unit id '{s}'"))?;
        let seq = seq
            .parse::<u32>()
            .map_err(|_| format!("bad sequence number in unit id '{s}'"))?;
        Ok(Self::new(faction, seq))
    }
}

/// Which actions a unit has spent this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActionSlots {
    /// Movement spent.
    pub moved: bool,
    /// Attack spent (also by attack-consuming abilities).
    pub attacked: bool,
    /// Ability spent.
    pub used_ability: bool,
    /// Counter-attack spent during the opponent's current turn.
    pub retaliated: bool,
}

impl ActionSlots {
    /// Slots at the start of a turn.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Mark every own-turn slot as spent.
    pub fn exhaust(&mut self) {
        self.moved = true;
        self.attacked = true;
        self.used_ability = true;
    }
}

/// A unit on the board.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    id: UnitId,
    /// Base stats this unit was created from.
    stats: UnitStats,
    hp: u32,
    level: u32,
    xp: u32,
    max_hp: u32,
    attack: u32,
    defense: u32,
    /// `None` once a non-base unit has died.
    position: Option<GridPos>,
    alive: bool,
    /// Spent action slots.
    pub actions: ActionSlots,
    /// Turns until the ability is usable again.
    pub cooldown: u32,
    /// Active status effects.
    pub statuses: StatusEffects,
}

impl Unit {
    /// Create a fresh level 1 unit at full hp.
    #[must_use]
    pub fn new(id: UnitId, stats: UnitStats, position: GridPos) -> Self {
        Self {
            id,
            stats,
            hp: stats.max_hp,
            level: 1,
            xp: 0,
            max_hp: stats.max_hp,
            attack: stats.attack,
            defense: stats.defense,
            position: Some(position),
            alive: true,
            actions: ActionSlots::default(),
            cooldown: 0,
            statuses: StatusEffects::default(),
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning faction.
    #[must_use]
    pub const fn faction(&self) -> FactionId {
        self.id.faction
    }

    /// Unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.stats.kind
    }

    /// Base stats.
    #[must_use]
    pub const fn stats(&self) -> &UnitStats {
        &self.stats
    }

    /// Current hp.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Max hp including level bonuses.
    #[must_use]
    pub const fn max_hp(&self) -> u32 {
        self.max_hp
    }

    /// Missing hp.
    #[must_use]
    pub const fn missing_hp(&self) -> u32 {
        self.max_hp - self.hp
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Accumulated experience.
    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    /// Attack power including level bonuses.
    #[must_use]
    pub const fn attack(&self) -> u32 {
        self.attack
    }

    /// Defense including level bonuses, without status or terrain bonuses.
    #[must_use]
    pub const fn defense(&self) -> u32 {
        self.defense
    }

    /// Position, `None` once a non-base unit has died.
    #[must_use]
    pub const fn position(&self) -> Option<GridPos> {
        self.position
    }

    /// Whether the unit is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether this is a base.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        self.stats.kind.is_base()
    }

    /// Ability, if the kind has one.
    #[must_use]
    pub const fn ability(&self) -> Option<AbilityKind> {
        self.stats.ability
    }

    /// Whether the unit is stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.statuses.has(StatusKind::Stunned)
    }

    /// Defense plus status bonuses. Terrain is added by the combat resolver.
    #[must_use]
    pub fn effective_defense(&self) -> u32 {
        self.defense + self.statuses.defense_bonus()
    }

    /// Attack range plus status bonuses. Zero stays zero.
    #[must_use]
    pub fn effective_attack_range(&self) -> u32 {
        if self.stats.attack_range == 0 {
            return 0;
        }
        self.stats.attack_range + self.statuses.range_bonus()
    }

    /// Move budget for this turn. Zero while stunned.
    #[must_use]
    pub fn effective_move_range(&self) -> u32 {
        if self.is_stunned() {
            return 0;
        }
        self.stats.move_range + self.statuses.move_bonus()
    }

    /// Vision budget.
    #[must_use]
    pub const fn vision_range(&self) -> u32 {
        self.stats.vision_range
    }

    /// Whether the ability is off cooldown and unspent this turn.
    #[must_use]
    pub fn ability_ready(&self) -> bool {
        self.stats.ability.is_some() && self.cooldown == 0 && !self.actions.used_ability
    }

    /// Whether any action slot is still usable this turn.
    #[must_use]
    pub fn can_act(&self) -> bool {
        if !self.alive || self.is_base() || self.is_stunned() {
            return false;
        }
        let can_move = !self.actions.moved && self.effective_move_range() > 0;
        let can_attack = !self.actions.attacked && self.stats.attack_range > 0;
        can_move || can_attack || self.ability_ready()
    }

    /// Apply damage. Returns `true` if the unit died.
    ///
    /// A dead non-base unit is detached from the grid; a dead base keeps its
    /// position.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        if self.hp == 0 {
            self.alive = false;
            self.statuses.clear();
            if !self.is_base() {
                self.position = None;
            }
            return true;
        }
        false
    }

    /// Restore hp up to the maximum. Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.missing_hp());
        self.hp += restored;
        restored
    }

    /// Add experience and level up as many times as thresholds allow.
    /// Returns the number of levels gained.
    ///
    /// Experience stops accumulating once the top level is reached.
    pub fn gain_xp(&mut self, amount: u32, levels: &LevelTable) -> u32 {
        let max_level = levels.max_level();
        if !self.alive || self.level >= max_level {
            return 0;
        }
        self.xp = self.xp.saturating_add(amount);
        let new_level = levels.level_for_xp(self.xp).min(max_level);
        if new_level <= self.level {
            return 0;
        }
        let gained = new_level - self.level;
        self.level = new_level;
        self.recompute_stats(levels);
        self.hp = self.max_hp;
        gained
    }

    /// Recompute max hp, attack and defense from base stats and level.
    pub fn recompute_stats(&mut self, levels: &LevelTable) {
        let bonus = levels.cumulative_bonus(self.level);
        self.max_hp = self.stats.max_hp + bonus.hp;
        self.attack = self.stats.attack + bonus.attack;
        self.defense = self.stats.defense + bonus.defense;
        self.hp = self.hp.min(self.max_hp);
    }

    /// Move to a new cell. The caller validates the move.
    pub(crate) fn set_position(&mut self, pos: GridPos) {
        self.position = Some(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::UnitTable;

    fn warrior() -> Unit {
        let stats = *UnitTable::standard().get(UnitKind::Warrior);
        Unit::new(UnitId::new(FactionId::Blue, 2), stats, GridPos::new(1, 2))
    }

    #[test]
    fn test_unit_id_display_and_parse() {
        let id = UnitId::new(FactionId::Red, 7);
        assert_eq!(id.to_string(), "1-7");
        assert_eq!("1-7".parse::<UnitId>(), Ok(id));
        assert!("2-1".parse::<UnitId>().is_err());
        assert!("abc".parse::<UnitId>().is_err());
        assert!("0-x".parse::<UnitId>().is_err());
    }

    #[test]
    fn test_damage_and_death() {
        let mut unit = warrior();
        assert!(!unit.take_damage(10));
        assert_eq!(unit.hp(), 15);
        assert!(unit.take_damage(100));
        assert_eq!(unit.hp(), 0);
        assert!(!unit.is_alive());
        assert_eq!(unit.position(), None);
    }

    #[test]
    fn test_dead_base_keeps_position() {
        let stats = *UnitTable::standard().get(UnitKind::Base);
        let mut base = Unit::new(UnitId::new(FactionId::Blue, 1), stats, GridPos::new(1, 1));
        assert!(base.take_damage(1000));
        assert_eq!(base.position(), Some(GridPos::new(1, 1)));
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut unit = warrior();
        unit.take_damage(4);
        assert_eq!(unit.heal(10), 4);
        assert_eq!(unit.hp(), unit.max_hp());
    }

    #[test]
    fn test_exact_threshold_is_one_level() {
        let levels = LevelTable::standard();
        let mut unit = warrior();
        unit.take_damage(5);
        assert_eq!(unit.gain_xp(20, &levels), 1);
        assert_eq!(unit.level(), 2);
        assert_eq!(unit.max_hp(), 30);
        assert_eq!(unit.hp(), 30);
        assert_eq!(unit.attack(), 7);
        assert_eq!(unit.defense(), 3);
    }

    #[test]
    fn test_multiple_levels_at_once() {
        let levels = LevelTable::standard();
        let mut unit = warrior();
        assert_eq!(unit.gain_xp(55, &levels), 2);
        assert_eq!(unit.level(), 3);
        assert_eq!(unit.max_hp(), 35);
        assert_eq!(unit.defense(), 4);

        assert_eq!(unit.gain_xp(1000, &levels), 1);
        assert_eq!(unit.level(), 4);
        let xp = unit.xp();
        assert_eq!(unit.gain_xp(50, &levels), 0);
        assert_eq!(unit.xp(), xp);
    }

    #[test]
    fn test_can_act() {
        let mut unit = warrior();
        assert!(unit.can_act());
        unit.actions.moved = true;
        unit.actions.attacked = true;
        assert!(unit.can_act());
        unit.cooldown = 2;
        assert!(!unit.can_act());

        let mut unit = warrior();
        unit.statuses.apply(StatusKind::Stunned, 1, 0);
        assert!(!unit.can_act());
        assert_eq!(unit.effective_move_range(), 0);
    }

    #[test]
    fn test_effective_ranges() {
        let mut unit = warrior();
        unit.statuses.apply(StatusKind::Charge, 1, 2);
        unit.statuses.apply(StatusKind::ShieldWall, 2, 3);
        assert_eq!(unit.effective_move_range(), 5);
        assert_eq!(unit.effective_defense(), 6);
    }
}
