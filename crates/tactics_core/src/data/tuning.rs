//! Ability and economy tuning knobs.

use serde::{Deserialize, Serialize};

/// Numbers behind each ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    /// Defense added by Shield Wall.
    pub shield_wall_defense: u32,
    /// Upkeeps Shield Wall lasts.
    pub shield_wall_turns: u32,
    /// Attack range added by Long Shot.
    pub long_shot_range: u32,
    /// Move range added by Charge.
    pub charge_move: u32,
    /// Added to the caster's attack for Fireball damage.
    pub fireball_bonus_damage: u32,
    /// Manhattan radius of the Fireball blast.
    pub fireball_radius: u32,
    /// Percent chance each unit hit by Fireball starts burning.
    pub burn_chance_percent: u32,
    /// Damage per upkeep while burning.
    pub burn_damage: u32,
    /// Upkeeps a burn lasts.
    pub burn_turns: u32,
    /// Heal amount before the healer's level is added.
    pub heal_base: u32,
    /// Upkeeps a Shield Bash stun is counted down over. The victim loses
    /// `stun_turns - 1` full turns.
    pub stun_turns: u32,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            shield_wall_defense: 3,
            shield_wall_turns: 2,
            long_shot_range: 2,
            charge_move: 2,
            fireball_bonus_damage: 2,
            fireball_radius: 1,
            burn_chance_percent: 35,
            burn_damage: 2,
            burn_turns: 3,
            heal_base: 10,
            stun_turns: 2,
        }
    }
}

/// Gold flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyRules {
    /// Gold each faction starts with.
    pub starting_gold: u32,
    /// Flat income every upkeep.
    pub income_per_turn: u32,
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            starting_gold: 100,
            income_per_turn: 25,
        }
    }
}
