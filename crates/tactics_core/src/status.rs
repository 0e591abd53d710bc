//! Timed status effects.
//!
//! Each unit holds at most one effect per [`StatusKind`]. Effects count down
//! once per owner upkeep and are removed when they reach zero. Re-applying
//! an effect replaces it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Status effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    /// Cannot move, attack, use abilities or retaliate.
    Stunned,
    /// Takes damage every upkeep.
    Burning,
    /// Extra defense.
    ShieldWall,
    /// Extra attack range until the next attack.
    LongShot,
    /// Extra move range.
    Charge,
}

impl StatusKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stunned => "Stunned",
            Self::Burning => "Burning",
            Self::ShieldWall => "Shield Wall",
            Self::LongShot => "Long Shot",
            Self::Charge => "Charge",
        }
    }
}

/// One active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Upkeeps left before removal.
    pub remaining: u32,
    /// Damage, defense, range or move bonus depending on the kind.
    pub magnitude: u32,
}

/// Active effects on a unit, keyed by kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: BTreeMap<StatusKind, StatusEffect>,
}

impl StatusEffects {
    /// Apply or refresh an effect. A zero duration is ignored.
    pub fn apply(&mut self, kind: StatusKind, remaining: u32, magnitude: u32) {
        if remaining == 0 {
            return;
        }
        self.effects.insert(
            kind,
            StatusEffect {
                remaining,
                magnitude,
            },
        );
    }

    /// Remove an effect, returning it if present.
    pub fn remove(&mut self, kind: StatusKind) -> Option<StatusEffect> {
        self.effects.remove(&kind)
    }

    /// Whether an effect is active.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Look up an effect.
    #[must_use]
    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.get(&kind)
    }

    fn magnitude(&self, kind: StatusKind) -> u32 {
        self.effects.get(&kind).map_or(0, |e| e.magnitude)
    }

    /// Defense granted by active effects.
    #[must_use]
    pub fn defense_bonus(&self) -> u32 {
        self.magnitude(StatusKind::ShieldWall)
    }

    /// Attack range granted by active effects.
    #[must_use]
    pub fn range_bonus(&self) -> u32 {
        self.magnitude(StatusKind::LongShot)
    }

    /// Move range granted by active effects.
    #[must_use]
    pub fn move_bonus(&self) -> u32 {
        self.magnitude(StatusKind::Charge)
    }

    /// Damage dealt by damage-over-time effects this upkeep.
    #[must_use]
    pub fn periodic_damage(&self) -> u32 {
        self.magnitude(StatusKind::Burning)
    }

    /// Decrement every counter and drop those that hit zero.
    /// Returns the kinds that expired, in key order.
    pub fn tick(&mut self) -> Vec<StatusKind> {
        let mut expired = Vec::new();
        self.effects.retain(|&kind, effect| {
            effect.remaining = effect.remaining.saturating_sub(1);
            if effect.remaining == 0 {
                expired.push(kind);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Drop every effect.
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterate over active effects in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusKind, &StatusEffect)> {
        self.effects.iter().map(|(k, e)| (*k, e))
    }
}
