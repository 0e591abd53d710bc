//! Closed sets of unit types and abilities.
//!
//! Stats for each kind live in [`crate::data::UnitTable`]; this module only
//! carries identity, display metadata and the fixed ordering tables used by
//! the decision engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Sturdy melee infantry.
    Warrior,
    /// Long-range, fragile.
    Archer,
    /// Fast, hard-hitting melee.
    Cavalry,
    /// Ranged caster with an area attack.
    Mage,
    /// Support unit that restores hp.
    Healer,
    /// Armored melee that can stun.
    Knight,
    /// Cheap, fast, wide vision.
    Scout,
    /// Immobile headquarters. Losing it loses the match.
    Base,
}

impl UnitKind {
    /// Every kind, in table order.
    pub const ALL: [Self; 8] = [
        Self::Warrior,
        Self::Archer,
        Self::Cavalry,
        Self::Mage,
        Self::Healer,
        Self::Knight,
        Self::Scout,
        Self::Base,
    ];

    /// Index into per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Map letter. Renderers upper- or lower-case it by owner.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Warrior => 'W',
            Self::Archer => 'A',
            Self::Cavalry => 'C',
            Self::Mage => 'M',
            Self::Healer => 'H',
            Self::Knight => 'K',
            Self::Scout => 'S',
            Self::Base => 'B',
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Archer => "Archer",
            Self::Cavalry => "Cavalry",
            Self::Mage => "Mage",
            Self::Healer => "Healer",
            Self::Knight => "Knight",
            Self::Scout => "Scout",
            Self::Base => "Base",
        }
    }

    /// Whether this is a base.
    #[must_use]
    pub const fn is_base(self) -> bool {
        matches!(self, Self::Base)
    }

    /// Rank used to break ties between equally attractive targets.
    /// Lower ranks are attacked first.
    #[must_use]
    pub const fn target_priority(self) -> u8 {
        match self {
            Self::Base => 0,
            Self::Healer => 1,
            Self::Mage => 2,
            Self::Archer => 3,
            Self::Scout => 4,
            Self::Cavalry => 5,
            Self::Knight => 6,
            Self::Warrior => 7,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a unit kind name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownUnitKind(pub String);

impl fmt::Display for UnknownUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit type '{}'", self.0)
    }
}

impl std::error::Error for UnknownUnitKind {}

impl FromStr for UnitKind {
    type Err = UnknownUnitKind;

    /// Case-insensitive parse of a kind name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownUnitKind(s.to_string()))
    }
}

/// Abilities. At most one per unit kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityKind {
    /// Attack an adjacent enemy and stun it.
    ShieldBash,
    /// Self: extra attack range until the next attack.
    LongShot,
    /// Self: extra move range this turn.
    Charge,
    /// Area damage around a cell, may set targets burning.
    Fireball,
    /// Restore hp to a friendly unit.
    Heal,
    /// Self: extra defense for a couple of turns.
    ShieldWall,
}

/// How an ability picks its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetMode {
    /// Affects the caster only.
    SelfOnly,
    /// Targets a grid cell.
    Cell,
    /// Targets a single unit.
    Unit,
}

impl AbilityKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ShieldBash => "Shield Bash",
            Self::LongShot => "Long Shot",
            Self::Charge => "Charge",
            Self::Fireball => "Fireball",
            Self::Heal => "Heal",
            Self::ShieldWall => "Shield Wall",
        }
    }

    /// Target mode.
    #[must_use]
    pub const fn target_mode(self) -> TargetMode {
        match self {
            Self::LongShot | Self::Charge | Self::ShieldWall => TargetMode::SelfOnly,
            Self::Fireball => TargetMode::Cell,
            Self::ShieldBash | Self::Heal => TargetMode::Unit,
        }
    }

    /// Whether a successful use also spends the attack slot.
    #[must_use]
    pub const fn consumes_attack(self) -> bool {
        matches!(self, Self::ShieldBash | Self::Fireball | Self::Heal)
    }
}

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
