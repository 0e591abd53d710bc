//! Unit stat table for data-driven unit definitions.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::unit_kind::{AbilityKind, UnitKind};

/// Base stats of one unit kind, before level bonuses.
///
/// # Example RON
///
/// ```ron
/// UnitStats(
///     kind: Mage,
///     max_hp: 12,
///     attack: 5,
///     defense: 0,
///     attack_range: 3,
///     move_range: 2,
///     vision_range: 3,
///     cost: Some(70),
///     xp_value: 15,
///     ability: Some(Fireball),
///     cooldown: 6,
///     ability_range: 3,
/// )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Which kind these stats describe.
    pub kind: UnitKind,
    /// Hit points at level 1.
    pub max_hp: u32,
    /// Attack power at level 1.
    pub attack: u32,
    /// Defense at level 1.
    pub defense: u32,
    /// Manhattan attack range. 0 means the unit cannot attack.
    pub attack_range: u32,
    /// Movement budget per turn.
    pub move_range: u32,
    /// Vision budget.
    pub vision_range: u32,
    /// Gold cost to build. `None` if the kind cannot be built.
    #[serde(default)]
    pub cost: Option<u32>,
    /// Experience awarded to whoever defeats this unit.
    pub xp_value: u32,
    /// Ability, if any.
    #[serde(default)]
    pub ability: Option<AbilityKind>,
    /// Turns the ability is unavailable after use.
    #[serde(default)]
    pub cooldown: u32,
    /// Manhattan range for targeted abilities.
    #[serde(default)]
    pub ability_range: u32,
}

impl UnitStats {
    /// Whether the kind can be produced with a build command.
    #[must_use]
    pub const fn is_buildable(&self) -> bool {
        self.cost.is_some()
    }

    fn validate(&self) -> Result<()> {
        if self.max_hp == 0 {
            return Err(GameError::config(format!("{} has 0 max hp", self.kind)));
        }
        if self.kind.is_base() && self.cost.is_some() {
            return Err(GameError::config("bases cannot be buildable"));
        }
        if self.ability.is_some() && self.cooldown == 0 {
            return Err(GameError::config(format!(
                "{} has an ability with no cooldown",
                self.kind
            )));
        }
        Ok(())
    }
}

/// Stats for every [`UnitKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UnitStats>", into = "Vec<UnitStats>")]
pub struct UnitTable {
    /// Indexed by [`UnitKind::index`].
    stats: Vec<UnitStats>,
}

impl UnitTable {
    /// Build a table, checking that every kind appears exactly once.
    pub fn new(mut stats: Vec<UnitStats>) -> Result<Self> {
        stats.sort_by_key(|s| s.kind);
        let kinds: Vec<_> = stats.iter().map(|s| s.kind).collect();
        if kinds != UnitKind::ALL {
            return Err(GameError::config(format!(
                "unit table must define each unit kind exactly once, got {kinds:?}"
            )));
        }
        for entry in &stats {
            entry.validate()?;
        }
        Ok(Self { stats })
    }

    /// The standard roster.
    #[must_use]
    pub fn standard() -> Self {
        use AbilityKind::{Charge, Fireball, Heal, LongShot, ShieldBash, ShieldWall};

        #[allow(clippy::too_many_arguments)]
        const fn row(
            kind: UnitKind,
            (max_hp, attack, defense): (u32, u32, u32),
            (attack_range, move_range, vision_range): (u32, u32, u32),
            cost: Option<u32>,
            xp_value: u32,
            ability: Option<AbilityKind>,
            cooldown: u32,
            ability_range: u32,
        ) -> UnitStats {
            UnitStats {
                kind,
                max_hp,
                attack,
                defense,
                attack_range,
                move_range,
                vision_range,
                cost,
                xp_value,
                ability,
                cooldown,
                ability_range,
            }
        }

        Self {
            stats: vec![
                row(UnitKind::Warrior, (25, 6, 3), (1, 3, 2), Some(50), 10, Some(ShieldWall), 5, 0),
                row(UnitKind::Archer, (15, 4, 1), (4, 2, 4), Some(60), 12, Some(LongShot), 4, 0),
                row(UnitKind::Cavalry, (30, 7, 2), (1, 5, 3), Some(80), 15, Some(Charge), 5, 0),
                row(UnitKind::Mage, (12, 5, 0), (3, 2, 3), Some(70), 15, Some(Fireball), 6, 3),
                row(UnitKind::Healer, (15, 1, 1), (1, 3, 3), Some(75), 8, Some(Heal), 3, 2),
                row(UnitKind::Knight, (28, 5, 3), (1, 3, 2), Some(85), 14, Some(ShieldBash), 4, 1),
                row(UnitKind::Scout, (12, 3, 0), (1, 5, 5), Some(40), 6, None, 0, 0),
                row(UnitKind::Base, (100, 0, 2), (0, 0, 2), None, 50, None, 0, 0),
            ],
        }
    }

    /// Stats of one kind.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> &UnitStats {
        &self.stats[kind.index()]
    }

    /// Iterate over every entry in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitStats> {
        self.stats.iter()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<UnitStats>> for UnitTable {
    type Error = GameError;

    fn try_from(stats: Vec<UnitStats>) -> Result<Self> {
        Self::new(stats)
    }
}

impl From<UnitTable> for Vec<UnitStats> {
    fn from(table: UnitTable) -> Self {
        table.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_roster() {
        let table = UnitTable::standard();
        let warrior = table.get(UnitKind::Warrior);
        assert_eq!(warrior.max_hp, 25);
        assert_eq!(warrior.ability, Some(AbilityKind::ShieldWall));

        let mage = table.get(UnitKind::Mage);
        assert_eq!(mage.cost, Some(70));
        assert_eq!(mage.ability_range, 3);

        assert!(!table.get(UnitKind::Base).is_buildable());
        assert!(table.get(UnitKind::Scout).ability.is_none());
    }

    #[test]
    fn test_standard_table_is_valid() {
        let stats: Vec<_> = UnitTable::standard().iter().copied().collect();
        assert!(UnitTable::new(stats).is_ok());
    }

    #[test]
    fn test_buildable_base_is_rejected() {
        let mut stats: Vec<_> = UnitTable::standard().iter().copied().collect();
        stats[UnitKind::Base.index()].cost = Some(10);
        let err = UnitTable::new(stats).unwrap_err();
        assert_eq!(err.code(), "configuration_error");
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let mut stats: Vec<_> = UnitTable::standard().iter().copied().collect();
        stats.retain(|s| s.kind != UnitKind::Scout);
        assert!(UnitTable::new(stats).is_err());
    }
}
