//! Experience thresholds and per-level stat bonuses.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Stat increase granted on reaching a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBonus {
    /// Added to max hp.
    #[serde(default)]
    pub hp: u32,
    /// Added to attack.
    #[serde(default)]
    pub attack: u32,
    /// Added to defense.
    #[serde(default)]
    pub defense: u32,
}

impl StatBonus {
    fn add(self, other: Self) -> Self {
        Self {
            hp: self.hp + other.hp,
            attack: self.attack + other.attack,
            defense: self.defense + other.defense,
        }
    }
}

/// One rung of the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStep {
    /// Total experience needed to reach this level.
    pub xp_required: u32,
    /// Bonus applied on reaching this level.
    #[serde(default)]
    pub bonus: StatBonus,
}

/// Level ladder. Entry `i` describes level `i + 1`; level 1 is free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LevelStep>", into = "Vec<LevelStep>")]
pub struct LevelTable {
    steps: Vec<LevelStep>,
}

impl LevelTable {
    /// Build a ladder. Thresholds must start at 0 and strictly increase.
    pub fn new(steps: Vec<LevelStep>) -> Result<Self> {
        match steps.first() {
            None => return Err(GameError::config("level table is empty")),
            Some(first) if first.xp_required != 0 => {
                return Err(GameError::config("level 1 must require 0 xp"));
            }
            Some(_) => {}
        }
        if steps
            .windows(2)
            .any(|pair| pair[1].xp_required <= pair[0].xp_required)
        {
            return Err(GameError::config(
                "level thresholds must strictly increase",
            ));
        }
        Ok(Self { steps })
    }

    /// 20 / 50 / 100 xp ladder topping out at level 4.
    #[must_use]
    pub fn standard() -> Self {
        let step = |xp_required, hp, attack, defense| LevelStep {
            xp_required,
            bonus: StatBonus { hp, attack, defense },
        };
        Self {
            steps: vec![
                step(0, 0, 0, 0),
                step(20, 5, 1, 0),
                step(50, 5, 1, 1),
                step(100, 10, 2, 1),
            ],
        }
    }

    /// Highest level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Experience needed to reach `level`, `None` past the top.
    #[must_use]
    pub fn xp_for(&self, level: u32) -> Option<u32> {
        let index = level.checked_sub(1)? as usize;
        self.steps.get(index).map(|s| s.xp_required)
    }

    /// Level reached with `xp` total experience.
    #[must_use]
    pub fn level_for_xp(&self, xp: u32) -> u32 {
        self.steps
            .iter()
            .take_while(|s| s.xp_required <= xp)
            .count()
            .max(1) as u32
    }

    /// Sum of every bonus up to and including `level`.
    #[must_use]
    pub fn cumulative_bonus(&self, level: u32) -> StatBonus {
        self.steps
            .iter()
            .take(level as usize)
            .fold(StatBonus::default(), |acc, s| acc.add(s.bonus))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<LevelStep>> for LevelTable {
    type Error = GameError;

    fn try_from(steps: Vec<LevelStep>) -> Result<Self> {
        Self::new(steps)
    }
}

impl From<LevelTable> for Vec<LevelStep> {
    fn from(table: LevelTable) -> Self {
        table.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_xp() {
        let table = LevelTable::standard();
        assert_eq!(table.max_level(), 4);
        assert_eq!(table.level_for_xp(0), 1);
        assert_eq!(table.level_for_xp(19), 1);
        assert_eq!(table.level_for_xp(20), 2);
        assert_eq!(table.level_for_xp(99), 3);
        assert_eq!(table.level_for_xp(500), 4);
    }

    #[test]
    fn test_cumulative_bonus() {
        let table = LevelTable::standard();
        assert_eq!(table.cumulative_bonus(1), StatBonus::default());
        assert_eq!(
            table.cumulative_bonus(3),
            StatBonus {
                hp: 10,
                attack: 2,
                defense: 1
            }
        );
        assert_eq!(
            table.cumulative_bonus(4),
            StatBonus {
                hp: 20,
                attack: 4,
                defense: 2
            }
        );
    }

    #[test]
    fn test_xp_for() {
        let table = LevelTable::standard();
        assert_eq!(table.xp_for(2), Some(20));
        assert_eq!(table.xp_for(5), None);
        assert_eq!(table.xp_for(0), None);
    }

    #[test]
    fn test_rejects_non_increasing() {
        let steps = vec![
            LevelStep {
                xp_required: 0,
                bonus: StatBonus::default(),
            },
            LevelStep {
                xp_required: 0,
                bonus: StatBonus::default(),
            },
        ];
        assert!(LevelTable::new(steps).is_err());
        assert!(LevelTable::new(Vec::new()).is_err());
    }
}
