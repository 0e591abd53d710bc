//! Per-kind terrain numbers.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::terrain::{TerrainCell, TerrainKind};

/// Terrain properties for every [`TerrainKind`].
///
/// Deserialized from a list of [`TerrainCell`] entries; every kind must
/// appear exactly once.
///
/// # Example RON
///
/// ```ron
/// [
///     (kind: Plains, move_cost: Some(1), defense_bonus: 0, vision_cost: 1, spawnable: true),
///     (kind: GoldMine, move_cost: Some(1), defense_bonus: 0, vision_cost: 1, income: Some(10)),
///     // ...
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TerrainCell>", into = "Vec<TerrainCell>")]
pub struct TerrainTable {
    /// Indexed by `TerrainKind as usize`.
    cells: Vec<TerrainCell>,
}

impl TerrainTable {
    /// Build a table, checking completeness and cost sanity.
    pub fn new(mut cells: Vec<TerrainCell>) -> Result<Self> {
        cells.sort_by_key(|c| c.kind);
        let kinds: Vec<_> = cells.iter().map(|c| c.kind).collect();
        if kinds != TerrainKind::ALL {
            return Err(GameError::config(format!(
                "terrain table must define each terrain kind exactly once, got {kinds:?}"
            )));
        }
        for cell in &cells {
            cell.validate()?;
        }
        Ok(Self { cells })
    }

    /// Default terrain numbers.
    #[must_use]
    pub fn standard() -> Self {
        let cell = |kind, move_cost, defense_bonus, vision_cost, income, spawnable| TerrainCell {
            kind,
            move_cost: Some(move_cost),
            defense_bonus,
            vision_cost,
            income,
            spawnable,
            blocks_fire: false,
        };
        let cover = |cell: TerrainCell| TerrainCell {
            blocks_fire: true,
            ..cell
        };
        Self {
            cells: vec![
                cell(TerrainKind::Plains, 1, 0, 1, None, true),
                cover(cell(TerrainKind::Mountain, 2, 2, 2, None, false)),
                cover(cell(TerrainKind::Forest, 2, 1, 2, None, false)),
                cell(TerrainKind::GoldMine, 1, 0, 1, Some(10), false),
                cell(TerrainKind::BaseSite, 1, 1, 1, None, false),
            ],
        }
    }

    /// Properties of one kind.
    #[must_use]
    pub fn get(&self, kind: TerrainKind) -> &TerrainCell {
        &self.cells[kind as usize]
    }

    /// Movement cost of one kind, `None` if impassable.
    #[must_use]
    pub fn move_cost(&self, kind: TerrainKind) -> Option<u32> {
        self.get(kind).move_cost
    }

    /// Iterate over every entry in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &TerrainCell> {
        self.cells.iter()
    }
}

impl Default for TerrainTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<TerrainCell>> for TerrainTable {
    type Error = GameError;

    fn try_from(cells: Vec<TerrainCell>) -> Result<Self> {
        Self::new(cells)
    }
}

impl From<TerrainTable> for Vec<TerrainCell> {
    fn from(table: TerrainTable) -> Self {
        table.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_numbers() {
        let table = TerrainTable::standard();
        assert_eq!(table.move_cost(TerrainKind::Mountain), Some(2));
        assert_eq!(table.get(TerrainKind::Mountain).defense_bonus, 2);
        assert_eq!(table.get(TerrainKind::Forest).vision_cost, 2);
        assert_eq!(table.get(TerrainKind::GoldMine).income, Some(10));
        assert!(table.get(TerrainKind::Plains).spawnable);
        assert!(!table.get(TerrainKind::BaseSite).spawnable);
        assert!(table.get(TerrainKind::Forest).blocks_fire);
        assert!(!table.get(TerrainKind::GoldMine).blocks_fire);
    }

    #[test]
    fn test_new_sorts_and_validates() {
        let mut cells: Vec<_> = TerrainTable::standard().iter().copied().collect();
        cells.reverse();
        let table = TerrainTable::new(cells.clone()).unwrap();
        assert_eq!(table, TerrainTable::standard());

        cells.pop();
        assert!(TerrainTable::new(cells).is_err());
    }

    #[test]
    fn test_ron_roundtrip() {
        let table = TerrainTable::standard();
        let text = ron::to_string(&table).unwrap();
        let back: TerrainTable = ron::from_str(&text).unwrap();
        assert_eq!(back, table);
    }
}
