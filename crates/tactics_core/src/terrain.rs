//! Terrain classification and the immutable terrain grid.
//!
//! The grid is built once from a layout of rows of terrain characters and
//! never changes afterwards. Per-kind numbers (movement cost, defense bonus,
//! vision cost, income) live in [`TerrainTable`], which is part of the
//! injected rules.

use serde::{Deserialize, Serialize};

use crate::data::TerrainTable;
use crate::error::{GameError, Result};
use crate::math::GridPos;

/// Terrain kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Open ground. The only terrain new units can be spawned on.
    #[default]
    Plains,
    /// Slow, defensible, blocks vision cheaply and ranged fire.
    Mountain,
    /// Slow, mildly defensible, blocks ranged fire.
    Forest,
    /// Pays income to the faction whose unit stands on it.
    GoldMine,
    /// Foundation cell under a base.
    BaseSite,
}

impl TerrainKind {
    /// Every terrain kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Plains,
        Self::Mountain,
        Self::Forest,
        Self::GoldMine,
        Self::BaseSite,
    ];

    /// Parse a layout character.
    #[must_use]
    pub const fn from_layout_char(c: char) -> Option<Self> {
        match c {
            'P' => Some(Self::Plains),
            'M' => Some(Self::Mountain),
            'F' => Some(Self::Forest),
            'G' => Some(Self::GoldMine),
            'B' => Some(Self::BaseSite),
            _ => None,
        }
    }

    /// Layout character, the inverse of [`from_layout_char`](Self::from_layout_char).
    #[must_use]
    pub const fn layout_char(self) -> char {
        match self {
            Self::Plains => 'P',
            Self::Mountain => 'M',
            Self::Forest => 'F',
            Self::GoldMine => 'G',
            Self::BaseSite => 'B',
        }
    }

    /// Map symbol used by renderers.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Plains => '.',
            Self::Mountain => '^',
            Self::Forest => '#',
            Self::GoldMine => 'G',
            Self::BaseSite => 'B',
        }
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plains => "Plains",
            Self::Mountain => "Mountain",
            Self::Forest => "Forest",
            Self::GoldMine => "Gold Mine",
            Self::BaseSite => "Base",
        }
    }
}

/// Per-kind terrain properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainCell {
    /// Terrain kind.
    pub kind: TerrainKind,
    /// Cost to enter the cell. `None` means impassable.
    pub move_cost: Option<u32>,
    /// Defense added to a unit standing here.
    pub defense_bonus: u32,
    /// Vision budget spent to see into the cell.
    pub vision_cost: u32,
    /// Gold per upkeep for the faction occupying the cell.
    #[serde(default)]
    pub income: Option<u32>,
    /// Whether new units may be spawned here.
    #[serde(default)]
    pub spawnable: bool,
    /// Whether the cell stops ranged fire aimed just past it.
    #[serde(default)]
    pub blocks_fire: bool,
}

impl TerrainCell {
    /// Check that the numbers obey the engine's assumptions.
    pub fn validate(&self) -> Result<()> {
        if self.move_cost == Some(0) {
            return Err(GameError::config(format!(
                "{} has a movement cost of 0; costs must be at least 1",
                self.kind.name()
            )));
        }
        if self.vision_cost == 0 {
            return Err(GameError::config(format!(
                "{} has a vision cost of 0; costs must be at least 1",
                self.kind.name()
            )));
        }
        Ok(())
    }
}

/// The terrain grid. Dimensions are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainGrid {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Cell kinds stored in row-major order.
    cells: Vec<TerrainKind>,
}

impl TerrainGrid {
    /// Build a grid from layout rows (one character per cell).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConfigurationError`] if the layout does not match
    /// the declared dimensions or contains an unknown terrain character.
    pub fn from_layout<S: AsRef<str>>(width: u32, height: u32, rows: &[S]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::config("grid dimensions must be positive"));
        }
        if rows.len() != height as usize {
            return Err(GameError::config(format!(
                "terrain layout has {} rows, expected {height}",
                rows.len()
            )));
        }

        let mut cells = Vec::with_capacity((width * height) as usize);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let len = row.chars().count();
            if len != width as usize {
                return Err(GameError::config(format!(
                    "terrain layout row {y} has {len} cells, expected {width}"
                )));
            }
            for (x, c) in row.chars().enumerate() {
                let kind = TerrainKind::from_layout_char(c).ok_or_else(|| {
                    GameError::config(format!("invalid terrain key '{c}' at ({x}, {y})"))
                })?;
                cells.push(kind);
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// A grid filled with one terrain kind.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn filled(width: u32, height: u32, kind: TerrainKind) -> Self {
        assert!(width > 0, "TerrainGrid width must be positive");
        assert!(height > 0, "TerrainGrid height must be positive");
        Self {
            width,
            height,
            cells: vec![kind; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; grids have at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Check if a position is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Row-major index of an in-bounds position.
    #[must_use]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y as usize) * (self.width as usize) + (pos.x as usize))
    }

    /// Position of a row-major index.
    #[must_use]
    pub fn pos_of(&self, index: usize) -> GridPos {
        let w = self.width as usize;
        GridPos::new((index % w) as i32, (index / w) as i32)
    }

    /// Terrain kind at a position, `None` if out of bounds.
    #[must_use]
    pub fn kind_at(&self, pos: GridPos) -> Option<TerrainKind> {
        self.index_of(pos).map(|i| self.cells[i])
    }

    /// Iterate over all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.cells.len()).map(|i| self.pos_of(i))
    }

    /// Layout rows, the inverse of [`from_layout`](Self::from_layout).
    #[must_use]
    pub fn to_layout(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|k| k.layout_char()).collect())
            .collect()
    }

    /// Movement cost of entering a cell under the given table.
    #[must_use]
    pub fn move_cost(&self, table: &TerrainTable, pos: GridPos) -> Option<u32> {
        self.kind_at(pos).and_then(|k| table.get(k).move_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_roundtrip() {
        let rows = ["PMF", "GBP"];
        let grid = TerrainGrid::from_layout(3, 2, &rows).unwrap();
        assert_eq!(grid.kind_at(GridPos::new(1, 0)), Some(TerrainKind::Mountain));
        assert_eq!(grid.kind_at(GridPos::new(1, 1)), Some(TerrainKind::BaseSite));
        assert_eq!(grid.to_layout(), vec!["PMF".to_string(), "GBP".to_string()]);
    }

    #[test]
    fn test_layout_rejects_bad_dimensions() {
        let err = TerrainGrid::from_layout(3, 3, &["PPP", "PPP"]).unwrap_err();
        assert!(matches!(err, GameError::ConfigurationError(_)));

        let err = TerrainGrid::from_layout(3, 2, &["PPP", "PP"]).unwrap_err();
        assert!(matches!(err, GameError::ConfigurationError(_)));
    }

    #[test]
    fn test_layout_rejects_unknown_key() {
        let err = TerrainGrid::from_layout(2, 1, &["PX"]).unwrap_err();
        assert_eq!(
            err,
            GameError::ConfigurationError("invalid terrain key 'X' at (1, 0)".into())
        );
    }

    #[test]
    fn test_bounds_and_indexing() {
        let grid = TerrainGrid::filled(4, 3, TerrainKind::Plains);
        assert!(grid.in_bounds(GridPos::new(3, 2)));
        assert!(!grid.in_bounds(GridPos::new(4, 0)));
        assert!(!grid.in_bounds(GridPos::new(-1, 0)));
        assert_eq!(grid.index_of(GridPos::new(1, 2)), Some(9));
        assert_eq!(grid.pos_of(9), GridPos::new(1, 2));
        assert_eq!(grid.kind_at(GridPos::new(0, 3)), None);
        assert_eq!(grid.positions().count(), 12);
    }

    #[test]
    fn test_zero_costs_are_rejected() {
        let cell = TerrainCell {
            kind: TerrainKind::Plains,
            move_cost: Some(0),
            defense_bonus: 0,
            vision_cost: 1,
            income: None,
            spawnable: true,
            blocks_fire: false,
        };
        assert!(cell.validate().is_err());
    }
}
