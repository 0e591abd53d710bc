//! Per-faction fog of war.
//!
//! Each faction keeps a tri-state map:
//! - Unseen: never seen
//! - Explored: seen before but not right now
//! - Visible: currently seen by at least one live unit
//!
//! Recomputation first downgrades every visible cell to explored, then
//! floods vision out of every live unit. A cell is never downgraded back to
//! unseen, so memory only grows.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::data::TerrainTable;
use crate::math::GridPos;
use crate::terrain::TerrainGrid;

/// Visibility state of one cell for one faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    /// Never seen.
    #[default]
    Unseen,
    /// Seen previously. Terrain is known; units are not shown.
    Explored,
    /// Seen right now.
    Visible,
}

/// Visibility map for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityMap {
    width: u32,
    height: u32,
    cells: Vec<Visibility>,
}

impl VisibilityMap {
    /// Create a map with every cell unseen.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Visibility::Unseen; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, pos: GridPos) -> Option<usize> {
        if pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
        {
            Some((pos.y as usize) * (self.width as usize) + (pos.x as usize))
        } else {
            None
        }
    }

    /// State of a cell. Out-of-bounds cells are unseen.
    #[must_use]
    pub fn get(&self, pos: GridPos) -> Visibility {
        self.index(pos)
            .map_or(Visibility::Unseen, |i| self.cells[i])
    }

    /// Whether a cell is currently visible.
    #[must_use]
    pub fn is_visible(&self, pos: GridPos) -> bool {
        self.get(pos) == Visibility::Visible
    }

    /// Whether a cell has ever been seen.
    #[must_use]
    pub fn is_known(&self, pos: GridPos) -> bool {
        self.get(pos) != Visibility::Unseen
    }

    /// Turn every visible cell into an explored one.
    pub fn downgrade(&mut self) {
        for cell in &mut self.cells {
            if *cell == Visibility::Visible {
                *cell = Visibility::Explored;
            }
        }
    }

    /// Mark every cell within `range` vision cost of `origin` visible.
    ///
    /// Vision spreads 8-directionally; entering a cell spends that cell's
    /// vision cost. The origin is always visible.
    pub fn reveal_from(
        &mut self,
        grid: &TerrainGrid,
        terrain: &TerrainTable,
        origin: GridPos,
        range: u32,
    ) {
        let Some(start) = self.index(origin) else {
            return;
        };
        self.cells[start] = Visibility::Visible;

        let mut spent = vec![u32::MAX; self.cells.len()];
        spent[start] = 0;
        let mut frontier = BinaryHeap::new();
        frontier.push(Reverse((0_u32, start)));

        while let Some(Reverse((cost, index))) = frontier.pop() {
            if cost > spent[index] {
                continue;
            }
            let here = grid.pos_of(index);
            for next in here.neighbors8() {
                let (Some(next_index), Some(kind)) = (self.index(next), grid.kind_at(next)) else {
                    continue;
                };
                let total = cost.saturating_add(terrain.get(kind).vision_cost);
                if total > range || total >= spent[next_index] {
                    continue;
                }
                spent[next_index] = total;
                self.cells[next_index] = Visibility::Visible;
                frontier.push(Reverse((total, next_index)));
            }
        }
    }

    /// Downgrade, then reveal from every `(position, vision range)` source.
    pub fn recompute<I>(&mut self, grid: &TerrainGrid, terrain: &TerrainTable, sources: I)
    where
        I: IntoIterator<Item = (GridPos, u32)>,
    {
        self.downgrade();
        for (pos, range) in sources {
            self.reveal_from(grid, terrain, pos, range);
        }
    }

    /// Number of cells in each state: `(unseen, explored, visible)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        self.cells
            .iter()
            .fold((0, 0, 0), |(u, e, v), cell| match cell {
                Visibility::Unseen => (u + 1, e, v),
                Visibility::Explored => (u, e + 1, v),
                Visibility::Visible => (u, e, v + 1),
            })
    }

    /// Iterate over currently visible positions in row-major order.
    pub fn visible_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        let width = self.width as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Visibility::Visible)
            .map(move |(i, _)| GridPos::new((i % width) as i32, (i / width) as i32))
    }
}
