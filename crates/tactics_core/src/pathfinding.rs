//! Cost-weighted pathfinding over the terrain grid.
//!
//! Movement is 4-directional. [`find_path`] validates point-to-point moves
//! with A* and a Manhattan heuristic; [`reachable_costs`] runs a
//! cost-bounded Dijkstra expansion to find every cell a unit could end its
//! move on.
//!
//! Both searches take the per-unit cost function and an occupancy predicate
//! as closures so the caller decides which cells are blocked by live units.
//! Expansion order is fully determined by cost and neighbor-scan order, so
//! equal inputs always produce equal paths.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::math::GridPos;
use crate::terrain::{TerrainGrid, TerrainKind};

/// A path found by [`find_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    /// Cells from start to goal, both inclusive.
    pub cells: Vec<GridPos>,
    /// Sum of the entry costs of every cell after the start.
    pub cost: u32,
}

impl Path {
    /// Final cell of the path.
    #[must_use]
    pub fn goal(&self) -> Option<GridPos> {
        self.cells.last().copied()
    }

    /// Number of steps taken (cells minus the start).
    #[must_use]
    pub fn steps(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

/// A node in the open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct SearchNode {
    pos: GridPos,
    /// f = g + h for A*, plain g for Dijkstra.
    priority: u32,
    /// Insertion sequence. Equal priorities pop in the order they were pushed,
    /// which follows neighbor-scan order.
    sequence: u64,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse both keys for min-first popping.
        match other.priority.cmp(&self.priority) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a minimum-cost path from `start` to `goal`.
///
/// `cost_fn` maps a terrain kind to its entry cost, `None` for impassable.
/// `occupied` reports cells holding a live unit other than the mover; those
/// cells are never entered. Returns `None` if the goal is out of bounds,
/// impassable, occupied, or unreachable.
pub fn find_path<C, O>(
    grid: &TerrainGrid,
    start: GridPos,
    goal: GridPos,
    cost_fn: C,
    occupied: O,
) -> Option<Path>
where
    C: Fn(TerrainKind) -> Option<u32>,
    O: Fn(GridPos) -> bool,
{
    if !grid.in_bounds(start) {
        return None;
    }
    if start == goal {
        return Some(Path {
            cells: vec![start],
            cost: 0,
        });
    }
    let goal_kind = grid.kind_at(goal)?;
    if cost_fn(goal_kind).is_none() || occupied(goal) {
        return None;
    }

    let mut open_set: BinaryHeap<SearchNode> = BinaryHeap::new();
    let mut came_from: HashMap<GridPos, GridPos> = HashMap::new();
    let mut g_score: HashMap<GridPos, u32> = HashMap::new();
    let mut closed: HashSet<GridPos> = HashSet::new();
    let mut sequence = 0_u64;

    g_score.insert(start, 0);
    open_set.push(SearchNode {
        pos: start,
        priority: start.manhattan(goal),
        sequence,
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            let cost = g_score.get(&goal).copied().unwrap_or_default();
            return Some(Path {
                cells: reconstruct_path(&came_from, goal),
                cost,
            });
        }
        if !closed.insert(current.pos) {
            continue;
        }

        let current_g = g_score.get(&current.pos).copied().unwrap_or(u32::MAX);

        for next in current.pos.neighbors4() {
            if closed.contains(&next) {
                continue;
            }
            let Some(kind) = grid.kind_at(next) else {
                continue;
            };
            let Some(step) = cost_fn(kind) else {
                continue;
            };
            if occupied(next) {
                continue;
            }

            let tentative_g = current_g.saturating_add(step);
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);
            if tentative_g < neighbor_g {
                came_from.insert(next, current.pos);
                g_score.insert(next, tentative_g);
                sequence += 1;
                open_set.push(SearchNode {
                    pos: next,
                    priority: tentative_g.saturating_add(next.manhattan(goal)),
                    sequence,
                });
            }
        }
    }

    None
}

/// Reconstruct path from came_from map.
fn reconstruct_path(came_from: &HashMap<GridPos, GridPos>, goal: GridPos) -> Vec<GridPos> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Total entry cost of walking `cells` in order, `None` if any step is
/// impassable, out of bounds, or not orthogonally adjacent.
pub fn path_cost<C>(grid: &TerrainGrid, cells: &[GridPos], cost_fn: C) -> Option<u32>
where
    C: Fn(TerrainKind) -> Option<u32>,
{
    let mut total = 0_u32;
    for pair in cells.windows(2) {
        if pair[0].manhattan(pair[1]) != 1 {
            return None;
        }
        let kind = grid.kind_at(pair[1])?;
        total = total.checked_add(cost_fn(kind)?)?;
    }
    Some(total)
}

/// Cheapest entry cost of every cell reachable from `start` within `budget`.
///
/// Occupied cells are neither entered nor passed through. The start cell is
/// always present with cost 0, even when `budget` is 0.
pub fn reachable_costs<C, O>(
    grid: &TerrainGrid,
    start: GridPos,
    budget: u32,
    cost_fn: C,
    occupied: O,
) -> BTreeMap<GridPos, u32>
where
    C: Fn(TerrainKind) -> Option<u32>,
    O: Fn(GridPos) -> bool,
{
    let mut best: BTreeMap<GridPos, u32> = BTreeMap::new();
    best.insert(start, 0);

    let mut frontier: BinaryHeap<SearchNode> = BinaryHeap::new();
    let mut sequence = 0_u64;
    frontier.push(SearchNode {
        pos: start,
        priority: 0,
        sequence,
    });

    while let Some(current) = frontier.pop() {
        if best.get(&current.pos).is_some_and(|&g| g < current.priority) {
            continue;
        }
        for next in current.pos.neighbors4() {
            let Some(kind) = grid.kind_at(next) else {
                continue;
            };
            let Some(step) = cost_fn(kind) else {
                continue;
            };
            if next == start || occupied(next) {
                continue;
            }
            let cost = current.priority.saturating_add(step);
            if cost > budget {
                continue;
            }
            if best.get(&next).map_or(true, |&known| cost < known) {
                best.insert(next, cost);
                sequence += 1;
                frontier.push(SearchNode {
                    pos: next,
                    priority: cost,
                    sequence,
                });
            }
        }
    }

    best
}

/// Every cell reachable from `start` within `budget`, start included.
pub fn reachable_set<C, O>(
    grid: &TerrainGrid,
    start: GridPos,
    budget: u32,
    cost_fn: C,
    occupied: O,
) -> BTreeSet<GridPos>
where
    C: Fn(TerrainKind) -> Option<u32>,
    O: Fn(GridPos) -> bool,
{
    reachable_costs(grid, start, budget, cost_fn, occupied)
        .into_keys()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_cost(kind: TerrainKind) -> Option<u32> {
        match kind {
            TerrainKind::Mountain | TerrainKind::Forest => Some(2),
            _ => Some(1),
        }
    }

    fn nobody(_: GridPos) -> bool {
        false
    }

    fn pos(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    #[test]
    fn test_path_to_same_cell() {
        let grid = TerrainGrid::filled(5, 5, TerrainKind::Plains);
        let path = find_path(&grid, pos(2, 2), pos(2, 2), standard_cost, nobody).unwrap();
        assert_eq!(path.cells, vec![pos(2, 2)]);
        assert_eq!(path.cost, 0);
    }

    #[test]
    fn test_simple_path_is_minimal() {
        let grid = TerrainGrid::filled(10, 10, TerrainKind::Plains);
        let path = find_path(&grid, pos(0, 0), pos(5, 3), standard_cost, nobody).unwrap();
        assert_eq!(path.cells.first(), Some(&pos(0, 0)));
        assert_eq!(path.goal(), Some(pos(5, 3)));
        assert_eq!(path.cost, 8);
        assert_eq!(path.steps(), 8);
        assert_eq!(path_cost(&grid, &path.cells, standard_cost), Some(8));
    }

    #[test]
    fn test_path_prefers_cheap_detour() {
        // Forest strip in the middle column except the bottom row.
        let grid = TerrainGrid::from_layout(5, 3, &["PPFPP", "PPFPP", "PPPPP"]).unwrap();
        let path = find_path(&grid, pos(0, 0), pos(4, 0), standard_cost, nobody).unwrap();
        // Straight through the forest costs 5; the detour via row 2 costs 8.
        assert_eq!(path.cost, 5);

        let expensive = |kind: TerrainKind| match kind {
            TerrainKind::Forest => Some(10),
            _ => Some(1),
        };
        let path = find_path(&grid, pos(0, 0), pos(4, 0), expensive, nobody).unwrap();
        assert_eq!(path.cost, 8);
        assert!(path.cells.contains(&pos(2, 2)));
    }

    #[test]
    fn test_path_avoids_occupied_cells() {
        let grid = TerrainGrid::filled(3, 3, TerrainKind::Plains);
        let blocker = |p: GridPos| p == pos(1, 0);
        let path = find_path(&grid, pos(0, 0), pos(2, 0), standard_cost, blocker).unwrap();
        assert!(!path.cells.contains(&pos(1, 0)));
        assert_eq!(path.cost, 4);
    }

    #[test]
    fn test_occupied_goal_has_no_path() {
        let grid = TerrainGrid::filled(3, 3, TerrainKind::Plains);
        let blocker = |p: GridPos| p == pos(2, 2);
        assert!(find_path(&grid, pos(0, 0), pos(2, 2), standard_cost, blocker).is_none());
    }

    #[test]
    fn test_walled_off_goal_is_unreachable() {
        let grid = TerrainGrid::from_layout(3, 3, &["PMP", "PMP", "PMP"]).unwrap();
        let no_mountains = |kind: TerrainKind| match kind {
            TerrainKind::Mountain => None,
            _ => Some(1),
        };
        assert!(find_path(&grid, pos(0, 1), pos(2, 1), no_mountains, nobody).is_none());
        assert!(find_path(&grid, pos(0, 1), pos(9, 9), standard_cost, nobody).is_none());
    }

    #[test]
    fn test_path_is_deterministic() {
        let grid = TerrainGrid::filled(8, 8, TerrainKind::Plains);
        let first = find_path(&grid, pos(0, 0), pos(7, 7), standard_cost, nobody).unwrap();
        for _ in 0..10 {
            let again = find_path(&grid, pos(0, 0), pos(7, 7), standard_cost, nobody).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_reachable_diamond_on_plains() {
        let grid = TerrainGrid::filled(12, 12, TerrainKind::Plains);
        let origin = pos(6, 6);
        for range in 0..=4 {
            let set = reachable_set(&grid, origin, range, standard_cost, nobody);
            let diamond: BTreeSet<_> = origin.diamond(range).collect();
            assert_eq!(set, diamond, "range {range}");
        }
        assert_eq!(
            reachable_set(&grid, origin, 2, standard_cost, nobody).len(),
            13
        );
    }

    #[test]
    fn test_reachable_excludes_occupied_but_keeps_start() {
        let grid = TerrainGrid::filled(7, 7, TerrainKind::Plains);
        let origin = pos(3, 3);
        let blocked = |p: GridPos| p == pos(4, 3) || p == origin;
        let set = reachable_set(&grid, origin, 3, standard_cost, blocked);
        assert!(set.contains(&origin));
        assert!(!set.contains(&pos(4, 3)));
        // Going around the blocker costs 4.
        assert!(!set.contains(&pos(5, 3)));
        assert!(!set.contains(&pos(6, 3)));
        assert!(set.contains(&pos(5, 4)));
        assert_eq!(set.len(), 25 - 3);
    }

    #[test]
    fn test_reachable_respects_terrain_cost() {
        let grid = TerrainGrid::from_layout(5, 1, &["PFPPP"]).unwrap();
        let costs = reachable_costs(&grid, pos(0, 0), 3, standard_cost, nobody);
        assert_eq!(costs.get(&pos(1, 0)), Some(&2));
        assert_eq!(costs.get(&pos(2, 0)), Some(&3));
        assert!(!costs.contains_key(&pos(3, 0)));
    }

    #[test]
    fn test_zero_budget_is_own_cell() {
        let grid = TerrainGrid::filled(4, 4, TerrainKind::Plains);
        let set = reachable_set(&grid, pos(1, 1), 0, standard_cost, nobody);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![pos(1, 1)]);
    }
}
