//! Grid coordinates and fixed-point helpers.
//!
//! All simulation math is integer or fixed-point. Fractions (hp ratios used
//! by the decision engine, probabilities) go through [`Fixed`] so results
//! never depend on the host's floating-point behavior.

use std::fmt;

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for fractional simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// A cell coordinate on the terrain grid. `(0, 0)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the metric for attack, ability and area ranges.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Offset this position by a direction.
    #[must_use]
    pub const fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbors, in scan order.
    pub fn neighbors4(self) -> impl Iterator<Item = Self> {
        ORTHOGONAL.iter().map(move |&d| self.offset(d))
    }

    /// The eight surrounding cells, orthogonals first.
    pub fn neighbors8(self) -> impl Iterator<Item = Self> {
        SURROUNDING.iter().map(move |&d| self.offset(d))
    }

    /// All positions within `radius` Manhattan distance, row-major.
    pub fn diamond(self, radius: u32) -> impl Iterator<Item = Self> {
        let r = radius as i32;
        (-r..=r).flat_map(move |dy| {
            let span = r - dy.abs();
            (-span..=span).map(move |dx| self.offset((dx, dy)))
        })
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Orthogonal direction offsets: south, north, east, west.
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// Orthogonal then diagonal offsets. Also the spawn-cell search order.
pub const SURROUNDING: [(i32, i32); 8] = [
    (0, 1),
    (0, -1),
    (1, 0),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// `numerator / denominator` as a fixed-point ratio. Zero denominators give zero.
#[must_use]
pub fn ratio(numerator: u32, denominator: u32) -> Fixed {
    if denominator == 0 {
        return Fixed::ZERO;
    }
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// A percentage as a fixed-point fraction (`70` -> `0.7`).
#[must_use]
pub fn percent(value: u32) -> Fixed {
    ratio(value, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan() {
        let a = GridPos::new(1, 1);
        assert_eq!(a.manhattan(GridPos::new(4, 5)), 7);
        assert_eq!(a.manhattan(a), 0);
        assert_eq!(GridPos::new(-2, 0).manhattan(GridPos::new(2, 0)), 4);
    }

    #[test]
    fn test_neighbor_scan_order() {
        let origin = GridPos::new(5, 5);
        let n4: Vec<_> = origin.neighbors4().collect();
        assert_eq!(
            n4,
            vec![
                GridPos::new(5, 6),
                GridPos::new(5, 4),
                GridPos::new(6, 5),
                GridPos::new(4, 5),
            ]
        );
        assert_eq!(origin.neighbors8().count(), 8);
    }

    #[test]
    fn test_diamond_sizes() {
        let origin = GridPos::new(0, 0);
        assert_eq!(origin.diamond(0).count(), 1);
        assert_eq!(origin.diamond(1).count(), 5);
        assert_eq!(origin.diamond(3).count(), 25);
        assert!(origin.diamond(2).all(|p| p.manhattan(origin) <= 2));
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(7, 10), Fixed::from_num(7) / Fixed::from_num(10));
        assert_eq!(ratio(5, 0), Fixed::ZERO);
        assert!(ratio(6, 10) < percent(70));
        assert!(ratio(7, 10) >= percent(70));
    }
}
