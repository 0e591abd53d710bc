//! ASCII rendering of a faction's view.
//!
//! The map is drawn from one faction's perspective: visible cells show their
//! occupant or terrain, remembered cells show lower-case terrain, and unseen
//! cells are blank. The viewer's units are upper-case, enemy units
//! lower-case.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use tactics_core::math::GridPos;
use tactics_core::player_facade::{CellView, FactionView, UnitSnapshot};
use tactics_core::visibility::Visibility;

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Dim remembered cells with ANSI escapes instead of relying on case.
    pub use_color: bool,
    /// Cells to mark with `*` when empty, e.g. a selected unit's moves.
    pub highlight: BTreeSet<GridPos>,
}

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn cell_char(view: &FactionView, cell: &CellView, pos: GridPos, config: &RenderConfig) -> char {
    if let Some((id, kind)) = cell.unit {
        let letter = kind.letter();
        return if id.faction == view.viewer {
            letter.to_ascii_uppercase()
        } else {
            letter.to_ascii_lowercase()
        };
    }
    if config.highlight.contains(&pos) {
        return '*';
    }
    match (cell.visibility, cell.terrain) {
        (Visibility::Visible, Some(terrain)) => terrain.symbol(),
        (Visibility::Explored, Some(terrain)) => terrain.symbol().to_ascii_lowercase(),
        _ => ' ',
    }
}

/// Draw the map with column and row headers.
#[must_use]
pub fn render_map(view: &FactionView, config: &RenderConfig) -> String {
    let mut out = String::from("   ");
    for x in 0..view.width {
        let _ = write!(out, "{x:>3}");
    }
    out.push('\n');

    for y in 0..view.height as i32 {
        let _ = write!(out, "{y:>2} ");
        for x in 0..view.width as i32 {
            let pos = GridPos::new(x, y);
            let Some(cell) = view.cell(pos) else {
                continue;
            };
            let symbol = cell_char(view, cell, pos, config);
            out.push_str("  ");
            if config.use_color && cell.visibility == Visibility::Explored && cell.unit.is_none()
            {
                let _ = write!(out, "{DIM}{symbol}{RESET}");
            } else {
                out.push(symbol);
            }
        }
        out.push('\n');
    }
    out
}

/// One-line description of a unit.
#[must_use]
pub fn unit_line(unit: &UnitSnapshot) -> String {
    let mut line = format!(
        "{} {} at {} HP {}/{} Lv {}",
        unit.id, unit.kind, unit.position, unit.hp, unit.max_hp, unit.level
    );
    if let Some(ability) = unit.ability {
        if unit.cooldown > 0 {
            let _ = write!(line, " [{ability}: {} turns]", unit.cooldown);
        } else {
            let _ = write!(line, " [{ability}: ready]");
        }
    }
    for (status, remaining) in &unit.statuses {
        let _ = write!(line, " ({} {remaining})", status.name());
    }
    if !unit.can_act {
        line.push_str(" - done");
    }
    line
}

/// Full stat block for the `info` command.
#[must_use]
pub fn unit_details(unit: &UnitSnapshot) -> String {
    let mut out = unit_line(unit);
    let _ = write!(
        out,
        "\n  XP {}  ATK {}  DEF {}  Range {}  Move {}",
        unit.xp, unit.attack, unit.defense, unit.attack_range, unit.move_range
    );
    out
}

/// Map, header, and unit lists as the viewer sees them.
#[must_use]
pub fn render_view(view: &FactionView, config: &RenderConfig) -> String {
    let mut out = format!(
        "===== Turn {} - {} to act =====\nGold: {}\n",
        view.turn,
        view.active.display_name(),
        view.gold
    );
    out.push_str(&render_map(view, config));

    let _ = writeln!(out, "\n--- Your Units ({}) ---", view.viewer.display_name());
    for unit in &view.own_units {
        let _ = writeln!(out, "  {}", unit_line(unit));
    }

    out.push_str("\n--- Visible Enemy Units ---\n");
    if view.visible_enemies.is_empty() {
        out.push_str("  None\n");
    }
    for unit in &view.visible_enemies {
        let _ = writeln!(out, "  {} {} at {}", unit.id, unit.kind, unit.position);
    }

    if let Some(winner) = view.winner {
        let _ = writeln!(out, "\n{} wins!", winner.display_name());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::factions::FactionId;
    use tactics_core::setup::MatchConfig;
    use tactics_core::unit_kind::UnitKind;
    use tactics_core::Match;
    use tactics_test_utils::fixtures::MatchBuilder;

    fn skirmish_view() -> FactionView {
        Match::new(MatchConfig::skirmish(), 1)
            .unwrap()
            .view(FactionId::Blue)
    }

    fn row(map: &str, y: usize) -> Vec<char> {
        // Header line first, then one line per row; each cell is "  c".
        map.lines()
            .nth(y + 1)
            .unwrap()
            .chars()
            .skip(5)
            .step_by(3)
            .collect()
    }

    #[test]
    fn test_own_units_upper_case_and_fog_blank() {
        let view = skirmish_view();
        let map = render_map(&view, &RenderConfig::default());
        let first = row(&map, 1);
        assert_eq!(first[1], 'B');
        assert_eq!(first[2], 'A');
        assert_eq!(row(&map, 2)[1], 'W');
        // Red's corner is out of sight.
        assert_eq!(row(&map, 8)[10], ' ');
    }

    #[test]
    fn test_headers() {
        let map = render_map(&skirmish_view(), &RenderConfig::default());
        let header = map.lines().next().unwrap();
        assert!(header.starts_with("     0  1  2"));
        assert!(header.ends_with(" 10 11"));
        assert_eq!(map.lines().count(), 11);
    }

    #[test]
    fn test_enemy_lower_case_when_visible() {
        let game = MatchBuilder::plains(6, 3)
            .unit(FactionId::Blue, UnitKind::Warrior, 1, 1)
            .unit(FactionId::Red, UnitKind::Warrior, 3, 1)
            .build(1);
        let map = render_map(&game.view(FactionId::Blue), &RenderConfig::default());
        assert_eq!(row(&map, 1)[1], 'W');
        assert_eq!(row(&map, 1)[3], 'w');

        let map = render_map(&game.view(FactionId::Red), &RenderConfig::default());
        assert_eq!(row(&map, 1)[1], 'w');
        assert_eq!(row(&map, 1)[3], 'W');
    }

    #[test]
    fn test_remembered_terrain_lower_case() {
        let view = skirmish_view();
        let mut cell = *view.cell(GridPos::new(1, 1)).unwrap();
        cell.visibility = Visibility::Explored;
        cell.unit = None;
        let symbol = cell_char(&view, &cell, GridPos::new(1, 1), &RenderConfig::default());
        assert_eq!(symbol, 'b');
    }

    #[test]
    fn test_highlight_marks_empty_cells_only() {
        let view = skirmish_view();
        let config = RenderConfig {
            use_color: false,
            highlight: [GridPos::new(0, 0), GridPos::new(1, 1)].into_iter().collect(),
        };
        let map = render_map(&view, &config);
        assert_eq!(row(&map, 0)[0], '*');
        assert_eq!(row(&map, 1)[1], 'B');
    }

    #[test]
    fn test_render_view_lists_units() {
        let text = render_view(&skirmish_view(), &RenderConfig::default());
        assert!(text.contains("Turn 1 - Blue Company to act"));
        assert!(text.contains("Gold: 125"));
        assert!(text.contains("0-2 Warrior at (1, 2)"));
        assert!(text.contains("  None"));
    }
}
