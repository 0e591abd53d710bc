//! Parser for the interactive prompt.
//!
//! Commands are whitespace-separated words, case-insensitive.

use std::path::PathBuf;

use tactics_core::abilities::AbilityTarget;
use tactics_core::math::GridPos;
use tactics_core::unit::UnitId;
use tactics_core::unit_kind::{UnitKind, UnknownUnitKind};
use thiserror::Error;

/// Help text shown by `help`.
pub const HELP: &str = "\
Commands:
  select <id>          Choose a unit to command (e.g. select 0-2)
  build <kind>         Build a unit next to your base (e.g. build warrior)
  end                  End your turn
  save <file>          Save the match
  help                 Show this help
  quit                 Leave the game
With a unit selected:
  move <x> <y>         Move along the cheapest path
  attack <id>          Attack a visible enemy in range
  ability              Use a self-targeted ability
  ability <id>         Use a unit-targeted ability (Heal, Shield Bash)
  ability <x> <y>      Use a cell-targeted ability (Fireball)
  info                 Show the selected unit's stats
  wait                 Spend the unit's remaining actions
  cancel               Deselect
Without a selection, `wait` ends the turn.";

/// A parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptCommand {
    /// Select a unit.
    Select(UnitId),
    /// Build a unit.
    Build(UnitKind),
    /// End the turn.
    EndTurn,
    /// Save a snapshot.
    Save(PathBuf),
    /// Print help.
    Help,
    /// Leave.
    Quit,
    /// Move the selected unit.
    Move(GridPos),
    /// Attack with the selected unit.
    Attack(UnitId),
    /// Use the selected unit's ability.
    Ability(AbilityTarget),
    /// Show the selected unit.
    Info,
    /// Selected unit waits, or end the turn without a selection.
    Wait,
    /// Drop the selection.
    Cancel,
}

/// Why a prompt line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing was typed.
    #[error("empty command")]
    Empty,
    /// First word is not a command.
    #[error("unknown command '{0}', type 'help' for options")]
    Unknown(String),
    /// Right command, wrong arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// A unit id did not parse.
    #[error("{0}")]
    UnitId(String),
    /// A unit kind did not parse.
    #[error(transparent)]
    Kind(#[from] UnknownUnitKind),
}

fn parse_id(word: &str) -> Result<UnitId, ParseError> {
    word.parse().map_err(ParseError::UnitId)
}

fn parse_cell(x: &str, y: &str, usage: &'static str) -> Result<GridPos, ParseError> {
    match (x.parse(), y.parse()) {
        (Ok(x), Ok(y)) => Ok(GridPos::new(x, y)),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// Parse one prompt line.
pub fn parse(line: &str) -> Result<PromptCommand, ParseError> {
    let lowered = line.trim().to_ascii_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Err(ParseError::Empty);
    };

    match (head, args) {
        ("select", [id]) => Ok(PromptCommand::Select(parse_id(id)?)),
        ("select", _) => Err(ParseError::Usage("select <id>")),
        ("build", [kind]) => Ok(PromptCommand::Build(kind.parse()?)),
        ("build", _) => Err(ParseError::Usage("build <kind>")),
        ("end", []) => Ok(PromptCommand::EndTurn),
        ("save", [_]) => {
            // Keep the path's original case.
            let path = line.trim().split_whitespace().nth(1).unwrap_or_default();
            Ok(PromptCommand::Save(PathBuf::from(path)))
        }
        ("save", _) => Err(ParseError::Usage("save <file>")),
        ("help" | "?", _) => Ok(PromptCommand::Help),
        ("quit" | "exit", _) => Ok(PromptCommand::Quit),
        ("move", [x, y]) => Ok(PromptCommand::Move(parse_cell(x, y, "move <x> <y>")?)),
        ("move", _) => Err(ParseError::Usage("move <x> <y>")),
        ("attack", [id]) => Ok(PromptCommand::Attack(parse_id(id)?)),
        ("attack", _) => Err(ParseError::Usage("attack <id>")),
        ("ability", []) => Ok(PromptCommand::Ability(AbilityTarget::NoTarget)),
        ("ability", [id]) => Ok(PromptCommand::Ability(AbilityTarget::Unit(parse_id(id)?))),
        ("ability", [x, y]) => Ok(PromptCommand::Ability(AbilityTarget::Cell(parse_cell(
            x,
            y,
            "ability [<id> | <x> <y>]",
        )?))),
        ("ability", _) => Err(ParseError::Usage("ability [<id> | <x> <y>]")),
        ("info", []) => Ok(PromptCommand::Info),
        ("wait", []) => Ok(PromptCommand::Wait),
        ("cancel", []) => Ok(PromptCommand::Cancel),
        _ => Err(ParseError::Unknown(head.to_string())),
    }
}
