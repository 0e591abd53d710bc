//! Text prompt as a [`CommandSource`].
//!
//! Reads lines, handles the commands that do not touch the match (selection,
//! help, info, save) itself, and hands everything else to the engine as an
//! [`Intent`].

use std::io::{BufRead, Write};

use tactics_core::error::Result as GameResult;
use tactics_core::events::GameEvent;
use tactics_core::factions::FactionId;
use tactics_core::player_facade::{event_for_viewer, CommandSource, Intent, UnitSnapshot};
use tactics_core::snapshot::Snapshot;
use tactics_core::unit::UnitId;
use tactics_core::Match;
use tracing::{debug, warn};

use crate::command::{parse, PromptCommand, HELP};
use crate::render::{render_view, unit_details, RenderConfig};

/// What to do after interpreting one line.
enum Step {
    Intent(Intent),
    Continue,
    Quit,
}

/// Interactive prompt over any reader and writer.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    out: W,
    /// Faction whose fog filters events of turns nobody here played.
    home: FactionId,
    /// Faction that issued the intent awaiting `observe`.
    acting: Option<FactionId>,
    selected: Option<UnitId>,
    use_color: bool,
    redraw: bool,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Create a prompt for a human playing `home`.
    pub fn new(input: R, out: W, home: FactionId) -> Self {
        Self {
            input,
            out,
            home,
            acting: None,
            selected: None,
            use_color: false,
            redraw: true,
        }
    }

    /// Dim remembered terrain with ANSI escapes.
    #[must_use]
    pub fn with_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    /// Currently selected unit.
    #[must_use]
    pub const fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    /// Give back the writer, e.g. to inspect captured output.
    pub fn into_output(self) -> W {
        self.out
    }

    fn say(&mut self, text: impl std::fmt::Display) {
        // A closed terminal surfaces as EOF on the next read.
        let _ = writeln!(self.out, "{text}");
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(err) => {
                warn!(%err, "failed to read prompt input");
                None
            }
        }
    }

    fn draw(&mut self, game: &Match) {
        let viewer = game.active();
        let mut config = RenderConfig {
            use_color: self.use_color,
            ..RenderConfig::default()
        };
        if let Some(id) = self.selected {
            if let Ok(cells) = game.query_reachable(id) {
                config.highlight = cells;
            }
        }
        let text = render_view(&game.view(viewer), &config);
        self.say(text);
    }

    fn select(&mut self, game: &Match, id: UnitId) {
        let Some(unit) = game.unit(id) else {
            self.say(format!("No unit {id}."));
            return;
        };
        if unit.faction() != game.active() || !unit.is_alive() || unit.is_base() {
            self.say(format!("{id} is not one of your units."));
        } else if !unit.can_act() {
            self.say(format!("{id} has no actions left."));
        } else {
            self.selected = Some(id);
            self.redraw = true;
        }
    }

    fn info(&mut self, game: &Match, id: UnitId) {
        let Some(snapshot) = game.unit(id).and_then(UnitSnapshot::of) else {
            return;
        };
        let mut text = unit_details(&snapshot);
        if let Ok(targets) = game.query_targets(id) {
            if !targets.is_empty() {
                let list: Vec<String> = targets.iter().map(ToString::to_string).collect();
                text.push_str(&format!("\n  Targets in range: {}", list.join(", ")));
            }
        }
        self.say(text);
    }

    fn interpret(&mut self, game: &Match, command: PromptCommand) -> Step {
        let me = game.active();
        match command {
            PromptCommand::Select(id) => self.select(game, id),
            PromptCommand::Build(kind) => return Step::Intent(Intent::Build(kind)),
            PromptCommand::EndTurn => return Step::Intent(Intent::EndTurn),
            PromptCommand::Save(path) => {
                match Snapshot::capture(game).and_then(|snapshot| snapshot.save(&path)) {
                    Ok(()) => self.say(format!("Saved to {}.", path.display())),
                    Err(err) => self.say(format!("Save failed: {err}")),
                }
            }
            PromptCommand::Help => self.say(HELP),
            PromptCommand::Quit => return Step::Quit,
            PromptCommand::Cancel => {
                self.selected = None;
                self.redraw = true;
            }
            PromptCommand::Wait => {
                return Step::Intent(match self.selected {
                    Some(unit) => Intent::Wait(unit),
                    None => Intent::EndTurn,
                });
            }
            PromptCommand::Move(_)
            | PromptCommand::Attack(_)
            | PromptCommand::Ability(_)
            | PromptCommand::Info => {
                let Some(unit) = self.selected.filter(|id| id.faction == me) else {
                    self.say("Select a unit first.");
                    return Step::Continue;
                };
                match command {
                    PromptCommand::Move(to) => return Step::Intent(Intent::Move { unit, to }),
                    PromptCommand::Attack(target) => {
                        return Step::Intent(Intent::Attack { unit, target })
                    }
                    PromptCommand::Ability(target) => {
                        return Step::Intent(Intent::Ability { unit, target })
                    }
                    _ => self.info(game, unit),
                }
            }
        }
        Step::Continue
    }
}

impl<R: BufRead, W: Write> CommandSource for Prompt<R, W> {
    fn next_intent(&mut self, game: &Match) -> Option<Intent> {
        loop {
            if self.redraw {
                self.draw(game);
                self.redraw = false;
            }
            let label = match self.selected.and_then(|id| game.unit(id)) {
                Some(unit) => format!("[{} {}] > ", unit.id(), unit.kind()),
                None => format!("{} > ", game.active().display_name()),
            };
            let _ = write!(self.out, "{label}");
            let _ = self.out.flush();

            let line = self.read_line()?;
            let command = match parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    self.say(err);
                    continue;
                }
            };
            debug!(?command, "prompt command");
            match self.interpret(game, command) {
                Step::Intent(intent) => {
                    self.acting = Some(game.active());
                    return Some(intent);
                }
                Step::Continue => {}
                Step::Quit => return None,
            }
        }
    }

    fn observe(&mut self, game: &Match, outcome: &GameResult<Vec<GameEvent>>) {
        let viewer = self.acting.take().unwrap_or(self.home);
        match outcome {
            Ok(events) => {
                let lines: Vec<String> = events
                    .iter()
                    .filter_map(|event| event_for_viewer(game, viewer, event))
                    .map(|event| format!("  {event}"))
                    .collect();
                for line in lines {
                    self.say(line);
                }
                let still_usable = self
                    .selected
                    .and_then(|id| game.unit(id))
                    .is_some_and(|unit| unit.faction() == game.active() && unit.can_act());
                if !still_usable {
                    self.selected = None;
                }
                self.redraw = true;
            }
            Err(err) => self.say(format!("Rejected ({}): {err}", err.code())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tactics_core::factions::Controller;
    use tactics_core::math::GridPos;
    use tactics_core::setup::MatchConfig;

    fn prompt(script: &str) -> Prompt<Cursor<Vec<u8>>, Vec<u8>> {
        Prompt::new(Cursor::new(script.as_bytes().to_vec()), Vec::new(), FactionId::Blue)
    }

    fn output(prompt: Prompt<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompt.into_output()).unwrap()
    }

    fn skirmish() -> Match {
        Match::new(MatchConfig::skirmish(), 4).unwrap()
    }

    #[test]
    fn test_select_then_move_yields_intent() {
        let game = skirmish();
        let mut prompt = prompt("select 0-2\nmove 1 4\n");
        let intent = prompt.next_intent(&game);
        assert_eq!(
            intent,
            Some(Intent::Move {
                unit: UnitId::new(FactionId::Blue, 2),
                to: GridPos::new(1, 4),
            })
        );
        assert_eq!(prompt.selected(), Some(UnitId::new(FactionId::Blue, 2)));
    }

    #[test]
    fn test_meta_commands_do_not_yield() {
        let game = skirmish();
        let mut prompt = prompt("help\nselect 1-2\nselect 0-1\nattack 1-2\nfly\n");
        assert_eq!(prompt.next_intent(&game), None);
        let text = output(prompt);
        assert!(text.contains("select <id>"));
        assert!(text.contains("1-2 is not one of your units."));
        assert!(text.contains("0-1 is not one of your units."));
        assert!(text.contains("Select a unit first."));
        assert!(text.contains("unknown command 'fly'"));
    }

    #[test]
    fn test_wait_without_selection_ends_turn() {
        let game = skirmish();
        let mut prompt = prompt("wait\n");
        assert_eq!(prompt.next_intent(&game), Some(Intent::EndTurn));
    }

    #[test]
    fn test_observe_reports_rejection_and_clears_spent_selection() {
        let mut game = skirmish();
        let mut prompt = prompt("select 0-2\nwait\n");
        let intent = prompt.next_intent(&game).unwrap();
        let outcome = game.apply(intent);
        prompt.observe(&game, &outcome);
        assert_eq!(prompt.selected(), None);

        let rejected = game.apply(Intent::Build(tactics_core::unit_kind::UnitKind::Base));
        prompt.observe(&game, &rejected);
        let text = output(prompt);
        assert!(text.contains("0-2 waits"));
        assert!(text.contains("Rejected (action_unavailable)"));
    }

    #[test]
    fn test_save_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.snap");
        let game = Match::new(
            MatchConfig::skirmish().with_controllers(Controller::Human, Controller::Human),
            4,
        )
        .unwrap();
        let mut prompt = prompt(&format!("save {}\nquit\n", path.display()));
        assert_eq!(prompt.next_intent(&game), None);
        let restored = Snapshot::load(&path).unwrap().restore().unwrap();
        assert_eq!(restored.state_hash(), game.state_hash());
    }
}
