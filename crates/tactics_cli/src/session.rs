//! Turn loop shared by interactive play and autoplay.
//!
//! The active faction's controller decides who supplies the next intent:
//! human factions read from a [`CommandSource`], AI factions are played a
//! whole turn at a time by the [`DecisionEngine`]. Accepted steps are
//! recorded into a [`Replay`] when one is attached.

use tactics_core::ai::DecisionEngine;
use tactics_core::factions::{Controller, FactionId};
use tactics_core::player_facade::CommandSource;
use tactics_core::replay::{Replay, ReplayStep};
use tactics_core::Match;
use tracing::{debug, info};

/// How a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A base fell.
    Won(FactionId),
    /// The command source gave up.
    Quit,
    /// The faction-turn limit was reached.
    TurnLimit,
}

/// A match plus everything needed to drive it.
#[derive(Debug)]
pub struct Session {
    game: Match,
    engine: DecisionEngine,
    replay: Option<Replay>,
    faction_turns: u64,
    max_faction_turns: Option<u64>,
}

impl Session {
    /// Drive `game` with `engine` for AI factions.
    #[must_use]
    pub fn new(game: Match, engine: DecisionEngine) -> Self {
        Self {
            game,
            engine,
            replay: None,
            faction_turns: 0,
            max_faction_turns: None,
        }
    }

    /// Record every accepted step into `replay`.
    #[must_use]
    pub fn recording(mut self, replay: Replay) -> Self {
        self.replay = Some(replay);
        self
    }

    /// Stop after this many faction turns.
    #[must_use]
    pub fn with_turn_limit(mut self, max_faction_turns: u64) -> Self {
        self.max_faction_turns = Some(max_faction_turns);
        self
    }

    /// The match.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// Faction turns completed so far.
    #[must_use]
    pub const fn faction_turns(&self) -> u64 {
        self.faction_turns
    }

    /// Finish and return the recording, if any.
    #[must_use]
    pub fn into_replay(self) -> Option<Replay> {
        let game = self.game;
        self.replay.map(|mut replay| {
            replay.finalize(&game);
            replay
        })
    }

    fn record(&mut self, step: ReplayStep) {
        if let Some(replay) = self.replay.as_mut() {
            replay.record(step);
        }
    }

    /// Play until a base falls, the source quits, or the turn limit hits.
    pub fn run<S: CommandSource>(&mut self, source: &mut S) -> SessionEnd {
        loop {
            if let Some(winner) = self.game.winner() {
                info!(winner = winner.display_name(), turn = self.game.turn(), "match over");
                return SessionEnd::Won(winner);
            }
            if self
                .max_faction_turns
                .is_some_and(|limit| self.faction_turns >= limit)
            {
                info!(turns = self.faction_turns, "turn limit reached");
                return SessionEnd::TurnLimit;
            }

            let active = self.game.active();
            match self.game.faction(active).controller() {
                Controller::Ai => {
                    let events = self.engine.take_turn(&mut self.game);
                    self.record(ReplayStep::AiTurn);
                    self.faction_turns += 1;
                    source.observe(&self.game, &Ok(events));
                }
                Controller::Human => {
                    let Some(intent) = source.next_intent(&self.game) else {
                        debug!("command source quit");
                        return SessionEnd::Quit;
                    };
                    let outcome = self.game.apply(intent);
                    if outcome.is_ok() {
                        self.record(ReplayStep::Intent(intent));
                        if self.game.active() != active || self.game.is_over() {
                            self.faction_turns += 1;
                        }
                    }
                    source.observe(&self.game, &outcome);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactics_core::ai::AiConfig;
    use tactics_core::math::GridPos;
    use tactics_core::player_facade::{Intent, ScriptedCommands};
    use tactics_core::replay::ReplayPlayer;
    use tactics_core::setup::MatchConfig;
    use tactics_core::unit::UnitId;

    #[test]
    fn test_scripted_human_against_ai() {
        let config = MatchConfig::skirmish();
        let game = Match::new(config.clone(), 21).unwrap();
        let mut session = Session::new(game, DecisionEngine::default())
            .recording(Replay::new("skirmish", 21, config, AiConfig::default()));
        let mut source = ScriptedCommands::new([
            Intent::Move {
                unit: UnitId::new(FactionId::Blue, 2),
                to: GridPos::new(1, 4),
            },
            // Rejected: not Blue's unit. Not recorded.
            Intent::Wait(UnitId::new(FactionId::Red, 2)),
            Intent::EndTurn,
        ]);

        assert_eq!(session.run(&mut source), SessionEnd::Quit);
        assert_eq!(session.faction_turns(), 2);
        assert_eq!(session.game().turn(), 2);

        let hash = session.game().state_hash();
        let replay = session.into_replay().unwrap();
        assert_eq!(replay.steps.len(), 3);
        assert_eq!(replay.final_hash, hash);
        assert!(ReplayPlayer::new(replay).unwrap().verify().unwrap());
    }

    #[test]
    fn test_turn_limit_for_ai_match() {
        let config = MatchConfig::skirmish().with_controllers(Controller::Ai, Controller::Ai);
        let game = Match::new(config, 3).unwrap();
        let mut session = Session::new(game, DecisionEngine::default()).with_turn_limit(6);
        let end = session.run(&mut ScriptedCommands::default());
        if end == SessionEnd::TurnLimit {
            assert_eq!(session.faction_turns(), 6);
            assert_eq!(session.game().turn(), 4);
        } else {
            assert!(matches!(end, SessionEnd::Won(_)));
        }
    }
}
