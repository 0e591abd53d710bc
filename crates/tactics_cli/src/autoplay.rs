//! AI against AI, no prompt.

use tactics_core::ai::{AiConfig, DecisionEngine};
use tactics_core::error::Result as GameResult;
use tactics_core::events::GameEvent;
use tactics_core::factions::{Controller, FactionId};
use tactics_core::player_facade::{CommandSource, Intent};
use tactics_core::replay::Replay;
use tactics_core::Match;
use tracing::info;

use crate::error::Result;
use crate::scenario::Scenario;
use crate::session::{Session, SessionEnd};

/// Default round limit.
pub const DEFAULT_MAX_TURNS: u32 = 200;

/// How to run an autoplay match.
#[derive(Debug, Clone)]
pub struct AutoplayOptions {
    /// Seed for the match.
    pub seed: u64,
    /// Stop after this many rounds (both factions played).
    pub max_turns: u32,
    /// AI tuning for both sides.
    pub ai: AiConfig,
    /// Keep a replay of the run.
    pub record: bool,
}

impl Default for AutoplayOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            max_turns: DEFAULT_MAX_TURNS,
            ai: AiConfig::default(),
            record: false,
        }
    }
}

/// Result of an autoplay run.
#[derive(Debug)]
pub struct AutoplayOutcome {
    /// Final match state.
    pub game: Match,
    /// Winner, `None` when the turn limit hit first.
    pub winner: Option<FactionId>,
    /// Faction turns played.
    pub faction_turns: u64,
    /// Recording, when requested.
    pub replay: Option<Replay>,
}

/// Forwards every turn's events and never supplies intents.
struct EventSink<F> {
    on_events: F,
}

impl<F: FnMut(u32, &[GameEvent])> CommandSource for EventSink<F> {
    fn next_intent(&mut self, _game: &Match) -> Option<Intent> {
        None
    }

    fn observe(&mut self, game: &Match, outcome: &GameResult<Vec<GameEvent>>) {
        if let Ok(events) = outcome {
            (self.on_events)(game.turn(), events);
        }
    }
}

/// Play `scenario` with both factions under AI control.
///
/// `on_events` receives each faction turn's events together with the turn
/// counter after that turn.
pub fn autoplay<F>(
    scenario: &Scenario,
    options: &AutoplayOptions,
    on_events: F,
) -> Result<AutoplayOutcome>
where
    F: FnMut(u32, &[GameEvent]),
{
    let config = scenario
        .map
        .clone()
        .with_controllers(Controller::Ai, Controller::Ai);
    let game = Match::new(config.clone(), options.seed)?;
    info!(
        scenario = %scenario.name,
        seed = options.seed,
        max_turns = options.max_turns,
        "autoplay started"
    );

    let mut session = Session::new(game, DecisionEngine::new(options.ai))
        .with_turn_limit(u64::from(options.max_turns) * 2);
    if options.record {
        session = session.recording(Replay::new(
            scenario.name.clone(),
            options.seed,
            config,
            options.ai,
        ));
    }

    let end = session.run(&mut EventSink { on_events });
    let winner = match end {
        SessionEnd::Won(faction) => Some(faction),
        SessionEnd::Quit | SessionEnd::TurnLimit => None,
    };
    let faction_turns = session.faction_turns();
    let game = session.game().clone();
    let replay = session.into_replay();
    info!(?winner, faction_turns, "autoplay finished");

    Ok(AutoplayOutcome {
        game,
        winner,
        faction_turns,
        replay,
    })
}
