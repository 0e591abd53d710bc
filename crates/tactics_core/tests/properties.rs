//! Property tests over random intent streams, seeds, and layouts.

use std::collections::BTreeSet;

use proptest::prelude::*;
use tactics_core::ai::{AiConfig, DecisionEngine};
use tactics_core::factions::{Controller, FactionId};
use tactics_core::replay::{Replay, ReplayPlayer, ReplayStep};
use tactics_core::setup::MatchConfig;
use tactics_core::snapshot::Snapshot;
use tactics_core::Match;
use tactics_test_utils::determinism::{play_ai_turns, strategies::*};
use tactics_test_utils::fixtures::ai_skirmish;

fn hot_seat() -> MatchConfig {
    MatchConfig::skirmish().with_controllers(Controller::Human, Controller::Human)
}

fn check_invariants(game: &Match) -> Result<(), TestCaseError> {
    let mut occupied = BTreeSet::new();
    for unit in game.units() {
        prop_assert!(unit.hp() <= unit.max_hp(), "{} over max hp", unit.id());
        prop_assert_eq!(unit.is_alive(), unit.hp() > 0, "{} alive flag", unit.id());
        if !unit.is_alive() {
            if !unit.is_base() {
                prop_assert!(unit.position().is_none(), "dead {} on the map", unit.id());
            }
            continue;
        }
        let pos = unit.position();
        prop_assert!(pos.is_some(), "live {} off the map", unit.id());
        if let Some(pos) = pos {
            prop_assert!(occupied.insert(pos), "two live units on {}", pos);
            let terrain = game.terrain_at(pos);
            prop_assert!(terrain.is_some(), "{} out of bounds", unit.id());
        }
    }
    prop_assert_eq!(game.is_over(), game.check_winner().is_some());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn rejected_intents_change_nothing(
        seed in arb_seed(),
        intents in arb_intent_sequence(12, 10, 80),
    ) {
        let mut game = Match::new(hot_seat(), seed).unwrap();
        for intent in intents {
            let before = game.state_hash();
            let gold: Vec<u32> = FactionId::ALL.iter().map(|&f| game.faction(f).gold()).collect();
            if game.apply(intent).is_err() {
                prop_assert_eq!(game.state_hash(), before, "{:?} mutated state", intent);
                let after: Vec<u32> =
                    FactionId::ALL.iter().map(|&f| game.faction(f).gold()).collect();
                prop_assert_eq!(after, gold);
            }
            check_invariants(&game)?;
        }
    }

    #[test]
    fn accepted_intents_replay_to_same_state(
        seed in arb_seed(),
        intents in arb_intent_sequence(12, 10, 80),
    ) {
        let config = hot_seat();
        let mut game = Match::new(config.clone(), seed).unwrap();
        let mut replay = Replay::new("hot seat", seed, config, AiConfig::default());
        for intent in intents {
            if game.apply(intent).is_ok() {
                replay.record(ReplayStep::Intent(intent));
            }
        }
        replay.finalize(&game);

        let mut player = ReplayPlayer::new(replay).unwrap();
        prop_assert!(player.verify().unwrap());
        prop_assert_eq!(player.game().turn(), game.turn());
    }

    #[test]
    fn snapshot_midway_continues_identically(
        seed in arb_seed(),
        first in arb_intent_sequence(12, 10, 40),
        second in arb_intent_sequence(12, 10, 40),
    ) {
        let mut game = Match::new(hot_seat(), seed).unwrap();
        for intent in first {
            let _ = game.apply(intent);
        }
        let bytes = Snapshot::capture(&game).unwrap().encode().unwrap();
        let mut restored = Snapshot::decode(&bytes).unwrap().restore().unwrap();
        prop_assert_eq!(restored.state_hash(), game.state_hash());

        for intent in second {
            let a = game.apply(intent).map_err(|err| err.code());
            let b = restored.apply(intent).map_err(|err| err.code());
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(restored.state_hash(), game.state_hash());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn ai_matches_keep_invariants(seed in arb_seed()) {
        let engine = DecisionEngine::default();
        let mut game = Match::new(ai_skirmish(), seed).unwrap();
        for _ in 0..40 {
            if game.is_over() {
                break;
            }
            let active = game.active();
            engine.take_turn(&mut game);
            check_invariants(&game)?;
            prop_assert!(game.is_over() || game.active() != active);
        }
    }

    #[test]
    fn random_layouts_build_and_play(layout in arb_layout(12, 10), seed in arb_seed()) {
        let mut config = ai_skirmish();
        config.layout = layout;
        let mut game = Match::new(config, seed).unwrap();
        play_ai_turns(&mut game, &DecisionEngine::default(), 10);
        check_invariants(&game)?;
    }
}
