//! Shipped scenarios, recordings, and saved games through the library API.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tactics_cli::autoplay::{autoplay, AutoplayOptions};
use tactics_cli::prompt::Prompt;
use tactics_cli::scenario::{Scenario, ScenarioError};
use tactics_cli::session::{Session, SessionEnd};
use tactics_core::ai::{AiConfig, DecisionEngine};
use tactics_core::factions::FactionId;
use tactics_core::replay::{Replay, ReplayPlayer};
use tactics_core::snapshot::Snapshot;

fn shipped() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();
    files
}

#[test]
fn test_every_shipped_scenario_builds() {
    let files = shipped();
    assert!(files.len() >= 2);
    for path in files {
        let scenario = Scenario::load(&path).unwrap();
        let game = scenario.build(scenario.resolve_seed(None)).unwrap();
        assert!(!game.is_over(), "{} starts finished", path.display());
    }
}

#[test]
fn test_broken_scenario_is_rejected() {
    let mut scenario = Scenario::skirmish();
    scenario.map.layout[0].push('X');
    let err = scenario.build(0).unwrap_err();
    assert!(matches!(err, ScenarioError::Invalid(_)));
}

#[test]
fn test_recorded_autoplay_survives_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("river.replay");
    let scenario = Scenario::load(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/river_crossing.ron"),
    )
    .unwrap();
    let options = AutoplayOptions {
        seed: scenario.resolve_seed(None),
        max_turns: 25,
        record: true,
        ..AutoplayOptions::default()
    };

    let outcome = autoplay(&scenario, &options, |_, _| {}).unwrap();
    outcome.replay.unwrap().save(&path).unwrap();

    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded.seed, 7);
    assert_eq!(loaded.final_hash, outcome.game.state_hash());
    let mut player = ReplayPlayer::new(loaded).unwrap();
    assert!(player.verify().unwrap());
    assert_eq!(player.game().winner(), outcome.winner);
}

#[test]
fn test_prompt_session_save_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("match.snap");
    let script = format!("select 0-2\nmove 1 4\nsave {}\nquit\n", save.display());

    let scenario = Scenario::skirmish();
    let game = scenario.build(9).unwrap();
    let mut session = Session::new(game, DecisionEngine::default()).recording(Replay::new(
        "Skirmish",
        9,
        scenario.map.clone(),
        AiConfig::default(),
    ));
    let mut prompt = Prompt::new(Cursor::new(script.into_bytes()), Vec::new(), FactionId::Blue);
    assert_eq!(session.run(&mut prompt), SessionEnd::Quit);

    let output = String::from_utf8(prompt.into_output()).unwrap();
    assert!(output.contains("Saved to"));
    assert!(output.contains("0-2 moves"));

    let resumed = Snapshot::load(&save).unwrap().restore().unwrap();
    assert_eq!(resumed.state_hash(), session.game().state_hash());

    let replay = session.into_replay().unwrap();
    assert_eq!(replay.step_count(), 1);
    assert!(ReplayPlayer::new(replay).unwrap().verify().unwrap());
}
