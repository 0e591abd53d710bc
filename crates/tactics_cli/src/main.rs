//! Terminal tactics game.
//!
//! # Usage
//!
//! ```bash
//! # Human (Blue) against the AI on the built-in skirmish
//! cargo run -p tactics_cli -- play
//!
//! # Resume a saved match
//! cargo run -p tactics_cli -- play --load match.snap
//!
//! # AI against AI, JSON lines on stdout
//! cargo run -p tactics_cli -- autoplay --seed 42 --json
//!
//! # Check a scenario file
//! cargo run -p tactics_cli -- validate crates/tactics_cli/scenarios/skirmish.ron
//!
//! # Verify a recording
//! cargo run -p tactics_cli -- replay match.replay --verify
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tactics_cli::autoplay::{autoplay, AutoplayOptions, DEFAULT_MAX_TURNS};
use tactics_cli::error::{CliError, Result};
use tactics_cli::prompt::Prompt;
use tactics_cli::protocol::{hex_hash, Response};
use tactics_cli::scenario::Scenario;
use tactics_cli::session::{Session, SessionEnd};
use tactics_core::ai::{AiConfig, DecisionEngine};
use tactics_core::factions::{Controller, FactionId};
use tactics_core::replay::{Replay, ReplayPlayer};
use tactics_core::snapshot::Snapshot;
use tactics_core::Match;

#[derive(Parser)]
#[command(name = "tactics")]
#[command(about = "Turn-based grid tactics in the terminal")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the AI at a text prompt
    Play {
        /// Scenario file to load (default: built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Random seed (default: the scenario's, else 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Resume from a saved snapshot instead of a scenario
        #[arg(long, conflicts_with_all = ["scenario", "seed", "record"])]
        load: Option<PathBuf>,

        /// Write a replay of the session to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Dim remembered terrain with ANSI colors
        #[arg(long)]
        color: bool,
    },

    /// Let the AI play both sides
    Autoplay {
        /// Scenario file to load (default: built-in skirmish)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Random seed (default: the scenario's, else 0)
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many rounds
        #[arg(long, default_value_t = DEFAULT_MAX_TURNS)]
        max_turns: u32,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,

        /// Write a replay to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Check that a scenario file builds a match
    Validate {
        /// Scenario file
        file: PathBuf,
    },

    /// Play back a recorded match
    Replay {
        /// Replay file
        file: PathBuf,

        /// Fail unless the final state hash matches the recording
        #[arg(long)]
        verify: bool,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the prompt and JSON output.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let command = cli.command.unwrap_or(Commands::Play {
        scenario: None,
        seed: None,
        load: None,
        record: None,
        color: false,
    });

    let json = matches!(
        command,
        Commands::Autoplay { json: true, .. } | Commands::Replay { json: true, .. }
    );

    let result = match command {
        Commands::Play {
            scenario,
            seed,
            load,
            record,
            color,
        } => cmd_play(scenario.as_deref(), seed, load.as_deref(), record.as_deref(), color),
        Commands::Autoplay {
            scenario,
            seed,
            max_turns,
            json,
            record,
        } => cmd_autoplay(scenario.as_deref(), seed, max_turns, json, record.as_deref()),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Replay { file, verify, json } => cmd_replay(&file, verify, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            if json {
                print!("{}", Response::error(err.to_string(), err.code()).to_json_line());
            } else {
                eprintln!("Error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Interactive match against the AI.
fn cmd_play(
    scenario_path: Option<&Path>,
    seed: Option<u64>,
    load: Option<&Path>,
    record: Option<&Path>,
    color: bool,
) -> Result<()> {
    let (game, replay) = if let Some(path) = load {
        tracing::info!(path = %path.display(), "resuming snapshot");
        (Snapshot::load(path)?.restore()?, None)
    } else {
        let scenario = Scenario::load_or_default(scenario_path)?;
        let seed = scenario.resolve_seed(seed);
        let game = scenario.build(seed)?;
        println!("{} (seed {seed})", scenario.name);
        if !scenario.description.is_empty() {
            println!("{}", scenario.description);
        }
        println!("Type 'help' for commands.\n");
        let replay = record.map(|_| {
            Replay::new(
                scenario.name.clone(),
                seed,
                scenario.map.clone(),
                AiConfig::default(),
            )
        });
        (game, replay)
    };

    let home = human_faction(&game);
    let mut session = Session::new(game, DecisionEngine::default());
    if let Some(replay) = replay {
        session = session.recording(replay);
    }

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock(), io::stdout(), home).with_color(color);
    match session.run(&mut prompt) {
        SessionEnd::Won(winner) => {
            println!("\n{} wins on turn {}!", winner.display_name(), session.game().turn());
        }
        SessionEnd::Quit => println!("\nGoodbye."),
        SessionEnd::TurnLimit => {}
    }
    io::stdout().flush()?;

    if let (Some(path), Some(replay)) = (record, session.into_replay()) {
        replay.save(path)?;
        println!("Replay written to {}", path.display());
    }
    Ok(())
}

/// First human-controlled faction, Blue if there is none.
fn human_faction(game: &Match) -> FactionId {
    FactionId::ALL
        .into_iter()
        .find(|&id| game.faction(id).controller() == Controller::Human)
        .unwrap_or(FactionId::Blue)
}

/// AI against AI.
fn cmd_autoplay(
    scenario_path: Option<&Path>,
    seed: Option<u64>,
    max_turns: u32,
    json: bool,
    record: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::load_or_default(scenario_path)?;
    let options = AutoplayOptions {
        seed: scenario.resolve_seed(seed),
        max_turns,
        ai: AiConfig::default(),
        record: record.is_some(),
    };

    let mut stdout = io::stdout().lock();
    let outcome = autoplay(&scenario, &options, |turn, events| {
        for event in events {
            // A closed pipe only loses the play-by-play; the summary still fails loudly.
            let _ = if json {
                write!(
                    stdout,
                    "{}",
                    Response::Event {
                        turn,
                        event: event.clone(),
                    }
                    .to_json_line()
                )
            } else {
                writeln!(stdout, "[turn {turn}] {event}")
            };
        }
    })?;

    let summary = Response::game_over(
        &scenario.name,
        options.seed,
        &outcome.game,
        outcome.faction_turns,
    );
    if json {
        write!(stdout, "{}", summary.to_json_line())?;
    } else {
        match outcome.winner {
            Some(winner) => writeln!(
                stdout,
                "\n{} wins on turn {} after {} faction turns.",
                winner.display_name(),
                outcome.game.turn(),
                outcome.faction_turns
            )?,
            None => writeln!(
                stdout,
                "\nNo winner after {max_turns} rounds ({} faction turns).",
                outcome.faction_turns
            )?,
        }
        writeln!(stdout, "State hash: {}", hex_hash(outcome.game.state_hash()))?;
    }
    stdout.flush()?;

    if let (Some(path), Some(replay)) = (record, outcome.replay) {
        replay.save(path)?;
        tracing::info!(path = %path.display(), steps = replay.step_count(), "replay written");
    }
    Ok(())
}

/// Load a scenario and build its match.
fn cmd_validate(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let seed = scenario.resolve_seed(None);
    let game = scenario.build(seed)?;
    println!(
        "OK: {} ({}x{}, {} units)",
        scenario.name,
        game.grid().width(),
        game.grid().height(),
        game.units().count()
    );
    Ok(())
}

/// Play back a replay file.
fn cmd_replay(path: &Path, verify: bool, json: bool) -> Result<()> {
    let replay = Replay::load(path)?;
    tracing::info!(
        scenario = %replay.scenario_id,
        seed = replay.seed,
        steps = replay.step_count(),
        "replay loaded"
    );
    if !json {
        println!("Replay: {} (seed {})", replay.scenario_id, replay.seed);
        println!("  Steps: {}", replay.step_count());
        println!("  Recorded turn: {}", replay.final_turn);
    }

    let mut player = ReplayPlayer::new(replay)?;
    let mut stdout = io::stdout().lock();
    while let Some(outcome) = player.advance() {
        let events = outcome?;
        if json {
            let turn = player.game().turn();
            for event in events {
                write!(stdout, "{}", Response::Event { turn, event }.to_json_line())?;
            }
        }
    }

    let expected = player.replay().final_hash;
    let actual = player.game().state_hash();
    let matches = expected == actual;
    if json {
        let checked = Response::ReplayChecked {
            scenario: player.replay().scenario_id.clone(),
            steps: player.position(),
            matches,
            state_hash: hex_hash(actual),
        };
        write!(stdout, "{}", checked.to_json_line())?;
    } else {
        if let Some(winner) = player.game().winner() {
            writeln!(stdout, "  Winner: {}", winner.display_name())?;
        }
        writeln!(stdout, "  Expected hash: {}", hex_hash(expected))?;
        writeln!(stdout, "  Actual hash:   {}", hex_hash(actual))?;
    }
    stdout.flush()?;

    if verify && !matches {
        return Err(CliError::ReplayDiverged {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    if verify && !json {
        println!("PASS: replay reproduces the recorded state");
    }
    Ok(())
}
