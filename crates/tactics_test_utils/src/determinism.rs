//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and snapshots only work if a match is 100% deterministic.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`] wherever fractions appear.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Anything iterated while mutating state uses ordered collections or
//!   sorted unit ids.
//!
//! - **System randomness**: Every roll comes from the match's seeded
//!   `ChaCha8Rng`, which is part of the saved state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (damage, upkeep, abilities)
//! 2. **Property tests**: Random intent streams still replay identically
//! 3. **Integration tests**: Whole AI-vs-AI matches are reproducible
//! 4. **Parallel tests**: Running N matches on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use tactics_core::ai::DecisionEngine;
use tactics_core::setup::MatchConfig;
use tactics_core::Match;
use tracing::{debug, warn};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps taken per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use tactics_core::ai::DecisionEngine;
/// use tactics_core::Match;
/// use tactics_test_utils::determinism::verify_determinism;
/// use tactics_test_utils::fixtures::ai_skirmish;
///
/// let engine = DecisionEngine::default();
/// let result = verify_determinism(
///     3,
///     10,
///     || Match::new(ai_skirmish(), 42).unwrap(),
///     |game| {
///         engine.take_turn(game);
///     },
///     Match::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play AI turns until the match ends or `max_turns` faction turns have
/// been taken. Returns the number of faction turns played.
pub fn play_ai_turns(game: &mut Match, engine: &DecisionEngine, max_turns: u64) -> u64 {
    let mut played = 0;
    while !game.is_over() && played < max_turns {
        engine.take_turn(game);
        played += 1;
    }
    debug!(played, turn = game.turn(), over = game.is_over(), "ai turns played");
    played
}

/// Build a match from `config` and `seed` twice, play both with the default
/// decision engine, and verify the final hashes match.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn verify_match_determinism(config: &MatchConfig, seed: u64, max_turns: u64) -> bool {
    let engine = DecisionEngine::default();
    let result = verify_determinism(
        2,
        max_turns,
        || match Match::new(config.clone(), seed) {
            Ok(game) => game,
            Err(err) => panic!("invalid match config: {err}"),
        },
        |game| {
            if !game.is_over() {
                engine.take_turn(game);
            }
        },
        Match::state_hash,
    );
    result.is_deterministic
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelMatchResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Faction turns each match was allowed.
    pub max_turns: u64,
    /// Number of matches run.
    pub num_matches: usize,
}

impl ParallelMatchResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel matches diverged!\n\
                 Matches: {}\n\
                 Max turns: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_matches,
                self.max_turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N AI-vs-AI matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_matches<F>(setup_fn: F, num_matches: usize, max_turns: u64) -> ParallelMatchResult
where
    F: Fn() -> Match + Sync,
{
    let engine = DecisionEngine::default();
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    play_ai_turns(&mut game, &engine, max_turns);
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(hash) => hash,
                Err(_) => panic!("match thread panicked"),
            })
            .collect()
    });

    ParallelMatchResult {
        hashes,
        max_turns,
        num_matches,
    }
}

/// Compare two AI-vs-AI runs turn by turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(turn)` for the first faction
/// turn after which their hashes differ (0 means the initial states differ).
pub fn find_first_divergence<F>(setup_fn: F, max_turns: u64) -> Option<u64>
where
    F: Fn() -> Match,
{
    let engine = DecisionEngine::default();
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for turn in 1..=max_turns {
        if first.is_over() && second.is_over() {
            break;
        }
        engine.take_turn(&mut first);
        engine.take_turn(&mut second);

        if first.state_hash() != second.state_hash() {
            warn!(turn, "matches diverged");
            return Some(turn);
        }
    }

    None
}

/// Verify that a serialization round-trip mid-match preserves state and
/// the rest of the match plays out identically.
pub fn verify_serialization_determinism<F>(setup_fn: F, turns_before: u64, turns_after: u64) -> bool
where
    F: Fn() -> Match,
{
    let engine = DecisionEngine::default();
    let mut game = setup_fn();
    play_ai_turns(&mut game, &engine, turns_before);

    let Ok(bytes) = game.serialize() else {
        return false;
    };
    let Ok(mut restored) = Match::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != game.state_hash() {
        return false;
    }

    play_ai_turns(&mut game, &engine, turns_after);
    play_ai_turns(&mut restored, &engine, turns_after);
    restored.state_hash() == game.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the engine.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::abilities::AbilityTarget;
    use tactics_core::factions::FactionId;
    use tactics_core::math::GridPos;
    use tactics_core::player_facade::Intent;
    use tactics_core::terrain::TerrainKind;
    use tactics_core::unit::UnitId;
    use tactics_core::unit_kind::UnitKind;

    /// Any match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// A cell inside a `width` x `height` grid.
    pub fn arb_grid_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
        (0..width as i32, 0..height as i32).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// A cell that may fall a little outside a `width` x `height` grid.
    pub fn arb_loose_pos(width: u32, height: u32) -> impl Strategy<Value = GridPos> {
        (-2..width as i32 + 2, -2..height as i32 + 2).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// Any kind that can be built.
    pub fn arb_buildable_kind() -> impl Strategy<Value = UnitKind> {
        prop::sample::select(
            UnitKind::ALL
                .iter()
                .copied()
                .filter(|kind| !kind.is_base())
                .collect::<Vec<_>>(),
        )
    }

    /// Any terrain kind.
    pub fn arb_terrain() -> impl Strategy<Value = TerrainKind> {
        prop::sample::select(TerrainKind::ALL.to_vec())
    }

    /// A unit id with a small sequence number, either faction.
    pub fn arb_unit_id() -> impl Strategy<Value = UnitId> {
        (prop::sample::select(FactionId::ALL.to_vec()), 1u32..8)
            .prop_map(|(faction, seq)| UnitId::new(faction, seq))
    }

    /// An ability target near a `width` x `height` grid.
    pub fn arb_ability_target(width: u32, height: u32) -> impl Strategy<Value = AbilityTarget> {
        prop_oneof![
            Just(AbilityTarget::NoTarget),
            arb_loose_pos(width, height).prop_map(AbilityTarget::Cell),
            arb_unit_id().prop_map(AbilityTarget::Unit),
        ]
    }

    /// Any intent on a `width` x `height` grid, legal or not.
    pub fn arb_intent(width: u32, height: u32) -> impl Strategy<Value = Intent> {
        prop_oneof![
            1 => arb_buildable_kind().prop_map(Intent::Build),
            3 => (arb_unit_id(), arb_loose_pos(width, height))
                .prop_map(|(unit, to)| Intent::Move { unit, to }),
            2 => (arb_unit_id(), arb_unit_id())
                .prop_map(|(unit, target)| Intent::Attack { unit, target }),
            1 => (arb_unit_id(), arb_ability_target(width, height))
                .prop_map(|(unit, target)| Intent::Ability { unit, target }),
            1 => arb_unit_id().prop_map(Intent::Wait),
            1 => Just(Intent::EndTurn),
        ]
    }

    /// A sequence of intents.
    pub fn arb_intent_sequence(
        width: u32,
        height: u32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<Intent>> {
        prop::collection::vec(arb_intent(width, height), 0..max_len)
    }

    /// A random layout whose cells are drawn from every terrain kind.
    pub fn arb_layout(width: u32, height: u32) -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::collection::vec(arb_terrain(), width as usize)
                .prop_map(|row| row.into_iter().map(TerrainKind::layout_char).collect()),
            height as usize,
        )
    }
}
