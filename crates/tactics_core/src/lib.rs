//! # Tactics Core
//!
//! Deterministic simulation core for a two-faction, turn-based grid tactics
//! game.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No terminal or network IO (file IO is limited to replays and snapshots)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! # Determinism
//!
//! A [`Match`] built from the same [`setup::MatchConfig`] and seed, fed the
//! same [`player_facade::Intent`] stream, produces the same events and the
//! same [`Match::state_hash`]. Every random roll comes from the match's own
//! seeded `ChaCha8Rng`, and every collection that is iterated while mutating
//! state has a defined order.
//!
//! ## Crate Structure
//!
//! - [`terrain`] - Terrain kinds and the grid
//! - [`unit`], [`unit_kind`], [`status`] - Units, their stats, and effects
//! - [`pathfinding`] - A* paths and reachable sets
//! - [`visibility`] - Per-faction fog of war
//! - [`combat`], [`abilities`], [`economy`] - Actions a unit or faction takes
//! - [`systems`] - Turn upkeep
//! - [`simulation`] - The [`Match`] state machine
//! - [`ai`] - The built-in decision engine
//! - [`player_facade`] - Intents, command sources, and faction views
//! - [`replay`], [`snapshot`] - Recording and persistence

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod ai;
pub mod combat;
pub mod data;
pub mod economy;
pub mod error;
pub mod events;
pub mod factions;
pub mod math;
pub mod pathfinding;
pub mod player_facade;
pub mod replay;
pub mod setup;
pub mod simulation;
pub mod snapshot;
pub mod status;
pub mod systems;
pub mod terrain;
pub mod unit;
pub mod unit_kind;
pub mod visibility;

pub use simulation::Match;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::abilities::AbilityTarget;
    pub use crate::ai::{AiConfig, DecisionEngine};
    pub use crate::data::GameRules;
    pub use crate::error::{GameError, Result};
    pub use crate::events::GameEvent;
    pub use crate::factions::{Controller, Faction, FactionId};
    pub use crate::math::{Fixed, GridPos};
    pub use crate::player_facade::{CommandSource, FactionView, Intent, ScriptedCommands};
    pub use crate::replay::{Replay, ReplayPlayer, ReplayStep};
    pub use crate::setup::{FactionSetup, MatchConfig, StartingUnit};
    pub use crate::simulation::{Match, Phase};
    pub use crate::snapshot::Snapshot;
    pub use crate::status::StatusKind;
    pub use crate::terrain::{TerrainGrid, TerrainKind};
    pub use crate::unit::{Unit, UnitId};
    pub use crate::unit_kind::{AbilityKind, UnitKind};
    pub use crate::visibility::Visibility;
}
