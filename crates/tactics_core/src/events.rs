//! Events emitted by accepted intents and upkeep.
//!
//! These events can be used by outer layers to print a battle log, drive a
//! renderer, or verify replays.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::GridPos;
use crate::status::StatusKind;
use crate::unit::UnitId;
use crate::unit_kind::{AbilityKind, UnitKind};

/// Something that happened in the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A faction's turn began.
    TurnStarted {
        /// Faction now acting.
        faction: FactionId,
        /// Turn counter.
        turn: u32,
    },
    /// Gold was collected during upkeep.
    Income {
        /// Receiving faction.
        faction: FactionId,
        /// Flat part.
        base: u32,
        /// Part paid by occupied income cells.
        terrain: u32,
    },
    /// A new unit was built next to its base.
    Built {
        /// New unit.
        unit: UnitId,
        /// Its kind.
        kind: UnitKind,
        /// Spawn cell.
        at: GridPos,
        /// Gold spent.
        cost: u32,
    },
    /// A unit moved.
    Moved {
        /// Mover.
        unit: UnitId,
        /// Origin.
        from: GridPos,
        /// Destination.
        to: GridPos,
        /// Movement budget spent.
        cost: u32,
    },
    /// An enemy walked out of the viewer's sight.
    ///
    /// Never emitted by the engine; [`crate::player_facade::event_for_viewer`]
    /// reports it in place of a [`GameEvent::Moved`] whose destination the
    /// viewer cannot see.
    LeftView {
        /// Mover.
        unit: UnitId,
        /// Last cell it was seen on.
        from: GridPos,
    },
    /// A unit spent its remaining actions waiting.
    Waited {
        /// The unit.
        unit: UnitId,
    },
    /// A unit used its ability.
    AbilityUsed {
        /// Caster.
        unit: UnitId,
        /// Ability.
        ability: AbilityKind,
    },
    /// Damage was dealt.
    Damaged {
        /// Attacker, `None` for damage over time.
        source: Option<UnitId>,
        /// Victim.
        target: UnitId,
        /// Damage dealt after defense.
        amount: u32,
        /// Victim hp afterwards.
        remaining: u32,
        /// Whether this was a counter-attack.
        retaliation: bool,
    },
    /// Hit points were restored.
    Healed {
        /// Healer.
        source: UnitId,
        /// Recipient.
        target: UnitId,
        /// Hp actually restored.
        amount: u32,
    },
    /// A unit died.
    Killed {
        /// Victim.
        unit: UnitId,
        /// Killer, `None` for damage over time.
        by: Option<UnitId>,
    },
    /// A unit gained experience.
    ExperienceGained {
        /// The unit.
        unit: UnitId,
        /// Amount granted.
        amount: u32,
    },
    /// A unit reached a new level.
    LeveledUp {
        /// The unit.
        unit: UnitId,
        /// New level.
        level: u32,
    },
    /// A status effect took hold.
    StatusApplied {
        /// Affected unit.
        unit: UnitId,
        /// Effect.
        status: StatusKind,
    },
    /// A status effect wore off.
    StatusExpired {
        /// Affected unit.
        unit: UnitId,
        /// Effect.
        status: StatusKind,
    },
    /// A base was destroyed and the match is over.
    MatchWon {
        /// Winner.
        winner: FactionId,
    },
}

impl GameEvent {
    /// The unit this event is primarily about, if any.
    #[must_use]
    pub const fn subject(&self) -> Option<UnitId> {
        match self {
            Self::Built { unit, .. }
            | Self::Moved { unit, .. }
            | Self::LeftView { unit, .. }
            | Self::Waited { unit }
            | Self::AbilityUsed { unit, .. }
            | Self::Killed { unit, .. }
            | Self::ExperienceGained { unit, .. }
            | Self::LeveledUp { unit, .. }
            | Self::StatusApplied { unit, .. }
            | Self::StatusExpired { unit, .. } => Some(*unit),
            Self::Damaged { target, .. } | Self::Healed { target, .. } => Some(*target),
            Self::TurnStarted { .. } | Self::Income { .. } | Self::MatchWon { .. } => None,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnStarted { faction, turn } => {
                write!(f, "Turn {turn}: {} to act", faction.display_name())
            }
            Self::Income {
                faction,
                base,
                terrain,
            } => write!(
                f,
                "{} collects {} gold ({base} base, {terrain} from mines)",
                faction.display_name(),
                base + terrain
            ),
            Self::Built {
                unit,
                kind,
                at,
                cost,
            } => write!(f, "Built {kind} {unit} at {at} for {cost} gold"),
            Self::Moved { unit, from, to, .. } => write!(f, "{unit} moves {from} -> {to}"),
            Self::LeftView { unit, from } => write!(f, "{unit} leaves view at {from}"),
            Self::Waited { unit } => write!(f, "{unit} waits"),
            Self::AbilityUsed { unit, ability } => write!(f, "{unit} uses {ability}"),
            Self::Damaged {
                source,
                target,
                amount,
                remaining,
                retaliation,
            } => {
                let verb = if *retaliation { "strikes back at" } else { "hits" };
                match source {
                    Some(source) => write!(
                        f,
                        "{source} {verb} {target} for {amount} ({remaining} hp left)"
                    ),
                    None => write!(f, "{target} burns for {amount} ({remaining} hp left)"),
                }
            }
            Self::Healed {
                source,
                target,
                amount,
            } => write!(f, "{source} heals {target} for {amount}"),
            Self::Killed { unit, by } => match by {
                Some(by) => write!(f, "{unit} is defeated by {by}"),
                None => write!(f, "{unit} is defeated"),
            },
            Self::ExperienceGained { unit, amount } => write!(f, "{unit} gains {amount} xp"),
            Self::LeveledUp { unit, level } => write!(f, "{unit} reaches level {level}"),
            Self::StatusApplied { unit, status } => write!(f, "{unit} is {}", status.name()),
            Self::StatusExpired { unit, status } => {
                write!(f, "{unit}: {} wore off", status.name())
            }
            Self::MatchWon { winner } => write!(f, "{} wins!", winner.display_name()),
        }
    }
}
