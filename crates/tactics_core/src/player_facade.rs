//! Unified player interface for fair AI and human interactions.
//!
//! Humans and the decision engine drive a match the same way: by handing
//! [`Intent`]s to [`Match::apply`]. By using the same entry point, we ensure:
//!
//! - **Fair play:** the AI only sees what [`FactionView`] shows a human
//! - **Consistent behavior:** same intents, same validation, same events
//! - **Replayable:** an intent log plus the seed reproduces a match
//!
//! # Visibility Rules
//!
//! A [`FactionView`] shows terrain for every explored cell, but enemy units
//! only on cells the viewer currently sees. Own units are always shown.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::abilities::AbilityTarget;
use crate::error::Result;
use crate::events::GameEvent;
use crate::factions::FactionId;
use crate::math::GridPos;
use crate::simulation::Match;
use crate::status::StatusKind;
use crate::terrain::TerrainKind;
use crate::unit::{Unit, UnitId};
use crate::unit_kind::{AbilityKind, UnitKind};
use crate::visibility::Visibility;

/// One request from whoever controls the active faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    /// Buy a unit next to the base.
    Build(UnitKind),
    /// Move a unit.
    Move {
        /// Mover.
        unit: UnitId,
        /// Destination.
        to: GridPos,
    },
    /// Attack an enemy unit.
    Attack {
        /// Attacker.
        unit: UnitId,
        /// Defender.
        target: UnitId,
    },
    /// Use an ability.
    Ability {
        /// Caster.
        unit: UnitId,
        /// Aim.
        target: AbilityTarget,
    },
    /// Spend every remaining action of a unit.
    Wait(UnitId),
    /// End the turn.
    EndTurn,
}

impl Intent {
    /// The unit the intent commands, if any.
    #[must_use]
    pub const fn unit(&self) -> Option<UnitId> {
        match self {
            Self::Move { unit, .. }
            | Self::Attack { unit, .. }
            | Self::Ability { unit, .. }
            | Self::Wait(unit) => Some(*unit),
            Self::Build(_) | Self::EndTurn => None,
        }
    }
}

/// Supplier of intents for one faction.
///
/// Returning `None` hands control back to the caller (for a prompt, the
/// player quit).
pub trait CommandSource {
    /// Next intent for the active faction.
    fn next_intent(&mut self, game: &Match) -> Option<Intent>;

    /// Called with the outcome of each intent and with the events of every
    /// turn played by someone else. The default ignores it.
    fn observe(&mut self, _game: &Match, _outcome: &Result<Vec<GameEvent>>) {}
}

/// A fixed list of intents, played in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedCommands {
    queue: VecDeque<Intent>,
}

impl ScriptedCommands {
    /// Queue the given intents.
    pub fn new(intents: impl IntoIterator<Item = Intent>) -> Self {
        Self {
            queue: intents.into_iter().collect(),
        }
    }

    /// Intents not yet played.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl CommandSource for ScriptedCommands {
    fn next_intent(&mut self, _game: &Match) -> Option<Intent> {
        self.queue.pop_front()
    }
}

impl Match {
    /// Validate and execute one intent.
    ///
    /// After a successful unit intent, if none of the active faction's units
    /// can act any more, the turn ends automatically and the next upkeep's
    /// events are appended. Builds never end the turn.
    pub fn apply(&mut self, intent: Intent) -> Result<Vec<GameEvent>> {
        let mut events = match intent {
            Intent::Build(kind) => self.build_unit(kind)?,
            Intent::Move { unit, to } => self.issue_move(unit, to)?,
            Intent::Attack { unit, target } => self.issue_attack(unit, target)?,
            Intent::Ability { unit, target } => self.issue_ability(unit, target)?,
            Intent::Wait(unit) => self.issue_wait(unit)?,
            Intent::EndTurn => return self.end_turn(),
        };
        if intent.unit().is_some() && !self.is_over() && !self.faction(self.active).any_can_act() {
            debug!(faction = self.active.display_name(), "no unit can act, ending turn");
            events.extend(self.end_turn()?);
        }
        Ok(events)
    }

    /// What `viewer` is allowed to see.
    #[must_use]
    pub fn view(&self, viewer: FactionId) -> FactionView {
        FactionView::new(self, viewer)
    }
}

/// Displayable state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Identifier.
    pub id: UnitId,
    /// Kind.
    pub kind: UnitKind,
    /// Cell.
    pub position: GridPos,
    /// Current hp.
    pub hp: u32,
    /// Max hp.
    pub max_hp: u32,
    /// Level.
    pub level: u32,
    /// Experience.
    pub xp: u32,
    /// Attack power.
    pub attack: u32,
    /// Defense including statuses, without terrain.
    pub defense: u32,
    /// Effective attack range.
    pub attack_range: u32,
    /// Effective move range.
    pub move_range: u32,
    /// Ability, if any.
    pub ability: Option<AbilityKind>,
    /// Ability cooldown.
    pub cooldown: u32,
    /// Active statuses with remaining upkeeps.
    pub statuses: Vec<(StatusKind, u32)>,
    /// Whether it still has an action this turn.
    pub can_act: bool,
}

impl UnitSnapshot {
    /// Snapshot a placed unit. Returns `None` for dead non-base units.
    #[must_use]
    pub fn of(unit: &Unit) -> Option<Self> {
        Some(Self {
            id: unit.id(),
            kind: unit.kind(),
            position: unit.position()?,
            hp: unit.hp(),
            max_hp: unit.max_hp(),
            level: unit.level(),
            xp: unit.xp(),
            attack: unit.attack(),
            defense: unit.effective_defense(),
            attack_range: unit.effective_attack_range(),
            move_range: unit.effective_move_range(),
            ability: unit.ability(),
            cooldown: unit.cooldown,
            statuses: unit
                .statuses
                .iter()
                .map(|(kind, effect)| (kind, effect.remaining))
                .collect(),
            can_act: unit.can_act(),
        })
    }
}

/// One cell as a faction sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    /// Fog state.
    pub visibility: Visibility,
    /// Terrain, once explored.
    pub terrain: Option<TerrainKind>,
    /// Unit shown on the cell: own units always, enemies only while visible.
    pub unit: Option<(UnitId, UnitKind)>,
}

/// Visibility-filtered picture of a match for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionView {
    /// Viewing faction.
    pub viewer: FactionId,
    /// Faction to act.
    pub active: FactionId,
    /// Turn counter.
    pub turn: u32,
    /// Grid width.
    pub width: u32,
    /// Grid height.
    pub height: u32,
    /// Row-major cells.
    pub cells: Vec<CellView>,
    /// Viewer's gold.
    pub gold: u32,
    /// Viewer's live units.
    pub own_units: Vec<UnitSnapshot>,
    /// Enemy units currently visible.
    pub visible_enemies: Vec<UnitSnapshot>,
    /// Winner, once decided.
    pub winner: Option<FactionId>,
}

impl FactionView {
    fn new(game: &Match, viewer: FactionId) -> Self {
        let grid = game.grid();
        let visibility = game.faction(viewer).visibility();
        let cells = grid
            .positions()
            .map(|pos| {
                let fog = visibility.get(pos);
                let shown = game.unit_at(pos).filter(|u| {
                    u.faction() == viewer || fog == Visibility::Visible
                });
                CellView {
                    visibility: fog,
                    terrain: (fog != Visibility::Unseen)
                        .then(|| grid.kind_at(pos))
                        .flatten(),
                    unit: shown.map(|u| (u.id(), u.kind())),
                }
            })
            .collect();
        Self {
            viewer,
            active: game.active(),
            turn: game.turn(),
            width: grid.width(),
            height: grid.height(),
            cells,
            gold: game.faction(viewer).gold(),
            own_units: game
                .faction(viewer)
                .live_units()
                .filter_map(UnitSnapshot::of)
                .collect(),
            visible_enemies: game
                .visible_enemies(viewer)
                .filter_map(UnitSnapshot::of)
                .collect(),
            winner: game.winner(),
        }
    }

    /// Cell at a position.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&CellView> {
        if pos.x < 0 || pos.y < 0 || pos.x as u32 >= self.width || pos.y as u32 >= self.height {
            return None;
        }
        self.cells
            .get(pos.y as usize * self.width as usize + pos.x as usize)
    }
}

/// Whether `viewer` may be told about an event.
///
/// Events about enemy units are only reported if the unit's cell is
/// currently visible or the event also involves one of the viewer's units.
#[must_use]
pub fn event_visible_to(game: &Match, viewer: FactionId, event: &GameEvent) -> bool {
    let sees = |id: &UnitId| {
        id.faction == viewer
            || game
                .unit(*id)
                .and_then(Unit::position)
                .is_some_and(|pos| game.is_visible_to(viewer, pos))
    };
    match event {
        GameEvent::TurnStarted { .. } | GameEvent::MatchWon { .. } => true,
        GameEvent::Income { faction, .. } => *faction == viewer,
        GameEvent::Built { unit, at, .. } => {
            unit.faction == viewer || game.is_visible_to(viewer, *at)
        }
        GameEvent::Moved { unit, to, .. } => {
            unit.faction == viewer || game.is_visible_to(viewer, *to)
        }
        GameEvent::LeftView { from, .. } => game.is_visible_to(viewer, *from),
        GameEvent::Damaged { source, target, .. } => {
            sees(target) || source.as_ref().is_some_and(|s| s.faction == viewer)
        }
        GameEvent::Killed { unit, by } => {
            unit.faction == viewer || by.as_ref().is_some_and(|b| b.faction == viewer)
        }
        GameEvent::Healed { target, .. } => sees(target),
        GameEvent::Waited { unit }
        | GameEvent::AbilityUsed { unit, .. }
        | GameEvent::ExperienceGained { unit, .. }
        | GameEvent::LeveledUp { unit, .. }
        | GameEvent::StatusApplied { unit, .. }
        | GameEvent::StatusExpired { unit, .. } => sees(unit),
    }
}

/// The form of `event` that `viewer` may be told about, if any.
///
/// An enemy move that ends out of sight is reported as
/// [`GameEvent::LeftView`] when its origin was visible, so the hidden
/// destination never reaches the viewer.
#[must_use]
pub fn event_for_viewer(
    game: &Match,
    viewer: FactionId,
    event: &GameEvent,
) -> Option<GameEvent> {
    if event_visible_to(game, viewer, event) {
        return Some(event.clone());
    }
    match *event {
        GameEvent::Moved { unit, from, .. } if game.is_visible_to(viewer, from) => {
            Some(GameEvent::LeftView { unit, from })
        }
        _ => None,
    }
}
