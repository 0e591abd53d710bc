//! Factions: identity, controller, treasury, units and fog of war.

use serde::{Deserialize, Serialize};

use crate::unit::{Unit, UnitId};
use crate::visibility::VisibilityMap;

/// One of the two sides in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactionId {
    /// Moves first. Controlled by the human in the default setup.
    Blue,
    /// Moves second. Controlled by the decision engine in the default setup.
    Red,
}

impl FactionId {
    /// Both factions in turn order.
    pub const ALL: [Self; 2] = [Self::Blue, Self::Red];

    /// Get the display name for this faction.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Blue => "Blue Company",
            Self::Red => "Red Company",
        }
    }

    /// Zero-based index, also used as the prefix of unit identifiers.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Red => 1,
        }
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Blue),
            1 => Some(Self::Red),
            _ => None,
        }
    }

    /// The other faction.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Blue => Self::Red,
            Self::Red => Self::Blue,
        }
    }
}

/// Who issues intents for a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Intents come from an external command source (the prompt).
    #[default]
    Human,
    /// Intents come from [`crate::ai::DecisionEngine`].
    Ai,
}

/// State owned by one side.
///
/// Units are stored in creation order and never removed, so a unit's
/// sequence number is its position in the list plus one. The base is
/// always sequence 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Faction {
    id: FactionId,
    controller: Controller,
    gold: u32,
    units: Vec<Unit>,
    visibility: VisibilityMap,
}

impl Faction {
    /// Create a faction around its base. The base must carry sequence 1.
    #[must_use]
    pub fn new(
        id: FactionId,
        controller: Controller,
        gold: u32,
        base: Unit,
        visibility: VisibilityMap,
    ) -> Self {
        debug_assert!(base.is_base() && base.id() == UnitId::new(id, 1));
        Self {
            id,
            controller,
            gold,
            units: vec![base],
            visibility,
        }
    }

    /// Faction id.
    #[must_use]
    pub const fn id(&self) -> FactionId {
        self.id
    }

    /// Who issues intents.
    #[must_use]
    pub const fn controller(&self) -> Controller {
        self.controller
    }

    /// Change who issues intents.
    pub fn set_controller(&mut self, controller: Controller) {
        self.controller = controller;
    }

    /// Gold on hand.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    pub(crate) fn earn(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub(crate) fn spend(&mut self, amount: u32) {
        self.gold = self.gold.saturating_sub(amount);
    }

    /// Every unit ever created, dead ones included.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Live units, base included.
    pub fn live_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    /// Number of live non-base units.
    #[must_use]
    pub fn army_size(&self) -> usize {
        self.live_units().filter(|u| !u.is_base()).count()
    }

    /// The base.
    #[must_use]
    pub fn base(&self) -> &Unit {
        &self.units[0]
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        if id.faction != self.id {
            return None;
        }
        let index = id.seq.checked_sub(1)? as usize;
        self.units.get(index)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        if id.faction != self.id {
            return None;
        }
        let index = id.seq.checked_sub(1)? as usize;
        self.units.get_mut(index)
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    /// Id the next created unit will receive.
    #[must_use]
    pub fn next_unit_id(&self) -> UnitId {
        UnitId::new(self.id, self.units.len() as u32 + 1)
    }

    pub(crate) fn push_unit(&mut self, unit: Unit) -> UnitId {
        let id = unit.id();
        self.units.push(unit);
        id
    }

    /// Fog of war map.
    #[must_use]
    pub const fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    pub(crate) fn visibility_mut(&mut self) -> &mut VisibilityMap {
        &mut self.visibility
    }

    /// Whether any unit still has a usable action.
    #[must_use]
    pub fn any_can_act(&self) -> bool {
        self.units.iter().any(Unit::can_act)
    }
}
