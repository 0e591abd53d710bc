//! Error types for the tactics engine.
//!
//! Every rejected intent is reported through [`GameError`]. Rejections are
//! local and recoverable: the match state is left exactly as it was before
//! the intent was issued. [`GameError::ConfigurationError`] is the only fatal
//! variant and is only produced while a match is being constructed.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The target is dead, belongs to the wrong faction, is out of range or
    /// is not currently visible to the acting faction.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The action slot was already used, the unit is stunned, the ability is
    /// on cooldown, or the unit cannot act at all right now.
    #[error("Action unavailable: {0}")]
    ActionUnavailable(String),

    /// The destination or spawn cell is occupied, out of bounds, or there is
    /// no valid spawn cell next to the base.
    #[error("Illegal placement: {0}")]
    IllegalPlacement(String),

    /// Not enough gold.
    #[error("Insufficient resources: need {required} gold, have {available}")]
    InsufficientResources {
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// Malformed rules or terrain layout. Fatal; aborts match construction.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Snapshot or replay encoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl GameError {
    /// Stable reason code for command sources and machine-readable output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidTarget(_) => "invalid_target",
            Self::ActionUnavailable(_) => "action_unavailable",
            Self::IllegalPlacement(_) => "illegal_placement",
            Self::InsufficientResources { .. } => "insufficient_resources",
            Self::ConfigurationError(_) => "configuration_error",
            Self::Snapshot(_) => "snapshot",
        }
    }

    /// Whether the caller may simply try another intent.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigurationError(_))
    }

    pub(crate) fn target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
        Self::ActionUnavailable(msg.into())
    }

    pub(crate) fn placement(msg: impl Into<String>) -> Self {
        Self::IllegalPlacement(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }
}
