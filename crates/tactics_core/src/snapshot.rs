//! Whole-match snapshots for save and load.
//!
//! A snapshot wraps [`Match::serialize`] output in a small versioned
//! envelope that also carries the state hash, so a restore can prove it
//! produced the exact state that was saved.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GameError, Result};
use crate::factions::FactionId;
use crate::simulation::Match;

/// Snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A saved match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Turn counter at capture.
    pub turn: u32,
    /// Faction to act at capture.
    pub active: FactionId,
    /// [`Match::state_hash`] at capture.
    pub state_hash: u64,
    /// Encoded match.
    pub payload: Vec<u8>,
}

impl Snapshot {
    /// Capture a match.
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] if encoding fails.
    pub fn capture(game: &Match) -> Result<Self> {
        Ok(Self {
            version: SNAPSHOT_VERSION,
            turn: game.turn(),
            active: game.active(),
            state_hash: game.state_hash(),
            payload: game.serialize()?,
        })
    }

    /// Rebuild the match and check it hashes to the captured value.
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] on version mismatch, decode failure,
    /// or hash mismatch.
    pub fn restore(&self) -> Result<Match> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GameError::Snapshot(format!(
                "Snapshot version mismatch: expected {}, got {}",
                SNAPSHOT_VERSION, self.version
            )));
        }
        let game = Match::deserialize(&self.payload)?;
        let hash = game.state_hash();
        if hash != self.state_hash {
            return Err(GameError::Snapshot(format!(
                "Snapshot hash mismatch: expected {:#018x}, got {hash:#018x}",
                self.state_hash
            )));
        }
        Ok(game)
    }

    /// Encode the envelope.
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] if encoding fails.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Snapshot(format!("Failed to encode snapshot: {e}")))
    }

    /// Decode an envelope produced by [`encode`](Self::encode).
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] if decoding fails.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to decode snapshot: {e}")))
    }

    /// Write the encoded snapshot to a file.
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] if encoding or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.encode()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::Snapshot(format!("Failed to write snapshot: {e}")))?;
        debug!(path = %path.as_ref().display(), turn = self.turn, "snapshot saved");
        Ok(())
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    /// Returns [`GameError::Snapshot`] if reading or decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::Snapshot(format!("Failed to read snapshot: {e}")))?;
        Self::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GridPos;
    use crate::setup::MatchConfig;
    use crate::unit::UnitId;

    #[test]
    fn test_capture_restore_roundtrip() {
        let mut game = Match::new(MatchConfig::skirmish(), 8).unwrap();
        game.issue_move(UnitId::new(FactionId::Blue, 2), GridPos::new(1, 4))
            .unwrap();
        let snapshot = Snapshot::capture(&game).unwrap();
        let bytes = snapshot.encode().unwrap();

        let restored = Snapshot::decode(&bytes).unwrap().restore().unwrap();
        assert_eq!(restored.state_hash(), game.state_hash());
        assert_eq!(restored.turn(), 1);
    }

    #[test]
    fn test_restored_match_continues_identically() {
        let mut game = Match::new(MatchConfig::skirmish(), 8).unwrap();
        let mut restored = Snapshot::capture(&game).unwrap().restore().unwrap();
        game.end_turn().unwrap();
        restored.end_turn().unwrap();
        let mut a = game.shuffled_units(FactionId::Red);
        let mut b = restored.shuffled_units(FactionId::Red);
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(game.state_hash(), restored.state_hash());
    }

    #[test]
    fn test_version_and_hash_are_checked() {
        let game = Match::new(MatchConfig::skirmish(), 8).unwrap();
        let mut snapshot = Snapshot::capture(&game).unwrap();
        snapshot.state_hash ^= 1;
        assert_eq!(snapshot.restore().unwrap_err().code(), "snapshot");

        let mut snapshot = Snapshot::capture(&game).unwrap();
        snapshot.version = 99;
        assert!(snapshot.restore().is_err());
        assert!(Snapshot::decode(b"junk").is_err());
    }
}
