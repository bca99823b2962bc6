use serde::{Deserialize, Serialize};

use crate::error::RestoreError;
use crate::session::SessionState;
use crate::types::{Color, Move};

/// The move list plus the session flags needed to resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Every move from the starting position, in order.
    pub moves: Vec<Move>,
    pub human_color: Color,
    pub competitive: bool,
    pub strength: u8,
    pub state: SessionState,
    /// CRC32 over `moves`.
    pub checksum: u32,
}

impl SavedGame {
    pub fn new(
        moves: Vec<Move>,
        human_color: Color,
        competitive: bool,
        strength: u8,
        state: SessionState,
    ) -> Self {
        let checksum = checksum_of(&moves);
        Self {
            moves,
            human_color,
            competitive,
            strength,
            state,
            checksum,
        }
    }

    pub fn verify(&self) -> Result<(), RestoreError> {
        let actual = checksum_of(&self.moves);
        if actual != self.checksum {
            return Err(RestoreError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, RestoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, RestoreError> {
        let saved: Self = serde_json::from_str(text)?;
        saved.verify()?;
        Ok(saved)
    }
}

fn checksum_of(moves: &[Move]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for mv in moves {
        hasher.update(&[mv.row as u8, mv.col as u8, mv.color.to_u8()]);
    }
    hasher.finalize()
}
