use thiserror::Error;

use crate::session::SessionState;
use crate::types::{Color, Move};

/// Precondition violations on the board and game state.
/// The state is left untouched whenever one of these is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    #[error("position ({row},{col}) is off the board")]
    OutOfBounds { row: i8, col: i8 },

    #[error("illegal move at ({row},{col}) for {color:?}")]
    IllegalMove { row: i8, col: i8, color: Color },

    #[error("it is {expected:?}'s turn, not {got:?}'s")]
    WrongTurn { expected: Color, got: Color },

    #[error("no move to take back")]
    NothingToUndo,
}

impl GameError {
    pub fn illegal(mv: Move) -> Self {
        Self::IllegalMove {
            row: mv.row,
            col: mv.col,
            color: mv.color,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not ready (state: {0:?})")]
    NotReady(SessionState),

    #[error("game is already over")]
    GameOver,

    #[error("no interrupted computation to continue")]
    NotInterrupted,

    #[error("search worker disconnected before delivering a move")]
    WorkerLost,

    #[error("search task {0} belongs to an abandoned computation")]
    StaleTask(u64),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Game(#[from] GameError),
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("saved game checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("saved move #{index} is illegal; {applied} moves were replayed")]
    CorruptedSaveData { index: usize, applied: usize },

    #[error("saved game is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("strength must be in 1..=7, got {0}")]
    StrengthOutOfRange(u8),

    #[error("human color must be A or B")]
    NoHumanColor,

    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
