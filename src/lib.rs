use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod error;
pub mod game;
pub mod notify;
pub mod persist;
pub mod rules;
pub mod session;
pub mod settings;
pub mod types;
pub mod wasm;

pub use board::Board;
pub use error::{GameError, RestoreError, SessionError, SettingsError};
pub use game::GameState;
pub use notify::{EventLog, NotificationSink, NullSink, SessionEvent};
pub use persist::SavedGame;
pub use session::{Session, SessionState, ThinkOutcome};
pub use settings::Settings;
pub use types::{ChangeList, Color, Move, ScoreReport, StateView};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
