use serde::Serialize;

use crate::types::{Color, Move, ScoreReport};

/// Receives session events after the state change they describe. Sinks only
/// get values and cannot reach back into the game.
pub trait NotificationSink {
    /// `color` is now to move.
    fn turn_changed(&mut self, _color: Color) {}

    /// A move was applied. Placed chip first, then flipped chips.
    fn move_applied(&mut self, _changed: &[Move]) {}

    /// The human tried a move that was rejected. No state changed.
    fn illegal_move(&mut self, _mv: Move) {}

    fn game_over(&mut self, _report: &ScoreReport) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionEvent {
    Turn(Color),
    MoveApplied(Vec<Move>),
    IllegalMove(Move),
    GameOver(ScoreReport),
}

/// Buffers events until drained. Used by front-ends that poll.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl NotificationSink for EventLog {
    fn turn_changed(&mut self, color: Color) {
        self.events.push(SessionEvent::Turn(color));
    }

    fn move_applied(&mut self, changed: &[Move]) {
        self.events.push(SessionEvent::MoveApplied(changed.to_vec()));
    }

    fn illegal_move(&mut self, mv: Move) {
        self.events.push(SessionEvent::IllegalMove(mv));
    }

    fn game_over(&mut self, report: &ScoreReport) {
        self.events.push(SessionEvent::GameOver(*report));
    }
}
