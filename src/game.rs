use crate::board::Board;
use crate::error::GameError;
use crate::rules;
use crate::types::{ChangeList, Color, Move};

/// Board plus turn and undo history.
///
/// Turn alternation in [`GameState::make_move`] is unconditional. When the
/// side to move is blocked the controller calls [`GameState::skip_turn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    to_move: Color,
    history: Vec<ChangeList>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            to_move: Color::A,
            history: Vec::new(),
        }
    }

    /// Back to the starting position with A to move and no history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Color {
        self.to_move
    }

    pub fn move_number(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn move_is_legal(&self, mv: &Move) -> bool {
        rules::is_move_legal(&self.board, mv)
    }

    pub fn move_is_possible(&self, color: Color) -> bool {
        rules::move_possible(&self.board, color)
    }

    pub fn move_is_at_all_possible(&self) -> bool {
        rules::move_at_all_possible(&self.board)
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        rules::legal_moves(&self.board, self.to_move)
    }

    /// Applies a legal move by the side to move and passes the turn.
    pub fn make_move(&mut self, mv: &Move) -> Result<&ChangeList, GameError> {
        if mv.color != self.to_move {
            return Err(GameError::WrongTurn {
                expected: self.to_move,
                got: mv.color,
            });
        }
        let changed = rules::apply_move(&mut self.board, mv)?;
        self.history.push(changed);
        self.to_move = self.to_move.opponent();
        Ok(self.changed_chips())
    }

    /// Passes the turn of a blocked side. Returns `false` and does nothing if
    /// the side to move has a legal move.
    pub fn skip_turn(&mut self) -> bool {
        if self.move_is_possible(self.to_move) {
            return false;
        }
        self.to_move = self.to_move.opponent();
        true
    }

    /// Reverts the last move and gives the turn back to its mover.
    pub fn take_back_move(&mut self) -> Result<Move, GameError> {
        let changed = self.history.pop().ok_or(GameError::NothingToUndo)?;
        rules::revert_move(&mut self.board, &changed);
        let origin = changed[0];
        self.to_move = origin.color;
        Ok(origin)
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|changed| changed[0])
    }

    /// Chips changed by the last move, placed chip first. Empty before the
    /// first move.
    pub fn changed_chips(&self) -> &ChangeList {
        static NO_CHANGES: ChangeList = Vec::new();
        self.history.last().unwrap_or(&NO_CHANGES)
    }

    /// Every applied move in order, as persisted.
    pub fn moves(&self) -> Vec<Move> {
        self.history.iter().map(|changed| changed[0]).collect()
    }

    pub fn score(&self, color: Color) -> u8 {
        self.board.count_pieces(color)
    }

    pub fn chip_color_at(&self, row: usize, col: usize) -> Color {
        self.board.get(row, col)
    }

    #[cfg(test)]
    pub(crate) fn set_board_for_test(&mut self, board: Board, to_move: Color) {
        self.board = board;
        self.to_move = to_move;
        self.history.clear();
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
