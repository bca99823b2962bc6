use serde::{Deserialize, Serialize};

/// Chip color. `None` marks an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    None,
    A,
    B,
}

impl Color {
    /// Swaps A and B. `None` stays `None`.
    pub fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
            Self::None => Self::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }

    /// Encoding used by flat board arrays: 0=empty, 1=A, 2=B.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::A => 1,
            Self::B => 2,
        }
    }
}

/// A chip placement. `Move::NONE` (row = col = -1) means "no move available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub row: i8,
    pub col: i8,
    pub color: Color,
}

impl Move {
    pub const NONE: Move = Move {
        row: -1,
        col: -1,
        color: Color::None,
    };

    pub fn new(row: i8, col: i8, color: Color) -> Self {
        Self { row, col, color }
    }

    pub fn is_none(&self) -> bool {
        self.row == -1 && self.col == -1
    }

    /// Square index `row * 8 + col`, or `None` when off the board.
    pub fn square(&self) -> Option<usize> {
        if (0..8).contains(&self.row) && (0..8).contains(&self.col) {
            Some(self.row as usize * 8 + self.col as usize)
        } else {
            None
        }
    }
}

/// Effect of one applied move: the placed chip first, then every flipped chip
/// with its new color.
pub type ChangeList = Vec<Move>;

/// Flat snapshot for front-ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateView {
    /// 64 cells, row-major, 0=empty, 1=A, 2=B.
    pub board: Vec<u8>,
    pub to_move: Color,
    pub move_number: u32,
    pub a_count: u8,
    pub b_count: u8,
    pub human_color: Color,
    pub is_game_over: bool,
    pub changed: ChangeList,
}

/// Final result after game over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    pub human: u8,
    pub computer: u8,
    /// `Color::None` on a draw.
    pub winner: Color,
    pub competitive: bool,
    pub cheating: bool,
    pub lowest_strength: u8,
}

impl ScoreReport {
    pub fn eligible_for_highscore(&self) -> bool {
        self.competitive && !self.cheating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_swaps_colors_and_keeps_none() {
        assert_eq!(Color::A.opponent(), Color::B);
        assert_eq!(Color::B.opponent(), Color::A);
        assert_eq!(Color::None.opponent(), Color::None);
    }

    #[test]
    fn none_move_has_no_square() {
        assert!(Move::NONE.is_none());
        assert_eq!(Move::NONE.square(), None);
        assert_eq!(Move::new(2, 3, Color::A).square(), Some(19));
        assert_eq!(Move::new(8, 0, Color::A).square(), None);
    }
}
