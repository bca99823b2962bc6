use crate::types::Color;

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

/// 8x8 board represented by one bitboard per color.
/// Square index is `row * 8 + col`, row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    a: u64,
    b: u64,
}

impl Board {
    /// Creates the starting position:
    /// (3,3)=B, (3,4)=A, (4,3)=A, (4,4)=B.
    pub fn new() -> Self {
        Self {
            a: bit(28) | bit(35),
            b: bit(27) | bit(36),
        }
    }

    /// Creates a board with no chips.
    pub fn empty() -> Self {
        Self { a: 0, b: 0 }
    }

    /// Builds a board from raw bitboards. Cells set in both masks belong to A.
    pub fn from_bitboards(a: u64, b: u64) -> Self {
        Self { a, b: b & !a }
    }

    pub fn get(&self, row: usize, col: usize) -> Color {
        self.get_square(square_of(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, color: Color) {
        self.set_square(square_of(row, col), color);
    }

    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_none()
    }

    pub fn count_pieces(&self, color: Color) -> u8 {
        match color {
            Color::A => self.a.count_ones() as u8,
            Color::B => self.b.count_ones() as u8,
            Color::None => self.empty_count(),
        }
    }

    /// Returns `(a_count, b_count)`.
    pub fn count(&self) -> (u8, u8) {
        (self.a.count_ones() as u8, self.b.count_ones() as u8)
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        let (a_count, b_count) = self.count();
        NUM_SQUARES as u8 - a_count - b_count
    }

    /// Bitboard of the given color. Empty cells for `Color::None`.
    pub fn bits(&self, color: Color) -> u64 {
        match color {
            Color::A => self.a,
            Color::B => self.b,
            Color::None => !(self.a | self.b),
        }
    }

    /// Converts board to `[u8; 64]` where 0=empty, 1=A, 2=B.
    pub fn to_array(&self) -> [u8; NUM_SQUARES] {
        let mut board = [0u8; NUM_SQUARES];
        for (pos, cell) in board.iter_mut().enumerate() {
            *cell = self.get_square(pos).to_u8();
        }
        board
    }

    pub(crate) fn get_square(&self, pos: usize) -> Color {
        let square = bit(pos);
        if (self.a & square) != 0 {
            Color::A
        } else if (self.b & square) != 0 {
            Color::B
        } else {
            Color::None
        }
    }

    pub(crate) fn set_square(&mut self, pos: usize, color: Color) {
        let square = bit(pos);
        self.a &= !square;
        self.b &= !square;
        match color {
            Color::A => self.a |= square,
            Color::B => self.b |= square,
            Color::None => {}
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn bit(pos: usize) -> u64 {
    if pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}

fn square_of(row: usize, col: usize) -> usize {
    debug_assert!(row < BOARD_SIZE && col < BOARD_SIZE, "({row},{col}) is off the board");
    row * BOARD_SIZE + col
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_position_has_two_chips_per_color_in_the_center() {
        let board = Board::new();

        assert_eq!(board.get(3, 3), Color::B);
        assert_eq!(board.get(3, 4), Color::A);
        assert_eq!(board.get(4, 3), Color::A);
        assert_eq!(board.get(4, 4), Color::B);
        assert_eq!(board.count(), (2, 2));
        assert_eq!(board.empty_count(), 60);
    }

    #[test]
    fn set_overwrites_and_clears_cells() {
        let mut board = Board::empty();

        board.set(0, 0, Color::A);
        board.set(0, 0, Color::B);
        board.set(7, 7, Color::A);

        assert_eq!(board.get(0, 0), Color::B);
        assert_eq!(board.count(), (1, 1));

        board.set(0, 0, Color::None);
        assert!(board.is_empty(0, 0));
        assert_eq!(board.count_pieces(Color::B), 0);
    }

    #[test]
    fn piece_counts_and_empties_always_sum_to_sixty_four() {
        let board = Board::from_bitboards(0x00FF_0000_0000_FF00, 0x0000_FF00_00FF_0000);
        let total = board.count_pieces(Color::A) + board.count_pieces(Color::B) + board.empty_count();

        assert_eq!(total, 64);
    }

    #[test]
    fn to_array_uses_row_major_order() {
        let cells = Board::new().to_array();

        assert_eq!(cells[27], 2);
        assert_eq!(cells[28], 1);
        assert_eq!(cells[35], 1);
        assert_eq!(cells[36], 2);
        assert_eq!(cells.iter().filter(|&&c| c == 0).count(), 60);
    }
}
