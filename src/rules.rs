use once_cell::sync::Lazy;

use crate::board::{BOARD_SIZE, Board, NUM_SQUARES, bit};
use crate::error::GameError;
use crate::types::{ChangeList, Color, Move};

const NOT_COL_0: u64 = 0xFEFE_FEFE_FEFE_FEFE;
const NOT_COL_7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// `(d_row, d_col)` step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
            Direction::Left => (0, -1),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (-1, 1),
            Direction::DownLeft => (1, -1),
            Direction::DownRight => (1, 1),
        }
    }

    /// Moves every bit of `bits` one step in this direction, dropping bits
    /// that would wrap around a side edge.
    pub fn shift(self, bits: u64) -> u64 {
        match self {
            Direction::Up => bits >> 8,
            Direction::Down => bits << 8,
            Direction::Right => (bits << 1) & NOT_COL_0,
            Direction::Left => (bits >> 1) & NOT_COL_7,
            Direction::UpLeft => (bits >> 9) & NOT_COL_7,
            Direction::UpRight => (bits >> 7) & NOT_COL_0,
            Direction::DownLeft => (bits << 7) & NOT_COL_7,
            Direction::DownRight => (bits << 9) & NOT_COL_0,
        }
    }
}

/// For every square and direction, the squares walked from one step away up
/// to the board edge.
static RAYS: Lazy<Vec<[Vec<usize>; 8]>> = Lazy::new(|| {
    (0..NUM_SQUARES)
        .map(|pos| {
            let row = (pos / BOARD_SIZE) as i32;
            let col = (pos % BOARD_SIZE) as i32;
            Direction::ALL.map(|dir| {
                let (dr, dc) = dir.delta();
                let mut ray = Vec::new();
                let (mut r, mut c) = (row + dr, col + dc);
                while in_bounds(r, c) {
                    ray.push(r as usize * BOARD_SIZE + c as usize);
                    r += dr;
                    c += dc;
                }
                ray
            })
        })
        .collect()
});

fn in_bounds(row: i32, col: i32) -> bool {
    (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col)
}

fn ray(pos: usize, dir: Direction) -> &'static [usize] {
    &RAYS[pos][dir as usize]
}

/// Length of the opponent run in `dir` if it is closed by a chip of `me`.
fn chunk_len(board: &Board, pos: usize, me: Color, dir: Direction) -> Option<usize> {
    let opp = me.opponent();
    for (dist, &square) in ray(pos, dir).iter().enumerate() {
        let cell = board.get_square(square);
        if cell == opp {
            continue;
        }
        return (cell == me && dist > 0).then_some(dist);
    }
    None
}

/// Whether `mv` would capture a chunk in `dir`: one or more opponent chips
/// directly followed by a chip of the mover. Does not check that the origin
/// cell is empty.
pub fn has_chunk(board: &Board, mv: &Move, dir: Direction) -> bool {
    match (mv.square(), mv.color) {
        (None, _) | (_, Color::None) => false,
        (Some(pos), me) => chunk_len(board, pos, me, dir).is_some(),
    }
}

pub fn is_move_legal(board: &Board, mv: &Move) -> bool {
    let Some(pos) = mv.square() else {
        return false;
    };
    if mv.color.is_none() || !board.get_square(pos).is_none() {
        return false;
    }
    Direction::ALL
        .iter()
        .any(|&dir| chunk_len(board, pos, mv.color, dir).is_some())
}

/// Whether `color` has any legal move.
pub fn move_possible(board: &Board, color: Color) -> bool {
    legal_mask(board, color) != 0
}

/// Whether either color can move. `false` means the game is over.
pub fn move_at_all_possible(board: &Board) -> bool {
    move_possible(board, Color::A) || move_possible(board, Color::B)
}

/// Legal moves for `color` in row-major order.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut mask = legal_mask(board, color);
    let mut out = Vec::new();
    while mask != 0 {
        let pos = mask.trailing_zeros() as usize;
        out.push(Move::new(
            (pos / BOARD_SIZE) as i8,
            (pos % BOARD_SIZE) as i8,
            color,
        ));
        mask &= mask - 1;
    }
    out
}

/// Bitmask of the squares where `color` may move.
pub fn legal_mask(board: &Board, color: Color) -> u64 {
    if color.is_none() {
        return 0;
    }
    let me = board.bits(color);
    let opp = board.bits(color.opponent());
    let empty = board.bits(Color::None);
    let mut legal = 0u64;
    for dir in Direction::ALL {
        // A run of opponent chips is at most six long on an 8x8 board.
        let mut run = dir.shift(me) & opp;
        for _ in 0..5 {
            run |= dir.shift(run) & opp;
        }
        legal |= dir.shift(run) & empty;
    }
    legal
}

/// Squares `color` would flip by playing at `pos`. Zero when the move is
/// illegal.
pub fn flip_mask(board: &Board, pos: usize, color: Color) -> u64 {
    if pos >= NUM_SQUARES || color.is_none() || !board.get_square(pos).is_none() {
        return 0;
    }
    let mut flips = 0u64;
    for dir in Direction::ALL {
        if let Some(len) = chunk_len(board, pos, color, dir) {
            for &square in &ray(pos, dir)[..len] {
                flips |= bit(square);
            }
        }
    }
    flips
}

/// Places a chip at `pos` and flips captured chips without building a
/// change list. Returns the flipped mask, zero (and no change) when illegal.
pub fn place(board: &mut Board, pos: usize, color: Color) -> u64 {
    let flips = flip_mask(board, pos, color);
    if flips == 0 {
        return 0;
    }
    let me = board.bits(color) | bit(pos) | flips;
    let opp = board.bits(color.opponent()) & !flips;
    *board = match color {
        Color::A => Board::from_bitboards(me, opp),
        _ => Board::from_bitboards(opp, me),
    };
    flips
}

/// Applies a legal move and returns its change list: the placed chip first,
/// then the flipped chips direction by direction, nearest first.
pub fn apply_move(board: &mut Board, mv: &Move) -> Result<ChangeList, GameError> {
    let pos = mv.square().ok_or(GameError::OutOfBounds {
        row: mv.row,
        col: mv.col,
    })?;
    if !is_move_legal(board, mv) {
        return Err(GameError::illegal(*mv));
    }

    let mut changed = vec![*mv];
    for dir in Direction::ALL {
        if let Some(len) = chunk_len(board, pos, mv.color, dir) {
            for &square in &ray(pos, dir)[..len] {
                changed.push(Move::new(
                    (square / BOARD_SIZE) as i8,
                    (square % BOARD_SIZE) as i8,
                    mv.color,
                ));
            }
        }
    }
    for chip in &changed {
        if let Some(square) = chip.square() {
            board.set_square(square, mv.color);
        }
    }
    Ok(changed)
}

/// Reverts a change list produced by [`apply_move`]: the origin becomes empty
/// and every flipped chip returns to the mover's opponent.
pub fn revert_move(board: &mut Board, changed: &[Move]) {
    let Some((origin, flipped)) = changed.split_first() else {
        return;
    };
    if let Some(square) = origin.square() {
        board.set_square(square, Color::None);
    }
    for chip in flipped {
        if let Some(square) = chip.square() {
            board.set_square(square, chip.color.opponent());
        }
    }
}
