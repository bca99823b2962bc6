use crate::board::{Board, NUM_SQUARES};
use crate::rules;
use crate::types::Color;

/// Classic positional weights: corners are prized, squares next to corners
/// are dangerous.
#[rustfmt::skip]
const SQUARE_WEIGHTS: [i32; NUM_SQUARES] = [
    100, -20,  10,   5,   5,  10, -20, 100,
    -20, -50,  -2,  -2,  -2,  -2, -50, -20,
     10,  -2,  -1,  -1,  -1,  -1,  -2,  10,
      5,  -2,  -1,  -1,  -1,  -1,  -2,   5,
      5,  -2,  -1,  -1,  -1,  -1,  -2,   5,
     10,  -2,  -1,  -1,  -1,  -1,  -2,  10,
    -20, -50,  -2,  -2,  -2,  -2, -50, -20,
    100, -20,  10,   5,   5,  10, -20, 100,
];

const CORNERS: u64 = 0x8100_0000_0000_0081;
const CORNER_WEIGHT: i32 = 25;
const MOBILITY_WEIGHT: i32 = 8;
const DISC_WEIGHT: i32 = 1;

/// Scores above this magnitude only come from finished games.
pub const WIN_SCORE: i32 = 1_000_000;

/// Static evaluator. Which features are used grows with strength:
///
/// | strength | features |
/// |----------|----------|
/// | 1 | disc difference |
/// | 2 | + corner ownership |
/// | 3 | + square weights |
/// | 4..=7 | + mobility |
///
/// Non-competitive games below strength 7 add a small deterministic jitter
/// derived from the position so that weak play is less predictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluator {
    strength: u8,
    jitter: i32,
}

impl Evaluator {
    pub fn new(strength: u8, competitive: bool) -> Self {
        let jitter = if competitive {
            0
        } else {
            i32::from(7u8.saturating_sub(strength)) * 2
        };
        Self { strength, jitter }
    }

    /// Evaluates from `color`'s perspective. Higher is better for `color`.
    pub fn evaluate(&self, board: &Board, color: Color) -> i32 {
        let me = board.bits(color);
        let opp = board.bits(color.opponent());

        let mut score = DISC_WEIGHT * (me.count_ones() as i32 - opp.count_ones() as i32);

        if self.strength >= 2 {
            score += CORNER_WEIGHT
                * ((me & CORNERS).count_ones() as i32 - (opp & CORNERS).count_ones() as i32);
        }
        if self.strength >= 3 {
            score += weighted(me) - weighted(opp);
        }
        if self.strength >= 4 {
            let my_moves = rules::legal_mask(board, color).count_ones() as i32;
            let opp_moves = rules::legal_mask(board, color.opponent()).count_ones() as i32;
            score += MOBILITY_WEIGHT * (my_moves - opp_moves);
        }
        if self.jitter > 0 {
            score += self.jitter_for(board, color);
        }

        score
    }

    fn jitter_for(&self, board: &Board, color: Color) -> i32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&board.bits(Color::A).to_le_bytes());
        hasher.update(&board.bits(Color::B).to_le_bytes());
        hasher.update(&[color.to_u8()]);
        let span = (2 * self.jitter + 1) as u32;
        (hasher.finalize() % span) as i32 - self.jitter
    }
}

/// Exact final score from `color`'s perspective: any win outranks every
/// heuristic score, larger margins rank higher.
pub fn final_score(board: &Board, color: Color) -> i32 {
    let diff = board.count_pieces(color) as i32 - board.count_pieces(color.opponent()) as i32;
    diff.signum() * WIN_SCORE + diff
}

fn weighted(mut bits: u64) -> i32 {
    let mut sum = 0;
    while bits != 0 {
        sum += SQUARE_WEIGHTS[bits.trailing_zeros() as usize];
        bits &= bits - 1;
    }
    sum
}
