use std::sync::atomic::{AtomicBool, Ordering};

use crate::ai::eval::{Evaluator, final_score};
use crate::board::Board;
use crate::rules;
use crate::types::Color;

const MIN_SCORE: i32 = -i32::MAX;
const MAX_SCORE: i32 = i32::MAX;

/// Marker for a search cut short by the interrupt flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interrupted;

/// Iterative-deepening negaalpha search over board copies.
///
/// The interrupt flag is polled once per node. When it is seen set, the
/// search unwinds and the best move of the last completed depth is returned
/// (the best-ordered move if no depth completed).
pub struct Searcher<'a> {
    evaluator: &'a Evaluator,
    interrupt: &'a AtomicBool,
    max_depth: u8,
    exact_empties: u8,
    nodes: u64,
    completed_depth: u8,
    interrupted: bool,
}

impl<'a> Searcher<'a> {
    pub fn new(evaluator: &'a Evaluator, interrupt: &'a AtomicBool, max_depth: u8) -> Self {
        Self {
            evaluator,
            interrupt,
            max_depth,
            exact_empties: 0,
            nodes: 0,
            completed_depth: 0,
            interrupted: false,
        }
    }

    /// Solves exactly once at most `empties` cells are left. Zero disables.
    pub fn with_exact_solve(mut self, empties: u8) -> Self {
        self.exact_empties = empties;
        self
    }

    /// Searches the best square for `color`, `None` when `color` is blocked.
    pub fn search(&mut self, board: &Board, color: Color) -> Option<usize> {
        self.nodes = 0;
        self.completed_depth = 0;
        self.interrupted = false;

        let legal = rules::legal_mask(board, color);
        if legal == 0 {
            return None;
        }
        let moves = sorted_moves(legal, board, color, self.evaluator);
        if moves.len() == 1 {
            return Some(moves[0]);
        }

        let mut best_move = moves[0];

        for depth in 1..=self.max_depth {
            match self.search_root(board, color, &moves, Some(depth)) {
                Ok(mv) => {
                    best_move = mv;
                    self.completed_depth = depth;
                }
                Err(Interrupted) => break,
            }
        }

        if !self.interrupted
            && board.empty_count() <= self.exact_empties
            && let Ok(mv) = self.search_root(board, color, &moves, None)
        {
            best_move = mv;
        }

        Some(best_move)
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn completed_depth(&self) -> u8 {
        self.completed_depth
    }

    fn poll_interrupt(&mut self) -> bool {
        self.nodes += 1;
        if self.interrupt.load(Ordering::Relaxed) {
            self.interrupted = true;
        }
        self.interrupted
    }

    /// Each child is searched with its lower bound one below the best score so
    /// far, so a child that ties comes back with its exact score and the tie
    /// can go to the lower square.
    fn search_root(
        &mut self,
        board: &Board,
        color: Color,
        moves: &[usize],
        depth: Option<u8>,
    ) -> Result<usize, Interrupted> {
        if self.poll_interrupt() {
            return Err(Interrupted);
        }

        let mut best_move = moves[0];
        let mut best_score = MIN_SCORE;

        for &mv in moves {
            let mut next = *board;
            let _ = rules::place(&mut next, mv, color);
            let alpha = best_score.saturating_sub(1).max(MIN_SCORE);
            let score = -self.negaalpha(
                &next,
                color.opponent(),
                depth.map(|d| d - 1),
                -MAX_SCORE,
                -alpha,
            )?;
            if score > best_score || (score == best_score && mv < best_move) {
                best_score = score;
                best_move = mv;
            }
        }

        Ok(best_move)
    }

    /// Fail-soft negaalpha. `depth` of `None` searches to the end of the game.
    fn negaalpha(
        &mut self,
        board: &Board,
        color: Color,
        depth: Option<u8>,
        alpha: i32,
        beta: i32,
    ) -> Result<i32, Interrupted> {
        if self.poll_interrupt() {
            return Err(Interrupted);
        }

        let legal = rules::legal_mask(board, color);
        if legal == 0 {
            if !rules::move_possible(board, color.opponent()) {
                return Ok(final_score(board, color));
            }
            return self
                .negaalpha(board, color.opponent(), depth, -beta, -alpha)
                .map(|score| -score);
        }
        if depth == Some(0) {
            return Ok(self.evaluator.evaluate(board, color));
        }

        let mut best_score = MIN_SCORE;
        let mut alpha = alpha;

        for mv in sorted_moves(legal, board, color, self.evaluator) {
            let mut next = *board;
            let _ = rules::place(&mut next, mv, color);
            let score = -self.negaalpha(
                &next,
                color.opponent(),
                depth.map(|d| d - 1),
                -beta,
                -alpha,
            )?;
            best_score = best_score.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        Ok(best_score)
    }
}

fn positions(mut mask: u64) -> Vec<usize> {
    let mut out = Vec::new();
    while mask != 0 {
        out.push(mask.trailing_zeros() as usize);
        mask &= mask - 1;
    }
    out
}

/// Most promising first by one-ply evaluation, ties by square index.
fn sorted_moves(legal: u64, board: &Board, color: Color, evaluator: &Evaluator) -> Vec<usize> {
    let mut scored: Vec<(usize, i32)> = positions(legal)
        .into_iter()
        .map(|mv| {
            let mut next = *board;
            let _ = rules::place(&mut next, mv, color);
            (mv, -evaluator.evaluate(&next, color.opponent()))
        })
        .collect();

    scored.sort_by_key(|&(mv, score)| (std::cmp::Reverse(score), mv));
    scored.into_iter().map(|(mv, _)| mv).collect()
}
