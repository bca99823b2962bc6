use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;
use std::time::Duration;

use web_time::Instant;

use crate::ai::eval::Evaluator;
use crate::ai::search::Searcher;
use crate::board::{BOARD_SIZE, Board};
use crate::error::SessionError;
use crate::game::GameState;
use crate::types::{Color, Move};

pub const MIN_STRENGTH: u8 = 1;
pub const MAX_STRENGTH: u8 = 7;

/// Cancellation token shared between the controller and a running search.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the running search to stop at its next node.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub strength: u8,
    pub completed_depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub interrupted: bool,
}

/// Plies searched per strength level.
pub fn search_depth(strength: u8) -> u8 {
    strength.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

/// Number of empty cells at or below which the search solves the game
/// exactly. Strengths below 4 never solve.
pub fn exact_solve_empties(strength: u8) -> u8 {
    match strength {
        0..=3 => 0,
        4 => 8,
        5 => 10,
        6 => 12,
        _ => 14,
    }
}

/// Move-selecting opponent. Holds only its strength and interrupt flag; every
/// call searches a private copy of the board it is given.
#[derive(Debug, Clone)]
pub struct Engine {
    strength: u8,
    interrupt: InterruptHandle,
    last_stats: SearchStats,
    spawned: u64,
}

impl Engine {
    pub fn new(strength: u8) -> Self {
        Self {
            strength: strength.clamp(MIN_STRENGTH, MAX_STRENGTH),
            interrupt: InterruptHandle::new(),
            last_stats: SearchStats::default(),
            spawned: 0,
        }
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    /// Clamps to 1..=7. Applies from the next computation on.
    pub fn set_strength(&mut self, level: u8) {
        self.strength = level.clamp(MIN_STRENGTH, MAX_STRENGTH);
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn set_interrupt(&self, interrupt: bool) {
        if interrupt {
            self.interrupt.interrupt();
        } else {
            self.interrupt.clear();
        }
    }

    pub fn interrupted(&self) -> bool {
        self.interrupt.is_set()
    }

    pub fn last_stats(&self) -> SearchStats {
        self.last_stats
    }

    /// Best move for the side to move in `game`, or `Move::NONE` when it is
    /// blocked. Returns early with the best move known so far if interrupted.
    pub fn compute_move(&mut self, game: &GameState, competitive: bool) -> Move {
        let (mv, stats) = compute(
            *game.board(),
            game.to_move(),
            self.strength,
            competitive,
            self.interrupt.flag(),
        );
        self.last_stats = stats;
        mv
    }

    /// Clears a pending interrupt and computes a full answer from scratch.
    pub fn continue_move(&mut self, game: &GameState, competitive: bool) -> Move {
        self.interrupt.clear();
        self.compute_move(game, competitive)
    }

    /// Advisory move for the side to move. Never touches `game`.
    pub fn get_hint(&mut self, game: &GameState, competitive: bool) -> Move {
        self.compute_move(game, competitive)
    }

    /// Runs the search on a worker thread against a snapshot of `game`. Every
    /// task gets a new id.
    pub fn spawn(&mut self, game: &GameState, competitive: bool) -> SearchTask {
        let board = *game.board();
        let color = game.to_move();
        let strength = self.strength;
        let handle = self.interrupt.clone();
        let worker_handle = handle.clone();
        let (tx, rx) = channel();

        thread::spawn(move || {
            let result = compute(board, color, strength, competitive, worker_handle.flag());
            let _ = tx.send(result);
        });

        self.spawned += 1;
        SearchTask {
            id: self.spawned,
            receiver: rx,
            interrupt: handle,
        }
    }

    /// Stops any search holding the current token and hands out a fresh one.
    /// Handles cloned earlier no longer reach this engine.
    pub(crate) fn abandon_search(&mut self) {
        self.interrupt.interrupt();
        self.interrupt = InterruptHandle::new();
    }

    pub(crate) fn record(&mut self, stats: SearchStats) {
        self.last_stats = stats;
    }
}

/// A search running on a worker thread.
pub struct SearchTask {
    id: u64,
    receiver: Receiver<(Move, SearchStats)>,
    interrupt: InterruptHandle,
}

impl SearchTask {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    /// Non-blocking check for the result.
    pub fn try_result(&self) -> Result<Option<(Move, SearchStats)>, SessionError> {
        match self.receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SessionError::WorkerLost),
        }
    }

    /// Blocks until the worker delivers its move.
    pub fn wait(self) -> Result<(Move, SearchStats), SessionError> {
        self.receiver.recv().map_err(|_| SessionError::WorkerLost)
    }
}

fn compute(
    board: Board,
    color: Color,
    strength: u8,
    competitive: bool,
    interrupt: &AtomicBool,
) -> (Move, SearchStats) {
    let started = Instant::now();
    let evaluator = Evaluator::new(strength, competitive);
    let mut searcher = Searcher::new(&evaluator, interrupt, search_depth(strength))
        .with_exact_solve(exact_solve_empties(strength));

    let mv = match searcher.search(&board, color) {
        Some(pos) => Move::new((pos / BOARD_SIZE) as i8, (pos % BOARD_SIZE) as i8, color),
        None => Move::NONE,
    };
    let stats = SearchStats {
        strength,
        completed_depth: searcher.completed_depth(),
        nodes: searcher.nodes(),
        elapsed: started.elapsed(),
        interrupted: searcher.interrupted(),
    };

    log::debug!(
        "search for {color:?} at strength {strength}: ({}, {}) depth {} nodes {} in {:?}{}",
        mv.row,
        mv.col,
        stats.completed_depth,
        stats.nodes,
        stats.elapsed,
        if stats.interrupted { " (interrupted)" } else { "" }
    );

    (mv, stats)
}
