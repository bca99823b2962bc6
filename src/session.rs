use serde::{Deserialize, Serialize};

use crate::ai::{Engine, InterruptHandle, SearchStats, SearchTask};
use crate::error::{GameError, RestoreError, SessionError, SettingsError};
use crate::game::GameState;
use crate::notify::NotificationSink;
use crate::persist::SavedGame;
use crate::settings::Settings;
use crate::types::{Color, Move, ScoreReport, StateView};

/// `GameOver` is terminal; only a new game or a restore leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Ready,
    Thinking,
    Hint,
    /// The engine was interrupted; its partial result is kept until the
    /// computation is continued.
    Interrupted,
    GameOver,
}

/// Result of [`Session::finish_thinking`] and [`Session::poll_thinking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkOutcome {
    HumanToMove,
    /// The human is blocked; start another search.
    ComputerToMove,
    Interrupted,
    GameOver,
}

pub struct Session<S: NotificationSink> {
    game: GameState,
    engine: Engine,
    sink: S,
    state: SessionState,
    human_color: Color,
    competitive: bool,
    competitive_choice: bool,
    cheating: bool,
    lowest_strength: u8,
    hint: Option<Move>,
    partial: Option<Move>,
    /// Id of the worker task whose result is awaited.
    thinking: Option<u64>,
}

impl<S: NotificationSink> Session<S> {
    /// Builds a session and starts the first game.
    pub fn new(settings: Settings, sink: S) -> Result<Self, SessionError> {
        settings.validate()?;
        let mut session = Self {
            game: GameState::new(),
            engine: Engine::new(settings.strength),
            sink,
            state: SessionState::Ready,
            human_color: settings.human_color,
            competitive: settings.competitive,
            competitive_choice: settings.competitive,
            cheating: false,
            lowest_strength: settings.strength,
            hint: None,
            partial: None,
            thinking: None,
        };
        session.new_game()?;
        Ok(session)
    }

    pub fn new_game(&mut self) -> Result<(), SessionError> {
        if self.is_playing() {
            log::info!("abandoning game at move {}", self.game.move_number());
        }
        self.stop_worker();
        self.engine.set_interrupt(false);
        self.game.reset();
        self.cheating = false;
        self.competitive = self.competitive_choice;
        self.lowest_strength = self.engine.strength();
        self.hint = None;
        self.partial = None;
        self.state = SessionState::Ready;
        log::info!(
            "new game: human {:?}, strength {}, competitive {}",
            self.human_color,
            self.engine.strength(),
            self.competitive
        );
        self.settle_turn()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn human_color(&self) -> Color {
        self.human_color
    }

    pub fn computer_color(&self) -> Color {
        self.human_color.opponent()
    }

    pub fn is_computers_turn(&self) -> bool {
        self.game.to_move() == self.computer_color()
    }

    pub fn strength(&self) -> u8 {
        self.engine.strength()
    }

    pub fn lowest_strength(&self) -> u8 {
        self.lowest_strength
    }

    pub fn competitive(&self) -> bool {
        self.competitive
    }

    pub fn cheating(&self) -> bool {
        self.cheating
    }

    /// The hint on display, if any.
    pub fn hint(&self) -> Option<Move> {
        self.hint
    }

    /// Best move known when the engine was interrupted.
    pub fn partial_move(&self) -> Option<Move> {
        self.partial
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.engine.interrupt_handle()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn is_playing(&self) -> bool {
        self.game.move_number() > 0 && self.state != SessionState::GameOver
    }

    /// Changes the engine strength. During a game the lowest strength used
    /// is tracked for scoring; it never goes back up until the next game.
    pub fn set_strength(&mut self, level: u8) {
        self.engine.set_strength(level);
        let strength = self.engine.strength();
        if self.state != SessionState::GameOver {
            self.lowest_strength = self.lowest_strength.min(strength);
        }
    }

    /// Turning competitive play off downgrades the running game at once;
    /// turning it on only affects the next game.
    pub fn set_competitive(&mut self, competitive: bool) {
        self.competitive_choice = competitive;
        if !competitive && self.competitive {
            log::info!("game downgraded to non-competitive");
            self.competitive = false;
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        self.set_strength(settings.strength);
        self.set_competitive(settings.competitive);
        Ok(())
    }

    /// Places a human chip. A displayed hint is dismissed first.
    pub fn human_move(&mut self, row: i8, col: i8) -> Result<(), SessionError> {
        let mv = Move::new(row, col, self.human_color);
        match self.state {
            SessionState::Ready => {}
            SessionState::Hint => self.dismiss_hint(),
            SessionState::GameOver => return Err(SessionError::GameOver),
            state => {
                self.reject(mv);
                return Err(SessionError::NotReady(state));
            }
        }

        if self.game.to_move() != self.human_color {
            self.reject(mv);
            return Err(GameError::WrongTurn {
                expected: self.game.to_move(),
                got: self.human_color,
            }
            .into());
        }
        if mv.square().is_none() {
            self.reject(mv);
            return Err(GameError::OutOfBounds { row, col }.into());
        }
        if !self.game.move_is_legal(&mv) {
            self.reject(mv);
            return Err(GameError::illegal(mv).into());
        }

        let changed = self.game.make_move(&mv)?;
        self.sink.move_applied(changed);
        self.settle_turn()
    }

    /// Lets the computer play until the human can move or the game ends.
    pub fn computer_move(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Hint => self.dismiss_hint(),
            SessionState::GameOver => return Err(SessionError::GameOver),
            state => return Err(SessionError::NotReady(state)),
        }
        let computer = self.computer_color();
        if self.game.to_move() != computer {
            return Err(GameError::WrongTurn {
                expected: self.game.to_move(),
                got: computer,
            }
            .into());
        }

        self.sink.turn_changed(computer);
        loop {
            if !self.game.move_is_possible(computer) || !self.game.move_is_at_all_possible() {
                break;
            }

            self.state = SessionState::Thinking;
            let mv = self.engine.compute_move(&self.game, self.competitive);
            if self.engine.last_stats().interrupted {
                self.park_interrupted(mv);
                return Ok(());
            }
            self.engine.set_interrupt(false);
            if mv.is_none() {
                break;
            }

            self.apply_computer_move(&mv)?;
            if !self.game.skip_turn() {
                break;
            }
            log::info!("{:?} is blocked and passes", self.human_color);
        }
        self.settle_turn()
    }

    /// Starts a computer search on a worker thread. From `Interrupted` this
    /// continues the interrupted computation from scratch.
    pub fn start_thinking(&mut self) -> Result<SearchTask, SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Interrupted => {
                self.engine.set_interrupt(false);
                self.partial = None;
            }
            SessionState::GameOver => return Err(SessionError::GameOver),
            state => return Err(SessionError::NotReady(state)),
        }
        let computer = self.computer_color();
        if self.game.to_move() != computer {
            return Err(GameError::WrongTurn {
                expected: self.game.to_move(),
                got: computer,
            }
            .into());
        }

        self.sink.turn_changed(computer);
        self.state = SessionState::Thinking;
        let task = self.engine.spawn(&self.game, self.competitive);
        self.thinking = Some(task.id());
        Ok(task)
    }

    /// Waits for `task` and applies its move. The game is not touched while
    /// the task runs because every mutating call requires `Ready`.
    pub fn finish_thinking(&mut self, task: SearchTask) -> Result<ThinkOutcome, SessionError> {
        self.check_task(&task)?;
        let result = task.wait();
        self.complete_thinking(result)
    }

    /// Non-blocking form of [`Session::finish_thinking`]: `None` while the
    /// worker is still searching.
    pub fn poll_thinking(
        &mut self,
        task: &SearchTask,
    ) -> Result<Option<ThinkOutcome>, SessionError> {
        self.check_task(task)?;
        match task.try_result() {
            Ok(None) => Ok(None),
            Ok(Some(result)) => self.complete_thinking(Ok(result)).map(Some),
            Err(err) => self.complete_thinking(Err(err)).map(Some),
        }
    }

    fn check_task(&self, task: &SearchTask) -> Result<(), SessionError> {
        if self.thinking != Some(task.id()) {
            return Err(SessionError::StaleTask(task.id()));
        }
        Ok(())
    }

    fn complete_thinking(
        &mut self,
        result: Result<(Move, SearchStats), SessionError>,
    ) -> Result<ThinkOutcome, SessionError> {
        self.thinking = None;
        let (mv, stats) = match result {
            Ok(result) => result,
            Err(err) => {
                self.state = SessionState::Ready;
                return Err(err);
            }
        };
        self.engine.record(stats);
        if stats.interrupted {
            self.park_interrupted(mv);
            return Ok(ThinkOutcome::Interrupted);
        }
        self.engine.set_interrupt(false);

        if !mv.is_none() {
            self.apply_computer_move(&mv)?;
        }
        if !self.game.move_is_at_all_possible() {
            self.finish_game();
            return Ok(ThinkOutcome::GameOver);
        }
        self.game.skip_turn();
        self.state = SessionState::Ready;
        if self.is_computers_turn() {
            return Ok(ThinkOutcome::ComputerToMove);
        }
        self.sink.turn_changed(self.human_color);
        Ok(ThinkOutcome::HumanToMove)
    }

    /// Asks the engine to stop. Takes effect at its next node.
    pub fn interrupt(&self) {
        self.engine.set_interrupt(true);
    }

    /// Continues an interrupted computer turn with a full-strength search.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Interrupted {
            return Err(SessionError::NotInterrupted);
        }
        self.engine.set_interrupt(false);
        self.partial = None;
        self.state = SessionState::Ready;
        self.computer_move()
    }

    /// Computes an advisory move for the human. Nothing is played.
    pub fn request_hint(&mut self) -> Result<Move, SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::GameOver => return Err(SessionError::GameOver),
            state => return Err(SessionError::NotReady(state)),
        }

        self.state = SessionState::Thinking;
        let mv = self.engine.get_hint(&self.game, self.competitive);
        self.engine.set_interrupt(false);
        if mv.is_none() {
            self.state = SessionState::Ready;
        } else {
            self.hint = Some(mv);
            self.state = SessionState::Hint;
        }
        Ok(mv)
    }

    pub fn dismiss_hint(&mut self) {
        if self.state == SessionState::Hint {
            self.hint = None;
            self.state = SessionState::Ready;
        }
    }

    /// Takes back the trailing run of moves by the last mover and the move
    /// before it. If that leaves the computer on turn, it moves again.
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Hint => self.dismiss_hint(),
            state => return Err(SessionError::NotReady(state)),
        }
        let Some(last) = self.game.last_move() else {
            return Ok(false);
        };

        let mut undone = 0;
        while self.game.last_move().is_some_and(|mv| mv.color == last.color) {
            self.game.take_back_move()?;
            undone += 1;
        }
        if self.game.can_undo() {
            self.game.take_back_move()?;
            undone += 1;
        }
        log::info!("undid {undone} moves, back to move {}", self.game.move_number());

        self.settle_turn()?;
        Ok(true)
    }

    /// Swaps colors with the computer. After the first move this disqualifies
    /// the game from high scores.
    pub fn switch_sides(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Hint => self.dismiss_hint(),
            state => return Err(SessionError::NotReady(state)),
        }
        if self.game.move_number() != 0 {
            self.cheating = true;
        }
        self.human_color = self.human_color.opponent();
        log::info!("sides switched, human now plays {:?}", self.human_color);
        self.settle_turn()
    }

    pub fn score_report(&self) -> ScoreReport {
        let human = self.game.score(self.human_color);
        let computer = self.game.score(self.computer_color());
        let winner = match human.cmp(&computer) {
            std::cmp::Ordering::Greater => self.human_color,
            std::cmp::Ordering::Less => self.computer_color(),
            std::cmp::Ordering::Equal => Color::None,
        };
        ScoreReport {
            human,
            computer,
            winner,
            competitive: self.competitive,
            cheating: self.cheating,
            lowest_strength: self.lowest_strength,
        }
    }

    pub fn view(&self) -> StateView {
        let (a_count, b_count) = self.game.board().count();
        StateView {
            board: self.game.board().to_array().to_vec(),
            to_move: self.game.to_move(),
            move_number: self.game.move_number(),
            a_count,
            b_count,
            human_color: self.human_color,
            is_game_over: self.state == SessionState::GameOver,
            changed: self.game.changed_chips().clone(),
        }
    }

    /// Snapshot of the game for persistence. A pending hint or search is not
    /// saved.
    pub fn save(&self) -> SavedGame {
        let state = match self.state {
            SessionState::Hint | SessionState::Thinking => SessionState::Ready,
            state => state,
        };
        SavedGame::new(
            self.game.moves(),
            self.human_color,
            self.competitive,
            self.engine.strength(),
            state,
        )
    }

    /// Replays a saved game from the starting position.
    ///
    /// Replay stops at the first illegal move; the moves before it stay
    /// applied and the error reports how many there were. After such a stop
    /// the computer does not move on its own, even when it is on turn.
    pub fn restore(&mut self, saved: &SavedGame) -> Result<(), RestoreError> {
        saved.verify()?;
        self.stop_worker();

        self.game.reset();
        self.hint = None;
        self.partial = None;
        self.cheating = false;
        self.human_color = saved.human_color;
        self.competitive = saved.competitive;
        self.engine.set_strength(saved.strength);
        self.lowest_strength = self.engine.strength();
        self.engine.set_interrupt(false);
        self.state = SessionState::Ready;

        for (index, mv) in saved.moves.iter().enumerate() {
            if mv.color != self.game.to_move() {
                self.game.skip_turn();
            }
            if let Err(err) = self.game.make_move(mv) {
                log::warn!("saved move #{index} rejected: {err}");
                self.settle_without_playing();
                return Err(RestoreError::CorruptedSaveData {
                    index,
                    applied: index,
                });
            }
        }
        log::info!("restored {} moves", saved.moves.len());
        // An interrupted computer turn is continued with a fresh search.
        if saved.state == SessionState::Interrupted && self.is_computers_turn() {
            log::info!("continuing interrupted computer turn");
        }
        if let Err(err) = self.settle_turn() {
            log::warn!("could not resume restored game: {err}");
        }
        Ok(())
    }

    /// Like `settle_turn`, but leaves a computer turn for the caller to start.
    fn settle_without_playing(&mut self) {
        if !self.game.move_is_at_all_possible() {
            self.finish_game();
            return;
        }
        self.game.skip_turn();
        self.state = SessionState::Ready;
        self.sink.turn_changed(self.game.to_move());
    }

    /// A search still running on a worker is cut loose; its result will be
    /// refused by `finish_thinking`.
    fn stop_worker(&mut self) {
        if self.thinking.take().is_some() {
            self.engine.abandon_search();
        }
    }

    fn reject(&mut self, mv: Move) {
        log::warn!("illegal move at ({}, {})", mv.row, mv.col);
        self.sink.illegal_move(mv);
    }

    fn park_interrupted(&mut self, mv: Move) {
        log::info!("computer interrupted, best so far ({}, {})", mv.row, mv.col);
        self.partial = (!mv.is_none()).then_some(mv);
        self.state = SessionState::Interrupted;
    }

    fn apply_computer_move(&mut self, mv: &Move) -> Result<(), SessionError> {
        let changed = self.game.make_move(mv)?;
        self.sink.move_applied(changed);
        Ok(())
    }

    /// Decides who acts next: ends the game, passes a blocked side, or hands
    /// the turn to the computer or the human.
    fn settle_turn(&mut self) -> Result<(), SessionError> {
        if !self.game.move_is_at_all_possible() {
            self.finish_game();
            return Ok(());
        }
        if self.game.skip_turn() {
            log::info!("{:?} is blocked and passes", self.game.to_move().opponent());
        }
        self.state = SessionState::Ready;
        if self.is_computers_turn() {
            return self.computer_move();
        }
        self.sink.turn_changed(self.human_color);
        Ok(())
    }

    fn finish_game(&mut self) {
        self.state = SessionState::GameOver;
        let report = self.score_report();
        log::info!(
            "game over: human {} computer {} winner {:?}",
            report.human,
            report.computer,
            report.winner
        );
        self.sink.game_over(&report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::notify::{EventLog, SessionEvent};

    const FULL_BOARD: u64 = u64::MAX;

    fn bit(row: usize, col: usize) -> u64 {
        1u64 << (row * 8 + col)
    }

    fn settings(strength: u8, human_color: Color) -> Settings {
        Settings {
            strength,
            competitive: true,
            human_color,
        }
    }

    fn session(strength: u8) -> Session<EventLog> {
        Session::new(settings(strength, Color::A), EventLog::new()).unwrap()
    }

    #[test]
    fn new_session_waits_for_the_human_who_plays_first() {
        let session = session(2);

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.game().to_move(), Color::A);
        assert_eq!(session.sink().events(), &[SessionEvent::Turn(Color::A)]);
    }

    #[test]
    fn computer_opens_when_human_plays_second() {
        let session = Session::new(settings(2, Color::B), EventLog::new()).unwrap();

        assert_eq!(session.game().move_number(), 1);
        assert_eq!(session.game().to_move(), Color::B);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn human_move_triggers_the_computer_reply() {
        let mut session = session(2);

        session.human_move(2, 3).unwrap();

        assert_eq!(session.game().move_number(), 2);
        assert_eq!(session.game().to_move(), Color::A);
        assert_eq!(session.state(), SessionState::Ready);
        let applied = session
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::MoveApplied(_)))
            .count();
        assert_eq!(applied, 2);
    }

    #[test]
    fn illegal_human_move_is_reported_and_changes_nothing() {
        let mut session = session(2);
        let before = session.game().clone();

        let err = session.human_move(0, 0).unwrap_err();

        assert!(matches!(err, SessionError::Game(GameError::IllegalMove { .. })));
        assert_eq!(session.game(), &before);
        assert_eq!(
            session.sink().events().last(),
            Some(&SessionEvent::IllegalMove(Move::new(0, 0, Color::A)))
        );
    }

    #[test]
    fn undo_rewinds_to_the_previous_human_decision() {
        let mut session = session(2);
        session.human_move(2, 3).unwrap();
        let before_second = session.game().clone();
        let mv = session.game().legal_moves()[0];
        session.human_move(mv.row, mv.col).unwrap();

        assert!(session.undo().unwrap());

        assert_eq!(session.game().board(), before_second.board());
        assert_eq!(session.game().move_number(), before_second.move_number());
        assert_eq!(session.game().to_move(), Color::A);
    }

    #[test]
    fn undo_removes_a_whole_computer_run() {
        // Row 0: _ B A; rows 4 and 7: _ A B B B B B B. After A takes (0,0),
        // B plays (7,0), A is blocked, and B plays (4,0).
        let mut session = session(1);
        let a = bit(0, 2) | bit(4, 1) | bit(7, 1);
        let b = bit(0, 1) | (0xfc << 32) | (0xfc << 56);
        let start = Board::from_bitboards(a, b);
        session.game.set_board_for_test(start, Color::A);

        session.game.make_move(&Move::new(0, 0, Color::A)).unwrap();
        session.game.make_move(&Move::new(7, 0, Color::B)).unwrap();
        assert!(session.game.skip_turn());
        session.game.make_move(&Move::new(4, 0, Color::B)).unwrap();
        assert_eq!(session.game().move_number(), 3);

        assert!(session.undo().unwrap());

        assert_eq!(session.game().board(), &start);
        assert_eq!(session.game().move_number(), 0);
        assert_eq!(session.game().to_move(), Color::A);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn undo_after_a_blocked_computer_takes_back_both_human_moves() {
        // The computer plays A here: A takes (0,0), the human B plays (7,0),
        // A is blocked, and B plays (4,0).
        let mut session = Session::new(settings(1, Color::B), EventLog::new()).unwrap();
        let a = bit(0, 2) | bit(4, 1) | bit(7, 1);
        let b = bit(0, 1) | (0xfc << 32) | (0xfc << 56);
        let start = Board::from_bitboards(a, b);
        session.game.set_board_for_test(start, Color::A);

        session.game.make_move(&Move::new(0, 0, Color::A)).unwrap();
        session.game.make_move(&Move::new(7, 0, Color::B)).unwrap();
        assert!(session.game.skip_turn());
        session.game.make_move(&Move::new(4, 0, Color::B)).unwrap();

        assert!(session.undo().unwrap());

        // Both B moves and the A move before them are gone; A replays (0,0).
        assert_eq!(session.game().move_number(), 1);
        assert_eq!(session.game().last_move(), Some(Move::new(0, 0, Color::A)));
        assert_eq!(session.game().to_move(), Color::B);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn undo_on_fresh_game_does_nothing() {
        let mut session = session(1);
        assert!(!session.undo().unwrap());
    }

    #[test]
    fn hint_is_advisory_and_dismissable() {
        let mut session = session(3);

        let hint = session.request_hint().unwrap();

        assert!(session.game().move_is_legal(&hint));
        assert_eq!(session.state(), SessionState::Hint);
        assert_eq!(session.game().move_number(), 0);

        session.dismiss_hint();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.hint(), None);
    }

    #[test]
    fn human_move_during_hint_dismisses_it_first() {
        let mut session = session(1);
        session.request_hint().unwrap();

        session.human_move(2, 3).unwrap();

        assert_eq!(session.hint(), None);
        assert_eq!(session.game().move_number(), 2);
    }

    #[test]
    fn interrupted_computer_turn_parks_until_resumed() {
        let mut session = Session::new(settings(7, Color::A), EventLog::new()).unwrap();
        session.interrupt();

        session.human_move(2, 3).unwrap();

        assert_eq!(session.state(), SessionState::Interrupted);
        assert_eq!(session.game().move_number(), 1);
        let partial = session.partial_move().unwrap();
        assert!(session.game().move_is_legal(&partial));

        let err = session.human_move(2, 2).unwrap_err();
        assert!(matches!(err, SessionError::NotReady(SessionState::Interrupted)));

        session.set_strength(1);
        session.resume().unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.game().move_number(), 2);
        assert_eq!(session.partial_move(), None);
    }

    #[test]
    fn resume_requires_an_interrupted_turn() {
        let mut session = session(1);
        assert!(matches!(session.resume(), Err(SessionError::NotInterrupted)));
    }

    #[test]
    fn threaded_thinking_applies_the_computer_move() {
        let mut session = session(2);
        session.switch_sides().unwrap();
        // Switching before the first move is free; the computer now plays A.
        assert!(!session.cheating());
        assert_eq!(session.game().move_number(), 1);

        let mv = session.game().legal_moves()[0];
        session.game.make_move(&mv).unwrap();
        session.state = SessionState::Ready;

        let task = session.start_thinking().unwrap();
        assert_eq!(session.state(), SessionState::Thinking);
        assert!(matches!(
            session.human_move(0, 0),
            Err(SessionError::NotReady(SessionState::Thinking))
        ));

        let outcome = session.finish_thinking(task).unwrap();
        assert_eq!(outcome, ThinkOutcome::HumanToMove);
        assert_eq!(session.game().move_number(), 3);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn polling_delivers_the_computer_move() {
        let mut session = Session::new(settings(2, Color::B), EventLog::new()).unwrap();
        let mv = session.game().legal_moves()[0];
        session.game.make_move(&mv).unwrap();

        let task = session.start_thinking().unwrap();
        let outcome = loop {
            if let Some(outcome) = session.poll_thinking(&task).unwrap() {
                break outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        };

        assert_eq!(outcome, ThinkOutcome::HumanToMove);
        assert_eq!(session.game().move_number(), 3);
        assert!(matches!(
            session.poll_thinking(&task),
            Err(SessionError::StaleTask(_))
        ));
    }

    #[test]
    fn result_of_an_abandoned_task_is_refused() {
        let mut session = session(2);
        session.interrupt();
        session.human_move(2, 3).unwrap();
        let abandoned = session.start_thinking().unwrap();

        session.new_game().unwrap();
        session.interrupt();
        session.human_move(3, 2).unwrap();
        assert_eq!(session.state(), SessionState::Interrupted);
        let current = session.start_thinking().unwrap();
        assert!(matches!(
            session.start_thinking(),
            Err(SessionError::NotReady(SessionState::Thinking))
        ));

        assert!(matches!(
            session.finish_thinking(abandoned),
            Err(SessionError::StaleTask(_))
        ));
        assert_eq!(session.game().move_number(), 1);
        assert_eq!(session.state(), SessionState::Thinking);

        let outcome = session.finish_thinking(current).unwrap();
        assert_eq!(outcome, ThinkOutcome::HumanToMove);
        assert_eq!(session.game().move_number(), 2);
    }

    #[test]
    fn switching_sides_mid_game_is_cheating() {
        let mut session = session(1);
        session.human_move(2, 3).unwrap();

        session.switch_sides().unwrap();

        assert!(session.cheating());
        assert_eq!(session.human_color(), Color::B);
        assert!(!session.score_report().eligible_for_highscore());
    }

    #[test]
    fn lowest_strength_only_goes_down_during_a_game() {
        let mut session = session(4);

        session.set_strength(6);
        assert_eq!(session.lowest_strength(), 4);
        session.set_strength(2);
        assert_eq!(session.lowest_strength(), 2);
        session.set_strength(5);
        assert_eq!(session.lowest_strength(), 2);

        session.new_game().unwrap();
        assert_eq!(session.lowest_strength(), 5);
    }

    #[test]
    fn competitive_can_be_downgraded_but_not_upgraded_mid_game() {
        let mut session = Session::new(
            Settings {
                strength: 1,
                competitive: false,
                human_color: Color::A,
            },
            EventLog::new(),
        )
        .unwrap();

        session.set_competitive(true);
        assert!(!session.competitive());
        session.new_game().unwrap();
        assert!(session.competitive());

        session.set_competitive(false);
        assert!(!session.competitive());
    }

    #[test]
    fn finished_game_reports_scores_once_and_is_terminal() {
        let mut session = session(1);
        // A takes (0,0) and fills the board; nobody can move afterwards.
        let a = bit(0, 2);
        let b = FULL_BOARD ^ bit(0, 0) ^ a;
        session
            .game
            .set_board_for_test(Board::from_bitboards(a, b), Color::A);

        session.human_move(0, 0).unwrap();

        assert_eq!(session.state(), SessionState::GameOver);
        let report = session.score_report();
        assert_eq!(report.human, 3);
        assert_eq!(report.computer, 61);
        assert_eq!(report.winner, Color::B);
        assert!(report.eligible_for_highscore());
        let overs = session
            .sink()
            .events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::GameOver(_)))
            .count();
        assert_eq!(overs, 1);
        assert!(matches!(session.human_move(1, 1), Err(SessionError::GameOver)));
        assert!(matches!(session.undo(), Err(SessionError::NotReady(SessionState::GameOver))));
    }

    #[test]
    fn save_and_restore_reproduce_the_game() {
        let mut session = session(2);
        session.human_move(2, 3).unwrap();
        let mv = session.game().legal_moves()[0];
        session.human_move(mv.row, mv.col).unwrap();
        let saved = session.save();
        let expected = session.game().clone();

        let mut restored = Session::new(settings(5, Color::B), EventLog::new()).unwrap();
        restored.restore(&saved).unwrap();

        assert_eq!(restored.game().board(), expected.board());
        assert_eq!(restored.game().to_move(), expected.to_move());
        assert_eq!(restored.game().move_number(), expected.move_number());
        assert_eq!(restored.human_color(), Color::A);
        assert_eq!(restored.strength(), 2);
        assert_eq!(restored.state(), SessionState::Ready);
    }

    #[test]
    fn restoring_an_interrupted_save_finishes_the_computer_turn() {
        let mut original = session(3);
        original.interrupt();
        original.human_move(2, 3).unwrap();
        let saved = original.save();
        assert_eq!(saved.state, SessionState::Interrupted);

        let mut restored = session(1);
        restored.restore(&saved).unwrap();

        assert_eq!(restored.state(), SessionState::Ready);
        assert_eq!(restored.game().move_number(), 2);
        assert_eq!(restored.game().to_move(), Color::A);
    }

    #[test]
    fn view_reflects_the_last_move() {
        let mut session = session(1);
        assert_eq!(session.view().a_count, 2);
        assert!(session.view().changed.is_empty());

        session.human_move(2, 3).unwrap();
        let view = session.view();

        assert_eq!(view.move_number, 2);
        assert_eq!(view.a_count + view.b_count, 6);
        assert_eq!(view.changed[0].color, Color::B);
        assert_eq!(view.board.len(), 64);
        assert!(!view.is_game_over);
    }

    #[test]
    fn restore_stops_at_the_first_illegal_move() {
        let moves = vec![
            Move::new(2, 3, Color::A),
            Move::new(2, 2, Color::B),
            Move::new(0, 0, Color::A),
            Move::new(3, 2, Color::A),
        ];
        let saved = SavedGame::new(moves, Color::A, false, 1, SessionState::Ready);
        let mut session = session(1);

        let err = session.restore(&saved).unwrap_err();

        assert!(matches!(
            err,
            RestoreError::CorruptedSaveData {
                index: 2,
                applied: 2
            }
        ));
        assert_eq!(session.game().move_number(), 2);
        assert_eq!(session.game().to_move(), Color::A);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn failed_restore_leaves_the_computer_turn_unplayed() {
        // The second A move is out of turn while B still has moves.
        let moves = vec![Move::new(2, 3, Color::A), Move::new(0, 0, Color::A)];
        let saved = SavedGame::new(moves, Color::A, false, 1, SessionState::Ready);
        let mut session = session(1);

        let err = session.restore(&saved).unwrap_err();

        assert!(matches!(
            err,
            RestoreError::CorruptedSaveData {
                index: 1,
                applied: 1
            }
        ));
        assert_eq!(session.game().move_number(), 1);
        assert_eq!(session.game().to_move(), Color::B);
        assert_eq!(session.state(), SessionState::Ready);

        session.computer_move().unwrap();
        assert_eq!(session.game().move_number(), 2);
    }

    #[test]
    fn restore_rejects_tampered_saves_without_touching_the_game() {
        let mut session = session(1);
        session.human_move(2, 3).unwrap();
        let mut saved = session.save();
        saved.moves.pop();
        let before = session.game().clone();

        let err = session.restore(&saved).unwrap_err();

        assert!(matches!(err, RestoreError::ChecksumMismatch { .. }));
        assert_eq!(session.game(), &before);
    }
}
