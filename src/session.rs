//! Game session: the caller-side state around one board.
//!
//! Tracks the selected square and its legal moves, the game-over flag and
//! message, and whether the computer is thinking. AI moves are searched on a
//! worker thread with its own copy of the board; the result comes back over a
//! channel. Any change to the game while a search is in flight bumps the
//! session generation, and a result tagged with an older generation is
//! dropped instead of applied.

use crate::engine::{Board, Color, GameStatus, Move, PieceKind, Square};
use crate::error::{ChessError, ChessResult};
use crate::search::{ChessAi, Level, SearchReport};
use crossbeam_channel::{Receiver, TryRecvError};
use std::thread;
use tracing::{debug, info, warn};

/// Handle for a search running on a worker thread.
#[derive(Debug)]
pub struct AiRequest {
    receiver: Receiver<Option<SearchReport>>,
    generation: u64,
}

impl AiRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AiPoll {
    /// Still searching
    Pending,
    /// The move was applied to the session board
    Applied(Move),
    /// The game changed while searching; the result was dropped
    Discarded,
    /// The position had no legal move
    NoMove,
}

#[derive(Debug)]
pub struct GameSession {
    board: Board,
    ai: ChessAi,
    level: Level,
    human: Color,
    selected: Option<Square>,
    valid_moves: Vec<Move>,
    game_over: bool,
    message: String,
    ai_thinking: bool,
    generation: u64,
}

impl GameSession {
    pub fn new(level: Level, human: Color) -> Self {
        Self::with_ai(ChessAi::new(level), level, human)
    }

    /// Session with a caller-built AI, e.g. a seeded one.
    pub fn with_ai(ai: ChessAi, level: Level, human: Color) -> Self {
        Self {
            board: Board::new(),
            ai,
            level,
            human,
            selected: None,
            valid_moves: Vec::new(),
            game_over: false,
            message: String::new(),
            ai_thinking: false,
            generation: 0,
        }
    }

    pub fn start_new_game(&mut self, level: Level) {
        self.reset(Board::new(), level);
    }

    /// Continue from a recorded position.
    pub fn load_fen(&mut self, fen: &str) -> ChessResult<()> {
        let board = Board::from_fen(fen)?;
        self.reset(board, self.level);
        Ok(())
    }

    fn reset(&mut self, board: Board, level: Level) {
        if level != self.level {
            self.ai = ChessAi::new(level);
            self.level = level;
        }
        self.board = board;
        self.clear_selection();
        self.invalidate_search();
        self.refresh_status();
        info!(level = %self.level, human = %self.human, "new game");
    }

    /// Change difficulty without touching the position. A search still
    /// running at the old level is discarded.
    pub fn set_level(&mut self, level: Level) {
        self.ai = ChessAi::new(level);
        self.level = level;
        self.invalidate_search();
    }

    // Any pending worker result now belongs to an outdated game.
    fn invalidate_search(&mut self) {
        self.generation += 1;
        self.ai_thinking = false;
    }

    // =====================
    // Queries
    // =====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn valid_moves(&self) -> &[Move] {
        &self.valid_moves
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_ai_thinking(&self) -> bool {
        self.ai_thinking
    }

    pub fn is_ai_turn(&self) -> bool {
        !self.game_over && self.board.side_to_move() != self.human
    }

    // =====================
    // Human input
    // =====================

    /// Select a piece of the side to move and cache its legal moves. Any other
    /// square clears the selection.
    pub fn select(&mut self, square: Square) -> &[Move] {
        match self.board.piece_at(square) {
            Some(p) if p.color == self.board.side_to_move() && !self.game_over => {
                self.selected = Some(square);
                self.valid_moves = self.board.legal_moves_from(square);
            }
            _ => self.clear_selection(),
        }
        &self.valid_moves
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.valid_moves.clear();
    }

    /// True when moving the selected piece to `to` needs a promotion choice.
    pub fn needs_promotion(&self, to: Square) -> bool {
        self.valid_moves
            .iter()
            .any(|m| m.to == to && m.promotion.is_some())
    }

    /// Move the selected piece to `to`.
    pub fn move_selected_to(&mut self, to: Square, promotion: Option<PieceKind>) -> ChessResult<Move> {
        let from = self.selected.ok_or_else(|| ChessError::InvalidMove {
            input: format!("no piece selected for {}", to),
        })?;
        let mv = self
            .valid_moves
            .iter()
            .copied()
            .find(|m| m.matches(from, to, promotion))
            .ok_or_else(|| ChessError::IllegalMove {
                mv: format!("{}{}", from, to),
            })?;
        self.make_move(mv)?;
        Ok(mv)
    }

    pub fn make_move(&mut self, mv: Move) -> ChessResult<()> {
        if self.game_over {
            return Err(ChessError::IllegalMove { mv: mv.to_string() });
        }
        if self.ai_thinking {
            return Err(ChessError::SearchPending);
        }
        self.board.apply(mv)?;
        self.invalidate_search();
        self.clear_selection();
        self.refresh_status();
        debug!(%mv, status = ?self.board.game_status(), "move applied");
        Ok(())
    }

    /// Take back the last move, and the one before it if that leaves the
    /// computer to move. Returns the number of plies taken back.
    pub fn undo_move(&mut self) -> ChessResult<usize> {
        self.board.undo()?;
        let mut plies = 1;
        if self.board.history_len() > 0 && self.board.side_to_move() != self.human {
            self.board.undo()?;
            plies += 1;
        }
        self.invalidate_search();
        self.clear_selection();
        self.refresh_status();
        info!(plies, "moves taken back");
        Ok(plies)
    }

    fn refresh_status(&mut self) {
        let status = self.board.game_status();
        self.game_over = status.is_over();
        self.message = match status {
            GameStatus::Ongoing => String::new(),
            GameStatus::Checkmate { winner } => format!("Checkmate! {} wins!", winner),
            GameStatus::Stalemate => "Stalemate!".to_string(),
            GameStatus::DrawInsufficientMaterial => "Draw by insufficient material".to_string(),
            GameStatus::DrawSeventyFiveMoves => "Draw by seventy-five-move rule".to_string(),
            GameStatus::DrawFivefoldRepetition => "Draw by fivefold repetition".to_string(),
        };
        if self.game_over {
            info!(message = %self.message, "game over");
        }
    }

    // =====================
    // Computer moves
    // =====================

    /// Start a search on a worker thread if it is the computer's turn and no
    /// search is already running.
    pub fn request_ai_move(&mut self) -> Option<AiRequest> {
        if !self.is_ai_turn() || self.ai_thinking {
            return None;
        }
        let mut board = self.board.clone();
        let mut ai = self.ai.fork();
        let (sender, receiver) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let report = ai.search(&mut board);
            // receiver gone means the session no longer cares
            let _ = sender.send(report);
        });
        self.ai_thinking = true;
        debug!(generation = self.generation, "search started");
        Some(AiRequest {
            receiver,
            generation: self.generation,
        })
    }

    /// Apply the worker's move if it is ready.
    pub fn poll_ai_move(&mut self, request: &AiRequest) -> ChessResult<AiPoll> {
        match request.receiver.try_recv() {
            Ok(report) => self.finish_ai_move(request.generation, report),
            Err(TryRecvError::Empty) => Ok(AiPoll::Pending),
            Err(TryRecvError::Disconnected) => self.lost_worker(request.generation),
        }
    }

    /// Block until the worker answers, then apply its move.
    pub fn wait_ai_move(&mut self, request: AiRequest) -> ChessResult<AiPoll> {
        match request.receiver.recv() {
            Ok(report) => self.finish_ai_move(request.generation, report),
            Err(_) => self.lost_worker(request.generation),
        }
    }

    fn finish_ai_move(&mut self, generation: u64, report: Option<SearchReport>) -> ChessResult<AiPoll> {
        if generation != self.generation {
            warn!(
                request = generation,
                current = self.generation,
                "discarding search result for an outdated position"
            );
            return Ok(AiPoll::Discarded);
        }
        self.ai_thinking = false;
        match report {
            Some(report) => {
                self.make_move(report.best_move)?;
                Ok(AiPoll::Applied(report.best_move))
            }
            None => Ok(AiPoll::NoMove),
        }
    }

    fn lost_worker(&mut self, generation: u64) -> ChessResult<AiPoll> {
        if generation == self.generation {
            self.ai_thinking = false;
        }
        warn!("search worker exited without a result");
        Err(ChessError::SearchDisconnected)
    }
}

// =====================
// Tests
// =====================
