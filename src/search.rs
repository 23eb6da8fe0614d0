//! Move search.
//!
//! Fixed-depth minimax with alpha-beta pruning over the rules engine, scored
//! by material plus an optional centre bonus. White is the maximising side.
//!
//! Difficulty levels trade depth for randomness:
//!
//! | Level        | Depth | Random move | Centre bonus |
//! |--------------|-------|-------------|--------------|
//! | beginner     | 1     | 40%         | no           |
//! | intermediate | 3     | 10%         | no           |
//! | advanced     | 4     | 0%          | yes          |
//!
//! The search never fails outward. If it hits an internal error (a failed
//! undo, or a board not handed back in the state it was received) it logs a
//! warning and plays a uniformly random legal move instead.

use crate::engine::{Board, Color, GameStatus, Move, PieceKind, Square};
use crate::error::{ChessError, ChessResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Score of a checkmate, positive when White delivered it.
pub const MATE_SCORE: i32 = 99_999;
pub const CENTRE_BONUS: i32 = 20;
const CENTRE: [Square; 4] = [Square::D4, Square::E4, Square::D5, Square::E5];

// =====================
// Difficulty
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Level {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn name(self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    pub fn config(self) -> SearchConfig {
        match self {
            Level::Beginner => SearchConfig {
                depth: 1,
                randomness: 0.4,
                centre_bonus: false,
            },
            Level::Intermediate => SearchConfig {
                depth: 3,
                randomness: 0.1,
                centre_bonus: false,
            },
            Level::Advanced => SearchConfig {
                depth: 4,
                randomness: 0.0,
                centre_bonus: true,
            },
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<Level> {
        let wanted = s.trim();
        Level::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ChessError::UnknownLevel {
                input: s.to_string(),
            })
    }
}

/// Search parameters behind a level.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SearchConfig {
    /// Plies searched, counting the root move.
    pub depth: u32,
    /// Probability of skipping the search and playing a random legal move.
    pub randomness: f64,
    /// Score occupied d4/e4/d5/e5 squares.
    pub centre_bonus: bool,
}

impl SearchConfig {
    pub fn validate(&self) -> ChessResult<()> {
        if self.depth == 0 {
            return Err(ChessError::InvalidConfig {
                reason: "depth must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.randomness) {
            return Err(ChessError::InvalidConfig {
                reason: format!("randomness {} outside 0..=1", self.randomness),
            });
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Level::default().config()
    }
}

// =====================
// Evaluation
// =====================

pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 20000,
    }
}

/// Static score from White's point of view.
pub fn evaluate(board: &Board, centre_bonus: bool) -> i32 {
    score_position(board, board.game_status(), centre_bonus)
}

fn score_position(board: &Board, status: GameStatus, centre_bonus: bool) -> i32 {
    match status {
        // the side to move is the one that got mated
        GameStatus::Checkmate { .. } => {
            return match board.side_to_move() {
                Color::White => -MATE_SCORE,
                Color::Black => MATE_SCORE,
            };
        }
        s if s.is_draw() => return 0,
        _ => {}
    }

    let signed = |color: Color, v: i32| if color == Color::White { v } else { -v };

    let mut score: i32 = board
        .pieces()
        .map(|(_, p)| signed(p.color, piece_value(p.kind)))
        .sum();

    if centre_bonus {
        for sq in CENTRE {
            if let Some(p) = board.piece_at(sq) {
                score += signed(p.color, CENTRE_BONUS);
            }
        }
    }
    score
}

// =====================
// Search
// =====================

struct Search<'a> {
    board: &'a mut Board,
    centre_bonus: bool,
    nodes: u64,
}

impl Search<'_> {
    fn minimax(&mut self, depth: u32, mut alpha: i32, mut beta: i32, maximizing: bool) -> ChessResult<i32> {
        self.nodes += 1;

        let status = self.board.game_status();
        if depth == 0 || status.is_over() {
            return Ok(score_position(self.board, status, self.centre_bonus));
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for mv in self.board.legal_moves() {
            self.board.push(mv)?;
            let score = self.minimax(depth - 1, alpha, beta, !maximizing);
            self.board.pop()?;
            let score = score?;

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }
        Ok(best)
    }
}

/// Alpha-beta minimax from White's point of view. The board is handed back
/// in the state it was received.
pub fn minimax(
    board: &mut Board,
    depth: u32,
    alpha: i32,
    beta: i32,
    maximizing: bool,
    centre_bonus: bool,
) -> ChessResult<i32> {
    Search {
        board,
        centre_bonus,
        nodes: 0,
    }
    .minimax(depth, alpha, beta, maximizing)
}

/// Outcome of one `ChessAi::search` call.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SearchReport {
    pub best_move: Move,
    /// `None` when the move was picked at random.
    pub score: Option<i32>,
    pub nodes: u64,
    pub random: bool,
}

/// Computer opponent. Holds only its configuration and random source;
/// nothing carries over between searches.
#[derive(Clone, Debug)]
pub struct ChessAi {
    config: SearchConfig,
    rng: StdRng,
}

impl ChessAi {
    pub fn new(level: Level) -> Self {
        Self {
            config: level.config(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible random choices, for tests and benchmarks.
    pub fn seeded(level: Level, seed: u64) -> Self {
        Self {
            config: level.config(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_config(config: SearchConfig, seed: Option<u64>) -> ChessResult<Self> {
        config.validate()?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    /// Same configuration, independent random stream seeded from this one.
    /// Used to hand a copy to a worker thread.
    pub fn fork(&mut self) -> ChessAi {
        ChessAi {
            config: self.config,
            rng: StdRng::seed_from_u64(self.rng.r#gen()),
        }
    }

    /// `None` only when the side to move has no legal move.
    pub fn choose_move(&mut self, board: &mut Board) -> Option<Move> {
        self.search(board).map(|r| r.best_move)
    }

    pub fn search(&mut self, board: &mut Board) -> Option<SearchReport> {
        let moves = board.legal_moves();
        if moves.is_empty() {
            return None;
        }

        if self.rng.gen_bool(self.config.randomness) {
            let report = self.random_report(&moves)?;
            debug!(mv = %report.best_move, "playing a random move");
            return Some(report);
        }

        match self.search_root(board, &moves) {
            Ok(report) => {
                debug!(
                    depth = self.config.depth,
                    nodes = report.nodes,
                    score = ?report.score,
                    mv = %report.best_move,
                    "search finished"
                );
                Some(report)
            }
            Err(err) => {
                warn!(error = %err, "search failed, falling back to a random move");
                self.random_report(&moves)
            }
        }
    }

    fn random_report(&mut self, moves: &[Move]) -> Option<SearchReport> {
        moves.choose(&mut self.rng).map(|&mv| SearchReport {
            best_move: mv,
            score: None,
            nodes: 0,
            random: true,
        })
    }

    // Each root move gets a full window; ties keep the earliest move.
    fn search_root(&self, board: &mut Board, moves: &[Move]) -> ChessResult<SearchReport> {
        let entry_len = board.history_len();
        let entry_key = board.position_key();
        let maximizing = board.side_to_move() == Color::White;

        let mut best_move = moves[0];
        let mut best_score = if maximizing { i32::MIN } else { i32::MAX };
        let nodes = {
            let mut search = Search {
                board: &mut *board,
                centre_bonus: self.config.centre_bonus,
                nodes: 0,
            };
            for &mv in moves {
                search.board.push(mv)?;
                let score = search.minimax(self.config.depth - 1, i32::MIN, i32::MAX, !maximizing);
                search.board.pop()?;
                let score = score?;

                let better = if maximizing {
                    score > best_score
                } else {
                    score < best_score
                };
                if better {
                    best_score = score;
                    best_move = mv;
                }
            }
            search.nodes
        };

        if board.history_len() != entry_len || board.position_key() != entry_key {
            return Err(ChessError::BoardNotRestored {
                expected: entry_len,
                found: board.history_len(),
            });
        }

        Ok(SearchReport {
            best_move,
            score: Some(best_score),
            nodes,
            random: false,
        })
    }
}

/// One-shot search at a difficulty level.
pub fn choose_move(board: &mut Board, level: Level) -> Option<Move> {
    ChessAi::new(level).choose_move(board)
}

// =====================
// Tests
// =====================
