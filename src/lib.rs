//! Chess rules engine with a minimax opponent.
//!
//! [`engine`] holds the board, legal move generation and game status.
//! [`search`] picks moves for the computer at three difficulty levels.
//! [`session`] wraps one game for an interactive front-end, which lives in
//! [`ui`].

pub mod engine;
pub mod error;
pub mod search;
pub mod session;
pub mod ui;
pub mod zobrist;

pub use engine::{Board, CastlingRights, Color, GameStatus, Move, MoveKind, Piece, PieceKind, Square, START_FEN};
pub use error::{ChessError, ChessResult};
pub use search::{ChessAi, Level, SearchConfig, SearchReport, choose_move, evaluate, minimax};
pub use session::{AiPoll, AiRequest, GameSession};
