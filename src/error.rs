//! Error types for the rules engine, search and game session.
//!
//! Rules operations report failures through [`ChessResult`]; the search
//! converts its own failures into a random-move fallback instead of
//! returning them.

use thiserror::Error;

/// Errors that can occur while playing or searching a game
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// Move is not legal in the current position
    #[error("Illegal move: {mv}")]
    IllegalMove { mv: String },

    /// Undo requested with no move applied
    #[error("No move to undo")]
    EmptyHistory,

    /// Square text could not be parsed
    #[error("Invalid square: {input:?} (expected a1..h8)")]
    InvalidSquare { input: String },

    /// Move text could not be parsed
    #[error("Invalid move text: {input:?} (expected e.g. e2e4 or e7e8q)")]
    InvalidMove { input: String },

    /// FEN string could not be parsed
    #[error("Invalid FEN: {reason}")]
    InvalidFen { reason: String },

    /// Difficulty name not recognised
    #[error("Unknown level: {input:?} (expected beginner, intermediate or advanced)")]
    UnknownLevel { input: String },

    /// Search configuration out of range
    #[error("Invalid search configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Search left the board in a different state than it found it
    #[error("Board not restored after search: expected {expected} history entries, found {found}")]
    BoardNotRestored { expected: usize, found: usize },

    /// A move was offered while the computer is still choosing its own
    #[error("The computer is still thinking")]
    SearchPending,

    /// Search worker went away without sending a result
    #[error("Search worker disconnected before sending a move")]
    SearchDisconnected,
}

/// Result type alias for chess operations
pub type ChessResult<T> = Result<T, ChessError>;
