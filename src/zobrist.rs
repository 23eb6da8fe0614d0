// Zobrist position keys.
// Used for repetition detection: every applied move records the key of the
// position it reaches. Keys come from a seeded StdRng so they are identical
// across runs.

use crate::engine::{Board, Color, Piece};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

const DEFAULT_SEED: u64 = 2024;

#[derive(Clone, Debug)]
pub struct Zobrist {
    // Piece placement keys: [square][piece index]
    pieces: [[u64; 12]; 64],

    // XOR'd in when White is to move
    side: u64,

    // One key per castling-rights combination
    castling: [u64; 16],

    // En passant file keys, only used while a capture is possible
    ep_file: [u64; 8],
}

impl Zobrist {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut pieces = [[0u64; 12]; 64];
        for sq in pieces.iter_mut() {
            for key in sq.iter_mut() {
                *key = rng.r#gen();
            }
        }

        let mut castling = [0u64; 16];
        for key in castling.iter_mut() {
            *key = rng.r#gen();
        }

        let mut ep_file = [0u64; 8];
        for key in ep_file.iter_mut() {
            *key = rng.r#gen();
        }

        let side = rng.r#gen();

        Self {
            pieces,
            side,
            castling,
            ep_file,
        }
    }

    /// Shared keys used by every board.
    pub fn global() -> &'static Zobrist {
        static GLOBAL_ZOBRIST: OnceLock<Zobrist> = OnceLock::new();
        GLOBAL_ZOBRIST.get_or_init(Zobrist::new)
    }

    /// Index 0-11: white pawn..king, then black pawn..king.
    pub fn piece_index(piece: Piece) -> usize {
        piece.color.index() * 6 + piece.kind.index()
    }

    /// Full key for a board position.
    pub fn hash_board(&self, board: &Board) -> u64 {
        let mut h = 0u64;

        for (sq, piece) in board.pieces() {
            h ^= self.pieces[sq.index()][Self::piece_index(piece)];
        }

        h ^= self.castling[board.castling_rights().bits() as usize];

        if let Some(ep) = board.en_passant() {
            if board.en_passant_capturable() {
                h ^= self.ep_file[ep.file() as usize];
            }
        }

        if board.side_to_move() == Color::White {
            h ^= self.side;
        }

        h
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

// =====================
// Tests
// =====================
