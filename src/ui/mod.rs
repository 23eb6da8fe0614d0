// Terminal UI for the chess engine
// Colored board, move highlighting, input validation

pub mod integration;
use crate::engine::{Board, Color, PieceKind, Square};
use crate::error::{ChessError, ChessResult};
pub use integration::GameController;
use std::fmt::Write as _;

// ============================================================================
// COLOR CODES & STYLING
// ============================================================================

pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";

    pub const BRIGHT_BLACK: &str = "\x1b[90m";
    pub const BRIGHT_WHITE: &str = "\x1b[97m";

    pub const BG_LIGHT: &str = "\x1b[48;5;252m"; // Light square
    pub const BG_DARK: &str = "\x1b[48;5;240m"; // Dark square
    pub const BG_HIGHLIGHT: &str = "\x1b[48;5;226m"; // Last move
    pub const BG_SELECTED: &str = "\x1b[48;5;117m"; // Selected square
    pub const BG_TARGET: &str = "\x1b[48;5;114m"; // Legal destination
    pub const BG_CHECK: &str = "\x1b[48;5;196m"; // King in check
}

// ============================================================================
// UNICODE CHESS PIECES
// ============================================================================

pub mod symbols {
    use crate::engine::{Color, Piece, PieceKind};

    pub fn piece_symbol(piece: Piece) -> &'static str {
        match (piece.color, piece.kind) {
            (Color::White, PieceKind::King) => "♔",
            (Color::White, PieceKind::Queen) => "♕",
            (Color::White, PieceKind::Rook) => "♖",
            (Color::White, PieceKind::Bishop) => "♗",
            (Color::White, PieceKind::Knight) => "♘",
            (Color::White, PieceKind::Pawn) => "♙",
            (Color::Black, PieceKind::King) => "♚",
            (Color::Black, PieceKind::Queen) => "♛",
            (Color::Black, PieceKind::Rook) => "♜",
            (Color::Black, PieceKind::Bishop) => "♝",
            (Color::Black, PieceKind::Knight) => "♞",
            (Color::Black, PieceKind::Pawn) => "♟",
        }
    }
}

// ============================================================================
// BOARD DISPLAY
// ============================================================================

#[derive(Clone, Debug)]
pub struct BoardDisplay {
    pub show_coords: bool,
    pub use_unicode: bool,
    pub use_color: bool,
    pub highlight_last_move: Option<(Square, Square)>,
    pub selected: Option<Square>,
    pub targets: Vec<Square>,
    pub flip_board: bool,
}

impl Default for BoardDisplay {
    fn default() -> Self {
        Self {
            show_coords: true,
            use_unicode: true,
            use_color: true,
            highlight_last_move: None,
            selected: None,
            targets: Vec::new(),
            flip_board: false,
        }
    }
}

impl BoardDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain letters, no escape codes.
    pub fn ascii() -> Self {
        Self {
            use_unicode: false,
            use_color: false,
            ..Self::default()
        }
    }

    pub fn clear_highlights(&mut self) {
        self.highlight_last_move = None;
        self.selected = None;
        self.targets.clear();
    }

    /// The board grid, White at the bottom unless flipped.
    pub fn board_string(&self, board: &Board) -> String {
        let mut out = String::new();
        let checked_king = board
            .is_check()
            .then(|| board.king_square(board.side_to_move()));

        let ranks: Vec<u8> = if self.flip_board {
            (0..8).collect()
        } else {
            (0..8).rev().collect()
        };
        let files: Vec<u8> = if self.flip_board {
            (0..8).rev().collect()
        } else {
            (0..8).collect()
        };

        for &rank in &ranks {
            if self.show_coords {
                let _ = write!(out, " {} ", rank + 1);
            }
            for &file in &files {
                let Some(sq) = Square::new(file, rank) else {
                    continue;
                };
                let symbol = match board.piece_at(sq) {
                    Some(p) if self.use_unicode => symbols::piece_symbol(p).to_string(),
                    Some(p) => p.to_char().to_string(),
                    None if self.use_color => " ".to_string(),
                    None => ".".to_string(),
                };
                if self.use_color {
                    let bg = self.square_background(sq, checked_king);
                    let fg = match board.piece_at(sq).map(|p| p.color) {
                        Some(Color::White) => colors::BRIGHT_WHITE,
                        Some(Color::Black) => colors::BRIGHT_BLACK,
                        None => "",
                    };
                    let _ = write!(out, "{}{}{} {} {}", bg, colors::BOLD, fg, symbol, colors::RESET);
                } else {
                    let _ = write!(out, "{} ", symbol);
                }
            }
            out.push('\n');
        }

        if self.show_coords {
            out.push_str("   ");
            for &file in &files {
                let letter = (b'a' + file) as char;
                if self.use_color {
                    let _ = write!(out, " {} ", letter);
                } else {
                    let _ = write!(out, "{} ", letter);
                }
            }
            out.push('\n');
        }
        out
    }

    fn square_background(&self, sq: Square, checked_king: Option<Square>) -> &'static str {
        use colors::*;

        if checked_king == Some(sq) {
            return BG_CHECK;
        }
        if self.selected == Some(sq) {
            return BG_SELECTED;
        }
        if self.targets.contains(&sq) {
            return BG_TARGET;
        }
        if let Some((from, to)) = self.highlight_last_move {
            if sq == from || sq == to {
                return BG_HIGHLIGHT;
            }
        }
        if sq.is_light() { BG_LIGHT } else { BG_DARK }
    }

    /// Turn, clocks, castling and en passant under the board.
    pub fn info_string(&self, board: &Board) -> String {
        let ep = board
            .en_passant()
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());
        let mut out = format!(
            "Turn: {}  Move: {}  Halfmove: {}  Castling: {}  En passant: {}\n",
            board.side_to_move(),
            board.fullmove_number(),
            board.halfmove_clock(),
            board.castling_rights(),
            ep
        );
        if board.is_check() {
            out.push_str(&self.paint(colors::RED, "Check!"));
            out.push('\n');
        }
        out
    }

    pub fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{}{}{}", color, text, colors::RESET)
        } else {
            text.to_string()
        }
    }

    /// Numbered move list, two plies per line.
    pub fn move_list_string(&self, moves: &[String]) -> String {
        let mut out = String::new();
        for (i, pair) in moves.chunks(2).enumerate() {
            let _ = write!(out, "{}. {}", i + 1, pair[0]);
            if let Some(reply) = pair.get(1) {
                let _ = write!(out, "  {}", reply);
            }
            out.push('\n');
        }
        out
    }
}

pub const HELP_TEXT: &str = "\
Commands:
  e2e4 | move e2e4   play a move (add q/r/b/n to promote, e.g. e7e8q)
  select e2          show the legal moves of a piece
  undo               take back your last move
  new                start a new game
  level <name>       beginner, intermediate or advanced
  flip               turn the board around
  fen                print the current position
  help               show this text
  quit               leave the program
";

// ============================================================================
// INPUT VALIDATOR
// ============================================================================

pub struct InputValidator;

impl InputValidator {
    /// Split coordinate text into squares and promotion piece. Legality is
    /// checked by the board, not here.
    pub fn validate_move(input: &str) -> ChessResult<(Square, Square, Option<PieceKind>)> {
        let input = input.trim().to_lowercase();
        let invalid = || ChessError::InvalidMove {
            input: input.clone(),
        };

        if !input.is_ascii() || !(4..=5).contains(&input.len()) {
            return Err(invalid());
        }

        let from = Square::from_algebraic(&input[0..2])?;
        let to = Square::from_algebraic(&input[2..4])?;

        let promotion = match input[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(invalid()),
            },
        };

        Ok((from, to, promotion))
    }

    pub fn is_valid_square(sq: &str) -> bool {
        Square::from_algebraic(sq).is_ok()
    }

    /// Full parse, so a pasted position is rejected before it replaces the game.
    pub fn validate_fen(fen: &str) -> ChessResult<Board> {
        Board::from_fen(fen.trim())
    }
}

// ============================================================================
// MODULE TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Piece;

    #[test]
    fn test_input_validation() {
        assert!(InputValidator::validate_move("e2e4").is_ok());
        assert!(InputValidator::validate_move("a1h8").is_ok());
        assert!(InputValidator::validate_move("e2").is_err());
        assert!(InputValidator::validate_move("e2e9").is_err());
        assert!(InputValidator::validate_move("z1a1").is_err());
        assert!(InputValidator::validate_move("e7e8k").is_err());
        assert!(InputValidator::validate_move("e7e8qq").is_err());

        let (from, to, promo) = InputValidator::validate_move(" E7E8Q ").unwrap();
        assert_eq!(from.to_string(), "e7");
        assert_eq!(to.to_string(), "e8");
        assert_eq!(promo, Some(PieceKind::Queen));
    }

    #[test]
    fn test_square_validation() {
        assert!(InputValidator::is_valid_square("e2"));
        assert!(InputValidator::is_valid_square("a1"));
        assert!(InputValidator::is_valid_square("h8"));
        assert!(!InputValidator::is_valid_square("e9"));
        assert!(!InputValidator::is_valid_square("z1"));
        assert!(!InputValidator::is_valid_square("e"));
    }

    #[test]
    fn test_fen_validation() {
        assert!(InputValidator::validate_fen(crate::engine::START_FEN).is_ok());
        assert!(InputValidator::validate_fen("8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_ascii_board() {
        let display = BoardDisplay::ascii();
        let text = display.board_string(&Board::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], " 8 r n b q k b n r ");
        assert_eq!(lines[4], " 4 . . . . . . . . ");
        assert_eq!(lines[7], " 1 R N B Q K B N R ");
        assert_eq!(lines[8], "   a b c d e f g h ");
    }

    #[test]
    fn test_flipped_board() {
        let display = BoardDisplay {
            flip_board: true,
            ..BoardDisplay::ascii()
        };
        let text = display.board_string(&Board::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], " 1 R N B K Q B N R ");
        assert_eq!(lines[8], "   h g f e d c b a ");
    }

    #[test]
    fn test_unicode_symbols() {
        let wk = Piece::new(PieceKind::King, Color::White);
        let bp = Piece::new(PieceKind::Pawn, Color::Black);
        assert_eq!(symbols::piece_symbol(wk), "♔");
        assert_eq!(symbols::piece_symbol(bp), "♟");
        assert_eq!(wk.to_char(), 'K');
        assert_eq!(bp.to_char(), 'p');
    }

    #[test]
    fn test_check_highlight() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K2r w - - 0 1").unwrap();
        let display = BoardDisplay::new();
        assert!(display.board_string(&board).contains(colors::BG_CHECK));
        assert!(display.info_string(&board).contains("Check!"));
        assert!(!display.board_string(&Board::new()).contains(colors::BG_CHECK));
    }

    #[test]
    fn test_move_list() {
        let display = BoardDisplay::ascii();
        let moves: Vec<String> = ["e2e4", "e7e5", "g1f3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(display.move_list_string(&moves), "1. e2e4  e7e5\n2. g1f3\n");
    }
}
