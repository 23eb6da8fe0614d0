// Rules engine.
// Features:
// - 64-square mailbox board, 0x88 stepping for move generation
// - Legal move generation: pseudo-legal per piece, then a king-safety filter
// - Castling, en passant and promotion
// - Apply/undo with a history stack
// - Check, checkmate, stalemate and draw classification
// - FEN import/export, perft

use crate::error::{ChessError, ChessResult};
use crate::zobrist::Zobrist;
use std::fmt;
use std::str::FromStr;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// =====================
// Squares
// =====================

/// A board square, `rank * 8 + file`. File 0 is the a-file, rank 0 is White's first rank.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square::at(0, 0);
    pub const B1: Square = Square::at(1, 0);
    pub const C1: Square = Square::at(2, 0);
    pub const D1: Square = Square::at(3, 0);
    pub const E1: Square = Square::at(4, 0);
    pub const F1: Square = Square::at(5, 0);
    pub const G1: Square = Square::at(6, 0);
    pub const H1: Square = Square::at(7, 0);
    pub const D4: Square = Square::at(3, 3);
    pub const E4: Square = Square::at(4, 3);
    pub const D5: Square = Square::at(3, 4);
    pub const E5: Square = Square::at(4, 4);
    pub const A8: Square = Square::at(0, 7);
    pub const B8: Square = Square::at(1, 7);
    pub const C8: Square = Square::at(2, 7);
    pub const D8: Square = Square::at(3, 7);
    pub const E8: Square = Square::at(4, 7);
    pub const F8: Square = Square::at(5, 7);
    pub const G8: Square = Square::at(6, 7);
    pub const H8: Square = Square::at(7, 7);

    const fn at(file: u8, rank: u8) -> Square {
        Square(rank * 8 + file)
    }

    pub const fn new(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square::at(file, rank))
        } else {
            None
        }
    }

    pub const fn from_index(index: u8) -> Option<Square> {
        if index < 64 { Some(Square(index)) } else { None }
    }

    pub fn from_algebraic(s: &str) -> ChessResult<Square> {
        let invalid = || ChessError::InvalidSquare {
            input: s.to_string(),
        };
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let f = bytes[0].to_ascii_lowercase();
        let r = bytes[1];
        if !(b'a'..=b'h').contains(&f) || !(b'1'..=b'8').contains(&r) {
            return Err(invalid());
        }
        Ok(Square::at(f - b'a', r - b'1'))
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// a1 is dark, h1 is light.
    pub const fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    fn to_0x88(self) -> i32 {
        ((self.rank() as i32) << 4) | self.file() as i32
    }

    fn from_0x88(s: i32) -> Option<Square> {
        if s < 0 || (s & 0x88) != 0 {
            return None;
        }
        Some(Square::at((s & 7) as u8, (s >> 4) as u8))
    }

    /// Step by a 0x88 delta, `None` when it leaves the board.
    fn offset(self, delta: i32) -> Option<Square> {
        Square::from_0x88(self.to_0x88() + delta)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<Square> {
        Square::from_algebraic(s)
    }
}

// =====================
// Pieces
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Promotion choices, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lower-case letter used in FEN and move text.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Piece {
        Piece { kind, color }
    }

    /// FEN letter: upper case for White, lower case for Black.
    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

// =====================
// Castling rights
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;
    pub const ALL: CastlingRights = CastlingRights(15);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn kingside(self, color: Color) -> bool {
        let bit = match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        };
        self.0 & bit != 0
    }

    pub fn queenside(self, color: Color) -> bool {
        let bit = match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        };
        self.0 & bit != 0
    }

    fn remove_color(&mut self, color: Color) {
        match color {
            Color::White => self.0 &= !(Self::WHITE_KINGSIDE | Self::WHITE_QUEENSIDE),
            Color::Black => self.0 &= !(Self::BLACK_KINGSIDE | Self::BLACK_QUEENSIDE),
        }
    }

    /// A king or rook leaving (or a rook being captured on) its home square.
    fn touch(&mut self, sq: Square) {
        match sq {
            Square::A1 => self.0 &= !Self::WHITE_QUEENSIDE,
            Square::H1 => self.0 &= !Self::WHITE_KINGSIDE,
            Square::A8 => self.0 &= !Self::BLACK_QUEENSIDE,
            Square::H8 => self.0 &= !Self::BLACK_KINGSIDE,
            Square::E1 => self.remove_color(Color::White),
            Square::E8 => self.remove_color(Color::Black),
            _ => {}
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        for (bit, c) in [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.0 & bit != 0 {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}

// =====================
// Move Representation
// =====================

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum MoveKind {
    Quiet,
    DoublePush,
    Capture,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

/// A move as generated for one particular position.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
}

impl Move {
    const fn new(from: Square, to: Square, kind: MoveKind) -> Move {
        Move {
            from,
            to,
            promotion: None,
            kind,
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.kind, MoveKind::Capture | MoveKind::EnPassant)
    }

    pub fn is_castle(&self) -> bool {
        matches!(
            self.kind,
            MoveKind::CastleKingside | MoveKind::CastleQueenside
        )
    }

    /// Compare against a UI-level (from, to, promotion) triple.
    pub fn matches(&self, from: Square, to: Square, promotion: Option<PieceKind>) -> bool {
        self.from == from && self.to == to && self.promotion == promotion
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.to_char())?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    DrawInsufficientMaterial,
    DrawSeventyFiveMoves,
    DrawFivefoldRepetition,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }

    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::DrawInsufficientMaterial
                | GameStatus::DrawSeventyFiveMoves
                | GameStatus::DrawFivefoldRepetition
        )
    }
}

// =====================
// Board State
// =====================

type Cells = [Option<Piece>; 64];

#[derive(Clone, Copy, Debug)]
struct Undo {
    mv: Move,
    moved: Piece,
    captured: Option<Piece>,
    prev_castling: CastlingRights,
    prev_ep: Option<Square>,
    prev_halfmove: u32,
    prev_fullmove: u32,
}

/// The authoritative game position plus the history needed to take moves back.
#[derive(Clone, Debug)]
pub struct Board {
    cells: Cells,
    side: Color,
    castling: CastlingRights,
    ep: Option<Square>,
    halfmove_clock: u32,
    fullmove: u32,
    history: Vec<Undo>,
    // one key per position reached, `keys.len() == history.len() + 1`
    keys: Vec<u64>,
}

/// Equality is positional: placement, side to move, castling rights,
/// en-passant target and clocks. History is not compared.
impl PartialEq for Board {
    fn eq(&self, other: &Board) -> bool {
        self.cells == other.cells
            && self.side == other.side
            && self.castling == other.castling
            && self.ep == other.ep
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove == other.fullmove
    }
}

impl Eq for Board {}

impl Default for Board {
    fn default() -> Board {
        Board::new()
    }
}

impl Board {
    fn empty() -> Board {
        Board {
            cells: [None; 64],
            side: Color::White,
            castling: CastlingRights::NONE,
            ep: None,
            halfmove_clock: 0,
            fullmove: 1,
            history: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Standard initial position.
    pub fn new() -> Board {
        let mut b = Board::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            b.cells[Square::at(file, 0).index()] = Some(Piece::new(kind, Color::White));
            b.cells[Square::at(file, 1).index()] = Some(Piece::new(PieceKind::Pawn, Color::White));
            b.cells[Square::at(file, 6).index()] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            b.cells[Square::at(file, 7).index()] = Some(Piece::new(kind, Color::Black));
        }
        b.castling = CastlingRights::ALL;
        b.keys.push(Zobrist::global().hash_board(&b));
        b
    }

    pub fn from_fen(fen: &str) -> ChessResult<Board> {
        let bad = |reason: &str| ChessError::InvalidFen {
            reason: reason.to_string(),
        };
        let mut b = Board::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(bad("expected at least 4 fields"));
        }

        // board
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(bad("expected 8 ranks"));
        }
        for (r, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - r as u8;
            let mut file = 0u8;
            for ch in rank_str.chars() {
                if let Some(n) = ch.to_digit(10) {
                    if !(1..=8).contains(&n) {
                        return Err(bad("empty-square count out of range"));
                    }
                    file += n as u8;
                } else {
                    let piece = Piece::from_char(ch).ok_or_else(|| bad("unknown piece letter"))?;
                    let sq = Square::new(file, rank).ok_or_else(|| bad("rank too long"))?;
                    b.cells[sq.index()] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(bad("rank too long"));
                }
            }
            if file != 8 {
                return Err(bad("rank too short"));
            }
        }

        // side
        b.side = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(bad("side to move must be w or b")),
        };

        // castling
        if parts[2] != "-" {
            for c in parts[2].chars() {
                b.castling.0 |= match c {
                    'K' => CastlingRights::WHITE_KINGSIDE,
                    'Q' => CastlingRights::WHITE_QUEENSIDE,
                    'k' => CastlingRights::BLACK_KINGSIDE,
                    'q' => CastlingRights::BLACK_QUEENSIDE,
                    _ => return Err(bad("unknown castling flag")),
                };
            }
        }

        // ep
        if parts[3] != "-" {
            b.ep = Some(Square::from_algebraic(parts[3]).map_err(|_| bad("bad en-passant square"))?);
        }

        if parts.len() > 4 {
            b.halfmove_clock = parts[4].parse().map_err(|_| bad("bad halfmove clock"))?;
        }
        if parts.len() > 5 {
            b.fullmove = parts[5].parse().map_err(|_| bad("bad fullmove number"))?;
        }

        for color in [Color::White, Color::Black] {
            let king = Some(Piece::new(PieceKind::King, color));
            if b.cells.iter().filter(|&&p| p == king).count() != 1 {
                return Err(bad("each side needs exactly one king"));
            }
        }

        // the side that just moved cannot have left its king attacked
        let waiting = !b.side;
        if find_king(&b.cells, waiting).is_some_and(|k| square_attacked(&b.cells, k, b.side)) {
            return Err(bad("side not to move is in check"));
        }

        if let Some(ep) = b.ep {
            if !b.en_passant_consistent(ep) {
                return Err(bad("en-passant square does not follow a double pawn push"));
            }
        }

        b.keys.push(Zobrist::global().hash_board(&b));
        Ok(b)
    }

    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for r in (0..8).rev() {
            let mut empty = 0;
            for f in 0..8 {
                match self.cells[Square::at(f, r).index()] {
                    None => empty += 1,
                    Some(p) => {
                        if empty > 0 {
                            s.push_str(&empty.to_string());
                            empty = 0;
                        }
                        s.push(p.to_char());
                    }
                }
            }
            if empty > 0 {
                s.push_str(&empty.to_string());
            }
            if r > 0 {
                s.push('/')
            }
        }
        let ep = match self.ep {
            Some(e) => e.to_string(),
            None => String::from("-"),
        };
        format!(
            "{} {} {} {} {} {}",
            s,
            if self.side == Color::White { 'w' } else { 'b' },
            self.castling,
            ep,
            self.halfmove_clock,
            self.fullmove
        )
    }

    // =====================
    // Queries
    // =====================

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|s| self.cells[s.index()].map(|p| (s, p)))
    }

    pub fn side_to_move(&self) -> Color {
        self.side
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.ep
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|u| u.mv)
    }

    /// Moves applied so far, oldest first.
    pub fn moves_played(&self) -> impl Iterator<Item = Move> + '_ {
        self.history.iter().map(|u| u.mv)
    }

    /// Zobrist key of the current position.
    pub fn position_key(&self) -> u64 {
        self.keys
            .last()
            .copied()
            .unwrap_or_else(|| Zobrist::global().hash_board(self))
    }

    /// How many times the current position has occurred in this game.
    pub fn repetition_count(&self) -> usize {
        let key = self.position_key();
        self.keys.iter().filter(|&&k| k == key).count()
    }

    /// Panics only if the one-king-per-side invariant is broken.
    pub fn king_square(&self, color: Color) -> Square {
        find_king(&self.cells, color)
            .unwrap_or_else(|| unreachable!("{} king missing from the board", color))
    }

    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        square_attacked(&self.cells, sq, by)
    }

    pub fn is_check(&self) -> bool {
        self.is_square_attacked(self.king_square(self.side), !self.side)
    }

    /// An en-passant target must sit empty on the third rank of the side that
    /// just moved, with that side's pawn in front of it and its start square
    /// vacated.
    fn en_passant_consistent(&self, ep: Square) -> bool {
        let (ep_rank, pawn_rank, start_rank) = match self.side {
            Color::White => (5, 4, 6),
            Color::Black => (2, 3, 1),
        };
        let pawn = Some(Piece::new(PieceKind::Pawn, !self.side));
        ep.rank() == ep_rank
            && self.cells[ep.index()].is_none()
            && self.cells[Square::at(ep.file(), pawn_rank).index()] == pawn
            && self.cells[Square::at(ep.file(), start_rank).index()].is_none()
    }

    /// True when the side to move has a pawn that could take en passant.
    /// Only then does the en-passant target distinguish positions.
    pub(crate) fn en_passant_capturable(&self) -> bool {
        let Some(ep) = self.ep else {
            return false;
        };
        let pawn = Some(Piece::new(PieceKind::Pawn, self.side));
        let back = if self.side == Color::White { -16 } else { 16 };
        [back - 1, back + 1]
            .into_iter()
            .any(|d| ep.offset(d).is_some_and(|s| self.cells[s.index()] == pawn))
    }

    // Conservative: bare kings, a single minor piece, or bishops that all
    // stand on one square color.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = 0;
        let mut knights = 0;
        let mut light_bishop = false;
        let mut dark_bishop = false;
        for (sq, p) in self.pieces() {
            match p.kind {
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::Knight => {
                    minors += 1;
                    knights += 1;
                }
                PieceKind::Bishop => {
                    minors += 1;
                    if sq.is_light() {
                        light_bishop = true;
                    } else {
                        dark_bishop = true;
                    }
                }
                PieceKind::King => {}
            }
        }
        minors <= 1 || (knights == 0 && !(light_bishop && dark_bishop))
    }

    pub fn game_status(&self) -> GameStatus {
        if !self.has_legal_moves() {
            return if self.is_check() {
                GameStatus::Checkmate {
                    winner: !self.side,
                }
            } else {
                GameStatus::Stalemate
            };
        }
        if self.is_insufficient_material() {
            GameStatus::DrawInsufficientMaterial
        } else if self.halfmove_clock >= 150 {
            GameStatus::DrawSeventyFiveMoves
        } else if self.repetition_count() >= 5 {
            GameStatus::DrawFivefoldRepetition
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_status().is_over()
    }

    // =====================
    // Move Generation
    // =====================

    /// Every legal move for the side to move, in a fixed order for a given position.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        self.gen_pseudo_moves(&mut moves);
        moves.retain(|&m| self.keeps_king_safe(m));
        moves
    }

    pub fn has_legal_moves(&self) -> bool {
        let mut moves = Vec::with_capacity(48);
        self.gen_pseudo_moves(&mut moves);
        moves.into_iter().any(|m| self.keeps_king_safe(m))
    }

    /// Legal moves of the piece standing on `from`.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        let mut moves = self.legal_moves();
        moves.retain(|m| m.from == from);
        moves
    }

    pub fn find_move(&self, from: Square, to: Square, promotion: Option<PieceKind>) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|m| m.matches(from, to, promotion))
    }

    /// Parse coordinate notation (`e2e4`, `e7e8q`) into a legal move.
    pub fn parse_move(&self, text: &str) -> ChessResult<Move> {
        let text = text.trim();
        let invalid = || ChessError::InvalidMove {
            input: text.to_string(),
        };
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return Err(invalid());
        }
        let from = Square::from_algebraic(&text[0..2]).map_err(|_| invalid())?;
        let to = Square::from_algebraic(&text[2..4]).map_err(|_| invalid())?;
        let promotion = match text[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Some(k) if PieceKind::PROMOTIONS.contains(&k) => Some(k),
                _ => return Err(invalid()),
            },
        };
        self.find_move(from, to, promotion)
            .ok_or_else(|| ChessError::IllegalMove {
                mv: text.to_string(),
            })
    }

    fn keeps_king_safe(&self, mv: Move) -> bool {
        let mut cells = self.cells;
        if relocate(&mut cells, mv).is_none() {
            return false;
        }
        match find_king(&cells, self.side) {
            Some(k) => !square_attacked(&cells, k, !self.side),
            None => false,
        }
    }

    fn gen_pseudo_moves(&self, moves: &mut Vec<Move>) {
        for from in Square::all() {
            let Some(p) = self.cells[from.index()] else {
                continue;
            };
            if p.color != self.side {
                continue;
            }
            match p.kind {
                PieceKind::Pawn => self.gen_pawn_moves(from, moves),
                PieceKind::Knight => self.gen_leaper_moves(from, &KNIGHT_DELTAS, moves),
                PieceKind::Bishop => self.gen_slider_moves(from, &BISHOP_DELTAS, moves),
                PieceKind::Rook => self.gen_slider_moves(from, &ROOK_DELTAS, moves),
                PieceKind::Queen => {
                    self.gen_slider_moves(from, &ROOK_DELTAS, moves);
                    self.gen_slider_moves(from, &BISHOP_DELTAS, moves);
                }
                PieceKind::King => self.gen_leaper_moves(from, &KING_DELTAS, moves),
            }
        }
        self.gen_castling(moves);
    }

    fn gen_leaper_moves(&self, from: Square, deltas: &[i32], moves: &mut Vec<Move>) {
        for &d in deltas {
            let Some(to) = from.offset(d) else {
                continue;
            };
            match self.cells[to.index()] {
                None => moves.push(Move::new(from, to, MoveKind::Quiet)),
                Some(p) if p.color != self.side && p.kind != PieceKind::King => {
                    moves.push(Move::new(from, to, MoveKind::Capture))
                }
                Some(_) => {}
            }
        }
    }

    fn gen_slider_moves(&self, from: Square, deltas: &[i32], moves: &mut Vec<Move>) {
        for &d in deltas {
            let mut cur = from.offset(d);
            while let Some(to) = cur {
                match self.cells[to.index()] {
                    None => moves.push(Move::new(from, to, MoveKind::Quiet)),
                    Some(p) => {
                        if p.color != self.side && p.kind != PieceKind::King {
                            moves.push(Move::new(from, to, MoveKind::Capture));
                        }
                        break;
                    }
                }
                cur = to.offset(d);
            }
        }
    }

    fn gen_pawn_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let white = self.side == Color::White;
        let dir = if white { 16 } else { -16 };
        let start_rank = if white { 1 } else { 6 };
        let last_rank = if white { 7 } else { 0 };

        // pushes
        if let Some(one) = from.offset(dir) {
            if self.cells[one.index()].is_none() {
                if one.rank() == last_rank {
                    push_promotions(from, one, MoveKind::Quiet, moves);
                } else {
                    moves.push(Move::new(from, one, MoveKind::Quiet));
                    if from.rank() == start_rank {
                        if let Some(two) = one.offset(dir) {
                            if self.cells[two.index()].is_none() {
                                moves.push(Move::new(from, two, MoveKind::DoublePush));
                            }
                        }
                    }
                }
            }
        }

        // captures, en passant
        for d in [dir - 1, dir + 1] {
            let Some(to) = from.offset(d) else {
                continue;
            };
            match self.cells[to.index()] {
                Some(p) if p.color != self.side && p.kind != PieceKind::King => {
                    if to.rank() == last_rank {
                        push_promotions(from, to, MoveKind::Capture, moves);
                    } else {
                        moves.push(Move::new(from, to, MoveKind::Capture));
                    }
                }
                None if self.ep == Some(to) => moves.push(Move::new(from, to, MoveKind::EnPassant)),
                _ => {}
            }
        }
    }

    fn gen_castling(&self, moves: &mut Vec<Move>) {
        let side = self.side;
        let enemy = !side;
        let (king_from, rank) = match side {
            Color::White => (Square::E1, 0),
            Color::Black => (Square::E8, 7),
        };
        if self.cells[king_from.index()] != Some(Piece::new(PieceKind::King, side)) {
            return;
        }
        let rook = Some(Piece::new(PieceKind::Rook, side));
        let empty = |f: u8| self.cells[Square::at(f, rank).index()].is_none();
        let safe = |f: u8| !self.is_square_attacked(Square::at(f, rank), enemy);

        if (self.castling.kingside(side) || self.castling.queenside(side))
            && self.is_square_attacked(king_from, enemy)
        {
            return;
        }
        if self.castling.kingside(side)
            && self.cells[Square::at(7, rank).index()] == rook
            && empty(5)
            && empty(6)
            && safe(5)
            && safe(6)
        {
            moves.push(Move::new(king_from, Square::at(6, rank), MoveKind::CastleKingside));
        }
        if self.castling.queenside(side)
            && self.cells[Square::at(0, rank).index()] == rook
            && empty(1)
            && empty(2)
            && empty(3)
            && safe(2)
            && safe(3)
        {
            moves.push(Move::new(king_from, Square::at(2, rank), MoveKind::CastleQueenside));
        }
    }

    // =====================
    // Apply / Undo
    // =====================

    /// Apply a move from `legal_moves()`. Anything else is rejected and the
    /// board is left untouched.
    pub fn apply(&mut self, mv: Move) -> ChessResult<()> {
        if !self.legal_moves().contains(&mv) {
            return Err(ChessError::IllegalMove { mv: mv.to_string() });
        }
        self.push(mv)
    }

    /// Take back the last applied move.
    pub fn undo(&mut self) -> ChessResult<Move> {
        self.pop()
    }

    /// Apply without the legality check. Callers pass moves they got from
    /// `legal_moves()` on this exact position.
    pub(crate) fn push(&mut self, mv: Move) -> ChessResult<()> {
        let prev_castling = self.castling;
        let prev_ep = self.ep;
        let prev_halfmove = self.halfmove_clock;
        let prev_fullmove = self.fullmove;

        let (moved, captured) =
            relocate(&mut self.cells, mv).ok_or_else(|| ChessError::IllegalMove { mv: mv.to_string() })?;

        self.castling.touch(mv.from);
        self.castling.touch(mv.to);

        self.ep = None;
        if mv.kind == MoveKind::DoublePush {
            self.ep = Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2);
        }

        if moved.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0
        } else {
            self.halfmove_clock += 1
        }
        if self.side == Color::Black {
            self.fullmove += 1
        }
        self.side = !self.side;

        self.history.push(Undo {
            mv,
            moved,
            captured,
            prev_castling,
            prev_ep,
            prev_halfmove,
            prev_fullmove,
        });
        self.keys.push(Zobrist::global().hash_board(self));
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> ChessResult<Move> {
        let u = self.history.pop().ok_or(ChessError::EmptyHistory)?;
        self.keys.pop();
        unrelocate(&mut self.cells, &u);
        self.side = !self.side;
        self.castling = u.prev_castling;
        self.ep = u.prev_ep;
        self.halfmove_clock = u.prev_halfmove;
        self.fullmove = u.prev_fullmove;
        Ok(u.mv)
    }

    /// Leaf count of the legal move tree, `depth` plies deep.
    pub fn perft(&mut self, depth: u32) -> ChessResult<u64> {
        if depth == 0 {
            return Ok(1);
        }
        let moves = self.legal_moves();
        if depth == 1 {
            return Ok(moves.len() as u64);
        }
        let mut nodes = 0;
        for mv in moves {
            self.push(mv)?;
            nodes += self.perft(depth - 1)?;
            self.pop()?;
        }
        Ok(nodes)
    }
}

impl FromStr for Board {
    type Err = ChessError;

    fn from_str(fen: &str) -> ChessResult<Board> {
        Board::from_fen(fen)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for r in (0..8).rev() {
            write!(f, "{} |", r + 1)?;
            for file in 0..8 {
                let c = self.cells[Square::at(file, r).index()].map_or('.', Piece::to_char);
                write!(f, " {}", c)?;
            }
            writeln!(f, " |")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}

// =====================
// Board helpers
// =====================

// knight jumps and king deltas, 0x88
const KNIGHT_DELTAS: [i32; 8] = [33, 31, 18, 14, -33, -31, -18, -14];
const KING_DELTAS: [i32; 8] = [16, 1, -16, -1, 17, 15, -15, -17];
const ROOK_DELTAS: [i32; 4] = [16, 1, -16, -1];
const BISHOP_DELTAS: [i32; 4] = [17, 15, -17, -15];

fn push_promotions(from: Square, to: Square, kind: MoveKind, moves: &mut Vec<Move>) {
    for p in PieceKind::PROMOTIONS {
        moves.push(Move {
            from,
            to,
            promotion: Some(p),
            kind,
        });
    }
}

fn castle_rook_squares(mv: &Move) -> Option<(Square, Square)> {
    let rank = mv.from.rank();
    match mv.kind {
        MoveKind::CastleKingside => Some((Square::at(7, rank), Square::at(5, rank))),
        MoveKind::CastleQueenside => Some((Square::at(0, rank), Square::at(3, rank))),
        _ => None,
    }
}

/// Move pieces for `mv`. Returns the moving piece and whatever was captured,
/// or `None` when the source square is empty.
fn relocate(cells: &mut Cells, mv: Move) -> Option<(Piece, Option<Piece>)> {
    let moving = cells[mv.from.index()].take()?;
    let captured = if mv.kind == MoveKind::EnPassant {
        cells[Square::at(mv.to.file(), mv.from.rank()).index()].take()
    } else {
        cells[mv.to.index()]
    };
    cells[mv.to.index()] = Some(match mv.promotion {
        Some(kind) => Piece::new(kind, moving.color),
        None => moving,
    });
    if let Some((rook_from, rook_to)) = castle_rook_squares(&mv) {
        cells[rook_to.index()] = cells[rook_from.index()].take();
    }
    Some((moving, captured))
}

fn unrelocate(cells: &mut Cells, u: &Undo) {
    let mv = u.mv;
    cells[mv.from.index()] = Some(u.moved);
    if mv.kind == MoveKind::EnPassant {
        cells[mv.to.index()] = None;
        cells[Square::at(mv.to.file(), mv.from.rank()).index()] = u.captured;
    } else {
        cells[mv.to.index()] = u.captured;
    }
    if let Some((rook_from, rook_to)) = castle_rook_squares(&mv) {
        cells[rook_from.index()] = cells[rook_to.index()].take();
    }
}

fn find_king(cells: &Cells, color: Color) -> Option<Square> {
    let king = Some(Piece::new(PieceKind::King, color));
    Square::all().find(|s| cells[s.index()] == king)
}

// =====================
// Attack Detection
// =====================

fn square_attacked(cells: &Cells, s: Square, by: Color) -> bool {
    let is = |sq: Option<Square>, kinds: &[PieceKind]| {
        sq.and_then(|sq| cells[sq.index()])
            .is_some_and(|p| p.color == by && kinds.contains(&p.kind))
    };

    // pawns attack from behind the square, seen from the attacker
    let pawn_deltas = match by {
        Color::White => [-17, -15],
        Color::Black => [17, 15],
    };
    if pawn_deltas.into_iter().any(|d| is(s.offset(d), &[PieceKind::Pawn])) {
        return true;
    }
    if KNIGHT_DELTAS.iter().any(|&d| is(s.offset(d), &[PieceKind::Knight])) {
        return true;
    }
    if KING_DELTAS.iter().any(|&d| is(s.offset(d), &[PieceKind::King])) {
        return true;
    }

    // sliders
    let ray_hits = |deltas: &[i32], kinds: &[PieceKind]| {
        deltas.iter().any(|&d| {
            let mut cur = s.offset(d);
            while let Some(sq) = cur {
                if cells[sq.index()].is_some() {
                    return is(Some(sq), kinds);
                }
                cur = sq.offset(d);
            }
            false
        })
    };
    ray_hits(&ROOK_DELTAS, &[PieceKind::Rook, PieceKind::Queen])
        || ray_hits(&BISHOP_DELTAS, &[PieceKind::Bishop, PieceKind::Queen])
}

// =====================
// Tests
// =====================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn play(board: &mut Board, moves: &[&str]) {
        for m in moves {
            let mv = board.parse_move(m).unwrap();
            board.apply(mv).unwrap();
        }
    }

    #[test]
    fn test_square_coordinates() {
        assert_eq!(sq("a1").index(), 0);
        assert_eq!(sq("h8").index(), 63);
        assert_eq!(sq("e4").file(), 4);
        assert_eq!(sq("e4").rank(), 3);
        assert_eq!(sq("e4").to_string(), "e4");
        assert!(!sq("a1").is_light());
        assert!(sq("h1").is_light());
        assert!(Square::from_algebraic("i1").is_err());
        assert!(Square::from_algebraic("a9").is_err());
        assert_eq!(Square::new(8, 0), None);
    }

    #[test]
    fn test_start_position() {
        let b = Board::new();
        assert_eq!(b.to_fen(), START_FEN);
        assert_eq!(b.legal_moves().len(), 20);
        assert_eq!(b.side_to_move(), Color::White);
        assert_eq!(b.king_square(Color::White), Square::E1);
        assert_eq!(b.king_square(Color::Black), Square::E8);
        assert!(!b.is_check());
        assert_eq!(b.game_status(), GameStatus::Ongoing);
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2",
            "8/8/8/8/8/8/8/K6k b - - 12 40",
        ] {
            assert_eq!(Board::from_fen(fen).unwrap().to_fen(), fen);
        }
    }

    #[test]
    fn test_fen_errors() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - -").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq -").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq -").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq -").is_err());
        assert!(Board::from_fen("rnbqkbnr/ppppxppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
    }

    #[test]
    fn test_fen_waiting_side_in_check() {
        // black to move would be fine, white to move could take the king
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4RK2 b - - 0 1").is_ok());
        assert!(matches!(
            Board::from_fen("4k3/8/8/8/8/8/8/4RK2 w - - 0 1"),
            Err(ChessError::InvalidFen { .. })
        ));
        assert!(Board::from_fen("4k3/8/8/8/8/8/3p4/4K3 b - - 0 1").is_err());
    }

    #[test]
    fn test_fen_en_passant_checked() {
        let ok = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1";
        assert_eq!(Board::from_fen(ok).unwrap().en_passant(), Some(sq("d6")));

        for fen in [
            // king where the pawn should be
            "8/8/8/3Pk3/8/8/8/4K3 w - e6 0 1",
            // wrong rank for the side to move
            "4k3/8/8/3pP3/8/8/8/4K3 w - d3 0 1",
            // target occupied
            "4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1",
            // own pawn in front
            "4k3/8/8/3PP3/8/8/8/4K3 w - d6 0 1",
            // start square still occupied
            "4k3/3p4/8/3pP3/8/8/8/4K3 w - d6 0 1",
        ] {
            assert!(
                matches!(Board::from_fen(fen), Err(ChessError::InvalidFen { .. })),
                "{}",
                fen
            );
        }
    }

    #[test]
    fn test_kings_are_never_captured() {
        // placed by hand, the black king stands on the rook's file
        let mut b = Board::new();
        b.cells = [None; 64];
        b.cells[Square::E1.index()] = Some(Piece::new(PieceKind::Rook, Color::White));
        b.cells[Square::F1.index()] = Some(Piece::new(PieceKind::King, Color::White));
        b.cells[Square::E8.index()] = Some(Piece::new(PieceKind::King, Color::Black));
        b.castling = CastlingRights::NONE;
        assert!(b.legal_moves().iter().all(|m| m.to != Square::E8));
        assert!(b.parse_move("e1e8").is_err());
    }

    #[test]
    fn test_simple_move_touches_two_squares() {
        let mut b = Board::new();
        for mv in b.legal_moves() {
            let before = b.clone();
            b.apply(mv).unwrap();
            for s in Square::all() {
                if s == mv.from {
                    assert_eq!(b.piece_at(s), None);
                } else if s == mv.to {
                    assert_eq!(b.piece_at(s), before.piece_at(mv.from));
                } else {
                    assert_eq!(b.piece_at(s), before.piece_at(s));
                }
            }
            b.undo().unwrap();
        }
    }

    #[test]
    fn test_undo_restores_every_move() {
        let mut b =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let key = b.position_key();
        for mv in b.legal_moves() {
            let before = b.clone();
            b.apply(mv).unwrap();
            assert_eq!(b.undo().unwrap(), mv);
            assert_eq!(b, before, "undo of {} did not restore the board", mv);
            assert_eq!(b.position_key(), key);
        }
    }

    #[test]
    fn test_illegal_move_rejected_without_change() {
        let mut b = Board::new();
        let before = b.clone();
        let bogus = Move::new(Square::E1, Square::E4, MoveKind::Quiet);
        assert!(matches!(b.apply(bogus), Err(ChessError::IllegalMove { .. })));
        assert_eq!(b, before);
        assert_eq!(b.history_len(), 0);
        assert!(matches!(b.parse_move("e2e5"), Err(ChessError::IllegalMove { .. })));
        assert!(matches!(b.parse_move("e2"), Err(ChessError::InvalidMove { .. })));
        assert!(matches!(b.parse_move("e7e8x"), Err(ChessError::InvalidMove { .. })));
    }

    #[test]
    fn test_undo_empty_history() {
        let mut b = Board::new();
        assert_eq!(b.undo(), Err(ChessError::EmptyHistory));
    }

    #[test]
    fn test_fools_mate() {
        let mut b = Board::new();
        play(&mut b, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(b.is_check());
        assert!(b.legal_moves().is_empty());
        assert_eq!(
            b.game_status(),
            GameStatus::Checkmate {
                winner: Color::Black
            }
        );
    }

    #[test]
    fn test_stalemate() {
        let b = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!b.is_check());
        assert_eq!(b.game_status(), GameStatus::Stalemate);
    }

    #[test]
    fn test_castling_kingside() {
        let mut b = Board::new();
        play(&mut b, &["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6"]);
        let castle = b.find_move(Square::E1, Square::G1, None).unwrap();
        assert_eq!(castle.kind, MoveKind::CastleKingside);
        b.apply(castle).unwrap();
        assert_eq!(b.piece_at(Square::G1), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(b.piece_at(Square::F1), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(b.piece_at(Square::H1), None);
        assert!(!b.castling_rights().kingside(Color::White));
        assert!(!b.castling_rights().queenside(Color::White));
        b.undo().unwrap();
        assert_eq!(b.piece_at(Square::H1), Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(b.piece_at(Square::E1), Some(Piece::new(PieceKind::King, Color::White)));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // black rook on f8 covers f1
        let b = Board::from_fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        assert!(b.find_move(Square::E1, Square::G1, None).is_none());
        // in check: no castling at all
        let b = Board::from_fen("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1").unwrap();
        assert!(b.legal_moves().iter().all(|m| !m.is_castle()));
        // b1 attacked does not stop queenside castling
        let b = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(b.find_move(Square::E1, Square::C1, None).is_some());
    }

    #[test]
    fn test_rook_capture_removes_right() {
        let mut b = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut b, &["a1a8"]);
        assert!(!b.castling_rights().queenside(Color::Black));
        assert!(!b.castling_rights().queenside(Color::White));
        assert!(b.castling_rights().kingside(Color::Black));
    }

    #[test]
    fn test_en_passant_window() {
        let mut b = Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
        play(&mut b, &["d7d5"]);
        assert_eq!(b.en_passant(), Some(sq("d6")));
        let ep = b.find_move(sq("e5"), sq("d6"), None).unwrap();
        assert_eq!(ep.kind, MoveKind::EnPassant);

        b.apply(ep).unwrap();
        assert_eq!(b.piece_at(sq("d5")), None);
        assert_eq!(b.piece_at(sq("d6")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        b.undo().unwrap();
        assert_eq!(b.piece_at(sq("d5")), Some(Piece::new(PieceKind::Pawn, Color::Black)));

        // a tempo later the capture is gone
        play(&mut b, &["e1e2", "e8e7"]);
        assert!(b.find_move(sq("e5"), sq("d6"), None).is_none());
    }

    #[test]
    fn test_en_passant_pin() {
        // taking en passant would expose the king on the fifth rank
        let mut b = Board::from_fen("8/2p5/8/KP5r/8/8/8/7k b - - 0 1").unwrap();
        play(&mut b, &["c7c5"]);
        assert!(b.find_move(sq("b5"), sq("c6"), None).is_none());
    }

    #[test]
    fn test_promotions() {
        let b = Board::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let promos: Vec<Move> = b
            .legal_moves()
            .into_iter()
            .filter(|m| m.promotion.is_some())
            .collect();
        // four pushes to a8, four captures on b8
        assert_eq!(promos.len(), 8);
        let mut b = b;
        let mv = b.parse_move("a7b8n").unwrap();
        b.apply(mv).unwrap();
        assert_eq!(b.piece_at(sq("b8")), Some(Piece::new(PieceKind::Knight, Color::White)));
        b.undo().unwrap();
        assert_eq!(b.piece_at(sq("a7")), Some(Piece::new(PieceKind::Pawn, Color::White)));
        assert_eq!(b.piece_at(sq("b8")), Some(Piece::new(PieceKind::Knight, Color::Black)));
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        let b = Board::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(b.legal_moves_from(sq("e2")).is_empty());
    }

    #[test]
    fn test_insufficient_material() {
        for (fen, drawn) in [
            ("8/8/8/4k3/8/8/8/4K3 w - - 0 1", true),
            ("8/8/8/4k3/8/8/8/4KN2 w - - 0 1", true),
            ("8/8/8/4k3/8/8/8/4KB2 w - - 0 1", true),
            // f1 and c8 bishops: both light squares
            ("2b5/8/8/4k3/8/8/8/4KB2 w - - 0 1", true),
            // opposite square colors
            ("1b6/8/8/4k3/8/8/8/4KB2 w - - 0 1", false),
            ("8/8/8/4k3/8/8/8/3NKN2 w - - 0 1", false),
            ("8/8/8/4k3/8/8/8/4KBN1 w - - 0 1", false),
            ("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1", false),
            ("8/8/8/4k3/8/8/8/4K2R w - - 0 1", false),
        ] {
            let b = Board::from_fen(fen).unwrap();
            assert_eq!(b.is_insufficient_material(), drawn, "{}", fen);
        }
        let b = Board::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(b.game_status(), GameStatus::DrawInsufficientMaterial);
    }

    #[test]
    fn test_seventy_five_move_rule() {
        let mut b = Board::from_fen("7k/8/8/8/8/8/8/R6K w - - 149 100").unwrap();
        assert_eq!(b.game_status(), GameStatus::Ongoing);
        play(&mut b, &["a1a2"]);
        assert_eq!(b.halfmove_clock(), 150);
        assert_eq!(b.game_status(), GameStatus::DrawSeventyFiveMoves);
    }

    #[test]
    fn test_fivefold_repetition() {
        let mut b = Board::new();
        for _ in 0..2 {
            play(&mut b, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        }
        assert_eq!(b.repetition_count(), 3);
        assert_eq!(b.game_status(), GameStatus::Ongoing);
        for _ in 0..2 {
            play(&mut b, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        }
        assert_eq!(b.repetition_count(), 5);
        assert_eq!(b.game_status(), GameStatus::DrawFivefoldRepetition);
        b.undo().unwrap();
        assert_eq!(b.game_status(), GameStatus::Ongoing);
    }

    #[test]
    fn test_clocks() {
        let mut b = Board::new();
        play(&mut b, &["g1f3"]);
        assert_eq!(b.halfmove_clock(), 1);
        assert_eq!(b.fullmove_number(), 1);
        play(&mut b, &["e7e5"]);
        assert_eq!(b.halfmove_clock(), 0);
        assert_eq!(b.fullmove_number(), 2);
        assert_eq!(b.last_move().map(|m| m.to_string()), Some("e7e5".to_string()));
    }
}
