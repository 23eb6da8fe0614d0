// Integration layer between terminal UI and the game session

use crate::engine::{Color, Move, Square};
use crate::error::{ChessError, ChessResult};
use crate::search::Level;
use crate::session::{AiPoll, GameSession};
use crate::ui::{BoardDisplay, HELP_TEXT, InputValidator, colors};
use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Move(String),
    Select(Square),
    Undo,
    New,
    Level(Level),
    Flip,
    Fen,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> ChessResult<Command> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&head) = parts.first() else {
            return Err(ChessError::InvalidMove {
                input: line.to_string(),
            });
        };
        let arg = || {
            parts.get(1).copied().ok_or_else(|| ChessError::InvalidMove {
                input: line.trim().to_string(),
            })
        };

        Ok(match head.to_lowercase().as_str() {
            "move" | "m" => Command::Move(arg()?.to_string()),
            "select" | "s" => Command::Select(Square::from_algebraic(arg()?)?),
            "undo" | "u" => Command::Undo,
            "new" | "n" => Command::New,
            "level" | "l" => Command::Level(arg()?.parse()?),
            "flip" | "f" => Command::Flip,
            "fen" => Command::Fen,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => Command::Move(head.to_string()),
        })
    }
}

// ============================================================================
// GAME CONTROLLER
// ============================================================================

pub struct GameController {
    session: GameSession,
    display: BoardDisplay,
    history: Vec<String>,
}

impl GameController {
    pub fn new(session: GameSession, display: BoardDisplay) -> Self {
        let mut display = display;
        display.flip_board = session.human() == Color::Black;
        Self {
            session,
            display,
            history: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Interactive loop on stdin/stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        self.run_with(stdin.lock(), &mut stdout)
    }

    /// Loop over any line source; returns at `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        self.play_ai_reply(out)?;
        self.show(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "{} to move> ", self.session.board().side_to_move())?;
            out.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Ok(Command::Quit) => break,
                Ok(cmd) => self.execute(cmd, out)?,
                Err(e) => self.show_error(out, &e)?,
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<()> {
        debug!(?cmd, "command");
        match cmd {
            Command::Move(text) => match self.handle_human_move(&text) {
                Ok(mv) => {
                    self.record(mv);
                    self.play_ai_reply(out)?;
                    self.show(out)?;
                }
                Err(e) => self.show_error(out, &e)?,
            },
            Command::Select(sq) => {
                let targets: Vec<Square> = self.session.select(sq).iter().map(|m| m.to).collect();
                if targets.is_empty() {
                    self.display.selected = None;
                    self.display.targets.clear();
                    writeln!(out, "No legal moves from {}", sq)?;
                    return Ok(());
                }
                self.display.selected = Some(sq);
                self.display.targets = targets;
                self.show(out)?;
            }
            Command::Undo => match self.session.undo_move() {
                Ok(plies) => {
                    let keep = self.history.len().saturating_sub(plies);
                    self.history.truncate(keep);
                    self.display.clear_highlights();
                    self.display.highlight_last_move =
                        self.session.board().last_move().map(|m| (m.from, m.to));
                    self.show(out)?;
                }
                Err(e) => self.show_error(out, &e)?,
            },
            Command::New => {
                self.session.start_new_game(self.session.level());
                self.history.clear();
                self.display.clear_highlights();
                self.play_ai_reply(out)?;
                self.show(out)?;
            }
            Command::Level(level) => {
                self.session.set_level(level);
                writeln!(out, "Level set to {}", level)?;
            }
            Command::Flip => {
                self.display.flip_board = !self.display.flip_board;
                self.show(out)?;
            }
            Command::Fen => writeln!(out, "{}", self.session.board().to_fen())?,
            Command::Help => write!(out, "{}", HELP_TEXT)?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn handle_human_move(&mut self, text: &str) -> ChessResult<Move> {
        if self.session.is_game_over() {
            return Err(ChessError::IllegalMove {
                mv: text.trim().to_string(),
            });
        }
        let (from, to, promotion) = InputValidator::validate_move(text)?;
        let mv = self
            .session
            .board()
            .find_move(from, to, promotion)
            .ok_or_else(|| ChessError::IllegalMove {
                mv: text.trim().to_string(),
            })?;
        self.session.make_move(mv)?;
        Ok(mv)
    }

    /// Let the computer move if it is its turn, polling the worker.
    fn play_ai_reply<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let Some(request) = self.session.request_ai_move() else {
            return Ok(());
        };
        writeln!(out, "Engine ({}) is thinking...", self.session.level())?;
        out.flush()?;

        let start = Instant::now();
        loop {
            match self.session.poll_ai_move(&request) {
                Ok(AiPoll::Pending) => thread::sleep(POLL_INTERVAL),
                Ok(AiPoll::Applied(mv)) => {
                    self.record(mv);
                    writeln!(out, "Engine played {} ({}ms)", mv, start.elapsed().as_millis())?;
                    break;
                }
                Ok(AiPoll::Discarded) | Ok(AiPoll::NoMove) => break,
                Err(e) => {
                    warn!(error = %e, "engine move failed");
                    self.show_error(out, &e)?;
                    break;
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, mv: Move) {
        self.history.push(mv.to_string());
        self.display.clear_highlights();
        self.display.highlight_last_move = Some((mv.from, mv.to));
    }

    fn show<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let board = self.session.board();
        if self.display.use_color {
            write!(out, "\x1b[2J\x1b[H")?;
        }
        write!(out, "{}", self.display.board_string(board))?;
        write!(out, "{}", self.display.info_string(board))?;
        if !self.history.is_empty() {
            write!(out, "{}", self.display.move_list_string(&self.history))?;
        }
        if self.session.is_game_over() {
            let text = self.display.paint(colors::YELLOW, self.session.message());
            writeln!(out, "{}  (type 'new' to play again or 'undo')", text)?;
        }
        Ok(())
    }

    fn show_error<W: Write>(&self, out: &mut W, e: &ChessError) -> io::Result<()> {
        writeln!(out, "{}", self.display.paint(colors::RED, &format!("✗ {}", e)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
