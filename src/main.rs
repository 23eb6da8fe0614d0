use clap::Parser;
use minimax_chess::engine::Color;
use minimax_chess::search::Level;
use minimax_chess::session::GameSession;
use minimax_chess::ui::{BoardDisplay, GameController};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Play chess against a minimax engine in the terminal.
#[derive(Parser, Debug)]
#[command(name = "minimax_chess", version, about)]
struct Args {
    /// Engine strength: beginner, intermediate or advanced
    #[arg(short, long, default_value_t = Level::Intermediate)]
    level: Level,

    /// Play the black pieces; the engine opens
    #[arg(short = 'b', long)]
    play_black: bool,

    /// Letters instead of unicode pieces, no colors
    #[arg(long)]
    ascii: bool,

    /// Start from this position instead of the initial one
    #[arg(long)]
    fen: Option<String>,
}

fn main() {
    // Logs go to stderr so they do not tear the board drawing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let human = if args.play_black { Color::Black } else { Color::White };

    let mut session = GameSession::new(args.level, human);
    if let Some(fen) = &args.fen {
        if let Err(e) = session.load_fen(fen) {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    }
    info!(level = %args.level, %human, "starting game");

    let display = if args.ascii {
        BoardDisplay::ascii()
    } else {
        BoardDisplay::new()
    };

    let mut controller = GameController::new(session, display);
    if let Err(e) = controller.run() {
        error!(error = %e, "terminal i/o failed");
        std::process::exit(1);
    }
    println!("\n👋 Thank you for playing! Goodbye!\n");
}
