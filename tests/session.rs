//! Game session flow: human moves, worker replies, undo and cancellation.

use minimax_chess::{AiPoll, Board, ChessAi, ChessError, Color, GameSession, Level, Square};

fn session(human: Color, seed: u64) -> GameSession {
    GameSession::with_ai(ChessAi::seeded(Level::Intermediate, seed), Level::Intermediate, human)
}

fn human_move(s: &mut GameSession, text: &str) {
    let mv = s.board().parse_move(text).unwrap();
    s.make_move(mv).unwrap();
}

fn ai_reply(s: &mut GameSession) -> AiPoll {
    let request = s.request_ai_move().expect("computer to move");
    s.wait_ai_move(request).unwrap()
}

#[test]
fn undo_returns_to_the_human() {
    let mut s = session(Color::White, 1);
    for text in ["e2e4", "g1f3"] {
        human_move(&mut s, text);
        assert!(matches!(ai_reply(&mut s), AiPoll::Applied(_)));
    }
    assert_eq!(s.board().history_len(), 4);

    assert_eq!(s.undo_move().unwrap(), 2);
    assert_eq!(s.board().history_len(), 2);
    assert_eq!(s.board().side_to_move(), Color::White);
    assert!(!s.is_game_over());
    assert_eq!(s.message(), "");
}

#[test]
fn stale_reply_is_discarded() {
    let mut s = session(Color::White, 2);
    human_move(&mut s, "e2e4");
    let request = s.request_ai_move().unwrap();
    let key_after_undo = {
        s.undo_move().unwrap();
        s.board().position_key()
    };
    assert_eq!(s.wait_ai_move(request).unwrap(), AiPoll::Discarded);
    assert_eq!(s.board().position_key(), key_after_undo);
    assert_eq!(s.board().history_len(), 0);

    // a fresh request after the undo works normally
    human_move(&mut s, "d2d4");
    assert!(matches!(ai_reply(&mut s), AiPoll::Applied(_)));
}

#[test]
fn human_cannot_move_for_a_thinking_computer() {
    let mut s = session(Color::White, 7);
    human_move(&mut s, "e2e4");
    let request = s.request_ai_move().unwrap();
    let mv = s.board().parse_move("e7e5").unwrap();
    assert_eq!(s.make_move(mv), Err(ChessError::SearchPending));
    assert!(s.is_ai_thinking());

    assert!(matches!(s.wait_ai_move(request).unwrap(), AiPoll::Applied(_)));
    assert!(!s.is_ai_thinking());
    human_move(&mut s, "d2d4");
    assert!(s.request_ai_move().is_some(), "computer can still reply");
}

#[test]
fn level_change_discards_pending_reply() {
    let mut s = session(Color::White, 8);
    human_move(&mut s, "g1f3");
    let request = s.request_ai_move().unwrap();
    s.set_level(Level::Beginner);
    assert_eq!(s.wait_ai_move(request).unwrap(), AiPoll::Discarded);
    assert!(!s.is_ai_thinking());
    assert!(matches!(ai_reply(&mut s), AiPoll::Applied(_)));
}

#[test]
fn bad_positions_do_not_replace_the_game() {
    let mut s = session(Color::White, 9);
    human_move(&mut s, "e2e4");
    assert!(s.load_fen("4k3/8/8/8/8/8/8/4RK2 w - - 0 1").is_err());
    assert!(s.load_fen("8/8/8/3Pk3/8/8/8/4K3 w - e6 0 1").is_err());
    assert_eq!(s.board().history_len(), 1);
}

#[test]
fn new_game_discards_pending_reply() {
    let mut s = session(Color::White, 3);
    human_move(&mut s, "c2c4");
    let request = s.request_ai_move().unwrap();
    s.start_new_game(Level::Beginner);
    assert_eq!(s.wait_ai_move(request).unwrap(), AiPoll::Discarded);
    assert_eq!(s.level(), Level::Beginner);
    assert_eq!(s.board().history_len(), 0);
}

#[test]
fn computer_opens_when_human_is_black() {
    let mut s = session(Color::Black, 4);
    assert!(s.is_ai_turn());
    assert!(matches!(ai_reply(&mut s), AiPoll::Applied(_)));
    assert!(!s.is_ai_turn());
    assert!(s.request_ai_move().is_none());
}

#[test]
fn mate_reported_in_message() {
    let mut s = session(Color::White, 5);
    s.load_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    s.select(Square::A1);
    s.move_selected_to(Square::A8, None).unwrap();
    assert!(s.is_game_over());
    assert_eq!(s.message(), "Checkmate! White wins!");
    let mv = Board::new().legal_moves()[0];
    assert!(matches!(s.make_move(mv), Err(ChessError::IllegalMove { .. })));
}

#[test]
fn draw_messages() {
    let mut s = session(Color::White, 6);
    s.load_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();
    assert_eq!(s.message(), "Stalemate!");
    s.load_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert_eq!(s.message(), "Draw by insufficient material");
    assert!(s.request_ai_move().is_none());
}
