use chess_3d::board::{BoardState, Color, PieceKind, PieceRecord};
use chess_3d::coord::{notation_to_position, Square, Vec3, BOARD_ELEVATION, BOARD_LIMIT};
use chess_3d::error::{CommandError, MoveError};
use chess_3d::render::{Renderer, Scene};
use chess_3d::rules::validate_move;
use chess_3d::session::{Outcome, Session};
use chess_3d::Config;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _scene: &Scene<'_>) {}
}

fn pos(sq: &str) -> Vec3 { notation_to_position(sq).unwrap() }

fn new_session() -> Session<NullRenderer> {
    Session::new(BoardState::standard().unwrap(), NullRenderer, &Config::default())
}

fn deaths(session: &Session<NullRenderer>) -> usize {
    session.board().captured().count()
}

#[test]
fn opening_scenario_with_a_pawn_capture() {
    let mut session = new_session();

    // Double step from the start rank over empty squares.
    let outcome = session.execute_line("move e2e4").unwrap();
    assert!(matches!(outcome, Outcome::Moved(_)));
    assert_eq!(session.board().piece_at(pos("e4")), Some("PEDONE134"));
    assert_eq!(session.board().piece_at(pos("e2")), None);
    assert_eq!(deaths(&session), 0);

    // Enemy pawn straight ahead: pawns do not capture forward.
    session.execute_line("move e7e5").unwrap();
    let err = session.execute_line("move e4e5").unwrap_err();
    assert!(matches!(err, CommandError::Move(MoveError::IllegalMovePattern(_))));
    assert_eq!(session.board().piece_at(pos("e4")), Some("PEDONE134"));
    assert_eq!(session.board().piece_at(pos("e5")), Some("PEDONE124"));
    assert_eq!(deaths(&session), 0);

    // Diagonal capture.
    session.execute_line("move d7d5").unwrap();
    let slot = session.holding().next_slot();
    let outcome = session.execute_line("move e4d5").unwrap();
    match outcome {
        Outcome::Moved(report) => {
            assert_eq!(report.captured.as_deref(), Some("PEDONE123"));
            assert_eq!(report.parked_at, Some(slot));
        }
        other => panic!("unexpected {other:?}"),
    }
    let victim = session.board().get("PEDONE123").unwrap();
    assert!(!victim.alive);
    assert_eq!(victim.position, slot);
    assert_eq!(session.board().piece_at(pos("d5")), Some("PEDONE134"));
    assert_eq!(session.board().len(), 32);
    assert_eq!(session.history(), ["e2e4", "e7e5", "d7d5", "e4d5"]);
}

#[test]
fn friendly_destination_is_reported_as_occupied() {
    let mut session = new_session();
    let err = session.execute_line("move a1a2").unwrap_err();
    assert!(matches!(err, CommandError::Move(MoveError::OccupiedDestination { .. })));
}

#[test]
fn blocked_move_never_kills_the_enemy_on_the_target() {
    let mut board = BoardState::new();
    board.set("TORRE3", PieceRecord::new(PieceKind::Rook, Color::White, pos("a1")));
    board.set("PEDONE13", PieceRecord::new(PieceKind::Pawn, Color::White, pos("a4")));
    board.set("TORRE02", PieceRecord::new(PieceKind::Rook, Color::Black, pos("a8")));
    let mut session = Session::new(board, NullRenderer, &Config::default());

    assert!(session.execute_line("move a1a8").is_err());
    let target = session.board().get("TORRE02").unwrap();
    assert!(target.alive);
    assert_eq!(target.position, pos("a8"));
    assert_eq!(session.board().get("TORRE3").unwrap().position, pos("a1"));
    assert_eq!(session.holding().parked(), 0);
}

#[test]
fn notation_round_trips_through_the_store() {
    let mut board = BoardState::new();
    board.set("ALFIERE3", PieceRecord::new(PieceKind::Bishop, Color::White, pos("e2")));
    assert_eq!(board.piece_at(notation_to_position("e2").unwrap()), Some("ALFIERE3"));
}

#[test]
fn off_board_targets_fail_for_every_piece() {
    let board = BoardState::standard().unwrap();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let ids: Vec<String> = board.iter().map(|(id, _)| id.to_string()).collect();
    for _ in 0..500 {
        let target = loop {
            let candidate = Vec3::new(rng.random_range(-40.0f32..40.0), rng.random_range(-40.0f32..40.0), BOARD_ELEVATION);
            if candidate.x.abs() > BOARD_LIMIT || candidate.y.abs() > BOARD_LIMIT {
                break candidate;
            }
        };
        let id = &ids[rng.random_range(0..ids.len())];
        assert!(matches!(validate_move(&board, id, target), Err(MoveError::OffBoard(_))), "{id} -> {target}");
    }
}

#[test]
fn lone_bishop_is_legal_exactly_on_diagonals() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let from = Square::new(rng.random_range(0..8), rng.random_range(0..8)).unwrap();
        let to = Square::new(rng.random_range(0..8), rng.random_range(0..8)).unwrap();
        let mut board = BoardState::new();
        board.set("ALFIERE3", PieceRecord::new(PieceKind::Bishop, Color::White, from.position()));

        let df = (to.file() as i32 - from.file() as i32).abs();
        let dr = (to.rank() as i32 - from.rank() as i32).abs();
        let expected = df == dr && df != 0;
        assert_eq!(validate_move(&board, "ALFIERE3", to.position()).is_ok(), expected, "{from} -> {to}");
    }
}

#[test]
fn knight_ignores_obstruction_between_source_and_target() {
    let mut board = BoardState::new();
    board.set("Object3", PieceRecord::new(PieceKind::Knight, Color::White, pos("d4")));
    for (i, sq) in ["c4", "d5", "e4", "d3", "c5", "e5", "c3", "e3"].iter().enumerate() {
        board.set(format!("PEDONE13{i}"), PieceRecord::new(PieceKind::Pawn, Color::White, pos(sq)));
    }
    for target in ["b3", "b5", "c2", "c6", "e2", "e6", "f3", "f5"] {
        assert!(validate_move(&board, "Object3", pos(target)).is_ok(), "{target}");
    }
}

#[test]
fn king_two_cells_away_always_fails() {
    let mut board = BoardState::new();
    board.set("RE2", PieceRecord::new(PieceKind::King, Color::White, pos("d4")));
    for target in ["d6", "d2", "b4", "f4", "f6", "b2", "e6", "b3"] {
        assert!(validate_move(&board, "RE2", pos(target)).is_err(), "{target}");
    }
}
