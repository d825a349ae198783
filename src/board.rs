// src/board.rs
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::coord::{Square, Vec3, BOARD_ELEVATION, BOARD_LIMIT, CELL_SIZE};
use crate::error::SetupError;

// --- Rendering defaults carried on every piece ---
const PIECE_ROTATION: f32 = 90.0;
const PIECE_SCALE: f32 = 0.4;

// --- Enums and Basic Structs ---

/// Owner of a piece. `White` is the originating (human) side and moves
/// towards increasing `y`.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color { White, Black }

impl Color {
    /// Sign of a forward pawn step along `y`.
    pub fn forward(&self) -> f32 {
        match self { Color::White => 1.0, Color::Black => -1.0 }
    }
    /// Rank (0-based) the side's pawns start on.
    pub fn pawn_rank(&self) -> u8 {
        match self { Color::White => 1, Color::Black => 6 }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind { Pawn, Knight, Bishop, Rook, Queen, King }

impl PieceKind {
    /// Classifies an asset identifier such as `"REGINA01"` or `"PEDONE134"`.
    ///
    /// The trailing instance digits are stripped and the stem must match a
    /// tag exactly, so `"RE"` never claims `"REGINA"` or `"TORRE"`.
    /// The knight meshes carry the exporter's generic `Object` name.
    pub fn classify(identifier: &str) -> Option<PieceKind> {
        let stem = identifier.trim_end_matches(|c: char| c.is_ascii_digit());
        match stem {
            "RE" => Some(PieceKind::King),
            "REGINA" => Some(PieceKind::Queen),
            "TORRE" => Some(PieceKind::Rook),
            "ALFIERE" => Some(PieceKind::Bishop),
            "PEDONE" => Some(PieceKind::Pawn),
            "Object" => Some(PieceKind::Knight),
            _ => None,
        }
    }

    /// Pieces whose move is walked square by square for clearance.
    pub fn slides(&self) -> bool {
        !matches!(self, PieceKind::Knight | PieceKind::King)
    }

    fn symbol(&self) -> char {
        match self {
            PieceKind::Pawn => 'p', PieceKind::Knight => 'n', PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r', PieceKind::Queen => 'q', PieceKind::King => 'k',
        }
    }
}

/// Placement of one piece instance.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PieceRecord {
    pub kind: PieceKind,
    pub color: Color,
    pub alive: bool,
    pub position: Vec3,
    // Rendering only.
    pub repeat_count: u32,
    pub rotation: f32,
    pub rotation_axis: Vec3,
    pub scale: Vec3,
}

impl PieceRecord {
    pub fn new(kind: PieceKind, color: Color, position: Vec3) -> Self {
        PieceRecord {
            kind,
            color,
            alive: true,
            position,
            repeat_count: 1,
            rotation: PIECE_ROTATION,
            rotation_axis: Vec3::new(1.0, 0.0, 0.0),
            scale: Vec3::new(PIECE_SCALE, PIECE_SCALE, PIECE_SCALE),
        }
    }

    /// Record for a loaded component, typed by its identifier.
    pub fn for_component(identifier: &str, color: Color, position: Vec3) -> Result<Self, SetupError> {
        let kind = PieceKind::classify(identifier)
            .ok_or_else(|| SetupError::UnrecognisedComponent(identifier.to_string()))?;
        Ok(PieceRecord::new(kind, color, position))
    }

    fn symbol(&self) -> char {
        match self.color {
            Color::White => self.kind.symbol().to_ascii_uppercase(),
            Color::Black => self.kind.symbol(),
        }
    }
}

// --- Standard Setup ---

// (identifier, owner, square, mesh instance count)
const STANDARD_SETUP: [(&str, Color, &str, u32); 32] = [
    ("TORRE3", Color::White, "a1", 2),
    ("Object3", Color::White, "b1", 2),
    ("ALFIERE3", Color::White, "c1", 2),
    ("REGINA2", Color::White, "d1", 1),
    ("RE2", Color::White, "e1", 1),
    ("ALFIERE31", Color::White, "f1", 2),
    ("Object31", Color::White, "g1", 1),
    ("TORRE31", Color::White, "h1", 1),
    ("PEDONE13", Color::White, "a2", 8),
    ("PEDONE131", Color::White, "b2", 1),
    ("PEDONE132", Color::White, "c2", 1),
    ("PEDONE133", Color::White, "d2", 1),
    ("PEDONE134", Color::White, "e2", 1),
    ("PEDONE135", Color::White, "f2", 1),
    ("PEDONE136", Color::White, "g2", 1),
    ("PEDONE137", Color::White, "h2", 1),
    ("TORRE02", Color::Black, "a8", 2),
    ("Object02", Color::Black, "b8", 2),
    ("ALFIERE02", Color::Black, "c8", 2),
    ("REGINA01", Color::Black, "d8", 1),
    ("RE01", Color::Black, "e8", 1),
    ("ALFIERE021", Color::Black, "f8", 2),
    ("Object021", Color::Black, "g8", 1),
    ("TORRE021", Color::Black, "h8", 1),
    ("PEDONE12", Color::Black, "a7", 8),
    ("PEDONE121", Color::Black, "b7", 1),
    ("PEDONE122", Color::Black, "c7", 1),
    ("PEDONE123", Color::Black, "d7", 1),
    ("PEDONE124", Color::Black, "e7", 1),
    ("PEDONE125", Color::Black, "f7", 1),
    ("PEDONE126", Color::Black, "g7", 1),
    ("PEDONE127", Color::Black, "h7", 1),
];

/// Identifiers of every piece component the standard setup places.
pub fn standard_identifiers() -> impl Iterator<Item = &'static str> {
    STANDARD_SETUP.iter().map(|(id, ..)| *id)
}

// --- Board State Store ---

/// All piece records keyed by identifier. Records are never removed, a
/// captured piece is only marked dead and moved off the board.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardState {
    pieces: BTreeMap<String, PieceRecord>,
}

impl BoardState {
    pub fn new() -> Self { Self::default() }

    /// Every piece of the standard opening position.
    pub fn standard() -> Result<Self, SetupError> {
        let inventory: Vec<String> = standard_identifiers().map(String::from).collect();
        Self::setup(&inventory)
    }

    /// Places the components of a loaded inventory at their opening squares.
    /// Components with no opening square (the board mesh, decorations) are
    /// skipped; a piece missing from the inventory is an error.
    pub fn setup(inventory: &[String]) -> Result<Self, SetupError> {
        let mut seen = HashSet::new();
        for component in inventory {
            if !seen.insert(component.as_str()) {
                return Err(SetupError::DuplicateComponent(component.clone()));
            }
        }
        for component in inventory {
            if !standard_identifiers().any(|id| id == component) {
                debug!("component '{}' has no board square, rendering only", component);
            }
        }
        let mut board = BoardState::new();
        for (id, color, square, repeat_count) in STANDARD_SETUP {
            if !seen.contains(id) {
                return Err(SetupError::MissingComponent(id.to_string()));
            }
            board.set(id, standard_record(id, color, square, repeat_count)?);
        }
        Ok(board)
    }

    pub fn get(&self, id: &str) -> Option<&PieceRecord> { self.pieces.get(id) }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PieceRecord> { self.pieces.get_mut(id) }

    pub fn set(&mut self, id: impl Into<String>, record: PieceRecord) {
        self.pieces.insert(id.into(), record);
    }

    /// Identifier of the live piece standing on `position`, if any.
    pub fn piece_at(&self, position: Vec3) -> Option<&str> {
        self.pieces
            .iter()
            .find(|(_, rec)| rec.alive && rec.position.planar_eq(&position))
            .map(|(id, _)| id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PieceRecord)> {
        self.pieces.iter().map(|(id, rec)| (id.as_str(), rec))
    }

    pub fn captured(&self) -> impl Iterator<Item = (&str, &PieceRecord)> {
        self.iter().filter(|(_, rec)| !rec.alive)
    }

    pub fn len(&self) -> usize { self.pieces.len() }

    pub fn is_empty(&self) -> bool { self.pieces.is_empty() }
}

fn standard_record(id: &str, color: Color, square: &str, repeat_count: u32) -> Result<PieceRecord, SetupError> {
    // The table above only holds valid squares.
    let position = square.parse::<Square>().map(|sq| sq.position()).unwrap_or_default();
    let mut record = PieceRecord::for_component(id, color, position)?;
    record.repeat_count = repeat_count;
    Ok(record)
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Captured: ")?;
        for (_, rec) in self.captured() { write!(f, "{} ", rec.symbol())?; }
        writeln!(f)?;
        writeln!(f, "  +-----------------+")?;
        for rank in (0..8).rev() {
            write!(f, "{} | ", rank + 1)?;
            for file in 0..8 {
                let symbol = Square::new(file, rank)
                    .and_then(|sq| self.piece_at(sq.position()))
                    .and_then(|id| self.get(id))
                    .map_or('.', |rec| rec.symbol());
                write!(f, "{} ", symbol)?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        write!(f, "    a b c d e f g h")
    }
}

// --- Captured-piece Holding Area ---

/// Off-board parking row for captured pieces. Presentation state only.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingArea {
    next: Vec3,
    parked: usize,
}

impl HoldingArea {
    pub fn new() -> Self {
        HoldingArea { next: Self::origin(), parked: 0 }
    }

    fn origin() -> Vec3 {
        Vec3::new(-5.5 * CELL_SIZE, -3.5 * CELL_SIZE, BOARD_ELEVATION)
    }

    /// Coordinate the next captured piece will be parked at.
    pub fn next_slot(&self) -> Vec3 { self.next }

    pub fn parked(&self) -> usize { self.parked }

    /// Hands out the current slot and advances along `y`, starting a new
    /// row one cell further out once the board edge is passed.
    pub fn park(&mut self) -> Vec3 {
        let slot = self.next;
        self.parked += 1;
        self.next.y += CELL_SIZE;
        if self.next.y > BOARD_LIMIT {
            self.next.y = Self::origin().y;
            self.next.x -= CELL_SIZE;
        }
        slot
    }
}

impl Default for HoldingArea {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::notation_to_position;

    #[test]
    fn classify_does_not_confuse_king_with_queen_or_rook() {
        assert_eq!(PieceKind::classify("RE2"), Some(PieceKind::King));
        assert_eq!(PieceKind::classify("RE01"), Some(PieceKind::King));
        assert_eq!(PieceKind::classify("REGINA01"), Some(PieceKind::Queen));
        assert_eq!(PieceKind::classify("TORRE021"), Some(PieceKind::Rook));
        assert_eq!(PieceKind::classify("ALFIERE3"), Some(PieceKind::Bishop));
        assert_eq!(PieceKind::classify("PEDONE137"), Some(PieceKind::Pawn));
        assert_eq!(PieceKind::classify("Object31"), Some(PieceKind::Knight));
    }

    #[test]
    fn unrecognised_identifiers_have_no_kind() {
        for id in ["12951_Stone_Chess_Board", "GARBAGE", "", "42", "re2", "REGINAX"] {
            assert_eq!(PieceKind::classify(id), None, "{id}");
        }
        let b1 = notation_to_position("b1").unwrap();
        assert!(matches!(
            PieceRecord::for_component("GARBAGE", Color::White, b1),
            Err(SetupError::UnrecognisedComponent(id)) if id == "GARBAGE"
        ));
        assert_eq!(PieceRecord::for_component("Object3", Color::White, b1).unwrap().kind, PieceKind::Knight);
    }

    #[test]
    fn standard_board_has_thirty_two_live_pieces_on_distinct_squares() {
        let board = BoardState::standard().unwrap();
        assert_eq!(board.len(), 32);
        let mut squares = HashSet::new();
        for (_, rec) in board.iter() {
            assert!(rec.alive);
            let sq = Square::from_position(rec.position).expect("on a square centre");
            assert!(squares.insert(sq));
        }
        assert_eq!(board.get("RE2").map(|r| r.kind), Some(PieceKind::King));
        assert_eq!(board.get("RE2").map(|r| r.color), Some(Color::White));
    }

    #[test]
    fn piece_at_round_trips_through_notation() {
        let board = BoardState::standard().unwrap();
        assert_eq!(board.piece_at(notation_to_position("e2").unwrap()), Some("PEDONE134"));
        assert_eq!(board.piece_at(notation_to_position("d8").unwrap()), Some("REGINA01"));
        assert_eq!(board.piece_at(notation_to_position("e4").unwrap()), None);
    }

    #[test]
    fn piece_at_tolerates_float_drift_and_ignores_dead_pieces() {
        let mut board = BoardState::new();
        let e4 = notation_to_position("e4").unwrap();
        let mut drifted = e4;
        drifted.x += 1e-4;
        board.set("PEDONE134", PieceRecord::new(PieceKind::Pawn, Color::White, drifted));
        assert_eq!(board.piece_at(e4), Some("PEDONE134"));

        board.get_mut("PEDONE134").unwrap().alive = false;
        assert_eq!(board.piece_at(e4), None);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn setup_requires_every_piece_and_skips_scenery() {
        let mut inventory: Vec<String> = standard_identifiers().map(String::from).collect();
        inventory.push("12951_Stone_Chess_Board".to_string());
        let board = BoardState::setup(&inventory).unwrap();
        assert_eq!(board.len(), 32);
        assert!(board.get("12951_Stone_Chess_Board").is_none());

        inventory.retain(|id| id != "RE01");
        assert!(matches!(BoardState::setup(&inventory), Err(SetupError::MissingComponent(id)) if id == "RE01"));
    }

    #[test]
    fn setup_rejects_duplicate_components() {
        let mut inventory: Vec<String> = standard_identifiers().map(String::from).collect();
        inventory.push("TORRE3".to_string());
        assert!(matches!(BoardState::setup(&inventory), Err(SetupError::DuplicateComponent(_))));
    }

    #[test]
    fn holding_area_advances_and_wraps_to_a_new_row() {
        let mut holding = HoldingArea::new();
        let first = holding.park();
        assert_eq!(first, Vec3::new(-5.5 * CELL_SIZE, -3.5 * CELL_SIZE, BOARD_ELEVATION));
        assert_eq!(holding.next_slot().y, -2.5 * CELL_SIZE);

        // Eight slots fit along the edge before the row wraps.
        for _ in 1..8 { holding.park(); }
        let wrapped = holding.next_slot();
        assert_eq!(wrapped.y, -3.5 * CELL_SIZE);
        assert_eq!(wrapped.x, -6.5 * CELL_SIZE);
        assert!(!wrapped.is_on_board());
        assert_eq!(holding.parked(), 8);
    }

    #[test]
    fn display_draws_white_in_upper_case() {
        let text = BoardState::standard().unwrap().to_string();
        assert!(text.contains("1 | R N B Q K B N R |"));
        assert!(text.contains("8 | r n b q k b n r |"));
    }
}
