// src/coord.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MoveError;

// --- Board Geometry Constants ---
/// Edge length of one board square in world units.
pub const CELL_SIZE: f32 = 3.0;
/// Fixed elevation of every piece standing on the board.
pub const BOARD_ELEVATION: f32 = -3.0;
/// Planar magnitude beyond which a coordinate is off the board
/// (half-extent of the outermost square centres plus a tolerance).
pub const BOARD_LIMIT: f32 = 3.5 * CELL_SIZE + 0.9;
/// Tolerance used when matching stored positions against a square.
pub const POSITION_EPSILON: f32 = 1e-3;

/// A point in world space. Only `x` and `y` matter for legality.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self { Vec3 { x, y, z } }

    /// Same planar square, ignoring elevation.
    pub fn planar_eq(&self, other: &Vec3) -> bool {
        (self.x - other.x).abs() < POSITION_EPSILON && (self.y - other.y).abs() < POSITION_EPSILON
    }

    /// True while both planar axes are inside the board limit.
    pub fn is_on_board(&self) -> bool {
        self.x.abs() <= BOARD_LIMIT && self.y.abs() <= BOARD_LIMIT
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// A board square in algebraic terms, file and rank both 0-based.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 { Some(Square { file, rank }) } else { None }
    }

    pub fn file(&self) -> u8 { self.file }
    pub fn rank(&self) -> u8 { self.rank }

    /// Centre of the square in world space at board elevation.
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            (self.file as f32 - 3.5) * CELL_SIZE,
            (self.rank as f32 - 3.5) * CELL_SIZE,
            BOARD_ELEVATION,
        )
    }

    /// Reverse mapping; `None` unless the point sits on a square centre.
    pub fn from_position(pos: Vec3) -> Option<Self> {
        let file = (pos.x / CELL_SIZE + 3.5).round();
        let rank = (pos.y / CELL_SIZE + 3.5).round();
        if !(0.0..8.0).contains(&file) || !(0.0..8.0).contains(&rank) {
            return None;
        }
        let square = Square { file: file as u8, rank: rank as u8 };
        if square.position().planar_eq(&pos) { Some(square) } else { None }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, (b'1' + self.rank) as char)
    }
}

impl FromStr for Square {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(MoveError::InvalidSquare(s.to_string()));
        }
        let file = match bytes[0] { b'a'..=b'h' => bytes[0] - b'a', _ => return Err(MoveError::InvalidSquare(s.to_string())) };
        let rank = match bytes[1] { b'1'..=b'8' => bytes[1] - b'1', _ => return Err(MoveError::InvalidSquare(s.to_string())) };
        Ok(Square { file, rank })
    }
}

/// Converts algebraic notation such as `"e2"` to the square's world position.
pub fn notation_to_position(notation: &str) -> Result<Vec3, MoveError> {
    notation.parse::<Square>().map(|sq| sq.position())
}
