// src/error.rs
use std::error::Error;
use std::fmt;
use std::io;
use std::time::Duration;

use crate::coord::{Square, Vec3};

// --- Move Errors ---

#[derive(Debug)]
pub enum MoveError {
    InvalidSquare(String),
    PieceNotFound(Square),
    UnknownPiece(String),
    OffBoard(Vec3),
    CorruptPosition(String), // Stored position lies outside the board
    IllegalMovePattern(String),
    PathBlocked { piece: String, blocker: String },
    OccupiedDestination { piece: String, occupant: String },
}
impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::InvalidSquare(s) => write!(f, "Invalid square: '{}'. Use a file a-h and a rank 1-8, e.g. 'e2'.", s),
            MoveError::PieceNotFound(sq) => write!(f, "No piece at {}", sq),
            MoveError::UnknownPiece(id) => write!(f, "Unknown piece '{}'", id),
            MoveError::OffBoard(pos) => write!(f, "Target {} is off the board", pos),
            MoveError::CorruptPosition(id) => write!(f, "Piece '{}' is stored outside the board", id),
            MoveError::IllegalMovePattern(reason) => write!(f, "Illegal move: {}", reason),
            MoveError::PathBlocked { piece, blocker } => write!(f, "Path for {} is blocked by {}", piece, blocker),
            MoveError::OccupiedDestination { piece, occupant } => write!(f, "{} cannot move onto its own side's {}", piece, occupant),
        }
    }
}
impl Error for MoveError {}

// --- Engine Errors ---

#[derive(Debug)]
pub enum EngineError {
    Launch { path: String, source: io::Error },
    Io(io::Error),
    Timeout(Duration),
    Exited,
    Protocol(String),
    NoMove,
    Unavailable { attempts: u32 },
}
impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Launch { path, source } => write!(f, "Failed to start engine '{}': {}", path, source),
            EngineError::Io(e) => write!(f, "Engine pipe error: {}", e),
            EngineError::Timeout(limit) => write!(f, "Engine unresponsive for {} ms", limit.as_millis()),
            EngineError::Exited => write!(f, "Engine process closed its output"),
            EngineError::Protocol(line) => write!(f, "Unexpected engine reply: '{}'", line),
            EngineError::NoMove => write!(f, "Engine reports no legal move"),
            EngineError::Unavailable { attempts } => write!(f, "Engine unavailable after {} attempt(s)", attempts),
        }
    }
}
impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineError::Launch { source, .. } => Some(source),
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self { EngineError::Io(e) }
}

// --- Save / Configuration / Setup Errors ---

#[derive(Debug)]
pub enum SaveLoadError {
    Serialization(serde_json::Error),
    Io(String, io::Error),
}
impl fmt::Display for SaveLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveLoadError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SaveLoadError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}
impl Error for SaveLoadError {}

#[derive(Debug)]
pub enum ConfigError {
    Io(String, io::Error),
    Parse(String, serde_json::Error),
}
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(file, e) => write!(f, "Cannot read config '{}': {}", file, e),
            ConfigError::Parse(file, e) => write!(f, "Invalid config '{}': {}", file, e),
        }
    }
}
impl Error for ConfigError {}

#[derive(Debug)]
pub enum SetupError {
    MissingComponent(String),
    DuplicateComponent(String),
    UnrecognisedComponent(String),
    Asset(String),
}
impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::MissingComponent(id) => write!(f, "Piece inventory has no component '{}'", id),
            SetupError::DuplicateComponent(id) => write!(f, "Piece inventory lists '{}' twice", id),
            SetupError::UnrecognisedComponent(id) => write!(f, "Component '{}' is not a known piece", id),
            SetupError::Asset(reason) => write!(f, "Asset loading failed: {}", reason),
        }
    }
}
impl Error for SetupError {}

// --- Command Errors ---

#[derive(Debug)]
pub enum CommandError {
    InvalidCommand(String),
    Move(MoveError),
    Engine(EngineError),
    SaveLoad(SaveLoadError),
    Io(io::Error),
}
impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidCommand(cmd) => write!(f, "Invalid command or move: '{}'", cmd),
            CommandError::Move(e) => write!(f, "{}", e),
            CommandError::Engine(e) => write!(f, "{}", e),
            CommandError::SaveLoad(e) => write!(f, "Session log error: {}", e),
            CommandError::Io(e) => write!(f, "Input/Output error: {}", e),
        }
    }
}
impl Error for CommandError {}

// Automatic conversions for convenience
impl From<MoveError> for CommandError {
    fn from(e: MoveError) -> Self { CommandError::Move(e) }
}
impl From<EngineError> for CommandError {
    fn from(e: EngineError) -> Self { CommandError::Engine(e) }
}
impl From<SaveLoadError> for CommandError {
    fn from(e: SaveLoadError) -> Self { CommandError::SaveLoad(e) }
}
impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self { CommandError::Io(e) }
}
