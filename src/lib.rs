// src/lib.rs
//! Core of the 3D chess board: board state, move legality, the command
//! grammar and the bridge to an external UCI engine. Rendering and asset
//! loading are reached through the traits in [`render`].

pub mod board;
pub mod command;
pub mod config;
pub mod coord;
pub mod engine;
pub mod error;
pub mod render;
pub mod rules;
pub mod session;
pub mod stats;

pub use board::{BoardState, Color, HoldingArea, PieceKind, PieceRecord};
pub use command::{parse_command, Command, Spherical};
pub use config::{Config, EngineConfig};
pub use coord::{notation_to_position, Square, Vec3};
pub use engine::{BestMove, EngineBridge, LineFramer};
pub use error::{CommandError, ConfigError, EngineError, MoveError, SaveLoadError, SetupError};
pub use session::Session;
