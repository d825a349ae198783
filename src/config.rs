// src/config.rs
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::command::Spherical;
use crate::error::ConfigError;

// --- Constants ---
pub const DEFAULT_CONFIG_FILENAME: &str = "chess_3d.json";
pub const ENGINE_PATH_ENV: &str = "CHESS3D_ENGINE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enabled: bool,
    pub path: String,
    pub args: Vec<String>,
    /// Search depth sent with `go depth <n>`.
    pub depth: u32,
    pub handshake_timeout_ms: u64,
    pub reply_timeout_ms: u64,
    /// Extra waits (each preceded by `stop`) after a reply timeout.
    pub retries: u32,
    pub shutdown_grace_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            enabled: true,
            path: "stockfish".to_string(),
            args: Vec::new(),
            depth: 10,
            handshake_timeout_ms: 5_000,
            reply_timeout_ms: 10_000,
            retries: 2,
            shutdown_grace_ms: 500,
        }
    }
}

impl EngineConfig {
    pub fn handshake_timeout(&self) -> Duration { Duration::from_millis(self.handshake_timeout_ms) }
    pub fn reply_timeout(&self) -> Duration { Duration::from_millis(self.reply_timeout_ms) }
    pub fn shutdown_grace(&self) -> Duration { Duration::from_millis(self.shutdown_grace_ms) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub asset_paths: Vec<String>,
    /// Where the session log is written on quit; nothing is written when unset.
    pub stats_file: Option<String>,
    pub camera: Spherical,
    pub light: Spherical,
    pub light_power: f32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            asset_paths: vec![
                "Lab3/Stone_Chess_Board/12951_Stone_Chess_Board_v1_L3.obj".to_string(),
                "Lab3/Chess/chess-mod.obj".to_string(),
            ],
            stats_file: None,
            camera: Spherical::new(45.0, 270.0, 45.0),
            light: Spherical::new(10.0, 0.0, 15.0),
            light_power: 400.0,
        }
    }
}

impl Config {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(origin.to_string(), e))
    }

    /// Reads `path`; a missing file yields the defaults. The engine path
    /// environment variable wins over the file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let mut config = match fs::read_to_string(path) {
            Ok(text) => {
                info!("loading config from {}", origin);
                Self::from_json(&text, &origin)?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(ConfigError::Io(origin, e)),
        };
        config.apply_engine_override(env::var(ENGINE_PATH_ENV).ok());
        Ok(config)
    }

    /// Replaces the engine path with a non-empty override.
    pub fn apply_engine_override(&mut self, value: Option<String>) {
        match value {
            Some(path) if !path.is_empty() => {
                info!("engine path overridden by {}: {}", ENGINE_PATH_ENV, path);
                self.engine.path = path;
            }
            _ => {}
        }
    }
}
