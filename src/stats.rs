// src/stats.rs
use serde::Serialize;
use std::fs;

use crate::command::Spherical;
use crate::error::SaveLoadError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveStat {
    pub notation: String,
    pub piece: String,
    pub captured: Option<String>,
    pub by_engine: bool,
}

/// Session log written as JSON when the session ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub engine: Option<String>,
    pub moves: Vec<MoveStat>,
    pub captured: Vec<String>,
    pub camera: Spherical,
    pub light: Spherical,
    pub light_power: f32,
}

impl SessionStats {
    pub fn to_json(&self) -> Result<String, SaveLoadError> {
        serde_json::to_string_pretty(self).map_err(SaveLoadError::Serialization)
    }

    pub fn save_to_file(&self, filename: &str) -> Result<(), SaveLoadError> {
        let json_data = self.to_json()?;
        fs::write(filename, json_data).map_err(|e| SaveLoadError::Io(filename.to_string(), e))?;
        Ok(())
    }
}
