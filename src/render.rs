// src/render.rs
//! Seams to the presentation side: the scene renderer and the asset loader.

use log::trace;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::board::{standard_identifiers, BoardState};
use crate::command::Spherical;
use crate::coord::{Square, Vec3};
use crate::error::SetupError;

/// View parameters adjusted by the `camera`, `light` and `power` commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub camera: Spherical,
    pub light: Spherical,
    pub light_power: f32,
}

impl View {
    pub fn light_position(&self) -> Vec3 { self.light.to_cartesian() }
}

/// Everything a frame needs.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub board: &'a BoardState,
    pub view: &'a View,
}

pub trait Renderer {
    fn render(&mut self, scene: &Scene<'_>);

    /// Called for each square a sliding move is about to be checked across.
    fn show_probe(&mut self, _scene: &Scene<'_>, _probe: Vec3) {}
}

/// Draws the board as text on a writer (stdout by default).
pub struct TextRenderer<W: Write> {
    out: W,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout() -> Self { TextRenderer { out: io::stdout() } }
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self { TextRenderer { out } }

    pub fn into_inner(self) -> W { self.out }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, scene: &Scene<'_>) {
        let view = scene.view;
        let light = view.light_position();
        // A broken stdout is not worth aborting a move over.
        let _ = writeln!(self.out, "{}", scene.board);
        let _ = writeln!(
            self.out,
            "camera θ={} φ={} r={} | light at {} power {}",
            view.camera.theta, view.camera.phi, view.camera.radius, light, view.light_power
        );
        let _ = self.out.flush();
    }

    fn show_probe(&mut self, _scene: &Scene<'_>, probe: Vec3) {
        match Square::from_position(probe) {
            Some(sq) => trace!("probing {}", sq),
            None => trace!("probing {}", probe),
        }
    }
}

/// Source of the piece components available to the scene.
pub trait AssetLoader {
    fn load_piece_inventory(&self, asset_paths: &[PathBuf]) -> Result<Vec<String>, SetupError>;
}

/// Inventory of the stock chess set: the board mesh plus all 32 pieces.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardInventory;

pub const BOARD_COMPONENT: &str = "12951_Stone_Chess_Board";

impl AssetLoader for StandardInventory {
    fn load_piece_inventory(&self, asset_paths: &[PathBuf]) -> Result<Vec<String>, SetupError> {
        if asset_paths.is_empty() {
            return Err(SetupError::Asset("no asset paths configured".to_string()));
        }
        let mut components = vec![BOARD_COMPONENT.to_string()];
        components.extend(standard_identifiers().map(String::from));
        Ok(components)
    }
}
