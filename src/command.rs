// src/command.rs
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::coord::{Square, Vec3};
use crate::error::CommandError;

// --- Command Grammar ---
// theta accepts 10-80 degrees, phi 0-360 degrees, radius any non-negative real.

lazy_static! {
    static ref MOVE_RE: Regex = Regex::new(r"^move ([a-h][1-8])([a-h][1-8])$").expect("move pattern");
    static ref CAMERA_RE: Regex = Regex::new(
        r"^camera (1[0-9]|[2-7][0-9]|80) (\d{1,2}|[1-2]\d{2}|3[0-5]\d|360) (\d+(?:\.\d+)?)$"
    ).expect("camera pattern");
    static ref LIGHT_RE: Regex = Regex::new(
        r"^light (1[0-9]|[2-7][0-9]|80) (\d{1,2}|[1-2]\d{2}|3[0-5]\d|360) (\d+(?:\.\d+)?)$"
    ).expect("light pattern");
    static ref POWER_RE: Regex = Regex::new(r"^power (\d+(?:\.\d+)?)$").expect("power pattern");
}

/// Spherical placement in degrees, `theta` measured from the vertical.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Spherical {
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
}

impl Spherical {
    pub fn new(theta: f32, phi: f32, radius: f32) -> Self { Spherical { theta, phi, radius } }

    /// Cartesian point with `z` up.
    pub fn to_cartesian(&self) -> Vec3 {
        let (theta, phi) = (self.theta.to_radians(), self.phi.to_radians());
        Vec3::new(
            self.radius * theta.sin() * phi.cos(),
            self.radius * theta.sin() * phi.sin(),
            self.radius * theta.cos(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Move { from: Square, to: Square },
    Camera(Spherical),
    Light(Spherical),
    Power(f32),
    Quit,
}

fn number(text: &str, input: &str) -> Result<f32, CommandError> {
    match text.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CommandError::InvalidCommand(input.to_string())),
    }
}

fn spherical(re: &Regex, input: &str) -> Result<Option<Spherical>, CommandError> {
    match re.captures(input) {
        Some(caps) => Ok(Some(Spherical::new(
            number(&caps[1], input)?,
            number(&caps[2], input)?,
            number(&caps[3], input)?,
        ))),
        None => Ok(None),
    }
}

/// Parses one line of user input into a [`Command`].
pub fn parse_command(input: &str) -> Result<Command, CommandError> {
    let line = input.trim();

    if line == "quit" {
        return Ok(Command::Quit);
    }
    if let Some(caps) = MOVE_RE.captures(line) {
        let from = caps[1].parse::<Square>()?;
        let to = caps[2].parse::<Square>()?;
        return Ok(Command::Move { from, to });
    }
    if let Some(view) = spherical(&CAMERA_RE, line)? {
        return Ok(Command::Camera(view));
    }
    if let Some(view) = spherical(&LIGHT_RE, line)? {
        return Ok(Command::Light(view));
    }
    if let Some(caps) = POWER_RE.captures(line) {
        return Ok(Command::Power(number(&caps[1], line)?));
    }
    Err(CommandError::InvalidCommand(line.to_string()))
}
