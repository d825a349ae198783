// src/rules.rs
//! Move legality over continuous board coordinates.
//!
//! Validation never writes to the board. [`validate_move`] classifies the
//! move and decides the capture, [`commit`] applies a validated outcome.
//! A rejected move therefore leaves every record exactly as it was.

use log::{debug, trace};

use crate::board::{BoardState, Color, HoldingArea, PieceKind, PieceRecord};
use crate::coord::{Square, Vec3, CELL_SIZE};
use crate::error::MoveError;

/// Tolerance for straight, diagonal and step-length comparisons.
pub const EPSILON: f32 = 0.5;
/// Upper bound on probes for any walk across the board.
const MAX_PROBES: usize = 8;

/// A validated move, ready to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub piece: String,
    pub from: Vec3,
    pub to: Vec3,
    pub captured: Option<String>,
}

/// What [`commit`] did, for display and history.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub piece: String,
    pub kind: PieceKind,
    pub from: Square,
    pub to: Square,
    pub captured: Option<String>,
    pub parked_at: Option<Vec3>,
}

impl MoveReport {
    /// Long algebraic form, e.g. `e2e4`.
    pub fn notation(&self) -> String { format!("{}{}", self.from, self.to) }
}

fn near(value: f32, target: f32) -> bool { (value - target).abs() < EPSILON }

fn is_straight(dx: f32, dy: f32) -> bool { near(dx, 0.0) || near(dy, 0.0) }

fn is_diagonal(dx: f32, dy: f32) -> bool { near(dx.abs(), dy.abs()) }

fn axis_step(remaining: f32) -> f32 {
    if remaining >= CELL_SIZE - EPSILON { CELL_SIZE }
    else if remaining <= -(CELL_SIZE - EPSILON) { -CELL_SIZE }
    else { 0.0 }
}

/// Squares strictly between `from` and `to`, walked one cell at a time along
/// the signed direction of each axis. Stops once at most one step remains.
pub fn path_squares(from: Vec3, to: Vec3) -> Vec<Vec3> {
    let mut probes = Vec::new();
    let mut probe = from;
    while probes.len() < MAX_PROBES {
        let (rx, ry) = (to.x - probe.x, to.y - probe.y);
        if rx.abs() < CELL_SIZE + EPSILON && ry.abs() < CELL_SIZE + EPSILON {
            break;
        }
        probe.x += axis_step(rx);
        probe.y += axis_step(ry);
        probes.push(probe);
    }
    probes
}

/// First occupied square on the walk from `from` to `to`, if any.
pub fn first_blocker<'a>(board: &'a BoardState, from: Vec3, to: Vec3) -> Option<&'a str> {
    path_squares(from, to).into_iter().find_map(|probe| {
        trace!("probe {}", probe);
        board.piece_at(probe)
    })
}

pub fn is_path_clear(board: &BoardState, from: Vec3, to: Vec3) -> bool {
    first_blocker(board, from, to).is_none()
}

fn require_clear_path(board: &BoardState, id: &str, from: Vec3, to: Vec3) -> Result<(), MoveError> {
    match first_blocker(board, from, to) {
        Some(blocker) => Err(MoveError::PathBlocked { piece: id.to_string(), blocker: blocker.to_string() }),
        None => Ok(()),
    }
}

/// Decides what happens to the destination's occupant. Called last, after
/// every geometric and path predicate has passed.
fn adjudicate_capture(board: &BoardState, id: &str, mover: &PieceRecord, target: Vec3) -> Result<Option<String>, MoveError> {
    match board.piece_at(target) {
        None => Ok(None),
        Some(occupant) => match board.get(occupant) {
            Some(rec) if rec.color != mover.color => Ok(Some(occupant.to_string())),
            _ => Err(MoveError::OccupiedDestination { piece: id.to_string(), occupant: occupant.to_string() }),
        },
    }
}

fn illegal(kind: PieceKind, reason: &str) -> MoveError {
    MoveError::IllegalMovePattern(format!("{:?} {}", kind, reason))
}

/// Checks whether the piece `id` may move to `target` and what it captures.
pub fn validate_move(board: &BoardState, id: &str, target: Vec3) -> Result<MoveOutcome, MoveError> {
    let mover = board.get(id).ok_or_else(|| MoveError::UnknownPiece(id.to_string()))?;
    if !mover.alive {
        return Err(MoveError::UnknownPiece(id.to_string()));
    }
    let current = mover.position;
    if !current.is_on_board() {
        return Err(MoveError::CorruptPosition(id.to_string()));
    }
    if !target.is_on_board() {
        return Err(MoveError::OffBoard(target));
    }

    let dx = target.x - current.x;
    let dy = target.y - current.y;
    debug!("validating {} ({:?}) dx={} dy={}", id, mover.kind, dx, dy);
    if near(dx, 0.0) && near(dy, 0.0) {
        return Err(illegal(mover.kind, "must leave its square"));
    }

    let captured = match mover.kind {
        PieceKind::Rook => {
            if !is_straight(dx, dy) { return Err(illegal(mover.kind, "moves along a rank or file only")); }
            require_clear_path(board, id, current, target)?;
            adjudicate_capture(board, id, mover, target)?
        }
        PieceKind::Bishop => {
            if !is_diagonal(dx, dy) { return Err(illegal(mover.kind, "moves diagonally only")); }
            require_clear_path(board, id, current, target)?;
            adjudicate_capture(board, id, mover, target)?
        }
        PieceKind::Queen => {
            if !is_straight(dx, dy) && !is_diagonal(dx, dy) {
                return Err(illegal(mover.kind, "moves in a straight line or diagonal only"));
            }
            require_clear_path(board, id, current, target)?;
            adjudicate_capture(board, id, mover, target)?
        }
        PieceKind::King => {
            if dx.abs() > CELL_SIZE + EPSILON || dy.abs() > CELL_SIZE + EPSILON {
                return Err(illegal(mover.kind, "moves one square only"));
            }
            adjudicate_capture(board, id, mover, target)?
        }
        PieceKind::Knight => {
            let (ax, ay) = (dx.abs(), dy.abs());
            let l_shape = (near(ax, 2.0 * CELL_SIZE) && near(ay, CELL_SIZE))
                || (near(ax, CELL_SIZE) && near(ay, 2.0 * CELL_SIZE));
            if !l_shape { return Err(illegal(mover.kind, "moves two squares then one at a right angle")); }
            adjudicate_capture(board, id, mover, target)?
        }
        PieceKind::Pawn => validate_pawn(board, id, mover, current, target, dx, dy)?,
    };

    Ok(MoveOutcome { piece: id.to_string(), from: current, to: target, captured })
}

fn validate_pawn(
    board: &BoardState,
    id: &str,
    mover: &PieceRecord,
    current: Vec3,
    target: Vec3,
    dx: f32,
    dy: f32,
) -> Result<Option<String>, MoveError> {
    let advance = dy * mover.color.forward();
    if advance < EPSILON {
        return Err(illegal(PieceKind::Pawn, "cannot move backward or sideways"));
    }

    if near(dx, 0.0) {
        let double = near(advance, 2.0 * CELL_SIZE);
        if double {
            if !on_start_rank(mover.color, current) {
                return Err(illegal(PieceKind::Pawn, "may only advance two squares from its starting rank"));
            }
            require_clear_path(board, id, current, target)?;
        } else if !near(advance, CELL_SIZE) {
            return Err(illegal(PieceKind::Pawn, "advances one square, or two from its starting rank"));
        }
        // Straight advances never capture.
        if board.piece_at(target).is_some() {
            return Err(illegal(PieceKind::Pawn, "cannot capture straight ahead"));
        }
        return Ok(None);
    }

    if near(dx.abs(), CELL_SIZE) && near(advance, CELL_SIZE) {
        return match adjudicate_capture(board, id, mover, target)? {
            Some(victim) => Ok(Some(victim)),
            None => Err(illegal(PieceKind::Pawn, "moves diagonally only to capture")),
        };
    }

    Err(illegal(PieceKind::Pawn, "moves forward, or one square diagonally to capture"))
}

fn on_start_rank(color: Color, position: Vec3) -> bool {
    Square::from_position(position).map_or(false, |sq| sq.rank() == color.pawn_rank())
}

/// Applies a validated move: a captured occupant is marked dead and parked
/// in the holding area, then the mover takes the target square.
pub fn commit(board: &mut BoardState, outcome: &MoveOutcome, holding: &mut HoldingArea) -> Result<MoveReport, MoveError> {
    let from = Square::from_position(outcome.from).ok_or_else(|| MoveError::CorruptPosition(outcome.piece.clone()))?;
    let to = Square::from_position(outcome.to).ok_or(MoveError::OffBoard(outcome.to))?;
    let kind = board.get(&outcome.piece).map(|rec| rec.kind).ok_or_else(|| MoveError::UnknownPiece(outcome.piece.clone()))?;

    let mut parked_at = None;
    if let Some(victim) = &outcome.captured {
        let rec = board.get_mut(victim).ok_or_else(|| MoveError::UnknownPiece(victim.clone()))?;
        let slot = holding.park();
        rec.alive = false;
        rec.position = slot;
        parked_at = Some(slot);
    }
    if let Some(rec) = board.get_mut(&outcome.piece) {
        rec.position = outcome.to;
    }

    Ok(MoveReport { piece: outcome.piece.clone(), kind, from, to, captured: outcome.captured.clone(), parked_at })
}
