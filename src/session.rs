// src/session.rs
use log::{error, info, warn};

use crate::board::{BoardState, HoldingArea};
use crate::command::{parse_command, Command};
use crate::config::{Config, EngineConfig};
use crate::coord::Square;
use crate::engine::{BestMove, EngineBridge};
use crate::error::{CommandError, EngineError, MoveError};
use crate::render::{Renderer, Scene, View};
use crate::rules::{self, MoveReport};
use crate::stats::{MoveStat, SessionStats};

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Moved(MoveReport),
    ViewChanged,
    Quit,
}

/// The engine's answer and whether the local rules could play it.
#[derive(Debug)]
pub struct EngineReply {
    pub best: BestMove,
    pub applied: Result<MoveReport, MoveError>,
}

/// Owns all mutable state of one game: board, holding area, view, move
/// history and the optional engine. Everything runs on the caller's thread.
pub struct Session<R: Renderer> {
    board: BoardState,
    holding: HoldingArea,
    view: View,
    renderer: R,
    engine: Option<EngineBridge>,
    engine_config: EngineConfig,
    history: Vec<String>,
    log: Vec<MoveStat>,
}

impl<R: Renderer> Session<R> {
    pub fn new(board: BoardState, renderer: R, config: &Config) -> Self {
        Session {
            board,
            holding: HoldingArea::new(),
            view: View { camera: config.camera, light: config.light, light_power: config.light_power },
            renderer,
            engine: None,
            engine_config: config.engine.clone(),
            history: Vec::new(),
            log: Vec::new(),
        }
    }

    pub fn attach_engine(&mut self, engine: EngineBridge) {
        self.engine = Some(engine);
    }

    pub fn has_engine(&self) -> bool { self.engine.is_some() }

    pub fn board(&self) -> &BoardState { &self.board }
    pub fn holding(&self) -> &HoldingArea { &self.holding }
    pub fn view(&self) -> &View { &self.view }
    pub fn renderer(&self) -> &R { &self.renderer }
    /// Moves played so far in long algebraic form, engine replies included.
    pub fn history(&self) -> &[String] { &self.history }

    pub fn render(&mut self) {
        let scene = Scene { board: &self.board, view: &self.view };
        self.renderer.render(&scene);
    }

    pub fn execute_line(&mut self, line: &str) -> Result<Outcome, CommandError> {
        let command = parse_command(line)?;
        self.execute(command)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, CommandError> {
        match command {
            Command::Move { from, to } => Ok(Outcome::Moved(self.play_move(from, to)?)),
            Command::Camera(camera) => {
                self.view.camera = camera;
                self.render();
                Ok(Outcome::ViewChanged)
            }
            Command::Light(light) => {
                self.view.light = light;
                self.render();
                Ok(Outcome::ViewChanged)
            }
            Command::Power(power) => {
                self.view.light_power = power;
                self.render();
                Ok(Outcome::ViewChanged)
            }
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    /// Validates and commits a move typed by the user.
    pub fn play_move(&mut self, from: Square, to: Square) -> Result<MoveReport, MoveError> {
        let report = self.apply_move(from, to, false)?;
        self.history.push(report.notation());
        Ok(report)
    }

    fn apply_move(&mut self, from: Square, to: Square, by_engine: bool) -> Result<MoveReport, MoveError> {
        let source = from.position();
        let target = to.position();
        let id = self.board.piece_at(source).ok_or(MoveError::PieceNotFound(from))?.to_string();

        let validated = rules::validate_move(&self.board, &id, target);
        // Only a walk the piece could take is shown, up to the first occupant.
        let walked = matches!(validated, Ok(_) | Err(MoveError::PathBlocked { .. }));
        if walked && self.board.get(&id).map_or(false, |rec| rec.kind.slides()) {
            let scene = Scene { board: &self.board, view: &self.view };
            for probe in rules::path_squares(source, target) {
                self.renderer.show_probe(&scene, probe);
                if self.board.piece_at(probe).is_some() {
                    break;
                }
            }
        }

        let outcome = match validated {
            Ok(outcome) => outcome,
            Err(e) => {
                info!("rejected {}{} for {}: {}", from, to, id, e);
                return Err(e);
            }
        };
        let report = rules::commit(&mut self.board, &outcome, &mut self.holding)?;
        info!("{} moved {}{}", report.piece, from, to);
        self.log.push(MoveStat {
            notation: report.notation(),
            piece: report.piece.clone(),
            captured: report.captured.clone(),
            by_engine,
        });
        self.render();
        Ok(report)
    }

    /// Asks the engine for its reply to the moves so far and plays it.
    /// `Ok(None)` when no engine is attached. An engine that stops
    /// answering is shut down and detached.
    pub fn engine_reply(&mut self) -> Result<Option<EngineReply>, CommandError> {
        let Some(engine) = self.engine.as_mut() else { return Ok(None) };
        let cfg = &self.engine_config;
        match engine.request_move(&self.history, cfg.depth, cfg.reply_timeout(), cfg.retries) {
            Ok(best) => {
                self.history.push(best.to_string());
                let applied = self.apply_move(best.from, best.to, true);
                if let Err(e) = &applied {
                    warn!("engine move {} not playable on this board: {}", best, e);
                }
                Ok(Some(EngineReply { best, applied }))
            }
            Err(e @ (EngineError::Unavailable { .. } | EngineError::Exited | EngineError::Io(_))) => {
                error!("{}; continuing without the engine", e);
                self.disconnect_engine();
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn disconnect_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown(self.engine_config.shutdown_grace());
        }
    }

    /// Writes the session log to `filename` as JSON.
    pub fn save_stats(&self, filename: &str) -> Result<(), CommandError> {
        self.stats().save_to_file(filename)?;
        info!("session log saved to {}", filename);
        Ok(())
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            engine: self.engine.as_ref().and_then(|e| e.name().map(str::to_string)),
            moves: self.log.clone(),
            captured: self.board.captured().map(|(id, _)| id.to_string()).collect(),
            camera: self.view.camera,
            light: self.view.light,
            light_power: self.view.light_power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Spherical;
    use crate::coord::Vec3;
    use crate::error::SaveLoadError;
    use std::io;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: usize,
        probes: Vec<Vec3>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, _scene: &Scene<'_>) { self.frames += 1; }
        fn show_probe(&mut self, _scene: &Scene<'_>, probe: Vec3) { self.probes.push(probe); }
    }

    fn session() -> Session<RecordingRenderer> {
        Session::new(BoardState::standard().unwrap(), RecordingRenderer::default(), &Config::default())
    }

    fn sq(s: &str) -> Square { s.parse().unwrap() }

    #[test]
    fn move_command_commits_and_renders() {
        let mut s = session();
        let outcome = s.execute_line("move e2e4").unwrap();
        assert!(matches!(outcome, Outcome::Moved(ref r) if r.piece == "PEDONE134" && r.captured.is_none()));
        assert_eq!(s.board().piece_at(sq("e4").position()), Some("PEDONE134"));
        assert_eq!(s.history(), ["e2e4"]);
        assert_eq!(s.renderer().frames, 1);
        assert_eq!(s.renderer().probes, vec![sq("e3").position()]);
    }

    #[test]
    fn empty_source_square_is_a_missing_piece() {
        let mut s = session();
        let err = s.execute_line("move e4e5").unwrap_err();
        assert!(matches!(err, CommandError::Move(MoveError::PieceNotFound(from)) if from == sq("e4")));
        assert!(s.history().is_empty());
    }

    #[test]
    fn blocked_walk_stops_at_the_first_occupant() {
        let mut s = session();
        assert!(s.execute_line("move a1a8").is_err());
        assert_eq!(s.renderer().probes, vec![sq("a2").position()]);
    }

    #[test]
    fn illegal_shapes_are_not_walked() {
        let mut s = session();
        s.execute_line("move b2b4").unwrap();
        let before = s.renderer().probes.len();
        assert!(matches!(s.execute_line("move a1c3"), Err(CommandError::Move(MoveError::IllegalMovePattern(_)))));
        assert!(matches!(s.execute_line("move c1a4"), Err(CommandError::Move(MoveError::IllegalMovePattern(_)))));
        assert_eq!(s.renderer().probes.len(), before);
    }

    #[test]
    fn knights_are_not_probed() {
        let mut s = session();
        s.execute_line("move g1f3").unwrap();
        assert!(s.renderer().probes.is_empty());
    }

    #[test]
    fn view_commands_update_parameters() {
        let mut s = session();
        assert_eq!(s.execute_line("camera 30 90 20").unwrap(), Outcome::ViewChanged);
        assert_eq!(s.execute_line("light 60 180 12.5").unwrap(), Outcome::ViewChanged);
        assert_eq!(s.execute_line("power 150").unwrap(), Outcome::ViewChanged);
        assert_eq!(s.view().camera, Spherical::new(30.0, 90.0, 20.0));
        assert_eq!(s.view().light, Spherical::new(60.0, 180.0, 12.5));
        assert_eq!(s.view().light_power, 150.0);
        assert_eq!(s.renderer().frames, 3);
    }

    #[test]
    fn invalid_input_changes_nothing() {
        let mut s = session();
        let before = s.board().clone();
        assert!(matches!(s.execute_line("fly e2e4"), Err(CommandError::InvalidCommand(_))));
        assert!(matches!(s.execute_line("camera 5 10 10"), Err(CommandError::InvalidCommand(_))));
        for (id, rec) in before.iter() {
            assert_eq!(s.board().get(id), Some(rec));
        }
        assert_eq!(s.renderer().frames, 0);
        assert_eq!(s.execute_line("quit").unwrap(), Outcome::Quit);
    }

    #[test]
    fn no_engine_means_no_reply() {
        let mut s = session();
        s.execute_line("move e2e4").unwrap();
        assert!(s.engine_reply().unwrap().is_none());
    }

    #[test]
    fn engine_reply_is_played_for_the_other_side() {
        let mut s = session();
        let reader = io::Cursor::new(b"info depth 1\nbestmove e7e5 ponder g1f3\n".to_vec());
        s.attach_engine(EngineBridge::from_streams(reader, io::sink()));
        s.execute_line("move e2e4").unwrap();

        let reply = s.engine_reply().unwrap().unwrap();
        assert_eq!(reply.best.to_string(), "e7e5");
        let report = reply.applied.unwrap();
        assert_eq!(report.piece, "PEDONE124");
        assert_eq!(s.history(), ["e2e4", "e7e5"]);
        assert_eq!(s.stats().moves.len(), 2);
        assert!(s.stats().moves[1].by_engine);
    }

    #[test]
    fn unplayable_engine_reply_keeps_history_but_not_board() {
        let mut s = session();
        let reader = io::Cursor::new(b"bestmove e8g8\n".to_vec());
        s.attach_engine(EngineBridge::from_streams(reader, io::sink()));
        let reply = s.engine_reply().unwrap().unwrap();
        assert!(reply.applied.is_err());
        assert_eq!(s.history(), ["e8g8"]);
        assert_eq!(s.board().piece_at(sq("e8").position()), Some("RE01"));
    }

    #[test]
    fn dead_engine_is_detached() {
        let mut s = session();
        s.attach_engine(EngineBridge::from_streams(io::empty(), io::sink()));
        assert!(matches!(s.engine_reply(), Err(CommandError::Engine(EngineError::Exited))));
        assert!(!s.has_engine());
    }

    #[test]
    fn unwritable_session_log_is_a_save_error() {
        let s = session();
        let err = s.save_stats("/definitely/not/here/session.json").unwrap_err();
        assert!(matches!(err, CommandError::SaveLoad(SaveLoadError::Io(ref file, _)) if file == "/definitely/not/here/session.json"));
    }
}
