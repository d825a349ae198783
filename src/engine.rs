// src/engine.rs
//! Bridge to an external UCI engine over its standard streams.
//!
//! A reader thread performs bounded reads on the engine's stdout and hands
//! the raw chunks over a channel. [`LineFramer`] reassembles them into
//! complete lines, so a token split across two reads is still seen whole.
//! Every wait is bounded by a timeout.

use log::{debug, info, trace, warn};
use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::coord::Square;
use crate::error::EngineError;

// --- Constants ---
/// Largest single read from the engine's output.
pub const READ_BUFFER_SIZE: usize = 4096;
const BESTMOVE_TOKEN: &str = "bestmove";
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(500);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// --- Line Framing ---

/// Buffers raw output across reads and yields newline-terminated lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self { Self::default() }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator (`\n` or `\r\n`).
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes received after the last complete line.
    pub fn pending(&self) -> usize { self.buffer.len() }

    /// Drains an unterminated tail, used once the stream has ended.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail: Vec<u8> = self.buffer.drain(..).collect();
        Some(String::from_utf8_lossy(&tail).trim_end_matches('\r').to_string())
    }
}

// --- Best Move ---

/// A parsed `bestmove` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<char>,
    pub ponder: Option<String>,
}

impl BestMove {
    /// Parses `bestmove <from><to>[q|r|b|n] [ponder <move>]`.
    pub fn parse(line: &str) -> Result<BestMove, EngineError> {
        let protocol = || EngineError::Protocol(line.to_string());
        let mut words = line.split_whitespace();
        if words.next() != Some(BESTMOVE_TOKEN) {
            return Err(protocol());
        }
        let mv = words.next().ok_or_else(protocol)?;
        if mv == "(none)" || mv == "0000" {
            return Err(EngineError::NoMove);
        }
        if !mv.is_ascii() || !(4..=5).contains(&mv.len()) {
            return Err(protocol());
        }
        let from = mv[0..2].parse::<Square>().map_err(|_| protocol())?;
        let to = mv[2..4].parse::<Square>().map_err(|_| protocol())?;
        let promotion = match mv[4..].chars().next() {
            None => None,
            Some(c @ ('q' | 'r' | 'b' | 'n')) => Some(c),
            Some(_) => return Err(protocol()),
        };
        let ponder = match words.next() {
            Some("ponder") => words.next().map(str::to_string),
            _ => None,
        };
        Ok(BestMove { from, to, promotion, ponder })
    }
}

impl fmt::Display for BestMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion { write!(f, "{}", p)?; }
        Ok(())
    }
}

/// `position startpos [moves ...]` for the moves played so far.
pub fn position_command(moves: &[String]) -> String {
    if moves.is_empty() {
        "position startpos".to_string()
    } else {
        format!("position startpos moves {}", moves.join(" "))
    }
}

// --- Engine Bridge ---

pub struct EngineBridge {
    writer: Box<dyn Write + Send>,
    chunks: Receiver<Vec<u8>>,
    framer: LineFramer,
    child: Option<Child>,
    name: Option<String>,
    closed: bool,
}

impl fmt::Debug for EngineBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBridge")
            .field("name", &self.name)
            .field("pid", &self.child.as_ref().map(Child::id))
            .field("buffered", &self.framer.pending())
            .finish()
    }
}

impl EngineBridge {
    /// Launches the engine, wires its stdin/stdout to pipes and runs the
    /// `uci` / `isready` handshake.
    pub fn start(config: &EngineConfig) -> Result<Self, EngineError> {
        info!("starting engine '{}'", config.path);
        let launch_error = |source: io::Error| EngineError::Launch { path: config.path.clone(), source };
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(launch_error)?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let Some((stdin, stdout)) = pipes else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(launch_error(io::Error::new(io::ErrorKind::Other, "engine pipes were not captured")));
        };

        let mut bridge = EngineBridge::from_streams(stdout, stdin);
        bridge.child = Some(child);
        bridge.handshake(config.handshake_timeout())?;
        Ok(bridge)
    }

    /// Bridge over arbitrary streams; no process is owned.
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        // Detached: the thread ends when the stream reaches EOF or the
        // bridge drops its receiver.
        thread::spawn(move || {
            let mut reader = reader;
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() { break; }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("engine read failed: {}", e);
                        break;
                    }
                }
            }
        });
        EngineBridge {
            writer: Box::new(writer),
            chunks: rx,
            framer: LineFramer::new(),
            child: None,
            name: None,
            closed: false,
        }
    }

    /// Engine name from its `id name` line, once the handshake has run.
    pub fn name(&self) -> Option<&str> { self.name.as_deref() }

    pub fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send("uci")?;
        self.wait_for("uciok", timeout)?;
        self.send("isready")?;
        self.wait_for("readyok", timeout)?;
        info!("engine ready: {}", self.name.as_deref().unwrap_or("unnamed"));
        Ok(())
    }

    fn wait_for(&mut self, token: &str, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Timeout(timeout));
            }
            let line = self.read_line(remaining).map_err(|e| match e {
                EngineError::Timeout(_) => EngineError::Timeout(timeout),
                other => other,
            })?;
            let line = line.trim();
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.trim().to_string());
            }
            if line == token {
                return Ok(());
            }
        }
    }

    /// Writes `command` plus a newline and flushes it to the engine.
    pub fn send(&mut self, command: &str) -> Result<(), EngineError> {
        if self.closed {
            return Err(EngineError::Exited);
        }
        debug!("engine <- {}", command);
        self.writer.write_all(format!("{}\n", command).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// One non-blocking read of whatever output has arrived, unframed.
    /// May hold part of a line, several lines, or nothing.
    /// Do not mix with [`read_line`](Self::read_line) on the same bridge.
    pub fn read_raw(&mut self) -> Result<String, EngineError> {
        match self.chunks.try_recv() {
            Ok(chunk) => Ok(String::from_utf8_lossy(&chunk).into_owned()),
            Err(TryRecvError::Empty) => Ok(String::new()),
            Err(TryRecvError::Disconnected) => Err(EngineError::Exited),
        }
    }

    /// Next complete line, waiting at most `timeout` for it.
    pub fn read_line(&mut self, timeout: Duration) -> Result<String, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(line) = self.framer.next_line() {
                trace!("engine -> {}", line);
                return Ok(line);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.chunks.recv_timeout(remaining) {
                Ok(chunk) => self.framer.push(&chunk),
                Err(RecvTimeoutError::Timeout) => return Err(EngineError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => {
                    return self.framer.take_partial().ok_or(EngineError::Exited);
                }
            }
        }
    }

    /// Reads lines until a `bestmove` reply arrives or `timeout` runs out.
    pub fn await_best_move(&mut self, timeout: Duration) -> Result<BestMove, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Timeout(timeout));
            }
            let line = match self.read_line(remaining) {
                Ok(line) => line,
                Err(EngineError::Timeout(_)) => return Err(EngineError::Timeout(timeout)),
                Err(e) => return Err(e),
            };
            if line.trim_start().starts_with(BESTMOVE_TOKEN) {
                return BestMove::parse(line.trim());
            }
        }
    }

    /// Sends the game so far, starts a search and waits for the reply.
    /// A timeout is answered with `stop` and another wait, `retries` times,
    /// before the engine is declared unavailable.
    pub fn request_move(&mut self, moves: &[String], depth: u32, timeout: Duration, retries: u32) -> Result<BestMove, EngineError> {
        self.send(&position_command(moves))?;
        self.send(&format!("go depth {}", depth))?;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.await_best_move(timeout) {
                Err(EngineError::Timeout(limit)) if attempts <= retries => {
                    warn!("engine silent for {} ms, sending stop (attempt {} of {})", limit.as_millis(), attempts, retries + 1);
                    self.send("stop")?;
                }
                Err(EngineError::Timeout(_)) => return Err(EngineError::Unavailable { attempts }),
                other => return other,
            }
        }
    }

    /// Asks the engine to quit, closes its input, waits up to `grace` for
    /// the process to exit and kills it otherwise.
    pub fn shutdown(&mut self, grace: Duration) {
        if self.closed {
            return;
        }
        if let Err(e) = self.send("quit") {
            debug!("could not send quit: {}", e);
        }
        self.closed = true;
        self.writer = Box::new(io::sink());

        let Some(mut child) = self.child.take() else { return };
        let deadline = Instant::now() + grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("engine exited with {}", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => break,
                Err(e) => {
                    warn!("cannot poll engine process: {}", e);
                    break;
                }
            }
        }
        warn!("engine did not exit within {} ms, killing it", grace.as_millis());
        if let Err(e) = child.kill() {
            warn!("failed to kill engine: {}", e);
        }
        let _ = child.wait();
    }
}

impl Drop for EngineBridge {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_GRACE);
    }
}
