//! External UCI engine as a move provider.
//!
//! The engine runs as a child process. A reader thread forwards its stdout
//! line by line so that every wait can be bounded by a timeout; everything
//! else happens on the caller's thread.

use chess_core::{parse_uci_move, Move};
use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::provider::{MoveProvider, MoveQuery};

/// How long to wait for a `quit` to take effect before killing the process.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// How to launch and set up one engine.
#[derive(Debug, Clone)]
pub struct UciEngineConfig {
    pub path: PathBuf,
    /// Extra command line arguments for the engine process
    pub args: Vec<String>,
    /// Display name; falls back to the engine's `id name`, then the file stem
    pub name: Option<String>,
    /// `setoption` pairs sent after the handshake
    pub options: Vec<(String, String)>,
    /// Longest silence tolerated from the engine (None = wait forever)
    pub timeout: Option<Duration>,
}

impl UciEngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            name: None,
            options: Vec::new(),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

pub struct UciEngine {
    name: String,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    timeout: Option<Duration>,
    advertised: HashSet<String>,
    closed: bool,
}

impl UciEngine {
    /// Start the process and complete the `uci` / `isready` handshake.
    pub fn spawn(cfg: &UciEngineConfig) -> Result<Self, ProviderError> {
        let mut child = Command::new(&cfg.path)
            .args(&cfg.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProviderError::Spawn {
                path: cfg.path.display().to_string(),
                source,
            })?;

        let fallback_name = file_stem(&cfg.path);
        let pipe_error = |what: &str| ProviderError::Io {
            name: fallback_name.clone(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, format!("no {}", what)),
        };
        let stdin = match child.stdin.take() {
            Some(s) => s,
            None => {
                let _ = child.kill();
                return Err(pipe_error("stdin"));
            }
        };
        let stdout = match child.stdout.take() {
            Some(s) => s,
            None => {
                let _ = child.kill();
                return Err(pipe_error("stdout"));
            }
        };

        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut engine = Self {
            name: cfg.name.clone().unwrap_or(fallback_name),
            child,
            stdin: BufWriter::new(stdin),
            rx,
            timeout: cfg.timeout,
            advertised: HashSet::new(),
            closed: false,
        };
        if let Err(e) = engine.initialize(cfg) {
            engine.shutdown();
            return Err(e);
        }
        info!(engine = %engine.name, path = %cfg.path.display(), "engine ready");
        Ok(engine)
    }

    fn initialize(&mut self, cfg: &UciEngineConfig) -> Result<(), ProviderError> {
        self.write_line("uci")?;
        loop {
            let line = self.recv_line(self.timeout)?;
            if let Some(id) = line.strip_prefix("id name ") {
                if cfg.name.is_none() {
                    self.name = id.trim().to_string();
                }
            } else if let Some(rest) = line.strip_prefix("option name ") {
                if let Some(name) = parse_option_name(rest) {
                    self.advertised.insert(name);
                }
            } else if line.trim() == "uciok" {
                break;
            }
        }

        for (name, value) in &cfg.options {
            if !self.advertised.contains(name) {
                warn!(engine = %self.name, option = %name, "option not advertised by engine");
            }
            self.write_line(&format!("setoption name {} value {}", name, value))?;
        }
        self.sync_ready()
    }

    fn sync_ready(&mut self) -> Result<(), ProviderError> {
        self.write_line("isready")?;
        loop {
            let line = self.recv_line(self.timeout)?;
            if line.trim() == "readyok" {
                return Ok(());
            }
        }
    }

    fn recv_line(&self, timeout: Option<Duration>) -> Result<String, ProviderError> {
        let line = match timeout {
            Some(t) => self.rx.recv_timeout(t).map_err(|e| match e {
                RecvTimeoutError::Timeout => ProviderError::Timeout {
                    name: self.name.clone(),
                    waited: t,
                },
                RecvTimeoutError::Disconnected => ProviderError::Exited {
                    name: self.name.clone(),
                },
            })?,
            None => self.rx.recv().map_err(|_| ProviderError::Exited {
                name: self.name.clone(),
            })?,
        };
        debug!(engine = %self.name, "<< {}", line);
        Ok(line)
    }

    fn write_line(&mut self, msg: &str) -> Result<(), ProviderError> {
        debug!(engine = %self.name, ">> {}", msg);
        let name = &self.name;
        let io = |source| ProviderError::Io {
            name: name.clone(),
            source,
        };
        self.stdin.write_all(msg.as_bytes()).map_err(io)?;
        self.stdin.write_all(b"\n").map_err(io)?;
        self.stdin.flush().map_err(io)
    }
}

impl MoveProvider for UciEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn new_game(&mut self) -> Result<(), ProviderError> {
        self.write_line("ucinewgame")?;
        self.sync_ready()
    }

    fn propose(&mut self, query: &MoveQuery) -> Result<Option<Move>, ProviderError> {
        self.write_line(&query.setup)?;
        self.write_line(&query.budget.go_command())?;

        // Silence is measured per line; a movetime search may stay quiet for
        // its whole budget before the first one
        let mut wait = self
            .timeout
            .map(|t| t + query.budget.expected_time().unwrap_or_default());
        loop {
            let line = self.recv_line(wait)?;
            wait = self.timeout;
            let Some(rest) = line.strip_prefix("bestmove") else {
                continue;
            };
            let token = rest.split_whitespace().next().unwrap_or("(none)");
            return parse_uci_move(&query.board, token).map_err(|_| ProviderError::Malformed {
                name: self.name.clone(),
                line: line.clone(),
            });
        }
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.write_line("quit");
        let deadline = Instant::now() + QUIT_GRACE;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                debug!(engine = %self.name, "engine exited");
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        warn!(engine = %self.name, "engine ignored quit, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Name part of `option name <name> type ...`; names may contain spaces.
fn parse_option_name(rest: &str) -> Option<String> {
    let name = match rest.find(" type ") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
