//! Decoupled logging pipeline for builder sessions.
//!
//! The collector is installed as the global `log` backend. Records are echoed
//! to stderr at the console level and, once a session is started, persisted
//! to a per-dispatch log file by a dedicated writer thread.
//!
//! # Architecture
//!
//! ```text
//! log::info!() / task output
//!     |
//! [LogCollector] (non-blocking, crossbeam unbounded channel)
//!     |
//! [writer thread]
//!     |-- <logs>/<ts>_<task>_<arch>.log         every line
//!     '-- <logs>/<ts>_<task>_<arch>.parsed.log  milestones (target "parsed")
//! ```
//!
//! Lines logged before a session starts are buffered and replayed into the
//! session file, so registration output is not lost.

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Lines kept in memory while no session file is open.
const PENDING_CAPACITY: usize = 2048;

/// Log target for high-level milestones.
pub const PARSED_TARGET: &str = "parsed";

/// Internal log line or special marker
enum LogMessage {
    Line(LogLine),
    /// Flush marker; the sender is signalled once everything before it is on disk
    Flush(tokio::sync::oneshot::Sender<()>),
}

/// Kind of log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKind {
    Full,
    Parsed,
}

/// A log line with metadata
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    pub kind: LogKind,
    /// Wall-clock time the line was created
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            kind: LogKind::Full,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    pub fn parsed(level: Level, message: String) -> Self {
        LogLine {
            kind: LogKind::Parsed,
            ..LogLine::new(level, message)
        }
    }

    fn format(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }
}

/// Session state with generation tracking for detecting session changes
#[derive(Clone, Debug, Default)]
struct SessionState {
    path: Option<PathBuf>,
    generation: u64,
}

/// Unified logger: console echo plus persisted session files
pub struct LogCollector {
    tx: Sender<LogMessage>,
    session_state: Arc<Mutex<SessionState>>,
    console_level: LevelFilter,
}

impl LogCollector {
    /// Create a collector and its writer thread.
    pub fn new(console_level: LevelFilter) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        let session_state = Arc::new(Mutex::new(SessionState::default()));
        let session_clone = Arc::clone(&session_state);

        // OS thread rather than a tokio task: it must keep draining even when
        // the runtime is shutting down.
        std::thread::spawn(move || {
            let mut full: Option<File> = None;
            let mut parsed: Option<File> = None;
            let mut last_generation = 0u64;
            let mut pending: Vec<LogLine> = Vec::new();

            while let Ok(msg) = rx.recv() {
                match msg {
                    LogMessage::Line(line) => {
                        let session = session_clone
                            .lock()
                            .map(|s| s.clone())
                            .unwrap_or_default();

                        if session.generation != last_generation {
                            full = None;
                            parsed = None;
                            last_generation = session.generation;
                            if let Some(ref path) = session.path {
                                full = open_append(path);
                                parsed = open_append(&parsed_path_for(path));
                                for old in pending.drain(..) {
                                    write_line(&mut full, &mut parsed, &old);
                                }
                            }
                        }

                        if full.is_some() {
                            write_line(&mut full, &mut parsed, &line);
                        } else if pending.len() < PENDING_CAPACITY {
                            pending.push(line);
                        }
                    }
                    LogMessage::Flush(done) => {
                        for file in [&mut full, &mut parsed].into_iter().flatten() {
                            let _ = file.flush();
                        }
                        let _ = done.send(());
                    }
                }
            }
        });

        LogCollector {
            tx,
            session_state,
            console_level,
        }
    }

    /// Install a clone of this collector as the global `log` backend.
    pub fn install(&self) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(self.file_level().max(self.console_level));
        Ok(())
    }

    /// Level persisted to session files, independent of the console level.
    fn file_level(&self) -> LevelFilter {
        LevelFilter::Debug
    }

    /// Start a session file `<log_dir>/<filename>`; later lines go there.
    pub fn start_session(&self, log_dir: &Path, filename: &str) -> Result<PathBuf, String> {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| format!("Failed to create logs directory: {}", e))?;
        let log_path = log_dir.join(filename);

        let mut session = self
            .session_state
            .lock()
            .map_err(|e| format!("Failed to lock session state: {}", e))?;
        session.path = Some(log_path.clone());
        session.generation = session.generation.wrapping_add(1);

        Ok(log_path)
    }

    pub fn session_log_path(&self) -> Option<PathBuf> {
        self.session_state
            .lock()
            .ok()
            .and_then(|session| session.path.clone())
    }

    /// Send a log line (non-blocking, cannot fail)
    fn log_line(&self, line: LogLine) {
        let _ = self.tx.send(LogMessage::Line(line));
    }

    /// Wait until every line sent before this call is written to disk.
    pub async fn wait_for_empty(&self) -> Result<(), String> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(LogMessage::Flush(tx))
            .map_err(|e| format!("Failed to send flush marker: {}", e))?;
        rx.await
            .map_err(|e| format!("Flush signal interrupted: {}", e))
    }
}

impl Clone for LogCollector {
    fn clone(&self) -> Self {
        LogCollector {
            tx: self.tx.clone(),
            session_state: Arc::clone(&self.session_state),
            console_level: self.console_level,
        }
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.console_level || metadata.level() <= self.file_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = record.args().to_string();

        if record.level() <= self.console_level {
            match record.level() {
                Level::Error => eprintln!("error: {}", message),
                Level::Warn => eprintln!("warning: {}", message),
                _ => eprintln!("{}", message),
            }
        }

        if record.level() <= self.file_level() {
            let line = if record.target() == PARSED_TARGET {
                LogLine::parsed(record.level(), message)
            } else {
                LogLine::new(record.level(), message)
            };
            self.log_line(line);
        }
    }

    fn flush(&self) {}
}

/// Map the CLI `-v` count to a console level.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `<ts>_<task>_<arch>.log`
pub fn session_file_name(task: &str, arch: &str) -> String {
    format!("{}_{}_{}.log", Local::now().format("%Y%m%d_%H%M%S"), task, arch)
}

fn parsed_path_for(path: &Path) -> PathBuf {
    path.with_extension("parsed.log")
}

fn open_append(path: &Path) -> Option<File> {
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn write_line(full: &mut Option<File>, parsed: &mut Option<File>, line: &LogLine) {
    let formatted = line.format();
    if let Some(file) = full.as_mut() {
        let _ = file.write_all(formatted.as_bytes());
    }
    if line.kind == LogKind::Parsed {
        if let Some(file) = parsed.as_mut() {
            let _ = file.write_all(formatted.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_lines_before_session_are_replayed() {
        let temp = TempDir::new().unwrap();
        let collector = LogCollector::new(LevelFilter::Off);

        collector.log_line(LogLine::new(Level::Info, "registered home".to_string()));
        let path = collector
            .start_session(&temp.path().join("logs"), "session.log")
            .unwrap();
        collector.log_line(LogLine::new(Level::Info, "building web".to_string()));
        collector.wait_for_empty().await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let first = content.find("registered home").expect("buffered line persisted");
        let second = content.find("building web").expect("live line persisted");
        assert!(first < second);
    }

    #[tokio::test]
    async fn test_parsed_lines_go_to_both_files() {
        let temp = TempDir::new().unwrap();
        let collector = LogCollector::new(LevelFilter::Off);
        let path = collector.start_session(temp.path(), "s.log").unwrap();

        collector.log_line(LogLine::parsed(Level::Info, "PHASE: Running".to_string()));
        collector.log_line(LogLine::new(Level::Info, "dotnet output".to_string()));
        collector.wait_for_empty().await.unwrap();

        let parsed = fs::read_to_string(temp.path().join("s.parsed.log")).unwrap();
        assert!(parsed.contains("PHASE: Running"));
        assert!(!parsed.contains("dotnet output"));
        let full = fs::read_to_string(&path).unwrap();
        assert!(full.contains("PHASE: Running") && full.contains("dotnet output"));
    }

    #[tokio::test]
    async fn test_new_session_switches_file() {
        let temp = TempDir::new().unwrap();
        let collector = LogCollector::new(LevelFilter::Off);

        let first = collector.start_session(temp.path(), "one.log").unwrap();
        collector.log_line(LogLine::new(Level::Info, "first".to_string()));
        collector.wait_for_empty().await.unwrap();

        let second = collector.start_session(temp.path(), "two.log").unwrap();
        collector.log_line(LogLine::new(Level::Info, "second".to_string()));
        collector.wait_for_empty().await.unwrap();

        assert!(!fs::read_to_string(&first).unwrap().contains("second"));
        assert!(fs::read_to_string(&second).unwrap().contains("second"));
        assert_eq!(collector.session_log_path(), Some(second));
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Info);
        assert_eq!(level_for_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(5), LevelFilter::Trace);
    }

    #[test]
    fn test_session_file_name_shape() {
        let name = session_file_name("build", "web");
        assert!(name.ends_with("_build_web.log"));
    }
}
