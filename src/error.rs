//! Unified error type hierarchy for the Sokol.NET application builder
//!
//! Provides structured error handling with ConfigError, TaskError, DispatchError
//! and AppError.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Home registration and project settings errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Failures raised while a build task is executing.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid project: {0}")]
    InvalidProject(String),

    #[error("Required tool '{0}' was not found in PATH")]
    ToolMissing(String),

    #[error("Required environment variable not set: {0}")]
    MissingEnvironment(String),

    #[error("No template found for {arch} at {}", .path.display())]
    MissingTemplate { arch: String, path: PathBuf },

    #[error("Task is not supported on this host: {0}")]
    UnsupportedHost(String),

    #[error("Failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("Command '{command}' failed with {}", exit_description(.code))]
    ProcessFailed { command: String, code: Option<i32> },

    #[error("Expected build artifact missing: {0}")]
    ArtifactMissing(String),

    #[error("Task cancelled by user")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Routing errors raised before any task runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown task '{0}' (expected one of: build, clean, register, prepare)")]
    UnknownTask(String),

    #[error("Unknown architecture '{0}' (expected one of: android, ios, desktop, web)")]
    UnknownArch(String),

    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Global error type surfaced to the user at the end of a dispatch.
///
/// Cloneable so it can be stored in the dispatch state and printed in the summary.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// External tool exited unsuccessfully (dotnet, gradlew, adb, xcodebuild)
    #[error("Command '{cmd}' failed: {reason}")]
    OsCommand { cmd: String, reason: String },

    /// Home registration or sokolnet.json problem
    #[error("Settings error: {0}")]
    Settings(String),

    /// File I/O error (read/write/delete)
    #[error("I/O error: {0}")]
    Io(String),

    /// Bad --task / --arch / --path input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Host or environment cannot run the requested task
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Cancelled")]
    Cancelled,
}

impl AppError {
    /// Get a user-facing error message suitable for the final summary line
    pub fn user_message(&self) -> String {
        match self {
            AppError::OsCommand { cmd, reason } => {
                format!("Failed to execute '{}': {}", cmd, reason)
            }
            AppError::Settings(msg) => format!("Settings error: {}", msg),
            AppError::Io(msg) => format!("File operation failed: {}", msg),
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            AppError::Environment(msg) => format!("Build environment not ready: {}", msg),
            AppError::Cancelled => "Task cancelled by user".to_string(),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::ProcessFailed { command, code } => AppError::OsCommand {
                cmd: command,
                reason: exit_description(&code),
            },
            TaskError::Spawn { command, reason } => AppError::OsCommand { cmd: command, reason },
            TaskError::InvalidProject(msg) => AppError::InvalidInput(msg),
            TaskError::ToolMissing(_)
            | TaskError::MissingEnvironment(_)
            | TaskError::UnsupportedHost(_)
            | TaskError::MissingTemplate { .. } => AppError::Environment(e.to_string()),
            TaskError::ArtifactMissing(msg) => AppError::Io(msg),
            TaskError::Cancelled => AppError::Cancelled,
            TaskError::Config(inner) => AppError::Settings(inner.to_string()),
            TaskError::Io(inner) => AppError::Io(inner.to_string()),
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Settings(e.to_string())
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

/// Top-level result type for glue code.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
