//! Sokol.NET application builder
//!
//! Build orchestration for Sokol.NET applications: one command line drives
//! `dotnet publish`, Gradle and Xcode to produce desktop, web, Android and iOS
//! packages from a single C# project.
//!
//! The system is organized into functional modules:
//! - **cli**: command line surface and option resolution
//! - **config**: per-user home registration and per-project `sokolnet.json`
//! - **engine**: build-engine shim every task logs through
//! - **error**: unified error type hierarchy
//! - **log_collector**: global logger with persisted session logs
//! - **models**: tasks, architectures and build options
//! - **orchestrator**: dispatch, phase tracking and process execution
//! - **system**: host detection, tool lookup and project paths
//! - **tasks**: register, prepare, clean and the per-architecture builds

// Core foundational modules
pub mod error;
pub mod models;

pub mod cli;
pub mod config;
pub mod engine;
pub mod system;

// Robust, decoupled logging system
pub mod log_collector;

pub mod orchestrator;
pub mod tasks;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

pub use error::{AppError, ConfigError, DispatchError, Result, TaskError};

pub use models::{Architecture, BuildOptions, BuildType, Orientation, TaskKind, TaskOutcome};

pub use config::{HomeConfig, ProjectSettings, ResolvedSettings};

pub use engine::{BuildEngine, CancelHandle, MessageImportance};

pub use orchestrator::{CommandSpec, DispatchState, Dispatcher, TaskPhase};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
