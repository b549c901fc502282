//! Core data types for the Sokol.NET application builder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::DispatchError;

/// Operation requested with `--task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Build,
    Clean,
    Register,
    Prepare,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Build => "build",
            TaskKind::Clean => "clean",
            TaskKind::Register => "register",
            TaskKind::Prepare => "prepare",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(TaskKind::Build),
            "clean" => Ok(TaskKind::Clean),
            "register" => Ok(TaskKind::Register),
            "prepare" => Ok(TaskKind::Prepare),
            _ => Err(DispatchError::UnknownTask(s.to_string())),
        }
    }
}

/// Target platform requested with `--arch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Android,
    Ios,
    Desktop,
    Web,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Android => "android",
            Architecture::Ios => "ios",
            Architecture::Desktop => "desktop",
            Architecture::Web => "web",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "android" => Ok(Architecture::Android),
            "ios" => Ok(Architecture::Ios),
            "desktop" | "windows" | "linux" | "macos" => Ok(Architecture::Desktop),
            "web" | "wasm" | "emscripten" => Ok(Architecture::Web),
            _ => Err(DispatchError::UnknownArch(s.to_string())),
        }
    }
}

/// MSBuild configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Debug,
    #[default]
    Release,
}

impl BuildType {
    /// Configuration name passed to `dotnet -c`.
    pub fn configuration(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.configuration())
    }
}

impl FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            _ => Err(format!("Unknown build type: {}", s)),
        }
    }
}

/// Screen orientation baked into the mobile templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
    #[default]
    Both,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Both => "both",
        }
    }
}

/// Fully resolved options for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub task: TaskKind,
    pub arch: Architecture,
    pub project_path: PathBuf,
    pub build_type: BuildType,
    /// Runtime identifier override (e.g. `linux-arm64`)
    pub rid: Option<String>,
    pub install: bool,
    pub device: Option<String>,
    pub output: Option<PathBuf>,
    /// Explicit sokol-net home; bypasses marker discovery during register
    pub home: Option<PathBuf>,
    pub dry_run: bool,
    pub force: bool,
    pub verbosity: u8,
}

impl BuildOptions {
    pub fn new(task: TaskKind, arch: Architecture, project_path: PathBuf) -> Self {
        BuildOptions {
            task,
            arch,
            project_path,
            build_type: BuildType::default(),
            rid: None,
            install: false,
            device: None,
            output: None,
            home: None,
            dry_run: false,
            force: false,
            verbosity: 0,
        }
    }
}

/// Outcome of a finished dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: TaskKind,
    pub arch: Architecture,
    pub success: bool,
    pub warnings: usize,
    pub errors: usize,
    pub elapsed_secs: u64,
}

impl TaskOutcome {
    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}
