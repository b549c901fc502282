//! Command line surface.
//!
//! `--task` and `--arch` are taken as plain strings and resolved by
//! [`Cli::to_options`], so an unknown value is a dispatch failure (exit code 1)
//! instead of a clap usage error.

use clap::Parser;
use std::path::PathBuf;

use crate::error::DispatchError;
use crate::models::{Architecture, BuildOptions, BuildType, TaskKind};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sokolnet-builder",
    version,
    about = "Build, prepare and package Sokol.NET applications for desktop, mobile and web"
)]
pub struct Cli {
    /// Task to run: build, clean, register or prepare
    #[arg(long)]
    pub task: String,

    /// Target platform: android, ios, desktop or web
    #[arg(long, alias = "architecture")]
    pub arch: Option<String>,

    /// Project directory containing the .csproj
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Build configuration
    #[arg(long = "type", ignore_case = true, value_parser = clap::builder::PossibleValuesParser::new(["debug", "release"]))]
    pub build_type: Option<String>,

    /// Runtime identifier override (e.g. linux-arm64, linux-bionic-x64)
    #[arg(long)]
    pub rid: Option<String>,

    /// Install the built package on a connected device (android, ios)
    #[arg(long)]
    pub install: bool,

    /// Device identifier for --install
    #[arg(long)]
    pub device: Option<String>,

    /// Output directory (defaults to <path>/output/<arch>/<Configuration>)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Sokol.NET home directory to register
    #[arg(long)]
    pub home: Option<PathBuf>,

    /// Directory holding the sokolnet_home file
    #[arg(long, hide = true)]
    pub config_dir: Option<PathBuf>,

    /// Log the commands that would run without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite existing platform files during prepare
    #[arg(long)]
    pub force: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolve raw arguments into typed options.
    ///
    /// `cwd` is used when `--path` is omitted.
    pub fn to_options(&self, cwd: &std::path::Path) -> Result<BuildOptions, DispatchError> {
        let task: TaskKind = self.task.parse()?;

        let arch = match (&self.arch, task) {
            (Some(raw), _) => raw.parse::<Architecture>()?,
            (None, TaskKind::Register) => Architecture::Desktop,
            (None, _) => return Err(DispatchError::MissingOption("--arch".to_string())),
        };

        let project_path = match &self.path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => cwd.join(p),
            None => cwd.to_path_buf(),
        };

        let build_type = match &self.build_type {
            // Restricted to known values by the clap parser
            Some(raw) => raw.parse::<BuildType>().unwrap_or_default(),
            None => BuildType::default(),
        };

        Ok(BuildOptions {
            task,
            arch,
            project_path,
            build_type,
            rid: self.rid.clone(),
            install: self.install,
            device: self.device.clone(),
            output: self.output.as_ref().map(|o| {
                if o.is_absolute() {
                    o.clone()
                } else {
                    cwd.join(o)
                }
            }),
            home: self.home.clone(),
            dry_run: self.dry_run,
            force: self.force,
            verbosity: self.verbose,
        })
    }
}
