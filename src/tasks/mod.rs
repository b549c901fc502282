//! Task implementations routed by the dispatcher.
//!
//! - **register**: record the Sokol.NET home in `~/.sokolnet_config/sokolnet_home`
//! - **prepare**: instantiate the native platform project from `templates/<arch>`
//! - **clean**: remove build outputs for one architecture
//! - **build**: publish and package for desktop, web, android or ios
//!
//! Every task except register runs against a [`TaskContext`].

pub mod build;
pub mod clean;
pub mod prepare;
pub mod register;

use std::path::{Path, PathBuf};

use crate::config::{HomeConfig, ProjectSettings, ResolvedSettings};
use crate::engine::{BuildEngine, MessageImportance};
use crate::error::TaskError;
use crate::models::BuildOptions;
use crate::system::{self, paths::ProjectPaths};

/// Everything a project task needs.
pub struct TaskContext<'a> {
    pub options: &'a BuildOptions,
    pub engine: &'a BuildEngine,
    /// Registered Sokol.NET home
    pub home: PathBuf,
    pub paths: ProjectPaths,
    pub settings: ResolvedSettings,
}

impl<'a> TaskContext<'a> {
    /// Validate the project directory and load its settings.
    pub fn load(
        options: &'a BuildOptions,
        home_config: &HomeConfig,
        engine: &'a BuildEngine,
    ) -> Result<Self, TaskError> {
        system::validate_project_path(&options.project_path)?;
        let paths = ProjectPaths::locate(&options.project_path)?;
        let settings = ProjectSettings::load(paths.root())?.resolve(&paths)?;
        let home = home_config.load_home()?;

        engine.log_message(
            MessageImportance::Low,
            format!(
                "Project {} ({}), home {}",
                settings.app_name,
                paths.csproj().display(),
                home.display()
            ),
        );

        Ok(TaskContext {
            options,
            engine,
            home,
            paths,
            settings,
        })
    }

    /// `--output` if given, else `<project>/output/<arch>/<Configuration>`.
    pub fn output_dir(&self) -> PathBuf {
        self.options
            .output
            .clone()
            .unwrap_or_else(|| self.paths.output_dir(self.options.arch, self.options.build_type))
    }

    /// Check that `tool` is on PATH; skipped in dry-run mode.
    pub fn require_tool(&self, tool: &str) -> Result<(), TaskError> {
        if self.engine.is_dry_run() {
            self.engine
                .log_message(MessageImportance::Low, format!("[dry-run] requires {}", tool));
            return Ok(());
        }
        let found = system::require_tool(tool)?;
        self.engine
            .log_message(MessageImportance::Low, format!("Using {}", found.display()));
        Ok(())
    }

    /// Copy the project's assets directory into `dest`. Missing assets are not
    /// an error; many examples have none.
    pub fn copy_assets(&self, dest: &Path) -> Result<usize, TaskError> {
        let src = &self.settings.assets_dir;
        if !src.is_dir() {
            self.engine.log_message(
                MessageImportance::Low,
                format!("No assets directory at {}", src.display()),
            );
            return Ok(0);
        }

        if self.engine.is_dry_run() {
            self.engine.log_message(
                MessageImportance::Normal,
                format!("[dry-run] copy {} -> {}", src.display(), dest.display()),
            );
            return Ok(0);
        }

        let copied = system::copy_dir_recursive(src, dest)?;
        self.engine.log_message(
            MessageImportance::Normal,
            format!("Copied {} asset file(s) to {}", copied, dest.display()),
        );
        Ok(copied)
    }
}
