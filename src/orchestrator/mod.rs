//! Task dispatch: one invocation walks Pending -> (Registering) -> Preparing -> Running -> Completed.

pub mod executor;
pub mod state;

use std::path::{Path, PathBuf};

pub use executor::{classify_line, run_command, CommandSpec, Diagnostic};
pub use state::{DispatchState, TaskPhase};

use crate::cli::Cli;
use crate::config::HomeConfig;
use crate::engine::{BuildEngine, CancelHandle, MessageImportance};
use crate::error::AppError;
use crate::log_collector::{self, LogCollector, PARSED_TARGET};
use crate::models::{Architecture, BuildOptions, TaskKind, TaskOutcome};
use crate::system::paths::find_home_marker;
use crate::tasks::{build, clean, prepare, register, TaskContext};

/// Routes one set of options to its task and reports the outcome.
pub struct Dispatcher {
    home_config: HomeConfig,

    /// Starting point for home discovery during `register`
    cwd: PathBuf,

    /// Persists the session log when installed as the global logger
    log_collector: Option<LogCollector>,

    cancel: CancelHandle,
}

impl Dispatcher {
    pub fn new(home_config: HomeConfig, cwd: PathBuf) -> Self {
        Dispatcher {
            home_config,
            cwd,
            log_collector: None,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_log_collector(mut self, collector: LogCollector) -> Self {
        self.log_collector = Some(collector);
        self
    }

    /// Handle for the Ctrl-C watcher; cancels whatever task is running.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Parse raw CLI arguments and dispatch. Unknown task or arch yields 1.
    pub async fn run_cli(&self, cli: &Cli) -> i32 {
        match cli.to_options(&self.cwd) {
            Ok(options) => self.run(options).await,
            Err(e) => {
                log::error!("{}", AppError::from(e).user_message());
                1
            }
        }
    }

    /// Returns the process exit code: 0 on success, 1 on failure.
    pub async fn run(&self, options: BuildOptions) -> i32 {
        self.dispatch(&options).await.exit_code()
    }

    pub async fn dispatch(&self, options: &BuildOptions) -> TaskOutcome {
        let name = format!("{}/{}", options.task.as_str(), options.arch.as_str());
        let engine = BuildEngine::with_cancel(name, options.dry_run, &self.cancel);
        let mut state = DispatchState::new(options.task, options.arch);

        if let Err(e) = self.drive(&mut state, options, &engine).await {
            engine.log_error(e.user_message());
            state.record_error(e);
        }

        let outcome = state.outcome(engine.warnings(), engine.errors());
        log::info!(
            target: PARSED_TARGET,
            "{} {} {} in {}s ({} warning(s), {} error(s))",
            options.task.as_str(),
            options.arch.as_str(),
            if outcome.success { "succeeded" } else { "FAILED" },
            outcome.elapsed_secs,
            outcome.warnings,
            outcome.errors
        );

        if let Some(ref collector) = self.log_collector {
            if let Err(e) = collector.wait_for_empty().await {
                eprintln!("warning: log flush failed: {}", e);
            }
        }

        outcome
    }

    async fn drive(
        &self,
        state: &mut DispatchState,
        options: &BuildOptions,
        engine: &BuildEngine,
    ) -> Result<(), AppError> {
        if options.task == TaskKind::Register {
            state.transition_to(TaskPhase::Registering)?;
            register::run(&self.home_config, options.home.as_deref(), &self.cwd, engine)?;
            state.transition_to(TaskPhase::Completed)?;
            return Ok(());
        }

        if !self.home_config.is_registered() {
            state.transition_to(TaskPhase::Registering)?;
            engine.log_message(
                MessageImportance::High,
                format!(
                    "No Sokol.NET home registered in {}, running register first",
                    self.home_config.home_file().display()
                ),
            );
            // The home file is a prerequisite for every task, so it is
            // written even when the requested task is a dry run.
            let register_engine = BuildEngine::with_cancel("register", false, &self.cancel);
            let start = self.discovery_start(options);
            register::run(&self.home_config, options.home.as_deref(), start, &register_engine)?;
        }

        state.transition_to(TaskPhase::Preparing)?;
        let ctx = TaskContext::load(options, &self.home_config, engine)?;
        self.start_log_session(&ctx, options);

        state.transition_to(TaskPhase::Running)?;
        engine.milestone(format!(
            "{} {} for {} ({})",
            options.task.as_str(),
            options.arch.as_str(),
            ctx.settings.app_name,
            options.build_type.configuration()
        ));

        match (options.task, options.arch) {
            (TaskKind::Prepare, _) => prepare::run(&ctx).map(|_| ())?,
            (TaskKind::Clean, _) => clean::run(&ctx).map(|_| ())?,
            (TaskKind::Build, Architecture::Desktop) => build::desktop::run(&ctx).await?,
            (TaskKind::Build, Architecture::Web) => build::web::run(&ctx).await?,
            (TaskKind::Build, Architecture::Android) => build::android::run(&ctx).await?,
            (TaskKind::Build, Architecture::Ios) => build::ios::run(&ctx).await?,
            // handled above, before any project is loaded
            (TaskKind::Register, _) => {}
        }

        state.transition_to(TaskPhase::Completed)?;
        Ok(())
    }

    /// Where home discovery begins: the project when it sits inside a
    /// checkout, otherwise the working directory.
    fn discovery_start<'a>(&'a self, options: &'a BuildOptions) -> &'a Path {
        if find_home_marker(&options.project_path).is_some() {
            &options.project_path
        } else {
            &self.cwd
        }
    }

    fn start_log_session(&self, ctx: &TaskContext<'_>, options: &BuildOptions) {
        let Some(ref collector) = self.log_collector else {
            return;
        };
        let filename = log_collector::session_file_name(options.task.as_str(), options.arch.as_str());
        match collector.start_session(&ctx.paths.logs_dir(), &filename) {
            Ok(path) => ctx
                .engine
                .log_message(MessageImportance::Low, format!("Logging to {}", path.display())),
            Err(e) => log::warn!("[Dispatch] Session log disabled: {}", e),
        }
    }
}
