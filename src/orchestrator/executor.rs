//! External process execution: spawning toolchain commands, streaming their
//! output through the build engine, and classifying diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::engine::{BuildEngine, MessageImportance};
use crate::error::TaskError;

/// `Program.cs(12,5): error CS1002: ; expected`
static MSBUILD_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s:])error\s+[A-Za-z]+\d+\s*:").expect("valid regex"));

static MSBUILD_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[\s:])warning\s+[A-Za-z]+\d+\s*:").expect("valid regex"));

/// `main.m:10:3: error: ...` from clang / xcodebuild
static CLANG_DIAGNOSTIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\d+:\d+:\s+(error|warning):").expect("valid regex"));

/// Severity of a recognised toolchain diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    Error,
    Warning,
}

/// Classify one line of MSBuild, Gradle or xcodebuild output.
pub fn classify_line(line: &str) -> Option<Diagnostic> {
    let trimmed = line.trim_start();

    if trimmed.starts_with("FAILURE:") || trimmed.contains("BUILD FAILED") {
        return Some(Diagnostic::Error);
    }

    if let Some(caps) = CLANG_DIAGNOSTIC.captures(line) {
        return match &caps[1] {
            "error" => Some(Diagnostic::Error),
            _ => Some(Diagnostic::Warning),
        };
    }

    if MSBUILD_ERROR.is_match(line) {
        return Some(Diagnostic::Error);
    }

    if MSBUILD_WARNING.is_match(line) {
        return Some(Diagnostic::Warning);
    }

    None
}

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path argument, converted lossily.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().to_string();
        self.arg(arg)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// Run `spec` to completion, streaming stdout and stderr into `engine`.
///
/// Returns `Ok(())` on a zero exit status. In dry-run mode the command is only
/// logged.
pub async fn run_command(spec: &CommandSpec, engine: &BuildEngine) -> Result<(), TaskError> {
    if engine.is_dry_run() {
        engine.log_message(MessageImportance::High, format!("[dry-run] {}", spec));
        return Ok(());
    }

    let mut cancel_rx = engine.cancel_receiver();
    if *cancel_rx.borrow() {
        return Err(TaskError::Cancelled);
    }

    engine.milestone(format!("Running: {}", spec));
    if let Some(ref cwd) = spec.cwd {
        engine.log_message(MessageImportance::Low, format!("  in {}", cwd.display()));
    }

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref cwd) = spec.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    let mut child = command.spawn().map_err(|e| TaskError::Spawn {
        command: spec.to_string(),
        reason: e.to_string(),
    })?;

    let stdout = child.stdout.take().ok_or_else(|| TaskError::Spawn {
        command: spec.to_string(),
        reason: "Failed to capture stdout".to_string(),
    })?;
    let stderr = child.stderr.take().ok_or_else(|| TaskError::Spawn {
        command: spec.to_string(),
        reason: "Failed to capture stderr".to_string(),
    })?;

    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();
    let mut stdout_closed = false;
    let mut stderr_closed = false;

    // MSBuild repeats every diagnostic in its closing summary
    let mut seen_diagnostics: HashSet<String> = HashSet::new();

    while !(stdout_closed && stderr_closed) {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_closed => match line {
                Ok(Some(line)) => report_line(engine, &line, false, &mut seen_diagnostics),
                Ok(None) => stdout_closed = true,
                Err(e) => {
                    engine.log_warning(format!("stdout read error: {}", e));
                    stdout_closed = true;
                }
            },
            line = stderr_lines.next_line(), if !stderr_closed => match line {
                Ok(Some(line)) => report_line(engine, &line, true, &mut seen_diagnostics),
                Ok(None) => stderr_closed = true,
                Err(e) => {
                    engine.log_warning(format!("stderr read error: {}", e));
                    stderr_closed = true;
                }
            },
            changed = cancel_rx.changed() => {
                if changed.is_ok() && *cancel_rx.borrow() {
                    engine.log_message(MessageImportance::High, format!("Cancelling {}", spec.program));
                    if let Err(e) = child.kill().await {
                        engine.log_warning(format!("Failed to kill {}: {}", spec.program, e));
                    }
                    return Err(TaskError::Cancelled);
                }
            }
        }
    }

    // Pipes closed; the child may still be running with its stdio detached
    let mut watch_cancel = true;
    let status = loop {
        let cancel_requested = tokio::select! {
            status = child.wait() => break status?,
            changed = cancel_rx.changed(), if watch_cancel => match changed {
                Ok(()) => *cancel_rx.borrow(),
                Err(_) => {
                    watch_cancel = false;
                    false
                }
            },
        };
        if cancel_requested {
            engine.log_message(MessageImportance::High, format!("Cancelling {}", spec.program));
            if let Err(e) = child.kill().await {
                engine.log_warning(format!("Failed to kill {}: {}", spec.program, e));
            }
            return Err(TaskError::Cancelled);
        }
    };

    if status.success() {
        engine.log_message(MessageImportance::Low, format!("{} exited successfully", spec.program));
        Ok(())
    } else {
        Err(TaskError::ProcessFailed {
            command: spec.to_string(),
            code: status.code(),
        })
    }
}

fn report_line(engine: &BuildEngine, line: &str, is_stderr: bool, seen: &mut HashSet<String>) {
    match classify_line(line) {
        Some(kind) => {
            if !seen.insert(line.trim().to_string()) {
                engine.log_message(MessageImportance::Low, line);
                return;
            }
            match kind {
                Diagnostic::Error => engine.log_error(line),
                Diagnostic::Warning => engine.log_warning(line),
            }
        }
        None if is_stderr => engine.log_message(MessageImportance::Normal, format!("[stderr] {}", line)),
        None => engine.log_message(MessageImportance::Normal, line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_msbuild_diagnostics() {
        assert_eq!(
            classify_line("/src/Cube.cs(12,5): error CS1002: ; expected [/src/Cube.csproj]"),
            Some(Diagnostic::Error)
        );
        assert_eq!(
            classify_line("/src/Cube.cs(3,7): warning CS0168: The variable 'e' is declared"),
            Some(Diagnostic::Warning)
        );
        assert_eq!(
            classify_line("ILC: warning IL3050: Using member requires dynamic code"),
            Some(Diagnostic::Warning)
        );
    }

    #[test]
    fn test_classify_gradle_and_clang() {
        assert_eq!(classify_line("FAILURE: Build failed with an exception."), Some(Diagnostic::Error));
        assert_eq!(classify_line("** BUILD FAILED **"), Some(Diagnostic::Error));
        assert_eq!(
            classify_line("main.m:10:3: error: use of undeclared identifier"),
            Some(Diagnostic::Error)
        );
        assert_eq!(
            classify_line("sokol_app.h:42:1: warning: unused function"),
            Some(Diagnostic::Warning)
        );
    }

    #[test]
    fn test_classify_plain_output() {
        assert_eq!(classify_line("  Determining projects to restore..."), None);
        assert_eq!(classify_line("Build succeeded."), None);
        assert_eq!(classify_line("    0 Warning(s)"), None);
        assert_eq!(classify_line("    0 Error(s)"), None);
        assert_eq!(classify_line("> Task :app:assembleRelease"), None);
    }

    #[test]
    fn test_command_spec_display_quotes_spaces() {
        let spec = CommandSpec::new("dotnet")
            .args(["publish", "-c", "Release"])
            .arg("/my projects/Cube.csproj");
        assert_eq!(
            spec.to_string(),
            "dotnet publish -c Release \"/my projects/Cube.csproj\""
        );
        assert!(spec.has_arg("publish"));
        assert!(!spec.has_arg("build"));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_spawn() {
        let engine = BuildEngine::new("test", true);
        let spec = CommandSpec::new("sokolnet-program-that-does-not-exist");
        assert!(run_command(&spec, &engine).await.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let engine = BuildEngine::new("test", false);
        let spec = CommandSpec::new("sokolnet-program-that-does-not-exist");
        let result = run_command(&spec, &engine).await;
        assert!(matches!(result, Err(TaskError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_streams_output_and_counts_diagnostics() {
        let engine = BuildEngine::new("test", false);
        let script = "echo 'Cube.cs(1,1): warning CS0168: unused'; \
                      echo 'Cube.cs(1,1): warning CS0168: unused'; \
                      echo 'Cube.cs(2,1): error CS1002: ; expected' >&2; \
                      echo done";
        let spec = CommandSpec::new("sh").args(["-c", script]);

        run_command(&spec, &engine).await.expect("script exits 0");

        assert_eq!(engine.warnings(), 1, "repeated diagnostic counted once");
        assert_eq!(engine.errors(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_process_failed() {
        let engine = BuildEngine::new("test", false);
        let spec = CommandSpec::new("sh").args(["-c", "exit 3"]);
        let result = run_command(&spec, &engine).await;
        assert!(matches!(result, Err(TaskError::ProcessFailed { code: Some(3), .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_child() {
        let engine = BuildEngine::new("test", false);
        let handle = engine.cancel_handle();
        let spec = CommandSpec::new("sh").args(["-c", "sleep 30"]);

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            handle.cancel();
        });

        let started = std::time::Instant::now();
        let result = run_command(&spec, &engine).await;
        assert!(matches!(result, Err(TaskError::Cancelled)));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_after_stdio_closed() {
        let engine = BuildEngine::new("test", false);
        let handle = engine.cancel_handle();
        let spec = CommandSpec::new("sh").args(["-c", "exec >/dev/null 2>&1; sleep 30"]);

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            handle.cancel();
        });

        let started = std::time::Instant::now();
        let result = run_command(&spec, &engine).await;
        assert!(matches!(result, Err(TaskError::Cancelled)));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
