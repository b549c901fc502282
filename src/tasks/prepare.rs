//! `prepare`: instantiate `<home>/templates/<arch>` into `<project>/platform/<arch>`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::MessageImportance;
use crate::error::TaskError;
use crate::models::Architecture;

use super::TaskContext;

/// Files written and kept by one prepare run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrepareReport {
    pub written: usize,
    pub skipped: usize,
    /// Set when the template tree was absent and the arch allows it.
    pub no_template: bool,
}

/// Placeholder values for one project. Keys are written without braces.
pub fn placeholders(ctx: &TaskContext<'_>) -> BTreeMap<&'static str, String> {
    let mut vars = BTreeMap::new();
    vars.insert("APP_NAME", ctx.settings.app_name.clone());
    vars.insert("PACKAGE_ID", ctx.settings.package_id.clone());
    vars.insert("VERSION", ctx.settings.version.clone());
    vars.insert("ORIENTATION", ctx.settings.orientation.as_str().to_string());
    vars.insert("PROJECT_PATH", ctx.paths.root().to_string_lossy().to_string());
    vars.insert("HOME", ctx.home.to_string_lossy().to_string());
    vars
}

/// Replace every `{{KEY}}` in `text`. Unknown keys are left untouched.
pub fn substitute(text: &str, vars: &BTreeMap<&'static str, String>) -> String {
    let mut out = text.to_string();
    for (key, value) in vars {
        let token = format!("{{{{{}}}}}", key);
        if out.contains(&token) {
            out = out.replace(&token, value);
        }
    }
    out
}

pub fn template_dir(home: &Path, arch: Architecture) -> PathBuf {
    home.join("templates").join(arch.as_str())
}

pub fn run(ctx: &TaskContext<'_>) -> Result<PrepareReport, TaskError> {
    let arch = ctx.options.arch;
    let src = template_dir(&ctx.home, arch);
    let dst = ctx.paths.platform_dir(arch);

    if !src.is_dir() {
        if arch == Architecture::Desktop {
            ctx.engine.log_message(
                MessageImportance::Normal,
                "No desktop template; nothing to prepare",
            );
            return Ok(PrepareReport {
                no_template: true,
                ..PrepareReport::default()
            });
        }
        return Err(TaskError::MissingTemplate {
            arch: arch.as_str().to_string(),
            path: src,
        });
    }

    ctx.engine.milestone(format!(
        "Preparing {} project from {}",
        arch.as_str(),
        src.display()
    ));

    let vars = placeholders(ctx);
    let mut report = PrepareReport::default();
    instantiate(ctx, &src, &dst, &vars, &mut report)?;

    ctx.engine.log_message(
        MessageImportance::High,
        format!(
            "Prepared {}: {} file(s) written, {} kept",
            dst.display(),
            report.written,
            report.skipped
        ),
    );
    Ok(report)
}

fn instantiate(
    ctx: &TaskContext<'_>,
    src: &Path,
    dst: &Path,
    vars: &BTreeMap<&'static str, String>,
    report: &mut PrepareReport,
) -> Result<(), TaskError> {
    let dry_run = ctx.engine.is_dry_run();
    if !dry_run {
        fs::create_dir_all(dst)?;
    }

    let mut entries = fs::read_dir(src)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = substitute(&entry.file_name().to_string_lossy(), vars);
        let from = entry.path();
        let to = dst.join(&name);

        if entry.file_type()?.is_dir() {
            instantiate(ctx, &from, &to, vars, report)?;
            continue;
        }

        if to.exists() && !ctx.options.force {
            ctx.engine
                .log_message(MessageImportance::Low, format!("Keeping {}", to.display()));
            report.skipped += 1;
            continue;
        }

        if dry_run {
            ctx.engine.log_message(
                MessageImportance::Normal,
                format!("[dry-run] write {}", to.display()),
            );
            report.written += 1;
            continue;
        }

        let bytes = fs::read(&from)?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                fs::write(&to, substitute(&text, vars))?;
                // gradlew and friends must stay executable
                fs::set_permissions(&to, fs::metadata(&from)?.permissions())?;
            }
            Err(_) => {
                fs::copy(&from, &to)?;
            }
        }
        report.written += 1;
    }

    Ok(())
}
