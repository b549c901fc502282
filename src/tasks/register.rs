//! `register`: record the Sokol.NET home directory.

use std::path::{Path, PathBuf};

use crate::config::HomeConfig;
use crate::engine::{BuildEngine, MessageImportance};
use crate::error::TaskError;
use crate::system::paths::find_home_marker;

/// Pick the directory to register.
///
/// `--home` wins; otherwise the nearest ancestor of `cwd` carrying the
/// checkout markers; otherwise `cwd` itself.
pub fn resolve_home(explicit: Option<&Path>, cwd: &Path) -> Result<PathBuf, TaskError> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => find_home_marker(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    };

    candidate.canonicalize().map_err(|e| {
        TaskError::InvalidProject(format!(
            "Home directory {} is not accessible: {}",
            candidate.display(),
            e
        ))
    })
}

/// Write the home registration. Re-registering overwrites.
pub fn run(
    home_config: &HomeConfig,
    explicit_home: Option<&Path>,
    cwd: &Path,
    engine: &BuildEngine,
) -> Result<PathBuf, TaskError> {
    let home = resolve_home(explicit_home, cwd)?;

    if find_home_marker(&home).as_deref() != Some(home.as_path()) {
        engine.log_warning(format!(
            "{} does not look like a Sokol.NET checkout (missing templates/ or examples/)",
            home.display()
        ));
    }

    if engine.is_dry_run() {
        engine.log_message(
            MessageImportance::High,
            format!(
                "[dry-run] would register {} in {}",
                home.display(),
                home_config.home_file().display()
            ),
        );
        return Ok(home);
    }

    home_config.save_home(&home)?;
    engine.milestone(format!(
        "Registered Sokol.NET home {} ({})",
        home.display(),
        home_config.home_file().display()
    ));
    Ok(home)
}
