//! System module: host detection, tool lookup, path validation and file copying

pub mod paths;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TaskError;

/// .NET runtime identifier of the machine running the builder.
pub fn host_rid() -> &'static str {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("windows", "aarch64") => "win-arm64",
        ("windows", _) => "win-x64",
        ("macos", "aarch64") => "osx-arm64",
        ("macos", _) => "osx-x64",
        ("linux", "aarch64") => "linux-arm64",
        _ => "linux-x64",
    }
}

pub fn is_macos_host() -> bool {
    cfg!(target_os = "macos")
}

/// Search `PATH` for an executable named `tool`.
///
/// On Windows the `.exe`, `.cmd` and `.bat` suffixes are tried as well.
pub fn find_in_path(tool: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    find_in_dirs(tool, std::env::split_paths(&path_var))
}

/// First executable named `tool` in `dirs`.
pub fn find_in_dirs<I>(tool: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let suffixes: &[&str] = if cfg!(windows) {
        &["", ".exe", ".cmd", ".bat"]
    } else {
        &[""]
    };

    dirs.into_iter()
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| suffixes.iter().map(move |s| dir.join(format!("{}{}", tool, s))))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Fail with [`TaskError::ToolMissing`] unless `tool` is on `PATH`.
pub fn require_tool(tool: &str) -> Result<PathBuf, TaskError> {
    find_in_path(tool).ok_or_else(|| TaskError::ToolMissing(tool.to_string()))
}

/// Checks that a project path can be handed to the external toolchains.
///
/// The path must exist, be a directory and be valid UTF-8. Spaces are allowed
/// but reported, since the Android NDK toolchain rejects them.
pub fn validate_project_path(path: &Path) -> Result<(), TaskError> {
    let path_str = path.to_str().ok_or_else(|| {
        TaskError::InvalidProject("Path contains invalid UTF-8 characters".to_string())
    })?;

    if !path.exists() {
        return Err(TaskError::InvalidProject(format!(
            "Project path does not exist: {}",
            path_str
        )));
    }

    if !path.is_dir() {
        return Err(TaskError::InvalidProject(format!(
            "Project path is not a directory: {}",
            path_str
        )));
    }

    if path_str.contains(' ') {
        log::warn!(
            "[System] Project path contains spaces, Android builds may fail: {}",
            path_str
        );
    }

    Ok(())
}

/// Recursively copy `src` into `dst`, creating directories as needed.
///
/// Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copied += copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
            copied += 1;
        }
    }

    Ok(copied)
}
