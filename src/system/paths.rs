//! Project path registry and Sokol.NET home discovery.
//!
//! Every directory a task reads or writes is derived here from the canonical
//! project root, so tasks never join path fragments on their own.

use std::path::{Path, PathBuf};

use crate::error::TaskError;
use crate::models::{Architecture, BuildType};

/// Directories that together mark a Sokol.NET checkout.
pub const HOME_MARKERS: [&str; 2] = ["templates", "examples"];

/// Canonical layout of one example project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Canonical project directory
    root: PathBuf,

    /// The project's .csproj file
    csproj: PathBuf,

    /// File stem of the .csproj
    name: String,
}

impl ProjectPaths {
    /// Locate the project in `project_dir`.
    ///
    /// Exactly one `.csproj` is expected. When several exist, the one named
    /// after the directory wins; otherwise the choice is ambiguous.
    pub fn locate(project_dir: &Path) -> Result<Self, TaskError> {
        let root = project_dir.canonicalize().map_err(|e| {
            TaskError::InvalidProject(format!(
                "Project directory {} is not accessible: {}",
                project_dir.display(),
                e
            ))
        })?;

        if !root.is_dir() {
            return Err(TaskError::InvalidProject(format!(
                "Project path is not a directory: {}",
                root.display()
            )));
        }

        let mut candidates: Vec<PathBuf> = std::fs::read_dir(&root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "csproj"))
            .collect();
        candidates.sort();

        let csproj = match candidates.len() {
            0 => {
                return Err(TaskError::InvalidProject(format!(
                    "No .csproj found in {}",
                    root.display()
                )))
            }
            1 => candidates.remove(0),
            _ => {
                let dir_name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                candidates
                    .into_iter()
                    .find(|p| p.file_stem().map_or(false, |s| s.to_string_lossy() == dir_name))
                    .ok_or_else(|| {
                        TaskError::InvalidProject(format!(
                            "Several .csproj files in {} and none is named {}.csproj",
                            root.display(),
                            dir_name
                        ))
                    })?
            }
        };

        let name = csproj
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        log::debug!("[Paths] Project {} at {}", name, root.display());

        Ok(ProjectPaths { root, csproj, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn csproj(&self) -> &Path {
        &self.csproj
    }

    pub fn project_name(&self) -> &str {
        &self.name
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn obj_dir(&self) -> PathBuf {
        self.root.join("obj")
    }

    /// `<root>/output/<arch>`
    pub fn arch_output_root(&self, arch: Architecture) -> PathBuf {
        self.root.join("output").join(arch.as_str())
    }

    /// `<root>/output/<arch>/<Configuration>`
    pub fn output_dir(&self, arch: Architecture, build_type: BuildType) -> PathBuf {
        self.arch_output_root(arch).join(build_type.configuration())
    }

    /// `<root>/platform/<arch>`, the prepared native project for mobile targets
    pub fn platform_dir(&self, arch: Architecture) -> PathBuf {
        self.root.join("platform").join(arch.as_str())
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("output").join("logs")
    }

    /// Whether `path` resolves inside the project root.
    ///
    /// Non-existent paths are judged lexically against the root.
    pub fn is_within_project(&self, path: &Path) -> bool {
        match path.canonicalize() {
            Ok(canonical) => canonical.starts_with(&self.root),
            Err(_) => path.starts_with(&self.root),
        }
    }
}

/// Walk upward from `start` until a directory containing every entry of
/// [`HOME_MARKERS`] is found.
pub fn find_home_marker(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if HOME_MARKERS.iter().all(|m| dir.join(m).is_dir()) {
            log::debug!("[Paths] Found Sokol.NET home markers at {}", dir.display());
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
