//! Per-project `sokolnet.json` loader and serialization.

use crate::error::ConfigError;
use crate::models::Orientation;
use crate::system::paths::ProjectPaths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the project directory.
pub const PROJECT_SETTINGS_FILE: &str = "sokolnet.json";

const DEFAULT_ASSETS_DIR: &str = "Assets";
const DEFAULT_VERSION: &str = "1.0";

/// Raw contents of `sokolnet.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub app_name: Option<String>,
    pub package_id: Option<String>,
    pub version: Option<String>,
    pub orientation: Option<Orientation>,
    pub assets_dir: Option<String>,
    /// Extra `-p:Key=Value` properties for every `dotnet publish`
    pub msbuild_properties: BTreeMap<String, String>,
}

/// Settings with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub app_name: String,
    pub package_id: String,
    pub version: String,
    pub orientation: Orientation,
    pub assets_dir: PathBuf,
    pub msbuild_properties: BTreeMap<String, String>,
}

impl ProjectSettings {
    /// Load `<project_dir>/sokolnet.json`, or defaults when the file is absent.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(PROJECT_SETTINGS_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let settings: ProjectSettings =
                    serde_json::from_str(&content).map_err(ConfigError::InvalidJson)?;
                log::debug!("[Config] Loaded {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ProjectSettings::default()),
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    /// Fill derived defaults from the located project.
    pub fn resolve(&self, paths: &ProjectPaths) -> Result<ResolvedSettings, ConfigError> {
        let app_name = match &self.app_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            Some(_) => {
                return Err(ConfigError::ValidationFailed(
                    "app_name cannot be empty".to_string(),
                ))
            }
            None => paths.project_name().to_string(),
        };

        let package_id = match &self.package_id {
            Some(id) => {
                validate_package_id(id)?;
                id.clone()
            }
            None => default_package_id(&app_name),
        };

        let assets_dir = paths
            .root()
            .join(self.assets_dir.as_deref().unwrap_or(DEFAULT_ASSETS_DIR));

        Ok(ResolvedSettings {
            app_name,
            package_id,
            version: self
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            orientation: self.orientation.unwrap_or_default(),
            assets_dir,
            msbuild_properties: self.msbuild_properties.clone(),
        })
    }
}

/// `com.sokolnet.<name>` with everything but ASCII alphanumerics dropped.
pub fn default_package_id(app_name: &str) -> String {
    let suffix: String = app_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    let suffix = if suffix.is_empty() { "app".to_string() } else { suffix };
    format!("com.sokolnet.{}", suffix)
}

/// Reverse-domain identifier: at least two dot-separated segments, each
/// starting with a letter.
pub fn validate_package_id(id: &str) -> Result<(), ConfigError> {
    let segments: Vec<&str> = id.split('.').collect();
    let valid = segments.len() >= 2
        && segments.iter().all(|seg| {
            let mut chars = seg.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(format!(
            "Invalid package_id '{}': expected reverse-domain form like com.example.app",
            id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(dir: &Path, name: &str) -> ProjectPaths {
        fs::write(dir.join(format!("{}.csproj", name)), "<Project />").unwrap();
        ProjectPaths::locate(dir).unwrap()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = ProjectSettings::load(temp.path()).unwrap();
        assert_eq!(settings, ProjectSettings::default());
    }

    #[test]
    fn test_resolve_derives_defaults_from_csproj() {
        let temp = TempDir::new().unwrap();
        let paths = project(temp.path(), "Cube-Demo");

        let resolved = ProjectSettings::default().resolve(&paths).unwrap();
        assert_eq!(resolved.app_name, "Cube-Demo");
        assert_eq!(resolved.package_id, "com.sokolnet.cubedemo");
        assert_eq!(resolved.version, "1.0");
        assert_eq!(resolved.orientation, Orientation::Both);
        assert_eq!(resolved.assets_dir, paths.root().join("Assets"));
    }

    #[test]
    fn test_load_reads_every_field() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_SETTINGS_FILE),
            r#"{
                "app_name": "Offscreen",
                "package_id": "org.example.offscreen",
                "orientation": "landscape",
                "msbuild_properties": { "InvariantGlobalization": "true" }
            }"#,
        )
        .unwrap();

        let loaded = ProjectSettings::load(temp.path()).unwrap();
        assert_eq!(loaded.app_name.as_deref(), Some("Offscreen"));
        assert_eq!(loaded.package_id.as_deref(), Some("org.example.offscreen"));
        assert_eq!(loaded.orientation, Some(Orientation::Landscape));
        assert_eq!(loaded.version, None);
        assert_eq!(
            loaded.msbuild_properties.get("InvariantGlobalization").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(PROJECT_SETTINGS_FILE), "{ not json").unwrap();
        assert!(matches!(
            ProjectSettings::load(temp.path()),
            Err(ConfigError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_orientation_is_lowercase_in_json() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_SETTINGS_FILE),
            r#"{ "orientation": "portrait", "assets_dir": "Content" }"#,
        )
        .unwrap();
        let settings = ProjectSettings::load(temp.path()).unwrap();
        assert_eq!(settings.orientation, Some(Orientation::Portrait));
        assert_eq!(settings.assets_dir.as_deref(), Some("Content"));
    }

    #[test]
    fn test_package_id_validation() {
        assert!(validate_package_id("com.example.app").is_ok());
        assert!(validate_package_id("com.example.my_app2").is_ok());
        assert!(validate_package_id("app").is_err());
        assert!(validate_package_id("com.1example").is_err());
        assert!(validate_package_id("com..app").is_err());
    }

    #[test]
    fn test_bad_package_id_fails_resolve() {
        let temp = TempDir::new().unwrap();
        let paths = project(temp.path(), "Cube");
        let settings = ProjectSettings {
            package_id: Some("not a package".to_string()),
            ..Default::default()
        };
        assert!(settings.resolve(&paths).is_err());
    }

    #[test]
    fn test_default_package_id_never_empty() {
        assert_eq!(default_package_id("---"), "com.sokolnet.app");
    }
}
