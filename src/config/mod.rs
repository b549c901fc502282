//! Configuration for the builder.
//!
//! Two sources of configuration exist:
//!
//! - the per-user home registration, `~/.sokolnet_config/sokolnet_home`, whose
//!   whole content is the absolute path of the Sokol.NET checkout. It is
//!   written once by the `register` task and read by every other task;
//! - the optional per-project `sokolnet.json` (see [`loader`]).
//!
//! Command line flags win over `sokolnet.json`, which wins over derived defaults.

pub mod loader;

pub use loader::{ProjectSettings, ResolvedSettings};

use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the user's home directory.
pub const CONFIG_DIR_NAME: &str = ".sokolnet_config";

/// File inside the config directory recording the Sokol.NET home path.
pub const HOME_FILE_NAME: &str = "sokolnet_home";

/// Location of the one-time home registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeConfig {
    config_dir: PathBuf,
}

impl HomeConfig {
    /// `~/.sokolnet_config`
    pub fn default_location() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or_else(|| {
            ConfigError::ValidationFailed("Cannot determine home directory".to_string())
        })?;
        Ok(HomeConfig {
            config_dir: home.join(CONFIG_DIR_NAME),
        })
    }

    /// Use an explicit config directory instead of the user's home.
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        HomeConfig {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the `sokolnet_home` file.
    pub fn home_file(&self) -> PathBuf {
        self.config_dir.join(HOME_FILE_NAME)
    }

    /// True when the home file exists and records a non-empty path.
    pub fn is_registered(&self) -> bool {
        match fs::read_to_string(self.home_file()) {
            Ok(content) => !content.trim().is_empty(),
            Err(_) => false,
        }
    }

    /// Read the registered home directory.
    pub fn load_home(&self) -> Result<PathBuf, ConfigError> {
        let file = self.home_file();
        let content = fs::read_to_string(&file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(file.display().to_string())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "{} is empty",
                file.display()
            )));
        }

        Ok(PathBuf::from(trimmed))
    }

    /// Record `home` as the Sokol.NET home, creating the config directory.
    pub fn save_home(&self, home: &Path) -> Result<(), ConfigError> {
        let home_str = home.to_str().ok_or_else(|| {
            ConfigError::ValidationFailed(format!(
                "Home path is not valid UTF-8: {}",
                home.display()
            ))
        })?;

        fs::create_dir_all(&self.config_dir).map_err(ConfigError::IoError)?;
        fs::write(self.home_file(), home_str).map_err(ConfigError::IoError)?;

        log::debug!("[Config] Wrote {} -> {}", self.home_file().display(), home_str);
        Ok(())
    }
}
