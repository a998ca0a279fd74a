//! Configuration loading and root folder resolution
//!
//! Settings resolve in this priority order:
//! 1. Environment variables (highest priority)
//! 2. TOML config file
//! 3. Compiled defaults (fallback)
//!
//! A missing or malformed TOML file never prevents startup: a warning is
//! logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config path
pub const CONFIG_PATH_ENV: &str = "CLARITY_CONFIG";

/// Environment variable overriding the root (data) folder
pub const ROOT_FOLDER_ENV: &str = "CLARITY_ROOT_FOLDER";

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default log directive (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the TOML config file for a module
///
/// `CLARITY_CONFIG` wins; otherwise `<config_dir>/<module>/config.toml` is used
/// if it exists. Returns `None` when no file is available.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join(module_name).join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn read_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load a TOML config with graceful degradation
///
/// Missing path → defaults silently. Unreadable or invalid file → warning + defaults.
pub fn load_toml_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> T {
    let Some(path) = path else {
        return T::default();
    };

    match read_toml_config(path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{}; using compiled defaults", e);
            T::default()
        }
    }
}

/// Read a boolean flag from the environment (`"true"` enables, case-insensitive)
pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// Read an unsigned integer from the environment
///
/// Unparsable values are ignored with a warning so a typo degrades to the
/// next configuration tier instead of aborting startup.
pub fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a non-negative integer", name, raw);
            None
        }
    }
}

/// Read a non-empty string from the environment
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves the root folder holding persisted service state
pub struct RootFolderResolver {
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(toml_root: Option<PathBuf>) -> Self {
        Self { toml_root }
    }

    /// Environment → TOML → `./.cache`
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = env_string(ROOT_FOLDER_ENV) {
            return PathBuf::from(path);
        }
        if let Some(path) = &self.toml_root {
            return path.clone();
        }
        default_root_folder()
    }
}

/// Compiled default root folder, relative to the working directory
pub fn default_root_folder() -> PathBuf {
    PathBuf::from(".cache")
}

/// Creates the root folder and derives file paths inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder (and parents) if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Path of the persisted job table
    pub fn jobs_file_path(&self) -> PathBuf {
        self.root_folder.join("analysis-jobs.json")
    }
}
