//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! ipmkit has two configuration scopes:
//! - **Global**: User-level settings
//! - **Package**: Overrides stored with the package being curated
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Package config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$IPMKIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ipmkit/config.toml`
//! 3. `~/.ipmkit/config.toml` (canonical write location)
//!
//! # Package Config Location
//!
//! `<package>/.ipmkit/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use ipmkit::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/package"))).unwrap();
//! let config = result.config;
//!
//! println!("Objects minted under: {}", config.object_base());
//! for path in config.profile_paths() {
//!     println!("Profile: {}", path.display());
//! }
//! ```

pub mod schema;

pub use schema::{ConfigFile, DecodeConfig, IdentifierConfig, LoggingConfig, ProfilesConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::logging::Verbosity;

/// Default prefix for minted identifiers.
pub const DEFAULT_ID_BASE: &str = "urn:uuid:";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules: package config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Package configuration (if a package directory was given and has one)
    pub package: Option<ConfigFile>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the package config file (if loaded)
    package_path: Option<PathBuf>,
    /// Package directory, for resolving relative profile paths
    package_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `package_dir` is provided, also loads package-local config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error (defaults are used).
    pub fn load(package_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), package_dir)
    }

    /// Load with an explicit global config path instead of searching.
    pub fn load_from(
        global_path: Option<&Path>,
        package_dir: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global = match global_path {
            Some(path) if path.exists() => Self::read_config(path)?,
            _ => ConfigFile::default(),
        };

        let (package, package_path) = match package_dir {
            Some(dir) => {
                let path = Self::package_config_path(dir);
                if path.exists() {
                    (Some(Self::read_config(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = package {
            p.validate()?;
        }

        tracing::debug!(
            global = ?global_path,
            package = ?package_path,
            "loaded configuration"
        );

        Ok(ConfigLoadResult {
            config: Config {
                global,
                package,
                global_path: global_path.filter(|p| p.exists()).map(Path::to_path_buf),
                package_path,
                package_dir: package_dir.map(Path::to_path_buf),
            },
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        // 1. Check $IPMKIT_CONFIG
        if let Ok(path) = std::env::var("IPMKIT_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/ipmkit/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ipmkit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.ipmkit/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".ipmkit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.ipmkit/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".ipmkit/config.toml"))
    }

    /// Get the path for package config.
    pub fn package_config_path(package_dir: &Path) -> PathBuf {
        package_dir.join(".ipmkit/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &ConfigFile) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write package config atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename).
    pub fn write_package(package_dir: &Path, config: &ConfigFile) -> Result<PathBuf, ConfigError> {
        let path = Self::package_config_path(package_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    fn write_config_atomic(path: &Path, config: &ConfigFile) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn layered<T>(&self, get: impl Fn(&ConfigFile) -> Option<T>) -> Option<T> {
        self.package.as_ref().and_then(&get).or_else(|| get(&self.global))
    }

    /// Prefix for minted domain object identifiers.
    ///
    /// Defaults to `urn:uuid:`.
    pub fn object_base(&self) -> String {
        self.layered(|c| c.identifiers.as_ref()?.object_base.clone())
            .unwrap_or_else(|| DEFAULT_ID_BASE.to_string())
    }

    /// Prefix for minted node identifiers.
    ///
    /// Defaults to `urn:uuid:`.
    pub fn node_base(&self) -> String {
        self.layered(|c| c.identifiers.as_ref()?.node_base.clone())
            .unwrap_or_else(|| DEFAULT_ID_BASE.to_string())
    }

    /// Profile documents to load: global entries first, then package
    /// entries resolved against the package directory.
    pub fn profile_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .global
            .profiles
            .as_ref()
            .and_then(|p| p.paths.clone())
            .unwrap_or_default();

        let package_paths = self
            .package
            .as_ref()
            .and_then(|c| c.profiles.as_ref())
            .and_then(|p| p.paths.clone())
            .unwrap_or_default();
        for path in package_paths {
            let resolved = match &self.package_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            };
            if !paths.contains(&resolved) {
                paths.push(resolved);
            }
        }
        paths
    }

    /// Log verbosity.
    ///
    /// Defaults to `Normal`.
    pub fn log_level(&self) -> Verbosity {
        self.layered(|c| c.logging.as_ref()?.level)
            .unwrap_or(Verbosity::Normal)
    }

    /// Whether decoding accepts resources listed under several parents.
    ///
    /// Defaults to `true`.
    pub fn allow_shared_children(&self) -> bool {
        self.layered(|c| c.decode.as_ref()?.allow_shared_children)
            .unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded package config file.
    pub fn package_config_loaded_from(&self) -> Option<&Path> {
        self.package_path.as_deref()
    }
}
