//! core::config::schema
//!
//! Configuration schema types.
//!
//! Global and package-local files share one schema; every key is optional
//! so a package file only needs the values it overrides.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g. identifier bases must
//! form valid IRIs, profile paths must be non-empty).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::Iri;
use crate::logging::Verbosity;

/// One configuration file.
///
/// # Example
///
/// ```toml
/// [identifiers]
/// object_base = "http://example.org/objects/"
/// node_base = "urn:uuid:"
///
/// [profiles]
/// paths = ["profiles/dcs.json"]
///
/// [logging]
/// level = "debug"
///
/// [decode]
/// allow_shared_children = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Identifier minting
    pub identifiers: Option<IdentifierConfig>,

    /// Domain profiles to load
    pub profiles: Option<ProfilesConfig>,

    /// Log output
    pub logging: Option<LoggingConfig>,

    /// Graph decoding behavior
    pub decode: Option<DecodeConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ids) = &self.identifiers {
            ids.validate()?;
        }
        if let Some(profiles) = &self.profiles {
            profiles.validate()?;
        }
        Ok(())
    }
}

/// Identifier prefixes used when minting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentifierConfig {
    /// Prefix for minted domain object identifiers
    pub object_base: Option<String>,

    /// Prefix for minted node identifiers
    pub node_base: Option<String>,
}

impl IdentifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, base) in [("object_base", &self.object_base), ("node_base", &self.node_base)] {
            if let Some(base) = base {
                Iri::new(base.as_str()).map_err(|e| {
                    ConfigError::InvalidValue(format!("identifiers.{key}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Profile documents to load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    /// Paths to profile JSON documents. Relative paths in a package config
    /// are resolved against the package directory.
    pub paths: Option<Vec<PathBuf>>,
}

impl ProfilesConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(paths) = &self.paths {
            if paths.iter().any(|p| p.as_os_str().is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "profiles.paths cannot contain an empty path".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `quiet`, `normal` or `debug`
    pub level: Option<Verbosity>,
}

/// Graph decoding settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// Accept resources listed under more than one parent, resolving them
    /// through their `hasParent` edge
    pub allow_shared_children: Option<bool>,
}
