//! Configuration types for the background removal session

use crate::error::{BgRemoverError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default filename prefix for saved gallery assets
pub const DEFAULT_FILENAME_PREFIX: &str = "output_image";

/// Session configuration
///
/// Covers gallery placement, filename derivation, and the built-in
/// chroma-key remover parameters. Loadable from a JSON file for frontends
/// that want persistent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Override for the pictures directory (None = platform default)
    #[serde(default)]
    pub pictures_dir: Option<PathBuf>,
    /// Prefix for generated gallery filenames
    #[serde(default = "default_prefix")]
    pub filename_prefix: String,
    /// Background key colour for the built-in remover
    #[serde(default = "default_key_color")]
    pub key_color: [u8; 3],
    /// Normalized colour distance treated as background (0.0-1.0)
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
}

fn default_prefix() -> String {
    DEFAULT_FILENAME_PREFIX.to_string()
}

fn default_key_color() -> [u8; 3] {
    [0, 255, 0]
}

fn default_tolerance() -> f32 {
    0.25
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pictures_dir: None,
            filename_prefix: default_prefix(),
            key_color: default_key_color(),
            tolerance: default_tolerance(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder for fluent construction
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, parsed, or fails
    /// validation.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = std::fs::read_to_string(path_ref)
            .map_err(|e| BgRemoverError::file_io_error("read config file", path_ref, &e))?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            BgRemoverError::invalid_config(format!(
                "failed to parse '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants
    ///
    /// # Errors
    /// Returns `InvalidConfig` on an out-of-range tolerance or an unusable
    /// filename prefix.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || !(0.0..=1.0).contains(&self.tolerance) {
            return Err(BgRemoverError::config_value_error(
                "tolerance",
                self.tolerance,
                "0.0-1.0",
            ));
        }
        if self.filename_prefix.is_empty() {
            return Err(BgRemoverError::invalid_config(
                "filename_prefix must not be empty",
            ));
        }
        if self.filename_prefix.contains(std::path::is_separator) {
            return Err(BgRemoverError::invalid_config(
                "filename_prefix must not contain path separators",
            ));
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`]
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Override the pictures directory
    #[must_use]
    pub fn pictures_dir(mut self, dir: PathBuf) -> Self {
        self.config.pictures_dir = Some(dir);
        self
    }

    /// Set the filename prefix for saved assets
    #[must_use]
    pub fn filename_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.filename_prefix = prefix.into();
        self
    }

    /// Set the chroma key colour
    #[must_use]
    pub fn key_color(mut self, key: [u8; 3]) -> Self {
        self.config.key_color = key;
        self
    }

    /// Set the chroma tolerance (0.0-1.0)
    #[must_use]
    pub fn tolerance(mut self, tolerance: f32) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` when validation fails.
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
