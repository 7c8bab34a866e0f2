//! Export configuration
//!
//! Loaded from a RON file; every field falls back to its default so partial
//! files stay valid across versions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Pipeline settings shared by every build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Configuration format version
    pub version: u32,
    /// Directory receiving `<build_id>/` folders and catalogue files
    pub output_root: PathBuf,
    /// Longest side of the normalized whole-asset mesh
    pub canonical_extent: f64,
    /// Rotate the whole-asset mesh from Z-up to Y-up
    pub realign_up_axis: bool,
    /// Robot name written to the description
    pub robot_name: String,
    /// Write absolute mesh paths into the description instead of build-relative ones
    pub absolute_mesh_paths: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            output_root: PathBuf::from("outputs"),
            canonical_extent: 1.0,
            realign_up_axis: true,
            robot_name: "scene".to_string(),
            absolute_mesh_paths: true,
        }
    }
}

impl ExportConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    /// Default settings writing below `output_root`
    pub fn with_output_root(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Load from a RON file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        let config: Self =
            ron::from_str(&content).map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Save as pretty RON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.canonical_extent.is_finite() && self.canonical_extent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canonical_extent must be positive, got {}",
                self.canonical_extent
            )));
        }
        if self.robot_name.trim().is_empty() {
            return Err(ConfigError::Invalid("robot_name must not be empty".into()));
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
