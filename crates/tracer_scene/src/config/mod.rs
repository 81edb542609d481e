//! Configuration system
//!
//! Loader settings are plain serde structs that can be read from TOML or RON.
//! Every field has a default, so a partial file only overrides what it names.

pub use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigFileError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigFileError::Parse(e.to_string())),
            _ => Err(ConfigFileError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigFileError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigFileError::Serialize(e.to_string()))?,
            _ => return Err(ConfigFileError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Configuration file errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Values used when a perspective camera omits optional keys
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDefaults {
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Lens aperture radius
    pub aperture: f32,
    /// Distance to the plane in focus
    pub focal_distance: f32,
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aperture: 0.0,
            focal_distance: 0.1,
        }
    }
}

/// Parameters of the default-shot fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFitConfig {
    /// Field of view assumed when the camera model does not imply one
    pub fov_degrees: f32,
    /// Direction from the scene center towards the fitted eye
    pub view_direction: [f32; 3],
    /// World up vector of the fitted pose
    pub up: [f32; 3],
}

impl Default for CameraFitConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            view_direction: [1.0, 1.0, 1.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// Bounds substituted when the scene bounding volume is empty or flat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackBounds {
    /// Minimum corner
    pub min: [f32; 3],
    /// Maximum corner
    pub max: [f32; 3],
}

impl Default for FallbackBounds {
    fn default() -> Self {
        Self {
            min: [-1.0, -1.0, -1.0],
            max: [1.0, 1.0, 1.0],
        }
    }
}

/// Settings for [`crate::loader::Loader`] and [`crate::scene::Scene`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Search root for relative description paths
    pub root: PathBuf,
    /// Perspective camera defaults
    pub camera_defaults: CameraDefaults,
    /// Default-shot fit parameters
    pub fit: CameraFitConfig,
    /// Replacement for degenerate scene bounds
    pub fallback_bounds: FallbackBounds,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            camera_defaults: CameraDefaults::default(),
            fit: CameraFitConfig::default(),
            fallback_bounds: FallbackBounds::default(),
        }
    }
}

impl Config for LoaderConfig {}
