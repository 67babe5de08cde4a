//! Configuration file handling for sift-cam.
//!
//! Loads configuration from `<config dir>/sift-cam/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::Resolution;
use crate::display::DEFAULT_TICK_HZ;

/// Configuration file structure for sift-cam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub device: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Display refresh rate in ticks per second
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub mirror: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            mirror: false,
        }
    }
}

impl CameraConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TemplateConfig {
    /// Template image to show at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Start the camera as soon as the window opens
    #[serde(default)]
    pub start_camera: bool,
}

fn default_width() -> u32 {
    Resolution::LOW.width
}

fn default_height() -> u32 {
    Resolution::LOW.height
}

fn default_fps() -> u32 {
    DEFAULT_TICK_HZ
}

/// Largest capture resolution accepted from flags or the config file.
pub const MAX_RESOLUTION: Resolution = Resolution {
    width: 7680,
    height: 4320,
};

/// Accepted display refresh rates.
pub const FPS_RANGE: std::ops::RangeInclusive<u32> = 1..=120;

/// Validate a requested capture resolution.
pub fn check_resolution(width: u32, height: u32) -> Result<Resolution, String> {
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > MAX_RESOLUTION.width || height > MAX_RESOLUTION.height {
        return Err(format!(
            "Resolution {}x{} exceeds maximum supported ({})",
            width, height, MAX_RESOLUTION
        ));
    }
    Ok(Resolution { width, height })
}

/// Validate a display refresh rate.
pub fn check_fps(fps: u32) -> Result<u32, String> {
    if !FPS_RANGE.contains(&fps) {
        return Err(format!(
            "Framerate must be between {} and {} fps, got {}",
            FPS_RANGE.start(),
            FPS_RANGE.end(),
            fps
        ));
    }
    Ok(fps)
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed, or holds
    /// values the command line would also reject.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config.validate().map_err(|message| ConfigError::InvalidValue {
                path: path.clone(),
                message,
            })?;
            log::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Apply the same bounds as the `--resolution` and `--fps` flags.
    pub fn validate(&self) -> Result<(), String> {
        check_resolution(self.camera.width, self.camera.height)
            .map_err(|e| format!("camera.width/height: {}", e))?;
        check_fps(self.camera.fps).map_err(|e| format!("camera.fps: {}", e))?;
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, message } => {
                write!(f, "Invalid config file '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("sift-cam").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from(".sift-cam.toml"))
}
