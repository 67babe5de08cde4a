//! Merge CLI flags and the config file into startup options.

use std::path::PathBuf;

use crate::camera::{CameraSettings, Resolution};
use crate::config::Config;
use crate::display::LoopOptions;

use super::args::Args;

/// Everything the window needs to start, resolved once at launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupOptions {
    pub device_index: u32,
    pub resolution: Resolution,
    pub tick_hz: u32,
    pub mirror: bool,
    pub template: Option<PathBuf>,
    pub start_camera: bool,
}

impl StartupOptions {
    /// CLI flags win over the config file, which wins over defaults.
    pub fn resolve(args: &Args, config: &Config) -> Self {
        Self {
            device_index: args.camera.unwrap_or(config.camera.device),
            resolution: args.resolution.unwrap_or_else(|| config.camera.resolution()),
            tick_hz: args.fps.unwrap_or(config.camera.fps).max(1),
            mirror: args.mirror || config.camera.mirror,
            template: args.template.clone().or_else(|| config.template.path.clone()),
            start_camera: args.start || config.ui.start_camera,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            device_index: self.device_index,
            resolution: self.resolution,
            tick_hz: self.tick_hz,
        }
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: self.device_index,
            resolution: self.resolution,
            mirror: self.mirror,
            ..CameraSettings::default()
        }
    }

    /// The config file these options correspond to.
    pub fn to_config(&self) -> Config {
        let mut config = Config::default();
        config.camera.device = self.device_index;
        config.camera.width = self.resolution.width;
        config.camera.height = self.resolution.height;
        config.camera.fps = self.tick_hz;
        config.camera.mirror = self.mirror;
        config.template.path = self.template.clone();
        config.ui.start_camera = self.start_camera;
        config
    }
}
