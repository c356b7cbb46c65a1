//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! asset_root = "assets"
//! clear_colour = [0.05, 0.05, 0.08, 1.0]
//!
//! [window]
//! title = "Demo"
//! width = 1600
//! height = 900
//! vsync = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameters handed to [`Platform::create_window`](crate::platform::Platform::create_window).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowParams {
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            title: "Ember Engine Window".to_string(),
            x: 100,
            y: 100,
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: false,
        }
    }
}

impl WindowParams {
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowParams,
    pub clear_colour: [f64; 4],
    /// Base directory for relative asset paths.
    pub asset_root: PathBuf,
    /// Replaces the built-in forward shader when set.
    pub shader_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: WindowParams::default(),
            clear_colour: [0.05, 0.05, 0.08, 1.0],
            asset_root: PathBuf::from("assets"),
            shader_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Resolves `path` against [`asset_root`](Self::asset_root) unless it is absolute.
    pub fn asset_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }

    pub fn wgpu_clear_colour(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_colour;
        wgpu::Color { r, g, b, a }
    }
}
