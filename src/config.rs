// imgbatch/src/config.rs
use crate::core::{ImageToolError, Quality, ResizeAlgorithm, Result};
use crate::geometry::DEFAULT_MARGIN;
use crate::utils::DEFAULT_PATTERN;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "imgbatch.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub quality: Quality,
    pub algorithm: ResizeAlgorithm,
    pub watermark_margin: u32,
    pub threads: usize,
    pub pattern: String,
    pub recursive: bool,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub listen: String,
    pub max_body_size_mb: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            algorithm: ResizeAlgorithm::default(),
            watermark_margin: DEFAULT_MARGIN,
            threads: 1,
            pattern: DEFAULT_PATTERN.to_string(),
            recursive: false,
            server: ServerSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            max_body_size_mb: 20,
        }
    }
}

impl Settings {
    /// An explicit path must exist; without one, `imgbatch.toml` is read if
    /// present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let toml_str = fs::read_to_string(path).map_err(|e| {
            ImageToolError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml(&toml_str)
            .map_err(|e| ImageToolError::Config(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| ImageToolError::Config(e.to_string()))
    }
}
