//! JSON configuration and report helpers.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use deslant_engine::{Candidate, DeslantError, Deslanted, SearchParams};

use crate::Backend;

#[derive(thiserror::Error, Debug)]
pub enum DeslantIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
    #[error(transparent)]
    Deslant(#[from] DeslantError),
}

fn default_bg_color() -> u8 {
    255
}

/// Configuration of a deslant run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeslantConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default)]
    pub search: SearchParams,
    /// Gray value filling the canvas exposed by the shear.
    #[serde(default = "default_bg_color")]
    pub bg_color: u8,
    /// Offload engine settings; only read when the offload backend is
    /// selected. Its `search` is replaced by the top-level `search`.
    #[cfg(feature = "offload")]
    #[serde(default)]
    pub offload: deslant_offload::OffloadConfig,
}

impl Default for DeslantConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            search: SearchParams::default(),
            bg_color: default_bg_color(),
            #[cfg(feature = "offload")]
            offload: deslant_offload::OffloadConfig::default(),
        }
    }
}

impl DeslantConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DeslantIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DeslantIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    #[cfg(feature = "offload")]
    pub fn offload_config(&self) -> deslant_offload::OffloadConfig {
        deslant_offload::OffloadConfig {
            search: self.search,
            ..self.offload
        }
    }
}

/// Result of deslanting one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
    pub input: String,
    #[serde(default)]
    pub output: Option<String>,
    pub width: usize,
    pub height: usize,
    pub output_width: usize,
    pub alpha: f32,
    pub score: u64,
    pub candidates: Vec<Candidate>,
    pub runtime_ms: f64,
}

impl ImageReport {
    pub fn new(input: impl Into<String>, result: &Deslanted, runtime_ms: f64) -> Self {
        let (width, height) = result.transform.input_size();
        Self {
            input: input.into(),
            output: None,
            width,
            height,
            output_width: result.image.width,
            alpha: result.alpha(),
            score: result.outcome.score(),
            candidates: result.outcome.candidates.clone(),
            runtime_ms,
        }
    }
}

/// Report of a whole run, written by the CLI with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeslantReport {
    pub backend: String,
    pub config: DeslantConfig,
    pub images: Vec<ImageReport>,
}

impl DeslantReport {
    pub fn new(backend: impl Into<String>, config: DeslantConfig) -> Self {
        Self {
            backend: backend.into(),
            config,
            images: Vec::new(),
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DeslantIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
