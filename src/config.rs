//! Submesh build settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Knobs of the submesh build.
///
/// Every field has a default, so a config file only lists what it changes:
///
/// ```json
/// { "lightmap_scale": 2.0, "max_pages": 4 }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Texturing enabled in the captured render state.
    pub use_textures: bool,
    /// Lightmap density multiplier; sample distances are divided by it
    /// (values below 1/4 act as 1/4).
    pub lightmap_scale: f32,
    /// Replaces the level's default sample distance when set.
    pub sample_distance: Option<u16>,
    /// Side length of a square lightmap page in texels.
    pub page_size: u32,
    /// Upper bound on atlas pages; unbounded when `None`.
    pub max_pages: Option<u32>,
    /// Alpha test threshold for masked materials.
    pub mask_threshold: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            use_textures: true,
            lightmap_scale: 1.0,
            sample_distance: None,
            page_size: 1024,
            max_pages: None,
            mask_threshold: 0.5,
        }
    }
}

impl MeshConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size < 3 {
            return Err(Error::config(format!(
                "page_size must be at least 3, got {}",
                self.page_size
            )));
        }
        if !self.lightmap_scale.is_finite() || self.lightmap_scale <= 0.0 {
            return Err(Error::config(format!(
                "lightmap_scale must be a positive number, got {}",
                self.lightmap_scale
            )));
        }
        if self.sample_distance == Some(0) {
            return Err(Error::config("sample_distance must be non-zero"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::config("max_pages must be non-zero"));
        }
        Ok(())
    }
}
