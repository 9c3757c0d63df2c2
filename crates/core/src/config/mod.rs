use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{catalog::DEFAULT_PATTERN_ID, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub selection: SelectionConfig,
    pub capture: CaptureConfig,
}

impl AppConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// What to show, read once at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub pattern: String,
    /// Seed for procedural patterns. Ignored by hand-authored ones.
    pub seed: Option<String>,
    /// Start in export mode, where only a capture driver moves time.
    pub export: bool,
    /// Colour theme, only consumed by frame rendering.
    pub theme: Option<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN_ID.to_string(),
            seed: None,
            export: false,
            theme: None,
        }
    }
}

/// Settings for writing a captured loop to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub fps: f64,
    pub output_dir: PathBuf,
    pub frame_prefix: String,
    /// Edge length of one cell in pixels.
    pub cell_px: u32,
    /// Spacing between cells and around the grid, in pixels.
    pub gap_px: u32,
    /// Optional video file the numbered frames are handed to.
    pub encode: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            output_dir: PathBuf::from("frames"),
            frame_prefix: "frame".to_string(),
            cell_px: 96,
            gap_px: 16,
            encode: None,
        }
    }
}
