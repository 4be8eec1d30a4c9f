// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON under the platform config directory. Every field has a
//! default, so partial or older files still load.

use crate::app::frame_processor::types::DecodeHints;
use crate::app::viewfinder::ViewfinderStyle;
use crate::backends::feedback::FeedbackSettings;
use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DECODE_MAX_DIMENSION};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decoder options (format allow-list, try-harder)
    pub hints: DecodeHints,
    /// Overlay colors and sizes
    pub style: ViewfinderStyle,
    /// Beep/vibrate on a successful scan
    pub feedback: FeedbackSettings,
    /// Longest side frames are subsampled to before decoding
    pub max_decode_dimension: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hints: DecodeHints::default(),
            style: ViewfinderStyle::default(),
            feedback: FeedbackSettings::default(),
            max_decode_dimension: DEFAULT_DECODE_MAX_DIMENSION,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/codescan/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }
}
