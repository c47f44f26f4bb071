/// User settings, read once at startup from
/// `<config dir>/image-compressor/settings.json`.
///
/// Every field is optional in the file; missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::data::Quality;

const APP_DIR: &str = "image-compressor";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Slider position on startup (1-100)
    pub default_quality: u8,
    /// Output size budget in megabytes
    pub max_size_mb: f32,
    /// Longest side of the output in pixels
    pub max_dimension: u32,
    /// Compress on a blocking worker thread instead of the UI executor
    pub use_background_thread: bool,
    /// Delay before the preview is scrolled into view, in milliseconds
    pub scroll_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_quality: Quality::default().value(),
            max_size_mb: 1.0,
            max_dimension: 800,
            use_background_thread: true,
            scroll_delay_ms: 100,
        }
    }
}

impl Settings {
    /// Where the settings file lives:
    /// - Linux: ~/.config/image-compressor/settings.json
    /// - macOS: ~/Library/Application Support/image-compressor/settings.json
    /// - Windows: %APPDATA%\image-compressor\settings.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Load from the default location. Falls back to defaults (with a
    /// warning) on any problem; the app never refuses to start over settings.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory on this platform, using default settings");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from a specific file. A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        log::info!("Loaded settings from {}", path.display());

        Ok(settings.sanitized())
    }

    /// Pull out-of-range values back into something usable
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.default_quality = Quality::new(self.default_quality as i64).value();
        if !(self.max_size_mb.is_finite() && self.max_size_mb > 0.0) {
            self.max_size_mb = defaults.max_size_mb;
        }
        if self.max_dimension == 0 {
            self.max_dimension = defaults.max_dimension;
        }

        self
    }

    pub fn default_quality(&self) -> Quality {
        Quality::new(self.default_quality as i64)
    }

    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb as f64 * 1024.0 * 1024.0).round() as u64
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }
}
