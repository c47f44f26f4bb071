use crate::settings::Settings;
use crate::state::data::Quality;

/// Parameters handed to a `CompressionService` for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// Target upper bound for the output size in bytes
    pub max_size_bytes: u64,
    /// Neither side of the output may exceed this many pixels
    pub max_dimension: u32,
    /// Run the CPU-heavy work off the UI executor
    pub use_background_thread: bool,
    /// Starting encoder quality in (0, 1]
    pub initial_quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_size_bytes: 1024 * 1024,
            max_dimension: 800,
            use_background_thread: true,
            initial_quality: Quality::default().as_fraction(),
        }
    }
}

impl CompressOptions {
    /// Build the options for the next run from the settings and the slider value
    pub fn from_settings(settings: &Settings, quality: Quality) -> Self {
        Self {
            max_size_bytes: settings.max_size_bytes(),
            max_dimension: settings.max_dimension,
            use_background_thread: settings.use_background_thread,
            initial_quality: quality.as_fraction(),
        }
    }
}
