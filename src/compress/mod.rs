/// Image compression module
///
/// This module handles:
/// - The options passed to a compression run (options.rs)
/// - The `CompressionService` seam and its `image`-backed default (service.rs)

pub mod options;
pub mod service;

pub use options::CompressOptions;
pub use service::{CompressFuture, CompressionService, ImageCompressionService};
