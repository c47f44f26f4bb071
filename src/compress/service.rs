/// Compression service: the collaborator that turns an uploaded image into a
/// smaller one.
///
/// The controller only sees the `CompressionService` trait. The default
/// implementation decodes with the `image` crate, bounds the dimensions,
/// re-encodes and steps the quality down until the output fits the size budget.

use std::future::Future;
use std::io::Cursor;
use std::pin::Pin;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use tokio::task;

use super::options::CompressOptions;
use crate::error::CompressError;
use crate::state::data::{Blob, CompressedImage, UploadedImage};

/// Future returned by a compression run
pub type CompressFuture =
    Pin<Box<dyn Future<Output = Result<CompressedImage, CompressError>> + Send + 'static>>;

/// Anything that can compress an image asynchronously
pub trait CompressionService: Send + Sync {
    fn compress(&self, image: UploadedImage, options: CompressOptions) -> CompressFuture;
}

/// Upper bound on shrink passes when the output is still over budget
const MAX_ITERATIONS: u32 = 10;
/// Per-pass quality factor (JPEG only)
const QUALITY_STEP: f32 = 0.9;
/// Per-pass dimension factor
const SCALE_STEP: f64 = 0.95;

/// Default service backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressionService;

impl CompressionService for ImageCompressionService {
    fn compress(&self, image: UploadedImage, options: CompressOptions) -> CompressFuture {
        Box::pin(async move {
            if options.use_background_thread {
                // Decoding and encoding are CPU-bound, keep them off the executor
                task::spawn_blocking(move || compress_blocking(&image, &options))
                    .await
                    .map_err(|e| CompressError::Task(e.to_string()))?
            } else {
                compress_blocking(&image, &options)
            }
        })
    }
}

/// Blocking implementation of a compression run
pub fn compress_blocking(
    original: &UploadedImage,
    options: &CompressOptions,
) -> Result<CompressedImage, CompressError> {
    let source = original.data.bytes();

    let format = image::guess_format(source)
        .map_err(|e| CompressError::Decode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(source, format)
        .map_err(|e| CompressError::Decode(e.to_string()))?;

    let (orig_width, orig_height) = (decoded.width(), decoded.height());
    let output_format = output_format_for(format);
    let mut quality = quality_percent(options.initial_quality);

    let (fit_width, fit_height) = bounded_dimensions(orig_width, orig_height, options.max_dimension);
    let mut current = resize_to(&decoded, fit_width, fit_height);
    let mut encoded = encode(&current, output_format, quality)?;

    log::debug!(
        "Encoded {} as {:?}: {}x{} -> {}x{}, {} bytes (quality {})",
        original.original_filename,
        output_format,
        orig_width,
        orig_height,
        current.width(),
        current.height(),
        encoded.len(),
        quality
    );

    let mut iteration = 0;
    while encoded.len() as u64 > options.max_size_bytes && iteration < MAX_ITERATIONS {
        iteration += 1;

        if output_format == ImageFormat::Jpeg {
            quality = ((quality as f32) * QUALITY_STEP).round().max(1.0) as u8;
        }

        let scale = SCALE_STEP.powi(iteration as i32);
        let width = ((fit_width as f64 * scale).round() as u32).max(1);
        let height = ((fit_height as f64 * scale).round() as u32).max(1);
        current = resize_to(&decoded, width, height);
        encoded = encode(&current, output_format, quality)?;

        log::debug!(
            "Pass {}: {}x{}, {} bytes (quality {})",
            iteration,
            width,
            height,
            encoded.len(),
            quality
        );
    }

    if encoded.len() as u64 > options.max_size_bytes {
        log::warn!(
            "{} is still {} bytes after {} passes (budget {})",
            original.original_filename,
            encoded.len(),
            MAX_ITERATIONS,
            options.max_size_bytes
        );
    }

    // Nothing to gain: same dimensions and no smaller, hand back the original
    let untouched = current.width() == orig_width && current.height() == orig_height;
    if untouched && encoded.len() >= source.len() {
        log::info!("{} is already optimal, keeping original bytes", original.original_filename);
        return Ok(CompressedImage {
            data: original.data.clone(),
            width: orig_width,
            height: orig_height,
        });
    }

    Ok(CompressedImage {
        width: current.width(),
        height: current.height(),
        data: Blob::new(encoded, output_format.to_mime_type()),
    })
}

/// Scale (width, height) down so the longer side is at most `max_dimension`.
/// Images that already fit are left alone; nothing is ever upscaled.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }

    let scale = max_dimension as f64 / longest as f64;
    (
        ((width as f64 * scale).round() as u32).max(1),
        ((height as f64 * scale).round() as u32).max(1),
    )
}

/// Map a (0, 1] quality fraction to the encoder's 1-100 scale
fn quality_percent(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Keep the original container when we can write it, otherwise fall back to JPEG
fn output_format_for(format: ImageFormat) -> ImageFormat {
    match format {
        ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::Tiff
        | ImageFormat::WebP => format,
        _ => ImageFormat::Jpeg,
    }
}

fn resize_to(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        image.clone()
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }
}

fn encode(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, CompressError> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .encode_image(&rgb)
                .map_err(|e| CompressError::Encode(e.to_string()))?;
        }
        ImageFormat::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8())
                .write_to(&mut buffer, ImageFormat::WebP)
                .map_err(|e| CompressError::Encode(e.to_string()))?;
        }
        other => {
            image
                .write_to(&mut buffer, other)
                .map_err(|e| CompressError::Encode(e.to_string()))?;
        }
    }

    Ok(buffer.into_inner())
}
