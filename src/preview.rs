/// Preview rendering for the compressed image, plus the size figures shown
/// under it.

use iced::widget::image::Handle;

use crate::state::data::CompressedImage;

/// Displayable form of a compressed image.
///
/// Built when a new result arrives and dropped together with it, so repeated
/// compress cycles never pile up image handles.
#[derive(Debug, Clone)]
pub struct Preview {
    handle: Handle,
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl Preview {
    pub fn new(image: &CompressedImage) -> Self {
        Self {
            handle: Handle::from_bytes(image.data.bytes().to_vec()),
            width: image.width,
            height: image.height,
            size_bytes: image.data.len(),
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

/// Human-readable byte count ("532 B", "48.2 KB", "1.4 MB")
pub fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

/// How much smaller `compressed` is than `original`, in whole percent.
/// Negative when the output grew.
pub fn savings_percent(original: usize, compressed: usize) -> i64 {
    if original == 0 {
        return 0;
    }
    let saved = 1.0 - compressed as f64 / original as f64;
    (saved * 100.0).round() as i64
}
