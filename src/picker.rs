/// File selection: the native open dialog and files dropped on the window
/// both end up in `load`, which reads the bytes and works out a media type.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use rfd::AsyncFileDialog;

use crate::state::data::PickedFile;

/// Extensions offered by the open dialog
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "ico",
];

/// Show the open dialog. `None` means the user cancelled.
pub async fn pick_image_path() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select an Image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Read a chosen file. Read failures are logged and come back as `None`,
/// which the controller treats like any other unusable selection.
pub async fn load(path: PathBuf) -> Option<PickedFile> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let mime_type = detect_mime_type(&path, &bytes);

    log::debug!("Loaded {} ({:?}, {} bytes)", name, mime_type, bytes.len());

    Some(PickedFile {
        name,
        bytes: Arc::from(bytes),
        mime_type,
    })
}

/// Work out the declared media type of a file.
///
/// The file contents win; the extension is only consulted when the
/// contents are not recognised.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> Option<String> {
    if let Some(kind) = infer::get(bytes) {
        return Some(kind.mime_type().to_string());
    }

    ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}
