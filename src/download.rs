/// Saving the compressed image: a native save dialog pre-filled with the
/// derived filename, followed by a plain file write.

use std::path::PathBuf;

use rfd::AsyncFileDialog;

use crate::state::controller::DownloadRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SaveError {
    #[error("failed to write {path:?}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Ask where to save, then write. The request (and its reference to the
/// bytes) is consumed here and released when the write finishes.
pub async fn save(request: DownloadRequest) -> Result<SaveOutcome, SaveError> {
    let handle = AsyncFileDialog::new()
        .set_title("Save Compressed Image")
        .set_file_name(request.filename.as_str())
        .save_file()
        .await;

    match handle {
        Some(handle) => write_to(handle.path().to_path_buf(), request).await,
        None => {
            log::debug!("Save of {} cancelled", request.filename);
            Ok(SaveOutcome::Cancelled)
        }
    }
}

/// Write the request's bytes to `path`
pub async fn write_to(path: PathBuf, request: DownloadRequest) -> Result<SaveOutcome, SaveError> {
    tokio::fs::write(&path, request.data.bytes())
        .await
        .map_err(|e| SaveError::Write {
            path: path.clone(),
            message: e.to_string(),
        })?;

    log::info!("Saved {} bytes to {}", request.data.len(), path.display());
    Ok(SaveOutcome::Saved(path))
}
