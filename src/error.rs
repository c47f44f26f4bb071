/// Error types for the compression workflow.
///
/// `ControllerError` is what the user sees: its `Display` strings are the
/// exact messages shown in the window. `CompressError` carries the technical
/// cause and is only logged.

/// Failure reported by a `CompressionService`
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompressError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("compression task failed: {0}")]
    Task(String),
}

/// Errors surfaced by the controller, one per recoverable user-facing case
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerError {
    /// No file, or a file without an image media type
    #[error("Please upload a valid image.")]
    InvalidInput,

    /// Compression requested before any image was selected
    #[error("Please upload an image first.")]
    MissingInput,

    /// The compression service rejected the image
    #[error("Compression failed.")]
    CompressionFailed(#[source] CompressError),

    /// Writing the compressed file to disk failed
    #[error("Could not save the file.")]
    SaveFailed,
}

impl From<CompressError> for ControllerError {
    fn from(error: CompressError) -> Self {
        ControllerError::CompressionFailed(error)
    }
}
