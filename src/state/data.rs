/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the file picker, the compression service and the UI layer.

use std::sync::Arc;

/// An immutable chunk of bytes with its media type.
///
/// Cloning only bumps a reference count, so the same bytes can be held by the
/// controller, a running compression job and a pending save at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Arc<[u8]>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Media type, e.g. "image/jpeg"
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// A file handed over by the picker (dialog or drag-and-drop), not yet validated
#[derive(Debug, Clone)]
pub struct PickedFile {
    /// Filename only (e.g., "DSC_0001.jpg")
    pub name: String,
    /// Raw file contents
    pub bytes: Arc<[u8]>,
    /// Declared media type, if one could be determined
    pub mime_type: Option<String>,
}

impl PickedFile {
    /// True when the file declares an `image/*` media type
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// The original image selected by the user
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub data: Blob,
    /// Filename only, used to derive the download name
    pub original_filename: String,
}

/// The output of a successful compression run
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub data: Blob,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

/// Compression quality in percent (1 to 100)
///
/// Any value outside the range is clamped on construction, so a `Quality`
/// is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Quality as a fraction in (0, 1], the form the compression service takes
    pub fn as_fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_clamps() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(-20).value(), 1);
        assert_eq!(Quality::new(100).value(), 100);
        assert_eq!(Quality::new(250).value(), 100);
        assert_eq!(Quality::new(30).value(), 30);
        assert_eq!(Quality::default().value(), 50);
    }

    #[test]
    fn test_quality_fraction() {
        assert!((Quality::new(30).as_fraction() - 0.30).abs() < f32::EPSILON);
        assert!((Quality::new(100).as_fraction() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_picked_file_is_image() {
        let mut file = PickedFile {
            name: "photo.jpg".to_string(),
            bytes: Arc::from(vec![1u8, 2, 3]),
            mime_type: Some("image/jpeg".to_string()),
        };
        assert!(file.is_image());

        file.mime_type = Some("application/pdf".to_string());
        assert!(!file.is_image());

        file.mime_type = None;
        assert!(!file.is_image());
    }

    #[test]
    fn test_blob_clone_shares_bytes() {
        let blob = Blob::new(vec![9u8; 16], "image/png");
        let copy = blob.clone();
        assert_eq!(copy.bytes().as_ptr(), blob.bytes().as_ptr());
        assert_eq!(copy.mime_type(), "image/png");
        assert_eq!(copy.len(), 16);
    }
}
