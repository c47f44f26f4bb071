use std::future::Future;

use crate::compress::{CompressOptions, CompressionService};
use crate::error::{CompressError, ControllerError};
use crate::settings::Settings;

use super::data::{Blob, CompressedImage, PickedFile, Quality, UploadedImage};

/// Where the workflow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing selected yet
    #[default]
    Idle,
    /// An original is held, nothing compressed for it yet
    ImageSelected,
    /// A compression run is in flight
    Compressing,
    /// The last run succeeded
    Compressed,
    /// The last run failed
    CompressionFailed,
}

/// Everything a compression run needs, detached from the controller so it
/// can be driven by the event loop
#[derive(Debug, Clone)]
pub struct CompressJob {
    generation: u64,
    image: UploadedImage,
    options: CompressOptions,
}

impl CompressJob {
    /// Start the service call. The returned future owns everything it needs.
    pub fn run(
        self,
        service: &dyn CompressionService,
    ) -> impl Future<Output = CompressOutcome> + Send + 'static {
        let generation = self.generation;
        let pending = service.compress(self.image, self.options);

        async move {
            CompressOutcome {
                generation,
                result: pending.await,
            }
        }
    }
}

/// A settled compression run, tagged with the generation that started it
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    generation: u64,
    result: Result<CompressedImage, CompressError>,
}

/// A save action waiting to happen. Holds its own reference to the bytes and
/// releases it when dropped after the save.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub filename: String,
    pub data: Blob,
}

/// Name offered when saving the compressed version of `original`
pub fn download_filename(original: &str) -> String {
    format!("compressed_{}", original)
}

/// The upload/compress/download controller.
///
/// Owns the selected original, the slider value, the latest compressed
/// result and the error shown to the user. All mutation happens through the
/// methods below, called from the UI update loop.
#[derive(Debug)]
pub struct Compressor {
    settings: Settings,
    uploaded: Option<UploadedImage>,
    quality: Quality,
    compressed: Option<CompressedImage>,
    error: Option<ControllerError>,
    phase: Phase,
    /// Bumped whenever an in-flight result must no longer be applied
    generation: u64,
}

impl Compressor {
    pub fn new(settings: Settings) -> Self {
        Self {
            quality: settings.default_quality(),
            settings,
            uploaded: None,
            compressed: None,
            error: None,
            phase: Phase::Idle,
            generation: 0,
        }
    }

    pub fn uploaded(&self) -> Option<&UploadedImage> {
        self.uploaded.as_ref()
    }

    pub fn compressed(&self) -> Option<&CompressedImage> {
        self.compressed.as_ref()
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The message to show the user, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Accept a picked file as the new original.
    ///
    /// Absent files and files without an image media type set the
    /// "valid image" error and leave the previous selection alone.
    pub fn select_file(&mut self, file: Option<PickedFile>) -> Result<(), ControllerError> {
        let Some(file) = file.filter(PickedFile::is_image) else {
            log::warn!("Rejected file selection: not an image");
            self.error = Some(ControllerError::InvalidInput);
            return Err(ControllerError::InvalidInput);
        };

        let mime_type = file.mime_type.unwrap_or_default();
        log::info!(
            "Selected {} ({}, {} bytes)",
            file.name,
            mime_type,
            file.bytes.len()
        );

        self.uploaded = Some(UploadedImage {
            data: Blob::new(file.bytes, mime_type),
            original_filename: file.name,
        });
        self.compressed = None;
        self.error = None;
        self.phase = Phase::ImageSelected;
        // Anything still compressing belongs to the previous image
        self.generation += 1;

        Ok(())
    }

    /// Store a new slider value, clamped to 1-100
    pub fn set_quality(&mut self, value: i64) {
        self.quality = Quality::new(value);
    }

    /// First half of `compress`: validate and hand out a job for the event loop.
    ///
    /// Starting a new job supersedes any job still in flight: only the most
    /// recently started run may update the compressed image.
    pub fn begin_compress(&mut self) -> Result<CompressJob, ControllerError> {
        let Some(image) = self.uploaded.clone() else {
            self.error = Some(ControllerError::MissingInput);
            return Err(ControllerError::MissingInput);
        };

        self.generation += 1;
        self.phase = Phase::Compressing;

        let options = CompressOptions::from_settings(&self.settings, self.quality);
        log::info!(
            "Compressing {} at quality {}% (max {}px, {} bytes)",
            image.original_filename,
            self.quality.value(),
            options.max_dimension,
            options.max_size_bytes
        );

        Ok(CompressJob {
            generation: self.generation,
            image,
            options,
        })
    }

    /// Second half of `compress`: apply a settled run.
    ///
    /// Returns `Ok(true)` when a new compressed image was stored and
    /// `Ok(false)` when the outcome was stale and dropped.
    pub fn finish_compress(&mut self, outcome: CompressOutcome) -> Result<bool, ControllerError> {
        if outcome.generation != self.generation {
            log::debug!(
                "Dropping stale compression result (generation {}, current {})",
                outcome.generation,
                self.generation
            );
            return Ok(false);
        }

        match outcome.result {
            Ok(compressed) => {
                log::info!(
                    "Compressed to {}x{}, {} bytes",
                    compressed.width,
                    compressed.height,
                    compressed.data.len()
                );
                self.compressed = Some(compressed);
                self.error = None;
                self.phase = Phase::Compressed;
                Ok(true)
            }
            Err(e) => {
                log::error!("Compression failed: {}", e);
                let error = ControllerError::CompressionFailed(e);
                self.error = Some(error.clone());
                self.phase = Phase::CompressionFailed;
                Err(error)
            }
        }
    }

    /// Run a full compression against `service` and wait for it.
    /// The event loop drives the two halves separately instead.
    #[cfg(test)]
    pub async fn compress(&mut self, service: &dyn CompressionService) -> Result<(), ControllerError> {
        let job = self.begin_compress()?;
        let outcome = job.run(service).await;
        self.finish_compress(outcome).map(|_| ())
    }

    /// Prepare a save of the compressed image, or `None` if there is nothing to save
    pub fn download(&self) -> Option<DownloadRequest> {
        let compressed = self.compressed.as_ref()?;
        let uploaded = self.uploaded.as_ref()?;

        Some(DownloadRequest {
            filename: download_filename(&uploaded.original_filename),
            data: compressed.data.clone(),
        })
    }

    /// Writing a saved file failed; tell the user
    pub fn report_save_failure(&mut self) {
        self.error = Some(ControllerError::SaveFailed);
    }

    /// A save went through; drop a leftover save error
    pub fn report_save_success(&mut self) {
        if matches!(self.error, Some(ControllerError::SaveFailed)) {
            self.error = None;
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::CompressFuture;
    use std::sync::{Arc, Mutex};

    /// Records every call and answers with a canned result
    struct StubService {
        calls: Arc<Mutex<Vec<CompressOptions>>>,
        result: Result<CompressedImage, CompressError>,
    }

    impl StubService {
        fn returning(result: Result<CompressedImage, CompressError>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                result,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl CompressionService for StubService {
        fn compress(&self, _image: UploadedImage, options: CompressOptions) -> CompressFuture {
            self.calls.lock().unwrap().push(options);
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn picked(name: &str, mime: Option<&str>, bytes: &[u8]) -> PickedFile {
        PickedFile {
            name: name.to_string(),
            bytes: Arc::from(bytes.to_vec()),
            mime_type: mime.map(str::to_string),
        }
    }

    fn jpeg_file(name: &str) -> PickedFile {
        // Contents are opaque to the controller; only the media type matters
        picked(name, Some("image/jpeg"), b"\xFF\xD8\xFF\xE0 original pixels")
    }

    fn compressed(width: u32, height: u32, bytes: &[u8]) -> CompressedImage {
        CompressedImage {
            data: Blob::new(bytes.to_vec(), "image/jpeg"),
            width,
            height,
        }
    }

    #[test]
    fn test_starts_idle() {
        let controller = Compressor::default();
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(controller.quality().value(), 50);
        assert!(controller.uploaded().is_none());
        assert!(controller.compressed().is_none());
        assert!(controller.error_message().is_none());
    }

    #[test]
    fn test_non_image_selection_keeps_previous_image() {
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("first.jpg"))).unwrap();
        let before = controller.uploaded().cloned();

        for file in [
            Some(picked("notes.txt", Some("text/plain"), b"hello")),
            Some(picked("mystery.bin", None, b"\x00\x01")),
            None,
        ] {
            let result = controller.select_file(file);
            assert!(matches!(result, Err(ControllerError::InvalidInput)));
            assert_eq!(controller.error_message().as_deref(), Some("Please upload a valid image."));
            assert_eq!(controller.uploaded().cloned(), before);
            assert_eq!(controller.phase(), Phase::ImageSelected);
        }
    }

    #[tokio::test]
    async fn test_image_selection_resets_result_and_error() {
        let stub = StubService::returning(Ok(compressed(10, 10, b"small")));
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("first.jpg"))).unwrap();
        controller.compress(&stub).await.unwrap();
        let _ = controller.select_file(None);
        assert!(controller.compressed().is_some());
        assert!(controller.error_message().is_some());

        controller
            .select_file(Some(picked("second.png", Some("image/png"), b"png bytes")))
            .unwrap();

        let uploaded = controller.uploaded().unwrap();
        assert_eq!(uploaded.original_filename, "second.png");
        assert_eq!(uploaded.data.mime_type(), "image/png");
        assert_eq!(uploaded.data.bytes(), b"png bytes");
        assert!(controller.compressed().is_none());
        assert!(controller.error_message().is_none());
        assert_eq!(controller.phase(), Phase::ImageSelected);
    }

    #[tokio::test]
    async fn test_compress_without_image_never_calls_service() {
        let stub = StubService::returning(Ok(compressed(1, 1, b"x")));
        let mut controller = Compressor::default();

        let result = controller.compress(&stub).await;

        assert!(matches!(result, Err(ControllerError::MissingInput)));
        assert_eq!(controller.error_message().as_deref(), Some("Please upload an image first."));
        assert_eq!(stub.call_count(), 0);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_set_quality_clamps_and_has_no_side_effects() {
        let stub = StubService::returning(Ok(compressed(4, 4, b"result")));
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("a.jpg"))).unwrap();
        controller.compress(&stub).await.unwrap();

        for (input, expected) in [(0, 1), (1, 1), (77, 77), (100, 100), (101, 100), (-5, 1)] {
            controller.set_quality(input);
            assert_eq!(controller.quality().value(), expected);
        }

        assert_eq!(stub.call_count(), 1);
        assert!(controller.compressed().is_some());
        assert!(controller.uploaded().is_some());
        assert_eq!(controller.phase(), Phase::Compressed);
    }

    #[tokio::test]
    async fn test_compress_and_download_scenario() {
        let output = compressed(400, 240, b"compressed jpeg bytes");
        let stub = StubService::returning(Ok(output.clone()));
        let mut controller = Compressor::default();

        controller.select_file(Some(jpeg_file("holiday_5000x3000.jpg"))).unwrap();
        controller.set_quality(30);
        controller.compress(&stub).await.unwrap();

        assert_eq!(controller.compressed(), Some(&output));
        assert_eq!(controller.phase(), Phase::Compressed);
        assert!(controller.error_message().is_none());

        let options = stub.calls.lock().unwrap()[0];
        assert!((options.initial_quality - 0.30).abs() < f32::EPSILON);
        assert_eq!(options.max_dimension, 800);
        assert_eq!(options.max_size_bytes, 1024 * 1024);
        assert!(options.use_background_thread);

        let request = controller.download().unwrap();
        assert_eq!(request.filename, "compressed_holiday_5000x3000.jpg");
        assert_eq!(request.data.bytes(), b"compressed jpeg bytes");
        assert_eq!(request.data.mime_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_rejected_compression_keeps_previous_result() {
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("a.jpg"))).unwrap();

        let failing = StubService::returning(Err(CompressError::Decode("corrupt".into())));
        let result = controller.compress(&failing).await;

        assert!(matches!(result, Err(ControllerError::CompressionFailed(_))));
        assert_eq!(controller.error_message().as_deref(), Some("Compression failed."));
        assert!(controller.compressed().is_none());
        assert_eq!(controller.phase(), Phase::CompressionFailed);

        let working = StubService::returning(Ok(compressed(8, 8, b"first result")));
        controller.compress(&working).await.unwrap();
        assert!(controller.error_message().is_none());

        controller.compress(&failing).await.unwrap_err();
        assert_eq!(controller.compressed().unwrap().data.bytes(), b"first result");
        assert_eq!(controller.error_message().as_deref(), Some("Compression failed."));
    }

    #[test]
    fn test_download_without_result_is_noop() {
        let mut controller = Compressor::default();
        assert!(controller.download().is_none());

        controller.select_file(Some(jpeg_file("a.jpg"))).unwrap();
        assert!(controller.download().is_none());
        assert!(controller.error_message().is_none());
    }

    #[tokio::test]
    async fn test_latest_compress_wins_regardless_of_settle_order() {
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("a.jpg"))).unwrap();

        let first = controller.begin_compress().unwrap();
        let second = controller.begin_compress().unwrap();
        assert_eq!(controller.phase(), Phase::Compressing);

        let second_outcome = second
            .run(&StubService::returning(Ok(compressed(2, 2, b"second"))))
            .await;
        let first_outcome = first
            .run(&StubService::returning(Ok(compressed(1, 1, b"first"))))
            .await;

        assert!(controller.finish_compress(second_outcome).unwrap());
        assert!(!controller.finish_compress(first_outcome).unwrap());
        assert_eq!(controller.compressed().unwrap().data.bytes(), b"second");
        assert_eq!(controller.phase(), Phase::Compressed);
    }

    #[tokio::test]
    async fn test_reselect_invalidates_in_flight_result() {
        let mut controller = Compressor::default();
        controller.select_file(Some(jpeg_file("old.jpg"))).unwrap();
        let job = controller.begin_compress().unwrap();

        controller.select_file(Some(jpeg_file("new.jpg"))).unwrap();
        let outcome = job
            .run(&StubService::returning(Err(CompressError::Task("late".into()))))
            .await;

        assert!(!controller.finish_compress(outcome).unwrap());
        assert!(controller.compressed().is_none());
        assert!(controller.error_message().is_none());
        assert_eq!(controller.phase(), Phase::ImageSelected);
        assert_eq!(controller.uploaded().unwrap().original_filename, "new.jpg");
    }

    #[test]
    fn test_default_quality_from_settings() {
        let settings = Settings {
            default_quality: 80,
            ..Settings::default()
        };
        let controller = Compressor::new(settings);
        assert_eq!(controller.quality().value(), 80);
    }

    #[test]
    fn test_successful_save_clears_save_error() {
        let mut controller = Compressor::default();
        controller.report_save_failure();
        assert_eq!(controller.error_message().as_deref(), Some("Could not save the file."));

        controller.report_save_success();
        assert!(controller.error_message().is_none());
    }

    #[test]
    fn test_successful_save_keeps_other_errors() {
        let mut controller = Compressor::default();
        let _ = controller.select_file(None);

        controller.report_save_success();
        assert_eq!(controller.error_message().as_deref(), Some("Please upload a valid image."));
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(download_filename("cat.png"), "compressed_cat.png");
    }
}
