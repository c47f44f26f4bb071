use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::widget::scrollable::RelativeOffset;
use iced::widget::{button, column, container, scrollable, slider, text, Column, Image};
use iced::{event, window, Alignment, Color, Element, Event, Length, Subscription, Task, Theme};

mod compress;
mod download;
mod error;
mod picker;
mod preview;
mod settings;
mod state;

use compress::{CompressionService, ImageCompressionService};
use download::{SaveError, SaveOutcome};
use preview::{format_size, savings_percent, Preview};
use settings::Settings;
use state::controller::{CompressOutcome, Compressor, Phase};
use state::data::PickedFile;

/// Main application state
struct ImageCompressor {
    /// Upload/compress/download workflow
    controller: Compressor,
    /// Does the actual pixel work
    service: Arc<dyn CompressionService>,
    /// Displayable copy of the current compressed image
    preview: Option<Preview>,
    /// Id of the main scrollable, used to bring the preview into view
    scroll_id: scrollable::Id,
    scroll_delay: Duration,
    /// Status line under the controls
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Select Image"
    SelectImage,
    /// The open dialog closed (None = cancelled)
    PathChosen(Option<PathBuf>),
    /// A file was dropped on the window
    FileDropped(PathBuf),
    /// A chosen or dropped file was read
    FileLoaded(Option<PickedFile>),
    /// Quality slider moved
    QualityChanged(u8),
    /// User clicked "Compress"
    Compress,
    /// A compression run settled
    CompressFinished(CompressOutcome),
    /// Deferred scroll after a successful compression
    ScrollToPreview,
    /// User clicked "Download"
    Download,
    /// Save dialog and write finished
    SaveFinished(Result<SaveOutcome, SaveError>),
}

impl ImageCompressor {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        log::info!(
            "Image Compressor ready (quality {}%, max {}px, {:.1} MB budget)",
            settings.default_quality().value(),
            settings.max_dimension,
            settings.max_size_mb
        );

        (
            ImageCompressor::with_service(settings, Arc::new(ImageCompressionService)),
            Task::none(),
        )
    }

    fn with_service(settings: Settings, service: Arc<dyn CompressionService>) -> Self {
        ImageCompressor {
            scroll_delay: settings.scroll_delay(),
            controller: Compressor::new(settings),
            service,
            preview: None,
            scroll_id: scrollable::Id::new("content"),
            status: String::new(),
        }
    }

    /// Apply a settled compression run to the controller and the preview.
    /// Returns true when a fresh result landed and the preview should be
    /// scrolled into view.
    fn apply_compress_outcome(&mut self, outcome: CompressOutcome) -> bool {
        match self.controller.finish_compress(outcome) {
            Ok(true) => {
                self.preview = self.controller.compressed().map(Preview::new);
                self.status.clear();
                true
            }
            Ok(false) => false,
            Err(_) => {
                self.status.clear();
                false
            }
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectImage => Task::perform(picker::pick_image_path(), Message::PathChosen),
            Message::PathChosen(Some(path)) | Message::FileDropped(path) => {
                Task::perform(picker::load(path), Message::FileLoaded)
            }
            Message::PathChosen(None) => Task::none(),
            Message::FileLoaded(file) => {
                if self.controller.select_file(file).is_ok() {
                    // The old result belongs to the old image
                    self.preview = None;
                    self.status.clear();
                }
                Task::none()
            }
            Message::QualityChanged(value) => {
                self.controller.set_quality(value as i64);
                Task::none()
            }
            Message::Compress => match self.controller.begin_compress() {
                Ok(job) => {
                    self.status.clear();
                    Task::perform(job.run(self.service.as_ref()), Message::CompressFinished)
                }
                Err(_) => Task::none(),
            },
            Message::CompressFinished(outcome) => {
                if self.apply_compress_outcome(outcome) {
                    // Give the layout a moment before scrolling to the new preview
                    Task::perform(tokio::time::sleep(self.scroll_delay), |_| Message::ScrollToPreview)
                } else {
                    Task::none()
                }
            }
            Message::ScrollToPreview => {
                scrollable::snap_to(self.scroll_id.clone(), RelativeOffset::END)
            }
            Message::Download => match self.controller.download() {
                Some(request) => Task::perform(download::save(request), Message::SaveFinished),
                None => Task::none(),
            },
            Message::SaveFinished(result) => {
                match result {
                    Ok(SaveOutcome::Saved(path)) => {
                        self.controller.report_save_success();
                        self.status = format!("Saved to {}", path.display());
                    }
                    Ok(SaveOutcome::Cancelled) => {}
                    Err(e) => {
                        log::error!("Save failed: {}", e);
                        self.controller.report_save_failure();
                    }
                }
                Task::none()
            }
        }
    }

    /// Listen for files dropped on the window
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let muted = Color::from_rgb(0.6, 0.6, 0.6);

        let header = column![
            text("Image Compressor").size(40),
            text("Compress image files").size(16).color(muted),
        ]
        .spacing(8)
        .align_x(Alignment::Center);

        let selected = match self.controller.uploaded() {
            Some(image) => format!(
                "{} ({})",
                image.original_filename,
                format_size(image.data.len())
            ),
            None => "No image selected".to_string(),
        };

        let drop_zone = container(
            column![
                text(selected).size(16),
                button("Select Image")
                    .on_press(Message::SelectImage)
                    .padding(10),
                text("or, drag and drop an image here").size(14).color(muted),
            ]
            .spacing(12)
            .align_x(Alignment::Center),
        )
        .padding(30)
        .center_x(Length::Fixed(420.0))
        .style(container::bordered_box);

        let mut content: Column<Message> = column![header, drop_zone]
            .spacing(24)
            .padding(40)
            .width(Length::Fill)
            .align_x(Alignment::Center);

        // Quality only matters once there is something to compress
        if self.controller.uploaded().is_some() {
            let quality = self.controller.quality().value();
            content = content.push(
                column![
                    text(format!("Quality: {}%", quality)),
                    slider(1..=100, quality, Message::QualityChanged).width(Length::Fixed(400.0)),
                ]
                .spacing(8)
                .align_x(Alignment::Center),
            );
        }

        // Stays clickable while busy: a new run supersedes the one in flight
        let compress_label = match self.controller.phase() {
            Phase::Compressing => "Compressing...",
            _ => "Compress",
        };
        content = content.push(
            button(compress_label)
                .on_press(Message::Compress)
                .padding(10),
        );

        if let Some(preview) = &self.preview {
            let original_size = self
                .controller
                .uploaded()
                .map(|image| image.data.len())
                .unwrap_or_default();

            content = content.push(
                column![
                    text("Preview:").size(20),
                    Image::new(preview.handle().clone()).width(Length::Fixed(320.0)),
                    text(format!(
                        "{}x{}, {} ({}% smaller than {})",
                        preview.width,
                        preview.height,
                        format_size(preview.size_bytes),
                        savings_percent(original_size, preview.size_bytes),
                        format_size(original_size)
                    ))
                    .size(14)
                    .color(muted),
                    button("Download")
                        .on_press(Message::Download)
                        .padding(10),
                ]
                .spacing(12)
                .align_x(Alignment::Center),
            );
        }

        if let Some(message) = self.controller.error_message() {
            content = content.push(text(message).size(16).color(Color::from_rgb(0.97, 0.44, 0.44)));
        }

        if !self.status.is_empty() {
            content = content.push(text(&self.status).size(14).color(muted));
        }

        container(
            scrollable(content)
                .id(self.scroll_id.clone())
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application(
        "Image Compressor",
        ImageCompressor::update,
        ImageCompressor::view,
    )
    .subscription(ImageCompressor::subscription)
    .theme(ImageCompressor::theme)
    .centered()
    .run_with(ImageCompressor::new)
}
