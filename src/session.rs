//! Single-screen background removal session
//!
//! [`ScreenState`] holds the screen's state cells and owns every transition;
//! [`ScreenSession`] wires a picker, a remover, and a gallery writer around
//! it. Each removal invocation carries a generation token so emissions from
//! a superseded invocation are discarded instead of racing the current one.

use crate::config::SessionConfig;
use crate::error::{BgRemoverError, Result};
use crate::gallery::{unique_filename, GalleryWriter};
use crate::picker::MediaPicker;
use crate::remover::BackgroundRemover;
use crate::services::{ImageIOService, NoOpProgressReporter, ProcessingStage, ProgressReporter, ProgressUpdate};
use crate::types::{PickedImage, SaveReceipt};
use futures::StreamExt;
use image::DynamicImage;
use instant::Instant;
use std::sync::Arc;

/// State cells of the single screen
///
/// All mutation goes through transition methods; the generation counter is
/// the invocation token that keys outputs to the input that produced them.
#[derive(Debug, Default)]
pub struct ScreenState {
    input: Option<PickedImage>,
    output: Option<DynamicImage>,
    processing: bool,
    show_original: bool,
    generation: u64,
}

impl ScreenState {
    /// Create an empty screen state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected input image
    #[must_use]
    pub fn input(&self) -> Option<&PickedImage> {
        self.input.as_ref()
    }

    /// Latest output for the current input, if any has arrived
    #[must_use]
    pub fn output(&self) -> Option<&DynamicImage> {
        self.output.as_ref()
    }

    /// Whether a removal invocation for the current input is in flight
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Whether the display toggle currently selects the original image
    #[must_use]
    pub fn shows_original(&self) -> bool {
        self.show_original
    }

    /// Current invocation token
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the input wholesale and invalidate any stale output
    ///
    /// Returns the new invocation token; emissions keyed to older tokens
    /// will be discarded from here on.
    pub fn set_input(&mut self, picked: PickedImage) -> u64 {
        self.output = None;
        self.generation += 1;
        self.input = Some(picked);
        self.generation
    }

    /// Mark the invocation for `generation` as started
    ///
    /// Stale tokens are ignored.
    pub fn begin_processing(&mut self, generation: u64) {
        if generation == self.generation {
            self.processing = true;
        }
    }

    /// Store an emission, unless its invocation has been superseded
    ///
    /// Returns whether the emission was applied.
    pub fn apply_emission(&mut self, generation: u64, image: DynamicImage) -> bool {
        if generation == self.generation {
            self.output = Some(image);
            true
        } else {
            false
        }
    }

    /// Mark the invocation for `generation` as settled, success or failure
    ///
    /// Stale tokens are ignored so a superseded invocation cannot clear the
    /// indicator of its successor.
    pub fn finish_processing(&mut self, generation: u64) {
        if generation == self.generation {
            self.processing = false;
        }
    }

    /// Flip which of input/output the screen renders
    pub fn toggle_display(&mut self) -> bool {
        self.show_original = !self.show_original;
        self.show_original
    }

    /// Image the screen should render
    ///
    /// `None` until both input and output are present; then the output,
    /// unless the toggle selects the original.
    #[must_use]
    pub fn displayed_image(&self) -> Option<&DynamicImage> {
        let input = self.input.as_ref()?;
        let output = self.output.as_ref()?;
        Some(if self.show_original {
            &input.image
        } else {
            output
        })
    }

    /// Whether the save action is reachable
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.output.is_some()
    }
}

/// How a removal invocation settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The invocation emitted frames and they were applied
    Completed {
        /// Number of frames applied
        frames: usize,
    },
    /// The sequence completed without a single emission
    Empty,
    /// A newer pick superseded this invocation; its emissions were discarded
    Superseded,
    /// The invocation failed; the error was reported to the user
    Failed,
}

/// Coordinator for the single screen
///
/// Owns the state and the three collaborators. All operations are terminal
/// to themselves on failure; the session itself survives.
pub struct ScreenSession<R, P, G> {
    state: ScreenState,
    remover: R,
    picker: P,
    gallery: G,
    config: SessionConfig,
    reporter: Arc<dyn ProgressReporter>,
    started: Instant,
}

impl<R, P, G> ScreenSession<R, P, G>
where
    R: BackgroundRemover,
    P: MediaPicker,
    G: GalleryWriter,
{
    /// Create a session with a no-op progress reporter
    pub fn new(remover: R, picker: P, gallery: G, config: SessionConfig) -> Self {
        Self {
            state: ScreenState::new(),
            remover,
            picker,
            gallery,
            config,
            reporter: Arc::new(NoOpProgressReporter),
            started: Instant::now(),
        }
    }

    /// Attach a progress reporter
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Read-only view of the screen state
    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Ask the picker for an image and, on selection, process it
    ///
    /// Cancellation is a no-op: state is left unchanged and only logged.
    ///
    /// # Errors
    /// Returns an error when a selection was made but could not be decoded.
    pub async fn pick(&mut self) -> Result<Option<RemovalOutcome>> {
        self.reporter
            .report_progress(ProgressUpdate::new(ProcessingStage::Picking, self.started));
        match self.picker.pick_image().await? {
            None => {
                tracing::debug!("no media selected");
                Ok(None)
            },
            Some(picked) => {
                let (width, height) = picked.dimensions();
                tracing::info!(width, height, "image selected");
                let generation = self.set_input(picked);
                Ok(Some(self.process(generation).await))
            },
        }
    }

    /// Adopt an already-decoded image as the new input
    ///
    /// Returns the invocation token to pass to [`Self::process`].
    pub fn set_input(&mut self, picked: PickedImage) -> u64 {
        self.state.set_input(picked)
    }

    /// Drive the removal invocation for the current input
    pub async fn process_current(&mut self) -> RemovalOutcome {
        let generation = self.state.generation();
        self.process(generation).await
    }

    /// Drive the removal invocation identified by `generation`
    ///
    /// Emissions landing after a newer pick are discarded. The processing
    /// flag clears when the sequence completes, success or failure; failures
    /// are reported to the user and never tear the session down.
    pub async fn process(&mut self, generation: u64) -> RemovalOutcome {
        let Some(image) = self.state.input().map(|picked| picked.image.clone()) else {
            return RemovalOutcome::Empty;
        };

        self.state.begin_processing(generation);
        self.reporter
            .report_progress(ProgressUpdate::new(ProcessingStage::Removal, self.started));
        tracing::debug!(generation, remover = self.remover.name(), "removal invocation started");

        let mut stream = match self.remover.remove(&image) {
            Ok(stream) => stream,
            Err(e) => {
                self.state.finish_processing(generation);
                self.reporter
                    .report_error(ProcessingStage::Removal, &e.to_string());
                tracing::warn!(generation, error = %e, "removal invocation failed to start");
                return RemovalOutcome::Failed;
            },
        };

        let mut frames = 0usize;
        let mut failed = false;
        while let Some(item) = stream.next().await {
            match item {
                Ok(frame) => {
                    if !self.state.apply_emission(generation, frame.image) {
                        tracing::debug!(
                            generation,
                            current = self.state.generation(),
                            "discarding emission from superseded invocation"
                        );
                        return RemovalOutcome::Superseded;
                    }
                    frames += 1;
                    if frame.pass > 0 {
                        self.reporter.report_progress(ProgressUpdate::with_description(
                            ProcessingStage::Refinement,
                            format!("Refining removal result (pass {})", frame.pass + 1),
                            self.started,
                        ));
                    }
                },
                Err(e) => {
                    self.reporter
                        .report_error(ProcessingStage::Removal, &e.to_string());
                    tracing::warn!(generation, error = %e, "removal sequence failed");
                    failed = true;
                    break;
                },
            }
        }

        self.state.finish_processing(generation);

        if failed {
            RemovalOutcome::Failed
        } else if frames == 0 {
            // Completing without a single emission leaves the user with a
            // cleared spinner and nothing to show; surface it explicitly.
            self.reporter
                .report_error(ProcessingStage::Removal, "background removal produced no output");
            tracing::warn!(generation, "removal sequence completed without emitting");
            RemovalOutcome::Empty
        } else {
            self.reporter
                .report_progress(ProgressUpdate::new(ProcessingStage::Completed, self.started));
            tracing::info!(generation, frames, "removal invocation completed");
            RemovalOutcome::Completed { frames }
        }
    }

    /// Flip the display toggle
    pub fn toggle(&mut self) -> bool {
        self.state.toggle_display()
    }

    /// Image the screen should render, if any
    pub fn displayed(&self) -> Option<&DynamicImage> {
        self.state.displayed_image()
    }

    /// Save the current output to the gallery as a uniquely named PNG
    ///
    /// The writer is called exactly once per save. Success and failure are
    /// both surfaced to the user as transient notifications.
    ///
    /// # Errors
    /// Returns a `Gallery` error when no output is present, and propagates
    /// encoding or write failures.
    pub fn save(&self) -> Result<SaveReceipt> {
        let Some(output) = self.state.output() else {
            return Err(BgRemoverError::gallery("no processed image to save"));
        };

        self.reporter
            .report_progress(ProgressUpdate::new(ProcessingStage::Saving, self.started));
        let png_bytes = ImageIOService::encode_png(output)?;
        let filename = unique_filename(&self.config.filename_prefix);

        match self.gallery.save_png(&filename, &png_bytes) {
            Ok(receipt) => {
                self.reporter.report_notification(&format!(
                    "Image saved to gallery: {}",
                    receipt.path.display()
                ));
                tracing::info!(path = %receipt.path.display(), "image saved to gallery");
                Ok(receipt)
            },
            Err(e) => {
                self.reporter.report_notification("Failed to save image.");
                tracing::error!(error = %e, "gallery write failed");
                Err(e)
            },
        }
    }
}
