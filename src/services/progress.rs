//! Progress reporting service
//!
//! This module separates progress reporting concerns from session logic,
//! allowing different frontends to implement their own progress handling.

use instant::Instant;

/// Progress stages during a background removal session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Waiting for the user to select an image
    Picking,
    /// Decoding the selected image
    ImageLoading,
    /// Running the background removal invocation
    Removal,
    /// Applying a progressive refinement pass
    Refinement,
    /// Encoding and writing the result to the gallery
    Saving,
    /// Session operation completed
    Completed,
}

impl ProcessingStage {
    /// Get a human-readable description of the processing stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStage::Picking => "Waiting for image selection",
            ProcessingStage::ImageLoading => "Loading selected image",
            ProcessingStage::Removal => "Removing background",
            ProcessingStage::Refinement => "Refining removal result",
            ProcessingStage::Saving => "Saving result to gallery",
            ProcessingStage::Completed => "Processing completed",
        }
    }

    /// Get the typical progress percentage for this stage
    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        match self {
            ProcessingStage::Picking => 5,
            ProcessingStage::ImageLoading => 15,
            ProcessingStage::Removal => 60,
            ProcessingStage::Refinement => 85,
            ProcessingStage::Saving => 95,
            ProcessingStage::Completed => 100,
        }
    }
}

/// Progress update containing stage and timing information
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Current processing stage
    pub stage: ProcessingStage,
    /// Progress percentage (0-100)
    pub progress: u8,
    /// Human-readable stage description
    pub description: String,
    /// Elapsed time since the session operation started (milliseconds)
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    /// Create a new progress update
    #[must_use]
    pub fn new(stage: ProcessingStage, start_time: Instant) -> Self {
        Self {
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
        }
    }

    /// Create a progress update with custom description
    #[must_use]
    pub fn with_description(
        stage: ProcessingStage,
        description: String,
        start_time: Instant,
    ) -> Self {
        Self {
            progress: stage.progress_percentage(),
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            stage,
            description,
        }
    }
}

/// Trait for reporting progress and user-facing notifications
///
/// The session never talks to a terminal or screen directly; frontends
/// implement this trait to surface spinners, toasts, or nothing at all.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress update
    ///
    /// # Arguments
    /// * `update` - Progress update containing stage and timing information
    fn report_progress(&self, update: ProgressUpdate);

    /// Report a transient user-visible notification (a toast analog)
    ///
    /// # Arguments
    /// * `message` - Short message shown to the user
    fn report_notification(&self, message: &str);

    /// Report an error during processing
    ///
    /// # Arguments
    /// * `stage` - Stage where the error occurred
    /// * `error` - Error description
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

/// No-op progress reporter that discards all progress updates
pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {
        // Intentionally empty - discards progress updates
    }

    fn report_notification(&self, _message: &str) {
        // Intentionally empty - discards notifications
    }

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {
        // Intentionally empty - discards error reports
    }
}

/// Console progress reporter that logs progress through tracing
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    /// Create a new console progress reporter
    ///
    /// # Arguments
    /// * `verbose` - Whether to show elapsed timing information
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            tracing::info!(
                "[{}%] {} ({}ms elapsed)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            tracing::info!("[{}%] {}", update.progress, update.description);
        }
    }

    fn report_notification(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        tracing::error!("Error during {}: {}", stage.description(), error);
    }
}

/// Spinner-based progress reporter for the CLI frontend
#[cfg(feature = "cli")]
pub struct SpinnerProgressReporter {
    bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl SpinnerProgressReporter {
    /// Create a spinner reporter with a steady tick
    #[must_use]
    pub fn new() -> Self {
        let bar = indicatif::ProgressBar::new_spinner();
        bar.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }
}

#[cfg(feature = "cli")]
impl Default for SpinnerProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for SpinnerProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if update.stage == ProcessingStage::Completed {
            self.bar.set_message(update.description);
            self.bar.tick();
        } else {
            self.bar
                .set_message(format!("[{}%] {}", update.progress, update.description));
        }
    }

    fn report_notification(&self, message: &str) {
        self.bar.println(message);
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        self.bar
            .println(format!("Error during {}: {}", stage.description(), error));
    }
}

#[cfg(feature = "cli")]
impl Drop for SpinnerProgressReporter {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Create the progress reporter used by the CLI frontend
#[cfg(feature = "cli")]
#[must_use]
pub fn create_cli_progress_reporter() -> std::sync::Arc<dyn ProgressReporter> {
    std::sync::Arc::new(SpinnerProgressReporter::new())
}
