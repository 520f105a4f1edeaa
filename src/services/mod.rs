//! Session support services
//!
//! Services isolate I/O and presentation concerns from the screen session so
//! that frontends and tests can substitute their own implementations.

pub mod io;
pub mod progress;

pub use io::ImageIOService;
#[cfg(feature = "cli")]
pub use progress::{create_cli_progress_reporter, SpinnerProgressReporter};
pub use progress::{
    ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage, ProgressReporter,
    ProgressUpdate,
};
