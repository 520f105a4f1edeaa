#![allow(clippy::uninlined_format_args)]

//! # bgremover
//!
//! A single-screen background removal session library: the user picks a
//! photo, a removal routine streams progressively refined results over it,
//! the screen toggles between original and processed image, and the result
//! can be saved as a uniquely named PNG into the device's pictures gallery.
//!
//! The removal computation itself is pluggable behind the
//! [`BackgroundRemover`] capability trait so alternative implementations
//! (local model, remote service) are substitutable; a chroma-key remover is
//! built in. Picking and gallery persistence sit behind [`MediaPicker`] and
//! [`GalleryWriter`] for the same reason.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremover::{
//!     ChromaKeyRemover, PathPicker, PicturesWriter, ScreenSession, SessionConfig,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SessionConfig::builder()
//!     .filename_prefix("cutout")
//!     .tolerance(0.3)
//!     .build()?;
//! let mut session = ScreenSession::new(
//!     ChromaKeyRemover::green_screen(),
//!     PathPicker::new("photo.jpg".into()),
//!     PicturesWriter::new()?,
//!     config,
//! );
//!
//! session.pick().await?;
//! session.toggle(); // show the original
//! session.toggle(); // back to the processed image
//! let receipt = session.save()?;
//! println!("saved {}", receipt.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): terminal frontend, spinner progress reporting, and
//!   tracing subscriber setup (optional for library usage)
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! bgremover = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod gallery;
pub mod picker;
pub mod remover;
pub mod services;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
pub use config::{SessionConfig, SessionConfigBuilder, DEFAULT_FILENAME_PREFIX};
pub use error::{BgRemoverError, Result};
pub use gallery::{unique_filename, GalleryWriter, PicturesWriter};
pub use picker::{MediaPicker, PathPicker, PromptPicker};
pub use remover::{BackgroundRemover, ChromaKeyRemover, RemovalStream};
pub use services::{
    ConsoleProgressReporter, ImageIOService, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressUpdate,
};
pub use session::{RemovalOutcome, ScreenSession, ScreenState};
pub use types::{PickedImage, RemovalFrame, SaveReceipt};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

use futures::StreamExt;
use image::DynamicImage;

/// Remove the background from a `DynamicImage`, returning the final frame
///
/// Convenience wrapper for callers that do not need the session or the
/// progressive frames: drives one invocation to completion and keeps the
/// last emission.
///
/// # Errors
/// Returns an error when the invocation fails or completes without a single
/// emission.
pub async fn remove_background_from_image(
    image: &DynamicImage,
    remover: &dyn BackgroundRemover,
) -> Result<DynamicImage> {
    let mut stream = remover.remove(image)?;
    let mut latest = None;
    while let Some(frame) = stream.next().await {
        latest = Some(frame?.image);
    }
    latest.ok_or_else(|| BgRemoverError::removal("background removal produced no output"))
}

/// Remove the background from raw image bytes, returning PNG bytes
///
/// Accepts any format the `image` crate can sniff, making it suitable for
/// memory-based processing where no file is available.
///
/// # Errors
/// Returns an error when decoding, removal, or PNG encoding fails.
pub async fn remove_background_from_bytes(
    image_bytes: &[u8],
    remover: &dyn BackgroundRemover,
) -> Result<Vec<u8>> {
    let image = ImageIOService::load_from_bytes(image_bytes)?;
    let result = remove_background_from_image(&image, remover).await?;
    ImageIOService::encode_png(&result)
}
