//! Core data types for the background removal session

use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::path::PathBuf;

/// A decoded image selected by the user through a media picker
///
/// Owned wholesale for the duration of one picking session and replaced,
/// never mutated in place, when a new selection is made.
#[derive(Debug, Clone)]
pub struct PickedImage {
    /// Decoded pixel data
    pub image: DynamicImage,
    /// Where the image came from, when the picker knows
    pub source: Option<PathBuf>,
}

impl PickedImage {
    /// Create a picked image without origin metadata
    #[must_use]
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            source: None,
        }
    }

    /// Create a picked image that originated from a file path
    #[must_use]
    pub fn from_path(image: DynamicImage, source: PathBuf) -> Self {
        Self {
            image,
            source: Some(source),
        }
    }

    /// Pixel dimensions of the selected image
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// One emission from a background removal invocation
///
/// Removers may emit several frames per invocation, each refining the
/// previous one; the last frame carries `final_pass = true`.
#[derive(Debug, Clone)]
pub struct RemovalFrame {
    /// Processed image for this pass
    pub image: DynamicImage,
    /// Zero-based index of this pass within the invocation
    pub pass: usize,
    /// Whether this is the last frame the invocation will emit
    pub final_pass: bool,
}

impl RemovalFrame {
    /// Create an intermediate (non-final) frame
    #[must_use]
    pub fn intermediate(image: DynamicImage, pass: usize) -> Self {
        Self {
            image,
            pass,
            final_pass: false,
        }
    }

    /// Create the final frame of an invocation
    #[must_use]
    pub fn finished(image: DynamicImage, pass: usize) -> Self {
        Self {
            image,
            pass,
            final_pass: true,
        }
    }
}

/// Receipt for a completed gallery write
#[derive(Debug, Clone)]
pub struct SaveReceipt {
    /// Full path of the written asset
    pub path: PathBuf,
    /// Filename within the gallery directory
    pub filename: String,
    /// Number of PNG bytes written
    pub bytes_written: u64,
    /// When the write completed
    pub saved_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picked_image_dimensions() {
        let picked = PickedImage::new(DynamicImage::new_rgba8(64, 48));
        assert_eq!(picked.dimensions(), (64, 48));
        assert!(picked.source.is_none());
    }

    #[test]
    fn test_picked_image_from_path() {
        let picked =
            PickedImage::from_path(DynamicImage::new_rgba8(8, 8), PathBuf::from("/tmp/a.png"));
        assert_eq!(
            picked.source.as_deref(),
            Some(std::path::Path::new("/tmp/a.png"))
        );
    }

    #[test]
    fn test_removal_frame_constructors() {
        let frame = RemovalFrame::intermediate(DynamicImage::new_rgba8(4, 4), 0);
        assert_eq!(frame.pass, 0);
        assert!(!frame.final_pass);

        let frame = RemovalFrame::finished(DynamicImage::new_rgba8(4, 4), 1);
        assert_eq!(frame.pass, 1);
        assert!(frame.final_pass);
    }
}
