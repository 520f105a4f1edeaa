//! Image I/O operations service
//!
//! This module separates file I/O and codec operations from session logic,
//! making the system more testable and maintainable.

use crate::error::{BgRemoverError, Result};
use image::DynamicImage;
use std::io::Cursor;
use std::path::Path;

/// Service for handling image decode and encode operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first and falls back to
    /// content-based detection when the extension is missing or lies.
    ///
    /// # Arguments
    /// * `path` - Path to the image file
    ///
    /// # Errors
    /// Returns an error when the file does not exist or cannot be decoded by
    /// either detection strategy.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(BgRemoverError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                tracing::debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "extension-based loading failed, attempting content-based detection"
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    BgRemoverError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data)
                    .map_err(|content_err| BgRemoverError::image_load_error(path_ref, &content_err))
            },
        }
    }

    /// Load an image from in-memory bytes with content-based format detection
    ///
    /// # Errors
    /// Returns an error when no supported format matches the data.
    pub fn load_from_bytes(data: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(data).map_err(|e| {
            BgRemoverError::removal(format!("Failed to decode image from bytes: {}", e))
        })
    }

    /// Encode an image to PNG bytes in memory
    ///
    /// The gallery contract is PNG, so this is the only in-memory encoder the
    /// session needs.
    ///
    /// # Errors
    /// Returns an error when PNG encoding fails.
    pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        image
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| BgRemoverError::removal(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }
}
