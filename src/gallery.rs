//! Gallery persistence seam
//!
//! Writes PNG-encoded results into the shared pictures directory so they
//! show up in the user's gallery. The write is a single call that either
//! fully succeeds or reports failure.

use crate::error::{BgRemoverError, Result};
use crate::types::SaveReceipt;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Mutex;

/// Capability interface for persisting processed images
pub trait GalleryWriter: Send + Sync {
    /// Write PNG bytes under the given filename
    ///
    /// # Arguments
    /// * `filename` - Target filename, expected to end in `.png`
    /// * `png_bytes` - PNG-encoded image data
    ///
    /// # Errors
    /// Returns an error when the asset cannot be created or written.
    fn save_png(&self, filename: &str, png_bytes: &[u8]) -> Result<SaveReceipt>;
}

struct NameState {
    last_millis: i64,
    sequence: u32,
}

static NAME_STATE: Mutex<NameState> = Mutex::new(NameState {
    last_millis: 0,
    sequence: 0,
});

/// Derive a collision-free PNG filename from the current time
///
/// Names follow the `{prefix}_{millis}.png` scheme; when two saves land in
/// the same millisecond (or the clock steps backwards) a sequence suffix
/// keeps the names distinct.
#[must_use]
pub fn unique_filename(prefix: &str) -> String {
    let mut state = NAME_STATE
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let millis = Utc::now().timestamp_millis();
    if millis > state.last_millis {
        state.last_millis = millis;
        state.sequence = 0;
        format!("{}_{}.png", prefix, millis)
    } else {
        state.sequence += 1;
        format!("{}_{}_{}.png", prefix, state.last_millis, state.sequence)
    }
}

/// Gallery writer targeting the OS pictures directory
pub struct PicturesWriter {
    directory: PathBuf,
}

impl PicturesWriter {
    /// Create a writer for the user's pictures directory
    ///
    /// Resolves the platform pictures directory, falling back to
    /// `~/Pictures` on platforms that do not report one.
    ///
    /// # Errors
    /// Returns a `Gallery` error when no pictures directory can be resolved.
    pub fn new() -> Result<Self> {
        let directory = dirs::picture_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
            .ok_or_else(|| BgRemoverError::gallery("could not resolve a pictures directory"))?;
        Ok(Self { directory })
    }

    /// Create a writer targeting an explicit directory
    #[must_use]
    pub fn with_directory(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Directory this writer persists into
    #[must_use]
    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }
}

impl GalleryWriter for PicturesWriter {
    fn save_png(&self, filename: &str, png_bytes: &[u8]) -> Result<SaveReceipt> {
        if filename.is_empty() || filename.contains(std::path::is_separator) {
            return Err(BgRemoverError::gallery(format!(
                "invalid gallery filename: '{}'",
                filename
            )));
        }

        std::fs::create_dir_all(&self.directory).map_err(|e| {
            BgRemoverError::file_io_error("create pictures directory", &self.directory, &e)
        })?;

        let path = self.directory.join(filename);
        std::fs::write(&path, png_bytes)
            .map_err(|e| BgRemoverError::file_io_error("write gallery asset", &path, &e))?;

        tracing::info!(path = %path.display(), bytes = png_bytes.len(), "gallery asset written");
        Ok(SaveReceipt {
            path,
            filename: filename.to_string(),
            bytes_written: png_bytes.len() as u64,
            saved_at: Utc::now(),
        })
    }
}
