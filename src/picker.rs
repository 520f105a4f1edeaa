//! Media picker seam
//!
//! Picking is user-driven and may be declined; `Ok(None)` means the user
//! cancelled, which callers treat as a no-op.

use crate::error::Result;
use crate::services::ImageIOService;
use crate::types::PickedImage;
use async_trait::async_trait;
use std::path::PathBuf;

/// Capability interface for selecting a single image
#[async_trait]
pub trait MediaPicker: Send + Sync {
    /// Ask the user to select one image
    ///
    /// # Returns
    /// * `Ok(Some(image))` - A decoded selection
    /// * `Ok(None)` - The user cancelled
    ///
    /// # Errors
    /// Returns an error when a selection was made but could not be decoded.
    async fn pick_image(&self) -> Result<Option<PickedImage>>;
}

/// Non-interactive picker that decodes a known path
///
/// Used by the one-shot CLI flow where the "selection" already happened on
/// the command line.
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    /// Create a picker for the given image path
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl MediaPicker for PathPicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        let path = self.path.clone();
        let image = tokio::task::spawn_blocking(move || ImageIOService::load_image(&path))
            .await
            .map_err(|e| crate::error::BgRemoverError::internal(format!("picker task failed: {}", e)))??;
        tracing::debug!(path = %self.path.display(), "image selected from path");
        Ok(Some(PickedImage::from_path(image, self.path.clone())))
    }
}

/// Interactive picker that prompts for a path on standard input
///
/// An empty line cancels the pick.
pub struct PromptPicker {
    prompt: String,
}

impl PromptPicker {
    /// Create a prompt picker with the default prompt text
    #[must_use]
    pub fn new() -> Self {
        Self {
            prompt: "Path to image (empty line to cancel): ".to_string(),
        }
    }

    /// Override the prompt text
    #[must_use]
    pub fn with_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.prompt = prompt.into();
        self
    }
}

impl Default for PromptPicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaPicker for PromptPicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        let prompt = self.prompt.clone();
        let line = tokio::task::spawn_blocking(move || {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            let _ = write!(stdout, "{}", prompt);
            let _ = stdout.flush();

            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await
        .map_err(|e| crate::error::BgRemoverError::internal(format!("picker task failed: {}", e)))??;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            tracing::debug!("no media selected");
            return Ok(None);
        }

        let path = PathBuf::from(trimmed);
        let image = ImageIOService::load_image(&path)?;
        Ok(Some(PickedImage::from_path(image, path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ImageIOService;
    use image::DynamicImage;

    #[tokio::test]
    async fn test_path_picker_decodes_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        let bytes = ImageIOService::encode_png(&DynamicImage::new_rgba8(6, 6)).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let picker = PathPicker::new(path.clone());
        let picked = picker.pick_image().await.unwrap().unwrap();
        assert_eq!(picked.dimensions(), (6, 6));
        assert_eq!(picked.source.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_path_picker_missing_file_errors() {
        let picker = PathPicker::new(PathBuf::from("/nonexistent/missing.png"));
        assert!(picker.pick_image().await.is_err());
    }
}
