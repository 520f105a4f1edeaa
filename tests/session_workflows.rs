//! Integration tests for complete session workflows
//!
//! These tests verify end-to-end pick/process/toggle/save behavior with
//! scripted collaborators, without touching real user directories.

use async_trait::async_trait;
use bgremover::{
    BackgroundRemover, BgRemoverError, GalleryWriter, ImageIOService, MediaPicker, PickedImage,
    PicturesWriter, RemovalFrame, RemovalOutcome, RemovalStream, Result, SaveReceipt,
    ScreenSession, SessionConfig,
};
use futures::StreamExt;
use image::DynamicImage;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a solid-colour test image
fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
    let mut img = image::RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = image::Rgba(rgba);
    }
    DynamicImage::ImageRgba8(img)
}

/// Remover that replays a fixed list of frames per invocation
struct ScriptedRemover {
    frames: Vec<DynamicImage>,
}

impl ScriptedRemover {
    fn new(frames: Vec<DynamicImage>) -> Self {
        Self { frames }
    }
}

impl BackgroundRemover for ScriptedRemover {
    fn remove(&self, _image: &DynamicImage) -> Result<RemovalStream> {
        let total = self.frames.len();
        let frames: Vec<Result<RemovalFrame>> = self
            .frames
            .iter()
            .cloned()
            .enumerate()
            .map(|(pass, image)| {
                Ok(if pass + 1 == total {
                    RemovalFrame::finished(image, pass)
                } else {
                    RemovalFrame::intermediate(image, pass)
                })
            })
            .collect();
        Ok(futures::stream::iter(frames).boxed())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Remover whose sequence completes without a single emission
struct EmptyRemover;

impl BackgroundRemover for EmptyRemover {
    fn remove(&self, _image: &DynamicImage) -> Result<RemovalStream> {
        Ok(futures::stream::empty().boxed())
    }

    fn name(&self) -> &'static str {
        "empty"
    }
}

/// Remover that emits one good frame and then fails mid-sequence
struct MidStreamFailRemover;

impl BackgroundRemover for MidStreamFailRemover {
    fn remove(&self, _image: &DynamicImage) -> Result<RemovalStream> {
        let items: Vec<Result<RemovalFrame>> = vec![
            Ok(RemovalFrame::intermediate(solid_image(2, 2, [9, 9, 9, 255]), 0)),
            Err(BgRemoverError::removal("inference backend crashed")),
        ];
        Ok(futures::stream::iter(items).boxed())
    }

    fn name(&self) -> &'static str {
        "mid-stream-fail"
    }
}

/// Remover whose invocation cannot start at all
struct BrokenRemover;

impl BackgroundRemover for BrokenRemover {
    fn remove(&self, _image: &DynamicImage) -> Result<RemovalStream> {
        Err(BgRemoverError::removal("model not loaded"))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// Picker that always returns the same image
struct FixedPicker {
    image: DynamicImage,
}

#[async_trait]
impl MediaPicker for FixedPicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        Ok(Some(PickedImage::new(self.image.clone())))
    }
}

/// Picker where the user always cancels
struct CancelPicker;

#[async_trait]
impl MediaPicker for CancelPicker {
    async fn pick_image(&self) -> Result<Option<PickedImage>> {
        Ok(None)
    }
}

/// Gallery writer that records every save in memory
#[derive(Clone)]
struct RecordingGallery {
    saves: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl RecordingGallery {
    fn new() -> Self {
        Self {
            saves: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saves.lock().unwrap().clone()
    }
}

impl GalleryWriter for RecordingGallery {
    fn save_png(&self, filename: &str, png_bytes: &[u8]) -> Result<SaveReceipt> {
        self.saves
            .lock()
            .unwrap()
            .push((filename.to_string(), png_bytes.to_vec()));
        Ok(SaveReceipt {
            path: std::path::PathBuf::from(filename),
            filename: filename.to_string(),
            bytes_written: png_bytes.len() as u64,
            saved_at: chrono::Utc::now(),
        })
    }
}

fn test_config() -> SessionConfig {
    SessionConfig::builder()
        .filename_prefix("test_output")
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_pick_processes_and_stores_output() {
    let output = solid_image(3, 2, [1, 2, 3, 255]);
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![solid_image(3, 2, [7, 7, 7, 255]), output.clone()]),
        FixedPicker {
            image: solid_image(6, 4, [0, 255, 0, 255]),
        },
        RecordingGallery::new(),
        test_config(),
    );

    let outcome = session.pick().await.unwrap();
    assert_eq!(outcome, Some(RemovalOutcome::Completed { frames: 2 }));

    let state = session.state();
    assert!(!state.is_processing(), "processing must clear after completion");
    assert!(state.can_save());
    assert_eq!(
        state.output().unwrap().to_rgba8().as_raw(),
        output.to_rgba8().as_raw(),
        "output must be the last emission"
    );
}

#[tokio::test]
async fn test_cancelled_pick_leaves_state_unchanged() {
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![solid_image(2, 2, [0, 0, 0, 0])]),
        CancelPicker,
        RecordingGallery::new(),
        test_config(),
    );

    let outcome = session.pick().await.unwrap();
    assert_eq!(outcome, None);

    let state = session.state();
    assert!(state.input().is_none());
    assert!(state.output().is_none());
    assert!(!state.is_processing());
}

#[tokio::test]
async fn test_save_without_output_is_rejected() {
    let gallery = RecordingGallery::new();
    let session = ScreenSession::new(
        ScriptedRemover::new(vec![]),
        CancelPicker,
        gallery.clone(),
        test_config(),
    );

    let result = session.save();
    assert!(matches!(result, Err(BgRemoverError::Gallery(_))));
    assert!(gallery.saved().is_empty(), "writer must not be called");
}

#[tokio::test]
async fn test_save_calls_writer_once_with_matching_png() {
    let output = solid_image(5, 5, [10, 20, 30, 200]);
    let gallery = RecordingGallery::new();
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![output.clone()]),
        FixedPicker {
            image: solid_image(5, 5, [0, 255, 0, 255]),
        },
        gallery.clone(),
        test_config(),
    );

    session.pick().await.unwrap();
    let receipt = session.save().unwrap();

    let saves = gallery.saved();
    assert_eq!(saves.len(), 1, "writer must be called exactly once");
    let (filename, bytes) = saves.into_iter().next().unwrap();
    assert_eq!(filename, receipt.filename);
    assert!(filename.starts_with("test_output_"));
    assert!(filename.ends_with(".png"));

    let decoded = ImageIOService::load_from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded.to_rgba8().as_raw(),
        output.to_rgba8().as_raw(),
        "saved PNG must match the output's pixel content"
    );
}

#[tokio::test]
async fn test_two_rapid_saves_get_distinct_filenames() {
    let gallery = RecordingGallery::new();
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![solid_image(2, 2, [1, 1, 1, 255])]),
        FixedPicker {
            image: solid_image(2, 2, [0, 255, 0, 255]),
        },
        gallery.clone(),
        test_config(),
    );

    session.pick().await.unwrap();
    let first = session.save().unwrap();
    let second = session.save().unwrap();

    assert_ne!(first.filename, second.filename);
    assert_eq!(gallery.saved().len(), 2);
}

#[tokio::test]
async fn test_double_toggle_restores_displayed_image() {
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![solid_image(3, 2, [1, 1, 1, 255])]),
        FixedPicker {
            image: solid_image(6, 4, [0, 255, 0, 255]),
        },
        RecordingGallery::new(),
        test_config(),
    );
    session.pick().await.unwrap();

    let before = session.displayed().map(|image| image.width());
    session.toggle();
    let toggled = session.displayed().map(|image| image.width());
    session.toggle();
    let after = session.displayed().map(|image| image.width());

    assert_eq!(before, Some(3), "processed image shown by default");
    assert_eq!(toggled, Some(6), "toggle shows the original");
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_superseded_invocation_is_discarded() {
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![solid_image(2, 2, [1, 1, 1, 255])]),
        CancelPicker,
        RecordingGallery::new(),
        test_config(),
    );

    let stale = session.set_input(PickedImage::new(solid_image(4, 4, [0, 255, 0, 255])));
    let _current = session.set_input(PickedImage::new(solid_image(8, 8, [0, 255, 0, 255])));

    let outcome = session.process(stale).await;
    assert_eq!(outcome, RemovalOutcome::Superseded);
    assert!(
        session.state().output().is_none(),
        "stale emissions must not land"
    );

    let outcome = session.process_current().await;
    assert_eq!(outcome, RemovalOutcome::Completed { frames: 1 });
    assert!(session.state().can_save());
}

#[tokio::test]
async fn test_empty_removal_is_surfaced() {
    let mut session = ScreenSession::new(
        EmptyRemover,
        FixedPicker {
            image: solid_image(4, 4, [0, 255, 0, 255]),
        },
        RecordingGallery::new(),
        test_config(),
    );

    let outcome = session.pick().await.unwrap();
    assert_eq!(outcome, Some(RemovalOutcome::Empty));

    let state = session.state();
    assert!(!state.is_processing(), "processing must clear even without output");
    assert!(!state.can_save());
}

#[tokio::test]
async fn test_failed_invocation_start_clears_processing() {
    let mut session = ScreenSession::new(
        BrokenRemover,
        FixedPicker {
            image: solid_image(4, 4, [0, 255, 0, 255]),
        },
        RecordingGallery::new(),
        test_config(),
    );

    let outcome = session.pick().await.unwrap();
    assert_eq!(outcome, Some(RemovalOutcome::Failed));
    assert!(!session.state().is_processing());
    assert!(!session.state().can_save());
}

#[tokio::test]
async fn test_mid_stream_failure_keeps_last_good_emission() {
    let mut session = ScreenSession::new(
        MidStreamFailRemover,
        FixedPicker {
            image: solid_image(4, 4, [0, 255, 0, 255]),
        },
        RecordingGallery::new(),
        test_config(),
    );

    let outcome = session.pick().await.unwrap();
    assert_eq!(outcome, Some(RemovalOutcome::Failed));
    assert!(!session.state().is_processing());
    assert!(
        session.state().can_save(),
        "emissions applied before the failure remain valid"
    );
}

#[tokio::test]
async fn test_pictures_writer_end_to_end() {
    let dir = TempDir::new().unwrap();
    let output = solid_image(3, 3, [50, 60, 70, 255]);
    let mut session = ScreenSession::new(
        ScriptedRemover::new(vec![output.clone()]),
        FixedPicker {
            image: solid_image(3, 3, [0, 255, 0, 255]),
        },
        PicturesWriter::with_directory(dir.path().to_path_buf()),
        test_config(),
    );

    session.pick().await.unwrap();
    let receipt = session.save().unwrap();

    assert!(receipt.path.exists());
    let on_disk = ImageIOService::load_image(&receipt.path).unwrap();
    assert_eq!(on_disk.to_rgba8().as_raw(), output.to_rgba8().as_raw());
}
