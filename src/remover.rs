//! Background removal capability seam
//!
//! The session treats removal as an opaque capability: an invocation yields a
//! lazy, finite, ordered sequence of frames so implementations can stream
//! progressive refinements. Alternative implementations (local model, remote
//! service) are substitutable behind [`BackgroundRemover`].

use crate::error::{BgRemoverError, Result};
use crate::types::RemovalFrame;
use futures::stream::BoxStream;
use futures::StreamExt;
use image::{DynamicImage, RgbaImage};
use std::sync::Arc;

/// Ordered finite sequence of removal frames produced by one invocation
///
/// Restartable per invocation, not restartable mid-sequence. A well-behaved
/// implementation emits at least one frame.
pub type RemovalStream = BoxStream<'static, Result<RemovalFrame>>;

/// Capability interface for background removal implementations
pub trait BackgroundRemover: Send + Sync {
    /// Start a removal invocation over the given image
    ///
    /// # Errors
    /// Returns an error when the invocation cannot start (for example on an
    /// empty input image). Per-frame failures are reported through the
    /// stream items instead.
    fn remove(&self, image: &DynamicImage) -> Result<RemovalStream>;

    /// Short identifier for logging
    fn name(&self) -> &'static str;
}

/// Built-in chroma-distance remover
///
/// Clears every pixel whose colour lies within `tolerance` of the key colour
/// (normalized RGB distance). Emits two passes per invocation: a hard mask,
/// then an edge-softened refinement.
#[derive(Debug, Clone)]
pub struct ChromaKeyRemover {
    key: [u8; 3],
    tolerance: f32,
}

impl ChromaKeyRemover {
    /// Create a remover for the given key colour and tolerance
    ///
    /// # Arguments
    /// * `key` - RGB colour treated as background
    /// * `tolerance` - Normalized colour distance below which a pixel is
    ///   cleared, in `0.0..=1.0`
    ///
    /// # Errors
    /// Returns `InvalidConfig` when tolerance is out of range or not finite.
    pub fn new(key: [u8; 3], tolerance: f32) -> Result<Self> {
        if !tolerance.is_finite() || !(0.0..=1.0).contains(&tolerance) {
            return Err(BgRemoverError::config_value_error(
                "tolerance",
                tolerance,
                "0.0-1.0",
            ));
        }
        Ok(Self { key, tolerance })
    }

    /// Remover keyed on pure green with a moderate tolerance
    #[must_use]
    pub fn green_screen() -> Self {
        Self {
            key: [0, 255, 0],
            tolerance: 0.25,
        }
    }
}

impl Default for ChromaKeyRemover {
    fn default() -> Self {
        Self::green_screen()
    }
}

impl BackgroundRemover for ChromaKeyRemover {
    fn remove(&self, image: &DynamicImage) -> Result<RemovalStream> {
        if image.width() == 0 || image.height() == 0 {
            return Err(BgRemoverError::removal(
                "cannot remove background from an empty image",
            ));
        }

        let source = Arc::new(image.to_rgba8());
        let key = self.key;
        let tolerance = self.tolerance;

        // Lazy per-pass computation; each pass is produced on demand.
        let frames = futures::stream::unfold(0usize, move |pass| {
            let source = Arc::clone(&source);
            async move {
                match pass {
                    0 => {
                        let masked = apply_hard_mask(&source, key, tolerance);
                        Some((
                            Ok(RemovalFrame::intermediate(
                                DynamicImage::ImageRgba8(masked),
                                0,
                            )),
                            1,
                        ))
                    },
                    1 => {
                        let masked = apply_hard_mask(&source, key, tolerance);
                        let softened = soften_alpha(&masked);
                        Some((
                            Ok(RemovalFrame::finished(
                                DynamicImage::ImageRgba8(softened),
                                1,
                            )),
                            2,
                        ))
                    },
                    _ => None,
                }
            }
        });

        Ok(frames.boxed())
    }

    fn name(&self) -> &'static str {
        "chroma-key"
    }
}

/// Normalized RGB distance between a pixel and the key colour (0.0-1.0)
fn chroma_distance(pixel: [u8; 4], key: [u8; 3]) -> f32 {
    let [r, g, b, _a] = pixel;
    let [kr, kg, kb] = key;
    let dr = f32::from(r) - f32::from(kr);
    let dg = f32::from(g) - f32::from(kg);
    let db = f32::from(b) - f32::from(kb);
    (dr * dr + dg * dg + db * db).sqrt() / (255.0 * 3.0_f32.sqrt())
}

/// Clear every pixel within tolerance of the key colour
fn apply_hard_mask(source: &RgbaImage, key: [u8; 3], tolerance: f32) -> RgbaImage {
    let mut output = source.clone();
    for pixel in output.pixels_mut() {
        if chroma_distance(pixel.0, key) <= tolerance {
            let [r, g, b, _a] = pixel.0;
            *pixel = image::Rgba([r, g, b, 0]);
        }
    }
    output
}

/// Average each pixel's alpha over its 3x3 neighbourhood
///
/// Leaves colour channels untouched; only transition edges between subject
/// and cleared background pick up intermediate alpha.
fn soften_alpha(masked: &RgbaImage) -> RgbaImage {
    let (width, height) = masked.dimensions();
    let mut output = masked.clone();

    for y in 0..height {
        for x in 0..width {
            let mut total = 0u32;
            let mut count = 0u32;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = i64::from(x) + dx;
                    let ny = i64::from(y) + dy;
                    if nx >= 0 && ny >= 0 && nx < i64::from(width) && ny < i64::from(height) {
                        let [_r, _g, _b, a] = masked.get_pixel(nx as u32, ny as u32).0;
                        total += u32::from(a);
                        count += 1;
                    }
                }
            }
            let [r, g, b, _a] = masked.get_pixel(x, y).0;
            let averaged = (total / count.max(1)) as u8;
            output.put_pixel(x, y, image::Rgba([r, g, b, averaged]));
        }
    }
    output
}
