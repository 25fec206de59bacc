//! User-supplied input image.
//!
//! [`InputImage`] holds a decoded bitmap normalised to 8-bit RGB regardless
//! of the source encoding (palette, grayscale, RGBA …).  The captioning
//! provider receives it re-encoded as PNG inside a `data:` URL.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// File extensions accepted by the upload UI (lower-case, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

// ---------------------------------------------------------------------------
// ImageError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ImageError {
    /// The file extension is not one of [`SUPPORTED_EXTENSIONS`].
    #[error("unsupported image type: {0} (expected jpg, jpeg or png)")]
    UnsupportedFormat(String),

    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),
}

/// Dimensions that fit inside a `max_side` square, keeping the aspect ratio.
///
/// Images already within bounds are returned unchanged; neither side drops
/// below one pixel.
///
/// ```
/// use image_story::image_input::preview_size;
///
/// assert_eq!(preview_size(640, 480, 1024), (640, 480));
/// assert_eq!(preview_size(4000, 2000, 1000), (1000, 500));
/// ```
pub fn preview_size(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_side {
        return (width, height);
    }

    let scale = |side: u32| ((side as u64 * max_side as u64) / longest as u64).max(1) as u32;
    (scale(width), scale(height))
}

/// Returns `true` when `path` has one of the [`SUPPORTED_EXTENSIONS`].
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

// ---------------------------------------------------------------------------
// InputImage
// ---------------------------------------------------------------------------

/// A decoded, RGB-normalised image ready for captioning.
#[derive(Debug, Clone)]
pub struct InputImage {
    name: String,
    pixels: RgbImage,
}

impl InputImage {
    /// Read and decode the file at `path`.
    pub fn open(path: &Path) -> Result<Self, ImageError> {
        if !is_supported(path) {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("<none>")
                .to_string();
            return Err(ImageError::UnsupportedFormat(ext));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, &bytes)
    }

    /// Decode an in-memory encoded image (format is sniffed from the bytes).
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, ImageError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

        Ok(Self::from_rgb(name, decoded.to_rgb8()))
    }

    /// Wrap an already-decoded RGB bitmap.
    pub fn from_rgb(name: impl Into<String>, pixels: RgbImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// Source file name, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Raw RGB8 pixel data, row-major.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Bitmap for on-screen display, downscaled to fit within `max_side`.
    ///
    /// The full-resolution pixels are kept for captioning.
    pub fn preview(&self, max_side: u32) -> Cow<'_, RgbImage> {
        let (w, h) = preview_size(self.width(), self.height(), max_side);
        if (w, h) == (self.width(), self.height()) {
            Cow::Borrowed(&self.pixels)
        } else {
            Cow::Owned(image::imageops::thumbnail(&self.pixels, w, h))
        }
    }

    /// Re-encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut buf = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| ImageError::Encode(e.to_string()))?;
        Ok(buf.into_inner())
    }

    /// `data:image/png;base64,…` URL for OpenAI-style `image_url` parts.
    pub fn to_data_url(&self) -> Result<String, ImageError> {
        let png = self.to_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png)
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
