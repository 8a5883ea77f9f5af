//! Image decode/encode adapter
//!
//! Decoding sniffs the container from the bytes themselves. Encoding takes an
//! explicit [`OutputFormat`] instead of guessing from a file name.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Codec error types
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported or invalid image data: {0}")]
    Decode(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Target container for encoded results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy, alpha discarded
    Jpeg,
    /// Lossless, alpha preserved
    Png,
}

impl OutputFormat {
    /// Map a file extension (without the dot) to a format
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(CodecError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Map a path's extension to a format
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    /// MIME type for the Content-Type header
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    /// Whether the format keeps the alpha channel
    pub fn supports_alpha(&self) -> bool {
        matches!(self, OutputFormat::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoder settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncodeOptions {
    /// Set JPEG quality, clamped to 1-100
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}

/// A decoded upload
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixel data
    pub image: DynamicImage,
    /// Container detected from the bytes
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Short name of the detected container
    pub fn format_name(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("unknown")
    }
}

/// Decode an image, detecting the container from its content
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let format = image::guess_format(data).map_err(|e| CodecError::Decode(e.to_string()))?;
    let image = image::load_from_memory_with_format(data, format)
        .map_err(|e| CodecError::Decode(e.to_string()))?;

    debug!(
        format = ?format,
        width = image.width(),
        height = image.height(),
        "Image decoded"
    );

    Ok(DecodedImage { image, format })
}

/// Encode a raster into the requested container
pub fn encode(image: &RgbaImage, format: OutputFormat, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, options.jpeg_quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }
        OutputFormat::Png => {
            let mut cursor = Cursor::new(&mut buffer);
            image
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(|e| CodecError::Encode(e.to_string()))?;
        }
    }

    debug!(format = %format, bytes = buffer.len(), "Image encoded");
    Ok(buffer)
}
