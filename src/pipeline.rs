//! Decode, filter and encode in one call
//!
//! Shared by the web handlers and the file-based CLI commands.

use image::RgbaImage;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, instrument};

use crate::codec::{self, CodecError, EncodeOptions, OutputFormat};
use crate::filters::{self, DenoiseOptions, FilterError, FilterKind, MatteOptions};

/// Pipeline error types
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input not found: {0}")]
    InputNotFound(std::path::PathBuf),

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Settings for one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOptions {
    pub denoise: DenoiseOptions,
    pub matte: MatteOptions,
    pub encode: EncodeOptions,
}

impl PipelineOptions {
    /// Override the matte threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.matte.threshold = threshold;
        self
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct Processed {
    /// Encoded output
    pub data: Vec<u8>,
    /// Container of `data`
    pub format: OutputFormat,
    /// Output dimensions (always equal to the input's)
    pub width: u32,
    pub height: u32,
    /// Detected input container
    pub input_format: &'static str,
    /// Wall time spent in decode, filter and encode
    pub elapsed_ms: u64,
}

impl Processed {
    /// Number of pixels processed
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl FilterKind {
    /// Container each filter's result is sent in
    pub fn default_format(&self) -> OutputFormat {
        match self {
            FilterKind::Denoise => OutputFormat::Jpeg,
            FilterKind::RemoveBackground => OutputFormat::Png,
        }
    }

    /// Run the filter on a decoded image
    pub fn apply(&self, image: &image::DynamicImage, options: &PipelineOptions) -> Result<RgbaImage> {
        let wide = filters::widen(image);
        let output = match self {
            FilterKind::Denoise => filters::denoise_with(&wide, &options.denoise)?,
            FilterKind::RemoveBackground => filters::remove_background_with(&wide, &options.matte),
        };
        Ok(output)
    }
}

/// Decode `data`, run `kind`, and encode into the filter's default format
pub fn process(data: &[u8], kind: FilterKind, options: &PipelineOptions) -> Result<Processed> {
    process_as(data, kind, kind.default_format(), options)
}

/// Decode `data`, run `kind`, and encode into `format`
#[instrument(skip(data, options), fields(bytes = data.len()))]
pub fn process_as(
    data: &[u8],
    kind: FilterKind,
    format: OutputFormat,
    options: &PipelineOptions,
) -> Result<Processed> {
    let start = Instant::now();

    let decoded = codec::decode(data)?;
    let output = kind.apply(&decoded.image, options)?;
    let (width, height) = output.dimensions();
    let encoded = codec::encode(&output, format, &options.encode)?;

    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        input_format = decoded.format_name(),
        width,
        height,
        output_bytes = encoded.len(),
        elapsed_ms,
        "Filter applied"
    );

    Ok(Processed {
        data: encoded,
        format,
        width,
        height,
        input_format: decoded.format_name(),
        elapsed_ms,
    })
}

/// Process an image file into `output_path`, picking the format from its extension
pub fn process_file(
    input_path: &Path,
    output_path: &Path,
    kind: FilterKind,
    options: &PipelineOptions,
) -> Result<Processed> {
    if !input_path.exists() {
        return Err(PipelineError::InputNotFound(input_path.to_path_buf()));
    }

    let format = OutputFormat::from_path(output_path)?;
    if kind == FilterKind::RemoveBackground && !format.supports_alpha() {
        tracing::warn!(%format, "Output format drops alpha; removed background will not be transparent");
    }

    let data = std::fs::read(input_path)?;
    let processed = process_as(&data, kind, format, options)?;
    std::fs::write(output_path, &processed.data)?;

    Ok(processed)
}
