//! imgscrub - image cleanup over HTTP
//!
//! Two pixel filters, a codec adapter around the `image` crate, and an
//! optional axum server (feature `web`, on by default).
//!
//! # Example
//!
//! ```
//! use image::{DynamicImage, Rgba, RgbaImage};
//! use imgscrub::filters;
//!
//! let white = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
//! let cut = filters::remove_background(&DynamicImage::ImageRgba8(white), 180);
//! assert!(cut.pixels().all(|p| p.0 == [0, 0, 0, 0]));
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod filters;
pub mod pipeline;

#[cfg(feature = "web")]
pub mod web;

pub use cli::{Cli, Commands, FilterArgs, RemoveBgArgs, ServeArgs};
pub use codec::{CodecError, DecodedImage, EncodeOptions, OutputFormat};
pub use config::{CliOverrides, Config, ConfigError};
pub use filters::{DenoiseOptions, FilterError, FilterKind, MatteOptions};
pub use pipeline::{PipelineError, PipelineOptions, Processed};

#[cfg(feature = "web")]
pub use web::{AppError, AppState, MetricsCollector, ServerConfig, StatsResponse, WebServer};

/// Process exit codes
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// Unclassified failure
    pub const GENERAL_ERROR: i32 = 1;
    /// Bad arguments or configuration
    pub const INVALID_ARGS: i32 = 2;
    /// Input file does not exist
    pub const INPUT_NOT_FOUND: i32 = 3;
    /// Decode, filter or encode failed
    pub const PROCESSING_ERROR: i32 = 4;
}
