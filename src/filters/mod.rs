//! Pixel filters
//!
//! Two stateless image-to-image transforms over RGBA rasters:
//!
//! # Features
//!
//! - **Denoise** ([`denoise`]) - Uniform box average with a fixed full-area divisor
//! - **Background Matte** ([`matte`]) - Clear pixels whose four channels all exceed a threshold
//!
//! Both filters read the input at 16-bit precision, allocate a fresh output
//! raster of the same size and never fail for a valid raster.

pub mod denoise;
pub mod matte;
pub mod raster;
mod types;

// Re-export public API
pub use denoise::{denoise, denoise_with, DenoiseOptions, DenoiseOptionsBuilder};
pub use matte::{remove_background, remove_background_with, MatteOptions, MatteOptionsBuilder};
pub use raster::{narrow, widen, Raster16};
pub use types::{FilterError, FilterKind};

/// Default denoise kernel edge length
pub const DEFAULT_KERNEL_SIZE: u32 = 3;

/// Default background threshold
pub const DEFAULT_THRESHOLD: u8 = 180;
