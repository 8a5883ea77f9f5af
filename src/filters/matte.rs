//! Background matte module
//!
//! Removes a bright, opaque background by thresholding every channel.
//!
//! # Algorithm
//!
//! 1. Narrow the pixel's four 16-bit channels to 8 bits
//! 2. If red, green, blue and alpha are all strictly above the threshold,
//!    the pixel is background and becomes transparent black
//! 3. Otherwise the narrowed pixel is copied as is
//!
//! This is a per-pixel AND test, not a color distance. Bright opaque
//! foreground is cleared along with the background.

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::raster::{self, Raster16, CHANNELS};
use super::DEFAULT_THRESHOLD;

/// Options for background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatteOptions {
    /// Channel cutoff; a pixel is background when every channel exceeds it
    pub threshold: u8,
}

impl Default for MatteOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl MatteOptions {
    /// Create a builder
    pub fn builder() -> MatteOptionsBuilder {
        MatteOptionsBuilder::default()
    }

    /// Whether an 8-bit pixel is classified as background
    #[inline]
    pub fn is_background(&self, pixel: [u8; 4]) -> bool {
        pixel.iter().all(|&c| c > self.threshold)
    }
}

/// Builder for MatteOptions
#[derive(Debug, Default)]
pub struct MatteOptionsBuilder {
    options: MatteOptions,
}

impl MatteOptionsBuilder {
    /// Set threshold
    #[must_use]
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> MatteOptions {
        self.options
    }
}

/// Remove the background with the given threshold
pub fn remove_background(input: &DynamicImage, threshold: u8) -> RgbaImage {
    let options = MatteOptions::builder().threshold(threshold).build();
    remove_background_with(&raster::widen(input), &options)
}

/// Remove the background of a 16-bit raster
pub fn remove_background_with(input: &Raster16, options: &MatteOptions) -> RgbaImage {
    let row_len = input.width() as usize * CHANNELS;
    let src = input.as_raw();

    raster::map_rows(input, |y, row| {
        let start = y as usize * row_len;
        let src_row = &src[start..start + row_len];

        for (out, wide) in row
            .chunks_exact_mut(CHANNELS)
            .zip(src_row.chunks_exact(CHANNELS))
        {
            let pixel = [
                raster::narrow(wide[0] as u32),
                raster::narrow(wide[1] as u32),
                raster::narrow(wide[2] as u32),
                raster::narrow(wide[3] as u32),
            ];

            if options.is_background(pixel) {
                out.copy_from_slice(&[0, 0, 0, 0]);
            } else {
                out.copy_from_slice(&pixel);
            }
        }
    })
}
