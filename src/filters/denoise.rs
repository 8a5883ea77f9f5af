//! Denoise module
//!
//! Smooths an image with a uniform box kernel.
//!
//! # Algorithm
//!
//! 1. Sum the 16-bit red, green and blue samples of every in-bounds kernel
//!    position around the pixel (alpha is ignored)
//! 2. Divide each sum by the full kernel area, even when some positions fall
//!    outside the image
//! 3. Narrow to 8 bits and force alpha to 255
//!
//! Because skipped positions still count in the divisor, edge and corner
//! pixels come out darker than their neighborhood. Output from earlier
//! releases depends on this, so it is kept bit-exact.

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::raster::{self, Raster16, CHANNELS};
use super::types::{FilterError, Result};
use super::DEFAULT_KERNEL_SIZE;

// ============================================================
// Constants
// ============================================================

/// Largest accepted kernel edge length
const MAX_KERNEL_SIZE: u32 = 31;

// ============================================================
// Types
// ============================================================

/// Options for denoise processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenoiseOptions {
    /// Kernel edge length (odd)
    pub kernel_size: u32,
}

impl Default for DenoiseOptions {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
        }
    }
}

impl DenoiseOptions {
    /// Create a builder
    pub fn builder() -> DenoiseOptionsBuilder {
        DenoiseOptionsBuilder::default()
    }

    /// Check options that did not come through the builder
    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 || self.kernel_size > MAX_KERNEL_SIZE {
            return Err(FilterError::InvalidKernelSize(self.kernel_size));
        }
        Ok(())
    }

    /// Kernel radius
    fn half(&self) -> i64 {
        (self.kernel_size / 2) as i64
    }

    /// Divisor applied to every channel sum
    fn area(&self) -> u64 {
        self.kernel_size as u64 * self.kernel_size as u64
    }
}

/// Builder for DenoiseOptions
#[derive(Debug, Default)]
pub struct DenoiseOptionsBuilder {
    options: DenoiseOptions,
}

impl DenoiseOptionsBuilder {
    /// Set kernel size, rounded up to the next odd value
    #[must_use]
    pub fn kernel_size(mut self, size: u32) -> Self {
        self.options.kernel_size = (size | 1).min(MAX_KERNEL_SIZE);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> DenoiseOptions {
        self.options
    }
}

// ============================================================
// Filter
// ============================================================

/// Denoise with the default 3x3 kernel
pub fn denoise(input: &DynamicImage) -> RgbaImage {
    box_average(&raster::widen(input), &DenoiseOptions::default())
}

/// Denoise a 16-bit raster with the given options
///
/// Fails with [`FilterError::InvalidKernelSize`] unless the kernel size is
/// odd and within `1..=31`.
pub fn denoise_with(input: &Raster16, options: &DenoiseOptions) -> Result<RgbaImage> {
    options.validate()?;
    Ok(box_average(input, options))
}

/// Box average over a validated kernel
fn box_average(input: &Raster16, options: &DenoiseOptions) -> RgbaImage {
    let (width, height) = input.dimensions();
    let (w, h) = (width as i64, height as i64);
    let half = options.half();
    let area = options.area();
    let src = input.as_raw();

    raster::map_rows(input, |y, row| {
        let y = y as i64;
        for x in 0..w {
            let mut totals = [0u64; 3];

            for ky in -half..=half {
                let ny = y + ky;
                if ny < 0 || ny >= h {
                    continue;
                }
                for kx in -half..=half {
                    let nx = x + kx;
                    if nx < 0 || nx >= w {
                        continue;
                    }
                    let idx = (ny * w + nx) as usize * CHANNELS;
                    totals[0] += src[idx] as u64;
                    totals[1] += src[idx + 1] as u64;
                    totals[2] += src[idx + 2] as u64;
                }
            }

            let out = x as usize * CHANNELS;
            for (c, total) in totals.iter().enumerate() {
                row[out + c] = raster::narrow((total / area) as u32);
            }
            row[out + 3] = u8::MAX;
        }
    })
}

// ============================================================
// Tests
// ============================================================
