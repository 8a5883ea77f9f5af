//! Shared raster contract
//!
//! Filters take a 16-bit RGBA view of the decoded image and write a fresh
//! 8-bit RGBA raster of the same dimensions. Output rows are independent, so
//! they are filled in parallel.

use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use rayon::prelude::*;

/// 16-bit RGBA raster read by the filters
pub type Raster16 = ImageBuffer<Rgba<u16>, Vec<u16>>;

/// Channels per pixel
pub(crate) const CHANNELS: usize = 4;

/// Widen any decoded image to 16-bit straight-alpha RGBA.
///
/// 8-bit samples become `v * 257`, 16-bit sources pass through untouched.
pub fn widen(image: &DynamicImage) -> Raster16 {
    image.to_rgba16()
}

/// Narrow a 16-bit sample to 8 bits by truncating division by 256
#[inline]
pub fn narrow(sample: u32) -> u8 {
    (sample >> 8).min(u8::MAX as u32) as u8
}

/// Allocate an output raster matching `input` and fill it row by row.
///
/// `fill_row` receives the row index and that row's RGBA bytes. It must only
/// write the slice it is given; reads go to the immutable input.
pub(crate) fn map_rows<F>(input: &Raster16, fill_row: F) -> RgbaImage
where
    F: Fn(u32, &mut [u8]) + Sync,
{
    let (width, height) = input.dimensions();
    let mut output = RgbaImage::new(width, height);

    if width == 0 || height == 0 {
        return output;
    }

    let row_len = width as usize * CHANNELS;
    output
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| fill_row(y as u32, row));

    output
}
