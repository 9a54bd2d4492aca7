//! PNG output for composed rasters.
//!
//! Output stays lossless and alpha-preserving; scaling is integer
//! nearest-neighbour so icon edges stay crisp in previews.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::error::{PressError, Result};

/// Write a raster to `path` as PNG, scaled by an integer factor
/// (1 = no scaling).
pub fn write_png(image: &RgbaImage, path: &Path, scale: u32) -> Result<()> {
    let scale = scale.max(1);
    let scaled;
    let output = if scale == 1 {
        image
    } else {
        scaled = scale_rgba(image, scale);
        &scaled
    };
    output
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| PressError::Io {
            path: path.to_path_buf(),
            message: format!("failed to write PNG: {}", e),
        })
}

/// Nearest-neighbour integer upscale.
pub fn scale_rgba(image: &RgbaImage, scale: u32) -> RgbaImage {
    if scale <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * scale,
        image.height() * scale,
        FilterType::Nearest,
    )
}
