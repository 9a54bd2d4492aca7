//! Source decoding for discovered assets.
//!
//! Assets arrive in common raster formats or as layered working
//! documents. A [`DecoderStack`] tries each strategy in a fixed order
//! and reports every attempt's failure when none can read a file, so a
//! bad source never aborts a batch on its own.

mod layered;

pub use layered::LayeredError;

use std::path::Path;

use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Raster(#[from] image::ImageError),

    #[error(transparent)]
    Layered(#[from] LayeredError),

    #[error("no decoder could read {path}: {causes}")]
    Exhausted { path: String, causes: String },
}

/// One decoding strategy.
pub trait Decode {
    fn name(&self) -> &'static str;
    fn decode(&self, path: &Path) -> Result<RgbaImage, DecodeError>;
}

/// Common raster formats via the `image` crate.
pub struct RasterDecoder;

impl Decode for RasterDecoder {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, DecodeError> {
        Ok(image::open(path)?.to_rgba8())
    }
}

/// Layered working documents, flattened to a single raster.
pub struct LayeredDecoder;

impl Decode for LayeredDecoder {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, DecodeError> {
        let bytes = std::fs::read(path)?;
        Ok(layered::flatten(&bytes)?)
    }
}

/// Ordered decoding strategies tried until one succeeds.
pub struct DecoderStack {
    decoders: Vec<Box<dyn Decode>>,
}

impl DecoderStack {
    /// The standard fallback order: raster formats first, layered
    /// documents second.
    pub fn standard() -> Self {
        Self {
            decoders: vec![Box::new(RasterDecoder), Box::new(LayeredDecoder)],
        }
    }

    pub fn decode(&self, path: &Path) -> Result<RgbaImage, DecodeError> {
        let mut causes = Vec::new();
        for decoder in &self.decoders {
            match decoder.decode(path) {
                Ok(raster) => return Ok(raster),
                Err(err) => causes.push(format!("{}: {err}", decoder.name())),
            }
        }
        Err(DecodeError::Exhausted {
            path: path.display().to_string(),
            causes: causes.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::layered::testutil;
    use super::*;
    use image::{ImageFormat, Rgba};

    #[test]
    fn test_raster_decoder_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spellbook_fire_0x0001.png");
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.save_with_format(&path, ImageFormat::Png).unwrap();

        let decoded = RasterDecoder.decode(&path).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_stack_falls_back_to_layered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spellbook_fire_0x0001.psd");
        let bytes = testutil::document(2, 2, &[testutil::leaf(0, 0, 2, 2, [0, 255, 0, 255])]);
        std::fs::write(&path, bytes).unwrap();

        let decoded = DecoderStack::standard().decode(&path).unwrap();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(1, 1).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_stack_reports_every_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spellbook_bad_0x0002.psd");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = DecoderStack::standard().decode(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("raster:"), "missing raster cause: {message}");
        assert!(message.contains("layered:"), "missing layered cause: {message}");
    }

    #[test]
    fn test_stack_missing_file() {
        let err = DecoderStack::standard()
            .decode(Path::new("/nonexistent/spellbook_fire_0x0001.png"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Exhausted { .. }));
    }
}
