//! QR code decoder using rqrr

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage};

/// QR code decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self
    }

    /// Decode the first QR code found in an image
    pub fn decode(&self, img: &DynamicImage) -> Result<String> {
        self.decode_gray(&img.to_luma8())
    }

    /// Decode the first QR code found in a grayscale image
    pub fn decode_gray(&self, img: &GrayImage) -> Result<String> {
        let mut prepared = rqrr::PreparedImage::prepare(img.clone());
        let grids = prepared.detect_grids();

        let grid = grids.first().ok_or(Error::NoQrCodeFound)?;

        match grid.decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    "Decoded QR: version={:?}, ecc_level={:?}, length={}",
                    meta.version,
                    meta.ecc_level,
                    content.len()
                );
                Ok(content)
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }

    /// Whether the image still scans to `expected`
    pub fn verify(&self, img: &DynamicImage, expected: &str) -> bool {
        match self.decode(img) {
            Ok(content) => content == expected,
            Err(err) => {
                tracing::debug!(error = %err, "Verification scan failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_image_has_no_code() {
        let blank = GrayImage::from_pixel(120, 120, image::Luma([255]));
        let err = QrDecoder::new().decode_gray(&blank).unwrap_err();
        assert!(matches!(err, Error::NoQrCodeFound));
    }

    #[test]
    fn test_verify_mismatch() {
        let raster = crate::qr::QrEncoder::new().encode("alpha").unwrap();
        let image = DynamicImage::ImageLuma8(raster);
        let decoder = QrDecoder::new();
        assert!(decoder.verify(&image, "alpha"));
        assert!(!decoder.verify(&image, "beta"));
    }
}
