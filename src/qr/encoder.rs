//! QR code encoder

use crate::error::{Error, Result};
use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

/// Pixels per QR module when nothing else is configured
pub const DEFAULT_MODULE_SIZE: u32 = 10;

/// QR code encoder
///
/// The error correction level is fixed at L. The symbol version is chosen by
/// `qrcode` as the smallest one that fits the payload.
#[derive(Debug, Clone)]
pub struct QrEncoder {
    ecc_level: EcLevel,
    module_size: u32,
    quiet_zone: bool,
}

impl QrEncoder {
    /// Create a new QR encoder with default settings
    pub fn new() -> Self {
        Self {
            ecc_level: EcLevel::L,
            module_size: DEFAULT_MODULE_SIZE,
            quiet_zone: true,
        }
    }

    /// Override the rendered size of a single module in pixels
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size.max(1);
        self
    }

    /// Toggle the four-module quiet zone around the symbol
    pub fn with_quiet_zone(mut self, quiet_zone: bool) -> Self {
        self.quiet_zone = quiet_zone;
        self
    }

    /// Encode text into a QR raster
    pub fn encode(&self, data: &str) -> Result<GrayImage> {
        if data.is_empty() {
            return Err(Error::Encoding("input text is empty".to_string()));
        }

        let code = QrCode::with_error_correction_level(data.as_bytes(), self.ecc_level)?;
        tracing::debug!(
            version = ?code.version(),
            modules = code.width(),
            bytes = data.len(),
            "Encoded QR symbol"
        );

        Ok(code
            .render::<Luma<u8>>()
            .quiet_zone(self.quiet_zone)
            .module_dimensions(self.module_size, self.module_size)
            .dark_color(Luma([0]))
            .light_color(Luma([255]))
            .build())
    }
}

impl Default for QrEncoder {
    fn default() -> Self {
        Self::new()
    }
}
