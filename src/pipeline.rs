//! Request-scoped generation pipeline
//!
//! decode watermark → encode QR → composite → PNG bytes. Every buffer is
//! owned by the call; nothing touches the filesystem.

use crate::error::{Error, Result};
use crate::qr::{QrDecoder, QrEncoder};
use crate::watermark::{self, WatermarkParams};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Input for one generation
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Text to encode
    pub data: String,
    /// Optional watermark with its compositing parameters
    pub watermark: Option<WatermarkInput>,
}

impl GenerationRequest {
    /// Plain QR code, no watermark
    pub fn plain(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            watermark: None,
        }
    }

    /// QR code with `image` composited using `params`
    pub fn watermarked(data: impl Into<String>, image: Bytes, params: WatermarkParams) -> Self {
        Self {
            data: data.into(),
            watermark: Some(WatermarkInput { image, params }),
        }
    }
}

/// Encoded watermark image plus how to apply it
#[derive(Debug, Clone)]
pub struct WatermarkInput {
    /// Raw image bytes in any supported raster format
    pub image: Bytes,
    /// Compositing parameters
    pub params: WatermarkParams,
}

/// PNG output of one generation
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Encoded PNG bytes
    pub png: Vec<u8>,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Whether a watermark was composited
    pub watermarked: bool,
    /// Scan verdict for watermarked output when verification is enabled
    pub scannable: Option<bool>,
}

/// Runs generation requests with a fixed encoder configuration
#[derive(Debug, Clone, Default)]
pub struct Generator {
    encoder: QrEncoder,
    decoder: QrDecoder,
    verify_output: bool,
}

impl Generator {
    /// Create a generator around `encoder`
    pub fn new(encoder: QrEncoder) -> Self {
        Self {
            encoder,
            decoder: QrDecoder::new(),
            verify_output: false,
        }
    }

    /// Re-scan watermarked output and report the verdict in [`GeneratedImage::scannable`]
    pub fn with_verification(mut self, verify_output: bool) -> Self {
        self.verify_output = verify_output;
        self
    }

    /// Run one request to completion.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        if request.data.is_empty() {
            return Err(Error::MissingData);
        }

        // Decode first so a bad upload fails before any encoding work.
        let overlay = match &request.watermark {
            Some(input) => Some((watermark::decode_image(&input.image)?, input.params)),
            None => None,
        };

        let raster = DynamicImage::ImageLuma8(self.encoder.encode(&request.data)?);

        let Some((overlay, params)) = overlay else {
            return encode_png(&raster, false, None);
        };

        let composed = DynamicImage::ImageRgb8(watermark::compose(&raster, &overlay, &params)?);

        let scannable = if self.verify_output {
            let ok = self.decoder.verify(&composed, &request.data);
            if !ok {
                tracing::warn!(
                    position = %params.position,
                    opacity = params.opacity,
                    scale = params.scale,
                    "Watermarked QR code no longer scans"
                );
            }
            Some(ok)
        } else {
            None
        };

        encode_png(&composed, true, scannable)
    }
}

fn encode_png(image: &DynamicImage, watermarked: bool, scannable: Option<bool>) -> Result<GeneratedImage> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(GeneratedImage {
        png,
        width: image.width(),
        height: image.height(),
        watermarked,
        scannable,
    })
}
