//! Resize, alpha-cap and blend an overlay onto a source raster

use super::WatermarkParams;
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Largest resized overlay, in pixels, the compositor will allocate
pub const MAX_OVERLAY_PIXELS: u64 = 4096 * 4096;

/// Decode raster bytes in any format the `image` crate recognises.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(|e| Error::ImageLoad(e.to_string()))?;
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::ImageLoad("image has zero width or height".to_string()));
    }
    Ok(image)
}

/// Overlay dimensions for a source of `source_width` pixels.
///
/// Width is `floor(source_width * scale)`; height keeps the overlay's original
/// aspect ratio, rounded to the nearest pixel. Targets above
/// [`MAX_OVERLAY_PIXELS`] are rejected before anything is allocated.
pub fn target_size(source_width: u32, overlay: (u32, u32), scale: f64) -> Result<(u32, u32)> {
    let (overlay_width, overlay_height) = overlay;
    if overlay_width == 0 || overlay_height == 0 {
        return Err(Error::ImageLoad(
            "watermark has zero width or height".to_string(),
        ));
    }

    let width = (f64::from(source_width) * scale).floor() as u32;
    let raw_height =
        (f64::from(width) * (f64::from(overlay_height) / f64::from(overlay_width))).round();

    if f64::from(width) * raw_height > MAX_OVERLAY_PIXELS as f64 {
        return Err(Error::InvalidParameter(format!(
            "scale {scale} stretches a {overlay_width}x{overlay_height} watermark to {width}x{raw_height} on a {source_width} px wide image, above the {MAX_OVERLAY_PIXELS} pixel limit"
        )));
    }

    let height = raw_height as u32;
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter(format!(
            "scale {scale} shrinks a {overlay_width}x{overlay_height} watermark to {width}x{height} on a {source_width} px wide image"
        )));
    }

    Ok((width, height))
}

/// Resized copy of `overlay` with every alpha value capped at `params.opacity`.
pub fn prepare_overlay(
    source_width: u32,
    overlay: &DynamicImage,
    params: &WatermarkParams,
) -> Result<RgbaImage> {
    let (width, height) = target_size(source_width, (overlay.width(), overlay.height()), params.scale)?;

    let mut resized = imageops::resize(&overlay.to_rgba8(), width, height, FilterType::Lanczos3);
    for pixel in resized.pixels_mut() {
        pixel.0[3] = pixel.0[3].min(params.opacity);
    }

    Ok(resized)
}

/// Blend `overlay` onto `source` and flatten to RGB.
///
/// The output always has the source's dimensions. Overlay pixels falling
/// outside the source are dropped.
pub fn compose(
    source: &DynamicImage,
    overlay: &DynamicImage,
    params: &WatermarkParams,
) -> Result<RgbImage> {
    let mut canvas = source.to_rgba8();
    let prepared = prepare_overlay(canvas.width(), overlay, params)?;
    let (x, y) = params
        .position
        .offset(canvas.dimensions(), prepared.dimensions());

    tracing::debug!(
        position = %params.position,
        opacity = params.opacity,
        width = prepared.width(),
        height = prepared.height(),
        x,
        y,
        "Compositing watermark"
    );

    imageops::overlay(&mut canvas, &prepared, x, y);

    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
}
