//! Watermark compositing
//!
//! An overlay image is scaled relative to the QR raster, its alpha channel is
//! capped to the requested opacity, and the result is blended onto the QR
//! code at one of five anchor positions.

mod compositor;
mod position;

pub use compositor::{MAX_OVERLAY_PIXELS, compose, decode_image, prepare_overlay, target_size};
pub use position::{MARGIN, Position};

use crate::error::{Error, Result};

/// Opacity cap applied when none is supplied
pub const DEFAULT_OPACITY: u8 = 128;

/// Overlay width as a fraction of source width when none is supplied
pub const DEFAULT_SCALE: f64 = 0.25;

/// Validated compositing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkParams {
    /// Anchor the overlay is placed against
    pub position: Position,
    /// Upper bound for every overlay pixel's alpha
    pub opacity: u8,
    /// Overlay width as a fraction of the source width, in (0, 1]
    pub scale: f64,
}

impl WatermarkParams {
    /// Build parameters from caller-supplied values, rejecting anything out of range.
    pub fn new(position: Position, opacity: i64, scale: f64) -> Result<Self> {
        let opacity = u8::try_from(opacity).map_err(|_| {
            Error::InvalidParameter(format!("transparency must be within 0..=255, got {opacity}"))
        })?;

        if !scale.is_finite() || scale <= 0.0 || scale > 1.0 {
            return Err(Error::InvalidParameter(format!(
                "scale must be within (0, 1], got {scale}"
            )));
        }

        Ok(Self {
            position,
            opacity,
            scale,
        })
    }

    /// Parse the raw string form fields used by the HTTP and CLI surfaces.
    ///
    /// Missing fields take the values in `defaults`.
    pub fn from_fields(
        position: Option<&str>,
        transparency: Option<&str>,
        scale: Option<&str>,
        defaults: &WatermarkParams,
    ) -> Result<Self> {
        let position = position
            .map(Position::parse)
            .unwrap_or(defaults.position);

        let opacity = match transparency.map(str::trim) {
            Some(raw) => raw.parse::<i64>().map_err(|e| {
                Error::InvalidParameter(format!("transparency '{raw}' is not an integer: {e}"))
            })?,
            None => i64::from(defaults.opacity),
        };

        let scale = match scale.map(str::trim) {
            Some(raw) => raw.parse::<f64>().map_err(|e| {
                Error::InvalidParameter(format!("scale '{raw}' is not a number: {e}"))
            })?,
            None => defaults.scale,
        };

        Self::new(position, opacity, scale)
    }
}

impl Default for WatermarkParams {
    fn default() -> Self {
        Self {
            position: Position::Center,
            opacity: DEFAULT_OPACITY,
            scale: DEFAULT_SCALE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = WatermarkParams::default();
        assert_eq!(params.position, Position::Center);
        assert_eq!(params.opacity, 128);
        assert_eq!(params.scale, 0.25);
    }

    #[test]
    fn test_scale_bounds() {
        assert!(WatermarkParams::new(Position::Center, 128, 1.0).is_ok());
        for bad in [0.0, -0.5, 1.01, f64::NAN, f64::INFINITY] {
            let err = WatermarkParams::new(Position::Center, 128, bad).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "scale {bad}");
        }
    }

    #[test]
    fn test_opacity_bounds() {
        assert!(WatermarkParams::new(Position::Center, 0, 0.25).is_ok());
        assert!(WatermarkParams::new(Position::Center, 255, 0.25).is_ok());
        for bad in [-1, 256, 1000] {
            let err = WatermarkParams::new(Position::Center, bad, 0.25).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter(_)), "opacity {bad}");
        }
    }

    #[test]
    fn test_from_fields_uses_defaults() {
        let params =
            WatermarkParams::from_fields(None, None, None, &WatermarkParams::default()).unwrap();
        assert_eq!(params, WatermarkParams::default());
    }

    #[test]
    fn test_from_fields_parses_values() {
        let params = WatermarkParams::from_fields(
            Some("top-right"),
            Some(" 200 "),
            Some("0.5"),
            &WatermarkParams::default(),
        )
        .unwrap();
        assert_eq!(params.position, Position::TopRight);
        assert_eq!(params.opacity, 200);
        assert_eq!(params.scale, 0.5);
    }

    #[test]
    fn test_from_fields_rejects_garbage() {
        let defaults = WatermarkParams::default();
        assert!(matches!(
            WatermarkParams::from_fields(None, Some("lots"), None, &defaults),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            WatermarkParams::from_fields(None, None, Some("big"), &defaults),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            WatermarkParams::from_fields(None, Some("300"), None, &defaults),
            Err(Error::InvalidParameter(_))
        ));
    }
}
