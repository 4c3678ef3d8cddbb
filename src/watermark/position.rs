//! Anchor positions for the overlay

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Fixed distance in pixels between a corner-anchored overlay and the edge
pub const MARGIN: i64 = 10;

/// Where the overlay's top-left corner lands on the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Centered on both axes
    #[default]
    Center,
    /// Top-left corner, inset by [`MARGIN`]
    TopLeft,
    /// Top-right corner, inset by [`MARGIN`]
    TopRight,
    /// Bottom-left corner, inset by [`MARGIN`]
    BottomLeft,
    /// Bottom-right corner, inset by [`MARGIN`]
    BottomRight,
}

impl Position {
    /// Every supported position
    pub const ALL: [Position; 5] = [
        Position::Center,
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    /// Parse a position name. Unrecognized names fall back to [`Position::Center`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Self::Center,
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            other => {
                tracing::debug!(position = other, "Unknown watermark position, using center");
                Self::Center
            }
        }
    }

    /// Canonical name, as accepted by [`Position::parse`]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Top-left offset of an overlay of `overlay` size placed on a `source` raster.
    ///
    /// Offsets may be negative or run past the source; the compositor clips.
    pub fn offset(&self, source: (u32, u32), overlay: (u32, u32)) -> (i64, i64) {
        let (sw, sh) = (i64::from(source.0), i64::from(source.1));
        let (ow, oh) = (i64::from(overlay.0), i64::from(overlay.1));

        match self {
            Self::Center => ((sw - ow).div_euclid(2), (sh - oh).div_euclid(2)),
            Self::TopLeft => (MARGIN, MARGIN),
            Self::TopRight => (sw - ow - MARGIN, MARGIN),
            Self::BottomLeft => (MARGIN, sh - oh - MARGIN),
            Self::BottomRight => (sw - ow - MARGIN, sh - oh - MARGIN),
        }
    }
}

impl FromStr for Position {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(value))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for position in Position::ALL {
            assert_eq!(Position::parse(position.as_str()), position);
        }
    }

    #[test]
    fn test_unknown_falls_back_to_center() {
        assert_eq!(Position::parse("middle-ish"), Position::Center);
        assert_eq!(Position::parse(""), Position::Center);
        assert_eq!("diagonal".parse::<Position>().unwrap(), Position::Center);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Position::parse("Bottom-Right"), Position::BottomRight);
    }

    #[test]
    fn test_bottom_right_offset() {
        let offset = Position::BottomRight.offset((290, 290), (72, 36));
        assert_eq!(offset, (208, 244));
    }

    #[test]
    fn test_corner_offsets() {
        let source = (290, 290);
        let overlay = (72, 36);
        assert_eq!(Position::TopLeft.offset(source, overlay), (10, 10));
        assert_eq!(Position::TopRight.offset(source, overlay), (208, 10));
        assert_eq!(Position::BottomLeft.offset(source, overlay), (10, 244));
        assert_eq!(Position::Center.offset(source, overlay), (109, 127));
    }

    #[test]
    fn test_center_floors_negative_offsets() {
        // Overlay taller than the source
        assert_eq!(Position::Center.offset((100, 100), (50, 151)), (25, -26));
    }

    #[test]
    fn test_serde_kebab_case() {
        let json = serde_json::to_string(&Position::BottomLeft).unwrap();
        assert_eq!(json, "\"bottom-left\"");
        let parsed: Position = serde_json::from_str("\"top-right\"").unwrap();
        assert_eq!(parsed, Position::TopRight);
    }
}
