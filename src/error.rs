//! Error types for qrmark operations

use thiserror::Error;

/// Result type alias using qrmark's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrmark operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input text could not be encoded (empty or over symbol capacity)
    #[error("Failed to encode QR code: {0}")]
    Encoding(String),

    /// Source or watermark raster could not be decoded
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    /// Compositing parameter outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Request did not carry any data to encode
    #[error("No data provided")]
    MissingData,

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// QR code decoding failed
    #[error("Failed to decode QR code: {0}")]
    QrDecode(String),

    /// No QR code found in image
    #[error("No QR code found in image")]
    NoQrCodeFound,

    /// Output image encoding failed
    #[error("Image processing error: {0}")]
    Image(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Stable machine-readable label for this failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Encoding(_) => "encoding",
            Error::ImageLoad(_) => "image_load",
            Error::InvalidParameter(_) => "invalid_parameter",
            Error::MissingData => "missing_data",
            Error::BadRequest(_) => "bad_request",
            Error::QrDecode(_) => "qr_decode",
            Error::NoQrCodeFound => "no_qr_code",
            Error::Image(_) => "image",
            Error::Io(_) => "io",
            Error::Config(_) => "config",
            Error::Other(_) => "other",
        }
    }
}

// Decoding failures are mapped to `ImageLoad` explicitly at the call site;
// this conversion covers output encoding.
impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::Encoding(e.to_string())
    }
}
