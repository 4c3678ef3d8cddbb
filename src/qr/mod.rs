//! QR code encoding and decoding
//!
//! Encoding turns request text into a black-on-white raster at error
//! correction level L. Decoding is used to confirm that a composited
//! output is still scannable.

mod decoder;
mod encoder;

pub use decoder::QrDecoder;
pub use encoder::{DEFAULT_MODULE_SIZE, QrEncoder};
