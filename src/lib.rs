//! qrmark - QR code generation with watermark compositing
//!
//! This library turns text into a QR code PNG and can blend a logo or other
//! watermark image onto it. The same pipeline backs the HTTP service and the
//! one-shot CLI.
//!
//! # Features
//!
//! - **QR Encoding**: error correction level L, automatic version selection
//! - **Watermarking**: relative scaling, opacity capping, five anchor positions
//! - **HTTP Service**: multipart `POST /generate` endpoint built on axum
//! - **Verification**: optional re-scan of watermarked output
//!
//! # Example
//!
//! ```no_run
//! use qrmark::{GenerationRequest, Generator, Position, QrEncoder, WatermarkParams};
//!
//! fn main() -> qrmark::Result<()> {
//!     let logo = std::fs::read("logo.png")?;
//!     let params = WatermarkParams::new(Position::BottomRight, 128, 0.25)?;
//!
//!     let generator = Generator::new(QrEncoder::new());
//!     let output = generator.generate(&GenerationRequest::watermarked(
//!         "https://example.com",
//!         logo.into(),
//!         params,
//!     ))?;
//!
//!     std::fs::write("qr.png", &output.png)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod qr;
pub mod server;
pub mod watermark;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{LogRotation, LoggingOptions, QrOptions, QrmarkConfig, ServerOptions, WatermarkOptions};
pub use pipeline::{GeneratedImage, GenerationRequest, Generator, WatermarkInput};
pub use qr::{QrDecoder, QrEncoder};
pub use watermark::{Position, WatermarkParams, compose};
