//! Generate a plain and a watermarked QR code and save them to files
//!
//! Usage: cargo run --example watermark_qr

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrmark::{GenerationRequest, Generator, Position, QrEncoder, WatermarkParams};
use std::io::Cursor;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let generator = Generator::new(QrEncoder::new()).with_verification(true);

    let plain = generator.generate(&GenerationRequest::plain("Hello from qrmark!"))?;
    std::fs::write("qr_output.png", &plain.png)?;
    println!("✓ QR code generated and saved to qr_output.png");

    // A stand-in logo: a blue disc on a transparent background
    let logo = RgbaImage::from_fn(128, 128, |x, y| {
        let (dx, dy) = (x as i32 - 64, y as i32 - 64);
        if dx * dx + dy * dy <= 60 * 60 {
            Rgba([30, 90, 220, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let mut logo_png = Vec::new();
    DynamicImage::ImageRgba8(logo).write_to(&mut Cursor::new(&mut logo_png), ImageFormat::Png)?;

    for position in Position::ALL {
        let params = WatermarkParams::new(position, 160, 0.2)?;
        let request = GenerationRequest::watermarked(
            "https://example.com",
            Bytes::from(logo_png.clone()),
            params,
        );
        let output = generator.generate(&request)?;

        let path = format!("qr_watermark_{position}.png");
        std::fs::write(&path, &output.png)?;
        println!(
            "✓ {path} ({}x{}, scannable: {:?})",
            output.width, output.height, output.scannable
        );
    }

    Ok(())
}
