//! qrmark entrypoint

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use qrmark::{
    GenerationRequest, Generator, Position, QrmarkConfig, WatermarkParams, logging, server,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrmark",
    version,
    about = "QR code generator with watermark compositing"
)]
struct Cli {
    /// Optional configuration file (toml/yaml). Defaults to qrmark.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve(ServeArgs),
    /// Generate a single QR code and write it to disk
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override bind address (e.g. 127.0.0.1)
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Override bind port
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,

    /// Enable the /metrics route regardless of configuration file settings
    #[arg(long)]
    metrics: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Data to encode in the QR code (URL or text)
    data: String,

    /// Path to watermark image
    #[arg(short, long, value_name = "PATH")]
    watermark: Option<PathBuf>,

    /// Watermark position (center, top-left, top-right, bottom-left, bottom-right)
    #[arg(short, long)]
    position: Option<String>,

    /// Watermark opacity cap (0-255)
    #[arg(short, long, allow_negative_numbers = true)]
    transparency: Option<i64>,

    /// Watermark width as a fraction of the QR code width, in (0, 1]
    #[arg(short, long, allow_negative_numbers = true)]
    scale: Option<f64>,

    /// Output file path
    #[arg(short, long, default_value = "./watermarked_qr.png")]
    output: PathBuf,

    /// Pixels per QR module
    #[arg(long, value_name = "PX")]
    module_size: Option<u32>,

    /// Re-scan the result and report whether it still decodes
    #[arg(long)]
    verify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = QrmarkConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.server.bind_address = bind;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            if args.metrics {
                config.logging.metrics = true;
            }

            logging::init(&config.logging)?;
            server::serve(&config).await?;
        }
        Command::Generate(args) => {
            if let Some(size) = args.module_size {
                config.qr.module_size = size;
            }
            if args.verify {
                config.qr.verify_output = true;
            }

            logging::init(&config.logging)?;
            generate(&config, args)?;
        }
    }

    Ok(())
}

fn generate(config: &QrmarkConfig, args: GenerateArgs) -> anyhow::Result<()> {
    // Broken configured defaults fail here even when no watermark is given.
    let defaults = config.watermark_defaults()?;

    let request = match &args.watermark {
        Some(path) => {
            let image = std::fs::read(path)
                .with_context(|| format!("Failed to read watermark {}", path.display()))?;

            let params = WatermarkParams::new(
                args.position
                    .as_deref()
                    .map(Position::parse)
                    .unwrap_or(defaults.position),
                args.transparency.unwrap_or(i64::from(defaults.opacity)),
                args.scale.unwrap_or(defaults.scale),
            )?;
            GenerationRequest::watermarked(args.data, image.into(), params)
        }
        None => GenerationRequest::plain(args.data),
    };

    let generator = Generator::new(config.encoder()).with_verification(config.qr.verify_output);
    let generated = generator.generate(&request)?;

    std::fs::write(&args.output, &generated.png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        width = generated.width,
        height = generated.height,
        watermarked = generated.watermarked,
        "QR code written"
    );

    match generated.scannable {
        Some(true) => println!("QR code saved to {} (verified scannable)", args.output.display()),
        Some(false) => println!(
            "QR code saved to {} (warning: watermark prevents scanning)",
            args.output.display()
        ),
        None => println!("QR code saved to {}", args.output.display()),
    }

    Ok(())
}
