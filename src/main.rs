// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "codescan")]
#[command(about = "Barcode scanner with a live viewfinder overlay")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: <config dir>/codescan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode barcodes from still images
    Scan {
        /// Images to decode
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,

        /// Restrict decoding to these formats (e.g. qr_code)
        #[arg(long, value_delimiter = ',')]
        formats: Vec<String>,

        /// Decode at full resolution
        #[arg(long)]
        try_harder: bool,
    },

    /// Render the viewfinder overlay to an image
    Snapshot {
        #[arg(long, default_value = "400")]
        width: u32,

        #[arg(long, default_value = "800")]
        height: u32,

        /// Laser animation phase in [0, 1)
        #[arg(long, default_value = "0.5")]
        phase: f32,

        /// Image drawn behind the overlay
        #[arg(long)]
        background: Option<PathBuf>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run the viewfinder in the terminal, scanning the given images
    Preview {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The preview owns the terminal, so it only logs when asked to
    let preview = matches!(cli.command, Some(Commands::Preview { .. }));
    if !preview || std::env::var_os("RUST_LOG").is_some() {
        // Set RUST_LOG environment variable to control log level
        // Examples: RUST_LOG=debug, RUST_LOG=codescan=trace
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .init();
    }

    let config = match cli.config.as_deref() {
        Some(path) => codescan::Config::load_from(path)?,
        None => codescan::Config::load()?,
    };

    match cli.command {
        Some(Commands::Scan {
            images,
            json,
            formats,
            try_harder,
        }) => cli::scan_images(config, &images, json, &formats, try_harder),
        Some(Commands::Snapshot {
            width,
            height,
            phase,
            background,
            output,
        }) => cli::render_snapshot(config, width, height, phase, background.as_deref(), &output),
        Some(Commands::Preview { images }) => codescan::terminal::run(config, &images),
        None => {
            println!("Nothing to do. Try 'codescan preview <images>' or 'codescan --help'.");
            Ok(())
        }
    }
}
