// SPDX-License-Identifier: GPL-3.0-only

use barcode_scanner::app::AppModel;
use barcode_scanner::i18n;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "barcode-scanner")]
#[command(about = "Barcode scanner for the COSMIC desktop")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode codes in image files
    Decode {
        /// Image files to decode
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Scan codes from a camera in the terminal
    Scan {
        /// Camera device path or PipeWire target (default: first camera)
        #[arg(short, long)]
        camera: Option<String>,

        /// Scanner config file (default: ~/.config/barcode-scanner/scanner.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep scanning after the first code
        #[arg(long)]
        continuous: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=barcode_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Decode { images }) => cli::decode_images(images),
        Some(Commands::Scan {
            camera,
            config,
            continuous,
        }) => cli::scan(camera, config, continuous),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(360.0)
            .min_height(480.0),
    );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
