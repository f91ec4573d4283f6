// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "flaneur")]
#[command(about = "Drive the Flaneur capture core against a simulated camera")]
#[command(version = flaneur::constants::app_info::version())]
struct Cli {
    /// Settings file (default: ~/.config/flaneur/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a video
    Record {
        /// Stop after this many seconds (the 15 second cap always applies)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Export directory (default: ~/Videos/flaneur)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Light the torch while recording
        #[arg(short, long)]
        torch: bool,

        /// Exposure bias in EV, limited to the slider range
        #[arg(short, long, allow_hyphen_values = true)]
        bias: Option<f32>,
    },

    /// Inspect or reset the persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Overwrite the settings file with defaults
    Reset,
    /// Print the settings file location
    Path,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=flaneur=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let settings_path = match cli.settings {
        Some(path) => path,
        None => flaneur::Settings::default_path()?,
    };

    match cli.command {
        Commands::Record {
            duration,
            output,
            torch,
            bias,
        } => cli::record(
            &settings_path,
            cli::RecordOptions {
                duration,
                output,
                torch,
                bias,
            },
        ),
        Commands::Settings { action } => match action {
            SettingsAction::Show => cli::show_settings(&settings_path),
            SettingsAction::Reset => cli::reset_settings(&settings_path),
            SettingsAction::Path => {
                println!("{}", settings_path.display());
                Ok(())
            }
        },
    }
}
