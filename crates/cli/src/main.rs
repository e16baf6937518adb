//! `phorest` — the operator CLI: directory bootstrap, one-shot ROI
//! generation, and a plain-table status printer. No daemon lives here;
//! every pipeline service is its own binary started independently
//! (`phorest-collector`, `phorest-processor`, ...).

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "configs/Phorest_config.toml";

#[derive(Parser)]
#[command(name = "phorest", about = "Phorest biosensor pipeline operator CLI", version)]
struct Cli {
    /// Path to Phorest_config.toml.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the configured directory layout and seed an empty manifest
    /// and service-status file.
    Init,
    /// Print the service-status file as a plain table.
    Status,
    /// Run the ROI Generator's two-pass registration against a reference
    /// image and a set of user-clicked landmarks.
    Roi {
        #[command(subcommand)]
        command: RoiCommand,
    },
}

#[derive(Subcommand)]
enum RoiCommand {
    /// Generate a ROI table JSON from a reference image and landmarks.
    Generate {
        /// Reference image to register against.
        #[arg(long)]
        image: PathBuf,
        /// Chip-map database JSON (label + grating coordinates per chip type).
        #[arg(long = "chip-db")]
        chip_db: PathBuf,
        /// User-clicked landmark locations JSON.
        #[arg(long = "user-mapping")]
        user_mapping: PathBuf,
        /// Directory of per-(chip_type, label) template images.
        #[arg(long = "template-dir")]
        template_dir: PathBuf,
        /// Where to write the resulting ROI table JSON.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Init => commands::init::run(&cli.config),
        Command::Status => commands::status::run(&cli.config),
        Command::Roi { command: RoiCommand::Generate { image, chip_db, user_mapping, template_dir, out } } => {
            commands::roi::run(image, chip_db, user_mapping, template_dir, out)
        }
    };

    if let Err(e) = result {
        eprintln!("phorest: {e}");
        std::process::exit(1);
    }
}
