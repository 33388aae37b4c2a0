//! Command-line interface definitions and helpers.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::camera;

/// Parse and validate JPEG quality (1-100)
pub fn parse_quality(s: &str) -> Result<u8, String> {
    let quality: u8 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid quality value", s))?;
    if !(1..=100).contains(&quality) {
        return Err(format!("Quality must be between 1 and 100, got {}", quality));
    }
    Ok(quality)
}

/// Camera capture client for the plate recognition server
#[derive(Parser, Debug)]
#[command(name = "plate-snap")]
#[command(version, about = "Capture webcam stills and submit them for plate recognition")]
#[command(after_help = "EXAMPLES:
    # Interactive session: Enter captures, q quits
    plate-snap watch

    # Single capture against a specific server
    plate-snap capture --server http://gate.local:5000

    # See available camera devices
    plate-snap list-cameras

ENVIRONMENT:
    PLATE_SERVER_URL    Overrides the configured server base URL.")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to config file (default: ~/.config/plate-snap/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Camera device index (from list-cameras)
    #[arg(long, global = true)]
    pub camera: Option<u32>,

    /// Recognition server base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// JPEG quality for uploads (1-100)
    #[arg(long, global = true, value_parser = parse_quality)]
    pub quality: Option<u8>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available camera devices
    ListCameras,
    /// Capture one frame, upload it, and print the verdict
    Capture,
    /// Interactive capture session (default)
    Watch,
}

/// Handle the `list-cameras` subcommand. Returns the process exit code.
pub fn run_list_cameras() -> i32 {
    match camera::list_devices() {
        Ok(devices) => {
            if devices.is_empty() {
                println!("No cameras found.");
            } else {
                for device in devices {
                    println!("{}", device);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}
