use std::time::Duration;

use clap::Parser;

use plate_snap::cli::{self, Args, Command};
use plate_snap::config::Config;
use plate_snap::session::{self, SessionOptions};

fn session_options(args: &Args, config: &Config) -> SessionOptions {
    SessionOptions {
        device: args.camera.unwrap_or(config.camera.device),
        server_url: args
            .server
            .clone()
            .unwrap_or_else(|| config.server_url()),
        quality: args.quality.unwrap_or(config.capture.quality),
        warmup: Duration::from_secs(config.camera.warmup_secs),
    }
}

fn main() {
    // Load .env before reading any configuration.
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
    env_logger::init();

    let args = Args::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command {
        Some(Command::ListCameras) => {
            std::process::exit(cli::run_list_cameras());
        }
        Some(Command::Capture) => {
            let opts = session_options(&args, &config);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: failed to start runtime: {}", e);
                    std::process::exit(1);
                }
            };
            match rt.block_on(session::run_once(&opts)) {
                Ok(code) => std::process::exit(code),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Command::Watch) | None => {
            let opts = session_options(&args, &config);
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Error: failed to start runtime: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(session::run_watch(&opts)) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_options_prefer_cli_overrides() {
        let args = Args::parse_from([
            "plate-snap",
            "capture",
            "--camera",
            "3",
            "--server",
            "http://gate.local:5000",
            "--quality",
            "95",
        ]);
        let config = Config::default();
        let opts = session_options(&args, &config);
        assert_eq!(opts.device, 3);
        assert_eq!(opts.server_url, "http://gate.local:5000");
        assert_eq!(opts.quality, 95);
    }

    #[test]
    fn test_session_options_fall_back_to_config() {
        let args = Args::parse_from(["plate-snap", "capture"]);
        let config: Config = toml::from_str(
            r#"
            [camera]
            device = 1
            warmup_secs = 7

            [capture]
            quality = 60
        "#,
        )
        .unwrap();
        let opts = session_options(&args, &config);
        assert_eq!(opts.device, 1);
        assert_eq!(opts.quality, 60);
        assert_eq!(opts.warmup, Duration::from_secs(7));
    }
}
