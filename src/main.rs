//! SetuIO - serial protocol bridge daemon for the ArloBot Propeller base
//!
//! Reads the firmware's tab-delimited line protocol from the serial port and
//! publishes odometry, transforms, range scans and status as JSON lines on
//! stdout. Velocity and safety commands are read as JSON lines from stdin.

use setu_io::{AppConfig, Result, SetuApp};
use std::env;

const DEFAULT_CONFIG_PATH: &str = "/etc/setuio.toml";

/// Config file location from the command line
///
/// Accepts `--config <path>`, `-c <path>`, or a bare path as the first
/// argument. Without one the daemon reads `/etc/setuio.toml`.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().skip(1).collect();
    config_path_from(&args)
}

fn config_path_from(args: &[String]) -> String {
    let flagged = args
        .windows(2)
        .find(|pair| pair[0] == "--config" || pair[0] == "-c")
        .map(|pair| pair[1].clone());
    let positional = args.first().filter(|arg| !arg.starts_with('-')).cloned();

    flagged
        .or(positional)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let config = AppConfig::load(&config_path)?;

    // Logs go to stderr; stdout carries the bus
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .target(env_logger::Target::Stderr)
    .init();

    log::info!("SetuIO v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);
    log::info!(
        "Serial: {} @ {} baud",
        config.serial.port,
        config.serial.baud_rate
    );

    let mut app = SetuApp::new(config)?;
    app.run()
}
