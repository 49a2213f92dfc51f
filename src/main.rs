//! # Sensor Station
//!
//! Base station of a star-topology sensor network.
//!
//! This application runs the base station link stack against an in-process
//! simulation of the field nodes, collecting their readings and answering
//! each one with the current time.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use sensor_station::clock::{MonotonicClock, TickClock};
use sensor_station::config::Config;
use sensor_station::error_log::MemoryErrorLog;
use sensor_station::packet::protocol::node_address;
use sensor_station::radio::sim::SimulatedRadio;
use sensor_station::rtc::SystemRtc;
use sensor_station::station::BaseStation;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Resolution of the uptime counter
const CLOCK_TICK_MS: u32 = 1;

/// Main entry point for the sensor station
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or `config/default.toml`)
///    - Start the millisecond uptime counter
///    - Build the base station on the simulated radio
///
/// 2. **Main Loop**
///    - Run one station step every `scheduler.tick_ms`
///    - Log node status every `scheduler.status_interval_s`
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Print link statistics and the error log
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or the telemetry
/// directory cannot be created
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    // Assertion failures halt the station
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Assertion failed: {}", panic_info);
    }));

    info!("Sensor Station v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = config_path_from_args(std::env::args());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    info!("Configuration loaded from {}", config_path.display());

    // Uptime counter driven by a periodic task
    let clock = TickClock::new();
    let driver = clock.clone();
    let clock_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(CLOCK_TICK_MS as u64));
        loop {
            ticker.tick().await;
            driver.advance(CLOCK_TICK_MS);
        }
    });

    let addresses: Vec<_> = (0..config.nodes.count)
        .map(|index| node_address(config.nodes.address_base, index))
        .collect();
    let radio = SimulatedRadio::new(clock.clone(), &addresses, config.report_interval_ms());

    let mut station = BaseStation::new(
        &config,
        radio,
        Box::new(clock.clone()),
        Box::new(SystemRtc),
        Box::new(MemoryErrorLog::new()),
    )?;
    station.dump_error_log();

    let mut tick_interval = interval(Duration::from_millis(config.scheduler.tick_ms));
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status_interval = interval(Duration::from_secs(config.scheduler.status_interval_s));

    info!("Starting scheduler loop every {} ms", config.scheduler.tick_ms);
    info!("Press Ctrl+C to exit");

    // Main scheduler loop
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                station.tick();
            }

            _ = status_interval.tick() => {
                station.log_status();
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    clock_task.abort();
    info!("Uptime: {} ms", clock.milliseconds());
    station.dump_error_log();

    Ok(())
}

/// Configuration path from the command line arguments
fn config_path_from_args<I: IntoIterator<Item = String>>(args: I) -> PathBuf {
    args.into_iter()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let args = vec!["sensor-station".to_string()];
        assert_eq!(config_path_from_args(args), PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_config_path_argument() {
        let args = vec!["sensor-station".to_string(), "/etc/station.toml".to_string()];
        assert_eq!(config_path_from_args(args), PathBuf::from("/etc/station.toml"));
    }

    #[test]
    fn test_default_config_file_is_valid() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        assert!(Config::load(path).is_ok());
    }
}
