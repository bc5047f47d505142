//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "dual-light")]
#[command(about = "A state-managed HTTP controller for a two-channel relay light")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "8888")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Root of the sysfs GPIO tree
    #[arg(long, default_value = "/sys/class/gpio")]
    pub gpio_root: PathBuf,

    /// GPIO line driving relay A
    #[arg(long, default_value = "12")]
    pub relay_a_gpio: u32,

    /// GPIO line driving relay B
    #[arg(long, default_value = "14")]
    pub relay_b_gpio: u32,

    /// File holding persisted settings (selected channel)
    #[arg(long, default_value = "dual-light-state.json")]
    pub state_file: PathBuf,

    /// Poll loop period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Pause between switching the two relays, in milliseconds
    #[arg(long, default_value = "20")]
    pub settle_ms: u64,

    /// Drive in-memory relays instead of GPIO
    #[arg(long)]
    pub simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["dual-light"]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:8888");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.settle(), Duration::from_millis(20));
        assert_eq!((config.relay_a_gpio, config.relay_b_gpio), (12, 14));
        assert!(!config.simulate);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "dual-light", "--simulate", "-v", "--port", "9000", "--settle-ms", "5",
        ])
        .unwrap();
        assert!(config.simulate);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.port, 9000);
        assert_eq!(config.settle(), Duration::from_millis(5));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(Config::try_parse_from(["dual-light", "--poll-interval-ms", "0"]).is_err());
    }
}
