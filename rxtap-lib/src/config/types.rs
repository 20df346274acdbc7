use serde::Deserialize;

use crate::filter::{InterfaceFilter, DEFAULT_TARGET};

/// Framing of the bytes a capture backend receives.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkLayer {
    /// Ethernet II, optionally VLAN tagged. Stripped before classification.
    #[default]
    Ethernet,
    /// The network header is at offset 0.
    Raw,
}

/// Capture configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    /// Name of the interface to intercept (exact match)
    /// Default: "lo"
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Framing delivered by the capture backend
    /// Default: ethernet
    #[serde(default)]
    pub link_layer: LinkLayer,
    /// Receive poll interval in milliseconds; bounds how long detaching waits
    /// for a receive thread to notice it should stop
    /// Default: 100
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Re-run interface attachment every N seconds so interfaces that appear
    /// later are picked up. 0 disables rescanning
    /// Default: 0
    #[serde(default)]
    pub rescan_interval_secs: u64,
    /// Records buffered between the receive threads and the log writer;
    /// records arriving while it is full are dropped
    /// Default: 4096
    #[serde(default = "default_report_queue")]
    pub report_queue: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            link_layer: LinkLayer::default(),
            read_timeout_ms: default_read_timeout(),
            rescan_interval_secs: 0,
            report_queue: default_report_queue(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    /// Can be overridden at runtime via RUST_LOG
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Show module path (target) in log messages
    /// Default: false
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), show_target: false }
    }
}

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn interface_filter(&self) -> InterfaceFilter {
        InterfaceFilter::new(self.capture.interface.clone())
    }
}

fn default_interface() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_read_timeout() -> u64 {
    100
}

fn default_report_queue() -> usize {
    4096
}

fn default_log_level() -> String {
    "info".to_string()
}
