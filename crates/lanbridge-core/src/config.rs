//! Bridge configuration.
//!
//! Bridge-owned settings that are fixed at build time: names shown to the
//! host, the timing of the activation watcher, and the buffer geometry the
//! device advertises. Transport-side settings live in
//! [`InstanceConfig`](crate::InstanceConfig).
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lanbridge_core::BridgeConfig;
//!
//! pub static CONFIG: BridgeConfig = BridgeConfig::new("LanBridge")
//!     .with_type_name("Network")
//!     .with_activation_poll_interval(Duration::from_millis(500));
//! ```

use std::time::Duration;

use crate::types::{BUFFER_SAFETY_MARGIN, SUPPORTED_BUFFER_SIZE, SUPPORTED_SAMPLE_RATE};

/// Suffix appended to the application name to form the device name.
pub const DEVICE_NAME_SUFFIX: &str = " - Stereo";

/// Configuration of the device bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Application name; the device is listed as `"<app_name> - Stereo"`.
    pub app_name: &'static str,

    /// Name of the device type shown in the host's driver list.
    pub type_name: &'static str,

    /// How often the watcher checks for transport activation.
    pub activation_poll_interval: Duration,

    /// How long `close()` waits for the watcher thread.
    pub shutdown_timeout: Duration,

    /// Extra samples per pool channel beyond the nominal size.
    pub safety_margin: usize,

    /// Sample rate advertised to the host.
    pub sample_rate: f64,

    /// Buffer size advertised to the host.
    pub buffer_size: usize,
}

impl BridgeConfig {
    /// Create a configuration with default timing and geometry.
    pub const fn new(app_name: &'static str) -> Self {
        Self {
            app_name,
            type_name: "Network",
            activation_poll_interval: Duration::from_secs(1),
            shutdown_timeout: Duration::from_secs(5),
            safety_margin: BUFFER_SAFETY_MARGIN,
            sample_rate: SUPPORTED_SAMPLE_RATE,
            buffer_size: SUPPORTED_BUFFER_SIZE,
        }
    }

    /// Set the device type name.
    pub const fn with_type_name(mut self, type_name: &'static str) -> Self {
        self.type_name = type_name;
        self
    }

    /// Set the activation poll interval.
    pub const fn with_activation_poll_interval(mut self, interval: Duration) -> Self {
        self.activation_poll_interval = interval;
        self
    }

    /// Set the watcher shutdown timeout.
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the pool safety margin.
    pub const fn with_safety_margin(mut self, samples: usize) -> Self {
        self.safety_margin = samples;
        self
    }

    /// Name of the single device this bridge exposes.
    pub fn device_name(&self) -> String {
        format!("{}{}", self.app_name, DEVICE_NAME_SUFFIX)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new("LanBridge")
    }
}
