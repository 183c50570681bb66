//! Transport instance configuration.
//!
//! This is the configuration object owned by the network-audio engine. The
//! bridge never writes it after handing it to the engine; channel name
//! queries from the host are answered by reading it back.
//!
//! # Example
//!
//! ```
//! use lanbridge_core::InstanceConfig;
//!
//! let config = InstanceConfig::new("LanBridge")
//!     .with_model("LanBridge Demo", *b"LNBRDEMO")
//!     .with_rx_channel_names(["Left", "Right"])
//!     .with_tx_channel_names(["Left", "Right"]);
//!
//! assert_eq!(config.rx_channel_name(1), Some("Right"));
//! ```

/// Clock the transport instance follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSource {
    /// Network precision time protocol.
    #[default]
    Ptp,
    /// Recover the clock from received audio.
    RxAudio,
}

/// Default sample rate of a transport instance.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default period length in samples.
pub const DEFAULT_SAMPLES_PER_PERIOD: u32 = 128;

/// Default number of periods in the receive ring.
pub const DEFAULT_PERIODS_PER_BUFFER: u32 = 64;

/// Default sample encoding in bits.
pub const DEFAULT_ENCODING: u32 = 24;

/// Default channel count in each direction.
pub const DEFAULT_CHANNELS: usize = 2;

/// Configuration of a network-audio transport instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceConfig {
    /// Name the device advertises on the network.
    pub default_name: String,
    /// Network interface to bind.
    pub interface_name: String,
    /// Manufacturer name advertised on the network.
    pub manufacturer_name: String,
    /// Manufacturer version (major, minor, bugfix).
    pub manufacturer_version: (u8, u8, u16),
    /// Model name advertised on the network.
    pub model_name: String,
    /// Eight-byte model identifier.
    pub model_id: [u8; 8],
    /// Clock source.
    pub time_source: TimeSource,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per transport period.
    pub samples_per_period: u32,
    /// Periods per receive ring.
    pub periods_per_buffer: u32,
    /// Sample encoding in bits.
    pub encoding: u32,
    rx_channel_names: Vec<String>,
    tx_channel_names: Vec<String>,
}

impl InstanceConfig {
    /// Create a configuration with transport defaults.
    ///
    /// Two receive and two transmit channels are configured, labelled with
    /// their 1-based index until renamed.
    pub fn new(default_name: impl Into<String>) -> Self {
        let default_name = default_name.into();
        Self {
            model_name: default_name.clone(),
            default_name,
            interface_name: String::new(),
            manufacturer_name: String::new(),
            manufacturer_version: (1, 0, 0),
            model_id: [0; 8],
            time_source: TimeSource::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            samples_per_period: DEFAULT_SAMPLES_PER_PERIOD,
            periods_per_buffer: DEFAULT_PERIODS_PER_BUFFER,
            encoding: DEFAULT_ENCODING,
            rx_channel_names: numbered_names(DEFAULT_CHANNELS),
            tx_channel_names: numbered_names(DEFAULT_CHANNELS),
        }
    }

    /// Set the network interface.
    pub fn with_interface(mut self, interface_name: impl Into<String>) -> Self {
        self.interface_name = interface_name.into();
        self
    }

    /// Set manufacturer name and version.
    pub fn with_manufacturer(mut self, name: impl Into<String>, version: (u8, u8, u16)) -> Self {
        self.manufacturer_name = name.into();
        self.manufacturer_version = version;
        self
    }

    /// Set model name and identifier.
    pub fn with_model(mut self, name: impl Into<String>, id: [u8; 8]) -> Self {
        self.model_name = name.into();
        self.model_id = id;
        self
    }

    /// Set the clock source.
    pub fn with_time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = time_source;
        self
    }

    /// Set the period geometry.
    pub fn with_periods(mut self, samples_per_period: u32, periods_per_buffer: u32) -> Self {
        self.samples_per_period = samples_per_period;
        self.periods_per_buffer = periods_per_buffer;
        self
    }

    /// Replace the receive channel labels. The count follows the labels.
    pub fn with_rx_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rx_channel_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the transmit channel labels. The count follows the labels.
    pub fn with_tx_channel_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tx_channel_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Number of configured receive channels.
    pub fn num_rx_channels(&self) -> usize {
        self.rx_channel_names.len()
    }

    /// Number of configured transmit channels.
    pub fn num_tx_channels(&self) -> usize {
        self.tx_channel_names.len()
    }

    /// Label of a receive channel.
    pub fn rx_channel_name(&self, index: usize) -> Option<&str> {
        self.rx_channel_names.get(index).map(String::as_str)
    }

    /// Label of a transmit channel.
    pub fn tx_channel_name(&self, index: usize) -> Option<&str> {
        self.tx_channel_names.get(index).map(String::as_str)
    }

    /// All receive channel labels.
    pub fn rx_channel_names(&self) -> &[String] {
        &self.rx_channel_names
    }

    /// All transmit channel labels.
    pub fn tx_channel_names(&self) -> &[String] {
        &self.tx_channel_names
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self::new("lanbridge")
    }
}

fn numbered_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| i.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InstanceConfig::default();
        assert_eq!(config.sample_rate, 48_000);
        assert_eq!(config.samples_per_period, 128);
        assert_eq!(config.periods_per_buffer, 64);
        assert_eq!(config.encoding, 24);
        assert_eq!(config.num_rx_channels(), 2);
        assert_eq!(config.tx_channel_name(0), Some("1"));
    }

    #[test]
    fn test_channel_names_set_count() {
        let config = InstanceConfig::new("x").with_rx_channel_names(["A", "B", "C"]);
        assert_eq!(config.num_rx_channels(), 3);
        assert_eq!(config.rx_channel_name(2), Some("C"));
        assert_eq!(config.rx_channel_name(3), None);
        assert_eq!(config.num_tx_channels(), 2);
    }
}
