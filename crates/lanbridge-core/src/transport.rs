//! Contracts with the external network-audio transport.
//!
//! The transport is a black box: it owns its sockets, clocks, activation
//! handshake and receive ring buffers. The bridge only needs four things from
//! it:
//!
//! - whether the local device is activated
//! - a snapshot of the negotiated [`AudioProperties`]
//! - the instance configuration (channel labels)
//! - a slot to register a [`TransferHandler`] that gets called whenever new
//!   receive periods are available
//!
//! ```text
//! transport audio thread
//!        ↓  TransferHandler::transfer(properties, rx, params, channels, latency)
//! TransferBridge (lanbridge-device)
//!        ↓  AudioIoCallback::io_callback(buffer)
//! host audio engine
//! ```

use std::sync::Arc;

use crate::error::TransportResult;
use crate::instance_config::InstanceConfig;

/// Snapshot of the transport's negotiated audio format.
///
/// Taken once at activation time. The receive buffers themselves are not part
/// of the snapshot; they are lent to the handler for the duration of each
/// transfer call through [`RxChannels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProperties {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Samples in one transport period.
    pub samples_per_period: u32,
    /// Periods in the transport's circular receive buffer.
    pub periods_per_buffer: u32,
    /// Number of activated receive channels.
    pub rx_activated_channel_count: u32,
    /// Number of activated transmit channels.
    pub tx_activated_channel_count: u32,
}

impl AudioProperties {
    /// Length of the transport's circular receive buffer in samples.
    #[inline]
    pub fn samples_per_buffer(&self) -> u32 {
        self.samples_per_period * self.periods_per_buffer
    }
}

/// Describes which periods of the receive ring became available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioTransferParameters {
    /// Offset of the first new period within the ring, in periods.
    pub available_data_offset_in_periods: u32,
    /// Number of contiguous periods available from that offset.
    pub num_periods_available: u32,
}

/// Borrowed view of the transport's per-channel receive rings.
///
/// Each channel is a byte slice holding 4-byte sample containers (see
/// [`crate::sample`]). The transport owns the memory; the bridge only reads
/// it while the transfer call is in progress.
#[derive(Debug, Clone, Copy)]
pub struct RxChannels<'a> {
    channels: &'a [&'a [u8]],
}

impl<'a> RxChannels<'a> {
    /// Wrap the transport's channel slices.
    #[inline]
    pub fn new(channels: &'a [&'a [u8]]) -> Self {
        Self { channels }
    }

    /// Raw bytes of one channel, if present.
    #[inline]
    pub fn channel(&self, index: usize) -> Option<&'a [u8]> {
        self.channels.get(index).copied()
    }

    /// Number of channels the transport exposes.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if the transport exposes no channels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Running state of a transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState {
    /// Created or stopped. Transfer handlers may only be changed here.
    #[default]
    Stopped,
    /// Start requested, not yet running.
    Starting,
    /// Delivering audio.
    Running,
    /// Stop requested, not yet stopped.
    Stopping,
}

/// Receives newly available periods from the transport.
///
/// Called on the transport's audio thread at period granularity.
/// Implementations must not allocate, must not block beyond short lock
/// sections, and must not panic across this boundary.
pub trait TransferHandler: Send + Sync {
    /// Consume the periods described by `params`.
    ///
    /// # Arguments
    ///
    /// * `properties` - Format snapshot captured when the handler was registered
    /// * `rx` - The transport's receive rings
    /// * `params` - Which periods are new
    /// * `num_channels` - Channels to consume (min of rx/tx activated counts)
    /// * `latency_samples` - Configured receive latency
    fn transfer(
        &self,
        properties: &AudioProperties,
        rx: RxChannels<'_>,
        params: &AudioTransferParameters,
        num_channels: usize,
        latency_samples: u32,
    );
}

/// Shared handle to a registered transfer handler.
pub type SharedTransferHandler = Arc<dyn TransferHandler>;

/// Handler as installed on the engine, with channel count and latency bound.
///
/// The session decides these values at registration time; the engine passes
/// them through unchanged on every call.
#[derive(Clone)]
pub struct TransferRegistration {
    pub handler: SharedTransferHandler,
    pub properties: AudioProperties,
    pub num_channels: usize,
    pub latency_samples: u32,
}

impl TransferRegistration {
    /// Forward one delivery to the bound handler.
    #[inline]
    pub fn deliver(&self, rx: RxChannels<'_>, params: &AudioTransferParameters) {
        self.handler.transfer(
            &self.properties,
            rx,
            params,
            self.num_channels,
            self.latency_samples,
        );
    }
}

/// The network-audio engine the bridge sits on top of.
///
/// Every method must be non-blocking apart from `start`/`stop`, which the
/// bridge only calls from control threads.
pub trait NetworkAudioEngine: Send + Sync {
    /// Returns true once the local device is activated and channel counts
    /// are final.
    fn is_device_activated(&self) -> bool;

    /// Snapshot of the negotiated format, or `None` if audio is unavailable.
    fn audio_properties(&self) -> Option<AudioProperties>;

    /// Instance configuration including channel labels.
    fn config(&self) -> InstanceConfig;

    /// Current instance state.
    fn instance_state(&self) -> InstanceState;

    /// Start delivering audio.
    fn start(&self) -> TransportResult<()>;

    /// Stop delivering audio. Once this returns no transfer call is in flight.
    fn stop(&self) -> TransportResult<()>;

    /// Install or clear the transfer handler.
    fn set_transfer_handler(&self, registration: Option<TransferRegistration>);
}
