//! Device lifecycle state machine.
//!
//! ```text
//! Created --open--> Opened --start--> Started --stop--> Stopped
//!                     |  ^                                 |
//!                     |  +--------------start--------------+
//!                     +-----------close----------------------+--> Closed
//! Closed  --open--> Opened (fresh watcher, fresh pool)
//! ```
//!
//! Opening an open device closes it first. A dead activation watcher
//! demotes the device to `Closed` when `start` notices it.

use lanbridge_core::ChannelMask;

/// Lifecycle state of a device adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    /// Constructed, never opened.
    #[default]
    Created,
    /// Open, watcher running or done, no callback.
    Opened,
    /// Callback published.
    Started,
    /// Callback taken back, still open.
    Stopped,
    /// Watcher gone, pool freed.
    Closed,
}

impl DeviceState {
    /// Opened, started or stopped.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Opened | Self::Started | Self::Stopped)
    }

    /// Returns true if `start` is allowed.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Opened | Self::Stopped)
    }

    pub fn is_started(self) -> bool {
        self == Self::Started
    }
}

/// Parameters the host passed to `open`.
///
/// Masks are replaced by the activated channel layout once the watcher
/// completes; rate and size are reported back unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenRequest {
    pub input_channels: ChannelMask,
    pub output_channels: ChannelMask,
    pub sample_rate: f64,
    pub buffer_size: usize,
}

impl OpenRequest {
    pub fn new(
        input_channels: ChannelMask,
        output_channels: ChannelMask,
        sample_rate: f64,
        buffer_size: usize,
    ) -> Self {
        Self {
            input_channels,
            output_channels,
            sample_rate,
            buffer_size,
        }
    }
}

/// Channel layout discovered at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChannels {
    pub inputs: ChannelMask,
    pub outputs: ChannelMask,
}
