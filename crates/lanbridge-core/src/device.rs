//! Host audio device contracts.
//!
//! These traits describe the pull-style device interface a host audio engine
//! expects: a device type that enumerates and creates devices, devices that
//! open/start/stop/close, and a callback the device drives with audio.
//!
//! # Lifecycle
//!
//! ```text
//! Created --open--> Opened --start--> Started --stop--> Stopped
//!    ^                 |                                  |
//!    |                 +-------------close----------------+--> Closed
//!    +---------------------------open------------------------------+
//! ```

use crate::buffer::DeviceBuffer;
use crate::channel_mask::ChannelMask;
use crate::error::BridgeResult;

/// Callback driven by a device with audio.
///
/// The device owns the callback between `start` and `stop`. All three
/// methods are invoked without any device-internal lock held, except
/// `io_callback` which runs on the transport's audio thread.
pub trait AudioIoCallback: Send {
    /// Called once before the callback is published.
    fn about_to_start(&mut self, device: &dyn AudioIoDevice);

    /// Process one block of audio.
    ///
    /// The frame count is whatever accumulated since the previous call and
    /// varies between calls. Must be real-time safe.
    fn io_callback(&mut self, buffer: &mut DeviceBuffer<'_>);

    /// Called once after the callback has been unpublished.
    fn stopped(&mut self);
}

/// An audio device as seen by the host.
///
/// Query methods are valid in every state and never block.
pub trait AudioIoDevice: Send {
    /// Device name.
    fn name(&self) -> &str;

    /// Name of the device type that created this device.
    fn type_name(&self) -> &str;

    /// Open the device with the requested channels and format.
    fn open(
        &mut self,
        input_channels: ChannelMask,
        output_channels: ChannelMask,
        sample_rate: f64,
        buffer_size_samples: usize,
    ) -> BridgeResult<()>;

    /// Close the device, stopping it first if needed.
    fn close(&mut self);

    /// Start driving `callback`.
    ///
    /// On failure the callback is handed back unchanged.
    fn start(&mut self, callback: Box<dyn AudioIoCallback>) -> Result<(), Box<dyn AudioIoCallback>>;

    /// Stop driving the current callback and hand it back.
    fn stop(&mut self) -> Option<Box<dyn AudioIoCallback>>;

    fn is_open(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// Human-readable description of the last error.
    fn last_error(&self) -> String;

    fn output_channel_names(&self) -> Vec<String>;

    fn input_channel_names(&self) -> Vec<String>;

    fn available_sample_rates(&self) -> Vec<f64>;

    fn available_buffer_sizes(&self) -> Vec<usize>;

    fn default_buffer_size(&self) -> usize;

    fn current_buffer_size_samples(&self) -> usize;

    fn current_sample_rate(&self) -> f64;

    /// Bit depth of the device's native format, 0 if unreported.
    fn current_bit_depth(&self) -> u32;

    fn active_output_channels(&self) -> ChannelMask;

    fn active_input_channels(&self) -> ChannelMask;

    fn output_latency_in_samples(&self) -> usize;

    fn input_latency_in_samples(&self) -> usize;

    /// Number of over/underruns since opening.
    fn xrun_count(&self) -> usize;

    /// Enable OS-level input processing. Returns true if applied.
    fn set_audio_preprocessing_enabled(&mut self, enabled: bool) -> bool;
}

/// A family of devices the host can enumerate.
pub trait AudioIoDeviceType {
    /// Name shown in the host's driver list.
    fn type_name(&self) -> &str;

    /// Refresh the device list. Must be called before any other query.
    fn scan_for_devices(&mut self);

    /// Names of available devices.
    fn device_names(&self, want_inputs: bool) -> Vec<String>;

    /// Index of the default device.
    fn default_device_index(&self, for_input: bool) -> usize;

    /// Index of `device` in [`Self::device_names`], if it belongs to this type.
    fn index_of_device(&self, device: &dyn AudioIoDevice, as_input: bool) -> Option<usize>;

    /// Whether inputs and outputs are listed as separate devices.
    fn has_separate_inputs_and_outputs(&self) -> bool;

    /// Create a device by name.
    fn create_device(
        &self,
        output_device_name: &str,
        input_device_name: &str,
    ) -> Option<Box<dyn AudioIoDevice>>;
}
