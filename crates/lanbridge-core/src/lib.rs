//! # lanbridge-core
//!
//! Core types and contracts for the lanbridge network audio device bridge.
//!
//! This crate holds everything that does not own a thread: the sample format
//! conversion, the host-facing device contracts, the transport-facing engine
//! contracts, configuration and errors. The bridge itself lives in
//! `lanbridge-device`.
//!
//! ## Main Traits
//!
//! - [`NetworkAudioEngine`] - The network-audio transport the bridge sits on
//! - [`TransferHandler`] - Receives newly available periods from the transport
//! - [`AudioIoDevice`] - Device contract expected by the host
//! - [`AudioIoCallback`] - Host callback driven with audio
//! - [`AudioIoDeviceType`] - Device enumeration contract
//!
//! ## Types
//!
//! - [`DeviceBuffer`] - Channel view handed to the host callback
//! - [`ChannelMask`] - Bit-set of active channels
//! - [`AudioProperties`] - Negotiated transport format
//! - [`InstanceConfig`] - Transport instance configuration
//! - [`BridgeConfig`] - Bridge timing and naming
//! - [`BridgeError`] / [`TransportError`] - Error types
//! - [`LoopbackEngine`] - In-process transport

pub mod buffer;
pub mod channel_mask;
pub mod config;
pub mod device;
pub mod error;
pub mod instance_config;
pub mod loopback;
pub mod sample;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use buffer::DeviceBuffer;
pub use channel_mask::{ChannelMask, MAX_MASK_CHANNELS};
pub use config::{BridgeConfig, DEVICE_NAME_SUFFIX};
pub use device::{AudioIoCallback, AudioIoDevice, AudioIoDeviceType};
pub use error::{BridgeError, BridgeResult, TransportError, TransportResult};
pub use instance_config::{InstanceConfig, TimeSource};
pub use loopback::LoopbackEngine;
pub use sample::{
    convert_24_in_32, pack_24_in_32, read_sample, BYTES_PER_SAMPLE, MAX_24, MIN_24, SCALE_24,
};
pub use transport::{
    AudioProperties, AudioTransferParameters, InstanceState, NetworkAudioEngine, RxChannels,
    SharedTransferHandler, TransferHandler, TransferRegistration,
};
pub use types::{
    BUFFER_SAFETY_MARGIN, MAX_CHANNELS, SUPPORTED_BUFFER_SIZE, SUPPORTED_SAMPLE_RATE,
    TRANSFER_LATENCY_SAMPLES,
};
