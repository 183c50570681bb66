//! # lanbridge
//!
//! Network audio device bridge for Rust.
//!
//! lanbridge republishes audio received from a network-audio transport as a
//! host audio device: the transport delivers periods on its own thread, the
//! host pulls blocks through a device callback.
//!
//! ## Architecture
//!
//! ```text
//! Network-audio transport (implements NetworkAudioEngine)
//!        ↓
//! DeviceAdapter (lanbridge-device)
//!        ↓
//! Your host engine (implements AudioIoCallback)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use lanbridge::prelude::*;
//!
//! struct Meter;
//!
//! impl AudioIoCallback for Meter {
//!     fn about_to_start(&mut self, _device: &dyn AudioIoDevice) {}
//!     fn io_callback(&mut self, buffer: &mut DeviceBuffer) {
//!         let _peak = buffer.input(0).iter().fold(0.0f32, |p, s| p.max(s.abs()));
//!     }
//!     fn stopped(&mut self) {}
//! }
//!
//! static CONFIG: BridgeConfig = BridgeConfig::new("Meter");
//!
//! let instance = default_instance_config(&CONFIG);
//! let mut registry = DeviceTypeRegistry::new(CONFIG.clone(), move || {
//!     Ok(Arc::new(LoopbackEngine::new(instance.clone())) as Arc<dyn NetworkAudioEngine>)
//! });
//! registry.scan_for_devices();
//!
//! let name = registry.device_names(true)[0].clone();
//! let mut device = registry.create_device(&name, &name).unwrap();
//! device.open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128).unwrap();
//! assert!(device.start(Box::new(Meter)).is_ok());
//! device.close();
//! ```

// Re-export sub-crates
pub use lanbridge_core as core;
pub use lanbridge_device as device;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use lanbridge::prelude::*;
/// ```
pub mod prelude {
    pub use lanbridge_core::{
        // Host contracts
        AudioIoCallback, AudioIoDevice, AudioIoDeviceType, ChannelMask, DeviceBuffer,
        // Transport contracts
        AudioProperties, AudioTransferParameters, InstanceState, NetworkAudioEngine, RxChannels,
        TransferHandler, TransferRegistration,
        // Configuration
        BridgeConfig, InstanceConfig, TimeSource,
        // Errors
        BridgeError, BridgeResult, TransportError, TransportResult,
        // In-process transport
        LoopbackEngine,
    };

    pub use lanbridge_device::{
        default_instance_config, DeviceAdapter, DeviceState, DeviceTypeRegistry,
        TransportSession,
    };
}
