//! # lanbridge-device
//!
//! Host audio device backed by a network-audio transport.
//!
//! The transport pushes audio in fixed-size periods on its own thread; the
//! host expects a pull-style device that drives a callback. This crate sits
//! in between: it converts the transport's 24-bit samples, accumulates them
//! across periods and hands them to the host callback.
//!
//! ## Architecture
//!
//! ```text
//! NetworkAudioEngine (transport thread)
//!        ↓  TransferHandler::transfer
//! TransferBridge ── BufferPool (allocated by ActivationWatcher)
//!        ↓  AudioIoCallback::io_callback
//! host audio engine
//! ```
//!
//! - [`DeviceTypeRegistry`] lists the single device and creates adapters
//! - [`DeviceAdapter`] implements the device lifecycle
//! - [`TransportSession`] registers the bridge with the engine
//! - [`ActivationWatcher`] waits for activation off the host thread
//! - [`TransferBridge`] moves samples on the transport thread
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lanbridge_core::{AudioIoDeviceType, BridgeConfig, ChannelMask};
//! use lanbridge_device::{default_instance_config, DeviceTypeRegistry};
//!
//! static CONFIG: BridgeConfig = BridgeConfig::new("Recorder");
//!
//! let mut registry = DeviceTypeRegistry::new(CONFIG.clone(), || create_engine());
//! registry.scan_for_devices();
//! let name = &registry.device_names(true)[0];
//! let mut device = registry.create_device(name, name).unwrap();
//! device.open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)?;
//! device.start(Box::new(MyCallback::default()))?;
//! ```

pub mod buffer_pool;
pub mod device;
pub mod device_type;
pub mod lifecycle;
pub mod session;
pub mod transfer;
pub mod watcher;

pub use buffer_pool::BufferPool;
pub use device::DeviceAdapter;
pub use device_type::{default_instance_config, DeviceTypeRegistry, EngineFactory};
pub use lifecycle::{ActiveChannels, DeviceState, OpenRequest};
pub use session::TransportSession;
pub use transfer::TransferBridge;
pub use watcher::{ActivationWatcher, WatcherStatus};
