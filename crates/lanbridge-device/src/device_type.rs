//! Device enumeration for the host's driver list.
//!
//! The bridge exposes exactly one device per transport, named
//! `"<app name> - Stereo"`. `DeviceTypeRegistry` lists it after a scan and
//! builds a fresh [`DeviceAdapter`], with a fresh transport engine from the
//! registered factory, for every `create_device` call.

use std::sync::Arc;

use lanbridge_core::{
    AudioIoDevice, AudioIoDeviceType, BridgeConfig, InstanceConfig, NetworkAudioEngine,
    TimeSource, TransportResult,
};

use crate::device::DeviceAdapter;

/// Creates the transport engine for a new device.
pub type EngineFactory =
    Box<dyn Fn() -> TransportResult<Arc<dyn NetworkAudioEngine>> + Send + Sync>;

/// Instance configuration the bridge hands to a new transport engine.
///
/// Two channels each way labelled `Left`/`Right`, clocked from received
/// audio, advertised under the application name.
pub fn default_instance_config(config: &BridgeConfig) -> InstanceConfig {
    InstanceConfig::new(config.app_name)
        .with_interface("Ethernet")
        .with_time_source(TimeSource::RxAudio)
        .with_rx_channel_names(["Left", "Right"])
        .with_tx_channel_names(["Left", "Right"])
}

/// Lists the bridge's device and creates adapters for it.
pub struct DeviceTypeRegistry {
    config: BridgeConfig,
    factory: EngineFactory,
    device_names: Vec<String>,
    has_scanned: bool,
}

impl DeviceTypeRegistry {
    /// Create a registry. No devices are listed until
    /// [`scan_for_devices`](AudioIoDeviceType::scan_for_devices) is called.
    pub fn new<F>(config: BridgeConfig, factory: F) -> Self
    where
        F: Fn() -> TransportResult<Arc<dyn NetworkAudioEngine>> + Send + Sync + 'static,
    {
        Self {
            config,
            factory: Box::new(factory),
            device_names: Vec::new(),
            has_scanned: false,
        }
    }

    pub fn has_scanned(&self) -> bool {
        self.has_scanned
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Concrete form of
    /// [`create_device`](AudioIoDeviceType::create_device).
    ///
    /// Requires a prior scan and identical, non-empty input and output
    /// names. Transport failures are logged and yield `None`.
    pub fn create_adapter(
        &self,
        output_device_name: &str,
        input_device_name: &str,
    ) -> Option<DeviceAdapter> {
        if !self.has_scanned {
            log::warn!("create_device called before scan_for_devices");
            return None;
        }
        if output_device_name != input_device_name || output_device_name.is_empty() {
            log::debug!(
                "No device for output '{}' / input '{}'",
                output_device_name,
                input_device_name
            );
            return None;
        }

        let engine = match (self.factory)() {
            Ok(engine) => engine,
            Err(err) => {
                log::error!("Failed to create transport engine: {}", err);
                return None;
            }
        };

        match DeviceAdapter::with_name(output_device_name, engine, self.config.clone()) {
            Ok(device) => Some(device),
            Err(err) => {
                log::error!("Failed to create device '{}': {}", output_device_name, err);
                None
            }
        }
    }
}

impl AudioIoDeviceType for DeviceTypeRegistry {
    fn type_name(&self) -> &str {
        self.config.type_name
    }

    fn scan_for_devices(&mut self) {
        self.device_names = vec![self.config.device_name()];
        self.has_scanned = true;
        log::debug!("Scanned devices: {:?}", self.device_names);
    }

    fn device_names(&self, _want_inputs: bool) -> Vec<String> {
        if !self.has_scanned {
            return Vec::new();
        }
        self.device_names.clone()
    }

    fn default_device_index(&self, _for_input: bool) -> usize {
        0
    }

    fn index_of_device(&self, device: &dyn AudioIoDevice, _as_input: bool) -> Option<usize> {
        if !self.has_scanned {
            return None;
        }
        self.device_names
            .iter()
            .position(|name| name == device.name())
    }

    fn has_separate_inputs_and_outputs(&self) -> bool {
        false
    }

    fn create_device(
        &self,
        output_device_name: &str,
        input_device_name: &str,
    ) -> Option<Box<dyn AudioIoDevice>> {
        self.create_adapter(output_device_name, input_device_name)
            .map(|device| Box::new(device) as Box<dyn AudioIoDevice>)
    }
}
