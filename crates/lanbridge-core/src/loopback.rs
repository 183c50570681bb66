//! In-process network-audio engine.
//!
//! [`LoopbackEngine`] implements [`NetworkAudioEngine`] without any network:
//! callers flip activation by hand and push receive samples, which are
//! written into a circular ring laid out exactly like a real transport's and
//! then delivered to the registered handler on the calling thread.
//!
//! It is the transport double used by the device tests and is handy for
//! exercising a host integration without hardware.
//!
//! # Example
//!
//! ```
//! use lanbridge_core::{InstanceConfig, LoopbackEngine, NetworkAudioEngine};
//!
//! let engine = LoopbackEngine::new(InstanceConfig::default());
//! assert!(!engine.is_device_activated());
//! engine.activate(2, 2);
//! assert_eq!(engine.audio_properties().unwrap().rx_activated_channel_count, 2);
//! ```

use parking_lot::Mutex;

use crate::error::{TransportError, TransportResult};
use crate::instance_config::InstanceConfig;
use crate::sample::{pack_24_in_32, BYTES_PER_SAMPLE};
use crate::transport::{
    AudioProperties, AudioTransferParameters, InstanceState, NetworkAudioEngine, RxChannels,
    TransferRegistration,
};
use crate::types::MAX_CHANNELS;

struct LoopbackInner {
    config: InstanceConfig,
    state: InstanceState,
    activated: bool,
    rx_activated: u32,
    tx_activated: u32,
    registration: Option<TransferRegistration>,
    /// One ring per receive channel, `samples_per_buffer * 4` bytes each
    rx_ring: Vec<Vec<u8>>,
    /// Next period to write, in periods
    write_period: u32,
    start_error: Option<TransportError>,
}

/// Transport double that delivers pushed samples synchronously.
pub struct LoopbackEngine {
    inner: Mutex<LoopbackInner>,
}

impl LoopbackEngine {
    /// Create a stopped, non-activated engine.
    pub fn new(config: InstanceConfig) -> Self {
        Self {
            inner: Mutex::new(LoopbackInner {
                config,
                state: InstanceState::Stopped,
                activated: false,
                rx_activated: 0,
                tx_activated: 0,
                registration: None,
                rx_ring: Vec::new(),
                write_period: 0,
                start_error: None,
            }),
        }
    }

    /// Mark the device activated with the given channel counts.
    ///
    /// Allocates the receive rings. Counts are capped at the configured
    /// channel counts and at [`MAX_CHANNELS`].
    pub fn activate(&self, rx_channels: u32, tx_channels: u32) {
        let mut inner = self.inner.lock();
        let limit = |configured: usize| configured.min(MAX_CHANNELS) as u32;
        let rx = rx_channels.min(limit(inner.config.num_rx_channels()));
        let tx = tx_channels.min(limit(inner.config.num_tx_channels()));
        let ring_bytes = (inner.config.samples_per_period * inner.config.periods_per_buffer)
            as usize
            * BYTES_PER_SAMPLE;

        inner.rx_activated = rx;
        inner.tx_activated = tx;
        inner.rx_ring = (0..rx).map(|_| vec![0u8; ring_bytes]).collect();
        inner.write_period = 0;
        inner.activated = true;
        log::debug!("Loopback engine activated: {} rx / {} tx", rx, tx);
    }

    /// Mark the device not activated.
    pub fn deactivate(&self) {
        let mut inner = self.inner.lock();
        inner.activated = false;
        log::debug!("Loopback engine deactivated");
    }

    /// Make the next `start()` fail with `error`.
    pub fn fail_next_start(&self, error: TransportError) {
        self.inner.lock().start_error = Some(error);
    }

    /// Returns true if a transfer handler is installed.
    pub fn has_transfer_handler(&self) -> bool {
        self.inner.lock().registration.is_some()
    }

    /// Write whole periods of receive audio and deliver them.
    ///
    /// `channels[c]` holds 24-bit sample values for receive channel `c`; all
    /// channels must have the same length, a multiple of the period size.
    /// Samples wrap around the ring like a real transport's. Returns true if
    /// a handler was running and got called.
    pub fn push_samples(&self, channels: &[&[i32]]) -> bool {
        let mut inner = self.inner.lock();
        if !inner.activated {
            return false;
        }

        let samples_per_period = inner.config.samples_per_period as usize;
        let periods_per_buffer = inner.config.periods_per_buffer;
        let samples_per_buffer = samples_per_period * periods_per_buffer as usize;
        let len = channels.first().map(|c| c.len()).unwrap_or(0);
        if samples_per_period == 0 || len == 0 || len % samples_per_period != 0 {
            log::warn!(
                "Loopback push of {} samples is not a whole number of {}-sample periods",
                len,
                samples_per_period
            );
            return false;
        }

        let start_period = inner.write_period;
        let start_sample = start_period as usize * samples_per_period;
        for (channel, samples) in inner.rx_ring.iter_mut().zip(channels.iter()) {
            for (i, &value) in samples.iter().enumerate() {
                let pos = (start_sample + i) % samples_per_buffer * BYTES_PER_SAMPLE;
                channel[pos..pos + BYTES_PER_SAMPLE].copy_from_slice(&pack_24_in_32(value));
            }
        }

        let num_periods = (len / samples_per_period) as u32;
        inner.write_period = (start_period + num_periods) % periods_per_buffer;

        let params = AudioTransferParameters {
            available_data_offset_in_periods: start_period,
            num_periods_available: num_periods,
        };
        Self::deliver_locked(&inner, &params)
    }

    /// Deliver `params` against the current ring contents without writing.
    pub fn deliver(&self, params: &AudioTransferParameters) -> bool {
        let inner = self.inner.lock();
        Self::deliver_locked(&inner, params)
    }

    fn deliver_locked(inner: &LoopbackInner, params: &AudioTransferParameters) -> bool {
        if inner.state != InstanceState::Running {
            return false;
        }
        let Some(registration) = inner.registration.as_ref() else {
            return false;
        };

        let mut refs: [&[u8]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
        let count = inner.rx_ring.len().min(MAX_CHANNELS);
        for (slot, ring) in refs.iter_mut().zip(inner.rx_ring.iter()) {
            *slot = ring.as_slice();
        }

        registration.deliver(RxChannels::new(&refs[..count]), params);
        true
    }
}

impl NetworkAudioEngine for LoopbackEngine {
    fn is_device_activated(&self) -> bool {
        self.inner.lock().activated
    }

    fn audio_properties(&self) -> Option<AudioProperties> {
        let inner = self.inner.lock();
        if !inner.activated {
            return None;
        }
        Some(AudioProperties {
            sample_rate: inner.config.sample_rate,
            samples_per_period: inner.config.samples_per_period,
            periods_per_buffer: inner.config.periods_per_buffer,
            rx_activated_channel_count: inner.rx_activated,
            tx_activated_channel_count: inner.tx_activated,
        })
    }

    fn config(&self) -> InstanceConfig {
        self.inner.lock().config.clone()
    }

    fn instance_state(&self) -> InstanceState {
        self.inner.lock().state
    }

    fn start(&self) -> TransportResult<()> {
        let mut inner = self.inner.lock();
        if let Some(error) = inner.start_error.take() {
            return Err(error);
        }
        inner.state = InstanceState::Running;
        Ok(())
    }

    fn stop(&self) -> TransportResult<()> {
        self.inner.lock().state = InstanceState::Stopped;
        Ok(())
    }

    fn set_transfer_handler(&self, registration: Option<TransferRegistration>) {
        self.inner.lock().registration = registration;
    }
}
