//! Glue between the bridge and a network-audio engine.
//!
//! `TransportSession` owns the engine handle and is the only place that
//! installs or clears transfer handlers. Handlers may only change while the
//! instance is stopped, so every re-registration goes stop → setup → start.

use std::sync::Arc;

use lanbridge_core::{
    AudioProperties, InstanceConfig, InstanceState, NetworkAudioEngine, SharedTransferHandler,
    TransferRegistration, TransportError, TransportResult, MAX_CHANNELS, SUPPORTED_SAMPLE_RATE,
    TRANSFER_LATENCY_SAMPLES,
};
use parking_lot::Mutex;

/// Owns a network-audio engine and the handler registered with it.
pub struct TransportSession {
    engine: Arc<dyn NetworkAudioEngine>,
    /// Format the current handler was registered with
    registered: Mutex<Option<AudioProperties>>,
}

impl TransportSession {
    pub fn new(engine: Arc<dyn NetworkAudioEngine>) -> Self {
        if engine.is_device_activated() {
            log::debug!("Transport session created; device activated");
        } else {
            log::debug!("Transport session created; device not activated yet");
        }
        Self {
            engine,
            registered: Mutex::new(None),
        }
    }

    /// Register `handler` with the engine.
    ///
    /// If the device is not activated yet, any existing handler is cleared
    /// instead, since channel counts are not known.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotStopped`], after logging a warning and
    /// leaving the registration untouched, unless the instance is stopped.
    pub fn setup_audio_transfer(&self, handler: SharedTransferHandler) -> TransportResult<()> {
        let state = self.engine.instance_state();
        if state != InstanceState::Stopped {
            log::warn!(
                "Cannot set up audio transfer while instance is {:?}; skipping",
                state
            );
            return Err(TransportError::NotStopped);
        }

        let properties = match self.activated_properties() {
            Some(properties) => properties,
            None => {
                log::debug!("Device not activated; clearing transfer handler");
                self.engine.set_transfer_handler(None);
                *self.registered.lock() = None;
                return Ok(());
            }
        };

        let num_channels = (properties
            .rx_activated_channel_count
            .min(properties.tx_activated_channel_count) as usize)
            .min(MAX_CHANNELS);
        log::debug!(
            "Registering transfer handler: {} channels, {} samples latency",
            num_channels,
            TRANSFER_LATENCY_SAMPLES
        );
        self.engine.set_transfer_handler(Some(TransferRegistration {
            handler,
            properties,
            num_channels,
            latency_samples: TRANSFER_LATENCY_SAMPLES,
        }));
        *self.registered.lock() = Some(properties);
        Ok(())
    }

    /// Start the instance.
    pub fn run(&self) -> TransportResult<()> {
        self.engine.start().inspect_err(|err| {
            log::error!("Failed to start transport instance: {}", err);
        })
    }

    /// Stop the instance, re-register `handler` and start again.
    ///
    /// Used when activation changes channel counts after the session was
    /// set up. Failures are logged and returned; the session is left as far
    /// as it got.
    pub fn restart(&self, handler: SharedTransferHandler) -> TransportResult<()> {
        log::debug!("Restarting transport instance");
        self.stop()?;
        self.setup_audio_transfer(handler)?;
        self.run()
    }

    /// Stop the instance. No transfer is in flight once this returns.
    pub fn stop(&self) -> TransportResult<()> {
        self.engine.stop().inspect_err(|err| {
            log::error!("Failed to stop transport instance: {}", err);
        })
    }

    /// Stop the instance and clear the transfer handler.
    pub fn reset(&self) {
        self.stop().ok();
        self.engine.set_transfer_handler(None);
        *self.registered.lock() = None;
        log::debug!("Transport session reset");
    }

    /// Returns true if a handler with known channel counts is installed.
    pub fn has_transfer_handler(&self) -> bool {
        self.registered.lock().is_some()
    }

    /// Format snapshot the installed handler was registered with.
    pub fn registered_properties(&self) -> Option<AudioProperties> {
        *self.registered.lock()
    }

    pub fn is_device_activated(&self) -> bool {
        self.engine.is_device_activated()
    }

    /// Format snapshot, only once the device is activated.
    pub fn activated_properties(&self) -> Option<AudioProperties> {
        if !self.engine.is_device_activated() {
            return None;
        }
        self.engine.audio_properties()
    }

    pub fn audio_properties(&self) -> Option<AudioProperties> {
        self.engine.audio_properties()
    }

    pub fn config(&self) -> InstanceConfig {
        self.engine.config()
    }

    pub fn instance_state(&self) -> InstanceState {
        self.engine.instance_state()
    }

    /// Only the transport's fixed rate is supported.
    pub fn is_supported_sample_rate(&self, sample_rate: f64) -> bool {
        sample_rate == SUPPORTED_SAMPLE_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanbridge_core::{
        AudioTransferParameters, LoopbackEngine, RxChannels, TransferHandler, TransportError,
    };

    #[derive(Default)]
    struct Probe {
        seen: Mutex<Vec<(usize, u32)>>,
    }

    impl TransferHandler for Probe {
        fn transfer(
            &self,
            _properties: &AudioProperties,
            _rx: RxChannels<'_>,
            _params: &AudioTransferParameters,
            num_channels: usize,
            latency_samples: u32,
        ) {
            self.seen.lock().push((num_channels, latency_samples));
        }
    }

    fn engine(rx_names: &[&str], tx_names: &[&str]) -> Arc<LoopbackEngine> {
        Arc::new(LoopbackEngine::new(
            InstanceConfig::new("session")
                .with_periods(4, 4)
                .with_rx_channel_names(rx_names.iter().copied())
                .with_tx_channel_names(tx_names.iter().copied()),
        ))
    }

    #[test]
    fn test_registers_min_channels_and_latency() {
        let engine = engine(&["a", "b", "c", "d"], &["a", "b"]);
        engine.activate(4, 2);
        let session = TransportSession::new(engine.clone());
        let probe = Arc::new(Probe::default());

        session.setup_audio_transfer(probe.clone()).unwrap();
        session.run().unwrap();
        assert!(session.has_transfer_handler());
        assert!(engine.push_samples(&[&[0; 4], &[0; 4], &[0; 4], &[0; 4]]));

        assert_eq!(*probe.seen.lock(), vec![(2, 480)]);
    }

    #[test]
    fn test_setup_skipped_while_running() {
        let engine = engine(&["a", "b"], &["a", "b"]);
        let session = TransportSession::new(engine.clone());
        session.run().unwrap();
        engine.activate(2, 2);

        assert_eq!(
            session.setup_audio_transfer(Arc::new(Probe::default())),
            Err(TransportError::NotStopped)
        );

        assert!(!session.has_transfer_handler());
        assert!(!engine.has_transfer_handler());
    }

    #[test]
    fn test_setup_before_activation_clears() {
        let engine = engine(&["a", "b"], &["a", "b"]);
        let session = TransportSession::new(engine.clone());

        session.setup_audio_transfer(Arc::new(Probe::default())).unwrap();

        assert!(!session.has_transfer_handler());
        assert!(!engine.has_transfer_handler());
    }

    #[test]
    fn test_restart_registers_after_activation() {
        let engine = engine(&["a", "b"], &["a", "b"]);
        let session = TransportSession::new(engine.clone());
        let probe = Arc::new(Probe::default());
        session.setup_audio_transfer(probe.clone()).unwrap();
        session.run().unwrap();

        engine.activate(2, 2);
        session.restart(probe.clone()).unwrap();

        assert!(session.has_transfer_handler());
        assert_eq!(session.instance_state(), InstanceState::Running);
        assert!(engine.push_samples(&[&[0; 4], &[0; 4]]));
        assert_eq!(probe.seen.lock().len(), 1);
    }

    #[test]
    fn test_run_failure_is_returned() {
        let engine = engine(&["a"], &["a"]);
        engine.fail_next_start(TransportError::StartFailed("no interface".into()));
        let session = TransportSession::new(engine.clone());

        assert_eq!(
            session.run(),
            Err(TransportError::StartFailed("no interface".into()))
        );
    }

    #[test]
    fn test_reset_clears_and_stops() {
        let engine = engine(&["a", "b"], &["a", "b"]);
        engine.activate(2, 2);
        let session = TransportSession::new(engine.clone());
        session.setup_audio_transfer(Arc::new(Probe::default())).unwrap();
        session.run().unwrap();

        session.reset();

        assert!(!engine.has_transfer_handler());
        assert_eq!(session.instance_state(), InstanceState::Stopped);
    }

    #[test]
    fn test_restart_reports_start_failure() {
        let engine = engine(&["a", "b"], &["a", "b"]);
        engine.activate(2, 2);
        let session = TransportSession::new(engine.clone());
        engine.fail_next_start(TransportError::StartFailed("port in use".into()));

        assert_eq!(
            session.restart(Arc::new(Probe::default())),
            Err(TransportError::StartFailed("port in use".into()))
        );
        assert!(session.has_transfer_handler());
        assert_eq!(session.instance_state(), InstanceState::Stopped);
    }

    #[test]
    fn test_supported_sample_rate() {
        let session = TransportSession::new(engine(&["a"], &["a"]));
        assert!(session.is_supported_sample_rate(48_000.0));
        assert!(!session.is_supported_sample_rate(44_100.0));
    }
}
