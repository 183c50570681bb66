//! Host audio device backed by a network-audio transport.
//!
//! `DeviceAdapter` implements [`AudioIoDevice`] on top of a
//! [`TransportSession`], a [`TransferBridge`] and an [`ActivationWatcher`].
//!
//! # Threads
//!
//! - Host control thread: `open`, `start`, `stop`, `close` and queries
//! - Watcher thread: waits for activation, registers the bridge, allocates
//!   the pool, then exits
//! - Transport audio thread: runs [`TransferBridge`] and through it the host
//!   callback
//!
//! All three share state through `Arc`s owned by the adapter. Queries never
//! wait on the watcher.

use std::sync::Arc;

use lanbridge_core::{
    AudioIoCallback, AudioIoDevice, BridgeConfig, BridgeError, BridgeResult, ChannelMask,
    NetworkAudioEngine, MAX_CHANNELS,
};
use parking_lot::Mutex;

use crate::buffer_pool::BufferPool;
use crate::lifecycle::{ActiveChannels, DeviceState, OpenRequest};
use crate::session::TransportSession;
use crate::transfer::TransferBridge;
use crate::watcher::{ActivationWatcher, WatcherStatus};

/// Name of the activation watcher thread.
const WATCHER_THREAD_NAME: &str = "lanbridge-activation";

/// Audio device exposing a network-audio transport to the host.
pub struct DeviceAdapter {
    name: String,
    config: BridgeConfig,
    session: Arc<TransportSession>,
    bridge: Arc<TransferBridge>,
    active: Arc<Mutex<Option<ActiveChannels>>>,
    watcher: Option<ActivationWatcher>,
    state: DeviceState,
    request: OpenRequest,
    last_error: String,
}

impl DeviceAdapter {
    /// Create the device and start the transport instance.
    ///
    /// The bridge is registered right away if the transport is already
    /// activated, otherwise by the watcher once it is.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Transport`] if the instance fails to start.
    pub fn new(engine: Arc<dyn NetworkAudioEngine>, config: BridgeConfig) -> BridgeResult<Self> {
        Self::with_name(config.device_name(), engine, config)
    }

    /// Like [`new`](Self::new), with an explicit device name.
    pub fn with_name(
        name: impl Into<String>,
        engine: Arc<dyn NetworkAudioEngine>,
        config: BridgeConfig,
    ) -> BridgeResult<Self> {
        let name = name.into();
        let session = Arc::new(TransportSession::new(engine));
        let bridge = Arc::new(TransferBridge::new());

        session.setup_audio_transfer(bridge.clone()).ok();
        if let Err(err) = session.run() {
            session.reset();
            return Err(err.into());
        }

        log::debug!("Created device '{}'", name);
        Ok(Self {
            name,
            request: OpenRequest::new(
                ChannelMask::EMPTY,
                ChannelMask::EMPTY,
                config.sample_rate,
                config.buffer_size,
            ),
            config,
            session,
            bridge,
            active: Arc::new(Mutex::new(None)),
            watcher: None,
            state: DeviceState::Created,
            last_error: String::new(),
        })
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Status of the current watcher, `None` before the first open or after
    /// close.
    pub fn watcher_status(&self) -> Option<WatcherStatus> {
        self.watcher.as_ref().map(ActivationWatcher::status)
    }

    /// Returns true once the pool is allocated and deliveries are accepted.
    pub fn is_ready(&self) -> bool {
        self.bridge.is_valid()
    }

    /// Samples converted but not yet handed to the host.
    pub fn accumulated_samples(&self) -> usize {
        self.bridge.accumulated()
    }

    /// Accumulations discarded because the pool filled before `start`.
    pub fn overflow_count(&self) -> usize {
        self.bridge.overflow_count()
    }

    /// Deliveries skipped while the pool was being allocated or freed.
    pub fn dropped_count(&self) -> usize {
        self.bridge.dropped_count()
    }

    /// Deliveries that invalidated the pool.
    pub fn fault_count(&self) -> usize {
        self.bridge.fault_count()
    }

    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    fn watcher_healthy(&self) -> bool {
        self.watcher
            .as_ref()
            .is_some_and(ActivationWatcher::is_healthy)
    }

    fn spawn_watcher(&self) -> BridgeResult<ActivationWatcher> {
        let session = self.session.clone();
        let bridge = self.bridge.clone();
        let active = self.active.clone();
        let buffer_size = self.request.buffer_size;
        let safety_margin = self.config.safety_margin;
        let generation = self.bridge.generation();

        ActivationWatcher::spawn(
            WATCHER_THREAD_NAME,
            self.config.activation_poll_interval,
            move || {
                let Some(properties) = session.activated_properties() else {
                    return false;
                };

                let rx = (properties.rx_activated_channel_count as usize).min(MAX_CHANNELS);
                let tx = (properties.tx_activated_channel_count as usize).min(MAX_CHANNELS);
                log::debug!("Transport activated: {} rx / {} tx channels", rx, tx);

                if session.registered_properties() != Some(properties) {
                    session.restart(bridge.clone()).ok();
                }

                let capacity = BufferPool::capacity_for(
                    buffer_size,
                    properties.periods_per_buffer as usize,
                    safety_margin,
                );
                if !bridge.install_pool_for(generation, BufferPool::allocate(rx, tx, capacity)) {
                    log::debug!("Device closed during activation; pool discarded");
                    return true;
                }

                *active.lock() = Some(ActiveChannels {
                    inputs: ChannelMask::contiguous(rx),
                    outputs: ChannelMask::contiguous(tx),
                });
                true
            },
        )
    }
}

impl AudioIoDevice for DeviceAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        self.config.type_name
    }

    fn open(
        &mut self,
        input_channels: ChannelMask,
        output_channels: ChannelMask,
        sample_rate: f64,
        buffer_size_samples: usize,
    ) -> BridgeResult<()> {
        if self.state.is_open() {
            log::debug!("Device '{}' already open; closing first", self.name);
            self.close();
        }

        self.request = OpenRequest::new(
            input_channels,
            output_channels,
            sample_rate,
            buffer_size_samples,
        );
        self.last_error.clear();
        *self.active.lock() = None;

        match self.spawn_watcher() {
            Ok(watcher) => {
                self.watcher = Some(watcher);
                self.state = DeviceState::Opened;
                log::debug!(
                    "Opened device '{}' at {} Hz, {} samples",
                    self.name,
                    sample_rate,
                    buffer_size_samples
                );
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to open device '{}': {}", self.name, err);
                self.last_error = err.to_string();
                Err(err)
            }
        }
    }

    fn close(&mut self) {
        if self.state.is_started() {
            drop(self.stop());
        }

        if let Some(watcher) = self.watcher.take() {
            watcher.shutdown(self.config.shutdown_timeout);
        }
        self.bridge.release_pool();
        *self.active.lock() = None;

        if self.state != DeviceState::Closed {
            log::debug!("Closed device '{}'", self.name);
        }
        self.state = DeviceState::Closed;
    }

    fn start(&mut self, mut callback: Box<dyn AudioIoCallback>) -> Result<(), Box<dyn AudioIoCallback>> {
        if !self.state.can_start() {
            let err = BridgeError::InvalidState(format!("cannot start while {:?}", self.state));
            log::warn!("Device '{}': {}", self.name, err);
            self.last_error = err.to_string();
            return Err(callback);
        }

        if !self.watcher_healthy() {
            log::error!(
                "Activation watcher of device '{}' stopped unexpectedly; closing",
                self.name
            );
            self.close();
            self.last_error = BridgeError::WatcherDied.to_string();
            return Err(callback);
        }

        callback.about_to_start(&*self);
        self.bridge.publish(callback);
        self.state = DeviceState::Started;
        log::debug!("Started device '{}'", self.name);
        Ok(())
    }

    fn stop(&mut self) -> Option<Box<dyn AudioIoCallback>> {
        if !self.state.is_started() {
            return None;
        }

        let callback = self.bridge.unpublish();
        self.state = DeviceState::Stopped;
        log::debug!("Stopped device '{}'", self.name);

        let mut callback = callback?;
        callback.stopped();
        Some(callback)
    }

    fn is_open(&self) -> bool {
        self.state.is_open() && self.watcher_healthy()
    }

    fn is_playing(&self) -> bool {
        self.state.is_started() && self.is_open()
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn output_channel_names(&self) -> Vec<String> {
        self.session.config().tx_channel_names().to_vec()
    }

    fn input_channel_names(&self) -> Vec<String> {
        self.session.config().rx_channel_names().to_vec()
    }

    fn available_sample_rates(&self) -> Vec<f64> {
        vec![self.config.sample_rate]
    }

    fn available_buffer_sizes(&self) -> Vec<usize> {
        vec![self.config.buffer_size]
    }

    fn default_buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    fn current_buffer_size_samples(&self) -> usize {
        self.request.buffer_size
    }

    fn current_sample_rate(&self) -> f64 {
        self.request.sample_rate
    }

    fn current_bit_depth(&self) -> u32 {
        0
    }

    fn active_output_channels(&self) -> ChannelMask {
        self.active
            .lock()
            .map_or(self.request.output_channels, |active| active.outputs)
    }

    fn active_input_channels(&self) -> ChannelMask {
        self.active
            .lock()
            .map_or(self.request.input_channels, |active| active.inputs)
    }

    fn output_latency_in_samples(&self) -> usize {
        0
    }

    fn input_latency_in_samples(&self) -> usize {
        0
    }

    fn xrun_count(&self) -> usize {
        0
    }

    fn set_audio_preprocessing_enabled(&mut self, _enabled: bool) -> bool {
        false
    }
}

impl Drop for DeviceAdapter {
    fn drop(&mut self) {
        self.close();
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanbridge_core::{
        convert_24_in_32, pack_24_in_32, AudioProperties, DeviceBuffer, InstanceConfig,
        InstanceState, LoopbackEngine, TransferRegistration, TransportError, TransportResult,
        MAX_24,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    const TEST_CONFIG: BridgeConfig = BridgeConfig::new("Test")
        .with_activation_poll_interval(Duration::from_millis(1))
        .with_shutdown_timeout(Duration::from_secs(1));

    #[derive(Clone, Default)]
    struct Recorder {
        blocks: Arc<Mutex<Vec<(usize, usize, usize, f32)>>>,
        started: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    impl AudioIoCallback for Recorder {
        fn about_to_start(&mut self, device: &dyn AudioIoDevice) {
            assert_eq!(device.current_sample_rate(), 48_000.0);
            self.started.fetch_add(1, Ordering::SeqCst);
        }

        fn io_callback(&mut self, buffer: &mut DeviceBuffer<'_>) {
            let first = buffer.input(0).first().copied().unwrap_or(0.0);
            self.blocks.lock().push((
                buffer.num_samples(),
                buffer.num_input_channels(),
                buffer.num_output_channels(),
                first,
            ));
        }

        fn stopped(&mut self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn loopback() -> Arc<LoopbackEngine> {
        Arc::new(LoopbackEngine::new(
            InstanceConfig::new("test")
                .with_rx_channel_names(["Left", "Right"])
                .with_tx_channel_names(["Left", "Right"]),
        ))
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn period(first: i32) -> Vec<i32> {
        (0..128).map(|i| if i == 0 { first } else { i }).collect()
    }

    #[test]
    fn test_single_period_reaches_callback() {
        let engine = loopback();
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();

        engine.activate(2, 2);
        wait_until(|| device.is_ready());

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());
        assert_eq!(recorder.started.load(Ordering::SeqCst), 1);

        let left = period(MAX_24);
        let right = period(0);
        assert!(engine.push_samples(&[&left, &right]));

        let blocks = recorder.blocks.lock();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], (128, 2, 2, 1.0));
        assert_eq!(blocks[0].3, convert_24_in_32(pack_24_in_32(MAX_24)));
    }

    #[test]
    fn test_activation_sets_masks() {
        let engine = loopback();
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        let requested = ChannelMask::from_bits(0b1000);
        device.open(requested, requested, 44_100.0, 256).unwrap();

        assert_eq!(device.active_input_channels(), requested);
        assert!(!device.is_ready());

        engine.activate(2, 1);
        wait_until(|| device.watcher_status() == Some(WatcherStatus::Completed));
        assert!(device.is_ready());

        assert_eq!(device.active_input_channels(), ChannelMask::contiguous(2));
        assert_eq!(device.active_output_channels(), ChannelMask::contiguous(1));
        assert_eq!(device.current_sample_rate(), 44_100.0);
        assert_eq!(device.current_buffer_size_samples(), 256);
        assert!(device.is_open());
    }

    #[test]
    fn test_playing_follows_lifecycle() {
        let engine = loopback();
        engine.activate(2, 2);
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        assert!(!device.is_open());

        let recorder = Recorder::default();
        let callback = device.start(Box::new(recorder.clone()));
        assert!(callback.is_err());
        assert_eq!(device.last_error(), "invalid state: cannot start while Created");

        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        assert_eq!(device.last_error(), "");
        wait_until(|| device.watcher_status() == Some(WatcherStatus::Completed));
        assert!(device.is_open());
        assert!(!device.is_playing());
        assert_eq!(device.active_input_channels(), ChannelMask::contiguous(2));

        assert!(device.start(Box::new(recorder.clone())).is_ok());
        assert!(device.is_playing());

        let second = Recorder::default();
        assert!(device.start(Box::new(second)).is_err());

        let returned = device.stop();
        assert!(returned.is_some());
        assert!(!device.is_playing());
        assert!(device.is_open());
        assert_eq!(recorder.stopped.load(Ordering::SeqCst), 1);
        assert!(device.stop().is_none());

        assert!(device.start(returned.unwrap()).is_ok());
        assert!(device.is_playing());

        device.close();
        assert!(!device.is_playing());
        assert!(!device.is_open());
        assert!(!device.is_ready());
        assert_eq!(device.state(), DeviceState::Closed);
        assert_eq!(recorder.stopped.load(Ordering::SeqCst), 2);
        assert_eq!(device.active_input_channels(), ChannelMask::EMPTY);
        assert_eq!(device.active_output_channels(), ChannelMask::EMPTY);
    }

    #[test]
    fn test_late_start_still_receives_audio() {
        let engine = loopback();
        engine.activate(2, 2);
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        wait_until(|| device.is_ready());

        // More than a full pool arrives before the host starts
        for _ in 0..70 {
            assert!(engine.push_samples(&[&period(3), &period(3)]));
        }
        assert_eq!(device.overflow_count(), 1);

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());
        for _ in 0..10 {
            assert!(engine.push_samples(&[&period(3), &period(3)]));
        }

        let blocks = recorder.blocks.lock();
        assert_eq!(blocks.len(), 10);
        assert_eq!(blocks[0].0, 7 * 128);
        assert!(blocks[1..].iter().all(|block| block.0 == 128));
        assert_eq!(device.accumulated_samples(), 0);
        assert_eq!(device.dropped_count(), 0);
    }

    #[test]
    fn test_forty_channels_end_to_end() {
        let names: Vec<String> = (0..40).map(|i| format!("Ch {}", i + 1)).collect();
        let engine = Arc::new(LoopbackEngine::new(
            InstanceConfig::new("wide")
                .with_rx_channel_names(names.iter().cloned())
                .with_tx_channel_names(names.iter().cloned()),
        ));
        engine.activate(40, 40);
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        wait_until(|| device.watcher_status() == Some(WatcherStatus::Completed));
        assert_eq!(device.active_input_channels(), ChannelMask::contiguous(40));

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());
        let samples = period(MAX_24);
        let channels: Vec<&[i32]> = (0..40).map(|_| samples.as_slice()).collect();
        assert!(engine.push_samples(&channels));

        assert_eq!(*recorder.blocks.lock(), vec![(128, 40, 40, 1.0)]);
        assert_eq!(device.fault_count(), 0);
    }

    #[test]
    fn test_reopen_after_close_gets_fresh_pool() {
        let engine = loopback();
        engine.activate(2, 2);
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        wait_until(|| device.is_ready());

        assert!(engine.push_samples(&[&period(1), &period(1)]));
        assert_eq!(device.accumulated_samples(), 128);

        device.close();
        assert!(engine.push_samples(&[&period(1), &period(1)]));
        assert_eq!(device.accumulated_samples(), 0);

        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        wait_until(|| device.is_ready());
        assert_eq!(device.accumulated_samples(), 0);
        assert_eq!(device.state(), DeviceState::Opened);

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());
        assert!(engine.push_samples(&[&period(7), &period(7)]));
        assert_eq!(recorder.blocks.lock().len(), 1);
        assert_eq!(recorder.blocks.lock()[0].0, 128);
    }

    #[test]
    fn test_close_races_transport_thread() {
        let engine = loopback();
        engine.activate(2, 2);
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let transport = {
            let engine = engine.clone();
            let running = running.clone();
            thread::spawn(move || {
                let samples = period(5);
                while running.load(Ordering::SeqCst) {
                    engine.push_samples(&[&samples, &samples]);
                }
            })
        };

        for _ in 0..100 {
            device
                .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
                .unwrap();
            wait_until(|| device.is_ready());
            let recorder = Recorder::default();
            assert!(device.start(Box::new(recorder.clone())).is_ok());
            device.close();

            for block in recorder.blocks.lock().iter() {
                assert_eq!(block.0 % 128, 0);
            }
        }

        running.store(false, Ordering::SeqCst);
        transport.join().unwrap();
        assert_eq!(device.fault_count(), 0);
    }

    #[test]
    fn test_open_while_open_restarts_watcher() {
        let engine = loopback();
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());

        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 64)
            .unwrap();

        assert_eq!(recorder.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(device.state(), DeviceState::Opened);
        assert_eq!(device.current_buffer_size_samples(), 64);
        assert_eq!(device.watcher_status(), Some(WatcherStatus::Waiting));
    }

    #[test]
    fn test_stop_before_activation_hands_back_callback() {
        let engine = loopback();
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_ok());
        assert!(!engine.push_samples(&[&period(1), &period(1)]));
        assert!(device.stop().is_some());
        assert!(recorder.blocks.lock().is_empty());
    }

    #[test]
    fn test_queries() {
        let engine = loopback();
        let mut device = DeviceAdapter::new(engine, TEST_CONFIG).unwrap();

        assert_eq!(device.name(), "Test - Stereo");
        assert_eq!(device.type_name(), "Network");
        assert_eq!(device.output_channel_names(), vec!["Left", "Right"]);
        assert_eq!(device.input_channel_names(), vec!["Left", "Right"]);
        assert_eq!(device.available_sample_rates(), vec![48_000.0]);
        assert_eq!(device.available_buffer_sizes(), vec![128]);
        assert_eq!(device.default_buffer_size(), 128);
        assert_eq!(device.current_bit_depth(), 0);
        assert_eq!(device.output_latency_in_samples(), 0);
        assert_eq!(device.input_latency_in_samples(), 0);
        assert_eq!(device.xrun_count(), 0);
        assert_eq!(device.last_error(), "");
        assert!(!device.set_audio_preprocessing_enabled(true));
    }

    #[test]
    fn test_new_fails_when_transport_will_not_start() {
        let engine = loopback();
        engine.fail_next_start(TransportError::StartFailed("no interface".into()));

        let result = DeviceAdapter::new(engine.clone(), TEST_CONFIG);

        assert!(matches!(
            result,
            Err(BridgeError::Transport(TransportError::StartFailed(_)))
        ));
        assert_eq!(engine.instance_state(), InstanceState::Stopped);
    }

    #[test]
    fn test_drop_resets_transport() {
        let engine = loopback();
        engine.activate(2, 2);
        let device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();
        assert!(engine.has_transfer_handler());

        drop(device);

        assert!(!engine.has_transfer_handler());
        assert_eq!(engine.instance_state(), InstanceState::Stopped);
    }

    /// Engine whose activation check can be made to panic.
    struct FaultyEngine {
        inner: LoopbackEngine,
        panic_on_poll: AtomicBool,
    }

    impl NetworkAudioEngine for FaultyEngine {
        fn is_device_activated(&self) -> bool {
            if self.panic_on_poll.load(Ordering::SeqCst) {
                panic!("transport library fault");
            }
            self.inner.is_device_activated()
        }

        fn audio_properties(&self) -> Option<AudioProperties> {
            self.inner.audio_properties()
        }

        fn config(&self) -> InstanceConfig {
            self.inner.config()
        }

        fn instance_state(&self) -> InstanceState {
            self.inner.instance_state()
        }

        fn start(&self) -> TransportResult<()> {
            self.inner.start()
        }

        fn stop(&self) -> TransportResult<()> {
            self.inner.stop()
        }

        fn set_transfer_handler(&self, registration: Option<TransferRegistration>) {
            self.inner.set_transfer_handler(registration)
        }
    }

    #[test]
    fn test_dead_watcher_refuses_start() {
        let engine = Arc::new(FaultyEngine {
            inner: LoopbackEngine::new(InstanceConfig::default()),
            panic_on_poll: AtomicBool::new(false),
        });
        let mut device = DeviceAdapter::new(engine.clone(), TEST_CONFIG).unwrap();

        engine.panic_on_poll.store(true, Ordering::SeqCst);
        device
            .open(ChannelMask::EMPTY, ChannelMask::EMPTY, 48_000.0, 128)
            .unwrap();
        wait_until(|| device.watcher_status() == Some(WatcherStatus::Failed));
        assert!(!device.is_open());

        let recorder = Recorder::default();
        assert!(device.start(Box::new(recorder.clone())).is_err());
        assert_eq!(recorder.started.load(Ordering::SeqCst), 0);
        assert_eq!(device.state(), DeviceState::Closed);
        assert!(!device.last_error().is_empty());

        engine.panic_on_poll.store(false, Ordering::SeqCst);
    }
}
