//! Background thread that waits for transport activation.
//!
//! The transport activates asynchronously, some time after the device is
//! opened. `ActivationWatcher` runs a poll closure on a named thread until it
//! reports completion, sleeping on a condition variable between attempts so
//! that a shutdown request wakes it immediately.
//!
//! ```text
//! Waiting --poll() == true--> Completed
//!    |
//!    +--shutdown-----------> Cancelled
//!    +--poll() panics------> Failed
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use lanbridge_core::{BridgeError, BridgeResult};
use parking_lot::{Condvar, Mutex};

/// Where the watcher thread is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherStatus {
    /// Polling for activation.
    Waiting,
    /// Activation handled; the thread has exited normally.
    Completed,
    /// The poll closure panicked.
    Failed,
    /// Shutdown was requested before activation.
    Cancelled,
}

impl WatcherStatus {
    /// Waiting or completed. A failed or cancelled watcher will never
    /// allocate buffers.
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Waiting | Self::Completed)
    }
}

struct WatcherSignal {
    exit: Mutex<bool>,
    wake: Condvar,
    status: Mutex<WatcherStatus>,
}

impl WatcherSignal {
    fn set_status(&self, status: WatcherStatus) {
        *self.status.lock() = status;
    }
}

/// Marks the watcher failed if the thread unwinds while still waiting.
struct PanicGuard(Arc<WatcherSignal>);

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut status = self.0.status.lock();
            if *status == WatcherStatus::Waiting {
                *status = WatcherStatus::Failed;
            }
        }
    }
}

/// Handle to a running activation watcher.
pub struct ActivationWatcher {
    handle: Option<JoinHandle<()>>,
    signal: Arc<WatcherSignal>,
}

impl ActivationWatcher {
    /// Spawn the watcher thread.
    ///
    /// `poll` is called immediately and then once per `interval` until it
    /// returns true or shutdown is requested.
    pub fn spawn<F>(name: &str, interval: Duration, mut poll: F) -> BridgeResult<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let signal = Arc::new(WatcherSignal {
            exit: Mutex::new(false),
            wake: Condvar::new(),
            status: Mutex::new(WatcherStatus::Waiting),
        });

        let thread_signal = signal.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _guard = PanicGuard(thread_signal.clone());
                loop {
                    if *thread_signal.exit.lock() {
                        thread_signal.set_status(WatcherStatus::Cancelled);
                        return;
                    }
                    if poll() {
                        thread_signal.set_status(WatcherStatus::Completed);
                        log::debug!("Activation watcher completed");
                        return;
                    }

                    let mut exit = thread_signal.exit.lock();
                    if !*exit {
                        thread_signal.wake.wait_for(&mut exit, interval);
                    }
                }
            })
            .map_err(BridgeError::WatcherSpawn)?;

        Ok(Self {
            handle: Some(handle),
            signal,
        })
    }

    pub fn status(&self) -> WatcherStatus {
        *self.signal.status.lock()
    }

    pub fn is_healthy(&self) -> bool {
        self.status().is_healthy()
    }

    /// Ask the thread to exit without waiting for it.
    pub fn request_exit(&self) {
        *self.signal.exit.lock() = true;
        self.signal.wake.notify_all();
    }

    /// Request exit and wait up to `timeout` for the thread to finish.
    ///
    /// Returns false if the thread was still running at the deadline; it is
    /// detached in that case.
    pub fn shutdown(mut self, timeout: Duration) -> bool {
        self.request_exit();

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                log::warn!(
                    "Activation watcher did not exit within {:?}; detaching",
                    timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        // A panic was already recorded as Failed by the guard
        handle.join().ok();
        true
    }
}

impl Drop for ActivationWatcher {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.request_exit();
        }
    }
}
