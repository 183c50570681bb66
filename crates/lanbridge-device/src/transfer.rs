//! Transfer handler that moves transport periods into the host callback.
//!
//! `TransferBridge` is registered with the transport and runs on its audio
//! thread. Each call converts the newly available periods into the
//! [`BufferPool`], then, if the host has published a callback, hands it
//! everything accumulated so far.
//!
//! # Locking
//!
//! ```text
//! buffers_valid (AtomicBool)   fast reject while no pool exists
//!        ↓
//! pool   (Mutex, try_lock)     held for the whole delivery
//!        ↓
//! writer (Mutex)               held only around io_callback
//! ```
//!
//! The pool is only replaced or freed after `buffers_valid` is cleared and
//! while the pool lock is held, so a delivery in flight always finishes
//! against the pool it started with. Control paths take the writer lock on
//! its own and never while holding the pool lock in reverse order. Queries
//! read atomics and never take the pool lock.
//!
//! # Full Pool
//!
//! A delivery that doesn't fit behind the accumulated samples first flushes
//! them: to the host callback if one is published, otherwise they are
//! discarded and counted in `overflow_count`. The new periods are then
//! written to the empty pool, so a pool that filled up before `start` never
//! blocks later deliveries.
//!
//! # Real-Time Safety
//!
//! - No allocation, no logging
//! - Pool contention (allocation or teardown in progress) drops the delivery,
//!   counted in `dropped_count`
//! - Panics from conversion or the host callback are caught and invalidate
//!   the pool instead of unwinding into the transport

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use lanbridge_core::{
    read_sample, AudioIoCallback, AudioProperties, AudioTransferParameters, RxChannels,
    TransferHandler,
};
use parking_lot::Mutex;

use crate::buffer_pool::BufferPool;

/// Why a delivery was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransferFault {
    /// Delivery larger than the whole pool; rejected.
    Overflow,
    /// Raw buffers or channel layout don't match the pool.
    Invalid,
}

/// Shared state between the transport thread, the watcher and the device.
pub struct TransferBridge {
    buffers_valid: AtomicBool,
    pool: Mutex<Option<BufferPool>>,
    writer: Mutex<Option<Box<dyn AudioIoCallback>>>,
    /// Mirror of the pool's cursor, written under the pool lock
    accumulated: AtomicUsize,
    overflow_count: AtomicUsize,
    dropped_count: AtomicUsize,
    fault_count: AtomicUsize,
    /// Bumped on every release; stale watchers can't install into a closed device
    generation: AtomicU64,
}

impl TransferBridge {
    pub fn new() -> Self {
        Self {
            buffers_valid: AtomicBool::new(false),
            pool: Mutex::new(None),
            writer: Mutex::new(None),
            accumulated: AtomicUsize::new(0),
            overflow_count: AtomicUsize::new(0),
            dropped_count: AtomicUsize::new(0),
            fault_count: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Pool lifecycle (control threads)
    // =========================================================================

    /// Replace the pool with a fresh one and mark it valid.
    ///
    /// Any previous pool is invalidated and dropped first.
    pub fn install_pool(&self, pool: BufferPool) {
        self.buffers_valid.store(false, Ordering::Release);
        let mut guard = self.pool.lock();
        self.accumulated.store(pool.accumulated(), Ordering::Relaxed);
        *guard = Some(pool);
        self.buffers_valid.store(true, Ordering::Release);
    }

    /// Install `pool` only if no release happened since `generation` was read.
    ///
    /// Returns false and drops the pool otherwise.
    pub fn install_pool_for(&self, generation: u64, pool: BufferPool) -> bool {
        let mut guard = self.pool.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        self.buffers_valid.store(false, Ordering::Release);
        self.accumulated.store(pool.accumulated(), Ordering::Relaxed);
        *guard = Some(pool);
        self.buffers_valid.store(true, Ordering::Release);
        true
    }

    /// Invalidate and free the pool.
    ///
    /// Blocks until any delivery in flight has finished.
    pub fn release_pool(&self) -> Option<BufferPool> {
        self.buffers_valid.store(false, Ordering::Release);
        let mut guard = self.pool.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.accumulated.store(0, Ordering::Relaxed);
        guard.take()
    }

    /// Current release generation, see [`install_pool_for`](Self::install_pool_for).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Returns true while deliveries are being accepted.
    pub fn is_valid(&self) -> bool {
        self.buffers_valid.load(Ordering::Acquire)
    }

    /// Samples waiting in the pool, 0 if there is none.
    ///
    /// Lock-free, so polling it never costs the transport a delivery.
    pub fn accumulated(&self) -> usize {
        self.accumulated.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Callback publication (host control thread)
    // =========================================================================

    /// Publish the host callback. Deliveries start reaching it immediately.
    pub fn publish(&self, callback: Box<dyn AudioIoCallback>) {
        *self.writer.lock() = Some(callback);
    }

    /// Take the host callback back. No delivery reaches it after this returns.
    pub fn unpublish(&self) -> Option<Box<dyn AudioIoCallback>> {
        self.writer.lock().take()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Accumulations discarded because the pool filled with no callback
    /// published, plus deliveries larger than the whole pool.
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Deliveries skipped because the pool was being replaced or freed.
    pub fn dropped_count(&self) -> usize {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Deliveries that invalidated the pool.
    pub fn fault_count(&self) -> usize {
        self.fault_count.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Delivery (transport audio thread)
    // =========================================================================

    fn deliver(
        &self,
        pool: &mut BufferPool,
        properties: &AudioProperties,
        rx: RxChannels<'_>,
        params: &AudioTransferParameters,
        num_channels: usize,
    ) -> Result<(), TransferFault> {
        let samples_per_period = properties.samples_per_period as usize;
        let samples_per_buffer = properties.samples_per_buffer() as usize;
        if samples_per_buffer == 0 {
            return Err(TransferFault::Invalid);
        }

        let num_samples = (params.num_periods_available as usize)
            .checked_mul(samples_per_period)
            .ok_or(TransferFault::Overflow)?;
        let start = (params.available_data_offset_in_periods as usize * samples_per_period)
            % samples_per_buffer;

        if num_samples > pool.capacity() {
            return Err(TransferFault::Overflow);
        }
        if num_samples > pool.remaining() && !self.flush(pool) {
            self.overflow_count.fetch_add(1, Ordering::Relaxed);
            pool.reset();
        }

        for channel in 0..num_channels {
            let raw = rx.channel(channel).ok_or(TransferFault::Invalid)?;
            let dest = pool
                .pending_mut(channel, num_samples)
                .ok_or(TransferFault::Invalid)?;
            for (i, sample) in dest.iter_mut().enumerate() {
                *sample = read_sample(raw, (start + i) % samples_per_buffer)
                    .ok_or(TransferFault::Invalid)?;
            }
        }
        pool.advance(num_samples);
        self.flush(pool);
        Ok(())
    }

    /// Hand the accumulated samples to the published callback and reset the
    /// cursor. Returns false, leaving the pool untouched, if there is none.
    fn flush(&self, pool: &mut BufferPool) -> bool {
        let mut writer = self.writer.lock();
        let Some(callback) = writer.as_mut() else {
            return false;
        };
        let mut buffer = pool.device_buffer();
        callback.io_callback(&mut buffer);
        pool.reset();
        true
    }
}

impl Default for TransferBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferHandler for TransferBridge {
    fn transfer(
        &self,
        properties: &AudioProperties,
        rx: RxChannels<'_>,
        params: &AudioTransferParameters,
        num_channels: usize,
        _latency_samples: u32,
    ) {
        if !self.buffers_valid.load(Ordering::Acquire) {
            return;
        }

        // Contention means the pool is being replaced or freed
        let Some(mut guard) = self.pool.try_lock() else {
            self.dropped_count.fetch_add(1, Ordering::Relaxed);
            return;
        };
        if !self.buffers_valid.load(Ordering::Acquire) {
            return;
        }
        let Some(pool) = guard.as_mut() else {
            return;
        };

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.deliver(pool, properties, rx, params, num_channels)
        }));
        self.accumulated.store(pool.accumulated(), Ordering::Relaxed);

        match result {
            Ok(Ok(())) => {}
            Ok(Err(TransferFault::Overflow)) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(TransferFault::Invalid)) | Err(_) => {
                self.buffers_valid.store(false, Ordering::Release);
                self.fault_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
