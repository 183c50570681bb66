//! Accumulation buffers between transport periods and host callbacks.
//!
//! The transport delivers audio in periods whose size is unrelated to the
//! host's buffer size. `BufferPool` holds converted samples until a host
//! callback drains them, so every channel is sized for the worst case: a
//! full transport ring at host buffer granularity plus a safety margin.
//!
//! # Pattern
//!
//! 1. Allocate once when the transport reports activation (non-real-time)
//! 2. Write converted periods at the accumulation cursor (no allocation)
//! 3. Hand the filled prefix to the host and reset the cursor (O(1))
//! 4. Drop on close or reactivation (non-real-time, under the pool lock)
//!
//! # Real-Time Safety
//!
//! Only `allocate` touches the heap. Every other method is O(1) or a plain
//! slice operation.

use lanbridge_core::DeviceBuffer;

// =============================================================================
// BufferPool
// =============================================================================

/// Per-channel `f32` accumulation arrays with a shared cursor.
///
/// Inputs carry converted receive audio. Outputs are handed to the host for
/// it to write into; nothing reads them back.
pub struct BufferPool {
    inputs: Vec<Vec<f32>>,
    outputs: Vec<Vec<f32>>,
    capacity: usize,
    accumulated: usize,
}

impl BufferPool {
    /// Allocate zeroed arrays of `capacity` samples per channel.
    pub fn allocate(num_inputs: usize, num_outputs: usize, capacity: usize) -> Self {
        log::debug!(
            "Allocating buffer pool: {} in / {} out x {} samples",
            num_inputs,
            num_outputs,
            capacity
        );
        Self {
            inputs: (0..num_inputs).map(|_| vec![0.0; capacity]).collect(),
            outputs: (0..num_outputs).map(|_| vec![0.0; capacity]).collect(),
            capacity,
            accumulated: 0,
        }
    }

    /// Per-channel capacity for a host buffer size and transport ring length.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Host buffer size requested at open time
    /// * `periods_per_buffer` - Periods in the transport's receive ring
    /// * `safety_margin` - Extra samples per channel
    pub fn capacity_for(buffer_size: usize, periods_per_buffer: usize, safety_margin: usize) -> usize {
        buffer_size
            .saturating_mul(periods_per_buffer)
            .saturating_add(safety_margin)
    }

    /// Samples per channel.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples converted but not yet handed to the host.
    #[inline]
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// Samples that can still be written before the pool is full.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.accumulated
    }

    #[inline]
    pub fn num_input_channels(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn num_output_channels(&self) -> usize {
        self.outputs.len()
    }

    /// Writable region of `len` samples at the cursor of an input channel.
    ///
    /// Returns `None` if the channel doesn't exist or `len` exceeds
    /// [`remaining`](Self::remaining).
    #[inline]
    pub fn pending_mut(&mut self, channel: usize, len: usize) -> Option<&mut [f32]> {
        let start = self.accumulated;
        let end = start.checked_add(len)?;
        self.inputs.get_mut(channel)?.get_mut(start..end)
    }

    /// Move the cursor forward after a write.
    ///
    /// Saturates at capacity.
    #[inline]
    pub fn advance(&mut self, samples: usize) {
        self.accumulated = self.accumulated.saturating_add(samples).min(self.capacity);
    }

    /// Forget all accumulated samples.
    #[inline]
    pub fn reset(&mut self) {
        self.accumulated = 0;
    }

    /// Host view over the accumulated samples of every channel.
    pub fn device_buffer(&mut self) -> DeviceBuffer<'_> {
        let n = self.accumulated;
        DeviceBuffer::new(
            self.inputs.iter().map(|ch| &ch[..n]),
            self.outputs.iter_mut().map(|ch| &mut ch[..n]),
            n,
        )
    }

    /// Accumulated samples of one input channel.
    pub fn input(&self, channel: usize) -> Option<&[f32]> {
        self.inputs.get(channel).map(|ch| &ch[..self.accumulated])
    }
}
