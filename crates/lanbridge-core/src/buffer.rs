//! Channel buffers handed to the host's audio callback.
//!
//! [`DeviceBuffer`] is a borrowed view over the bridge's accumulation arrays.
//! It is rebuilt for every host callback, so it stores channel slices in
//! fixed-size stack arrays and never touches the heap.
//!
//! # Example
//!
//! ```ignore
//! fn io_callback(&mut self, buffer: &mut DeviceBuffer) {
//!     for (input, output) in buffer.zip_channels() {
//!         output.copy_from_slice(input);
//!     }
//! }
//! ```

use crate::types::MAX_CHANNELS;

/// Input and output channels for one host callback.
///
/// # Lifetime
///
/// The `'a` lifetime ties the view to the bridge's buffer pool. It is only
/// valid for the duration of a single callback.
///
/// # Channel Layout
///
/// Inputs correspond to the transport's activated receive channels and
/// outputs to its activated transmit channels, both starting at index 0.
/// The bridge never activates more than [`MAX_CHANNELS`] per direction.
pub struct DeviceBuffer<'a> {
    inputs: [Option<&'a [f32]>; MAX_CHANNELS],
    outputs: [Option<&'a mut [f32]>; MAX_CHANNELS],
    num_input_channels: usize,
    num_output_channels: usize,
    num_samples: usize,
}

impl<'a> DeviceBuffer<'a> {
    /// Create a view from channel slices.
    ///
    /// `num_samples` is clamped to the shortest supplied channel so that
    /// every accessor can slice without bounds failures.
    #[inline]
    pub fn new(
        inputs: impl IntoIterator<Item = &'a [f32]>,
        outputs: impl IntoIterator<Item = &'a mut [f32]>,
        num_samples: usize,
    ) -> Self {
        let mut num_samples = num_samples;

        let mut input_arr: [Option<&'a [f32]>; MAX_CHANNELS] = [None; MAX_CHANNELS];
        let mut num_input_channels = 0;
        for (i, slice) in inputs.into_iter().take(MAX_CHANNELS).enumerate() {
            num_samples = num_samples.min(slice.len());
            input_arr[i] = Some(slice);
            num_input_channels = i + 1;
        }

        // &mut slices are not Copy
        let mut output_arr: [Option<&'a mut [f32]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_output_channels = 0;
        for (i, slice) in outputs.into_iter().take(MAX_CHANNELS).enumerate() {
            num_samples = num_samples.min(slice.len());
            output_arr[i] = Some(slice);
            num_output_channels = i + 1;
        }

        Self {
            inputs: input_arr,
            outputs: output_arr,
            num_input_channels,
            num_output_channels,
            num_samples,
        }
    }

    /// Number of frames in this callback.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of input channels.
    #[inline]
    pub fn num_input_channels(&self) -> usize {
        self.num_input_channels
    }

    /// Number of output channels.
    #[inline]
    pub fn num_output_channels(&self) -> usize {
        self.num_output_channels
    }

    /// Get an input channel by index.
    ///
    /// Returns an empty slice if the channel doesn't exist.
    #[inline]
    pub fn input(&self, channel: usize) -> &[f32] {
        self.inputs
            .get(channel)
            .and_then(|opt| opt.as_ref())
            .map(|ch| &ch[..self.num_samples])
            .unwrap_or(&[])
    }

    /// Get a mutable output channel by index.
    ///
    /// Returns `None` if the channel doesn't exist.
    #[inline]
    pub fn output(&mut self, channel: usize) -> Option<&mut [f32]> {
        let n = self.num_samples;
        self.outputs
            .get_mut(channel)
            .and_then(|opt| opt.as_mut())
            .map(|ch| &mut ch[..n])
    }

    /// Iterate over all input channels.
    #[inline]
    pub fn inputs(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let n = self.num_samples;
        self.inputs[..self.num_input_channels]
            .iter()
            .filter_map(move |opt| opt.as_ref().map(|ch| &ch[..n]))
    }

    /// Iterate over all output channels mutably.
    #[inline]
    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + use<'_, 'a> {
        let n = self.num_samples;
        self.outputs[..self.num_output_channels]
            .iter_mut()
            .filter_map(move |opt| opt.as_mut().map(|ch| &mut ch[..n]))
    }

    /// Iterate over paired (input, output) channels.
    ///
    /// Only yields channels that exist on both sides.
    #[inline]
    pub fn zip_channels(&mut self) -> impl Iterator<Item = (&[f32], &mut [f32])> + use<'_, 'a> {
        let n = self.num_samples;
        let num_pairs = self.num_input_channels.min(self.num_output_channels);
        self.inputs[..num_pairs]
            .iter()
            .zip(self.outputs[..num_pairs].iter_mut())
            .filter_map(move |(i_opt, o_opt)| match (i_opt.as_ref(), o_opt.as_mut()) {
                (Some(i), Some(o)) => Some((&i[..n], &mut o[..n])),
                _ => None,
            })
    }

    /// Clear all output channels to silence.
    pub fn clear_outputs(&mut self) {
        for output in self.outputs_mut() {
            output.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_counts_and_length() {
        let left = [0.1f32, 0.2, 0.3, 0.4];
        let right = [0.5f32, 0.6, 0.7, 0.8];
        let mut out = vec![0.0f32; 4];

        let buffer = DeviceBuffer::new(
            [&left[..], &right[..]],
            [out.as_mut_slice()],
            3,
        );

        assert_eq!(buffer.num_input_channels(), 2);
        assert_eq!(buffer.num_output_channels(), 1);
        assert_eq!(buffer.num_samples(), 3);
        assert_eq!(buffer.input(1), &[0.5, 0.6, 0.7]);
        assert!(buffer.input(5).is_empty());
    }

    #[test]
    fn test_num_samples_clamped_to_shortest_channel() {
        let short = [1.0f32; 2];
        let buffer = DeviceBuffer::new([&short[..]], std::iter::empty(), 128);
        assert_eq!(buffer.num_samples(), 2);
    }

    #[test]
    fn test_zip_and_clear() {
        let input = [0.25f32; 4];
        let mut out_a = vec![1.0f32; 4];
        let mut out_b = vec![1.0f32; 4];

        {
            let mut buffer = DeviceBuffer::new(
                [&input[..]],
                [out_a.as_mut_slice(), out_b.as_mut_slice()],
                4,
            );
            buffer.clear_outputs();
            for (i, o) in buffer.zip_channels() {
                o.copy_from_slice(i);
            }
            assert!(buffer.output(2).is_none());
        }

        assert_eq!(out_a, vec![0.25; 4]);
        assert_eq!(out_b, vec![0.0; 4]);
    }
}
