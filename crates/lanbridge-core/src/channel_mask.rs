//! Channel bit-sets exposed to the host.

use std::fmt;

/// Maximum number of channels a [`ChannelMask`] can describe.
pub const MAX_MASK_CHANNELS: usize = 64;

/// Bit-set over channel indices.
///
/// Bit `n` set means channel `n` is active. Masks derived from the
/// transport's activated channel counts are always contiguous from bit 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(u64);

impl ChannelMask {
    /// Mask with no channels set.
    pub const EMPTY: Self = Self(0);

    /// Create a mask from raw bits.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Create a mask with channels `0..count` set.
    ///
    /// Counts above [`MAX_MASK_CHANNELS`] saturate.
    pub const fn contiguous(count: usize) -> Self {
        if count >= MAX_MASK_CHANNELS {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    /// Raw bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns true if channel `index` is set.
    pub const fn contains(self, index: usize) -> bool {
        index < MAX_MASK_CHANNELS && (self.0 >> index) & 1 == 1
    }

    /// Set channel `index`. Indices beyond the mask width are ignored.
    pub fn set(&mut self, index: usize) {
        if index < MAX_MASK_CHANNELS {
            self.0 |= 1 << index;
        }
    }

    /// Number of channels set.
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns true if no channel is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Index of the highest set channel, if any.
    pub const fn highest(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(MAX_MASK_CHANNELS - 1 - self.0.leading_zeros() as usize)
        }
    }

    /// Iterate over the indices of set channels in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_MASK_CHANNELS).filter(move |&i| self.contains(i))
    }
}

impl fmt::Debug for ChannelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelMask({:#b})", self.0)
    }
}

impl FromIterator<usize> for ChannelMask {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut mask = Self::EMPTY;
        for index in iter {
            mask.set(index);
        }
        mask
    }
}
