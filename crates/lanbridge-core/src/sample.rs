//! Sample format conversion for network audio receive buffers.
//!
//! The transport stores each 24-bit sample in a 4-byte container laid out as
//! `[ignored, low, mid, high]`. The payload is sign-extended into an `i32` and
//! normalized by `2^23 - 1`, so the most negative code point lands slightly
//! below -1.0. There is no clamping.
//!
//! # Real-Time Safety
//!
//! Every function here is pure: no allocation, no locking, no logging. They
//! are called from the transport's audio thread once per sample and channel.

/// Size in bytes of one sample container in a transport channel buffer.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Normalization divisor for 24-bit signed samples (`2^23 - 1`).
pub const SCALE_24: f32 = 8_388_607.0;

/// Largest value representable in 24 bits.
pub const MAX_24: i32 = 8_388_607;

/// Smallest value representable in 24 bits.
pub const MIN_24: i32 = -8_388_608;

/// Convert one 24-bit-in-32-bit container to a normalized `f32`.
///
/// Byte 0 is discarded. Bytes 1..4 carry the payload, least significant
/// first, and the top bit of byte 3 is the sign. Placing the container into
/// an `i32` and shifting right by 8 performs the sign extension.
///
/// # Example
///
/// ```
/// use lanbridge_core::sample::convert_24_in_32;
///
/// assert_eq!(convert_24_in_32([0x00, 0xff, 0xff, 0x7f]), 1.0);
/// assert_eq!(convert_24_in_32([0x00, 0x00, 0x00, 0x00]), 0.0);
/// ```
#[inline(always)]
pub fn convert_24_in_32(bytes: [u8; BYTES_PER_SAMPLE]) -> f32 {
    let value = i32::from_le_bytes(bytes) >> 8;
    value as f32 / SCALE_24
}

/// Read and convert the sample at `index` from a raw channel buffer.
///
/// Returns `None` if the buffer is too short to hold the requested sample.
#[inline]
pub fn read_sample(channel: &[u8], index: usize) -> Option<f32> {
    let start = index.checked_mul(BYTES_PER_SAMPLE)?;
    let end = start.checked_add(BYTES_PER_SAMPLE)?;
    let bytes: [u8; BYTES_PER_SAMPLE] = channel.get(start..end)?.try_into().ok()?;
    Some(convert_24_in_32(bytes))
}

/// Pack a 24-bit signed value into the transport's container layout.
///
/// Values outside the 24-bit range are truncated to their low 24 bits.
/// This is the inverse of [`convert_24_in_32`] and is used by in-process
/// transports that synthesize receive data.
#[inline]
pub fn pack_24_in_32(value: i32) -> [u8; BYTES_PER_SAMPLE] {
    (value << 8).to_le_bytes()
}
