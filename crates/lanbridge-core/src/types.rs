//! Common limits and constants used throughout lanbridge.

/// Maximum number of channels the bridge forwards per direction.
///
/// Equal to the width of a [`ChannelMask`](crate::ChannelMask), so the
/// active masks and the host callback view always agree. Activated channel
/// counts above this are clamped before registration and pool allocation.
pub const MAX_CHANNELS: usize = crate::channel_mask::MAX_MASK_CHANNELS;

/// Extra samples allocated per channel beyond the nominal accumulation size.
///
/// Absorbs transports that deliver slightly more than the host buffer size
/// implies before the host drains the pool.
pub const BUFFER_SAFETY_MARGIN: usize = 32;

/// The only sample rate the bridge reports to the host.
pub const SUPPORTED_SAMPLE_RATE: f64 = 48_000.0;

/// The only buffer size the bridge reports to the host.
pub const SUPPORTED_BUFFER_SIZE: usize = 128;

/// Latency the transport session reports to the transfer handler.
pub const TRANSFER_LATENCY_SAMPLES: u32 = 480;
