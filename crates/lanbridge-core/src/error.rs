//! Error types for the bridge and its transport.

use thiserror::Error;

/// Faults raised by the network-audio engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The engine or its instance could not be created.
    #[error("transport creation failed: {0}")]
    CreateFailed(String),

    /// The instance refused to start.
    #[error("transport start failed: {0}")]
    StartFailed(String),

    /// The instance refused to stop.
    #[error("transport stop failed: {0}")]
    StopFailed(String),

    /// The operation requires a stopped instance.
    #[error("transport instance is not stopped")]
    NotStopped,
}

/// Errors surfaced by the device bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A transport fault during setup.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Operation not valid in the current device state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The activation watcher thread could not be spawned.
    #[error("failed to spawn activation watcher: {0}")]
    WatcherSpawn(#[source] std::io::Error),

    /// The activation watcher stopped without completing setup.
    #[error("activation watcher is not running")]
    WatcherDied,
}

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
