//! Error types for the topology layer.

use nocturne_platform::PlatformError;

/// Errors that can occur during topology operations.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// No room with this name exists under the container. Callers must
    /// handle absence — e.g. the lobby before setup has run.
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    /// The underlying platform operation failed. Not retried here;
    /// retries, if any, belong to the transport layer.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
