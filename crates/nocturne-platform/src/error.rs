//! Error type for platform operations.

/// Errors that the platform transport layer can report.
///
/// The orchestrator never retries these internally — a failure is
/// surfaced to the caller, which decides whether to continue a batch or
/// abort (see the session layer's per-participant aggregation).
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A referenced entity (room, channel, container, group) does not
    /// exist on the platform.
    #[error("not found: {0}")]
    NotFound(String),

    /// The identity performing the operation was rate limited.
    /// Privileged per-participant operations are throttled per identity,
    /// which is the whole reason the actor pool exists.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The identity lacks permission for this operation (e.g. permission
    /// revoked mid-flight, or a deputy acting on a member it can no
    /// longer see).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The operation failed for any other transport-level reason
    /// (participant disconnected mid-move, network error, …).
    #[error("platform operation failed: {0}")]
    OperationFailed(String),

    /// The identity's connection to the platform is gone.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
