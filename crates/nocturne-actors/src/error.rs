//! Error types for the actor pool.

use nocturne_platform::PlatformError;

/// Errors that can occur when routing an operation through the pool.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// The pool actor is gone (its command channel closed).
    #[error("actor pool unavailable")]
    Unavailable,

    /// The routed identity's platform operation failed (participant
    /// left, permission revoked mid-flight, rate limit). Surfaced as-is;
    /// the pool never retries through a different identity, which would
    /// risk a silent double-move.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
