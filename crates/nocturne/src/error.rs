//! Unified error type for the Nocturne orchestrator.

use nocturne_actors::ActorError;
use nocturne_platform::PlatformError;
use nocturne_session::SessionError;
use nocturne_topology::TopologyError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `nocturne` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NocturneError {
    /// A platform-level error (API call failed, rate limited).
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A topology-level error (room missing, creation failed).
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// An actor-pool error (pool unavailable).
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// A session-level error (unauthorized, inconsistent state).
    #[error(transparent)]
    Session(#[from] SessionError),
}
