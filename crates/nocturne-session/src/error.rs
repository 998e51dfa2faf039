//! Error types for the session layer.

use nocturne_actors::ActorError;
use nocturne_platform::{ParticipantId, PlatformError};
use nocturne_topology::TopologyError;

/// Errors that can occur during session operations.
///
/// Batch operations (`gather`, `night`, `day`) do NOT surface
/// per-participant failures through this type — those are logged,
/// counted, and summarized in the status notice so one failed move
/// never aborts the rest of the batch. What does surface here are the
/// structural failures: missing lobby, missing control channel, a
/// notice that couldn't be sent.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The invoking participant lacks the moderator permission group.
    /// Checked before any state-mutating platform call.
    #[error("participant {0} is not a moderator")]
    Unauthorized(ParticipantId),

    /// A session was looked up for a container whose expected anchors
    /// (control channel, rooms) no longer exist and could not be
    /// substituted.
    #[error("inconsistent session state: {0}")]
    InconsistentState(String),

    /// A topology operation failed (room missing, creation failed).
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A routed actor-pool operation failed structurally.
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// A direct platform operation failed (messaging, mute, listing).
    #[error(transparent)]
    Platform(#[from] PlatformError),
}
