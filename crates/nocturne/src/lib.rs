//! # Nocturne
//!
//! Room and session orchestration core for running social-deduction
//! games (Blood on the Clocktower and friends) over a real-time voice
//! platform.
//!
//! Nocturne manages the shared lifecycle: a fixed set of public voice
//! rooms plus one private room per participant, a phase state machine
//! (gather at dusk, disperse at night, regather at day), and a pool of
//! authenticated identities that spreads rate-limited participant moves
//! across connections.
//!
//! The platform transport itself is not included — embedders implement
//! [`PlatformConnection`] over their platform SDK and feed its event
//! streams into an [`Orchestrator`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use nocturne::{Orchestrator, AccessRoster};
//!
//! let orchestrator = Orchestrator::builder(primary, roster)
//!     .deputies(deputies)
//!     .build();
//!
//! // From the platform event loop:
//! // orchestrator.handle_presence(update).await?;
//! // orchestrator.handle_marker(container, channel, marker, who).await?;
//! ```

mod error;
mod orchestrator;
mod telemetry;

pub use error::NocturneError;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use telemetry::init_tracing;

pub use nocturne_actors::{ActorPoolHandle, spawn_pool};
pub use nocturne_platform::{
    ChannelId, ContainerId, GroupId, MessageId, ParticipantId,
    PlatformConnection, PlatformError, PresenceUpdate, RoomId, RoomRecord,
    RoomRef,
};
pub use nocturne_session::{Phase, Session, SessionConfig, SessionRegistry};
pub use nocturne_topology::{AccessRoster, TopologyConfig};
