//! Platform boundary types for Nocturne.
//!
//! This crate defines the vocabulary shared by every layer — identity
//! newtypes, permission overwrites, presence events — and the
//! [`PlatformConnection`] trait that abstracts over the real-time
//! communication platform. The orchestrator never talks to the platform
//! directly; it only talks to a `PlatformConnection`.
//!
//! # Key types
//!
//! - [`PlatformConnection`] — one authenticated actor identity
//! - [`PermissionOverwriteSet`] — declarative per-entity room access
//! - [`PresenceUpdate`] — a room-membership-changed notification
//! - [`PlatformError`] — what the transport layer can report

mod connection;
mod error;
mod overwrites;
mod types;

pub use connection::PlatformConnection;
pub use error::PlatformError;
pub use overwrites::{AccessPolicy, Grantee, PermissionOverwriteSet};
pub use types::{
    ChannelId, ContainerId, GroupId, MessageId, ParticipantId,
    PresenceUpdate, RoomId, RoomRecord, RoomRef,
};
