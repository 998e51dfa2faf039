//! Identity newtypes and presence events.
//!
//! Every platform entity is addressed by an opaque numeric ID wrapped in
//! a newtype so a `RoomId` can never be passed where a `ParticipantId`
//! is expected. All of them serialize transparently as plain numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The top-level grouping object (e.g. a channel category) that scopes
/// one session's rooms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A voice/audio room under a container.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// A text channel under a container (e.g. the session's control channel).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// A message posted to a text channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// A platform member. Participants, moderators, and the actor identities
/// themselves are all participants from the platform's point of view.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A named permission group granting elevated rights (e.g. the moderator
/// role). Group *creation* is one-time bootstrap and happens outside this
/// system; we only reference groups that already exist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room listings and presence
// ---------------------------------------------------------------------------

/// One room as returned by [`PlatformConnection::list_rooms`].
///
/// Names are the lookup key within a container (unique per container),
/// so a listing is enough to reconstruct the topology after a restart.
///
/// [`PlatformConnection::list_rooms`]: crate::PlatformConnection::list_rooms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// The room's platform ID.
    pub id: RoomId,
    /// The room's name, unique within its container.
    pub name: String,
}

/// A reference to a room as it appears in a presence event: the event
/// carries enough context (container + name) to scope it to a session
/// without another platform round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    /// The container the room lives under.
    pub container: ContainerId,
    /// The room itself.
    pub room: RoomId,
    /// The room's name within the container.
    pub name: String,
}

/// A room-membership-changed notification from one identity's event
/// stream. `previous`/`current` are `None` when the participant was not
/// in (or left) any room visible to that identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    /// Who moved.
    pub participant: ParticipantId,
    /// The room they were in before, if any.
    pub previous: Option<RoomRef>,
    /// The room they are in now, if any.
    pub current: Option<RoomRef>,
}

impl PresenceUpdate {
    /// Whether this update represents an actual room change.
    ///
    /// The platform also delivers presence events for mute/deafen state
    /// changes within the same room; those must be ignored or every
    /// mute during `gather` would re-trigger the room listeners.
    pub fn room_changed(&self) -> bool {
        let prev = self.previous.as_ref().map(|r| r.room);
        let curr = self.current.as_ref().map(|r| r.room);
        prev != curr
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        // `#[serde(transparent)]` means RoomId(42) → `42`, not `{"0":42}`.
        assert_eq!(serde_json::to_string(&RoomId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&ParticipantId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&ContainerId(1)).unwrap(), "1");
    }

    #[test]
    fn test_participant_id_deserializes_from_plain_number() {
        let pid: ParticipantId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, ParticipantId(42));
    }

    #[test]
    fn test_id_display_prefixes() {
        assert_eq!(ContainerId(1).to_string(), "C-1");
        assert_eq!(RoomId(2).to_string(), "R-2");
        assert_eq!(ChannelId(3).to_string(), "T-3");
        assert_eq!(MessageId(4).to_string(), "M-4");
        assert_eq!(ParticipantId(5).to_string(), "P-5");
        assert_eq!(GroupId(6).to_string(), "G-6");
    }

    fn room_ref(room: u64) -> RoomRef {
        RoomRef {
            container: ContainerId(1),
            room: RoomId(room),
            name: format!("room-{room}"),
        }
    }

    #[test]
    fn test_room_changed_detects_move_between_rooms() {
        let update = PresenceUpdate {
            participant: ParticipantId(1),
            previous: Some(room_ref(10)),
            current: Some(room_ref(11)),
        };
        assert!(update.room_changed());
    }

    #[test]
    fn test_room_changed_ignores_same_room_state_change() {
        // A mute toggle arrives as an update with identical rooms.
        let update = PresenceUpdate {
            participant: ParticipantId(1),
            previous: Some(room_ref(10)),
            current: Some(room_ref(10)),
        };
        assert!(!update.room_changed());
    }

    #[test]
    fn test_room_changed_detects_join_and_leave() {
        let join = PresenceUpdate {
            participant: ParticipantId(1),
            previous: None,
            current: Some(room_ref(10)),
        };
        assert!(join.room_changed());

        let leave = PresenceUpdate {
            participant: ParticipantId(1),
            previous: Some(room_ref(10)),
            current: None,
        };
        assert!(leave.room_changed());
    }
}
