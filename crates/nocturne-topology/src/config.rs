//! Topology configuration: room names and access roster.

use nocturne_platform::{GroupId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Names and flags describing a session's room layout.
///
/// Read once at startup. The public room set is fixed for the lifetime
/// of a session; private rooms are derived per participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Name of the singleton public gathering room.
    pub lobby: String,

    /// The fixed set of public rooms (not counting the lobby).
    pub public_rooms: Vec<String>,

    /// Prefix for deterministically named private rooms. The owner's
    /// stable identity is appended, so the room can be rediscovered
    /// after a restart without any persistent storage.
    pub private_prefix: String,

    /// Whether `lock_rooms` actually locks during dusk/night. Locking
    /// requires the actor identities to hold permission-management
    /// rights, so it ships disabled.
    pub lock_for_night: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            lobby: "Lobby".to_string(),
            public_rooms: [
                "Ballroom",
                "Billiard Room",
                "Conservatory",
                "Dining Room",
                "Hall",
                "Kitchen",
                "Library",
                "Lounge",
                "Study",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            private_prefix: "_nocturne_private_".to_string(),
            lock_for_night: false,
        }
    }
}

impl TopologyConfig {
    /// Whether `name` is one of the public rooms (lobby excluded).
    pub fn is_public_room(&self, name: &str) -> bool {
        self.public_rooms.iter().any(|r| r == name)
    }

    /// The deterministic private-room name for a participant.
    pub fn private_room_name(&self, participant: ParticipantId) -> String {
        format!("{}{}", self.private_prefix, participant.0)
    }

    /// The room names locked at dusk (`gather`): every public room, but
    /// not the lobby — that is where everyone is being gathered.
    pub fn dusk_lock_set(&self) -> Vec<String> {
        self.public_rooms.clone()
    }

    /// The room names locked at night / unlocked at day: the public
    /// rooms plus the lobby.
    pub fn night_lock_set(&self) -> Vec<String> {
        let mut names = self.public_rooms.clone();
        names.push(self.lobby.clone());
        names
    }
}

/// The identities granted elevated access on every room the topology
/// creates: the moderator group and each actor identity's own member ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRoster {
    /// The active moderator (storyteller) permission group.
    pub moderator_group: GroupId,
    /// Member IDs of the actor identities, primary first. Every actor
    /// needs full access so deputies can see and move participants.
    pub actors: Vec<ParticipantId>,
}
