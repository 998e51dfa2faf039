//! Permission overwrites: declarative per-entity room access.
//!
//! A [`PermissionOverwriteSet`] is pure data — a list of `(grantee,
//! policy)` pairs applied atomically when a room or channel is created.
//! Individual entries can later be rewritten with
//! [`PlatformConnection::set_room_access`] (that is how locking works).
//!
//! [`PlatformConnection::set_room_access`]: crate::PlatformConnection::set_room_access

use serde::{Deserialize, Serialize};

use crate::{GroupId, ParticipantId};

// ---------------------------------------------------------------------------
// Grantee
// ---------------------------------------------------------------------------

/// Who an access policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Grantee {
    /// The default access group — every member of the platform container.
    Everyone,
    /// A named permission group (e.g. the moderator role).
    Group {
        /// The group the policy applies to.
        group: GroupId,
    },
    /// A single member, by stable identity. Used for private-room owners
    /// and for the actor identities themselves.
    Member {
        /// The member the policy applies to.
        participant: ParticipantId,
    },
}

// ---------------------------------------------------------------------------
// AccessPolicy
// ---------------------------------------------------------------------------

/// The rights granted (or denied) to one grantee.
///
/// Each field is tri-state: `Some(true)` grants, `Some(false)` denies,
/// `None` leaves the platform default untouched. Only the fields the
/// orchestrator actually writes are modeled: visibility, connect, and
/// moderate (the right to move other members).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct AccessPolicy {
    /// Whether the room/channel is visible at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<bool>,
    /// Whether the grantee may connect (join the room).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect: Option<bool>,
    /// Whether the grantee may move other members.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderate: Option<bool>,
}

impl AccessPolicy {
    /// View + connect + moderate. Granted to the moderator group and to
    /// every actor identity on every room.
    pub const FULL: Self = Self {
        view: Some(true),
        connect: Some(true),
        moderate: Some(true),
    };

    /// View + connect, no moderation. Granted to a private room's owner.
    pub const MEMBER: Self = Self {
        view: Some(true),
        connect: Some(true),
        moderate: None,
    };

    /// Invisible and unjoinable. Applied to the default group on private
    /// rooms and on the control channel.
    pub const HIDDEN: Self = Self {
        view: Some(false),
        connect: Some(false),
        moderate: None,
    };

    /// A connect-only write, used when locking/unlocking a room. Leaves
    /// visibility and moderation untouched so a lock never hides a room.
    pub fn connect_only(allowed: bool) -> Self {
        Self {
            view: None,
            connect: Some(allowed),
            moderate: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PermissionOverwriteSet
// ---------------------------------------------------------------------------

/// An ordered set of `(grantee, policy)` pairs applied to a room or
/// channel as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwriteSet {
    entries: Vec<(Grantee, AccessPolicy)>,
}

impl PermissionOverwriteSet {
    /// An empty overwrite set (platform defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, builder-style.
    pub fn with(mut self, grantee: Grantee, policy: AccessPolicy) -> Self {
        self.entries.push((grantee, policy));
        self
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(Grantee, AccessPolicy)> {
        self.entries.iter()
    }

    /// Returns the policy for a grantee, if one was set.
    pub fn policy_for(&self, grantee: Grantee) -> Option<AccessPolicy> {
        self.entries
            .iter()
            .find(|(g, _)| *g == grantee)
            .map(|(_, p)| *p)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_set_builder_preserves_order() {
        let set = PermissionOverwriteSet::new()
            .with(Grantee::Everyone, AccessPolicy::HIDDEN)
            .with(
                Grantee::Member {
                    participant: ParticipantId(7),
                },
                AccessPolicy::MEMBER,
            );

        assert_eq!(set.len(), 2);
        let first = set.iter().next().unwrap();
        assert_eq!(first.0, Grantee::Everyone);
    }

    #[test]
    fn test_policy_for_finds_matching_grantee() {
        let set = PermissionOverwriteSet::new()
            .with(Grantee::Group { group: GroupId(1) }, AccessPolicy::FULL);

        assert_eq!(
            set.policy_for(Grantee::Group { group: GroupId(1) }),
            Some(AccessPolicy::FULL)
        );
        assert_eq!(set.policy_for(Grantee::Everyone), None);
    }

    #[test]
    fn test_connect_only_leaves_other_fields_unset() {
        let lock = AccessPolicy::connect_only(false);
        assert_eq!(lock.connect, Some(false));
        assert_eq!(lock.view, None);
        assert_eq!(lock.moderate, None);
    }

    #[test]
    fn test_grantee_json_shape() {
        // `#[serde(tag = "kind")]` produces internally tagged JSON.
        let json =
            serde_json::to_value(Grantee::Group { group: GroupId(9) })
                .unwrap();
        assert_eq!(json["kind"], "Group");
        assert_eq!(json["group"], 9);

        let json = serde_json::to_value(Grantee::Everyone).unwrap();
        assert_eq!(json["kind"], "Everyone");
    }

    #[test]
    fn test_access_policy_skips_unset_fields_in_json() {
        let json =
            serde_json::to_value(AccessPolicy::connect_only(true)).unwrap();
        assert_eq!(json["connect"], true);
        assert!(json.get("view").is_none());
        assert!(json.get("moderate").is_none());
    }

    #[test]
    fn test_overwrite_set_round_trip() {
        let set = PermissionOverwriteSet::new()
            .with(Grantee::Everyone, AccessPolicy::HIDDEN)
            .with(Grantee::Group { group: GroupId(2) }, AccessPolicy::FULL);
        let bytes = serde_json::to_vec(&set).unwrap();
        let decoded: PermissionOverwriteSet =
            serde_json::from_slice(&bytes).unwrap();
        assert_eq!(set, decoded);
    }
}
