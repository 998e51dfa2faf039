//! The room topology: name → room mapping with on-demand creation.

use std::collections::HashMap;
use std::sync::Arc;

use nocturne_platform::{
    AccessPolicy, ContainerId, Grantee, ParticipantId,
    PermissionOverwriteSet, PlatformConnection, RoomId, RoomRecord,
};

use crate::{AccessRoster, TopologyConfig, TopologyError};

/// Owns the set of rooms under one session container.
///
/// The local name → ID map is a cache over the platform's live room
/// listing; [`refresh`](Self::refresh) rebuilds it from the platform,
/// which is also how the topology is reconstructed after a restart —
/// private rooms are named deterministically, so a listing is all the
/// persistence this system needs.
///
/// All creation goes through look-up-before-create: room creation is the
/// platform's most rate-limited operation, and bulk-creating private
/// rooms at nightfall caused failures in the past. Private rooms are
/// instead created the first time their owner is sighted inside the
/// container, then reused every night.
pub struct RoomTopology<P: PlatformConnection> {
    container: ContainerId,
    conn: Arc<P>,
    config: TopologyConfig,
    roster: AccessRoster,
    /// Known rooms by name. Names are unique within a container.
    rooms: HashMap<String, RoomId>,
}

impl<P: PlatformConnection> RoomTopology<P> {
    /// Creates a topology for a container. The map starts empty; call
    /// [`refresh`](Self::refresh) or [`ensure_public_rooms`](Self::ensure_public_rooms)
    /// to populate it.
    pub fn new(
        conn: Arc<P>,
        container: ContainerId,
        config: TopologyConfig,
        roster: AccessRoster,
    ) -> Self {
        Self {
            container,
            conn,
            config,
            roster,
            rooms: HashMap::new(),
        }
    }

    /// The container this topology manages.
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// The topology configuration.
    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Rebuilds the name → ID map from the platform's live listing.
    pub async fn refresh(&mut self) -> Result<(), TopologyError> {
        let listing = self.conn.list_rooms(self.container).await?;
        self.rooms = listing
            .into_iter()
            .map(|RoomRecord { id, name }| (name, id))
            .collect();
        tracing::debug!(
            container = %self.container,
            rooms = self.rooms.len(),
            "topology refreshed"
        );
        Ok(())
    }

    /// Looks up a known room by name.
    pub fn lookup(&self, name: &str) -> Result<RoomId, TopologyError> {
        self.rooms
            .get(name)
            .copied()
            .ok_or_else(|| TopologyError::RoomNotFound(name.to_string()))
    }

    /// The lobby, if it exists yet.
    pub fn lobby(&self) -> Result<RoomId, TopologyError> {
        self.rooms
            .get(&self.config.lobby)
            .copied()
            .ok_or_else(|| TopologyError::RoomNotFound(self.config.lobby.clone()))
    }

    /// Idempotently creates the lobby and the fixed public-room set.
    ///
    /// Safe to call when some or all rooms already exist: the live
    /// listing is consulted first and only missing rooms are created.
    pub async fn ensure_public_rooms(&mut self) -> Result<(), TopologyError> {
        self.refresh().await?;

        let overwrites = self.public_overwrites();
        let mut names = vec![self.config.lobby.clone()];
        names.extend(self.config.public_rooms.iter().cloned());

        for name in names {
            if self.rooms.contains_key(&name) {
                continue;
            }
            let id = self
                .conn
                .create_room(self.container, &name, &overwrites)
                .await?;
            tracing::info!(container = %self.container, room = %name, %id, "public room created");
            self.rooms.insert(name, id);
        }
        Ok(())
    }

    /// Returns the participant's private room, creating it on first call.
    ///
    /// Lookup is by the deterministic name derived from the stable
    /// identity, so repeated calls (and calls after a restart) find the
    /// existing room and perform at most one creation.
    pub async fn ensure_private_room(
        &mut self,
        participant: ParticipantId,
    ) -> Result<RoomId, TopologyError> {
        let name = self.config.private_room_name(participant);

        if let Some(id) = self.rooms.get(&name) {
            return Ok(*id);
        }
        // Cache miss: re-list before creating, in case the room exists
        // from a previous process life.
        self.refresh().await?;
        if let Some(id) = self.rooms.get(&name) {
            return Ok(*id);
        }

        let overwrites = self.private_overwrites(participant);
        let id = self
            .conn
            .create_room(self.container, &name, &overwrites)
            .await?;
        tracing::info!(
            container = %self.container,
            %participant,
            %id,
            "private room created"
        );
        self.rooms.insert(name, id);
        Ok(id)
    }

    /// Sets or clears the default-group connect permission on the named
    /// rooms.
    ///
    /// Locking is a no-op when night-locking is disabled; unlocking
    /// always executes, so a day transition clears any leftover locks
    /// even after the flag was turned off. Names with no matching room
    /// are skipped.
    pub async fn lock_rooms(
        &self,
        names: &[String],
        locked: bool,
    ) -> Result<(), TopologyError> {
        if locked && !self.config.lock_for_night {
            tracing::debug!(
                container = %self.container,
                "night-locking disabled; skipping lock"
            );
            return Ok(());
        }
        for name in names {
            let Some(&room) = self.rooms.get(name) else {
                continue;
            };
            self.set_room_locked(room, locked).await?;
        }
        Ok(())
    }

    /// Writes the default-group connect permission on one room.
    ///
    /// Shared by phase locking and the privacy-lock timer; both write
    /// this same field, and the last writer wins.
    pub async fn set_room_locked(
        &self,
        room: RoomId,
        locked: bool,
    ) -> Result<(), TopologyError> {
        self.conn
            .set_room_access(
                room,
                Grantee::Everyone,
                AccessPolicy::connect_only(!locked),
            )
            .await?;
        tracing::debug!(%room, locked, "room lock updated");
        Ok(())
    }

    /// Snapshot of every known room with its current occupants.
    ///
    /// Refreshes the listing first so participants in rooms created by
    /// other identities are not missed.
    pub async fn occupancy(
        &mut self,
    ) -> Result<Vec<(RoomRecord, Vec<ParticipantId>)>, TopologyError> {
        self.refresh().await?;
        let mut out = Vec::with_capacity(self.rooms.len());
        for (name, &id) in &self.rooms {
            let occupants = self.conn.room_occupants(id).await?;
            out.push((
                RoomRecord {
                    id,
                    name: name.clone(),
                },
                occupants,
            ));
        }
        Ok(out)
    }

    /// Deletes every room under the container (session cleanup).
    pub async fn delete_all_rooms(&mut self) -> Result<(), TopologyError> {
        self.refresh().await?;
        for (name, &id) in &self.rooms {
            self.conn.delete_room(id).await?;
            tracing::debug!(room = %name, %id, "room deleted");
        }
        self.rooms.clear();
        Ok(())
    }

    /// Overwrites for public rooms: moderators and every actor identity
    /// get full access; the default group keeps its baseline visibility.
    fn public_overwrites(&self) -> PermissionOverwriteSet {
        let mut set = PermissionOverwriteSet::new().with(
            Grantee::Group {
                group: self.roster.moderator_group,
            },
            AccessPolicy::FULL,
        );
        for &actor in &self.roster.actors {
            set = set.with(
                Grantee::Member { participant: actor },
                AccessPolicy::FULL,
            );
        }
        set
    }

    /// Overwrites for a private room: invisible to everyone except its
    /// owner, the moderators, and the actor identities.
    fn private_overwrites(
        &self,
        owner: ParticipantId,
    ) -> PermissionOverwriteSet {
        let mut set = PermissionOverwriteSet::new()
            .with(Grantee::Everyone, AccessPolicy::HIDDEN)
            .with(
                Grantee::Group {
                    group: self.roster.moderator_group,
                },
                AccessPolicy::FULL,
            )
            .with(
                Grantee::Member { participant: owner },
                AccessPolicy::MEMBER,
            );
        for &actor in &self.roster.actors {
            set = set.with(
                Grantee::Member { participant: actor },
                AccessPolicy::FULL,
            );
        }
        set
    }
}
