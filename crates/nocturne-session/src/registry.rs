//! Container → session map with setup, teardown, and lazy
//! reconstruction after a restart.

use std::collections::HashMap;
use std::sync::Arc;

use nocturne_actors::ActorPoolHandle;
use nocturne_platform::{
    AccessPolicy, ContainerId, Grantee, ParticipantId,
    PermissionOverwriteSet, PlatformConnection,
};
use nocturne_topology::{AccessRoster, RoomTopology, TopologyConfig};
use tokio::sync::Mutex;

use crate::config::{
    CONTROL_CHANNEL, DUSK_MARKER, GAME_CHAT_CHANNEL, GREETING,
    MORNING_MARKER, NIGHT_MARKER, SHUSH_MARKER,
};
use crate::{Session, SessionConfig, SessionError};

/// Maps container identities to live sessions.
///
/// The registry is the only way sessions come into existence:
/// [`create`](Self::create) provisions a fresh game under a container,
/// and [`resolve`](Self::resolve) returns the live session for a
/// container — reconstructing it from the platform's live state when
/// the process has restarted since the game was set up. Everything a
/// reconstruction needs (room names, the control channel) is recoverable
/// by listing, so no database is involved.
pub struct SessionRegistry<P: PlatformConnection> {
    conn: Arc<P>,
    pool: ActorPoolHandle,
    session_config: SessionConfig,
    topology_config: TopologyConfig,
    roster: AccessRoster,
    /// Held across the whole of `create` so two concurrent creations
    /// for the same container cannot both run setup.
    sessions: Mutex<HashMap<ContainerId, Arc<Session<P>>>>,
}

impl<P: PlatformConnection> SessionRegistry<P> {
    pub fn new(
        conn: Arc<P>,
        pool: ActorPoolHandle,
        session_config: SessionConfig,
        topology_config: TopologyConfig,
        roster: AccessRoster,
    ) -> Self {
        Self {
            conn,
            pool,
            session_config,
            topology_config,
            roster,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Rejects anyone outside the moderator group before a
    /// state-mutating operation runs.
    pub async fn authorize(
        &self,
        invoker: ParticipantId,
    ) -> Result<(), SessionError> {
        let moderators = self
            .conn
            .group_members(self.roster.moderator_group)
            .await?;
        if moderators.contains(&invoker) {
            Ok(())
        } else {
            tracing::warn!(%invoker, "rejected non-moderator invocation");
            Err(SessionError::Unauthorized(invoker))
        }
    }

    /// Sets up a new game under `container` and registers its session.
    ///
    /// Creates the moderator control channel (greeting plus the phase
    /// trigger markers), the public game-chat channel, and the fixed
    /// public-room set. Idempotent per container: a second call returns
    /// the already-registered session without re-running setup.
    pub async fn create(
        &self,
        container: ContainerId,
        invoker: ParticipantId,
    ) -> Result<Arc<Session<P>>, SessionError> {
        self.authorize(invoker).await?;

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&container) {
            tracing::debug!(%container, "session already exists; setup skipped");
            return Ok(Arc::clone(session));
        }

        tracing::info!(%container, %invoker, "setting up new game");

        // The creator holds the active-moderator role for this game;
        // it can be handed on later with `transfer_moderator`.
        self.conn
            .add_group_member(self.roster.moderator_group, invoker)
            .await?;

        let control = self
            .conn
            .create_text_channel(
                container,
                CONTROL_CHANNEL,
                &self.control_overwrites(),
            )
            .await?;
        let greeting = self.conn.send_message(control, GREETING).await?;
        for marker in [DUSK_MARKER, NIGHT_MARKER, MORNING_MARKER, SHUSH_MARKER]
        {
            self.conn.add_marker(control, greeting, marker).await?;
        }

        self.conn
            .create_text_channel(
                container,
                GAME_CHAT_CHANNEL,
                &PermissionOverwriteSet::new(),
            )
            .await?;

        let mut topology = RoomTopology::new(
            Arc::clone(&self.conn),
            container,
            self.topology_config.clone(),
            self.roster.clone(),
        );
        topology.ensure_public_rooms().await?;

        let session = Arc::new(Session::new(
            Arc::clone(&self.conn),
            self.pool.clone(),
            topology,
            control,
            self.session_config.clone(),
            self.roster.moderator_group,
        ));
        sessions.insert(container, Arc::clone(&session));
        Ok(session)
    }

    /// Returns the live session for a container, reconstructing it from
    /// platform state if this process has never seen the container.
    ///
    /// Repeated calls return the same session object, so phase state and
    /// in-flight timers survive across lookups.
    ///
    /// Reconstruction requires a positive anchor: the control channel,
    /// or the lobby room for games set up before the control channel was
    /// introduced. A container with neither is not a game container, no
    /// matter what text channels it happens to hold; presence events
    /// arrive for every container the identity can see, and provisioning
    /// rooms in a foreign container must never happen.
    pub async fn resolve(
        &self,
        container: ContainerId,
    ) -> Result<Arc<Session<P>>, SessionError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&container) {
            return Ok(Arc::clone(session));
        }

        tracing::info!(%container, "reconstructing session from platform state");

        let mut topology = RoomTopology::new(
            Arc::clone(&self.conn),
            container,
            self.topology_config.clone(),
            self.roster.clone(),
        );
        topology.refresh().await?;

        let channels = self.conn.list_text_channels(container).await?;
        let control = match channels
            .iter()
            .find(|(_, name)| name == CONTROL_CHANNEL)
        {
            Some(&(id, _)) => id,
            None => {
                // No control channel: only trust the container if the
                // game's lobby room exists, then fall back to whatever
                // text channel it has.
                if topology.lobby().is_err() {
                    return Err(SessionError::InconsistentState(format!(
                        "container {container} has no control channel or lobby"
                    )));
                }
                let &(id, ref name) = channels.first().ok_or_else(|| {
                    SessionError::InconsistentState(format!(
                        "container {container} has no text channels"
                    ))
                })?;
                tracing::warn!(
                    %container,
                    channel = %name,
                    "no control channel found; using first text channel"
                );
                id
            }
        };

        let session = Arc::new(Session::new(
            Arc::clone(&self.conn),
            self.pool.clone(),
            topology,
            control,
            self.session_config.clone(),
            self.roster.moderator_group,
        ));
        sessions.insert(container, Arc::clone(&session));
        Ok(session)
    }

    /// Hands the active-moderator role to another participant: every
    /// current holder loses it, the new moderator gains it.
    pub async fn transfer_moderator(
        &self,
        invoker: ParticipantId,
        to: ParticipantId,
    ) -> Result<(), SessionError> {
        self.authorize(invoker).await?;

        let group = self.roster.moderator_group;
        let current = self.conn.group_members(group).await?;
        for &member in &current {
            if member != to {
                self.conn.remove_group_member(group, member).await?;
            }
        }
        if !current.contains(&to) {
            self.conn.add_group_member(group, to).await?;
        }
        tracing::info!(%invoker, %to, "moderator role transferred");
        Ok(())
    }

    /// Tears the game down: deletes every room and channel, then the
    /// container, and forgets the session.
    pub async fn remove(
        &self,
        container: ContainerId,
        invoker: ParticipantId,
    ) -> Result<(), SessionError> {
        self.authorize(invoker).await?;

        let session = self.resolve(container).await?;
        session.cleanup().await?;
        self.sessions.lock().await.remove(&container);
        tracing::info!(%container, "session removed");
        Ok(())
    }

    /// Overwrites for the control channel: hidden from the default
    /// group, visible to moderators and the actor identities.
    fn control_overwrites(&self) -> PermissionOverwriteSet {
        let mut set = PermissionOverwriteSet::new()
            .with(Grantee::Everyone, AccessPolicy::HIDDEN)
            .with(
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
}
