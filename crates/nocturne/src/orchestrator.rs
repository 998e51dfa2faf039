//! The orchestrator: event front end over the session layer.
//!
//! Binaries wire their platform SDK's event streams into this type:
//! marker (reaction) events go to [`Orchestrator::handle_marker`], the
//! primary identity's presence events to
//! [`Orchestrator::handle_presence`], and each deputy's presence events
//! to [`Orchestrator::record_deputy_presence`]. Phase transitions are
//! spawned onto their own tasks so event processing never stalls behind
//! a hold timer.

use std::sync::Arc;

use nocturne_actors::{ActorPoolHandle, spawn_pool};
use nocturne_platform::{
    ChannelId, ContainerId, ParticipantId, PlatformConnection,
    PresenceUpdate, RoomRef,
};
use nocturne_session::{
    DUSK_MARKER, MORNING_MARKER, NIGHT_MARKER, SHUSH_MARKER, Session,
    SessionConfig, SessionError, SessionRegistry,
};
use nocturne_topology::{AccessRoster, TopologyConfig};

use crate::NocturneError;

/// Builder for wiring up an [`Orchestrator`].
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::builder(primary, roster)
///     .deputies(deputies)
///     .session_config(config)
///     .build();
/// ```
pub struct OrchestratorBuilder<P: PlatformConnection> {
    primary: Arc<P>,
    deputies: Vec<Arc<P>>,
    session_config: SessionConfig,
    topology_config: TopologyConfig,
    roster: AccessRoster,
}

impl<P: PlatformConnection> OrchestratorBuilder<P> {
    /// Creates a builder with default timing and topology settings.
    pub fn new(primary: Arc<P>, roster: AccessRoster) -> Self {
        Self {
            primary,
            deputies: Vec::new(),
            session_config: SessionConfig::default(),
            topology_config: TopologyConfig::default(),
            roster,
        }
    }

    /// Adds deputy identities for routed operations.
    pub fn deputies(mut self, deputies: Vec<Arc<P>>) -> Self {
        self.deputies = deputies;
        self
    }

    /// Overrides the session timing configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Overrides the room-set and locking configuration.
    pub fn topology_config(mut self, config: TopologyConfig) -> Self {
        self.topology_config = config;
        self
    }

    /// Spawns the actor pool and assembles the orchestrator.
    pub fn build(self) -> Orchestrator<P> {
        let pool = spawn_pool(Arc::clone(&self.primary), self.deputies);
        let registry = Arc::new(SessionRegistry::new(
            Arc::clone(&self.primary),
            pool.clone(),
            self.session_config,
            self.topology_config,
            self.roster,
        ));
        Orchestrator {
            pool,
            registry,
        }
    }
}

/// Routes platform events to sessions and the actor pool.
pub struct Orchestrator<P: PlatformConnection> {
    pool: ActorPoolHandle,
    registry: Arc<SessionRegistry<P>>,
}

impl<P: PlatformConnection> Orchestrator<P> {
    /// Creates a new builder.
    pub fn builder(
        primary: Arc<P>,
        roster: AccessRoster,
    ) -> OrchestratorBuilder<P> {
        OrchestratorBuilder::new(primary, roster)
    }

    /// The session registry, for setup/teardown front ends.
    pub fn registry(&self) -> &Arc<SessionRegistry<P>> {
        &self.registry
    }

    /// Sets up a new game under `container`, invoked by a moderator.
    pub async fn setup_game(
        &self,
        container: ContainerId,
        invoker: ParticipantId,
    ) -> Result<(), NocturneError> {
        self.registry.create(container, invoker).await?;
        Ok(())
    }

    /// Tears a game down completely.
    pub async fn teardown_game(
        &self,
        container: ContainerId,
        invoker: ParticipantId,
    ) -> Result<(), NocturneError> {
        self.registry.remove(container, invoker).await?;
        Ok(())
    }

    /// Handles a marker (reaction) added to a message.
    ///
    /// Markers on channels other than the session's control channel are
    /// ignored, as are markers with no phase mapping. A recognized
    /// marker from a non-moderator is rejected. The phase operation
    /// itself runs on its own task; this returns as soon as it is
    /// spawned.
    pub async fn handle_marker(
        &self,
        container: ContainerId,
        channel: ChannelId,
        marker: &str,
        invoker: ParticipantId,
    ) -> Result<(), NocturneError> {
        let session = self.registry.resolve(container).await?;
        if channel != session.control_channel() {
            tracing::trace!(%container, %channel, "marker outside control channel ignored");
            return Ok(());
        }

        self.registry.authorize(invoker).await?;

        match marker {
            DUSK_MARKER => {
                spawn_phase_op(&session, "gather", |s| async move {
                    s.gather().await
                });
            }
            NIGHT_MARKER => {
                spawn_phase_op(&session, "night", |s| async move {
                    s.night().await
                });
            }
            MORNING_MARKER => {
                spawn_phase_op(&session, "day", |s| async move {
                    s.day().await
                });
            }
            SHUSH_MARKER => {
                spawn_phase_op(&session, "shush", |s| async move {
                    s.shush().await
                });
            }
            other => {
                tracing::trace!(%container, marker = other, "unmapped marker ignored");
            }
        }
        Ok(())
    }

    /// Handles a presence update from the primary identity's stream.
    ///
    /// Feeds the primary's pool cache, then — for genuine room changes
    /// only — provisions the participant's private room, arms the
    /// privacy lock on an entered public room, and unlocks a public
    /// room left empty. Updates for containers this registry has no
    /// game in are ignored.
    pub async fn handle_presence(
        &self,
        update: PresenceUpdate,
    ) -> Result<(), NocturneError> {
        self.pool
            .record_presence(
                0,
                update.participant,
                update.current.as_ref().map(|r| r.room),
            )
            .await?;

        if !update.room_changed() {
            return Ok(());
        }

        if let Some(current) = &update.current {
            self.on_room_entered(update.participant, current).await?;
        }
        if let Some(previous) = &update.previous {
            self.on_room_left(previous).await?;
        }
        Ok(())
    }

    /// Records a presence update observed by deputy `ordinal` (1-based
    /// within the deputies, i.e. pool ordinal). Deputies only feed their
    /// own cache — they never provision rooms or touch locks.
    pub async fn record_deputy_presence(
        &self,
        ordinal: usize,
        update: PresenceUpdate,
    ) -> Result<(), NocturneError> {
        self.pool
            .record_presence(
                ordinal,
                update.participant,
                update.current.as_ref().map(|r| r.room),
            )
            .await?;
        Ok(())
    }

    async fn on_room_entered(
        &self,
        participant: ParticipantId,
        entered: &RoomRef,
    ) -> Result<(), NocturneError> {
        let Some(session) = self.session_for(entered.container).await? else {
            return Ok(());
        };

        // First sighting inside a game container provisions the private
        // room, so nightfall never has to burst-create rooms.
        if let Err(e) = session.ensure_private_room(participant).await {
            tracing::warn!(
                %participant,
                error = %e,
                "private room provisioning failed"
            );
        }

        if session.is_public_room(&entered.name).await {
            session.arm_privacy_lock(entered.room);
        }
        Ok(())
    }

    async fn on_room_left(
        &self,
        left: &RoomRef,
    ) -> Result<(), NocturneError> {
        let Some(session) = self.session_for(left.container).await? else {
            return Ok(());
        };
        if session.is_public_room(&left.name).await {
            session.unlock_if_empty(left.room).await?;
        }
        Ok(())
    }

    /// Resolves the session for a container, treating a container with
    /// no recoverable game state as "not ours" rather than an error —
    /// presence events arrive for every container the identity can see.
    async fn session_for(
        &self,
        container: ContainerId,
    ) -> Result<Option<Arc<Session<P>>>, NocturneError> {
        match self.registry.resolve(container).await {
            Ok(session) => Ok(Some(session)),
            Err(SessionError::InconsistentState(_)) => {
                tracing::trace!(%container, "presence in non-game container ignored");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Spawns a phase operation on its own task and logs its outcome.
fn spawn_phase_op<P, F, Fut>(session: &Arc<Session<P>>, name: &'static str, op: F)
where
    P: PlatformConnection,
    F: FnOnce(Arc<Session<P>>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), SessionError>> + Send + 'static,
{
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let container = session.container();
        if let Err(e) = op(session).await {
            tracing::error!(%container, op = name, error = %e, "phase operation failed");
        }
    });
}
