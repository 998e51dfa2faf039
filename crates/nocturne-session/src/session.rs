//! The session: one running game bound to one container.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use nocturne_actors::ActorPoolHandle;
use nocturne_platform::{
    ChannelId, ContainerId, GroupId, ParticipantId, PlatformConnection,
    RoomId,
};
use nocturne_topology::RoomTopology;
use tokio::sync::Mutex;

use crate::{Phase, SessionConfig, SessionError};

/// How close together a phase lock and a privacy lock have to fire to
/// be logged as a conflict. Both write the same permission field with
/// no coordination; the last writer wins.
const LOCK_CONFLICT_WINDOW: Duration = Duration::from_secs(2);

/// Timestamps of the two uncoordinated lock writers, kept only so the
/// conflicting case shows up in the logs.
#[derive(Debug, Default, Clone, Copy)]
struct LockTrace {
    phase: Option<Instant>,
    privacy: Option<Instant>,
}

/// One running game session.
///
/// Holds the current phase, the container's room topology, a handle to
/// the actor pool, and the primary connection (used directly for mutes
/// and messaging — only moves are routed through the pool).
///
/// Phase operations are plain `async fn`s that suspend on their hold
/// delays; the trigger front end spawns them so its event processing is
/// never blocked. Operations within one call execute in their documented
/// order; two different triggers fired close together interleave.
pub struct Session<P: PlatformConnection> {
    container: ContainerId,
    control: ChannelId,
    created_at: Instant,
    config: SessionConfig,
    phase: StdMutex<Phase>,
    topology: Mutex<RoomTopology<P>>,
    pool: ActorPoolHandle,
    conn: Arc<P>,
    moderator_group: GroupId,
    locks: StdMutex<LockTrace>,
}

impl<P: PlatformConnection> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("container", &self.container)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl<P: PlatformConnection> Session<P> {
    /// Binds a session to a container. The topology should already be
    /// populated (setup) or refreshed (reconstruction) by the caller.
    pub fn new(
        conn: Arc<P>,
        pool: ActorPoolHandle,
        topology: RoomTopology<P>,
        control: ChannelId,
        config: SessionConfig,
        moderator_group: GroupId,
    ) -> Self {
        Self {
            container: topology.container(),
            control,
            created_at: Instant::now(),
            config,
            phase: StdMutex::new(Phase::Idle),
            topology: Mutex::new(topology),
            pool,
            conn,
            moderator_group,
            locks: StdMutex::new(LockTrace::default()),
        }
    }

    /// The container this session is bound to.
    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// The control channel status notices go to.
    pub fn control_channel(&self) -> ChannelId {
        self.control
    }

    /// When this session object was created (not the game itself — a
    /// reconstructed session gets a fresh timestamp).
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
        tracing::debug!(container = %self.container, %phase, "phase changed");
    }

    /// Whether `name` is one of this session's public rooms.
    pub async fn is_public_room(&self, name: &str) -> bool {
        self.topology.lock().await.config().is_public_room(name)
    }

    /// Returns the participant's private room, creating it on first
    /// sighting so nightfall never has to burst-create rooms.
    pub async fn ensure_private_room(
        &self,
        participant: ParticipantId,
    ) -> Result<RoomId, SessionError> {
        let room = self
            .topology
            .lock()
            .await
            .ensure_private_room(participant)
            .await?;
        Ok(room)
    }

    // -----------------------------------------------------------------
    // Phase transitions
    // -----------------------------------------------------------------

    /// Gathers all stragglers back into the lobby.
    ///
    /// Good for breaking up private discussions and getting people to
    /// vote. Stragglers are mute-moved (so nobody babbles something out
    /// mid-transfer), held muted briefly, then unmuted. The public rooms
    /// are locked afterwards whether or not there were stragglers.
    pub async fn gather(&self) -> Result<(), SessionError> {
        self.set_phase(Phase::Gathering);
        let result = self.run_gather().await;
        self.set_phase(Phase::Idle);
        result
    }

    async fn run_gather(&self) -> Result<(), SessionError> {
        self.notice("Gathering up stragglers").await?;

        let (lobby, stragglers, lock_set) = {
            let mut topo = self.topology.lock().await;
            let occupancy = topo.occupancy().await?;
            let lobby = topo.lobby()?;
            let stragglers: Vec<ParticipantId> = occupancy
                .iter()
                .filter(|(rec, _)| topo.config().is_public_room(&rec.name))
                .flat_map(|(_, occupants)| occupants.iter().copied())
                .collect();
            (lobby, stragglers, topo.config().dusk_lock_set())
        };

        if stragglers.is_empty() {
            self.notice("No stragglers found").await?;
        } else {
            let mut gathered = Vec::with_capacity(stragglers.len());
            let mut failures = 0usize;
            for &participant in &stragglers {
                match self.pool.routed_move_and_mute(participant, lobby).await
                {
                    Ok(()) => gathered.push(participant),
                    Err(e) => {
                        failures += 1;
                        tracing::warn!(
                            container = %self.container,
                            %participant,
                            error = %e,
                            "failed to gather straggler"
                        );
                    }
                }
            }
            self.notice(&with_failures(
                format!("{} stragglers gathered ...", gathered.len()),
                failures,
            ))
            .await?;

            tokio::time::sleep(self.config.gather_hold).await;

            for &participant in &gathered {
                if let Err(e) = self.conn.set_mute(participant, false).await {
                    tracing::warn!(
                        container = %self.container,
                        %participant,
                        error = %e,
                        "failed to unmute gathered straggler"
                    );
                }
            }
            self.notice("... and unmuted").await?;
        }

        self.phase_lock_rooms(&lock_set, true).await
    }

    /// Moves every participant into their own private room and locks
    /// the public rooms and the lobby.
    pub async fn night(&self) -> Result<(), SessionError> {
        self.set_phase(Phase::Night);
        let result = self.run_night().await;
        self.set_phase(Phase::Idle);
        result
    }

    async fn run_night(&self) -> Result<(), SessionError> {
        self.notice("Moving players into private rooms for night time")
            .await?;

        let (participants, lock_set) = {
            let mut topo = self.topology.lock().await;
            let occupancy = topo.occupancy().await?;
            let participants: Vec<ParticipantId> = occupancy
                .iter()
                .flat_map(|(_, occupants)| occupants.iter().copied())
                .collect();
            (participants, topo.config().night_lock_set())
        };

        let mut failures = 0usize;
        for participant in participants {
            // The room normally exists already (created on first
            // sighting); this is the fallback path for anyone who
            // slipped past the presence listeners.
            let moved = match self.ensure_private_room(participant).await {
                Ok(room) => self.pool.routed_move(participant, room).await,
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        container = %self.container,
                        %participant,
                        error = %e,
                        "failed to provision private room"
                    );
                    continue;
                }
            };
            if let Err(e) = moved {
                failures += 1;
                tracing::warn!(
                    container = %self.container,
                    %participant,
                    error = %e,
                    "failed to move participant to private room"
                );
            }
        }

        self.phase_lock_rooms(&lock_set, true).await?;
        self.notice(&with_failures("Done".to_string(), failures))
            .await
    }

    /// Moves everyone back into the lobby and unlocks all rooms.
    pub async fn day(&self) -> Result<(), SessionError> {
        self.set_phase(Phase::Day);
        let result = self.run_day().await;
        self.set_phase(Phase::Idle);
        result
    }

    async fn run_day(&self) -> Result<(), SessionError> {
        self.notice("Moving players back into the lobby and unlocking rooms")
            .await?;

        let (lobby, participants, lock_set) = {
            let mut topo = self.topology.lock().await;
            let occupancy = topo.occupancy().await?;
            let lobby = topo.lobby()?;
            let participants: Vec<ParticipantId> = occupancy
                .iter()
                .flat_map(|(_, occupants)| occupants.iter().copied())
                .collect();
            (lobby, participants, topo.config().night_lock_set())
        };

        let mut failures = 0usize;
        for participant in participants {
            if let Err(e) = self.pool.routed_move(participant, lobby).await {
                failures += 1;
                tracing::warn!(
                    container = %self.container,
                    %participant,
                    error = %e,
                    "failed to move participant to lobby"
                );
            }
        }

        self.phase_lock_rooms(&lock_set, false).await?;
        self.notice(&with_failures("Done".to_string(), failures))
            .await
    }

    /// Mutes every non-moderator in the lobby for the configured hold,
    /// then unmutes them. Moves nobody and never touches the phase.
    pub async fn shush(&self) -> Result<(), SessionError> {
        let lobby = self.topology.lock().await.lobby()?;
        let occupants = self.conn.room_occupants(lobby).await?;
        let moderators =
            self.conn.group_members(self.moderator_group).await?;

        let mut muted = Vec::with_capacity(occupants.len());
        for participant in occupants {
            if moderators.contains(&participant) {
                continue;
            }
            match self.conn.set_mute(participant, true).await {
                Ok(()) => muted.push(participant),
                Err(e) => {
                    tracing::warn!(
                        container = %self.container,
                        %participant,
                        error = %e,
                        "failed to mute lobby participant"
                    );
                }
            }
        }

        self.notice(&format!(
            "Muted lobby for {} seconds ...",
            self.config.shush_hold.as_secs()
        ))
        .await?;

        tokio::time::sleep(self.config.shush_hold).await;

        for participant in muted {
            if let Err(e) = self.conn.set_mute(participant, false).await {
                tracing::warn!(
                    container = %self.container,
                    %participant,
                    error = %e,
                    "failed to unmute lobby participant"
                );
            }
        }
        self.notice("... and unmuted").await
    }

    // -----------------------------------------------------------------
    // Privacy lock (per-room, independent of phase)
    // -----------------------------------------------------------------

    /// Arms the privacy lock for a public room a participant just
    /// entered: after the configured delay, if the room still has any
    /// occupant, it locks against the default group so a third party
    /// can't drop into a private conversation.
    ///
    /// Fire-and-forget; the occupancy check happens at fire time, so a
    /// room that empties before the delay elapses stays unlocked.
    pub fn arm_privacy_lock(self: &Arc<Self>, room: RoomId) {
        if !self.config.lock_for_privacy {
            return;
        }
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(session.config.privacy_arm_delay).await;
            match session.conn.room_occupants(room).await {
                Ok(occupants) if !occupants.is_empty() => {
                    session.note_privacy_lock(room);
                    let topo = session.topology.lock().await;
                    if let Err(e) = topo.set_room_locked(room, true).await {
                        tracing::warn!(
                            %room,
                            error = %e,
                            "failed to apply privacy lock"
                        );
                    }
                }
                Ok(_) => {
                    tracing::trace!(%room, "room emptied before privacy lock fired");
                }
                Err(e) => {
                    tracing::warn!(
                        %room,
                        error = %e,
                        "occupancy check for privacy lock failed"
                    );
                }
            }
        });
    }

    /// Immediately unlocks a public room that has just become empty.
    /// A stale privacy-lock task may still fire afterwards; the next
    /// emptying unlocks again (last observed state wins).
    pub async fn unlock_if_empty(
        &self,
        room: RoomId,
    ) -> Result<(), SessionError> {
        let occupants = self.conn.room_occupants(room).await?;
        if occupants.is_empty() {
            let topo = self.topology.lock().await;
            topo.set_room_locked(room, false).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Notices & cleanup
    // -----------------------------------------------------------------

    /// Posts a transient status notice to the control channel and
    /// schedules its deletion so the control surface stays uncluttered.
    pub async fn notice(&self, text: &str) -> Result<(), SessionError> {
        let message = self.conn.send_message(self.control, text).await?;
        let conn = Arc::clone(&self.conn);
        let channel = self.control;
        let display = self.config.notice_display;
        tokio::spawn(async move {
            tokio::time::sleep(display).await;
            if let Err(e) = conn.delete_message(channel, message).await {
                tracing::debug!(
                    %channel,
                    %message,
                    error = %e,
                    "failed to delete notice"
                );
            }
        });
        Ok(())
    }

    /// Releases everything this session owns: every room, every text
    /// channel, and finally the container itself.
    pub async fn cleanup(&self) -> Result<(), SessionError> {
        // Plain message, not a notice — the channel is about to go away.
        let _ = self
            .conn
            .send_message(self.control, "Cleaning the game up")
            .await;

        self.topology.lock().await.delete_all_rooms().await?;

        let channels = self.conn.list_text_channels(self.container).await?;
        for (channel, name) in channels {
            self.conn.delete_text_channel(channel).await?;
            tracing::debug!(%channel, %name, "text channel deleted");
        }

        self.conn.delete_container(self.container).await?;
        tracing::info!(container = %self.container, "session cleaned up");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Lock bookkeeping
    // -----------------------------------------------------------------

    /// Applies a phase-driven lock/unlock and records the write so a
    /// near-simultaneous privacy lock shows up in the logs.
    async fn phase_lock_rooms(
        &self,
        names: &[String],
        locked: bool,
    ) -> Result<(), SessionError> {
        let topo = self.topology.lock().await;
        topo.lock_rooms(names, locked).await?;
        if locked && topo.config().lock_for_night {
            let mut trace = self.locks.lock().expect("lock trace poisoned");
            trace.phase = Some(Instant::now());
            if let Some(privacy) = trace.privacy {
                if privacy.elapsed() < LOCK_CONFLICT_WINDOW {
                    tracing::warn!(
                        container = %self.container,
                        "phase lock fired within {:?} of a privacy lock; last writer wins",
                        LOCK_CONFLICT_WINDOW
                    );
                }
            }
        }
        Ok(())
    }

    fn note_privacy_lock(&self, room: RoomId) {
        let mut trace = self.locks.lock().expect("lock trace poisoned");
        trace.privacy = Some(Instant::now());
        if let Some(phase) = trace.phase {
            if phase.elapsed() < LOCK_CONFLICT_WINDOW {
                tracing::warn!(
                    container = %self.container,
                    %room,
                    "privacy lock fired within {:?} of a phase lock; last writer wins",
                    LOCK_CONFLICT_WINDOW
                );
            }
        }
    }
}

/// Appends a failure count to a batch summary when anything went wrong.
fn with_failures(summary: String, failures: usize) -> String {
    if failures == 0 {
        summary
    } else {
        format!("{summary} ({failures} failed)")
    }
}
