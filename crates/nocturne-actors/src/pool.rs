//! The pool actor: per-identity presence caches and routed operations.

use std::collections::HashMap;
use std::sync::Arc;

use nocturne_platform::{ParticipantId, PlatformConnection, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::ActorError;

/// Default command channel size for the pool actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Commands sent to the pool actor through its channel.
enum PoolCommand {
    /// One identity's event listener observed a participant. Updates
    /// only that identity's cache — fire-and-forget, no reply.
    RecordPresence {
        ordinal: usize,
        participant: ParticipantId,
        room: Option<RoomId>,
    },

    /// Move a participant through a routed identity.
    Move {
        participant: ParticipantId,
        room: RoomId,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },

    /// Mute and move a participant in one edit, through a routed identity.
    MoveAndMute {
        participant: ParticipantId,
        room: RoomId,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },

    /// Shut the pool down.
    Shutdown,
}

/// Handle to the running pool actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper. Event listeners and sessions each hold one.
#[derive(Clone)]
pub struct ActorPoolHandle {
    sender: mpsc::Sender<PoolCommand>,
}

impl ActorPoolHandle {
    /// Records that identity `ordinal` observed `participant` in `room`
    /// (or nowhere, for a leave). This is how a deputy becomes eligible
    /// to act on a participant: routing only delegates to a deputy that
    /// has independently confirmed visibility.
    pub async fn record_presence(
        &self,
        ordinal: usize,
        participant: ParticipantId,
        room: Option<RoomId>,
    ) -> Result<(), ActorError> {
        self.sender
            .send(PoolCommand::RecordPresence {
                ordinal,
                participant,
                room,
            })
            .await
            .map_err(|_| ActorError::Unavailable)
    }

    /// Moves a participant into a room through a routed identity.
    pub async fn routed_move(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> Result<(), ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(PoolCommand::Move {
                participant,
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ActorError::Unavailable)?;
        reply_rx.await.map_err(|_| ActorError::Unavailable)?
    }

    /// Mutes and moves a participant in one combined edit, through a
    /// routed identity. Mute-then-move keeps a participant from being
    /// heard mid-transfer.
    pub async fn routed_move_and_mute(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> Result<(), ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(PoolCommand::MoveAndMute {
                participant,
                room,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ActorError::Unavailable)?;
        reply_rx.await.map_err(|_| ActorError::Unavailable)?
    }

    /// Tells the pool actor to stop.
    pub async fn shutdown(&self) -> Result<(), ActorError> {
        self.sender
            .send(PoolCommand::Shutdown)
            .await
            .map_err(|_| ActorError::Unavailable)
    }
}

/// The pool actor state. Runs inside a Tokio task.
struct PoolActor<P: PlatformConnection> {
    /// Authenticated connections, ordinal 0 = primary, 1..N = deputies.
    connections: Vec<Arc<P>>,
    /// Per-identity presence caches, indexed by ordinal. Each cache is
    /// populated exclusively from that identity's own event stream and
    /// may be empty or stale for participants it has not yet observed.
    caches: Vec<HashMap<ParticipantId, Option<RoomId>>>,
    /// Shared round-robin cursor, advanced once per routed operation
    /// regardless of which participant is acted on.
    cursor: usize,
    receiver: mpsc::Receiver<PoolCommand>,
}

impl<P: PlatformConnection> PoolActor<P> {
    async fn run(mut self) {
        tracing::info!(
            identities = self.connections.len(),
            "actor pool started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                PoolCommand::RecordPresence {
                    ordinal,
                    participant,
                    room,
                } => {
                    self.record_presence(ordinal, participant, room);
                }
                PoolCommand::Move {
                    participant,
                    room,
                    reply,
                } => {
                    let ordinal = self.route(participant);
                    let result = self.connections[ordinal]
                        .move_participant(participant, room)
                        .await
                        .map_err(ActorError::from);
                    let _ = reply.send(result);
                }
                PoolCommand::MoveAndMute {
                    participant,
                    room,
                    reply,
                } => {
                    let ordinal = self.route(participant);
                    let result = self.connections[ordinal]
                        .move_and_mute(participant, room)
                        .await
                        .map_err(ActorError::from);
                    let _ = reply.send(result);
                }
                PoolCommand::Shutdown => {
                    tracing::info!("actor pool shutting down");
                    break;
                }
            }
        }

        tracing::info!("actor pool stopped");
    }

    fn record_presence(
        &mut self,
        ordinal: usize,
        participant: ParticipantId,
        room: Option<RoomId>,
    ) {
        let Some(cache) = self.caches.get_mut(ordinal) else {
            tracing::warn!(
                ordinal,
                %participant,
                "presence record for unknown identity ordinal"
            );
            return;
        };
        cache.insert(participant, room);
        tracing::trace!(ordinal, %participant, ?room, "presence recorded");
    }

    /// Picks the identity for the next routed operation.
    ///
    /// The cursor advances by one (mod pool size) on every call, so over
    /// many calls the load spreads roughly evenly across identities. If
    /// the candidate is a deputy that has never observed the participant,
    /// the operation falls back to the always-authoritative primary —
    /// the cursor still advances, so one unready deputy doesn't skew the
    /// distribution for other participants.
    fn route(&mut self, participant: ParticipantId) -> usize {
        self.cursor = (self.cursor + 1) % self.connections.len();
        let candidate = self.cursor;
        if candidate != 0 && self.caches[candidate].contains_key(&participant)
        {
            tracing::debug!(ordinal = candidate, %participant, "routed to deputy");
            candidate
        } else {
            if candidate != 0 {
                tracing::debug!(
                    ordinal = candidate,
                    %participant,
                    "deputy has not seen participant; falling back to primary"
                );
            }
            0
        }
    }
}

/// Spawns the pool actor task and returns a handle to communicate with it.
///
/// `primary` is the authoritative identity; `deputies` may be empty, in
/// which case every routed operation goes through the primary.
pub fn spawn_pool<P: PlatformConnection>(
    primary: Arc<P>,
    deputies: Vec<Arc<P>>,
) -> ActorPoolHandle {
    let mut connections = vec![primary];
    connections.extend(deputies);

    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = PoolActor {
        caches: vec![HashMap::new(); connections.len()],
        connections,
        cursor: 0,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    ActorPoolHandle { sender: tx }
}
