//! End-to-end tests driving the orchestrator through platform events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nocturne::{
    AccessRoster, ChannelId, ContainerId, GroupId, MessageId, NocturneError,
    Orchestrator, ParticipantId, PlatformConnection, PlatformError,
    PresenceUpdate, RoomId, RoomRecord, RoomRef, SessionConfig,
    TopologyConfig,
};
use nocturne_platform::{AccessPolicy, Grantee, PermissionOverwriteSet};
use nocturne_session::SessionError;

// =========================================================================
// Mock platform shared by the primary and deputy identities.
// =========================================================================

#[derive(Default)]
struct MockState {
    next_id: u64,
    rooms: Vec<RoomRecord>,
    room_creations: u64,
    access_writes: Vec<(RoomId, Grantee, AccessPolicy)>,
    locations: HashMap<ParticipantId, RoomId>,
    moderators: Vec<ParticipantId>,
    channels: Vec<(ChannelId, String)>,
    messages: Vec<(MessageId, ChannelId, String)>,
}

#[derive(Default)]
struct MockPlatform {
    state: Mutex<MockState>,
}

impl MockPlatform {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn set_moderators(&self, who: &[ParticipantId]) {
        self.state.lock().unwrap().moderators = who.to_vec();
    }

    fn place(&self, participant: ParticipantId, room: RoomId) {
        self.state.lock().unwrap().locations.insert(participant, room);
    }

    fn location_of(&self, participant: ParticipantId) -> Option<RoomId> {
        self.state.lock().unwrap().locations.get(&participant).copied()
    }

    fn room_named(&self, name: &str) -> Option<RoomId> {
        self.state
            .lock()
            .unwrap()
            .rooms
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.id)
    }

    fn room_creations(&self) -> u64 {
        self.state.lock().unwrap().room_creations
    }

    fn seed_channel(&self, name: &str) -> ChannelId {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = ChannelId(s.next_id);
        s.channels.push((id, name.to_string()));
        id
    }

    fn control_channel(&self) -> ChannelId {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .find(|(_, name)| name == "control")
            .map(|(id, _)| *id)
            .expect("control channel not provisioned")
    }

    fn message_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .map(|(_, _, text)| text.clone())
            .collect()
    }

    fn lock_writes(&self) -> Vec<(RoomId, bool)> {
        self.state
            .lock()
            .unwrap()
            .access_writes
            .iter()
            .filter(|(_, grantee, _)| *grantee == Grantee::Everyone)
            .map(|(room, _, policy)| (*room, policy.connect == Some(false)))
            .collect()
    }
}

impl PlatformConnection for MockPlatform {
    async fn create_room(
        &self,
        _container: ContainerId,
        name: &str,
        _overwrites: &PermissionOverwriteSet,
    ) -> Result<RoomId, PlatformError> {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        s.room_creations += 1;
        let id = RoomId(s.next_id);
        s.rooms.push(RoomRecord {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn delete_room(&self, room: RoomId) -> Result<(), PlatformError> {
        let mut s = self.state.lock().unwrap();
        s.rooms.retain(|r| r.id != room);
        s.locations.retain(|_, &mut r| r != room);
        Ok(())
    }

    async fn list_rooms(
        &self,
        _container: ContainerId,
    ) -> Result<Vec<RoomRecord>, PlatformError> {
        Ok(self.state.lock().unwrap().rooms.clone())
    }

    async fn room_occupants(
        &self,
        room: RoomId,
    ) -> Result<Vec<ParticipantId>, PlatformError> {
        let s = self.state.lock().unwrap();
        Ok(s.locations
            .iter()
            .filter_map(|(&p, &r)| (r == room).then_some(p))
            .collect())
    }

    async fn set_room_access(
        &self,
        room: RoomId,
        grantee: Grantee,
        policy: AccessPolicy,
    ) -> Result<(), PlatformError> {
        self.state
            .lock()
            .unwrap()
            .access_writes
            .push((room, grantee, policy));
        Ok(())
    }

    async fn move_participant(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> Result<(), PlatformError> {
        self.state.lock().unwrap().locations.insert(participant, room);
        Ok(())
    }

    async fn set_mute(
        &self,
        _participant: ParticipantId,
        _muted: bool,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn move_and_mute(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> Result<(), PlatformError> {
        self.state.lock().unwrap().locations.insert(participant, room);
        Ok(())
    }

    async fn group_members(
        &self,
        _group: GroupId,
    ) -> Result<Vec<ParticipantId>, PlatformError> {
        Ok(self.state.lock().unwrap().moderators.clone())
    }

    async fn add_group_member(
        &self,
        _group: GroupId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError> {
        let mut s = self.state.lock().unwrap();
        if !s.moderators.contains(&participant) {
            s.moderators.push(participant);
        }
        Ok(())
    }

    async fn remove_group_member(
        &self,
        _group: GroupId,
        participant: ParticipantId,
    ) -> Result<(), PlatformError> {
        self.state
            .lock()
            .unwrap()
            .moderators
            .retain(|m| *m != participant);
        Ok(())
    }

    async fn create_text_channel(
        &self,
        _container: ContainerId,
        name: &str,
        _overwrites: &PermissionOverwriteSet,
    ) -> Result<ChannelId, PlatformError> {
        Ok(self.seed_channel(name))
    }

    async fn list_text_channels(
        &self,
        _container: ContainerId,
    ) -> Result<Vec<(ChannelId, String)>, PlatformError> {
        Ok(self.state.lock().unwrap().channels.clone())
    }

    async fn delete_text_channel(
        &self,
        channel: ChannelId,
    ) -> Result<(), PlatformError> {
        self.state
            .lock()
            .unwrap()
            .channels
            .retain(|(id, _)| *id != channel);
        Ok(())
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> Result<MessageId, PlatformError> {
        let mut s = self.state.lock().unwrap();
        s.next_id += 1;
        let id = MessageId(s.next_id);
        s.messages.push((id, channel, text.to_string()));
        Ok(id)
    }

    async fn delete_message(
        &self,
        _channel: ChannelId,
        _message: MessageId,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn add_marker(
        &self,
        _channel: ChannelId,
        _message: MessageId,
        _marker: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn delete_container(
        &self,
        _container: ContainerId,
    ) -> Result<(), PlatformError> {
        Ok(())
    }
}

// =========================================================================
// Helpers
// =========================================================================

const CONTAINER: ContainerId = ContainerId(100);
const MODERATORS: GroupId = GroupId(5);
const MODERATOR: ParticipantId = ParticipantId(50);
const X: ParticipantId = ParticipantId(1);
const Y: ParticipantId = ParticipantId(2);

fn orchestrator(
    platform: &Arc<MockPlatform>,
    deputies: usize,
    lock_for_privacy: bool,
) -> Orchestrator<MockPlatform> {
    platform.set_moderators(&[MODERATOR]);
    let roster = AccessRoster {
        moderator_group: MODERATORS,
        actors: vec![ParticipantId(900)],
    };
    Orchestrator::builder(Arc::clone(platform), roster)
        .deputies((0..deputies).map(|_| Arc::clone(platform)).collect())
        .session_config(SessionConfig {
            lock_for_privacy,
            ..SessionConfig::default()
        })
        .topology_config(TopologyConfig::default())
        .build()
}

fn room_ref(platform: &MockPlatform, name: &str) -> RoomRef {
    RoomRef {
        container: CONTAINER,
        room: platform.room_named(name).unwrap(),
        name: name.to_string(),
    }
}

fn join(platform: &MockPlatform, who: ParticipantId, name: &str) -> PresenceUpdate {
    PresenceUpdate {
        participant: who,
        previous: None,
        current: Some(room_ref(platform, name)),
    }
}

fn transfer(
    platform: &MockPlatform,
    who: ParticipantId,
    from: &str,
    to: &str,
) -> PresenceUpdate {
    PresenceUpdate {
        participant: who,
        previous: Some(room_ref(platform, from)),
        current: Some(room_ref(platform, to)),
    }
}

// =========================================================================
// Presence handling
// =========================================================================

#[tokio::test]
async fn test_presence_sighting_provisions_private_room() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let lobby = platform.room_named("Lobby").unwrap();
    platform.place(X, lobby);
    orch.handle_presence(join(&platform, X, "Lobby")).await.unwrap();

    assert!(platform.room_named("_nocturne_private_1").is_some());
}

#[tokio::test]
async fn test_presence_same_room_state_change_is_ignored() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();
    let creations = platform.room_creations();

    // A mute toggle: previous == current.
    let update = PresenceUpdate {
        participant: X,
        previous: Some(room_ref(&platform, "Lobby")),
        current: Some(room_ref(&platform, "Lobby")),
    };
    orch.handle_presence(update).await.unwrap();

    assert_eq!(platform.room_creations(), creations);
}

#[tokio::test]
async fn test_presence_in_non_game_container_is_ignored() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);

    // No game exists anywhere; the event must not error or create rooms.
    let update = PresenceUpdate {
        participant: X,
        previous: None,
        current: Some(RoomRef {
            container: ContainerId(999),
            room: RoomId(12345),
            name: "unrelated".to_string(),
        }),
    };
    orch.handle_presence(update).await.unwrap();

    assert_eq!(platform.room_creations(), 0);
}

#[tokio::test]
async fn test_presence_in_container_with_only_foreign_channels_is_ignored() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    // An unrelated container with an ordinary text channel but none of
    // the game's anchors (control channel, lobby room).
    platform.seed_channel("general");

    let update = PresenceUpdate {
        participant: X,
        previous: None,
        current: Some(RoomRef {
            container: ContainerId(999),
            room: RoomId(777),
            name: "unrelated".to_string(),
        }),
    };
    orch.handle_presence(update).await.unwrap();

    assert_eq!(
        platform.room_creations(),
        0,
        "no rooms may be provisioned in a foreign container"
    );
}

#[tokio::test]
async fn test_deputy_presence_never_provisions_rooms() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 1, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();
    let creations = platform.room_creations();

    orch.record_deputy_presence(1, join(&platform, X, "Lobby"))
        .await
        .unwrap();

    assert_eq!(platform.room_creations(), creations);
}

#[tokio::test(start_paused = true)]
async fn test_public_room_entry_arms_privacy_lock() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, true);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let hall = platform.room_named("Hall").unwrap();
    platform.place(X, hall);
    orch.handle_presence(join(&platform, X, "Hall")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;

    assert!(platform.lock_writes().contains(&(hall, true)));
}

#[tokio::test]
async fn test_leaving_public_room_empty_unlocks_it() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, true);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let hall = platform.room_named("Hall").unwrap();
    let lobby = platform.room_named("Lobby").unwrap();
    platform.place(X, lobby);
    orch.handle_presence(transfer(&platform, X, "Hall", "Lobby"))
        .await
        .unwrap();

    assert!(platform.lock_writes().contains(&(hall, false)));
}

// =========================================================================
// Markers
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dusk_marker_triggers_gather() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let hall = platform.room_named("Hall").unwrap();
    let lobby = platform.room_named("Lobby").unwrap();
    platform.place(X, hall);

    orch.handle_marker(CONTAINER, platform.control_channel(), "🌆", MODERATOR)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(platform.location_of(X), Some(lobby));
}

#[tokio::test]
async fn test_marker_from_non_moderator_is_rejected() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let err = orch
        .handle_marker(CONTAINER, platform.control_channel(), "🌆", X)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NocturneError::Session(SessionError::Unauthorized(p)) if p == X
    ));
}

#[tokio::test(start_paused = true)]
async fn test_marker_outside_control_channel_is_ignored() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();
    let elsewhere = platform.seed_channel("spam");
    let messages = platform.message_texts().len();

    orch.handle_marker(CONTAINER, elsewhere, "🌆", MODERATOR)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(platform.message_texts().len(), messages, "no gather ran");
}

#[tokio::test(start_paused = true)]
async fn test_unknown_marker_is_ignored() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 0, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();
    let messages = platform.message_texts().len();

    orch.handle_marker(CONTAINER, platform.control_channel(), "🎲", MODERATOR)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(platform.message_texts().len(), messages);
}

// =========================================================================
// Full game flow
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_full_flow_gather_night_day_with_deputy() {
    let platform = MockPlatform::new();
    let orch = orchestrator(&platform, 2, false);
    orch.setup_game(CONTAINER, MODERATOR).await.unwrap();

    let lobby = platform.room_named("Lobby").unwrap();
    let hall = platform.room_named("Hall").unwrap();
    let study = platform.room_named("Study").unwrap();
    let control = platform.control_channel();

    // Both players sighted by the primary and one deputy.
    platform.place(X, hall);
    platform.place(Y, study);
    orch.handle_presence(join(&platform, X, "Hall")).await.unwrap();
    orch.handle_presence(join(&platform, Y, "Study")).await.unwrap();
    orch.record_deputy_presence(1, join(&platform, X, "Hall"))
        .await
        .unwrap();
    orch.record_deputy_presence(1, join(&platform, Y, "Study"))
        .await
        .unwrap();

    // Dusk: stragglers gathered into the lobby.
    orch.handle_marker(CONTAINER, control, "🌆", MODERATOR).await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(platform.location_of(X), Some(lobby));
    assert_eq!(platform.location_of(Y), Some(lobby));

    // Night: everyone dispersed into their own private room.
    orch.handle_marker(CONTAINER, control, "🌃", MODERATOR).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    let x_room = platform.room_named("_nocturne_private_1").unwrap();
    let y_room = platform.room_named("_nocturne_private_2").unwrap();
    assert_eq!(platform.location_of(X), Some(x_room));
    assert_eq!(platform.location_of(Y), Some(y_room));

    // Morning: everyone back to the lobby.
    orch.handle_marker(CONTAINER, control, "🌇", MODERATOR).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(platform.location_of(X), Some(lobby));
    assert_eq!(platform.location_of(Y), Some(lobby));
}
