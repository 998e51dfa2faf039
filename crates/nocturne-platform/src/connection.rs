//! The `PlatformConnection` trait — one authenticated actor identity.
//!
//! Nocturne doesn't implement the platform transport itself (gateway,
//! REST calls, rate-limit buckets — that's the platform SDK's job).
//! Instead it defines this trait: every privileged operation the
//! orchestrator needs, as seen through ONE authenticated connection.
//! The primary identity and each deputy get their own implementation
//! instance; the actor pool decides which one performs a given call.
//!
//! Methods return `impl Future<… > + Send` rather than plain `async fn`
//! so the futures can be driven from spawned tasks (the pool actor, the
//! privacy-lock timers).

use std::future::Future;

use crate::{
    ChannelId, ContainerId, GroupId, MessageId, ParticipantId,
    PermissionOverwriteSet, PlatformError, RoomId, RoomRecord,
};
use crate::overwrites::{AccessPolicy, Grantee};

/// One authenticated connection capable of privileged operations.
///
/// `Send + Sync + 'static` because connections are shared across async
/// tasks behind `Arc` for the lifetime of the process.
pub trait PlatformConnection: Send + Sync + 'static {
    // -- Room CRUD --

    /// Creates a voice room under a container with the given overwrites
    /// applied atomically. Irreversible and heavily rate limited —
    /// callers must look up before creating.
    fn create_room(
        &self,
        container: ContainerId,
        name: &str,
        overwrites: &PermissionOverwriteSet,
    ) -> impl Future<Output = Result<RoomId, PlatformError>> + Send;

    /// Deletes a room.
    fn delete_room(
        &self,
        room: RoomId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Lists all voice rooms under a container. This is the source of
    /// truth the topology is reconstructed from after a restart.
    fn list_rooms(
        &self,
        container: ContainerId,
    ) -> impl Future<Output = Result<Vec<RoomRecord>, PlatformError>> + Send;

    /// Returns the participants currently inside a room.
    fn room_occupants(
        &self,
        room: RoomId,
    ) -> impl Future<Output = Result<Vec<ParticipantId>, PlatformError>> + Send;

    /// Rewrites one grantee's access policy on a room. This is the
    /// permission field that both phase locking and the privacy-lock
    /// timer write — last writer wins.
    fn set_room_access(
        &self,
        room: RoomId,
        grantee: Grantee,
        policy: AccessPolicy,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    // -- Member operations --

    /// Moves a participant into a room.
    fn move_participant(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Sets a participant's server-mute state.
    fn set_mute(
        &self,
        participant: ParticipantId,
        muted: bool,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Mutes a participant and moves them in one combined edit, so they
    /// cannot speak mid-transfer.
    fn move_and_mute(
        &self,
        participant: ParticipantId,
        room: RoomId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Lists the members of a permission group (used to tell moderators
    /// apart from ordinary participants).
    fn group_members(
        &self,
        group: GroupId,
    ) -> impl Future<Output = Result<Vec<ParticipantId>, PlatformError>> + Send;

    /// Adds a member to a permission group.
    fn add_group_member(
        &self,
        group: GroupId,
        participant: ParticipantId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Removes a member from a permission group.
    fn remove_group_member(
        &self,
        group: GroupId,
        participant: ParticipantId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    // -- Text channels & messaging --

    /// Creates a text channel under a container.
    fn create_text_channel(
        &self,
        container: ContainerId,
        name: &str,
        overwrites: &PermissionOverwriteSet,
    ) -> impl Future<Output = Result<ChannelId, PlatformError>> + Send;

    /// Lists text channels under a container as `(id, name)` pairs.
    /// Used to rediscover the control channel after a restart.
    fn list_text_channels(
        &self,
        container: ContainerId,
    ) -> impl Future<Output = Result<Vec<(ChannelId, String)>, PlatformError>> + Send;

    /// Deletes a text channel (session cleanup).
    fn delete_text_channel(
        &self,
        channel: ChannelId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Sends a message to a text channel.
    fn send_message(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send;

    /// Deletes a previously sent message.
    fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Adds an acknowledgement marker (emoji reaction) to a message.
    fn add_marker(
        &self,
        channel: ChannelId,
        message: MessageId,
        marker: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    // -- Container --

    /// Deletes the container itself. Only valid once everything under
    /// it has been released.
    fn delete_container(
        &self,
        container: ContainerId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}
