//! Session lifecycle and phase orchestration for Nocturne.
//!
//! A [`Session`] binds one game container to its room topology, the
//! actor pool, and the timed-operation scheduler for mute windows and
//! privacy locks. The [`SessionRegistry`] maps container identities to
//! live sessions and lazily reconstructs a session from platform state
//! when it is looked up after a process restart.
//!
//! # Key types
//!
//! - [`Session`] — phase transitions: `gather`, `night`, `day`, `shush`
//! - [`SessionRegistry`] — lookup-or-create, one session per container
//! - [`Phase`] — the phase state machine
//! - [`SessionConfig`] — hold durations and privacy-lock settings

mod config;
mod error;
mod phase;
mod registry;
mod session;

pub use config::{
    CONTROL_CHANNEL, DUSK_MARKER, GAME_CHAT_CHANNEL, GREETING,
    MORNING_MARKER, NIGHT_MARKER, SHUSH_MARKER, SessionConfig,
};
pub use error::SessionError;
pub use phase::Phase;
pub use registry::SessionRegistry;
pub use session::Session;
