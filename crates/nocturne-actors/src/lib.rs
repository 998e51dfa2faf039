//! Multi-identity actor pool for Nocturne.
//!
//! The platform throttles privileged per-participant operations (move,
//! mute) per authenticated identity. The pool spreads identical logical
//! operations across one primary identity and zero or more deputies,
//! raising the effective throughput ceiling roughly N-fold.
//!
//! The pool runs as an isolated Tokio task (actor model): it exclusively
//! owns every identity's presence cache and the shared round-robin
//! cursor, and the outside world talks to it through an
//! [`ActorPoolHandle`]. Each identity's event listener feeds its own
//! cache by sending presence records through the handle — no shared
//! mutable state, just message passing.
//!
//! # Key types
//!
//! - [`ActorPoolHandle`] — send routed operations to the pool
//! - [`spawn_pool`] — start the pool actor task
//! - [`ActorError`]

mod error;
mod pool;

pub use error::ActorError;
pub use pool::{ActorPoolHandle, spawn_pool};
