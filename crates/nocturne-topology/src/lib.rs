//! Room topology management for Nocturne.
//!
//! One [`RoomTopology`] per session container. It owns the mapping from
//! logical room names to platform room IDs, creates rooms on demand
//! (idempotently — room creation is the platform's most rate-limited
//! operation), and applies permission overwrites for locking.
//!
//! # Key types
//!
//! - [`RoomTopology`] — lookup, on-demand creation, lock management
//! - [`TopologyConfig`] — room names and the night-lock flag
//! - [`AccessRoster`] — who gets elevated access on every room

mod config;
mod error;
mod topology;

pub use config::{AccessRoster, TopologyConfig};
pub use error::TopologyError;
pub use topology::RoomTopology;
