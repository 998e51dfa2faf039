//! The session phase state machine.

use serde::{Deserialize, Serialize};

/// The current phase of a session.
///
/// A phase marks an in-flight transition operation and returns to
/// `Idle` when the operation completes:
///
/// ```text
/// Idle ──(gather)──→ Gathering ──→ Idle
/// Idle ──(night)───→ Night ──────→ Idle
/// Idle ──(day)─────→ Day ────────→ Idle
/// ```
///
/// Transitions are triggered externally and are not guarded against
/// concurrent triggers — two triggers fired close together interleave,
/// and callers are expected (by social convention) not to issue
/// conflicting ones. `shush` never touches the phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum Phase {
    /// No transition in flight.
    #[default]
    Idle,
    /// Stragglers are being pulled back into the lobby.
    Gathering,
    /// Participants are being dispersed into their private rooms.
    Night,
    /// Participants are being returned to the lobby.
    Day,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Gathering => write!(f, "Gathering"),
            Self::Night => write!(f, "Night"),
            Self::Day => write!(f, "Day"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_default_is_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Gathering.to_string(), "Gathering");
        assert_eq!(Phase::Night.to_string(), "Night");
    }
}
