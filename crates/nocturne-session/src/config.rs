//! Session configuration and well-known names.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the moderator-only control channel under each container.
pub const CONTROL_CHANNEL: &str = "control";

/// Name of the public text channel created alongside the rooms.
pub const GAME_CHAT_CHANNEL: &str = "game-chat";

/// Greeting posted to the control channel on setup. The markers below
/// are added to it as reactions so the moderator can trigger phases by
/// clicking them.
pub const GREETING: &str = "Hi, please click icons to interact with the bot.";

/// Marker that triggers `gather` (dusk).
pub const DUSK_MARKER: &str = "🌆";
/// Marker that triggers `night`.
pub const NIGHT_MARKER: &str = "🌃";
/// Marker that triggers `day` (morning).
pub const MORNING_MARKER: &str = "🌇";
/// Marker that triggers `shush`.
pub const SHUSH_MARKER: &str = "🤫";

/// Timing and privacy settings for a session. Read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long gathered stragglers stay muted after landing in the
    /// lobby. Kept short — the mute only exists to cover the transfer.
    pub gather_hold: Duration,

    /// How long `shush` keeps the lobby muted.
    pub shush_hold: Duration,

    /// How long transient status notices stay visible on the control
    /// channel before being deleted.
    pub notice_display: Duration,

    /// Whether public rooms lock against late joiners once occupied.
    /// Usually governed by social convention instead; off by default.
    pub lock_for_privacy: bool,

    /// How long after the first participant joins a public room before
    /// the privacy lock arms.
    pub privacy_arm_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gather_hold: Duration::from_secs(1),
            shush_hold: Duration::from_secs(10),
            notice_display: Duration::from_secs(10),
            lock_for_privacy: false,
            privacy_arm_delay: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_holds() {
        let config = SessionConfig::default();
        assert_eq!(config.gather_hold, Duration::from_secs(1));
        assert_eq!(config.shush_hold, Duration::from_secs(10));
        assert_eq!(config.notice_display, Duration::from_secs(10));
        assert!(!config.lock_for_privacy);
    }
}
