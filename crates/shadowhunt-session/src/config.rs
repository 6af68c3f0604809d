//! Session configuration.

use serde::{Deserialize, Serialize};
use shadowhunt_sim::MatchConfig;
use shadowhunt_tick::TickConfig;
use tracing::warn;

/// How roles are handed out when a match starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RolePolicy {
    /// Shuffle `guardian_count` Guardians and the rest Shadows over the
    /// slots, using the session seed.
    Random,
    /// Slot 0 guards, everyone else is a Shadow.
    #[default]
    HostIsGuardian,
    /// Slot 0 is a Shadow, everyone else guards.
    HostIsShadow,
}

/// Configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Participants required before `try_start` succeeds.
    pub min_participants: usize,

    /// Participants allowed in the lobby.
    pub max_participants: usize,

    pub role_policy: RolePolicy,

    /// Number of Guardians under [`RolePolicy::Random`]. Clamped so each
    /// side has at least one member.
    pub guardian_count: usize,

    /// Seed for role shuffles. `None` draws one from the thread RNG.
    pub seed: Option<u64>,

    /// Start automatically once everyone is ready.
    pub auto_start: bool,

    /// Match tick loop.
    pub tick: TickConfig,

    /// Command channel capacity for the session actor.
    pub command_buffer: usize,

    #[serde(rename = "match")]
    pub match_config: MatchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_participants: 2,
            max_participants: 5,
            role_policy: RolePolicy::default(),
            guardian_count: 1,
            seed: None,
            auto_start: true,
            tick: TickConfig::default(),
            command_buffer: 64,
            match_config: MatchConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Clamps participant bounds so `1 <= min <= max`.
    pub fn validated(mut self) -> Self {
        if self.max_participants == 0 {
            warn!("max_participants is 0, raising to 1");
            self.max_participants = 1;
        }
        if self.min_participants == 0 {
            self.min_participants = 1;
        }
        if self.min_participants > self.max_participants {
            warn!(
                min = self.min_participants,
                max = self.max_participants,
                "min_participants exceeds max_participants, clamping"
            );
            self.min_participants = self.max_participants;
        }
        if self.command_buffer == 0 {
            self.command_buffer = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.min_participants, 2);
        assert_eq!(cfg.max_participants, 5);
        assert_eq!(cfg.role_policy, RolePolicy::HostIsGuardian);
        assert!(cfg.auto_start);
    }

    #[test]
    fn test_validated_orders_bounds() {
        let cfg = SessionConfig {
            min_participants: 8,
            max_participants: 3,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(cfg.min_participants, 3);
        assert_eq!(cfg.max_participants, 3);
    }

    #[test]
    fn test_json_uses_match_key() {
        let cfg: SessionConfig = serde_json::from_str(
            r#"{"role_policy": "Random", "match": {"health": {"max_health": 9.0}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.role_policy, RolePolicy::Random);
        assert_eq!(cfg.match_config.health.max_health, 9.0);
        assert_eq!(cfg.max_participants, 5);
    }
}
