//! Unified error type for Shadowhunt.

use shadowhunt_protocol::ProtocolError;
use shadowhunt_session::SessionError;
use shadowhunt_sim::ActionError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors, so callers of
/// the facade only ever match on this one type.
#[derive(Debug, thiserror::Error)]
pub enum ShadowhuntError {
    /// Bytes didn't decode into a request, or a notification didn't encode.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A gameplay action was refused.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Lobby or session lifecycle error (full, started, unknown, gone).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Reading a config file failed.
    #[error("config i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A config file isn't valid JSON for [`ServerConfig`](crate::ServerConfig).
    #[error("config parse: {0}")]
    Config(#[from] serde_json::Error),

    /// The tracing subscriber couldn't be installed.
    #[error("telemetry: {0}")]
    Telemetry(String),
}

#[cfg(test)]
mod tests {
    use shadowhunt_protocol::{ParticipantId, Role, SessionId};

    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err: ShadowhuntError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, ShadowhuntError::Protocol(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_from_action_error() {
        let err: ShadowhuntError = ActionError::NotCapable {
            role: Role::Shadow,
            action: "use a flashlight",
        }
        .into();
        assert!(matches!(err, ShadowhuntError::Action(_)));
        assert_eq!(err.to_string(), "Shadow actors cannot use a flashlight");
    }

    #[test]
    fn test_from_session_error() {
        let err: ShadowhuntError = SessionError::CapacityExceeded(SessionId(2)).into();
        assert!(matches!(err, ShadowhuntError::Session(_)));
        let err: ShadowhuntError = SessionError::UnknownParticipant(ParticipantId(9)).into();
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_from_json_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ShadowhuntError = parse.into();
        assert!(matches!(err, ShadowhuntError::Config(_)));
    }
}
