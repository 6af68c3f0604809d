//! Error types for the session layer.

use shadowhunt_protocol::{ParticipantId, SessionId};

/// Errors that can occur during session operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// No free slot: the session already has `max_participants`.
    #[error("session {0} is full")]
    CapacityExceeded(SessionId),

    /// Joining is only possible in the lobby.
    #[error("session {0} has already started")]
    AlreadyStarted(SessionId),

    /// The session is in a state that doesn't allow this operation.
    #[error("invalid session transition: {0}")]
    InvalidTransition(String),

    /// The participant is not in this session.
    #[error("participant {0} is not in this session")]
    UnknownParticipant(ParticipantId),

    /// Display names must contain something other than whitespace.
    #[error("display name is blank")]
    BlankName,

    /// The session does not exist.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The session's command channel is full or closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),
}
