//! Error types for match actions.

use shadowhunt_protocol::{ParticipantId, Role};

/// Why a gameplay request was refused.
///
/// None of these are fatal. The session logs them at `debug` and drops the
/// request; state is left exactly as it was.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActionError {
    /// No actor belongs to this participant.
    #[error("no actor for participant {0}")]
    UnknownActor(ParticipantId),

    /// The actor left, died, escaped, or the match is over.
    #[error("actor {0} can no longer act")]
    ActorInactive(ParticipantId),

    /// The request needs a capability this role doesn't carry
    /// (a Shadow toggling a flashlight, a Guardian diving).
    #[error("{role} actors cannot {action}")]
    NotCapable { role: Role, action: &'static str },

    /// A depletable resource is empty, e.g. turning on a dead flashlight.
    #[error("insufficient resource: {0}")]
    InsufficientResource(&'static str),

    /// The state machine refuses the move from its current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The target exists but the actor is too far away from it.
    #[error("{0} is out of range")]
    OutOfRange(String),

    /// The request names a lamp or station the level doesn't have.
    #[error("unknown target: {0}")]
    UnknownTarget(String),
}
