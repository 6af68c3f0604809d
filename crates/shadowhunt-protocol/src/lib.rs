//! Wire-level vocabulary for Shadowhunt.
//!
//! This crate defines the types that cross the authority boundary:
//!
//! - **Identity** ([`ParticipantId`], [`SessionId`], [`SlotIndex`], ...):
//!   newtypes so ids of different kinds can't be mixed up.
//! - **Game vocabulary** ([`Role`], [`ActorStatus`], [`FormState`],
//!   [`SessionState`]): the enums every other crate speaks in.
//! - **Requests** ([`Request`]): what a non-authority participant may
//!   *ask* the authority to do. The authority accepts or silently ignores.
//! - **Notifications** ([`Notification`], [`FieldChange`]): what the
//!   authority pushes back to observers after it mutates replicated state.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how the above become bytes.
//!
//! ```text
//! client ──Request──▶ authority (session) ──Notification──▶ observers
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActorStatus, EndReason, EntityRef, Field, FieldChange, FieldValue,
    FormState, GameEvent, LampId, MatchOutcome, MatchSummary, Notification,
    ParticipantId, Recipient, Request, Role, SessionId, SessionState,
    SlotIndex, StationId, TransitionDirection,
};

/// Re-export of the vector type used for every position and direction.
pub use glam::Vec3;
