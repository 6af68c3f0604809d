//! Core protocol types.
//!
//! Everything here is `Serialize + Deserialize`: these are the values that
//! travel between a participant's client and the authoritative session.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected participant.
///
/// Newtype over `u64` so it can't be confused with a [`SessionId`].
/// `#[serde(transparent)]` keeps the JSON form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a session (one lobby → match lifecycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Join-order position of a participant inside its session.
///
/// Slot 0 is the host. Role policies pin roles by slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    /// The host's slot.
    pub const HOST: SlotIndex = SlotIndex(0);
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a networked lamp in the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LampId(pub u32);

impl fmt::Display for LampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lamp-{}", self.0)
    }
}

/// Index of a charging station in the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "station-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// Which side a participant plays on. Immutable once the actor is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Carries a flashlight; wins by preventing every Shadow from escaping.
    Guardian,
    /// Has health and the dive ability; wins by escaping with the key.
    Shadow,
}

impl Role {
    /// The other role.
    pub fn complement(self) -> Self {
        match self {
            Self::Guardian => Self::Shadow,
            Self::Shadow => Self::Guardian,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guardian => write!(f, "Guardian"),
            Self::Shadow => write!(f, "Shadow"),
        }
    }
}

/// Terminal-status tracking for an actor.
///
/// Only `Alive → Dead` and `Alive → Escaped` exist; a terminal status is
/// never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActorStatus {
    #[default]
    Alive,
    Escaped,
    Dead,
}

impl ActorStatus {
    /// Returns `true` for `Escaped` and `Dead`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Alive)
    }
}

impl fmt::Display for ActorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alive => write!(f, "Alive"),
            Self::Escaped => write!(f, "Escaped"),
            Self::Dead => write!(f, "Dead"),
        }
    }
}

/// Direction of an in-flight dive/emerge transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionDirection {
    Entering,
    Exiting,
}

/// The shadow-form state of a Shadow actor.
///
/// ```text
/// Normal ──dive──▶ Transitioning(Entering) ──dive_duration──▶ ShadowForm
///    ▲                                                            │
///    └──dive_duration── Transitioning(Exiting) ◀──release/light───┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FormState {
    #[default]
    Normal,
    Transitioning(TransitionDirection),
    ShadowForm,
}

impl FormState {
    /// Returns `true` while a dive or emerge timer is running.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Transitioning(_))
    }
}

/// The lifecycle state of a session.
///
/// ```text
/// Lobby → Starting → InProgress → Ended ──return_to_lobby──▶ Lobby
/// ```
///
/// - **Lobby**: accepting joins, tracking readiness.
/// - **Starting**: roles are being assigned and actors spawned. Transient:
///   a successful start passes through it within the same call.
/// - **InProgress**: the per-tick pass is running.
/// - **Ended**: a decision was reached. Actors are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionState {
    #[default]
    Lobby,
    Starting,
    InProgress,
    Ended,
}

impl SessionState {
    /// Returns `true` if new participants may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while actors exist and may be mutated.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }

    /// The single forward transition out of this state.
    pub fn next(self) -> Self {
        match self {
            Self::Lobby => Self::Starting,
            Self::Starting => Self::InProgress,
            Self::InProgress => Self::Ended,
            Self::Ended => Self::Lobby,
        }
    }

    /// Returns `true` if moving to `target` follows the lifecycle.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests (participant → authority)
// ---------------------------------------------------------------------------

/// A mutation a participant *asks* the authority to perform.
///
/// Requests are queued and applied at the next tick boundary. Invalid ones
/// (wrong role, empty battery, out of range, after the match ended) are
/// dropped without a reply; the client may resubmit on a later tick.
///
/// Internally tagged: `{ "type": "ToggleLamp", "lamp": 2 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Lobby: set the caller's own ready flag.
    SetReady { ready: bool },
    /// Lobby: change the caller's display name. Blank names are ignored.
    SetDisplayName { name: String },
    /// Movement collaborator wrote a new position for the caller's actor.
    Move { position: Vec3 },
    /// Guardian: point the flashlight.
    Aim { direction: Vec3 },
    /// Shadow: dive key went down this tick.
    DivePressed,
    /// Shadow: dive key went up this tick.
    DiveReleased,
    /// Guardian: flashlight key press (edge, not hold).
    ToggleFlashlight,
    /// Anyone in range: flip a networked lamp.
    ToggleLamp { lamp: LampId },
    /// Guardian in range: start recharging at a station.
    StartCharging { station: StationId },
    /// Guardian: abandon an in-flight recharge.
    StopCharging,
}

impl Request {
    /// Rejects requests carrying non-finite vectors.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Self::Move { position } if !position.is_finite() => Err(
                ProtocolError::InvalidMessage("position must be finite".into()),
            ),
            Self::Aim { direction } if !direction.is_finite() => Err(
                ProtocolError::InvalidMessage("direction must be finite".into()),
            ),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications (authority → observers)
// ---------------------------------------------------------------------------

/// Who should receive an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every participant in the session.
    All,
    /// One participant.
    Participant(ParticipantId),
    /// Everyone but one participant.
    AllExcept(ParticipantId),
}

/// The owner of a replicated field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    Session,
    Participant(ParticipantId),
    Lamp(LampId),
}

/// Names of replicated fields. Observers subscribe per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    SessionState,
    DisplayName,
    Ready,
    Role,
    Health,
    Status,
    HasKey,
    Form,
    Battery,
    FlashlightOn,
    LampOn,
}

/// A replicated value as carried in a change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FieldValue {
    Bool(bool),
    Number(f32),
    Text(String),
    Role(Option<Role>),
    Status(ActorStatus),
    Form(FormState),
    State(SessionState),
}

/// One `(old, new)` change of one replicated field.
///
/// Changes of different fields are delivered independently, so observers
/// may briefly see combinations that never coexisted on the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub entity: EntityRef,
    pub field: Field,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// Edge-triggered gameplay hooks for logging and animation.
///
/// Nothing in the authority reads these back; health, status and the win
/// check all work from continuous state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum GameEvent {
    EnteredLight { participant: ParticipantId },
    LeftLight { participant: ParticipantId },
    DiveStarted { participant: ParticipantId },
    ShadowFormEntered { participant: ParticipantId },
    EmergeStarted { participant: ParticipantId },
    Emerged { participant: ParticipantId },
    KeyPickedUp { participant: ParticipantId },
    Escaped { participant: ParticipantId },
    Died { participant: ParticipantId },
    FlashlightDepleted { participant: ParticipantId },
    ChargingStarted { participant: ParticipantId, station: StationId },
    ChargingFinished { participant: ParticipantId, station: StationId },
    ChargingCancelled { participant: ParticipantId, station: StationId },
}

/// Everything the authority pushes to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Notification {
    /// A replicated field changed.
    Change(FieldChange),
    /// Current value of every lobby field, sent once to a participant as it
    /// joins. Each entry has `old == new`.
    Snapshot { fields: Vec<FieldChange> },
    /// A participant left the session. Observers drop it from their view.
    ParticipantLeft { participant: ParticipantId },
    /// A gameplay hook fired.
    Event(GameEvent),
    /// The match reached its single terminal decision.
    MatchEnded {
        shadows_won: bool,
        local_participant_won: bool,
    },
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Every Shadow is Dead or Escaped.
    ShadowsResolved,
    /// The game clock ran out.
    TimeExpired,
    /// The authority called `end_match` directly.
    Forced,
}

/// The match-level decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub shadows_won: bool,
    pub reason: EndReason,
}

impl MatchOutcome {
    /// Did a participant playing `role` win?
    pub fn is_win_for(&self, role: Role) -> bool {
        match role {
            Role::Shadow => self.shadows_won,
            Role::Guardian => !self.shadows_won,
        }
    }
}

/// The only state carried across into the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub win: bool,
    pub subtitle: String,
}

impl MatchSummary {
    /// Builds the summary shown to a participant who played `role`.
    pub fn for_role(outcome: &MatchOutcome, role: Option<Role>) -> Self {
        let subtitle = if outcome.shadows_won {
            "Shadows win!"
        } else {
            "Guardians win!"
        };
        Self {
            win: role.is_some_and(|r| outcome.is_win_for(r)),
            subtitle: subtitle.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&ParticipantId(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&SessionId(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&LampId(2)).unwrap(), "2");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ParticipantId(7).to_string(), "P-7");
        assert_eq!(SessionId(3).to_string(), "S-3");
        assert_eq!(SlotIndex(1).to_string(), "#1");
    }

    #[test]
    fn test_role_complement() {
        assert_eq!(Role::Guardian.complement(), Role::Shadow);
        assert_eq!(Role::Shadow.complement(), Role::Guardian);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!ActorStatus::Alive.is_terminal());
        assert!(ActorStatus::Dead.is_terminal());
        assert!(ActorStatus::Escaped.is_terminal());
    }

    #[test]
    fn test_session_state_lifecycle() {
        assert!(SessionState::Lobby.can_transition_to(SessionState::Starting));
        assert!(!SessionState::Lobby.can_transition_to(SessionState::InProgress));
        assert!(SessionState::InProgress.can_transition_to(SessionState::Ended));
        assert!(SessionState::Ended.can_transition_to(SessionState::Lobby));
        assert!(SessionState::Lobby.is_joinable());
        assert!(!SessionState::InProgress.is_joinable());
        assert!(SessionState::InProgress.is_active());
        assert!(!SessionState::Ended.is_active());
    }

    #[test]
    fn test_request_json_is_internally_tagged() {
        let json = serde_json::to_value(Request::ToggleLamp { lamp: LampId(2) }).unwrap();
        assert_eq!(json["type"], "ToggleLamp");
        assert_eq!(json["lamp"], 2);
    }

    #[test]
    fn test_request_validate_rejects_nan_aim() {
        let req = Request::Aim {
            direction: Vec3::new(f32::NAN, 0.0, 1.0),
        };
        assert!(req.validate().is_err());
        assert!(Request::DivePressed.validate().is_ok());
    }

    #[test]
    fn test_summary_for_roles() {
        let outcome = MatchOutcome {
            shadows_won: false,
            reason: EndReason::TimeExpired,
        };
        let guardian = MatchSummary::for_role(&outcome, Some(Role::Guardian));
        let shadow = MatchSummary::for_role(&outcome, Some(Role::Shadow));
        assert!(guardian.win);
        assert!(!shadow.win);
        assert_eq!(guardian.subtitle, "Guardians win!");
        assert!(!MatchSummary::for_role(&outcome, None).win);
    }
}
