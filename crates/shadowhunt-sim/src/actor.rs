//! In-match avatars.

use glam::Vec3;
use shadowhunt_protocol::{ActorStatus, FormState, ParticipantId, Role};
use tracing::debug;

use crate::battery::Flashlight;
use crate::charging::ChargeSession;
use crate::config::MatchConfig;
use crate::health::Health;
use crate::shadow_form::ShadowFormController;
use crate::visibility::{Exposure, ExposureTracker};

/// Dive button state as of this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiveInput {
    /// Pressed since the last tick. Cleared after every tick.
    pub pressed: bool,
    pub held: bool,
}

/// Components only a Shadow carries.
#[derive(Debug, Clone)]
pub struct ShadowKit {
    pub health: Health,
    pub form: ShadowFormController,
    pub exposure: Exposure,
    pub tracker: ExposureTracker,
    pub input: DiveInput,
}

/// Components only a Guardian carries.
#[derive(Debug, Clone)]
pub struct GuardianKit {
    pub flashlight: Flashlight,
    pub charging: Option<ChargeSession>,
}

/// One participant's avatar for the duration of a match.
///
/// The role picks which kit is present; exactly one of `shadow` and
/// `guardian` is `Some`.
#[derive(Debug, Clone)]
pub struct GameActor {
    participant: ParticipantId,
    role: Role,
    position: Vec3,
    aim: Vec3,
    status: ActorStatus,
    has_key: bool,
    active: bool,
    shadow: Option<ShadowKit>,
    guardian: Option<GuardianKit>,
}

impl GameActor {
    pub fn spawn(participant: ParticipantId, role: Role, position: Vec3, config: &MatchConfig) -> Self {
        let (shadow, guardian) = match role {
            Role::Shadow => (
                Some(ShadowKit {
                    health: Health::new(config.health.max_health),
                    form: ShadowFormController::new(&config.shadow_form),
                    exposure: Exposure::default(),
                    tracker: ExposureTracker::default(),
                    input: DiveInput::default(),
                }),
                None,
            ),
            Role::Guardian => (
                None,
                Some(GuardianKit {
                    flashlight: Flashlight::new(&config.flashlight),
                    charging: None,
                }),
            ),
        };

        Self {
            participant,
            role,
            position,
            aim: Vec3::NEG_Z,
            status: ActorStatus::Alive,
            has_key: false,
            active: true,
            shadow,
            guardian,
        }
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn aim(&self) -> Vec3 {
        self.aim
    }

    pub fn status(&self) -> ActorStatus {
        self.status
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    /// `false` once the participant left or the match ended.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Active and not yet Dead or Escaped.
    pub fn can_act(&self) -> bool {
        self.active && !self.status.is_terminal()
    }

    pub fn shadow(&self) -> Option<&ShadowKit> {
        self.shadow.as_ref()
    }

    pub fn shadow_mut(&mut self) -> Option<&mut ShadowKit> {
        self.shadow.as_mut()
    }

    pub fn guardian(&self) -> Option<&GuardianKit> {
        self.guardian.as_ref()
    }

    pub fn guardian_mut(&mut self) -> Option<&mut GuardianKit> {
        self.guardian.as_mut()
    }

    pub fn health(&self) -> Option<f32> {
        self.shadow.as_ref().map(|s| s.health.current())
    }

    pub fn form(&self) -> Option<FormState> {
        self.shadow.as_ref().map(|s| s.form.state())
    }

    pub fn battery(&self) -> Option<f32> {
        self.guardian.as_ref().map(|g| g.flashlight.battery().charge())
    }

    pub fn flashlight_on(&self) -> Option<bool> {
        self.guardian.as_ref().map(|g| g.flashlight.is_on())
    }

    /// Moves the actor. Ignored for actors that can't act.
    pub fn set_position(&mut self, position: Vec3) {
        if self.can_act() {
            self.position = position;
        }
    }

    /// Points the flashlight. A zero vector keeps the previous aim.
    pub fn set_aim(&mut self, direction: Vec3) {
        let direction = direction.normalize_or_zero();
        if self.can_act() && direction != Vec3::ZERO {
            self.aim = direction;
        }
    }

    pub(crate) fn grant_key(&mut self) {
        self.has_key = true;
    }

    /// Moves `Alive` into a terminal status. Returns `false` when the actor
    /// already had one, since terminal statuses are never left.
    pub(crate) fn resolve(&mut self, status: ActorStatus) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            return false;
        }
        debug!(participant = %self.participant, %status, "actor resolved");
        self.status = status;
        self.halt();
        true
    }

    /// Stops everything: no further actions, no timers left running.
    pub(crate) fn deactivate(&mut self) {
        if self.active {
            self.active = false;
            self.halt();
        }
    }

    fn halt(&mut self) {
        if let Some(kit) = self.shadow.as_mut() {
            kit.form.halt();
            kit.input = DiveInput::default();
        }
        if let Some(kit) = self.guardian.as_mut() {
            kit.flashlight.switch_off();
            kit.charging = None;
        }
    }
}
