//! The Shadow's dive ability.
//!
//! ```text
//!            press (not lit)                  dive_duration
//! Normal ─────────────────▶ Transitioning(Entering) ──────────▶ ShadowForm
//!   ▲                                                               │
//!   │     dive_duration                 release, or exposed to light │
//!   └──────────────── Transitioning(Exiting) ◀──────────────────────┘
//! ```
//!
//! Side effects (movement profile, position marker, suppressed presence)
//! apply when entry completes and are undone when exit completes, never
//! mid-transition.

use std::time::Duration;

use shadowhunt_protocol::{FormState, TransitionDirection};
use shadowhunt_tick::Stopwatch;

use crate::actor::DiveInput;
use crate::config::{MovementProfile, ShadowFormConfig};
use crate::error::ActionError;

/// Observable steps of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    DiveStarted,
    Entered,
    EmergeStarted,
    Emerged,
}

#[derive(Debug, Clone)]
pub struct ShadowFormController {
    state: FormState,
    timer: Stopwatch,
    held: bool,
    movement: MovementProfile,
    marker_visible: bool,
    presence_suppressed: bool,
    halted: bool,
}

impl ShadowFormController {
    pub fn new(config: &ShadowFormConfig) -> Self {
        Self {
            state: FormState::Normal,
            timer: Stopwatch::new(),
            held: false,
            movement: config.normal,
            marker_visible: false,
            presence_suppressed: false,
            halted: false,
        }
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    /// Fully submerged. Transitions don't count.
    pub fn in_shadow_form(&self) -> bool {
        self.state == FormState::ShadowForm
    }

    /// The profile the movement collaborator should use right now.
    pub fn movement(&self) -> MovementProfile {
        self.movement
    }

    pub fn marker_visible(&self) -> bool {
        self.marker_visible
    }

    pub fn presence_suppressed(&self) -> bool {
        self.presence_suppressed
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Starts a dive from `Normal`.
    ///
    /// Refused while lit or while any transition is already running.
    pub fn press_dive(&mut self, in_light: bool) -> Result<FormEvent, ActionError> {
        if self.halted {
            return Err(ActionError::InvalidTransition("controller halted".into()));
        }
        match self.state {
            FormState::Normal if in_light => Err(ActionError::InvalidTransition(
                "cannot dive while exposed to light".into(),
            )),
            FormState::Normal => {
                self.held = true;
                self.begin(TransitionDirection::Entering);
                Ok(FormEvent::DiveStarted)
            }
            other => Err(ActionError::InvalidTransition(format!(
                "cannot dive from {other:?}"
            ))),
        }
    }

    /// Starts emerging from `ShadowForm`. A no-op (`None`) anywhere else,
    /// including while already exiting.
    pub fn request_exit(&mut self) -> Option<FormEvent> {
        if self.halted || self.state != FormState::ShadowForm {
            return None;
        }
        self.begin(TransitionDirection::Exiting);
        Some(FormEvent::EmergeStarted)
    }

    /// Runs one tick with this tick's input and exposure.
    pub fn step(
        &mut self,
        config: &ShadowFormConfig,
        input: DiveInput,
        in_light: bool,
        dt: Duration,
    ) -> Option<FormEvent> {
        if self.halted {
            return None;
        }
        self.held = input.held;

        if input.pressed && self.state == FormState::Normal {
            return self.press_dive(in_light).ok();
        }

        match self.state {
            FormState::Transitioning(direction) => {
                self.timer.advance(dt);
                if self.timer.has_reached(config.dive_duration) {
                    Some(self.complete(config, direction))
                } else {
                    None
                }
            }
            FormState::ShadowForm if !self.held || in_light => self.request_exit(),
            _ => None,
        }
    }

    /// Freezes the controller. In-flight transitions never complete and no
    /// further events fire.
    pub fn halt(&mut self) {
        self.halted = true;
        self.timer.reset();
    }

    fn begin(&mut self, direction: TransitionDirection) {
        self.state = FormState::Transitioning(direction);
        self.timer.reset();
    }

    fn complete(&mut self, config: &ShadowFormConfig, direction: TransitionDirection) -> FormEvent {
        self.timer.reset();
        match direction {
            TransitionDirection::Entering => {
                self.state = FormState::ShadowForm;
                self.movement = config.shadow;
                self.marker_visible = true;
                self.presence_suppressed = true;
                FormEvent::Entered
            }
            TransitionDirection::Exiting => {
                self.state = FormState::Normal;
                self.movement = config.normal;
                self.marker_visible = false;
                self.presence_suppressed = false;
                FormEvent::Emerged
            }
        }
    }
}
