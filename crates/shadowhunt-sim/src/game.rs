//! One match: the actors, the level, the clock, and the per-tick pass.

use std::time::Duration;

use shadowhunt_protocol::{
    ActorStatus, EndReason, GameEvent, MatchOutcome, ParticipantId, Request, Role,
};
use shadowhunt_tick::Countdown;
use tracing::{debug, info, warn};

use crate::actor::GameActor;
use crate::charging::{ChargeProgress, ChargeSession};
use crate::config::MatchConfig;
use crate::error::ActionError;
use crate::health::HealthChange;
use crate::level::Level;
use crate::light::{LightSource, SpotLight};
use crate::shadow_form::FormEvent;
use crate::visibility::{ExposureEdge, VisibilityChecker};
use crate::win::{Verdict, WinDeterminer};

/// What one [`Match::tick`] produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<GameEvent>,
    /// Set on the one tick that decided the match.
    pub outcome: Option<MatchOutcome>,
}

/// The authoritative state of one running match.
///
/// Gameplay requests go through [`apply`](Self::apply) between ticks; time
/// only moves in [`tick`](Self::tick). Once an outcome is set nothing
/// changes again.
pub struct Match {
    config: MatchConfig,
    level: Level,
    actors: Vec<GameActor>,
    clock: Countdown,
    outcome: Option<MatchOutcome>,
    ticks: u64,
}

impl Match {
    /// Builds the level from `config.level` and spawns one actor per roster
    /// entry, in roster order.
    pub fn new(config: MatchConfig, roster: &[(ParticipantId, Role)]) -> Self {
        let level = Level::from_config(&config.level, &config.charging);
        Self::with_level(config, level, roster)
    }

    /// Like [`new`](Self::new) with a prebuilt level.
    pub fn with_level(config: MatchConfig, level: Level, roster: &[(ParticipantId, Role)]) -> Self {
        let config = config.validated();

        let mut spawned = [0usize; 2];
        let actors: Vec<GameActor> = roster
            .iter()
            .map(|&(participant, role)| {
                let count = &mut spawned[role as usize];
                let position = level.spawn_point(role, *count);
                *count += 1;
                GameActor::spawn(participant, role, position, &config)
            })
            .collect();

        if spawned[Role::Shadow as usize] == 0 {
            warn!("match has no shadows, guardians win on the first tick");
        }

        let mut clock = Countdown::new(config.max_game_time);
        clock.start();

        debug!(
            guardians = spawned[Role::Guardian as usize],
            shadows = spawned[Role::Shadow as usize],
            max_game_time_s = config.max_game_time.as_secs_f64(),
            "match created"
        );

        Self {
            config,
            level,
            actors,
            clock,
            outcome: None,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn actors(&self) -> &[GameActor] {
        &self.actors
    }

    pub fn actor(&self, participant: ParticipantId) -> Option<&GameActor> {
        self.actors.iter().find(|a| a.participant() == participant)
    }

    /// Direct access for the movement collaborator.
    pub fn actor_mut(&mut self, participant: ParticipantId) -> Option<&mut GameActor> {
        self.actors.iter_mut().find(|a| a.participant() == participant)
    }

    pub fn remaining_time(&self) -> Duration {
        self.clock.remaining()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Applies one gameplay request from `participant`.
    ///
    /// Dive input is only latched here; the dive itself happens in the next
    /// tick's shadow-form step, after exposure is known.
    pub fn apply(
        &mut self,
        participant: ParticipantId,
        request: &Request,
    ) -> Result<Option<GameEvent>, ActionError> {
        let idx = self
            .index_of(participant)
            .ok_or(ActionError::UnknownActor(participant))?;
        if self.outcome.is_some() || !self.actors[idx].can_act() {
            return Err(ActionError::ActorInactive(participant));
        }
        let role = self.actors[idx].role();
        let position = self.actors[idx].position();

        match request {
            Request::Move { position } => {
                self.actors[idx].set_position(*position);
                Ok(None)
            }
            Request::Aim { direction } => {
                if role != Role::Guardian {
                    return Err(ActionError::NotCapable {
                        role,
                        action: "aim a flashlight",
                    });
                }
                self.actors[idx].set_aim(*direction);
                Ok(None)
            }
            Request::DivePressed | Request::DiveReleased => {
                let kit = self.actors[idx]
                    .shadow_mut()
                    .ok_or(ActionError::NotCapable { role, action: "dive" })?;
                if matches!(request, Request::DivePressed) {
                    kit.input.pressed = true;
                    kit.input.held = true;
                } else {
                    kit.input.held = false;
                }
                Ok(None)
            }
            Request::ToggleFlashlight => {
                let kit = self.actors[idx].guardian_mut().ok_or(ActionError::NotCapable {
                    role,
                    action: "use a flashlight",
                })?;
                if !kit.flashlight.try_toggle() {
                    return Err(ActionError::InsufficientResource("flashlight battery"));
                }
                debug!(%participant, on = kit.flashlight.is_on(), "flashlight toggled");
                Ok(None)
            }
            Request::ToggleLamp { lamp } => {
                let target = self
                    .level
                    .lamp_mut(*lamp)
                    .ok_or_else(|| ActionError::UnknownTarget(lamp.to_string()))?;
                if !target.within_reach(position) {
                    return Err(ActionError::OutOfRange(lamp.to_string()));
                }
                let on = target.toggle();
                debug!(%participant, %lamp, on, "lamp toggled");
                Ok(None)
            }
            Request::StartCharging { station } => {
                let kit = self.actors[idx].guardian_mut().ok_or(ActionError::NotCapable {
                    role,
                    action: "charge a flashlight",
                })?;
                let target = self
                    .level
                    .station(*station)
                    .ok_or_else(|| ActionError::UnknownTarget(station.to_string()))?;
                if !target.in_range(position) {
                    return Err(ActionError::OutOfRange(station.to_string()));
                }
                if kit.charging.is_some() {
                    return Err(ActionError::InvalidTransition("already charging".into()));
                }
                kit.charging = Some(ChargeSession::begin(target, kit.flashlight.battery()));
                debug!(%participant, %station, "charging started");
                Ok(Some(GameEvent::ChargingStarted {
                    participant,
                    station: *station,
                }))
            }
            Request::StopCharging => {
                let kit = self.actors[idx].guardian_mut().ok_or(ActionError::NotCapable {
                    role,
                    action: "charge a flashlight",
                })?;
                let session = kit
                    .charging
                    .take()
                    .ok_or_else(|| ActionError::InvalidTransition("not charging".into()))?;
                Ok(Some(GameEvent::ChargingCancelled {
                    participant,
                    station: session.station(),
                }))
            }
            Request::SetReady { .. } | Request::SetDisplayName { .. } => Err(
                ActionError::InvalidTransition("lobby request during a match".into()),
            ),
        }
    }

    /// A participant left mid-match. Their actor stops acting; a Shadow that
    /// was still alive forfeits as Dead, which may decide the match.
    pub fn remove_participant(&mut self, participant: ParticipantId) -> TickReport {
        let report = TickReport::default();
        let Some(idx) = self.index_of(participant) else {
            return report;
        };
        if self.outcome.is_some() {
            return report;
        }
        self.actors[idx].deactivate();
        if self.actors[idx].role() == Role::Shadow {
            return self.resolve_shadow(idx, ActorStatus::Dead, report);
        }
        report
    }

    /// Ends the match now with `outcome`. Returns `false` if it was already
    /// over, in which case nothing changes.
    pub fn finish(&mut self, outcome: MatchOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        info!(
            shadows_won = outcome.shadows_won,
            reason = ?outcome.reason,
            ticks = self.ticks,
            "match decided"
        );
        self.outcome = Some(outcome);
        self.clock.stop();
        for actor in &mut self.actors {
            actor.deactivate();
        }
        true
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one fixed pass: visibility, resources, shadow form, objectives,
    /// then the clock. A match decided mid-pass stops there.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.outcome.is_some() {
            return report;
        }
        self.ticks += 1;

        // Only a roster without Shadows can be decided before anything moves.
        if self.ticks == 1 {
            report.outcome = self.decide();
            if report.outcome.is_some() {
                return report;
            }
        }

        self.update_visibility(&mut report.events);

        report = self.update_resources(dt, report);
        if report.outcome.is_some() {
            return report;
        }

        self.update_forms(dt, &mut report.events);

        report = self.update_objectives(report);
        if report.outcome.is_some() {
            return report;
        }

        if self.clock.advance(dt) {
            info!(ticks = self.ticks, "game clock expired");
            let outcome = MatchOutcome {
                shadows_won: false,
                reason: EndReason::TimeExpired,
            };
            self.finish(outcome);
            report.outcome = Some(outcome);
        }
        report
    }

    fn update_visibility(&mut self, events: &mut Vec<GameEvent>) {
        let beams: Vec<SpotLight> = self
            .actors
            .iter()
            .filter(|a| a.can_act())
            .filter_map(|a| {
                a.guardian()
                    .and_then(|kit| kit.flashlight.beam(a.position(), a.aim()))
            })
            .collect();

        let mut lights: Vec<&dyn LightSource> = self.level.light_sources().collect();
        lights.extend(beams.iter().map(|beam| beam as &dyn LightSource));
        let checker = VisibilityChecker::new(self.level.occluder());

        for actor in self.actors.iter_mut().filter(|a| a.can_act()) {
            let participant = actor.participant();
            let position = actor.position();
            let Some(kit) = actor.shadow_mut() else {
                continue;
            };
            kit.exposure = checker.evaluate(lights.iter().copied(), position);
            match kit.tracker.update(kit.exposure) {
                Some(ExposureEdge::Entered) => events.push(GameEvent::EnteredLight { participant }),
                Some(ExposureEdge::Exited) => events.push(GameEvent::LeftLight { participant }),
                None => {}
            }
        }
    }

    fn update_resources(&mut self, dt: Duration, mut report: TickReport) -> TickReport {
        for idx in 0..self.actors.len() {
            let actor = &mut self.actors[idx];
            if !actor.can_act() {
                continue;
            }
            let participant = actor.participant();
            let position = actor.position();

            match actor.role() {
                Role::Shadow => {
                    let Some(kit) = actor.shadow_mut() else {
                        continue;
                    };
                    let change = kit.health.tick(
                        &self.config.health,
                        kit.exposure.in_hostile_light,
                        kit.form.in_shadow_form(),
                        dt,
                    );
                    if change == HealthChange::Depleted {
                        report = self.resolve_shadow(idx, ActorStatus::Dead, report);
                        if report.outcome.is_some() {
                            return report;
                        }
                    }
                }
                Role::Guardian => {
                    let Some(kit) = actor.guardian_mut() else {
                        continue;
                    };
                    if kit.flashlight.tick(dt) {
                        debug!(%participant, "flashlight battery depleted");
                        report
                            .events
                            .push(GameEvent::FlashlightDepleted { participant });
                    }
                    let Some(session) = kit.charging.as_mut() else {
                        continue;
                    };
                    let station = session.station();
                    let progress = match self.level.station(station) {
                        Some(target) => {
                            session.tick(target, position, kit.flashlight.battery_mut(), dt)
                        }
                        None => ChargeProgress::Cancelled,
                    };
                    match progress {
                        ChargeProgress::Charging => {}
                        ChargeProgress::Finished => {
                            kit.charging = None;
                            debug!(%participant, %station, "charging finished");
                            report.events.push(GameEvent::ChargingFinished {
                                participant,
                                station,
                            });
                        }
                        ChargeProgress::Cancelled => {
                            kit.charging = None;
                            debug!(%participant, %station, "charging cancelled, out of range");
                            report.events.push(GameEvent::ChargingCancelled {
                                participant,
                                station,
                            });
                        }
                    }
                }
            }
        }
        report
    }

    fn update_forms(&mut self, dt: Duration, events: &mut Vec<GameEvent>) {
        for actor in self.actors.iter_mut().filter(|a| a.can_act()) {
            let participant = actor.participant();
            let Some(kit) = actor.shadow_mut() else {
                continue;
            };
            let input = kit.input;
            kit.input.pressed = false;

            let Some(event) = kit.form.step(
                &self.config.shadow_form,
                input,
                kit.exposure.in_light,
                dt,
            ) else {
                continue;
            };
            debug!(%participant, ?event, "shadow form");
            events.push(match event {
                FormEvent::DiveStarted => GameEvent::DiveStarted { participant },
                FormEvent::Entered => GameEvent::ShadowFormEntered { participant },
                FormEvent::EmergeStarted => GameEvent::EmergeStarted { participant },
                FormEvent::Emerged => GameEvent::Emerged { participant },
            });
        }
    }

    fn update_objectives(&mut self, mut report: TickReport) -> TickReport {
        for idx in 0..self.actors.len() {
            let actor = &mut self.actors[idx];
            if !actor.can_act() || actor.role() != Role::Shadow {
                continue;
            }
            let participant = actor.participant();
            let position = actor.position();

            if !actor.has_key() && self.level.take_key_at(position) {
                actor.grant_key();
                info!(%participant, "key picked up");
                report.events.push(GameEvent::KeyPickedUp { participant });
            }
            if actor.has_key() && self.level.in_exit(position) {
                report = self.resolve_shadow(idx, ActorStatus::Escaped, report);
                if report.outcome.is_some() {
                    return report;
                }
            }
        }
        report
    }

    /// Moves a Shadow to a terminal status and re-runs the win check on the
    /// spot.
    fn resolve_shadow(&mut self, idx: usize, status: ActorStatus, mut report: TickReport) -> TickReport {
        let actor = &mut self.actors[idx];
        if !actor.resolve(status) {
            return report;
        }
        let participant = actor.participant();
        info!(%participant, %status, "shadow resolved");
        report.events.push(match status {
            ActorStatus::Escaped => GameEvent::Escaped { participant },
            _ => GameEvent::Died { participant },
        });

        report.outcome = self.decide();
        report
    }

    /// Runs the win check over every Shadow and finishes the match if it
    /// is decided.
    fn decide(&mut self) -> Option<MatchOutcome> {
        let verdict = WinDeterminer::evaluate(
            self.actors
                .iter()
                .filter(|a| a.role() == Role::Shadow)
                .map(|a| a.status()),
        );
        let shadows_won = match verdict {
            Verdict::Undecided => return None,
            Verdict::GuardiansWin => false,
            Verdict::ShadowsWin => true,
        };
        let outcome = MatchOutcome {
            shadows_won,
            reason: EndReason::ShadowsResolved,
        };
        self.finish(outcome);
        Some(outcome)
    }

    fn index_of(&self, participant: ParticipantId) -> Option<usize> {
        self.actors
            .iter()
            .position(|a| a.participant() == participant)
    }
}
