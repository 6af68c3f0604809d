//! The session authority: one lobby, and the match it turns into.
//!
//! ```text
//! Lobby ──try_start──▶ Starting ──▶ InProgress ──decided──▶ Ended
//!   ▲                (same call)                              │
//!   └────────────────────── return_to_lobby ──────────────────┘
//! ```
//!
//! Everything here is synchronous. The session actor owns a [`Session`]
//! and calls into it; tests can drive one directly.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shadowhunt_protocol::{
    ActorStatus, EndReason, EntityRef, Field, FieldChange, FormState, MatchOutcome, MatchSummary,
    Notification, ParticipantId, Recipient, Request, Role, SessionId, SessionState, SlotIndex,
};
use shadowhunt_sim::{GameActor, Match, TickReport};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::participant::{Participant, ParticipantIds, clean_name};
use crate::replication::{ChangeBus, ChangeReceiver, Replicated, ToFieldValue};
use crate::roles::assign_roles;

/// A snapshot of session metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub state: SessionState,
    pub participant_count: usize,
    pub max_participants: usize,
    /// Game clock, while a match exists.
    pub remaining_time: Option<Duration>,
}

/// Replicated copy of one actor's observable fields.
///
/// The match mutates actors freely during a tick; the session diffs them
/// into these mirrors afterwards, which is what publishes the changes.
#[derive(Debug)]
struct ActorMirror {
    participant: ParticipantId,
    status: Replicated<ActorStatus>,
    has_key: Replicated<bool>,
    health: Option<Replicated<f32>>,
    form: Option<Replicated<FormState>>,
    battery: Option<Replicated<f32>>,
    flashlight_on: Option<Replicated<bool>>,
}

impl ActorMirror {
    fn new(actor: &GameActor) -> Self {
        let entity = EntityRef::Participant(actor.participant());
        Self {
            participant: actor.participant(),
            status: Replicated::new(entity, Field::Status, actor.status()),
            has_key: Replicated::new(entity, Field::HasKey, actor.has_key()),
            health: actor
                .health()
                .map(|v| Replicated::new(entity, Field::Health, v)),
            form: actor.form().map(|v| Replicated::new(entity, Field::Form, v)),
            battery: actor
                .battery()
                .map(|v| Replicated::new(entity, Field::Battery, v)),
            flashlight_on: actor
                .flashlight_on()
                .map(|v| Replicated::new(entity, Field::FlashlightOn, v)),
        }
    }

    fn sync(&mut self, actor: &GameActor, bus: &mut ChangeBus) {
        self.status.set(actor.status(), bus);
        self.has_key.set(actor.has_key(), bus);
        sync_optional(&mut self.health, actor.health(), bus);
        sync_optional(&mut self.form, actor.form(), bus);
        sync_optional(&mut self.battery, actor.battery(), bus);
        sync_optional(&mut self.flashlight_on, actor.flashlight_on(), bus);
    }
}

/// A change that carries a field's current value on both sides.
fn current<T: ToFieldValue>(entity: EntityRef, field: Field, value: &T) -> FieldChange {
    let value = value.to_field_value();
    FieldChange {
        entity,
        field,
        old: value.clone(),
        new: value,
    }
}

fn sync_optional<T>(mirror: &mut Option<Replicated<T>>, value: Option<T>, bus: &mut ChangeBus)
where
    T: Clone + PartialEq + ToFieldValue,
{
    if let (Some(mirror), Some(value)) = (mirror.as_mut(), value) {
        mirror.set(value, bus);
    }
}

/// One lobby and its match.
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    ids: ParticipantIds,
    seed: u64,
    rng: StdRng,
    state: Replicated<SessionState>,
    participants: Vec<Participant>,
    game: Option<Match>,
    mirrors: Vec<ActorMirror>,
    lamps: Vec<Replicated<bool>>,
    requests: VecDeque<(ParticipantId, Request)>,
    outcome: Option<MatchOutcome>,
    summaries: HashMap<ParticipantId, MatchSummary>,
    bus: ChangeBus,
    outbox: Vec<(Recipient, Notification)>,
}

impl Session {
    /// A session with its own id source.
    pub fn new(id: SessionId, config: SessionConfig) -> Self {
        Self::with_ids(id, config, ParticipantIds::new())
    }

    /// A session drawing participant ids from a shared source.
    pub fn with_ids(id: SessionId, config: SessionConfig, ids: ParticipantIds) -> Self {
        let config = config.validated();
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        debug!(session_id = %id, seed, "session created");
        Self {
            id,
            ids,
            seed,
            rng: StdRng::seed_from_u64(seed),
            state: Replicated::new(EntityRef::Session, Field::SessionState, SessionState::Lobby),
            participants: Vec::new(),
            game: None,
            mirrors: Vec::new(),
            lamps: Vec::new(),
            requests: VecDeque::new(),
            outcome: None,
            summaries: HashMap::new(),
            bus: ChangeBus::new(),
            outbox: Vec::new(),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.get()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The seed role shuffles are drawn from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Participants in slot order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn slot_of(&self, id: ParticipantId) -> Option<SlotIndex> {
        self.participants
            .iter()
            .position(|p| p.id() == id)
            .map(SlotIndex)
    }

    /// Everyone present is ready. `false` for an empty lobby.
    pub fn all_ready(&self) -> bool {
        !self.participants.is_empty() && self.participants.iter().all(|p| p.is_ready())
    }

    pub fn game(&self) -> Option<&Match> {
        self.game.as_ref()
    }

    /// Mutable access for the movement collaborator. Changes made through
    /// this are replicated after the next tick.
    pub fn game_mut(&mut self) -> Option<&mut Match> {
        self.game.as_mut()
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// What `participant` saw at the end of the last match.
    pub fn summary(&self, participant: ParticipantId) -> Option<&MatchSummary> {
        self.summaries.get(&participant)
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id,
            state: self.state(),
            participant_count: self.participants.len(),
            max_participants: self.config.max_participants,
            remaining_time: self.game.as_ref().map(|g| g.remaining_time()),
        }
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    pub fn subscribe(&mut self, field: Field) -> ChangeReceiver {
        self.bus.subscribe(field)
    }

    pub fn subscribe_all(&mut self) -> ChangeReceiver {
        self.bus.subscribe_all()
    }

    /// Everything produced since the last call, in order, tagged with who
    /// should receive it.
    pub fn take_notifications(&mut self) -> Vec<(Recipient, Notification)> {
        self.flush_changes();
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------------

    /// Adds a participant at the next slot. A blank name gets a default.
    pub fn join(&mut self, display_name: &str) -> Result<(ParticipantId, SlotIndex), SessionError> {
        if !self.state().is_joinable() {
            return Err(SessionError::AlreadyStarted(self.id));
        }
        if self.participants.len() >= self.config.max_participants {
            return Err(SessionError::CapacityExceeded(self.id));
        }

        let id = self.ids.next_id();
        let slot = SlotIndex(self.participants.len());
        let name = clean_name(display_name).unwrap_or_else(|| format!("Player {}", id.0));

        // Keep earlier changes ahead of the join.
        self.flush_changes();
        let mut participant = Participant::new(id, String::new());
        participant.set_display_name(name, &mut self.bus);
        self.participants.push(participant);

        // The newcomer learns about itself, and everyone else, from the
        // snapshot.
        for change in self.bus.take_pending() {
            self.outbox
                .push((Recipient::AllExcept(id), Notification::Change(change)));
        }
        let fields = self.snapshot();
        self.outbox
            .push((Recipient::Participant(id), Notification::Snapshot { fields }));

        info!(
            session_id = %self.id,
            participant = %id,
            %slot,
            participants = self.participants.len(),
            "participant joined"
        );
        Ok((id, slot))
    }

    /// Removes a participant.
    ///
    /// In the lobby this may complete the ready set. Mid-match the actor is
    /// disabled, and a Shadow still alive forfeits as Dead.
    pub fn leave(&mut self, participant: ParticipantId) -> Result<(), SessionError> {
        let idx = self
            .participants
            .iter()
            .position(|p| p.id() == participant)
            .ok_or(SessionError::UnknownParticipant(participant))?;
        self.participants.remove(idx);
        self.requests.retain(|(p, _)| *p != participant);
        self.summaries.remove(&participant);

        info!(
            session_id = %self.id,
            %participant,
            participants = self.participants.len(),
            "participant left"
        );
        self.emit(Recipient::All, Notification::ParticipantLeft { participant });

        match self.state() {
            SessionState::Lobby => self.maybe_auto_start(),
            SessionState::InProgress => {
                if let Some(game) = self.game.as_mut() {
                    let report = game.remove_participant(participant);
                    self.absorb(report);
                }
            }
            SessionState::Starting | SessionState::Ended => {}
        }
        Ok(())
    }

    /// Sets one participant's ready flag. Only that flag changes, unless
    /// auto-start is on and this completes the ready set.
    pub fn set_ready(&mut self, participant: ParticipantId, ready: bool) -> Result<(), SessionError> {
        if self.state() != SessionState::Lobby {
            return Err(SessionError::InvalidTransition(format!(
                "cannot change readiness in {}",
                self.state()
            )));
        }
        let p = self
            .participants
            .iter_mut()
            .find(|p| p.id() == participant)
            .ok_or(SessionError::UnknownParticipant(participant))?;
        if p.set_ready(ready, &mut self.bus) {
            debug!(session_id = %self.id, %participant, ready, "readiness changed");
        }
        if ready {
            self.maybe_auto_start();
        }
        Ok(())
    }

    pub fn set_display_name(&mut self, participant: ParticipantId, name: &str) -> Result<(), SessionError> {
        let name = clean_name(name).ok_or(SessionError::BlankName)?;
        let p = self
            .participants
            .iter_mut()
            .find(|p| p.id() == participant)
            .ok_or(SessionError::UnknownParticipant(participant))?;
        p.set_display_name(name, &mut self.bus);
        Ok(())
    }

    /// Assigns roles, spawns actors, starts the clock.
    ///
    /// Needs the lobby to hold at least `min_participants`, all ready.
    pub fn try_start(&mut self) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Lobby => {}
            SessionState::Starting | SessionState::InProgress => {
                return Err(SessionError::AlreadyStarted(self.id));
            }
            SessionState::Ended => {
                return Err(SessionError::InvalidTransition(
                    "match ended, return to the lobby first".into(),
                ));
            }
        }
        let count = self.participants.len();
        if count < self.config.min_participants {
            return Err(SessionError::InvalidTransition(format!(
                "need at least {} participants, have {count}",
                self.config.min_participants
            )));
        }
        if !self.all_ready() {
            return Err(SessionError::InvalidTransition(
                "not every participant is ready".into(),
            ));
        }

        self.transition(SessionState::Starting);
        self.summaries.clear();
        self.outcome = None;

        let roles = assign_roles(
            self.config.role_policy,
            count,
            self.config.guardian_count,
            &mut self.rng,
        );
        // Roles replicate before any actor exists.
        for (participant, role) in self.participants.iter_mut().zip(&roles) {
            participant.set_role(Some(*role), &mut self.bus);
        }
        let roster: Vec<(ParticipantId, Role)> = self
            .participants
            .iter()
            .map(|p| p.id())
            .zip(roles.iter().copied())
            .collect();

        let game = Match::new(self.config.match_config.clone(), &roster);
        self.mirrors = game.actors().iter().map(ActorMirror::new).collect();
        self.lamps = game
            .level()
            .lamps()
            .iter()
            .map(|lamp| Replicated::new(EntityRef::Lamp(lamp.id()), Field::LampOn, lamp.is_on()))
            .collect();
        self.game = Some(game);

        self.transition(SessionState::InProgress);
        info!(
            session_id = %self.id,
            participants = count,
            guardians = roles.iter().filter(|r| **r == Role::Guardian).count(),
            shadows = roles.iter().filter(|r| **r == Role::Shadow).count(),
            "match started"
        );
        Ok(())
    }

    /// Ends the match by authority decision. Returns `false`, changing
    /// nothing, if no match is running.
    pub fn end_match(&mut self, shadows_won: bool) -> bool {
        self.conclude(MatchOutcome {
            shadows_won,
            reason: EndReason::Forced,
        })
    }

    /// `Ended → Lobby`: actors are destroyed, ready flags and roles cleared.
    pub fn return_to_lobby(&mut self) -> Result<(), SessionError> {
        if self.state() != SessionState::Ended {
            return Err(SessionError::InvalidTransition(format!(
                "cannot return to lobby from {}",
                self.state()
            )));
        }
        self.game = None;
        self.mirrors.clear();
        self.lamps.clear();
        self.requests.clear();
        for participant in &mut self.participants {
            participant.set_ready(false, &mut self.bus);
            participant.set_role(None, &mut self.bus);
        }
        self.transition(SessionState::Lobby);
        info!(session_id = %self.id, "returned to lobby");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Match
    // -----------------------------------------------------------------------

    /// Accepts a request from a participant.
    ///
    /// Lobby requests apply immediately. Gameplay requests are queued for
    /// the next tick and only accepted while the match runs.
    pub fn submit(&mut self, participant: ParticipantId, request: Request) -> Result<(), SessionError> {
        if self.participant(participant).is_none() {
            return Err(SessionError::UnknownParticipant(participant));
        }
        match request {
            Request::SetReady { ready } => self.set_ready(participant, ready),
            Request::SetDisplayName { name } => self.set_display_name(participant, &name),
            request => {
                if self.state() != SessionState::InProgress {
                    return Err(SessionError::InvalidTransition(format!(
                        "gameplay request in {}",
                        self.state()
                    )));
                }
                self.requests.push_back((participant, request));
                Ok(())
            }
        }
    }

    /// One tick: drain the request queue, run the match pass, replicate.
    ///
    /// Returns `false` when no match is running.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if self.state() != SessionState::InProgress {
            return false;
        }
        let Some(game) = self.game.as_mut() else {
            return false;
        };

        let mut events = Vec::new();
        while let Some((participant, request)) = self.requests.pop_front() {
            match game.apply(participant, &request) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(error) => {
                    debug!(session_id = %self.id, %participant, %error, "request dropped");
                }
            }
        }

        let mut report = game.tick(dt);
        events.append(&mut report.events);
        report.events = events;
        self.absorb(report);
        true
    }

    fn absorb(&mut self, report: TickReport) {
        for event in report.events {
            self.emit(Recipient::All, Notification::Event(event));
        }
        self.sync_mirrors();
        if let Some(outcome) = report.outcome {
            self.conclude(outcome);
        }
    }

    /// The single path into `Ended`. Guarded by state so a second decision
    /// is a no-op and `MatchEnded` goes out once per participant.
    fn conclude(&mut self, outcome: MatchOutcome) -> bool {
        if self.state() != SessionState::InProgress {
            debug!(session_id = %self.id, "match already concluded, ignoring");
            return false;
        }
        if let Some(game) = self.game.as_mut() {
            game.finish(outcome);
        }
        self.sync_mirrors();
        self.outcome = Some(outcome);
        self.transition(SessionState::Ended);

        for idx in 0..self.participants.len() {
            let participant = self.participants[idx].id();
            let summary = MatchSummary::for_role(&outcome, self.participants[idx].role());
            self.emit(
                Recipient::Participant(participant),
                Notification::MatchEnded {
                    shadows_won: outcome.shadows_won,
                    local_participant_won: summary.win,
                },
            );
            self.summaries.insert(participant, summary);
        }

        info!(
            session_id = %self.id,
            shadows_won = outcome.shadows_won,
            reason = ?outcome.reason,
            "match ended"
        );
        true
    }

    fn sync_mirrors(&mut self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        for mirror in &mut self.mirrors {
            if let Some(actor) = game.actor(mirror.participant) {
                mirror.sync(actor, &mut self.bus);
            }
        }
        for (mirror, lamp) in self.lamps.iter_mut().zip(game.level().lamps()) {
            mirror.set(lamp.is_on(), &mut self.bus);
        }
    }

    /// Every lobby field as it stands, session state first, then each
    /// participant in slot order.
    fn snapshot(&self) -> Vec<FieldChange> {
        let mut fields = vec![current(self.state.entity(), Field::SessionState, self.state.get())];
        for p in &self.participants {
            let entity = EntityRef::Participant(p.id());
            fields.push(current(entity, Field::DisplayName, &p.display_name().to_string()));
            fields.push(current(entity, Field::Ready, &p.is_ready()));
            fields.push(current(entity, Field::Role, &p.role()));
        }
        fields
    }

    fn maybe_auto_start(&mut self) {
        if !self.config.auto_start
            || self.state() != SessionState::Lobby
            || self.participants.len() < self.config.min_participants
            || !self.all_ready()
        {
            return;
        }
        if let Err(error) = self.try_start() {
            debug!(session_id = %self.id, %error, "auto-start refused");
        }
    }

    fn transition(&mut self, target: SessionState) {
        debug_assert!(
            self.state().can_transition_to(target),
            "illegal session transition {} -> {target}",
            self.state()
        );
        self.state.set(target, &mut self.bus);
    }

    fn emit(&mut self, recipient: Recipient, notification: Notification) {
        self.flush_changes();
        self.outbox.push((recipient, notification));
    }

    fn flush_changes(&mut self) {
        for change in self.bus.take_pending() {
            self.outbox.push((Recipient::All, Notification::Change(change)));
        }
    }
}

#[cfg(test)]
mod tests {
    use shadowhunt_protocol::{FieldValue, Vec3};

    use super::*;

    fn manual() -> SessionConfig {
        SessionConfig {
            auto_start: false,
            seed: Some(1),
            ..SessionConfig::default()
        }
    }

    fn started() -> (Session, ParticipantId, ParticipantId) {
        let mut s = Session::new(SessionId(1), manual());
        let (host, _) = s.join("Host").unwrap();
        let (guest, _) = s.join("Guest").unwrap();
        s.set_ready(host, true).unwrap();
        s.set_ready(guest, true).unwrap();
        s.try_start().unwrap();
        (s, host, guest)
    }

    #[test]
    fn test_blank_join_name_gets_default() {
        let mut s = Session::new(SessionId(1), manual());
        let (id, _) = s.join("   ").unwrap();
        assert_eq!(s.participant(id).unwrap().display_name(), format!("Player {}", id.0));
    }

    #[test]
    fn test_blank_rename_is_rejected() {
        let mut s = Session::new(SessionId(1), manual());
        let (id, _) = s.join("Ada").unwrap();
        assert_eq!(s.set_display_name(id, " "), Err(SessionError::BlankName));
        assert_eq!(s.participant(id).unwrap().display_name(), "Ada");
    }

    #[test]
    fn test_gameplay_requests_queue_until_tick() {
        let (mut s, _host, guest) = started();
        s.submit(guest, Request::Move { position: Vec3::new(3.0, 0.0, 0.0) })
            .unwrap();
        assert_eq!(s.pending_requests(), 1);
        assert_eq!(s.game().unwrap().actor(guest).unwrap().position(), Vec3::ZERO);

        s.tick(Duration::from_millis(100));
        assert_eq!(s.pending_requests(), 0);
        assert_eq!(
            s.game().unwrap().actor(guest).unwrap().position(),
            Vec3::new(3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_gameplay_request_rejected_in_lobby() {
        let mut s = Session::new(SessionId(1), manual());
        let (id, _) = s.join("Ada").unwrap();
        assert!(matches!(
            s.submit(id, Request::ToggleFlashlight),
            Err(SessionError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_flashlight_toggle_replicates() {
        let (mut s, host, _guest) = started();
        s.take_notifications();
        s.submit(host, Request::ToggleFlashlight).unwrap();
        s.tick(Duration::from_millis(100));
        let changes: Vec<_> = s
            .take_notifications()
            .into_iter()
            .filter_map(|(_, n)| match n {
                Notification::Change(c) if c.field == Field::FlashlightOn => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new, FieldValue::Bool(true));
    }

    #[test]
    fn test_return_to_lobby_clears_roles_and_ready() {
        let (mut s, host, guest) = started();
        assert!(s.end_match(true));
        s.return_to_lobby().unwrap();
        assert_eq!(s.state(), SessionState::Lobby);
        assert!(s.game().is_none());
        for id in [host, guest] {
            let p = s.participant(id).unwrap();
            assert!(!p.is_ready());
            assert_eq!(p.role(), None);
        }
        // The summary survives until the next start.
        assert!(s.summary(guest).unwrap().win);
    }
}
