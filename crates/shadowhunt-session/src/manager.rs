//! Session manager: creates sessions and routes participants to them.

use std::collections::HashMap;

use shadowhunt_protocol::{ParticipantId, Request, SessionId, SlotIndex};
use tracing::info;

use crate::actor::{NotificationSender, SessionHandle, spawn_session};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::participant::ParticipantIds;
use crate::session::{Session, SessionInfo};

/// Tracks every running session and which session each participant is in.
///
/// A participant belongs to at most one session. Ids come from one shared
/// source, so that holds across sessions too.
pub struct SessionManager {
    config: SessionConfig,
    sessions: HashMap<SessionId, SessionHandle>,
    participants: HashMap<ParticipantId, SessionId>,
    ids: ParticipantIds,
    next_session_id: u64,
}

impl SessionManager {
    /// A manager whose sessions use `config` unless told otherwise.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: config.validated(),
            sessions: HashMap::new(),
            participants: HashMap::new(),
            ids: ParticipantIds::new(),
            next_session_id: 1,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawns a session with the default config.
    pub fn create_session(&mut self) -> SessionId {
        self.create_session_with(self.config.clone())
    }

    /// Spawns a session with its own config.
    pub fn create_session_with(&mut self, config: SessionConfig) -> SessionId {
        let session_id = SessionId(self.next_session_id);
        self.next_session_id += 1;
        let session = Session::with_ids(session_id, config, self.ids.clone());
        self.sessions.insert(session_id, spawn_session(session));
        info!(%session_id, "session created");
        session_id
    }

    pub fn handle(&self, session_id: SessionId) -> Option<&SessionHandle> {
        self.sessions.get(&session_id)
    }

    pub async fn join(
        &mut self,
        session_id: SessionId,
        display_name: &str,
        sender: NotificationSender,
    ) -> Result<(ParticipantId, SlotIndex), SessionError> {
        let handle = self
            .sessions
            .get(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        let (participant, slot) = handle.join(display_name, sender).await?;
        self.participants.insert(participant, session_id);
        Ok((participant, slot))
    }

    /// Joins the first session still in its lobby with a free slot, or a
    /// new one if there is none.
    pub async fn join_or_create(
        &mut self,
        display_name: &str,
        sender: NotificationSender,
    ) -> Result<(SessionId, ParticipantId, SlotIndex), SessionError> {
        for handle in self.sessions.values() {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if !info.state.is_joinable() || info.participant_count >= info.max_participants {
                continue;
            }
            // The lobby can fill between the query and the join; keep looking.
            if let Ok((participant, slot)) = handle.join(display_name, sender.clone()).await {
                self.participants.insert(participant, info.session_id);
                return Ok((info.session_id, participant, slot));
            }
        }

        let session_id = self.create_session();
        let (participant, slot) = self.join(session_id, display_name, sender).await?;
        Ok((session_id, participant, slot))
    }

    pub async fn leave(&mut self, participant: ParticipantId) -> Result<(), SessionError> {
        let session_id = self
            .participants
            .get(&participant)
            .copied()
            .ok_or(SessionError::UnknownParticipant(participant))?;
        if let Some(handle) = self.sessions.get(&session_id) {
            handle.leave(participant).await?;
        }
        self.participants.remove(&participant);
        Ok(())
    }

    /// Routes a request to the participant's session.
    pub async fn route(&self, participant: ParticipantId, request: Request) -> Result<(), SessionError> {
        let handle = self.session_handle_of(participant)?;
        handle.submit(participant, request).await
    }

    pub fn session_of(&self, participant: ParticipantId) -> Option<SessionId> {
        self.participants.get(&participant).copied()
    }

    pub async fn session_info(&self, session_id: SessionId) -> Result<SessionInfo, SessionError> {
        self.sessions
            .get(&session_id)
            .ok_or(SessionError::NotFound(session_id))?
            .info()
            .await
    }

    /// Sessions still in their lobby. Sessions that don't answer are
    /// skipped.
    pub async fn list_joinable(&self) -> Vec<SessionInfo> {
        let mut infos = Vec::with_capacity(self.sessions.len());
        for handle in self.sessions.values() {
            if let Ok(info) = handle.info().await {
                if info.state.is_joinable() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Shuts a session down and forgets its participants.
    pub async fn destroy_session(&mut self, session_id: SessionId) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .remove(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        let _ = handle.shutdown().await;
        self.participants.retain(|_, sid| *sid != session_id);
        info!(%session_id, "session destroyed");
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_handle_of(&self, participant: ParticipantId) -> Result<&SessionHandle, SessionError> {
        let session_id = self
            .participants
            .get(&participant)
            .ok_or(SessionError::UnknownParticipant(participant))?;
        self.sessions
            .get(session_id)
            .ok_or(SessionError::NotFound(*session_id))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
