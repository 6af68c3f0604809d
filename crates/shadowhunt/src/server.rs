//! In-process front door: connections, request routing, and cleanup.
//!
//! A byte transport (WebSocket, WebRTC, a test harness) owns the sockets.
//! For each client it calls [`Server::connect`], then feeds the resulting
//! [`Connection`] decoded frames and forwards whatever notifications come
//! back. Everything below that line is the session layer.

use std::sync::Arc;

use shadowhunt_protocol::{
    Codec, JsonCodec, Notification, ParticipantId, Request, SessionId, SlotIndex,
};
use shadowhunt_session::{SessionError, SessionHandle, SessionInfo, SessionManager};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::{ServerConfig, ShadowhuntError};

/// Shared server state, cloned into every connection.
struct ServerState<C: Codec> {
    sessions: Mutex<SessionManager>,
    codec: C,
}

/// Entry point for hosting Shadowhunt sessions.
///
/// Cheap to clone; clones share the same sessions.
pub struct Server<C: Codec = JsonCodec> {
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Clone for Server<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl Server<JsonCodec> {
    /// A server speaking JSON.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: Codec> Server<C> {
    pub fn with_codec(config: ServerConfig, codec: C) -> Self {
        let config = config.validated();
        info!(
            min = config.session.min_participants,
            max = config.session.max_participants,
            policy = ?config.session.role_policy,
            "shadowhunt server ready"
        );
        Self {
            state: Arc::new(ServerState {
                sessions: Mutex::new(SessionManager::new(config.session)),
                codec,
            }),
        }
    }

    /// Puts a new client into the first open lobby, creating one if needed.
    pub async fn connect(&self, display_name: &str) -> Result<Connection<C>, ShadowhuntError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (session, participant, slot) = self
            .state
            .sessions
            .lock()
            .await
            .join_or_create(display_name, tx)
            .await?;
        info!(%session, %participant, %slot, "client connected");
        Ok(Connection {
            participant,
            session,
            slot,
            notifications: rx,
            state: Arc::clone(&self.state),
            closed: false,
        })
    }

    /// Joins a specific session.
    pub async fn connect_to(
        &self,
        session: SessionId,
        display_name: &str,
    ) -> Result<Connection<C>, ShadowhuntError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (participant, slot) = self
            .state
            .sessions
            .lock()
            .await
            .join(session, display_name, tx)
            .await?;
        info!(%session, %participant, %slot, "client connected");
        Ok(Connection {
            participant,
            session,
            slot,
            notifications: rx,
            state: Arc::clone(&self.state),
            closed: false,
        })
    }

    pub async fn create_session(&self) -> SessionId {
        self.state.sessions.lock().await.create_session()
    }

    /// Lobbies that can still be joined.
    pub async fn list_sessions(&self) -> Vec<SessionInfo> {
        self.state.sessions.lock().await.list_joinable().await
    }

    pub async fn session_info(&self, session: SessionId) -> Result<SessionInfo, ShadowhuntError> {
        Ok(self.state.sessions.lock().await.session_info(session).await?)
    }

    /// Ends a running match by authority decision. `false` if nothing was
    /// running.
    pub async fn end_match(&self, session: SessionId, shadows_won: bool) -> Result<bool, ShadowhuntError> {
        let handle = self.handle(session).await?;
        Ok(handle.end_match(shadows_won).await?)
    }

    pub async fn return_to_lobby(&self, session: SessionId) -> Result<(), ShadowhuntError> {
        let handle = self.handle(session).await?;
        Ok(handle.return_to_lobby().await?)
    }

    pub async fn shutdown_session(&self, session: SessionId) -> Result<(), ShadowhuntError> {
        Ok(self.state.sessions.lock().await.destroy_session(session).await?)
    }

    /// Clones the handle so the manager lock is not held across the call.
    async fn handle(&self, session: SessionId) -> Result<SessionHandle, ShadowhuntError> {
        self.state
            .sessions
            .lock()
            .await
            .handle(session)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session).into())
    }
}

/// One client's seat in a session.
///
/// Dropping a connection without calling [`leave`](Self::leave) removes
/// the participant in a background task.
pub struct Connection<C: Codec = JsonCodec> {
    participant: ParticipantId,
    session: SessionId,
    slot: SlotIndex,
    notifications: mpsc::UnboundedReceiver<Notification>,
    state: Arc<ServerState<C>>,
    closed: bool,
}

impl<C: Codec> Connection<C> {
    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Hands a request to the session.
    pub async fn send(&self, request: Request) -> Result<(), ShadowhuntError> {
        request.validate()?;
        let manager = self.state.sessions.lock().await;
        manager.route(self.participant, request).await?;
        Ok(())
    }

    /// Decodes one frame from the wire and sends it.
    pub async fn send_frame(&self, frame: &[u8]) -> Result<(), ShadowhuntError> {
        let request = self.state.codec.decode_request(frame)?;
        self.send(request).await
    }

    pub async fn set_ready(&self, ready: bool) -> Result<(), ShadowhuntError> {
        self.send(Request::SetReady { ready }).await
    }

    /// Waits for the next notification. `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.notifications.recv().await
    }

    /// Takes a notification if one is waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.notifications.try_recv().ok()
    }

    /// Waits for the next notification, encoded for the wire.
    pub async fn recv_frame(&mut self) -> Option<Result<Vec<u8>, ShadowhuntError>> {
        let notification = self.notifications.recv().await?;
        Some(self.state.codec.encode(&notification).map_err(Into::into))
    }

    pub async fn leave(mut self) -> Result<(), ShadowhuntError> {
        self.closed = true;
        self.state.sessions.lock().await.leave(self.participant).await?;
        info!(session = %self.session, participant = %self.participant, "client left");
        Ok(())
    }
}

impl<C: Codec> Drop for Connection<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let participant = self.participant;
        let state = Arc::clone(&self.state);
        runtime.spawn(async move {
            if let Err(e) = state.sessions.lock().await.leave(participant).await {
                debug!(%participant, error = %e, "leave on drop failed");
            }
        });
    }
}
