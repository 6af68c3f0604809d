//! Session actor: a Tokio task that owns one [`Session`].
//!
//! The task multiplexes two inputs with `select!`: commands from
//! [`SessionHandle`]s, and the tick scheduler. The scheduler idles unless
//! a match is in progress, so lobby sessions cost nothing between
//! commands. Commands and ticks never interleave: a command is always
//! handled between two ticks.

use std::collections::HashMap;

use shadowhunt_protocol::{
    Field, MatchSummary, Notification, ParticipantId, Recipient, Request, SessionId,
    SessionState, SlotIndex,
};
use shadowhunt_tick::TickScheduler;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::error::SessionError;
use crate::replication::ChangeReceiver;
use crate::session::{Session, SessionInfo};

/// Channel sender for delivering notifications to one participant.
pub type NotificationSender = mpsc::UnboundedSender<Notification>;

/// Commands sent to a session actor.
pub(crate) enum SessionCommand {
    Join {
        display_name: String,
        sender: NotificationSender,
        reply: oneshot::Sender<Result<(ParticipantId, SlotIndex), SessionError>>,
    },
    Leave {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Submit {
        participant: ParticipantId,
        request: Request,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    TryStart {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    EndMatch {
        shadows_won: bool,
        reply: oneshot::Sender<bool>,
    },
    ReturnToLobby {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Info {
        reply: oneshot::Sender<SessionInfo>,
    },
    Summary {
        participant: ParticipantId,
        reply: oneshot::Sender<Option<MatchSummary>>,
    },
    Subscribe {
        field: Option<Field>,
        reply: oneshot::Sender<ChangeReceiver>,
    },
    Shutdown,
}

/// Handle to a running session actor. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    session_id: SessionId,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Joins with `display_name`; notifications arrive on `sender`.
    pub async fn join(
        &self,
        display_name: impl Into<String>,
        sender: NotificationSender,
    ) -> Result<(ParticipantId, SlotIndex), SessionError> {
        self.call(|reply| SessionCommand::Join {
            display_name: display_name.into(),
            sender,
            reply,
        })
        .await?
    }

    pub async fn leave(&self, participant: ParticipantId) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::Leave { participant, reply })
            .await?
    }

    /// Hands a request to the session. `Ok` means accepted: lobby requests
    /// are already applied, gameplay requests are queued for the next tick.
    pub async fn submit(&self, participant: ParticipantId, request: Request) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::Submit {
            participant,
            request,
            reply,
        })
        .await?
    }

    pub async fn set_ready(&self, participant: ParticipantId, ready: bool) -> Result<(), SessionError> {
        self.submit(participant, Request::SetReady { ready }).await
    }

    pub async fn set_display_name(
        &self,
        participant: ParticipantId,
        name: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.submit(participant, Request::SetDisplayName { name: name.into() })
            .await
    }

    pub async fn try_start(&self) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::TryStart { reply }).await?
    }

    /// Returns `false` if no match was running.
    pub async fn end_match(&self, shadows_won: bool) -> Result<bool, SessionError> {
        self.call(|reply| SessionCommand::EndMatch { shadows_won, reply })
            .await
    }

    pub async fn return_to_lobby(&self) -> Result<(), SessionError> {
        self.call(|reply| SessionCommand::ReturnToLobby { reply })
            .await?
    }

    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        self.call(|reply| SessionCommand::Info { reply }).await
    }

    pub async fn summary(&self, participant: ParticipantId) -> Result<Option<MatchSummary>, SessionError> {
        self.call(|reply| SessionCommand::Summary { participant, reply })
            .await
    }

    /// Observes one replicated field, or all of them with `None`.
    pub async fn subscribe(&self, field: Option<Field>) -> Result<ChangeReceiver, SessionError> {
        self.call(|reply| SessionCommand::Subscribe { field, reply })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }

    /// Sends a command carrying a reply channel and waits for the reply.
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))?;
        reply_rx
            .await
            .map_err(|_| SessionError::Unavailable(self.session_id))
    }
}

/// The task-side state.
struct SessionActor {
    session: Session,
    senders: HashMap<ParticipantId, NotificationSender>,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        let session_id = self.session.id();
        info!(%session_id, "session actor started");

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    if !self.handle(command) {
                        info!(%session_id, "session shutting down");
                        break;
                    }
                }
                tick = self.scheduler.next_tick() => {
                    self.session.tick(tick.dt);
                    self.scheduler.finish_tick();
                }
            }
            self.dispatch();
            self.sync_scheduler();
        }

        info!(%session_id, "session actor stopped");
    }

    /// Returns `false` on shutdown.
    fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Join {
                display_name,
                sender,
                reply,
            } => {
                let result = self.session.join(&display_name);
                if let Ok((participant, _)) = &result {
                    self.senders.insert(*participant, sender);
                }
                let _ = reply.send(result);
            }
            SessionCommand::Leave { participant, reply } => {
                let result = self.session.leave(participant);
                self.senders.remove(&participant);
                let _ = reply.send(result);
            }
            SessionCommand::Submit {
                participant,
                request,
                reply,
            } => {
                let _ = reply.send(self.session.submit(participant, request));
            }
            SessionCommand::TryStart { reply } => {
                let _ = reply.send(self.session.try_start());
            }
            SessionCommand::EndMatch { shadows_won, reply } => {
                let _ = reply.send(self.session.end_match(shadows_won));
            }
            SessionCommand::ReturnToLobby { reply } => {
                let _ = reply.send(self.session.return_to_lobby());
            }
            SessionCommand::Info { reply } => {
                let _ = reply.send(self.session.info());
            }
            SessionCommand::Summary { participant, reply } => {
                let _ = reply.send(self.session.summary(participant).cloned());
            }
            SessionCommand::Subscribe { field, reply } => {
                let receiver = match field {
                    Some(field) => self.session.subscribe(field),
                    None => self.session.subscribe_all(),
                };
                let _ = reply.send(receiver);
            }
            SessionCommand::Shutdown => return false,
        }
        true
    }

    /// Ticks only while a match runs.
    fn sync_scheduler(&mut self) {
        if self.session.state() == SessionState::InProgress {
            self.scheduler.resume();
        } else {
            self.scheduler.pause();
        }
    }

    /// Delivers queued notifications to their recipients.
    fn dispatch(&mut self) {
        for (recipient, notification) in self.session.take_notifications() {
            match recipient {
                Recipient::All => {
                    for participant in self.senders.keys().copied().collect::<Vec<_>>() {
                        self.send_to(participant, notification.clone());
                    }
                }
                Recipient::Participant(participant) => {
                    self.send_to(participant, notification);
                }
                Recipient::AllExcept(excluded) => {
                    for participant in self.senders.keys().copied().collect::<Vec<_>>() {
                        if participant != excluded {
                            self.send_to(participant, notification.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends to one participant. A closed receiver is dropped from the
    /// sender map; the participant stays in the session until it leaves.
    fn send_to(&mut self, participant: ParticipantId, notification: Notification) {
        let Some(sender) = self.senders.get(&participant) else {
            return;
        };
        if sender.send(notification).is_err() {
            warn!(
                session_id = %self.session.id(),
                %participant,
                "notification receiver closed"
            );
            self.senders.remove(&participant);
        }
    }
}

/// Spawns a session actor task and returns a handle to it.
pub(crate) fn spawn_session(session: Session) -> SessionHandle {
    let session_id = session.id();
    let (tx, rx) = mpsc::channel(session.config().command_buffer);
    let scheduler = TickScheduler::new(session.config().tick.clone());

    let actor = SessionActor {
        session,
        senders: HashMap::new(),
        scheduler,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    SessionHandle {
        session_id,
        sender: tx,
    }
}
