//! Session actors and the manager, on a paused Tokio clock.

use std::time::Duration;

use shadowhunt_protocol::{
    EntityRef, Field, FieldValue, GameEvent, Notification, ParticipantId, Request,
    SessionId, SessionState, Vec3,
};
use shadowhunt_session::{NotificationSender, SessionConfig, SessionError, SessionManager};
use shadowhunt_sim::MatchConfig;
use tokio::sync::mpsc;

fn channel() -> (NotificationSender, mpsc::UnboundedReceiver<Notification>) {
    mpsc::unbounded_channel()
}

fn dummy_sender() -> NotificationSender {
    mpsc::unbounded_channel().0
}

fn short_match() -> SessionConfig {
    SessionConfig {
        seed: Some(3),
        match_config: MatchConfig {
            max_game_time: Duration::from_secs(1),
            ..MatchConfig::default()
        },
        ..SessionConfig::default()
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

// =========================================================================
// Manager
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_session_returns_unique_ids() {
    let mut mgr = SessionManager::default();
    let a = mgr.create_session();
    let b = mgr.create_session();
    assert_ne!(a, b);
    assert_eq!(mgr.session_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_join_unknown_session() {
    let mut mgr = SessionManager::default();
    let result = mgr.join(SessionId(99), "Ada", dummy_sender()).await;
    assert_eq!(result, Err(SessionError::NotFound(SessionId(99))));
}

#[tokio::test(start_paused = true)]
async fn test_participant_ids_unique_across_sessions() {
    let mut mgr = SessionManager::default();
    let s1 = mgr.create_session();
    let s2 = mgr.create_session();
    let (a, _) = mgr.join(s1, "Ada", dummy_sender()).await.unwrap();
    let (b, _) = mgr.join(s2, "Bo", dummy_sender()).await.unwrap();
    assert_ne!(a, b);
    assert_eq!(mgr.session_of(a), Some(s1));
    assert_eq!(mgr.session_of(b), Some(s2));
}

#[tokio::test(start_paused = true)]
async fn test_join_or_create_fills_open_lobby_first() {
    let mut mgr = SessionManager::default();
    let (s1, _, _) = mgr.join_or_create("Ada", dummy_sender()).await.unwrap();
    let (s2, _, _) = mgr.join_or_create("Bo", dummy_sender()).await.unwrap();
    assert_eq!(s1, s2);
    assert_eq!(mgr.session_count(), 1);

    let info = mgr.session_info(s1).await.unwrap();
    assert_eq!(info.participant_count, 2);
    assert_eq!(info.state, SessionState::Lobby);
    assert_eq!(mgr.list_joinable().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_leave_forgets_participant() {
    let mut mgr = SessionManager::default();
    let session = mgr.create_session();
    let (a, _) = mgr.join(session, "Ada", dummy_sender()).await.unwrap();

    mgr.leave(a).await.unwrap();
    assert_eq!(mgr.session_of(a), None);
    assert_eq!(mgr.session_info(session).await.unwrap().participant_count, 0);
    assert_eq!(mgr.leave(a).await, Err(SessionError::UnknownParticipant(a)));
}

#[tokio::test(start_paused = true)]
async fn test_late_joiner_sees_lobby_and_departures_are_announced() {
    let mut mgr = SessionManager::default();
    let session = mgr.create_session();
    let (ada_tx, mut ada_rx) = channel();
    let (bo_tx, mut bo_rx) = channel();
    let (ada, _) = mgr.join(session, "Ada", ada_tx).await.unwrap();
    mgr.route(ada, Request::SetReady { ready: true }).await.unwrap();
    drain(&mut ada_rx);

    let (bo, _) = mgr.join(session, "Bo", bo_tx).await.unwrap();
    let bo_saw = drain(&mut bo_rx);
    let [Notification::Snapshot { fields }] = bo_saw.as_slice() else {
        panic!("expected a single snapshot, got {bo_saw:?}");
    };
    assert!(fields.iter().any(|c| c.entity == EntityRef::Participant(ada)
        && c.field == Field::Ready
        && c.new == FieldValue::Bool(true)));

    mgr.leave(bo).await.unwrap();
    let ada_saw = drain(&mut ada_rx);
    assert!(ada_saw.contains(&Notification::ParticipantLeft { participant: bo }));
}

#[tokio::test(start_paused = true)]
async fn test_route_for_unknown_participant() {
    let mgr = SessionManager::default();
    let result = mgr.route(ParticipantId(5), Request::DivePressed).await;
    assert_eq!(result, Err(SessionError::UnknownParticipant(ParticipantId(5))));
}

#[tokio::test(start_paused = true)]
async fn test_destroy_session() {
    let mut mgr = SessionManager::default();
    let session = mgr.create_session();
    let (a, _) = mgr.join(session, "Ada", dummy_sender()).await.unwrap();
    let handle = mgr.handle(session).unwrap().clone();

    mgr.destroy_session(session).await.unwrap();
    assert_eq!(mgr.session_count(), 0);
    assert_eq!(mgr.session_of(a), None);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.info().await, Err(SessionError::Unavailable(session)));
    assert!(mgr.destroy_session(session).await.is_err());
}

// =========================================================================
// Running matches
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ready_up_starts_ticking_until_time_runs_out() {
    let mut mgr = SessionManager::new(short_match());
    let session = mgr.create_session();
    let (guardian_tx, mut guardian_rx) = channel();
    let (shadow_tx, mut shadow_rx) = channel();
    let (guardian, _) = mgr.join(session, "Guardian", guardian_tx).await.unwrap();
    let (shadow, _) = mgr.join(session, "Shadow", shadow_tx).await.unwrap();

    mgr.route(guardian, Request::SetReady { ready: true }).await.unwrap();
    mgr.route(shadow, Request::SetReady { ready: true }).await.unwrap();

    let info = mgr.session_info(session).await.unwrap();
    assert_eq!(info.state, SessionState::InProgress);
    assert_eq!(info.remaining_time, Some(Duration::from_secs(1)));

    tokio::time::sleep(Duration::from_millis(500)).await;
    let info = mgr.session_info(session).await.unwrap();
    assert_eq!(info.state, SessionState::InProgress);
    assert!(info.remaining_time.unwrap() < Duration::from_secs(1));

    tokio::time::sleep(Duration::from_secs(2)).await;
    let info = mgr.session_info(session).await.unwrap();
    assert_eq!(info.state, SessionState::Ended);

    let ended: Vec<_> = drain(&mut guardian_rx)
        .into_iter()
        .filter_map(|n| match n {
            Notification::MatchEnded {
                shadows_won,
                local_participant_won,
            } => Some((shadows_won, local_participant_won)),
            _ => None,
        })
        .collect();
    assert_eq!(ended, vec![(false, true)]);

    let shadow_saw = drain(&mut shadow_rx);
    assert!(shadow_saw.contains(&Notification::MatchEnded {
        shadows_won: false,
        local_participant_won: false,
    }));

    let handle = mgr.handle(session).unwrap();
    let summary = handle.summary(shadow).await.unwrap().unwrap();
    assert!(!summary.win);
}

#[tokio::test(start_paused = true)]
async fn test_gameplay_requests_apply_on_tick() {
    let mut mgr = SessionManager::new(SessionConfig {
        seed: Some(3),
        ..SessionConfig::default()
    });
    let session = mgr.create_session();
    let (guardian_tx, mut guardian_rx) = channel();
    let (guardian, _) = mgr.join(session, "Guardian", guardian_tx).await.unwrap();
    let (shadow, _) = mgr.join(session, "Shadow", dummy_sender()).await.unwrap();
    let handle = mgr.handle(session).unwrap().clone();
    handle.set_ready(guardian, true).await.unwrap();
    handle.set_ready(shadow, true).await.unwrap();
    drain(&mut guardian_rx);

    handle.submit(shadow, Request::DivePressed).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let events: Vec<_> = drain(&mut guardian_rx)
        .into_iter()
        .filter_map(|n| match n {
            Notification::Event(e) => Some(e),
            _ => None,
        })
        .collect();
    assert!(events.contains(&GameEvent::DiveStarted { participant: shadow }));

    // Accepted into the queue; the match validates it on the next tick.
    handle
        .submit(guardian, Request::Move { position: Vec3::X })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.info().await.unwrap().state, SessionState::InProgress);
}

#[tokio::test(start_paused = true)]
async fn test_forced_end_and_subscription() {
    let mut mgr = SessionManager::new(SessionConfig {
        auto_start: false,
        ..SessionConfig::default()
    });
    let session = mgr.create_session();
    let handle = mgr.handle(session).unwrap().clone();
    let mut states = handle.subscribe(Some(Field::SessionState)).await.unwrap();

    let (a, _) = handle.join("Ada", dummy_sender()).await.unwrap();
    let (b, _) = handle.join("Bo", dummy_sender()).await.unwrap();
    handle.set_ready(a, true).await.unwrap();
    handle.set_ready(b, true).await.unwrap();
    assert_eq!(handle.info().await.unwrap().state, SessionState::Lobby);

    handle.try_start().await.unwrap();
    assert!(handle.end_match(true).await.unwrap());
    assert!(!handle.end_match(false).await.unwrap());
    handle.return_to_lobby().await.unwrap();

    let mut seen = Vec::new();
    while let Ok(change) = states.try_recv() {
        seen.push(change.new);
    }
    assert_eq!(
        seen,
        vec![
            FieldValue::State(SessionState::Starting),
            FieldValue::State(SessionState::InProgress),
            FieldValue::State(SessionState::Ended),
            FieldValue::State(SessionState::Lobby),
        ]
    );
    let summary = handle.summary(b).await.unwrap().unwrap();
    assert_eq!(summary.subtitle, "Shadows win!");
    assert!(summary.win);
    let info = handle.info().await.unwrap();
    assert!(info.remaining_time.is_none());
}
