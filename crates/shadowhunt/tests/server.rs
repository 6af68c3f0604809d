//! Integration tests for the in-process server front door.

use std::time::Duration;

use shadowhunt::prelude::*;

fn quick_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.session.seed = Some(11);
    config.session.match_config.max_game_time = Duration::from_secs(2);
    config
}

async fn next_match_end(conn: &mut Connection) -> (bool, bool) {
    while let Some(notification) = conn.recv().await {
        if let Notification::MatchEnded {
            shadows_won,
            local_participant_won,
        } = notification
        {
            return (shadows_won, local_participant_won);
        }
    }
    panic!("connection closed before the match ended");
}

// =========================================================================
// Connecting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_two_connections_share_a_lobby() {
    let server = Server::new(quick_config());
    let host = server.connect("Host").await.unwrap();
    let guest = server.connect("Guest").await.unwrap();

    assert_eq!(host.session(), guest.session());
    assert_eq!(host.slot(), SlotIndex(0));
    assert_eq!(guest.slot(), SlotIndex(1));
    assert_eq!(server.list_sessions().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_full_lobby_spills_into_new_session() {
    let mut config = quick_config();
    config.session.max_participants = 2;
    config.session.auto_start = false;
    let server = Server::new(config);

    let a = server.connect("a").await.unwrap();
    let b = server.connect("b").await.unwrap();
    let c = server.connect("c").await.unwrap();
    assert_eq!(a.session(), b.session());
    assert_ne!(a.session(), c.session());
}

#[tokio::test(start_paused = true)]
async fn test_connect_to_unknown_session() {
    let server = Server::new(quick_config());
    let result = server.connect_to(SessionId(404), "Lost").await;
    assert!(matches!(
        result,
        Err(ShadowhuntError::Session(SessionError::NotFound(_)))
    ));
}

// =========================================================================
// Frames
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_frames_round_trip_through_codec() {
    let server = Server::new(quick_config());
    let mut host = server.connect("Host").await.unwrap();
    // Drop the join notification.
    host.try_recv();

    host.send_frame(br#"{"type":"SetReady","ready":true}"#)
        .await
        .unwrap();

    let frame = host.recv_frame().await.unwrap().unwrap();
    let notification: Notification = JsonCodec.decode(&frame).unwrap();
    match notification {
        Notification::Change(change) => {
            assert_eq!(change.field, Field::Ready);
            assert_eq!(change.new, FieldValue::Bool(true));
        }
        other => panic!("expected a ready change, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_is_protocol_error() {
    let server = Server::new(quick_config());
    let host = server.connect("Host").await.unwrap();
    let err = host.send_frame(b"{\"type\":\"Teleport\"}").await.unwrap_err();
    assert!(matches!(err, ShadowhuntError::Protocol(_)));
}

#[tokio::test(start_paused = true)]
async fn test_gameplay_request_in_lobby_is_refused() {
    let server = Server::new(quick_config());
    let host = server.connect("Host").await.unwrap();
    let err = host.send(Request::ToggleFlashlight).await.unwrap_err();
    assert!(matches!(
        err,
        ShadowhuntError::Session(SessionError::InvalidTransition(_))
    ));
}

// =========================================================================
// Matches
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_match_runs_to_time_out() {
    let server = Server::new(quick_config());
    let mut host = server.connect("Host").await.unwrap();
    let mut guest = server.connect("Guest").await.unwrap();
    host.set_ready(true).await.unwrap();
    guest.set_ready(true).await.unwrap();

    let info = server.session_info(host.session()).await.unwrap();
    assert_eq!(info.state, SessionState::InProgress);

    // Host guards by default; the clock running out is their win.
    assert_eq!(next_match_end(&mut host).await, (false, true));
    assert_eq!(next_match_end(&mut guest).await, (false, false));
}

#[tokio::test(start_paused = true)]
async fn test_forced_end_then_lobby() {
    let server = Server::new(quick_config());
    let mut host = server.connect("Host").await.unwrap();
    let guest = server.connect("Guest").await.unwrap();
    host.set_ready(true).await.unwrap();
    guest.set_ready(true).await.unwrap();

    let session = host.session();
    assert!(server.end_match(session, true).await.unwrap());
    assert!(!server.end_match(session, true).await.unwrap());
    assert_eq!(next_match_end(&mut host).await, (true, false));

    server.return_to_lobby(session).await.unwrap();
    let info = server.session_info(session).await.unwrap();
    assert_eq!(info.state, SessionState::Lobby);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_connection_leaves_session() {
    let server = Server::new(quick_config());
    let host = server.connect("Host").await.unwrap();
    let session = host.session();
    {
        let _guest = server.connect("Guest").await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    let info = server.session_info(session).await.unwrap();
    assert_eq!(info.participant_count, 1);

    host.leave().await.unwrap();
    let info = server.session_info(session).await.unwrap();
    assert_eq!(info.participant_count, 0);
}
