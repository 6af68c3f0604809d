use std::time::Duration;

use shadowhunt::prelude::*;
use shadowhunt::sim::{Aabb, LampConfig};
use tracing::info;

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A small yard: a wall in the middle, a lamp over the key, the exit north.
fn yard() -> LevelConfig {
    LevelConfig {
        blockers: vec![Aabb::new(Vec3::new(-1.0, -1.0, -3.0), Vec3::new(1.0, 3.0, 3.0))],
        lamps: vec![LampConfig {
            position: Vec3::new(10.0, 0.0, 10.0),
            radius: 2.0,
            interaction_range: 4.0,
            on: true,
        }],
        keys: vec![TriggerZone {
            position: Vec3::new(10.0, 0.0, 10.0),
            radius: 0.75,
        }],
        exits: vec![TriggerZone {
            position: Vec3::new(0.0, 0.0, 12.0),
            radius: 1.0,
        }],
        stations: vec![Vec3::new(-10.0, 0.0, -2.0)],
        guardian_spawns: vec![Vec3::new(-4.0, 0.0, 0.0)],
        shadow_spawns: vec![Vec3::new(10.0, 0.0, 0.0)],
        ..LevelConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Who {
    Guardian,
    Shadow,
}

/// What each side does, by tick number.
fn script() -> Vec<(u32, Who, Request)> {
    use Who::*;
    vec![
        (0, Guardian, Request::Aim { direction: Vec3::X }),
        (0, Guardian, Request::ToggleFlashlight),
        // Behind the wall: inside the beam's reach but shielded.
        (1, Shadow, Request::Move { position: Vec3::new(6.0, 0.0, 0.0) }),
        (3, Shadow, Request::DivePressed),
        (8, Shadow, Request::Move { position: Vec3::new(10.0, 0.0, 5.0) }),
        (10, Shadow, Request::DiveReleased),
        (12, Guardian, Request::ToggleFlashlight),
        (12, Guardian, Request::Move { position: Vec3::new(-10.0, 0.0, -2.0) }),
        (13, Guardian, Request::StartCharging { station: StationId(0) }),
        // Close enough to reach the lamp, outside its glow.
        (14, Shadow, Request::Move { position: Vec3::new(10.0, 0.0, 6.5) }),
        (15, Shadow, Request::ToggleLamp { lamp: LampId(0) }),
        (16, Shadow, Request::Move { position: Vec3::new(10.0, 0.0, 10.0) }),
        (18, Shadow, Request::Move { position: Vec3::new(5.0, 0.0, 11.0) }),
        (20, Shadow, Request::Move { position: Vec3::new(0.0, 0.0, 12.0) }),
    ]
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

fn load_config() -> Result<ServerConfig, ShadowhuntError> {
    match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path),
        None => Ok(ServerConfig::default()),
    }
}

fn main() -> Result<(), ShadowhuntError> {
    let mut config = load_config()?;
    init_tracing(&config.log_filter)?;

    config.session.role_policy = RolePolicy::HostIsGuardian;
    config.session.match_config.level = yard();
    let dt = config
        .session
        .tick
        .tick_duration()
        .unwrap_or(Duration::from_millis(100));

    let mut session = Session::new(SessionId(1), config.session);
    let (guardian, _) = session.join("Warden")?;
    let (shadow, _) = session.join("Moth")?;
    session.set_ready(guardian, true)?;
    session.set_ready(shadow, true)?;
    if session.state() != SessionState::InProgress {
        session.try_start()?;
    }

    let script = script();
    let mut tick = 0u32;
    while session.state() == SessionState::InProgress {
        for (_, who, request) in script.iter().filter(|(at, _, _)| *at == tick) {
            let participant = match who {
                Who::Guardian => guardian,
                Who::Shadow => shadow,
            };
            session.submit(participant, request.clone())?;
        }
        session.tick(dt);

        for (_, notification) in session.take_notifications() {
            match notification {
                Notification::Event(event) => info!(tick, ?event, "event"),
                Notification::Change(change) => {
                    info!(tick, entity = ?change.entity, field = ?change.field, new = ?change.new, "change")
                }
                Notification::Snapshot { .. }
                | Notification::ParticipantLeft { .. }
                | Notification::MatchEnded { .. } => {}
            }
        }
        tick += 1;
    }

    for (name, id) in [("Warden", guardian), ("Moth", shadow)] {
        if let Some(summary) = session.summary(id) {
            info!(name, win = summary.win, subtitle = %summary.subtitle, "result");
        }
    }
    Ok(())
}
