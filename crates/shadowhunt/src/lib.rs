//! # Shadowhunt
//!
//! Authoritative core for an asymmetric hide-and-seek game: Guardians
//! carry flashlights, Shadows avoid light, find the key, and escape.
//!
//! The crates underneath split the work:
//!
//! - `shadowhunt-protocol`: ids, requests, notifications, codecs
//! - `shadowhunt-tick`: the fixed-timestep scheduler and game clock
//! - `shadowhunt-sim`: lights, visibility, health, batteries, shadow form,
//!   objectives and the per-tick [`Match`] pass
//! - `shadowhunt-session`: lobbies, roles, replication, session actors
//!
//! This crate ties them together behind [`Server`] and re-exports what a
//! host needs through [`prelude`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shadowhunt::prelude::*;
//!
//! # async fn run() -> Result<(), ShadowhuntError> {
//! let server = Server::new(ServerConfig::default());
//! let mut host = server.connect("Host").await?;
//! let guest = server.connect("Guest").await?;
//! host.set_ready(true).await?;
//! guest.set_ready(true).await?;
//! while let Some(notification) = host.recv().await {
//!     if let Notification::MatchEnded { local_participant_won, .. } = notification {
//!         println!("won: {local_participant_won}");
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod server;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::ShadowhuntError;
pub use server::{Connection, Server};

pub use shadowhunt_protocol as protocol;
pub use shadowhunt_session as session;
pub use shadowhunt_sim as sim;
pub use shadowhunt_sim::Match;
pub use shadowhunt_tick as tick;

/// Everything a host usually needs, in one import.
pub mod prelude {
    pub use crate::telemetry::init_tracing;
    pub use crate::{Connection, Server, ServerConfig, ShadowhuntError};

    pub use shadowhunt_protocol::{
        ActorStatus, Codec, EndReason, Field, FieldChange, FieldValue, FormState, GameEvent,
        JsonCodec, LampId, MatchOutcome, MatchSummary, Notification, ParticipantId, Request,
        Role, SessionId, SessionState, SlotIndex, StationId, Vec3,
    };
    pub use shadowhunt_session::{
        RolePolicy, Session, SessionConfig, SessionError, SessionHandle, SessionManager,
    };
    pub use shadowhunt_sim::{
        ActionError, Level, LevelConfig, Match, MatchConfig, SphereLight, SpotLight,
        TriggerZone,
    };
}
