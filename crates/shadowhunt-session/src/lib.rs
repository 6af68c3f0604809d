//! Session lifecycle for Shadowhunt.
//!
//! A session is one lobby that turns into one match at a time. It runs as
//! an isolated Tokio task (actor model) owning a synchronous [`Session`]
//! authority; the outside world talks to it through a [`SessionHandle`].
//!
//! # Key types
//!
//! - [`Session`]: the authority: membership, readiness, roles, clock
//! - [`SessionHandle`]: send commands to a running session actor
//! - [`SessionManager`]: creates sessions, routes participants
//! - [`Replicated`] / [`ChangeBus`]: authority-owned fields and their
//!   `(old, new)` change notifications
//! - [`SessionConfig`] / [`RolePolicy`]: session settings

mod actor;
mod config;
mod error;
mod manager;
mod participant;
mod replication;
mod roles;
mod session;

pub use actor::{NotificationSender, SessionHandle};
pub use config::{RolePolicy, SessionConfig};
pub use error::SessionError;
pub use manager::SessionManager;
pub use participant::{Participant, ParticipantIds};
pub use replication::{ChangeBus, ChangeReceiver, Replicated, ToFieldValue};
pub use roles::assign_roles;
pub use session::{Session, SessionInfo};
