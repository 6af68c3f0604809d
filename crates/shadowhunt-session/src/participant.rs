//! Lobby members.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shadowhunt_protocol::{EntityRef, Field, ParticipantId, Role};

use crate::replication::{ChangeBus, Replicated};

/// Shared source of participant ids.
///
/// Every session created by one [`SessionManager`](crate::SessionManager)
/// draws from the same source, so ids never collide across sessions.
#[derive(Debug, Clone, Default)]
pub struct ParticipantIds(Arc<AtomicU64>);

impl ParticipantIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> ParticipantId {
        ParticipantId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// One connection's membership in a session.
///
/// Outlives the lobby → match transition; the in-match avatar is a separate
/// [`GameActor`](shadowhunt_sim::GameActor).
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    display_name: Replicated<String>,
    ready: Replicated<bool>,
    role: Replicated<Option<Role>>,
}

impl Participant {
    pub(crate) fn new(id: ParticipantId, display_name: String) -> Self {
        let entity = EntityRef::Participant(id);
        Self {
            id,
            display_name: Replicated::new(entity, Field::DisplayName, display_name),
            ready: Replicated::new(entity, Field::Ready, false),
            role: Replicated::new(entity, Field::Role, None),
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        self.display_name.get()
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.get()
    }

    /// `None` until roles are assigned.
    pub fn role(&self) -> Option<Role> {
        *self.role.get()
    }

    pub(crate) fn set_display_name(&mut self, name: String, bus: &mut ChangeBus) -> bool {
        self.display_name.set(name, bus)
    }

    pub(crate) fn set_ready(&mut self, ready: bool, bus: &mut ChangeBus) -> bool {
        self.ready.set(ready, bus)
    }

    pub(crate) fn set_role(&mut self, role: Option<Role>, bus: &mut ChangeBus) -> bool {
        self.role.set(role, bus)
    }
}

/// Trims `name`, rejecting names that are empty after trimming.
pub(crate) fn clean_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
