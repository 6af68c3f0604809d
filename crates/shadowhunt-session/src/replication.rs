//! Authority-owned fields and their change notifications.
//!
//! Only the session mutates a [`Replicated`] field. Every effective change
//! is published on the [`ChangeBus`] after the new value is in place, as a
//! discrete `(old, new)` pair. Writes that don't change the value publish
//! nothing. There is no atomicity across fields: observers see each change
//! on its own.

use shadowhunt_protocol::{
    ActorStatus, EntityRef, Field, FieldChange, FieldValue, FormState, Role, SessionState,
};
use tokio::sync::mpsc;
use tracing::trace;

/// Receiving end of a subscription.
pub type ChangeReceiver = mpsc::UnboundedReceiver<FieldChange>;

/// Conversion into the wire representation of a field value.
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl ToFieldValue for f32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Number(*self)
    }
}

impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

impl ToFieldValue for Option<Role> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Role(*self)
    }
}

impl ToFieldValue for ActorStatus {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Status(*self)
    }
}

impl ToFieldValue for FormState {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Form(*self)
    }
}

impl ToFieldValue for SessionState {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::State(*self)
    }
}

/// A value the authority owns and observers mirror.
#[derive(Debug, Clone)]
pub struct Replicated<T> {
    entity: EntityRef,
    field: Field,
    value: T,
}

impl<T> Replicated<T>
where
    T: Clone + PartialEq + ToFieldValue,
{
    pub fn new(entity: EntityRef, field: Field, value: T) -> Self {
        Self {
            entity,
            field,
            value,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    pub fn field(&self) -> Field {
        self.field
    }

    /// Stores `value`, then notifies. Returns `false` (and stays silent)
    /// when the value didn't change.
    pub fn set(&mut self, value: T, bus: &mut ChangeBus) -> bool {
        if self.value == value {
            return false;
        }
        let old = std::mem::replace(&mut self.value, value);
        bus.publish(FieldChange {
            entity: self.entity,
            field: self.field,
            old: old.to_field_value(),
            new: self.value.to_field_value(),
        });
        true
    }
}

/// Fan-out of field changes to per-field subscribers.
///
/// Also keeps every published change until [`take_pending`] so the session
/// can forward them to participants in order.
///
/// [`take_pending`]: ChangeBus::take_pending
#[derive(Debug, Default)]
pub struct ChangeBus {
    subscribers: Vec<(Option<Field>, mpsc::UnboundedSender<FieldChange>)>,
    pending: Vec<FieldChange>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes one field across every entity.
    pub fn subscribe(&mut self, field: Field) -> ChangeReceiver {
        self.add_subscriber(Some(field))
    }

    /// Observes every field.
    pub fn subscribe_all(&mut self) -> ChangeReceiver {
        self.add_subscriber(None)
    }

    fn add_subscriber(&mut self, filter: Option<Field>) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push((filter, tx));
        rx
    }

    /// Delivers `change` to matching subscribers. Subscribers whose
    /// receiver is gone are dropped.
    pub fn publish(&mut self, change: FieldChange) {
        trace!(entity = ?change.entity, field = ?change.field, "field changed");
        self.subscribers.retain(|(filter, tx)| {
            if filter.is_none_or(|f| f == change.field) {
                tx.send(change.clone()).is_ok()
            } else {
                !tx.is_closed()
            }
        });
        self.pending.push(change);
    }

    /// Changes published since the last call, oldest first.
    pub fn take_pending(&mut self) -> Vec<FieldChange> {
        std::mem::take(&mut self.pending)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowhunt_protocol::ParticipantId;

    fn ready_field() -> Replicated<bool> {
        Replicated::new(EntityRef::Participant(ParticipantId(1)), Field::Ready, false)
    }

    #[test]
    fn test_set_publishes_old_and_new() {
        let mut bus = ChangeBus::new();
        let mut rx = bus.subscribe(Field::Ready);
        let mut ready = ready_field();

        assert!(ready.set(true, &mut bus));
        let change = rx.try_recv().unwrap();
        assert_eq!(change.old, FieldValue::Bool(false));
        assert_eq!(change.new, FieldValue::Bool(true));
        assert!(*ready.get());
    }

    #[test]
    fn test_unchanged_write_is_silent() {
        let mut bus = ChangeBus::new();
        let mut rx = bus.subscribe_all();
        let mut ready = ready_field();
        assert!(!ready.set(false, &mut bus));
        assert!(rx.try_recv().is_err());
        assert!(bus.take_pending().is_empty());
    }

    #[test]
    fn test_subscribers_only_see_their_field() {
        let mut bus = ChangeBus::new();
        let mut health_rx = bus.subscribe(Field::Health);
        let mut ready = ready_field();
        ready.set(true, &mut bus);
        assert!(health_rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut bus = ChangeBus::new();
        let rx = bus.subscribe(Field::Ready);
        drop(rx);
        let mut ready = ready_field();
        ready.set(true, &mut bus);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_pending_keeps_order() {
        let mut bus = ChangeBus::new();
        let mut ready = ready_field();
        ready.set(true, &mut bus);
        ready.set(false, &mut bus);
        let pending = bus.take_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].new, FieldValue::Bool(false));
    }
}
