use crate::db::entities::events::EventStatus;

/// Failures surfaced by the RSVP ledger, capacity resolver and lifecycle
/// scheduler. Command handlers convert these into ephemeral replies; the
/// scheduler catches them per event so one bad row never stalls a sweep.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event {0} not found")]
    EventNotFound(i32),

    #[error("event {event_id} is no longer active (status {status:?})")]
    EventClosed { event_id: i32, status: EventStatus },

    /// Defensive only: the resolver decides final statuses synchronously
    /// under the event lock, so this should be unreachable.
    #[error("event {event_id} has {confirmed} confirmed attendees over capacity {capacity}")]
    CapacityInvariantViolation {
        event_id: i32,
        confirmed: usize,
        capacity: usize,
    },

    #[error("event {0} is locked by another update")]
    ConcurrentModification(i32),

    #[error("storage failure: {0}")]
    Persistence(#[from] sea_orm::DbErr),
}

impl EventError {
    /// Message shown to the interacting user. Storage internals stay in the
    /// operator log.
    pub fn user_message(&self) -> String {
        match self {
            EventError::EventNotFound(id) => format!("Event {id} was not found."),
            EventError::EventClosed { event_id, .. } => {
                format!("Event {event_id} is no longer open.")
            }
            EventError::ConcurrentModification(_) => {
                "The event is busy right now, try again in a moment.".to_string()
            }
            _ => "Something went wrong while updating the event.".to_string(),
        }
    }
}

/// Best-effort delivery failure. Logged by the delivery layer, never
/// propagated into ledger state.
#[derive(Debug, thiserror::Error)]
#[error("delivery failed: {reason}")]
pub struct DeliveryFailure {
    pub reason: String,
}

impl DeliveryFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
