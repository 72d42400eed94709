use crate::db::entities::events;
use crate::db::entities::rsvps::RsvpStatus;
use crate::services::error::EventError;
use crate::services::locks::EventLockService;
use crate::services::notify::{NotificationIntent, NotificationIntentBuilder};
use crate::services::rsvp_ledger::{RsvpLedger, RsvpPartition};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tracing::info;

/// Temp-role membership adjustment owed to a user after a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Grant,
    Revoke,
}

/// A waitlisted user moved into a confirmed seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
    pub user_id: i64,
}

/// Result of applying one RSVP request.
#[derive(Debug, Clone)]
pub struct RsvpOutcome {
    pub event: events::Model,
    pub final_status: RsvpStatus,
    pub previous_status: Option<RsvpStatus>,
    /// Role adjustment for the acting user, if any.
    pub role_change: Option<RoleChange>,
    pub promotion: Option<Promotion>,
    pub intents: Vec<NotificationIntent>,
}

/// Result of removing a user's record outright (member left, manager
/// removal).
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    pub event: events::Model,
    pub previous_status: Option<RsvpStatus>,
    pub role_change: Option<RoleChange>,
    pub promotion: Option<Promotion>,
    pub intents: Vec<NotificationIntent>,
}

/// Decides the final status for a request against the current roster.
/// Confirmation requests overflow onto the waitlist once the confirmed
/// bucket reaches capacity; every other status passes through untouched.
pub(crate) fn decide_status(
    requested: RsvpStatus,
    current: Option<RsvpStatus>,
    confirmed_count: usize,
    capacity: usize,
) -> RsvpStatus {
    match requested {
        RsvpStatus::Confirmed => {
            if current == Some(RsvpStatus::Confirmed) || confirmed_count < capacity {
                RsvpStatus::Confirmed
            } else {
                RsvpStatus::Waitlisted
            }
        }
        other => other,
    }
}

/// Head of the waitlist, if a seat is actually free.
pub(crate) fn plan_promotion(partition: &RsvpPartition, capacity: usize) -> Option<i64> {
    if partition.confirmed.len() < capacity {
        partition.waitlisted.first().copied()
    } else {
        None
    }
}

fn role_change_between(
    previous: Option<RsvpStatus>,
    current: Option<RsvpStatus>,
) -> Option<RoleChange> {
    let held = previous.is_some_and(RsvpStatus::holds_role);
    let holds = current.is_some_and(RsvpStatus::holds_role);
    match (held, holds) {
        (false, true) => Some(RoleChange::Grant),
        (true, false) => Some(RoleChange::Revoke),
        _ => None,
    }
}

/// The capacity/promotion state machine. Every mutation of one event's
/// roster runs under that event's lock, so no two capacity decisions for
/// the same event can interleave.
pub struct CapacityResolver {
    db: DatabaseConnection,
    ledger: RsvpLedger,
    locks: Arc<EventLockService>,
}

impl CapacityResolver {
    pub fn new(db: DatabaseConnection, ledger: RsvpLedger, locks: Arc<EventLockService>) -> Self {
        Self { db, ledger, locks }
    }

    async fn load_active_event(&self, event_id: i32) -> Result<events::Model, EventError> {
        let event = events::Entity::find_by_id(event_id)
            .one(&self.db)
            .await?
            .ok_or(EventError::EventNotFound(event_id))?;

        if !event.is_active() {
            return Err(EventError::EventClosed {
                event_id,
                status: event.status,
            });
        }

        Ok(event)
    }

    /// Applies one RSVP request and returns the decided status plus the role
    /// and notification side effects the caller owes.
    pub async fn apply_rsvp(
        &self,
        event_id: i32,
        user_id: i64,
        requested: RsvpStatus,
    ) -> Result<RsvpOutcome, EventError> {
        let _guard = self.locks.acquire(event_id).await;

        let event = self.load_active_event(event_id).await?;
        let capacity = event.max_attendees.max(1) as usize;

        let before = self.ledger.partition(event_id).await?;
        let previous = before.status_of(user_id);
        let final_status = decide_status(requested, previous, before.confirmed.len(), capacity);

        // Re-requesting the held status is a pure refresh: no write, so a
        // waitlisted re-confirmer keeps their place in the queue.
        if previous != Some(final_status) {
            self.ledger
                .record_status(event_id, user_id, final_status)
                .await?;
        }

        let role_change = role_change_between(previous, Some(final_status));

        let mut promotion = None;
        let mut intents = Vec::new();
        let vacated_confirmed_seat =
            previous == Some(RsvpStatus::Confirmed) && final_status != RsvpStatus::Confirmed;
        if vacated_confirmed_seat {
            promotion = self.promote_head(&event, capacity, &mut intents).await?;
        }

        self.check_capacity_invariant(&event, capacity).await?;

        if previous != Some(final_status) {
            info!(
                event_id,
                user_id,
                requested = %requested,
                decided = %final_status,
                "rsvp applied"
            );
        }

        Ok(RsvpOutcome {
            event,
            final_status,
            previous_status: previous,
            role_change,
            promotion,
            intents,
        })
    }

    /// Removes the user's record entirely and promotes into the vacated
    /// seat if there was one.
    pub async fn remove_rsvp(
        &self,
        event_id: i32,
        user_id: i64,
    ) -> Result<RemovalOutcome, EventError> {
        let _guard = self.locks.acquire(event_id).await;

        let event = self.load_active_event(event_id).await?;
        let capacity = event.max_attendees.max(1) as usize;

        let before = self.ledger.partition(event_id).await?;
        let previous = before.status_of(user_id);
        self.ledger.remove(event_id, user_id).await?;

        let role_change = role_change_between(previous, None);

        let mut promotion = None;
        let mut intents = Vec::new();
        if previous == Some(RsvpStatus::Confirmed) {
            promotion = self.promote_head(&event, capacity, &mut intents).await?;
        }

        self.check_capacity_invariant(&event, capacity).await?;

        info!(event_id, user_id, "rsvp removed");

        Ok(RemovalOutcome {
            event,
            previous_status: previous,
            role_change,
            promotion,
            intents,
        })
    }

    /// One vacancy frees at most one seat, so at most one user is promoted
    /// per vacating action.
    async fn promote_head(
        &self,
        event: &events::Model,
        capacity: usize,
        intents: &mut Vec<NotificationIntent>,
    ) -> Result<Option<Promotion>, EventError> {
        let after = self.ledger.partition(event.id).await?;
        let Some(promoted_id) = plan_promotion(&after, capacity) else {
            return Ok(None);
        };

        self.ledger
            .record_status(event.id, promoted_id, RsvpStatus::Confirmed)
            .await?;
        intents.push(NotificationIntentBuilder::promotion(event, promoted_id));

        info!(
            event_id = event.id,
            user_id = promoted_id,
            "waitlisted user promoted to confirmed"
        );

        Ok(Some(Promotion {
            user_id: promoted_id,
        }))
    }

    async fn check_capacity_invariant(
        &self,
        event: &events::Model,
        capacity: usize,
    ) -> Result<(), EventError> {
        let partition = self.ledger.partition(event.id).await?;
        if partition.confirmed.len() > capacity {
            return Err(EventError::CapacityInvariantViolation {
                event_id: event.id,
                confirmed: partition.confirmed.len(),
                capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_status_respects_capacity() {
        // Free seat: confirm sticks.
        assert_eq!(
            decide_status(RsvpStatus::Confirmed, None, 1, 2),
            RsvpStatus::Confirmed
        );
        // Full: overflow to the waitlist.
        assert_eq!(
            decide_status(RsvpStatus::Confirmed, None, 2, 2),
            RsvpStatus::Waitlisted
        );
        // Already confirmed: idempotent even when full.
        assert_eq!(
            decide_status(RsvpStatus::Confirmed, Some(RsvpStatus::Confirmed), 2, 2),
            RsvpStatus::Confirmed
        );
    }

    #[test]
    fn test_decide_status_ignores_capacity_for_non_confirming() {
        assert_eq!(
            decide_status(RsvpStatus::Declined, Some(RsvpStatus::Confirmed), 2, 2),
            RsvpStatus::Declined
        );
        assert_eq!(
            decide_status(RsvpStatus::Tentative, None, 2, 2),
            RsvpStatus::Tentative
        );
    }

    #[test]
    fn test_plan_promotion_takes_fifo_head() {
        let partition = RsvpPartition {
            confirmed: vec![1],
            waitlisted: vec![30, 40, 50],
            ..Default::default()
        };
        assert_eq!(plan_promotion(&partition, 2), Some(30));
    }

    #[test]
    fn test_plan_promotion_requires_free_seat_and_waiters() {
        let full = RsvpPartition {
            confirmed: vec![1, 2],
            waitlisted: vec![30],
            ..Default::default()
        };
        assert_eq!(plan_promotion(&full, 2), None);

        let empty_waitlist = RsvpPartition {
            confirmed: vec![1],
            ..Default::default()
        };
        assert_eq!(plan_promotion(&empty_waitlist, 2), None);
    }

    #[test]
    fn test_role_change_tracks_attendee_statuses() {
        assert_eq!(
            role_change_between(None, Some(RsvpStatus::Confirmed)),
            Some(RoleChange::Grant)
        );
        assert_eq!(
            role_change_between(Some(RsvpStatus::Declined), Some(RsvpStatus::Waitlisted)),
            Some(RoleChange::Grant)
        );
        assert_eq!(
            role_change_between(Some(RsvpStatus::Confirmed), Some(RsvpStatus::Declined)),
            Some(RoleChange::Revoke)
        );
        assert_eq!(
            role_change_between(Some(RsvpStatus::Waitlisted), Some(RsvpStatus::Confirmed)),
            None
        );
        assert_eq!(role_change_between(None, Some(RsvpStatus::Tentative)), None);
    }
}
