//! End-to-end RSVP state machine scenarios: capacity enforcement, FIFO
//! waitlist promotion, idempotent re-requests and the departure cascade.

mod common;

use common::{insert_event, test_db, EventSeed};
use fireteam_events::db::entities::events::EventStatus;
use fireteam_events::db::entities::rsvps::{self, RsvpStatus};
use fireteam_events::services::capacity::{CapacityResolver, RoleChange};
use fireteam_events::services::error::EventError;
use fireteam_events::services::locks::EventLockService;
use fireteam_events::services::notify::{MessageKind, Recipient};
use fireteam_events::services::rsvp_ledger::RsvpLedger;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;

fn resolver_for(db: &DatabaseConnection) -> (CapacityResolver, RsvpLedger) {
    let ledger = RsvpLedger::new(db.clone());
    let resolver = CapacityResolver::new(
        db.clone(),
        ledger.clone(),
        Arc::new(EventLockService::new()),
    );
    (resolver, ledger)
}

const A: i64 = 11;
const B: i64 = 22;
const C: i64 = 33;
const D: i64 = 44;

#[tokio::test]
async fn capacity_two_promotion_chain() {
    let db = test_db().await;
    let (resolver, ledger) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 2,
            ..Default::default()
        },
    )
    .await;

    for user in [A, B] {
        let outcome = resolver
            .apply_rsvp(event.id, user, RsvpStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(outcome.final_status, RsvpStatus::Confirmed);
    }

    // Third confirmer overflows onto the waitlist.
    let outcome = resolver
        .apply_rsvp(event.id, C, RsvpStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Waitlisted);
    assert!(outcome.promotion.is_none());

    // A vacates: B keeps their seat, C is promoted, waitlist drains.
    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Declined)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Declined);
    assert_eq!(outcome.promotion.as_ref().map(|p| p.user_id), Some(C));
    assert_eq!(outcome.role_change, Some(RoleChange::Revoke));

    let promotion_dms: Vec<_> = outcome
        .intents
        .iter()
        .filter(|i| i.kind == MessageKind::Promotion)
        .collect();
    assert_eq!(promotion_dms.len(), 1);
    assert_eq!(promotion_dms[0].recipient, Recipient::User(C));

    let partition = ledger.partition(event.id).await.unwrap();
    assert_eq!(partition.confirmed, vec![B, C]);
    assert!(partition.waitlisted.is_empty());
    assert_eq!(partition.declined, vec![A]);
}

#[tokio::test]
async fn waitlisted_user_declining_does_not_promote() {
    let db = test_db().await;
    let (resolver, ledger) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 1,
            ..Default::default()
        },
    )
    .await;

    resolver
        .apply_rsvp(event.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap();
    let outcome = resolver
        .apply_rsvp(event.id, B, RsvpStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Waitlisted);

    // B backs out before any seat frees: nothing to promote.
    let outcome = resolver
        .apply_rsvp(event.id, B, RsvpStatus::Declined)
        .await
        .unwrap();
    assert!(outcome.promotion.is_none());
    assert!(outcome.intents.is_empty());

    let partition = ledger.partition(event.id).await.unwrap();
    assert_eq!(partition.confirmed, vec![A]);
    assert!(partition.waitlisted.is_empty());
}

#[tokio::test]
async fn reconfirm_is_idempotent_and_keeps_waitlist_position() {
    let db = test_db().await;
    let (resolver, _) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 1,
            ..Default::default()
        },
    )
    .await;

    resolver
        .apply_rsvp(event.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap();
    resolver
        .apply_rsvp(event.id, B, RsvpStatus::Confirmed)
        .await
        .unwrap();
    resolver
        .apply_rsvp(event.id, C, RsvpStatus::Confirmed)
        .await
        .unwrap();

    let stamp_before = waitlist_stamp(&db, event.id, B).await;

    // Re-requesting confirm while waitlisted must not rewrite the record,
    // or B would rotate behind C in the queue.
    let outcome = resolver
        .apply_rsvp(event.id, B, RsvpStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Waitlisted);
    assert!(outcome.promotion.is_none());

    let stamp_after = waitlist_stamp(&db, event.id, B).await;
    assert_eq!(stamp_before, stamp_after);

    // The vacancy still goes to B, the earliest waitlisted user.
    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Declined)
        .await
        .unwrap();
    assert_eq!(outcome.promotion.as_ref().map(|p| p.user_id), Some(B));
}

async fn waitlist_stamp(
    db: &DatabaseConnection,
    event_id: i32,
    user_id: i64,
) -> chrono::NaiveDateTime {
    rsvps::Entity::find()
        .filter(rsvps::Column::EventId.eq(event_id))
        .filter(rsvps::Column::UserId.eq(user_id))
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .rsvp_at
}

#[tokio::test]
async fn promotion_takes_earliest_waitlisted_user() {
    let db = test_db().await;
    let (resolver, ledger) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 1,
            ..Default::default()
        },
    )
    .await;

    for user in [A, B, C, D] {
        resolver
            .apply_rsvp(event.id, user, RsvpStatus::Confirmed)
            .await
            .unwrap();
    }

    let partition = ledger.partition(event.id).await.unwrap();
    assert_eq!(partition.waitlisted, vec![B, C, D]);

    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Tentative)
        .await
        .unwrap();
    assert_eq!(outcome.promotion.as_ref().map(|p| p.user_id), Some(B));

    // Exactly one promotion per vacancy: C and D stay waitlisted.
    let partition = ledger.partition(event.id).await.unwrap();
    assert_eq!(partition.confirmed, vec![B]);
    assert_eq!(partition.waitlisted, vec![C, D]);
}

#[tokio::test]
async fn departure_removal_promotes_waitlist_head() {
    let db = test_db().await;
    let (resolver, ledger) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 1,
            ..Default::default()
        },
    )
    .await;

    resolver
        .apply_rsvp(event.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap();
    resolver
        .apply_rsvp(event.id, B, RsvpStatus::Confirmed)
        .await
        .unwrap();

    let active = ledger.active_event_ids_for_user(A, event.guild_id).await.unwrap();
    assert_eq!(active, vec![event.id]);

    let outcome = resolver.remove_rsvp(event.id, A).await.unwrap();
    assert_eq!(outcome.previous_status, Some(RsvpStatus::Confirmed));
    assert_eq!(outcome.promotion.as_ref().map(|p| p.user_id), Some(B));

    let partition = ledger.partition(event.id).await.unwrap();
    assert_eq!(partition.confirmed, vec![B]);
    assert!(partition.waitlisted.is_empty());
    // A's record is gone, not demoted.
    assert_eq!(partition.status_of(A), None);
}

#[tokio::test]
async fn non_confirming_statuses_ignore_capacity() {
    let db = test_db().await;
    let (resolver, _) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 1,
            ..Default::default()
        },
    )
    .await;

    resolver
        .apply_rsvp(event.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap();

    // Full event, but tentative/declined never touch the waitlist.
    let outcome = resolver
        .apply_rsvp(event.id, B, RsvpStatus::Tentative)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Tentative);

    let outcome = resolver
        .apply_rsvp(event.id, C, RsvpStatus::Declined)
        .await
        .unwrap();
    assert_eq!(outcome.final_status, RsvpStatus::Declined);
}

#[tokio::test]
async fn rsvps_against_missing_or_closed_events_fail() {
    let db = test_db().await;
    let (resolver, _) = resolver_for(&db);

    let err = resolver
        .apply_rsvp(9999, A, RsvpStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::EventNotFound(9999)));

    let cancelled = insert_event(
        &db,
        EventSeed {
            status: EventStatus::Cancelled,
            ..Default::default()
        },
    )
    .await;
    let err = resolver
        .apply_rsvp(cancelled.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::EventClosed { .. }));
}

#[tokio::test]
async fn role_changes_follow_attendee_transitions() {
    let db = test_db().await;
    let (resolver, _) = resolver_for(&db);
    let event = insert_event(
        &db,
        EventSeed {
            max_attendees: 2,
            temp_role_id: Some(777),
            ..Default::default()
        },
    )
    .await;

    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(outcome.role_change, Some(RoleChange::Grant));

    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Tentative)
        .await
        .unwrap();
    assert_eq!(outcome.role_change, Some(RoleChange::Revoke));

    let outcome = resolver
        .apply_rsvp(event.id, A, RsvpStatus::Tentative)
        .await
        .unwrap();
    assert_eq!(outcome.role_change, None);
}
