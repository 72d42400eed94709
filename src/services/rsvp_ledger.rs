use crate::db::entities::events::{self, EventStatus};
use crate::db::entities::rsvps::{self, RsvpStatus};
use crate::services::error::EventError;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// The four attendance buckets of one event. Each bucket is ordered FIFO by
/// `(rsvp_at, id)` ascending; the waitlist's head is the next user promoted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RsvpPartition {
    pub confirmed: Vec<i64>,
    pub declined: Vec<i64>,
    pub tentative: Vec<i64>,
    pub waitlisted: Vec<i64>,
}

impl RsvpPartition {
    pub fn status_of(&self, user_id: i64) -> Option<RsvpStatus> {
        if self.confirmed.contains(&user_id) {
            Some(RsvpStatus::Confirmed)
        } else if self.declined.contains(&user_id) {
            Some(RsvpStatus::Declined)
        } else if self.tentative.contains(&user_id) {
            Some(RsvpStatus::Tentative)
        } else if self.waitlisted.contains(&user_id) {
            Some(RsvpStatus::Waitlisted)
        } else {
            None
        }
    }

    pub fn bucket(&self, status: RsvpStatus) -> &[i64] {
        match status {
            RsvpStatus::Confirmed => &self.confirmed,
            RsvpStatus::Declined => &self.declined,
            RsvpStatus::Tentative => &self.tentative,
            RsvpStatus::Waitlisted => &self.waitlisted,
        }
    }
}

/// Dumb, consistent attendance store. Capacity enforcement lives in the
/// resolver, never here.
#[derive(Clone)]
pub struct RsvpLedger {
    db: DatabaseConnection,
}

impl RsvpLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upserts the (event, user) record with the current timestamp.
    pub async fn record_status(
        &self,
        event_id: i32,
        user_id: i64,
        status: RsvpStatus,
    ) -> Result<(), EventError> {
        let model = rsvps::ActiveModel {
            event_id: Set(event_id),
            user_id: Set(user_id),
            status: Set(status),
            rsvp_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        rsvps::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([rsvps::Column::EventId, rsvps::Column::UserId])
                    .update_columns([rsvps::Column::Status, rsvps::Column::RsvpAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn remove(&self, event_id: i32, user_id: i64) -> Result<(), EventError> {
        rsvps::Entity::delete_many()
            .filter(rsvps::Column::EventId.eq(event_id))
            .filter(rsvps::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn partition(&self, event_id: i32) -> Result<RsvpPartition, EventError> {
        let records = rsvps::Entity::find()
            .filter(rsvps::Column::EventId.eq(event_id))
            .order_by_asc(rsvps::Column::RsvpAt)
            .order_by_asc(rsvps::Column::Id)
            .all(&self.db)
            .await?;

        let mut partition = RsvpPartition::default();
        for record in records {
            match record.status {
                RsvpStatus::Confirmed => partition.confirmed.push(record.user_id),
                RsvpStatus::Declined => partition.declined.push(record.user_id),
                RsvpStatus::Tentative => partition.tentative.push(record.user_id),
                RsvpStatus::Waitlisted => partition.waitlisted.push(record.user_id),
            }
        }

        Ok(partition)
    }

    /// Ids of active events in `guild_id` where the user holds any RSVP.
    /// Drives the cleanup cascade when a member leaves the guild.
    pub async fn active_event_ids_for_user(
        &self,
        user_id: i64,
        guild_id: i64,
    ) -> Result<Vec<i32>, EventError> {
        let active_ids = events::Entity::find()
            .filter(events::Column::GuildId.eq(guild_id))
            .filter(events::Column::Status.eq(EventStatus::Active))
            .select_only()
            .column(events::Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;

        if active_ids.is_empty() {
            return Ok(vec![]);
        }

        let event_ids = rsvps::Entity::find()
            .filter(rsvps::Column::UserId.eq(user_id))
            .filter(rsvps::Column::EventId.is_in(active_ids))
            .select_only()
            .column(rsvps::Column::EventId)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;

        Ok(event_ids)
    }
}
