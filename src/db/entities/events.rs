use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of an event. Transitions are one-way: once a row leaves
/// `Active` it never returns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EventStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "message_purged_cancelled")]
    MessagePurgedCancelled,
    #[sea_orm(string_value = "message_purged_completed")]
    MessagePurgedCompleted,
}

impl EventStatus {
    /// Terminal variant a purged message transitions into.
    pub fn purged(self) -> EventStatus {
        match self {
            EventStatus::Cancelled | EventStatus::MessagePurgedCancelled => {
                EventStatus::MessagePurgedCancelled
            }
            _ => EventStatus::MessagePurgedCompleted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub guild_id: i64,
    pub channel_id: i64,
    pub creator_id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Scheduled start, UTC.
    pub event_time: DateTime,
    pub activity_type: String,
    pub max_attendees: i32,
    pub created_at: DateTime,
    pub status: EventStatus,
    pub delete_message_after: Option<DateTime>,
    pub reminder_sent: bool,
    pub confirmation_reminder_sent: bool,
    /// Mentionable role granted to confirmed and waitlisted attendees.
    pub temp_role_id: Option<i64>,
    /// Posted roster message, if still present.
    pub message_id: Option<i64>,
    /// Role ids barred from interacting with this event's RSVP buttons.
    pub restricted_role_ids: Json,
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == EventStatus::Active
    }

    pub fn restricted_roles(&self) -> Vec<i64> {
        serde_json::from_value(self.restricted_role_ids.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
