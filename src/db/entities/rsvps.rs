use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RsvpStatus {
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "declined")]
    Declined,
    #[sea_orm(string_value = "tentative")]
    Tentative,
    #[sea_orm(string_value = "waitlisted")]
    Waitlisted,
}

impl RsvpStatus {
    /// Statuses that carry the event's temp role.
    pub fn holds_role(self) -> bool {
        matches!(self, RsvpStatus::Confirmed | RsvpStatus::Waitlisted)
    }
}

impl std::fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsvpStatus::Confirmed => write!(f, "confirmed"),
            RsvpStatus::Declined => write!(f, "declined"),
            RsvpStatus::Tentative => write!(f, "tentative"),
            RsvpStatus::Waitlisted => write!(f, "waitlisted"),
        }
    }
}

/// One attendance record per (event, user). Ordering within a status is
/// FIFO by (rsvp_at, id); waitlist promotion depends on it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "rsvps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub user_id: i64,
    pub status: RsvpStatus,
    pub rsvp_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
