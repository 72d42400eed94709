use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    poise::ChoiceParameter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EventPermission {
    #[sea_orm(string_value = "create_events")]
    CreateEvents,
    #[sea_orm(string_value = "edit_any_event")]
    EditAnyEvent,
    #[sea_orm(string_value = "delete_any_event")]
    DeleteAnyEvent,
    #[sea_orm(string_value = "manage_any_rsvp")]
    ManageAnyRsvp,
}

impl std::fmt::Display for EventPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventPermission::CreateEvents => write!(f, "create_events"),
            EventPermission::EditAnyEvent => write!(f, "edit_any_event"),
            EventPermission::DeleteAnyEvent => write!(f, "delete_any_event"),
            EventPermission::ManageAnyRsvp => write!(f, "manage_any_rsvp"),
        }
    }
}

/// Grants `permission` to every member holding `role_id` in `guild_id`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "event_permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub permission: EventPermission,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
