use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "guild_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    /// Channel receiving the periodic upcoming-events digest.
    pub digest_channel_id: Option<i64>,
    /// Role ids barred from RSVP interactions on every event in the guild.
    pub default_restricted_role_ids: Json,
}

impl Model {
    pub fn default_restricted_roles(&self) -> Vec<i64> {
        serde_json::from_value(self.default_restricted_role_ids.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
