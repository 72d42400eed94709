use crate::db::entities::event_permissions::{self, EventPermission};
use crate::services::error::EventError;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Role-based authorization for event management actions. Server
/// administrators always pass; everyone else needs one of their roles
/// granted the permission.
#[derive(Clone)]
pub struct PermissionService {
    db: DatabaseConnection,
}

impl PermissionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn has_permission(
        &self,
        guild_id: i64,
        is_admin: bool,
        member_role_ids: &[i64],
        permission: EventPermission,
    ) -> Result<bool, EventError> {
        if is_admin {
            return Ok(true);
        }
        if member_role_ids.is_empty() {
            return Ok(false);
        }

        let granted = event_permissions::Entity::find()
            .filter(event_permissions::Column::GuildId.eq(guild_id))
            .filter(event_permissions::Column::Permission.eq(permission))
            .filter(event_permissions::Column::RoleId.is_in(member_role_ids.to_vec()))
            .all(&self.db)
            .await?;

        Ok(!granted.is_empty())
    }

    /// Whether the actor may manage a specific event: creators always may;
    /// otherwise the "any event" permission decides.
    pub async fn is_event_manager(
        &self,
        guild_id: i64,
        actor_id: i64,
        creator_id: i64,
        is_admin: bool,
        member_role_ids: &[i64],
        permission: EventPermission,
    ) -> Result<bool, EventError> {
        if actor_id == creator_id {
            return Ok(true);
        }
        self.has_permission(guild_id, is_admin, member_role_ids, permission)
            .await
    }

    pub async fn grants_for_guild(
        &self,
        guild_id: i64,
    ) -> Result<Vec<event_permissions::Model>, EventError> {
        Ok(event_permissions::Entity::find()
            .filter(event_permissions::Column::GuildId.eq(guild_id))
            .all(&self.db)
            .await?)
    }
}
