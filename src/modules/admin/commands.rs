use crate::db::entities::designated_channels;
use crate::db::entities::event_permissions::{self, EventPermission};
use crate::db::entities::guild_configs;
use crate::{Context, Data, Error};
use poise::serenity_prelude as serenity;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        set_digest_channel(),
        set_default_restricted_roles(),
        designate_event_channel(),
        undesignate_event_channel(),
        event_permissions(),
    ]
}

async fn reply_ephemeral(ctx: &Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

fn guild_id_of(ctx: &Context<'_>) -> Result<i64, Error> {
    Ok(ctx
        .guild_id()
        .ok_or_else(|| anyhow::anyhow!("This command is only available in a guild"))?
        .get() as i64)
}

async fn load_or_default(db: &sea_orm::DatabaseConnection, guild_id: i64) -> Result<guild_configs::ActiveModel, Error> {
    Ok(match guild_configs::Entity::find_by_id(guild_id).one(db).await? {
        Some(model) => model.into(),
        None => guild_configs::ActiveModel {
            guild_id: Set(guild_id),
            digest_channel_id: Set(None),
            default_restricted_role_ids: Set(serde_json::json!([])),
        },
    })
}

/// Set (or clear) the channel receiving the periodic events digest
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set_digest_channel(
    ctx: Context<'_>,
    #[description = "Channel for the digest; omit to disable it"] channel: Option<serenity::Channel>,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;
    let db = &ctx.data().db;

    let mut config = load_or_default(db, guild_id).await?;
    let channel_id = channel.as_ref().map(|c| c.id().get() as i64);
    config.digest_channel_id = Set(channel_id);
    save_config(db, guild_id, config).await?;

    match channel_id {
        Some(id) => reply_ephemeral(&ctx, format!("Digest channel set to <#{id}>.")).await,
        None => reply_ephemeral(&ctx, "Digest broadcasts disabled for this guild.").await,
    }
}

/// Set the roles barred from RSVP interactions on every event
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set_default_restricted_roles(
    ctx: Context<'_>,
    #[description = "First restricted role"] role1: Option<serenity::Role>,
    #[description = "Second restricted role"] role2: Option<serenity::Role>,
    #[description = "Third restricted role"] role3: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;
    let db = &ctx.data().db;

    let mut role_ids: Vec<i64> = [role1, role2, role3]
        .into_iter()
        .flatten()
        .map(|r| r.id.get() as i64)
        .collect();
    role_ids.sort_unstable();
    role_ids.dedup();

    let mut config = load_or_default(db, guild_id).await?;
    config.default_restricted_role_ids = Set(serde_json::json!(role_ids));
    save_config(db, guild_id, config).await?;

    if role_ids.is_empty() {
        reply_ephemeral(&ctx, "All default restricted roles removed.").await
    } else {
        let mentions = role_ids
            .iter()
            .map(|id| format!("<@&{id}>"))
            .collect::<Vec<_>>()
            .join(", ");
        reply_ephemeral(&ctx, format!("Default restricted roles set: {mentions}.")).await
    }
}

async fn save_config(
    db: &sea_orm::DatabaseConnection,
    guild_id: i64,
    config: guild_configs::ActiveModel,
) -> Result<(), Error> {
    use sea_orm::ActiveValue;
    let exists = guild_configs::Entity::find_by_id(guild_id).one(db).await?.is_some();
    if exists {
        config.update(db).await?;
    } else {
        let mut config = config;
        config.guild_id = ActiveValue::Set(guild_id);
        config.insert(db).await?;
    }
    Ok(())
}

/// Approve a channel for event roster postings
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn designate_event_channel(
    ctx: Context<'_>,
    #[description = "Channel to approve for event postings"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;
    let channel_id = channel.id().get() as i64;

    designated_channels::Entity::insert(designated_channels::ActiveModel {
        guild_id: Set(guild_id),
        channel_id: Set(channel_id),
    })
    .on_conflict(
        OnConflict::columns([
            designated_channels::Column::GuildId,
            designated_channels::Column::ChannelId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(&ctx.data().db)
    .await?;

    reply_ephemeral(
        &ctx,
        format!("<#{channel_id}> is now designated for event postings."),
    )
    .await
}

/// Remove a channel from the event posting list
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn undesignate_event_channel(
    ctx: Context<'_>,
    #[description = "Channel to remove from event postings"] channel: serenity::Channel,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;
    let channel_id = channel.id().get() as i64;

    let result = designated_channels::Entity::delete_many()
        .filter(designated_channels::Column::GuildId.eq(guild_id))
        .filter(designated_channels::Column::ChannelId.eq(channel_id))
        .exec(&ctx.data().db)
        .await?;

    if result.rows_affected == 0 {
        reply_ephemeral(
            &ctx,
            format!("<#{channel_id}> was not designated for event postings."),
        )
        .await
    } else {
        reply_ephemeral(
            &ctx,
            format!("<#{channel_id}> removed from event postings."),
        )
        .await
    }
}

/// Manage role-based event permissions
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    subcommands("grant", "revoke", "list")
)]
pub async fn event_permissions(ctx: Context<'_>) -> Result<(), Error> {
    reply_ephemeral(
        &ctx,
        "Use a subcommand: `/event_permissions grant`, `/event_permissions revoke` or `/event_permissions list`.",
    )
    .await
}

/// Grant an event permission to a role
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn grant(
    ctx: Context<'_>,
    #[description = "Role receiving the permission"] role: serenity::Role,
    #[description = "Permission to grant"] permission: EventPermission,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;

    event_permissions::Entity::insert(event_permissions::ActiveModel {
        guild_id: Set(guild_id),
        role_id: Set(role.id.get() as i64),
        permission: Set(permission),
    })
    .on_conflict(
        OnConflict::columns([
            event_permissions::Column::GuildId,
            event_permissions::Column::RoleId,
            event_permissions::Column::Permission,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(&ctx.data().db)
    .await?;

    reply_ephemeral(
        &ctx,
        format!("Granted `{permission}` to <@&{}>.", role.id.get()),
    )
    .await
}

/// Revoke an event permission from a role
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn revoke(
    ctx: Context<'_>,
    #[description = "Role losing the permission"] role: serenity::Role,
    #[description = "Permission to revoke"] permission: EventPermission,
) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;

    event_permissions::Entity::delete_many()
        .filter(event_permissions::Column::GuildId.eq(guild_id))
        .filter(event_permissions::Column::RoleId.eq(role.id.get() as i64))
        .filter(event_permissions::Column::Permission.eq(permission))
        .exec(&ctx.data().db)
        .await?;

    reply_ephemeral(
        &ctx,
        format!("Revoked `{permission}` from <@&{}>.", role.id.get()),
    )
    .await
}

/// List the event permissions configured for this guild
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = guild_id_of(&ctx)?;

    let grants = ctx.data().permissions.grants_for_guild(guild_id).await?;
    if grants.is_empty() {
        return reply_ephemeral(&ctx, "No event permissions configured.").await;
    }

    let lines = grants
        .iter()
        .map(|g| format!("- <@&{}>: `{}`", g.role_id, g.permission))
        .collect::<Vec<_>>()
        .join("\n");
    reply_ephemeral(&ctx, format!("**Event permissions:**\n{lines}")).await
}
