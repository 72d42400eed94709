use super::{actor_context, say_ephemeral};
use crate::db::entities::designated_channels;
use crate::db::entities::event_permissions::EventPermission;
use crate::db::entities::events::{self, EventStatus};
use crate::modules::events::{datetime_parser, panel};
use crate::services::activity;
use crate::services::notify::message_link;
use crate::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, warn};

/// Create a new event and post its RSVP roster
#[poise::command(slash_command, guild_only)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Event title or activity name (known activities fill in type and size)"]
    title: String,
    #[description = "Start time as DD/MM HH:MM (local)"] datetime: String,
    #[description = "Maximum attendees (defaults to the activity's squad size)"]
    #[min = 1]
    #[max = 100]
    capacity: Option<u32>,
    #[description = "Optional description"] description: Option<String>,
    #[description = "Channel to post in (defaults to the designated channel)"]
    channel: Option<serenity::Channel>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (guild_id, is_admin, roles) = actor_context(&ctx).await?;

    if !data
        .permissions
        .has_permission(guild_id, is_admin, &roles, EventPermission::CreateEvents)
        .await?
    {
        say_ephemeral(&ctx, "You don't have permission to create events.").await?;
        return Ok(());
    }

    let Some(event_time) =
        datetime_parser::parse_event_time(&datetime, Utc::now(), data.settings.digest_offset)
    else {
        say_ephemeral(
            &ctx,
            format!("Could not read '{datetime}' as a future `DD/MM HH:MM` time."),
        )
        .await?;
        return Ok(());
    };

    let detected = activity::detect_activity(&title);
    let (final_title, activity_type) = match &detected {
        Some(d) => (d.canonical_name.clone(), d.kind.type_name().to_string()),
        None => (title.trim().to_string(), "Other".to_string()),
    };

    let Some(max_attendees) = capacity
        .map(|c| c as i32)
        .or_else(|| detected.as_ref().map(|d| d.kind.default_squad_size()))
    else {
        say_ephemeral(
            &ctx,
            "I don't know that activity; pass `capacity` so I know how many spots to open.",
        )
        .await?;
        return Ok(());
    };

    let Some(channel_id) = resolve_post_channel(&ctx, guild_id, channel).await? else {
        say_ephemeral(
            &ctx,
            "No designated event channel matched. Ask an admin to run `/designate_event_channel`, or pass `channel`.",
        )
        .await?;
        return Ok(());
    };

    let event = events::ActiveModel {
        guild_id: Set(guild_id),
        channel_id: Set(channel_id),
        creator_id: Set(ctx.author().id.get() as i64),
        title: Set(final_title.clone()),
        description: Set(description.filter(|d| !d.trim().is_empty())),
        event_time: Set(event_time),
        activity_type: Set(activity_type),
        max_attendees: Set(max_attendees),
        created_at: Set(Utc::now().naive_utc()),
        status: Set(EventStatus::Active),
        reminder_sent: Set(false),
        confirmation_reminder_sent: Set(false),
        restricted_role_ids: Set(serde_json::json!([])),
        ..Default::default()
    }
    .insert(&data.db)
    .await?;

    // Mentionable role used to address current attendees. Best-effort: the
    // event works without it, reminders just fall back to DMs.
    let temp_role_id = create_event_role(&ctx, &event, data.settings.digest_offset).await;

    let event = if let Some(role_id) = temp_role_id {
        let mut update: events::ActiveModel = event.into();
        update.temp_role_id = Set(Some(role_id));
        update.update(&data.db).await?
    } else {
        event
    };

    panel::post_panel(ctx.http(), &data.db, &data.ledger, &event).await?;

    let event = events::Entity::find_by_id(event.id)
        .one(&data.db)
        .await?
        .ok_or_else(|| anyhow::anyhow!("event {} vanished after creation", event.id))?;

    info!(
        event_id = event.id,
        guild_id,
        title = %event.title,
        "event created"
    );

    let link = message_link(&event).unwrap_or_default();
    say_ephemeral(
        &ctx,
        format!(
            "Event **'{}'** (ID {}) created with {} spots. {}",
            event.title, event.id, event.max_attendees, link
        ),
    )
    .await?;

    Ok(())
}

/// Explicit channels must be designated; otherwise the invoking channel is
/// used when designated, or the guild's single designated channel.
async fn resolve_post_channel(
    ctx: &Context<'_>,
    guild_id: i64,
    explicit: Option<serenity::Channel>,
) -> Result<Option<i64>, Error> {
    let data = ctx.data();
    let designated: Vec<i64> = designated_channels::Entity::find()
        .filter(designated_channels::Column::GuildId.eq(guild_id))
        .all(&data.db)
        .await?
        .into_iter()
        .map(|row| row.channel_id)
        .collect();

    if let Some(channel) = explicit {
        let id = channel.id().get() as i64;
        return Ok(designated.contains(&id).then_some(id));
    }

    let invoking = ctx.channel_id().get() as i64;
    if designated.contains(&invoking) {
        return Ok(Some(invoking));
    }
    match designated.as_slice() {
        [only] => Ok(Some(*only)),
        _ => Ok(None),
    }
}

async fn create_event_role(
    ctx: &Context<'_>,
    event: &events::Model,
    offset: chrono::FixedOffset,
) -> Option<i64> {
    let guild_id = serenity::GuildId::new(event.guild_id as u64);
    let local_date = event.event_time.and_utc().with_timezone(&offset).date_naive();
    let name = format!(
        "Event {} - {} - {}",
        event.id,
        truncated_title(&event.title),
        local_date.format("%d/%m")
    );

    match guild_id
        .create_role(
            ctx.http(),
            serenity::EditRole::new().name(name).mentionable(true),
        )
        .await
    {
        Ok(role) => Some(role.id.get() as i64),
        Err(e) => {
            warn!(event_id = event.id, "Could not create event role: {e:?}");
            None
        }
    }
}

pub(crate) fn truncated_title(title: &str) -> &str {
    match title.char_indices().nth(50) {
        Some((idx, _)) => &title[..idx],
        None => title,
    }
}
