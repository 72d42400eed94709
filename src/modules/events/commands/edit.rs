use super::{actor_context, say_ephemeral};
use crate::db::entities::event_permissions::EventPermission;
use crate::db::entities::events;
use crate::modules::events::commands::create::truncated_title;
use crate::modules::events::{datetime_parser, panel};
use crate::services::delivery::deliver_all;
use crate::services::notify::NotificationIntentBuilder;
use crate::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tracing::{info, warn};

/// Edit an event's details
#[poise::command(slash_command, guild_only)]
pub async fn edit(
    ctx: Context<'_>,
    #[description = "Event ID (shown in the roster footer)"] event_id: i32,
    #[description = "New title"] title: Option<String>,
    #[description = "New description, or 'x' to remove it"] description: Option<String>,
    #[description = "New start time as DD/MM HH:MM (local)"] datetime: Option<String>,
    #[description = "New maximum attendees"]
    #[min = 1]
    #[max = 100]
    capacity: Option<u32>,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (guild_id, is_admin, roles) = actor_context(&ctx).await?;

    // Event fields are read-modify-write; hold the event lock like every
    // other roster mutation.
    let _guard = data.locks.acquire(event_id).await;

    let Some(event) = events::Entity::find_by_id(event_id).one(&data.db).await? else {
        say_ephemeral(&ctx, format!("Event {event_id} was not found.")).await?;
        return Ok(());
    };
    if !event.is_active() {
        say_ephemeral(&ctx, format!("Event {event_id} is no longer open.")).await?;
        return Ok(());
    }

    let allowed = data
        .permissions
        .is_event_manager(
            guild_id,
            ctx.author().id.get() as i64,
            event.creator_id,
            is_admin,
            &roles,
            EventPermission::EditAnyEvent,
        )
        .await?;
    if !allowed {
        say_ephemeral(&ctx, "You don't have permission to edit this event.").await?;
        return Ok(());
    }

    let new_time = match &datetime {
        Some(raw) => {
            match datetime_parser::parse_event_time(raw, Utc::now(), data.settings.digest_offset)
            {
                Some(parsed) => Some(parsed),
                None => {
                    say_ephemeral(
                        &ctx,
                        format!("Could not read '{raw}' as a future `DD/MM HH:MM` time; time unchanged."),
                    )
                    .await?;
                    None
                }
            }
        }
        None => None,
    };

    let final_title = title
        .as_ref()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| event.title.clone());
    let final_time = new_time.unwrap_or(event.event_time);
    let title_changed = final_title != event.title;
    let time_changed = final_time != event.event_time;

    let mut update: events::ActiveModel = event.clone().into();
    update.title = Set(final_title.clone());
    update.event_time = Set(final_time);
    if let Some(desc) = &description {
        if desc.trim().eq_ignore_ascii_case("x") || desc.trim().is_empty() {
            update.description = Set(None);
        } else {
            update.description = Set(Some(desc.trim().to_string()));
        }
    }
    // Capacity growth opens seats for future confirmations only; nobody is
    // retroactively promoted.
    if let Some(cap) = capacity {
        update.max_attendees = Set(cap as i32);
    }
    let updated = update.update(&data.db).await?;

    if time_changed {
        if let Some(intent) = NotificationIntentBuilder::reschedule(&event, final_time) {
            deliver_all(data.notifier.as_ref(), std::slice::from_ref(&intent)).await;
        }
    }

    if (title_changed || time_changed) && updated.temp_role_id.is_some() {
        rename_event_role(&ctx, &updated).await;
    }

    panel::refresh_panel(ctx.http(), &data.db, &data.ledger, event_id).await?;

    info!(event_id, title_changed, time_changed, "event edited");
    say_ephemeral(&ctx, format!("Event **'{final_title}'** updated.")).await?;
    Ok(())
}

async fn rename_event_role(ctx: &Context<'_>, event: &events::Model) {
    let Some(role_id) = event.temp_role_id else {
        return;
    };
    let offset = ctx.data().settings.digest_offset;
    let local_date = event.event_time.and_utc().with_timezone(&offset).date_naive();
    let name = format!(
        "Event {} - {} - {}",
        event.id,
        truncated_title(&event.title),
        local_date.format("%d/%m")
    );

    if let Err(e) = serenity::GuildId::new(event.guild_id as u64)
        .edit_role(
            ctx.http(),
            serenity::RoleId::new(role_id as u64),
            serenity::EditRole::new().name(name),
        )
        .await
    {
        warn!(event_id = event.id, "Could not rename event role: {e:?}");
    }
}
