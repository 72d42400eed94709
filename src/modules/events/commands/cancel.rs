use super::{actor_context, say_ephemeral};
use crate::db::entities::event_permissions::EventPermission;
use crate::db::entities::events::{self, EventStatus};
use crate::modules::events::panel;
use crate::services::delivery::deliver_all;
use crate::services::notify::NotificationIntentBuilder;
use crate::{Context, Error};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use tracing::info;

/// Cancel an event and notify confirmed attendees
#[poise::command(slash_command, guild_only)]
pub async fn cancel(
    ctx: Context<'_>,
    #[description = "Event ID (shown in the roster footer)"] event_id: i32,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (guild_id, is_admin, roles) = actor_context(&ctx).await?;

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
            EventPermission::DeleteAnyEvent,
        )
        .await?;
    if !allowed {
        say_ephemeral(&ctx, "You don't have permission to cancel this event.").await?;
        return Ok(());
    }

    let partition = data.ledger.partition(event_id).await?;
    let intents = NotificationIntentBuilder::cancellation(&event, &partition.confirmed);

    if let Some(role_id) = event.temp_role_id {
        data.roles
            .delete_role(
                event.guild_id,
                role_id,
                &format!("Event '{}' cancelled", event.title),
            )
            .await;
    }

    // Cancelled panels linger for an hour before the purge sweep removes
    // them.
    let mut update: events::ActiveModel = event.clone().into();
    update.status = Set(EventStatus::Cancelled);
    update.delete_message_after = Set(Some(Utc::now().naive_utc() + Duration::hours(1)));
    update.temp_role_id = Set(None);
    update.update(&data.db).await?;

    deliver_all(data.notifier.as_ref(), &intents).await;
    panel::refresh_panel(ctx.http(), &data.db, &data.ledger, event_id).await?;

    info!(event_id, "event cancelled");
    say_ephemeral(
        &ctx,
        format!(
            "Event **'{}'** cancelled. The posted message will be removed in about an hour.",
            event.title
        ),
    )
    .await?;
    Ok(())
}
