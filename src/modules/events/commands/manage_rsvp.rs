use super::{actor_context, say_ephemeral};
use crate::db::entities::event_permissions::EventPermission;
use crate::db::entities::events;
use crate::db::entities::rsvps::RsvpStatus;
use crate::modules::events::interactions::apply_role_change;
use crate::modules::events::panel;
use crate::services::delivery::deliver_all;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use sea_orm::EntityTrait;
use tracing::info;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RsvpAction {
    #[name = "confirm"]
    Confirm,
    #[name = "decline"]
    Decline,
    #[name = "tentative"]
    Tentative,
    #[name = "remove"]
    Remove,
}

/// Set or remove another user's RSVP
#[poise::command(slash_command, guild_only)]
pub async fn manage_rsvp(
    ctx: Context<'_>,
    #[description = "Event ID (shown in the roster footer)"] event_id: i32,
    #[description = "What to do with the user's RSVP"] action: RsvpAction,
    #[description = "The user whose RSVP to change"] user: serenity::User,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;
    let data = ctx.data();
    let (guild_id, is_admin, roles) = actor_context(&ctx).await?;

    let Some(event) = events::Entity::find_by_id(event_id).one(&data.db).await? else {
        say_ephemeral(&ctx, format!("Event {event_id} was not found.")).await?;
        return Ok(());
    };

    let allowed = data
        .permissions
        .is_event_manager(
            guild_id,
            ctx.author().id.get() as i64,
            event.creator_id,
            is_admin,
            &roles,
            EventPermission::ManageAnyRsvp,
        )
        .await?;
    if !allowed {
        say_ephemeral(&ctx, "You don't have permission to manage RSVPs on this event.").await?;
        return Ok(());
    }

    let target_id = user.id.get() as i64;
    let summary = match action {
        RsvpAction::Remove => {
            let outcome = match data.resolver.remove_rsvp(event_id, target_id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    say_ephemeral(&ctx, e.user_message()).await?;
                    return Ok(());
                }
            };
            apply_role_change(
                data,
                guild_id,
                target_id,
                outcome.event.temp_role_id,
                outcome.role_change,
            )
            .await;
            deliver_all(data.notifier.as_ref(), &outcome.intents).await;
            format!("RSVP of <@{target_id}> removed.")
        }
        _ => {
            let requested = match action {
                RsvpAction::Confirm => RsvpStatus::Confirmed,
                RsvpAction::Decline => RsvpStatus::Declined,
                _ => RsvpStatus::Tentative,
            };
            let outcome = match data.resolver.apply_rsvp(event_id, target_id, requested).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    say_ephemeral(&ctx, e.user_message()).await?;
                    return Ok(());
                }
            };
            apply_role_change(
                data,
                guild_id,
                target_id,
                outcome.event.temp_role_id,
                outcome.role_change,
            )
            .await;
            deliver_all(data.notifier.as_ref(), &outcome.intents).await;
            format!("<@{target_id}> is now **{}**.", outcome.final_status)
        }
    };

    panel::refresh_panel(ctx.http(), &data.db, &data.ledger, event_id).await?;

    info!(event_id, target_id, "rsvp managed by organizer");
    say_ephemeral(&ctx, summary).await?;
    Ok(())
}
