use crate::db::entities::events;
use crate::db::entities::guild_configs;
use crate::db::entities::rsvps::RsvpStatus;
use crate::modules::events::panel;
use crate::services::capacity::RoleChange;
use crate::services::delivery::deliver_all;
use crate::services::error::EventError;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::info;

/// Routes component interactions by custom-id prefix.
/// `rsvp:{status}` lives on the roster panel and resolves the event through
/// the posted message id; `attend:{event_id}:{answer}` is the correlation
/// id carried by confirmation-reminder DMs.
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let custom_id = interaction.data.custom_id.as_str();

    if let Some(status) = custom_id.strip_prefix("rsvp:") {
        let requested = match status {
            "confirmed" => RsvpStatus::Confirmed,
            "declined" => RsvpStatus::Declined,
            "tentative" => RsvpStatus::Tentative,
            _ => return Ok(()),
        };
        return handle_rsvp_button(ctx, interaction, data, requested).await;
    }

    if let Some(rest) = custom_id.strip_prefix("attend:") {
        let mut parts = rest.splitn(2, ':');
        let event_id: i32 = match parts.next().and_then(|id| id.parse().ok()) {
            Some(id) => id,
            None => return Ok(()),
        };
        let attending = matches!(parts.next(), Some("yes"));
        return handle_attendance_answer(ctx, interaction, data, event_id, attending).await;
    }

    Ok(())
}

async fn ephemeral_followup(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), Error> {
    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn handle_rsvp_button(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    requested: RsvpStatus,
) -> Result<(), Error> {
    interaction
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let Some(member) = interaction.member.as_ref() else {
        return Ok(());
    };

    // The roster message is the join point back to the event row.
    let message_id = interaction.message.id.get() as i64;
    let Some(event) = events::Entity::find()
        .filter(events::Column::MessageId.eq(message_id))
        .one(&data.db)
        .await?
    else {
        ephemeral_followup(ctx, interaction, "This event could not be found.").await?;
        return Ok(());
    };

    let member_roles: Vec<i64> = member.roles.iter().map(|r| r.get() as i64).collect();
    if is_restricted(&data.db, &event, &member_roles).await? {
        ephemeral_followup(
            ctx,
            interaction,
            "You cannot interact with this event (restricted role).",
        )
        .await?;
        return Ok(());
    }

    let user_id = interaction.user.id.get() as i64;
    let outcome = match data.resolver.apply_rsvp(event.id, user_id, requested).await {
        Ok(outcome) => outcome,
        Err(e) => {
            ephemeral_followup(ctx, interaction, e.user_message()).await?;
            if matches!(e, EventError::Persistence(_) | EventError::CapacityInvariantViolation { .. }) {
                return Err(e.into());
            }
            return Ok(());
        }
    };

    apply_role_change(
        data,
        guild_id.get() as i64,
        user_id,
        outcome.event.temp_role_id,
        outcome.role_change,
    )
    .await;
    deliver_all(data.notifier.as_ref(), &outcome.intents).await;
    panel::refresh_panel(&ctx.http, &data.db, &data.ledger, event.id).await?;

    if requested == RsvpStatus::Confirmed && outcome.final_status == RsvpStatus::Waitlisted {
        ephemeral_followup(
            ctx,
            interaction,
            "The event is full, so you were added to the waitlist.",
        )
        .await?;
    }

    Ok(())
}

async fn handle_attendance_answer(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    event_id: i32,
    attending: bool,
) -> Result<(), Error> {
    let user_id = interaction.user.id.get() as i64;

    let closing_note = if attending {
        info!(event_id, user_id, "attendance reconfirmed");
        format!("Attendance confirmed for event {event_id}. See you there! ✅")
    } else {
        match data
            .resolver
            .apply_rsvp(event_id, user_id, RsvpStatus::Declined)
            .await
        {
            Ok(outcome) => {
                apply_role_change(
                    data,
                    outcome.event.guild_id,
                    user_id,
                    outcome.event.temp_role_id,
                    outcome.role_change,
                )
                .await;
                deliver_all(data.notifier.as_ref(), &outcome.intents).await;
                panel::refresh_panel(&ctx.http, &data.db, &data.ledger, event_id).await?;
                info!(event_id, user_id, "attendance withdrawn via reminder");
                format!("Understood, your spot for event {event_id} was released. ❌")
            }
            // The event may have been cancelled since the reminder went out.
            Err(e) => e.user_message(),
        }
    };

    // Replace the reminder's buttons so the answer can't be re-submitted.
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(closing_note)
                    .components(vec![]),
            ),
        )
        .await?;

    Ok(())
}

/// Restricted roles come from the event itself plus the guild-wide default
/// list; holding any of them blocks RSVP interaction.
async fn is_restricted(
    db: &sea_orm::DatabaseConnection,
    event: &events::Model,
    member_roles: &[i64],
) -> Result<bool, EventError> {
    let mut restricted = event.restricted_roles();

    if let Some(config) = guild_configs::Entity::find_by_id(event.guild_id).one(db).await? {
        restricted.extend(config.default_restricted_roles());
    }

    Ok(member_roles.iter().any(|role| restricted.contains(role)))
}

pub(crate) async fn apply_role_change(
    data: &Data,
    guild_id: i64,
    user_id: i64,
    temp_role_id: Option<i64>,
    change: Option<RoleChange>,
) {
    let (Some(role_id), Some(change)) = (temp_role_id, change) else {
        return;
    };
    match change {
        RoleChange::Grant => data.roles.grant(guild_id, user_id, role_id).await,
        RoleChange::Revoke => data.roles.revoke(guild_id, user_id, role_id).await,
    }
}
