use crate::modules::events::panel;
use crate::services::delivery::deliver_all;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

/// A departing member's RSVPs are removed from every active event in the
/// guild; vacated confirmed seats promote the waitlist head as usual.
pub async fn handle_member_leave(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    data: &Data,
) -> Result<(), Error> {
    let user_id = user.id.get() as i64;
    let event_ids = data
        .ledger
        .active_event_ids_for_user(user_id, guild_id.get() as i64)
        .await?;

    if event_ids.is_empty() {
        return Ok(());
    }

    info!(
        user_id,
        guild_id = guild_id.get(),
        events = event_ids.len(),
        "member left, clearing their RSVPs"
    );

    for event_id in event_ids {
        match data.resolver.remove_rsvp(event_id, user_id).await {
            Ok(outcome) => {
                // No role cleanup for the departed user: their membership
                // (and with it the role) is already gone.
                deliver_all(data.notifier.as_ref(), &outcome.intents).await;
                panel::refresh_panel(&ctx.http, &data.db, &data.ledger, event_id).await?;
            }
            Err(e) => {
                tracing::warn!(event_id, user_id, "RSVP cleanup skipped: {e}");
            }
        }
    }

    Ok(())
}
