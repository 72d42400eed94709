use crate::{modules, Data, Error};
use poise::serenity_prelude as serenity;
use tracing::{error, info};

/// Central handler for non-command gateway events. Component interactions
/// are routed by custom-id prefix; membership events feed the RSVP cleanup
/// cascade.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            if let Err(e) =
                modules::events::interactions::handle_component(ctx, component, data).await
            {
                error!(
                    custom_id = %component.data.custom_id,
                    "Error handling component interaction: {e:?}"
                );
            }
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            if let Err(e) =
                modules::events::membership::handle_member_leave(ctx, *guild_id, user, data).await
            {
                error!(
                    user_id = user.id.get(),
                    "Error clearing RSVPs for departed member: {e:?}"
                );
            }
        }
        _ => {}
    }

    Ok(())
}
