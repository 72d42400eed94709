use crate::db::entities::events;
use crate::services::render;
use crate::services::rsvp_ledger::RsvpLedger;
use crate::Error;
use poise::serenity_prelude as serenity;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::warn;

/// Posts the roster panel for a freshly created event and stores the
/// message reference.
pub async fn post_panel(
    http: &serenity::Http,
    db: &DatabaseConnection,
    ledger: &RsvpLedger,
    event: &events::Model,
) -> Result<serenity::MessageId, Error> {
    let partition = ledger.partition(event.id).await?;
    let message = serenity::ChannelId::new(event.channel_id as u64)
        .send_message(
            http,
            serenity::CreateMessage::new()
                .embed(render::event_embed(event, &partition))
                .components(vec![render::rsvp_buttons()]),
        )
        .await?;

    let mut update: events::ActiveModel = event.clone().into();
    update.message_id = Set(Some(message.id.get() as i64));
    update.update(db).await?;

    Ok(message.id)
}

/// Re-renders the posted panel from current state. Active events get the
/// roster and buttons; cancelled/completed events get their terminal embed
/// with the buttons stripped. Missing messages are logged and ignored.
pub async fn refresh_panel(
    http: &serenity::Http,
    db: &DatabaseConnection,
    ledger: &RsvpLedger,
    event_id: i32,
) -> Result<(), Error> {
    let Some(event) = events::Entity::find_by_id(event_id).one(db).await? else {
        return Ok(());
    };
    let Some(message_id) = event.message_id else {
        return Ok(());
    };

    let edit = if event.is_active() {
        let partition = ledger.partition(event.id).await?;
        serenity::EditMessage::new()
            .embed(render::event_embed(&event, &partition))
            .components(vec![render::rsvp_buttons()])
    } else {
        serenity::EditMessage::new()
            .embed(render::finalized_embed(&event))
            .components(vec![])
    };

    if let Err(e) = serenity::ChannelId::new(event.channel_id as u64)
        .edit_message(http, serenity::MessageId::new(message_id as u64), edit)
        .await
    {
        warn!(event_id, "Could not refresh roster panel: {e:?}");
    }

    Ok(())
}
