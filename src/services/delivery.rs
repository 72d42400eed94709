use crate::services::error::DeliveryFailure;
use crate::services::notify::{MessageKind, NotificationIntent, Recipient};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// Outbound delivery collaborator. Fire-and-forget: callers log failures
/// and move on; nothing here ever rolls back ledger state.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), DeliveryFailure>;
}

/// Delegated-role collaborator. All operations are best-effort.
#[async_trait::async_trait]
pub trait RoleGateway: Send + Sync {
    async fn grant(&self, guild_id: i64, user_id: i64, role_id: i64);
    async fn revoke(&self, guild_id: i64, user_id: i64, role_id: i64);
    async fn delete_role(&self, guild_id: i64, role_id: i64, reason: &str);
}

fn unix_ts(time: chrono::NaiveDateTime) -> i64 {
    time.and_utc().timestamp()
}

/// Renders the message body for an intent. Confirmation requests also carry
/// yes/no buttons keyed by `attend:{event_id}:{answer}`.
fn render_content(intent: &NotificationIntent) -> String {
    let ctx = &intent.context;
    let link = ctx
        .message_link
        .as_deref()
        .unwrap_or("(link unavailable)");

    match intent.kind {
        MessageKind::Promotion => format!(
            "🎉 A spot opened up for **'{}'**, you are now confirmed!",
            ctx.title
        ),
        MessageKind::ReminderStandard => format!(
            "🔔 **Reminder!** The event **'{}'** starts in about 15 minutes!\n{}",
            ctx.title, link
        ),
        MessageKind::ReminderConfirmRequest => format!(
            "⏳ Reminder: **'{}'** starts in about an hour. Still planning to attend?",
            ctx.title
        ),
        MessageKind::Cancellation => format!(
            "ℹ️ The event **'{}'** you had signed up for was cancelled.",
            ctx.title
        ),
        MessageKind::Reschedule => {
            let when = ctx.rescheduled_to.unwrap_or(ctx.event_time);
            format!(
                "📢 Heads up! The event **'{}'** was rescheduled to <t:{}:F>.",
                ctx.title,
                unix_ts(when)
            )
        }
    }
}

fn confirm_buttons(event_id: i32) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(format!("attend:{event_id}:yes"))
            .style(serenity::ButtonStyle::Success)
            .label("Yes, I'll be there"),
        serenity::CreateButton::new(format!("attend:{event_id}:no"))
            .style(serenity::ButtonStyle::Danger)
            .label("Can't make it"),
    ])
}

/// Discord-backed delivery: DMs for user recipients, channel posts with a
/// role mention for broadcasts. Consecutive DMs are paced to respect rate
/// limits; pacing affects latency only, never correctness.
pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
    dm_pacing: Duration,
}

impl DiscordNotifier {
    pub fn new(http: Arc<serenity::Http>, dm_pacing: Duration) -> Self {
        Self { http, dm_pacing }
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), DeliveryFailure> {
        let content = render_content(intent);

        let mut message = serenity::CreateMessage::new().content(content);
        if intent.kind == MessageKind::ReminderConfirmRequest {
            message = message.components(vec![confirm_buttons(intent.context.event_id)]);
        }

        match &intent.recipient {
            Recipient::User(user_id) => {
                let channel = serenity::UserId::new(*user_id as u64)
                    .create_dm_channel(&self.http)
                    .await
                    .map_err(|e| DeliveryFailure::new(format!("dm channel: {e}")))?;
                channel
                    .id
                    .send_message(&self.http, message)
                    .await
                    .map_err(|e| DeliveryFailure::new(format!("dm send: {e}")))?;
                // Pause between DMs so bulk sends stay under the radar of
                // external rate limits.
                sleep(self.dm_pacing).await;
            }
            Recipient::Channel {
                channel_id,
                mention_role_id,
            } => {
                let mut message = message;
                if let Some(role_id) = mention_role_id {
                    message = serenity::CreateMessage::new()
                        .content(format!("<@&{}> {}", role_id, render_content(intent)));
                }
                serenity::ChannelId::new(*channel_id as u64)
                    .send_message(&self.http, message)
                    .await
                    .map_err(|e| DeliveryFailure::new(format!("channel send: {e}")))?;
            }
        }

        Ok(())
    }
}

/// Delivers a batch, logging each failure and carrying on.
pub async fn deliver_all(notifier: &dyn Notifier, intents: &[NotificationIntent]) {
    for intent in intents {
        if let Err(e) = notifier.deliver(intent).await {
            warn!(kind = ?intent.kind, recipient = ?intent.recipient, "delivery skipped: {e}");
        }
    }
}

pub struct DiscordRoleGateway {
    http: Arc<serenity::Http>,
}

impl DiscordRoleGateway {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl RoleGateway for DiscordRoleGateway {
    async fn grant(&self, guild_id: i64, user_id: i64, role_id: i64) {
        if let Err(e) = self
            .http
            .add_member_role(
                serenity::GuildId::new(guild_id as u64),
                serenity::UserId::new(user_id as u64),
                serenity::RoleId::new(role_id as u64),
                Some("Event attendee"),
            )
            .await
        {
            error!(guild_id, user_id, role_id, "failed to grant event role: {e:?}");
        }
    }

    async fn revoke(&self, guild_id: i64, user_id: i64, role_id: i64) {
        if let Err(e) = self
            .http
            .remove_member_role(
                serenity::GuildId::new(guild_id as u64),
                serenity::UserId::new(user_id as u64),
                serenity::RoleId::new(role_id as u64),
                Some("No longer attending event"),
            )
            .await
        {
            error!(guild_id, user_id, role_id, "failed to revoke event role: {e:?}");
        }
    }

    async fn delete_role(&self, guild_id: i64, role_id: i64, reason: &str) {
        if let Err(e) = self
            .http
            .delete_role(
                serenity::GuildId::new(guild_id as u64),
                serenity::RoleId::new(role_id as u64),
                Some(reason),
            )
            .await
        {
            error!(guild_id, role_id, "failed to delete event role: {e:?}");
        }
    }
}
