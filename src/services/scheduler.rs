use crate::db::entities::events::{self, EventStatus};
use crate::services::delivery::{deliver_all, Notifier, RoleGateway};
use crate::services::digest;
use crate::services::error::EventError;
use crate::services::locks::EventLockService;
use crate::services::notify::NotificationIntentBuilder;
use crate::services::render;
use crate::services::rsvp_ledger::RsvpLedger;
use crate::services::settings::BotSettings;
use chrono::{Duration, NaiveDateTime, Utc};
use poise::serenity_prelude as serenity;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Selection window for the ~15 minute reminder: events starting in
/// (now+14m, now+16m]. Two minutes wide against a one-minute poll, so every
/// qualifying event is seen by at least one tick and the persisted flag
/// keeps it to exactly one.
pub fn standard_reminder_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (now + Duration::minutes(14), now + Duration::minutes(16))
}

/// Selection window for the ~1 hour reconfirmation request:
/// (now+59m, now+61m].
pub fn confirmation_reminder_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    (now + Duration::minutes(59), now + Duration::minutes(61))
}

/// Events are swept into `Completed` once they are this far past their
/// start.
pub fn completion_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now - Duration::hours(2)
}

/// Time-driven lifecycle engine: reminders, completion, message purges and
/// the digest broadcast. Each trigger is an independent periodic task; the
/// per-tick logic takes `now` explicitly and is driven by the runners.
pub struct LifecycleScheduler {
    db: DatabaseConnection,
    ledger: RsvpLedger,
    locks: Arc<EventLockService>,
    notifier: Arc<dyn Notifier>,
    roles: Arc<dyn RoleGateway>,
    settings: BotSettings,
}

impl LifecycleScheduler {
    pub fn new(
        db: DatabaseConnection,
        ledger: RsvpLedger,
        locks: Arc<EventLockService>,
        notifier: Arc<dyn Notifier>,
        roles: Arc<dyn RoleGateway>,
        settings: BotSettings,
    ) -> Self {
        Self {
            db,
            ledger,
            locks,
            notifier,
            roles,
            settings,
        }
    }

    /// Spawns every runner. Call once, after the Discord client exists.
    pub fn start(self: Arc<Self>, http: Arc<serenity::Http>) {
        self.clone().start_reminder_runner();
        self.clone().start_confirmation_runner();
        self.clone().start_completion_runner(http.clone());
        self.clone().start_purge_runner(http.clone());
        self.clone().start_digest_runner(http);
    }

    fn start_reminder_runner(self: Arc<Self>) {
        tokio::spawn(async move {
            info!("Standard reminder runner started.");
            loop {
                sleep(std::time::Duration::from_secs(60)).await;
                if let Err(e) = self.run_reminder_tick(Utc::now().naive_utc()).await {
                    error!("Reminder sweep failed: {e:?}");
                }
            }
        });
    }

    fn start_confirmation_runner(self: Arc<Self>) {
        tokio::spawn(async move {
            info!("Confirmation reminder runner started.");
            loop {
                sleep(std::time::Duration::from_secs(60)).await;
                if let Err(e) = self.run_confirmation_tick(Utc::now().naive_utc()).await {
                    error!("Confirmation reminder sweep failed: {e:?}");
                }
            }
        });
    }

    fn start_completion_runner(self: Arc<Self>, http: Arc<serenity::Http>) {
        tokio::spawn(async move {
            info!("Completion sweep runner started.");
            loop {
                sleep(std::time::Duration::from_secs(3600)).await;
                let now = Utc::now().naive_utc();
                let due = match self.completable_events(now).await {
                    Ok(due) => due,
                    Err(e) => {
                        error!("Completion sweep query failed: {e:?}");
                        continue;
                    }
                };

                for event in due {
                    match self.complete_event(event.id, now).await {
                        Ok(Some(completed)) => {
                            // Stale role and panel are Discord-side
                            // best-effort cleanup.
                            if let Some(role_id) = event.temp_role_id {
                                self.roles
                                    .delete_role(
                                        event.guild_id,
                                        role_id,
                                        &format!("Event '{}' completed", event.title),
                                    )
                                    .await;
                            }
                            edit_panel_to_final(&http, &completed).await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            error!(event_id = event.id, "Completion failed, skipping: {e:?}");
                        }
                    }
                }
            }
        });
    }

    fn start_purge_runner(self: Arc<Self>, http: Arc<serenity::Http>) {
        tokio::spawn(async move {
            info!("Message purge runner started.");
            loop {
                sleep(std::time::Duration::from_secs(300)).await;
                let now = Utc::now().naive_utc();
                let due = match self.purgeable_events(now).await {
                    Ok(due) => due,
                    Err(e) => {
                        error!("Purge sweep query failed: {e:?}");
                        continue;
                    }
                };

                for event in due {
                    if let Some(message_id) = event.message_id {
                        let channel = serenity::ChannelId::new(event.channel_id as u64);
                        // Already-deleted messages are fine; the nulled
                        // reference below is the real guard.
                        if let Err(e) = channel
                            .delete_message(&http, serenity::MessageId::new(message_id as u64))
                            .await
                        {
                            warn!(event_id = event.id, "Purging posted message failed: {e:?}");
                        }
                    }

                    if let Err(e) = self.mark_message_purged(event.id).await {
                        error!(event_id = event.id, "Purge transition failed: {e:?}");
                    }
                }
            }
        });
    }

    fn start_digest_runner(self: Arc<Self>, http: Arc<serenity::Http>) {
        tokio::spawn(async move {
            let times = self
                .settings
                .digest_times
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect::<Vec<_>>()
                .join(", ");
            info!("Digest runner started (scheduled at {times}).");

            loop {
                let now = Utc::now();
                let next = digest::next_digest_fire(
                    now,
                    &self.settings.digest_times,
                    self.settings.digest_offset,
                );
                let wait = (next - now).to_std().unwrap_or_default();
                sleep(wait).await;

                if let Err(e) = self.broadcast_digest(&http).await {
                    error!("Digest broadcast failed: {e:?}");
                }
            }
        });
    }

    /// Standard ~15 minute reminder sweep. Delivery is best-effort; the
    /// `reminder_sent` flag is persisted afterwards either way so the event
    /// is never picked up twice.
    pub async fn run_reminder_tick(&self, now: NaiveDateTime) -> Result<usize, EventError> {
        let (start, end) = standard_reminder_window(now);
        let due = events::Entity::find()
            .filter(events::Column::Status.eq(EventStatus::Active))
            .filter(events::Column::ReminderSent.eq(false))
            .filter(events::Column::EventTime.gt(start))
            .filter(events::Column::EventTime.lte(end))
            .all(&self.db)
            .await?;

        let mut fired = 0usize;
        for event in due {
            if let Err(e) = self.remind_event(&event).await {
                error!(event_id = event.id, "Reminder failed, skipping event: {e:?}");
                continue;
            }
            fired += 1;
        }

        Ok(fired)
    }

    async fn remind_event(&self, event: &events::Model) -> Result<(), EventError> {
        let _guard = self.locks.try_acquire_with_retry(event.id).await?;

        // Re-check under the lock: a cancel may have landed since selection.
        let Some(current) = events::Entity::find_by_id(event.id).one(&self.db).await? else {
            return Ok(());
        };
        if !current.is_active() || current.reminder_sent {
            return Ok(());
        }

        let partition = self.ledger.partition(current.id).await?;
        let intents =
            NotificationIntentBuilder::standard_reminder(&current, &partition.confirmed);
        deliver_all(self.notifier.as_ref(), &intents).await;

        let mut update: events::ActiveModel = current.into();
        update.reminder_sent = Set(true);
        update.update(&self.db).await?;

        info!(event_id = event.id, "standard reminder sent");
        Ok(())
    }

    /// ~1 hour reconfirmation sweep. Declines come back through the
    /// interaction handler, which demotes and promotes via the resolver.
    pub async fn run_confirmation_tick(&self, now: NaiveDateTime) -> Result<usize, EventError> {
        let (start, end) = confirmation_reminder_window(now);
        let due = events::Entity::find()
            .filter(events::Column::Status.eq(EventStatus::Active))
            .filter(events::Column::ConfirmationReminderSent.eq(false))
            .filter(events::Column::EventTime.gt(start))
            .filter(events::Column::EventTime.lte(end))
            .all(&self.db)
            .await?;

        let mut fired = 0usize;
        for event in due {
            if let Err(e) = self.request_confirmations(&event).await {
                error!(
                    event_id = event.id,
                    "Confirmation reminder failed, skipping event: {e:?}"
                );
                continue;
            }
            fired += 1;
        }

        Ok(fired)
    }

    async fn request_confirmations(&self, event: &events::Model) -> Result<(), EventError> {
        let _guard = self.locks.try_acquire_with_retry(event.id).await?;

        let Some(current) = events::Entity::find_by_id(event.id).one(&self.db).await? else {
            return Ok(());
        };
        if !current.is_active() || current.confirmation_reminder_sent {
            return Ok(());
        }

        let partition = self.ledger.partition(current.id).await?;
        let intents = NotificationIntentBuilder::confirm_requests(&current, &partition.confirmed);
        deliver_all(self.notifier.as_ref(), &intents).await;

        let mut update: events::ActiveModel = current.into();
        update.confirmation_reminder_sent = Set(true);
        update.update(&self.db).await?;

        info!(event_id = event.id, "confirmation reminders sent");
        Ok(())
    }

    /// Active events more than two hours past their start.
    pub async fn completable_events(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<events::Model>, EventError> {
        Ok(events::Entity::find()
            .filter(events::Column::Status.eq(EventStatus::Active))
            .filter(events::Column::EventTime.lt(completion_cutoff(now)))
            .all(&self.db)
            .await?)
    }

    /// Active → Completed, purge scheduled a day out, delegated role
    /// reference cleared. The one-way status transition is itself the
    /// idempotence guard. Returns the updated row, or `None` when another
    /// writer already moved the event out of Active.
    pub async fn complete_event(
        &self,
        event_id: i32,
        now: NaiveDateTime,
    ) -> Result<Option<events::Model>, EventError> {
        let _guard = self.locks.try_acquire_with_retry(event_id).await?;

        let Some(current) = events::Entity::find_by_id(event_id).one(&self.db).await? else {
            return Ok(None);
        };
        if !current.is_active() {
            return Ok(None);
        }

        let mut update: events::ActiveModel = current.into();
        update.status = Set(EventStatus::Completed);
        update.delete_message_after = Set(Some(now + Duration::hours(24)));
        update.temp_role_id = Set(None);
        let updated = update.update(&self.db).await?;

        info!(event_id, "event marked completed");
        Ok(Some(updated))
    }

    /// Cancelled/completed events whose purge instant has passed and whose
    /// posted message reference is still set.
    pub async fn purgeable_events(
        &self,
        now: NaiveDateTime,
    ) -> Result<Vec<events::Model>, EventError> {
        Ok(events::Entity::find()
            .filter(
                events::Column::Status.is_in([EventStatus::Cancelled, EventStatus::Completed]),
            )
            .filter(events::Column::DeleteMessageAfter.is_not_null())
            .filter(events::Column::DeleteMessageAfter.lte(now))
            .all(&self.db)
            .await?)
    }

    /// Nulls the posted-message reference and lands the event in its
    /// terminal message-purged status.
    pub async fn mark_message_purged(&self, event_id: i32) -> Result<(), EventError> {
        let _guard = self.locks.try_acquire_with_retry(event_id).await?;

        let Some(current) = events::Entity::find_by_id(event_id).one(&self.db).await? else {
            return Ok(());
        };

        let purged_status = current.status.purged();
        let mut update: events::ActiveModel = current.into();
        update.message_id = Set(None);
        update.status = Set(purged_status);
        update.delete_message_after = Set(None);
        update.update(&self.db).await?;

        info!(event_id, "posted message purged");
        Ok(())
    }

    async fn broadcast_digest(&self, http: &serenity::Http) -> Result<(), EventError> {
        use crate::db::entities::guild_configs;

        let configs = guild_configs::Entity::find()
            .filter(guild_configs::Column::DigestChannelId.is_not_null())
            .all(&self.db)
            .await?;

        for config in configs {
            let Some(channel_id) = config.digest_channel_id else {
                continue;
            };

            let content = digest::digest_content(
                &self.db,
                &self.ledger,
                config.guild_id,
                3,
                Utc::now(),
                self.settings.digest_offset,
            )
            .await?;

            let full = format!("**Scheduled events (next 3 days):**\n{content}");
            for chunk in digest::chunk_message(&full, 1980) {
                if let Err(e) = serenity::ChannelId::new(channel_id as u64)
                    .say(http, chunk)
                    .await
                {
                    warn!(
                        guild_id = config.guild_id,
                        "Digest send failed for guild: {e:?}"
                    );
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Replaces the roster panel with the terminal cancelled/completed embed.
pub async fn edit_panel_to_final(http: &serenity::Http, event: &events::Model) {
    let Some(message_id) = event.message_id else {
        return;
    };
    let channel = serenity::ChannelId::new(event.channel_id as u64);
    let edit = serenity::EditMessage::new()
        .embed(render::finalized_embed(event))
        .components(vec![]);
    if let Err(e) = channel
        .edit_message(http, serenity::MessageId::new(message_id as u64), edit)
        .await
    {
        warn!(event_id = event.id, "Could not edit panel to final state: {e:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_standard_reminder_window_bounds() {
        let (start, end) = standard_reminder_window(at(12, 0));
        assert_eq!(start, at(12, 14));
        assert_eq!(end, at(12, 16));
        // Window is exclusive at the start, inclusive at the end: an event
        // at 12:15 is caught by the 12:00 tick but one at 12:14 is not.
        assert!(at(12, 15) > start && at(12, 15) <= end);
        assert!(!(at(12, 14) > start));
    }

    #[test]
    fn test_consecutive_ticks_cover_disjoint_starts() {
        // An event at 12:30 falls in the window of the 12:15 tick and at
        // most one neighbour; the flag makes the overlap harmless.
        let event_time = at(12, 30);
        let hits = (0..60)
            .filter(|&m| {
                let (start, end) = standard_reminder_window(at(12, m));
                event_time > start && event_time <= end
            })
            .count();
        assert_eq!(hits, 2); // two-minute window, one-minute cadence
    }

    #[test]
    fn test_confirmation_window_bounds() {
        let (start, end) = confirmation_reminder_window(at(12, 0));
        assert_eq!(start, at(12, 59));
        assert_eq!(end, at(13, 1));
    }

    #[test]
    fn test_completion_cutoff() {
        assert_eq!(completion_cutoff(at(12, 0)), at(10, 0));
    }
}
