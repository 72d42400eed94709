#![allow(dead_code)] // shared between test binaries; not every suite uses every helper

use chrono::{FixedOffset, NaiveDateTime, NaiveTime, Utc};
use fireteam_events::db::entities::events::{self, EventStatus};
use fireteam_events::db::migrations::Migrator;
use fireteam_events::services::delivery::{Notifier, RoleGateway};
use fireteam_events::services::error::DeliveryFailure;
use fireteam_events::services::notify::NotificationIntent;
use fireteam_events::services::settings::BotSettings;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use std::sync::Mutex;
use std::time::Duration;

/// Fresh in-memory database with the real migrations applied. Single
/// connection, so every query sees the same memory database.
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn test_settings() -> BotSettings {
    BotSettings {
        digest_times: vec![
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        ],
        digest_offset: FixedOffset::west_opt(3 * 3600).unwrap(),
        dm_pacing: Duration::from_millis(0),
    }
}

/// Captures every delivered intent instead of talking to Discord.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<NotificationIntent>>,
}

impl RecordingNotifier {
    pub fn delivered(&self) -> Vec<NotificationIntent> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<(), DeliveryFailure> {
        self.sent.lock().unwrap().push(intent.clone());
        Ok(())
    }
}

/// Role collaborator that accepts everything silently.
pub struct NullRoleGateway;

#[async_trait::async_trait]
impl RoleGateway for NullRoleGateway {
    async fn grant(&self, _guild_id: i64, _user_id: i64, _role_id: i64) {}
    async fn revoke(&self, _guild_id: i64, _user_id: i64, _role_id: i64) {}
    async fn delete_role(&self, _guild_id: i64, _role_id: i64, _reason: &str) {}
}

pub struct EventSeed {
    pub guild_id: i64,
    pub creator_id: i64,
    pub title: String,
    pub event_time: NaiveDateTime,
    pub max_attendees: i32,
    pub status: EventStatus,
    pub temp_role_id: Option<i64>,
    pub message_id: Option<i64>,
    pub delete_message_after: Option<NaiveDateTime>,
}

impl Default for EventSeed {
    fn default() -> Self {
        Self {
            guild_id: 1000,
            creator_id: 1,
            title: "Test event".to_string(),
            event_time: Utc::now().naive_utc() + chrono::Duration::days(1),
            max_attendees: 2,
            status: EventStatus::Active,
            temp_role_id: None,
            message_id: None,
            delete_message_after: None,
        }
    }
}

pub async fn insert_event(db: &DatabaseConnection, seed: EventSeed) -> events::Model {
    events::ActiveModel {
        guild_id: Set(seed.guild_id),
        channel_id: Set(2000),
        creator_id: Set(seed.creator_id),
        title: Set(seed.title),
        description: Set(None),
        event_time: Set(seed.event_time),
        activity_type: Set("Raid".to_string()),
        max_attendees: Set(seed.max_attendees),
        created_at: Set(Utc::now().naive_utc()),
        status: Set(seed.status),
        delete_message_after: Set(seed.delete_message_after),
        reminder_sent: Set(false),
        confirmation_reminder_sent: Set(false),
        temp_role_id: Set(seed.temp_role_id),
        message_id: Set(seed.message_id),
        restricted_role_ids: Set(serde_json::json!([])),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert event")
}
