use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod db;
pub mod modules;
pub mod services;

use services::capacity::CapacityResolver;
use services::delivery::{Notifier, RoleGateway};
use services::locks::EventLockService;
use services::permissions::PermissionService;
use services::rsvp_ledger::RsvpLedger;
use services::settings::BotSettings;

// Shared state handed to every command and event handler
pub struct Data {
    pub db: DatabaseConnection,
    pub settings: BotSettings,
    pub ledger: RsvpLedger,
    pub locks: Arc<EventLockService>,
    pub resolver: Arc<CapacityResolver>,
    pub permissions: PermissionService,
    pub notifier: Arc<dyn Notifier>,
    pub roles: Arc<dyn RoleGateway>,
}

pub type Error = anyhow::Error;
pub type Context<'a> = poise::Context<'a, Data, Error>;
