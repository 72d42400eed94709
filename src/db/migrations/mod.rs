pub mod m000001_create_guild_configs;
pub mod m000002_create_events;
pub mod m000003_create_rsvps;
pub mod m000004_create_event_permissions;
pub mod m000005_create_designated_channels;

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m000001_create_guild_configs::Migration),
            Box::new(m000002_create_events::Migration),
            Box::new(m000003_create_rsvps::Migration),
            Box::new(m000004_create_event_permissions::Migration),
            Box::new(m000005_create_designated_channels::Migration),
        ]
    }
}
