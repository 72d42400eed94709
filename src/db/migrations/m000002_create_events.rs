use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Events::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Events::GuildId).big_integer().not_null())
                    .col(ColumnDef::new(Events::ChannelId).big_integer().not_null())
                    .col(ColumnDef::new(Events::CreatorId).big_integer().not_null())
                    .col(ColumnDef::new(Events::Title).string().not_null())
                    .col(ColumnDef::new(Events::Description).string())
                    .col(ColumnDef::new(Events::EventTime).date_time().not_null())
                    .col(ColumnDef::new(Events::ActivityType).string().not_null())
                    .col(ColumnDef::new(Events::MaxAttendees).integer().not_null())
                    .col(ColumnDef::new(Events::CreatedAt).date_time().not_null())
                    .col(
                        ColumnDef::new(Events::Status)
                            .string_len(32)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Events::DeleteMessageAfter).date_time())
                    .col(
                        ColumnDef::new(Events::ReminderSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Events::ConfirmationReminderSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Events::TempRoleId).big_integer())
                    .col(
                        ColumnDef::new(Events::MessageId)
                            .big_integer()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Events::RestrictedRoleIds).json().not_null())
                    .to_owned(),
            )
            .await?;

        // Serves the scheduler selection windows
        manager
            .create_index(
                Index::create()
                    .name("idx-events-status-event-time")
                    .table(Events::Table)
                    .col(Events::Status)
                    .col(Events::EventTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-events-delete-message-after")
                    .table(Events::Table)
                    .col(Events::DeleteMessageAfter)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    GuildId,
    ChannelId,
    CreatorId,
    Title,
    Description,
    EventTime,
    ActivityType,
    MaxAttendees,
    CreatedAt,
    Status,
    DeleteMessageAfter,
    ReminderSent,
    ConfirmationReminderSent,
    TempRoleId,
    MessageId,
    RestrictedRoleIds,
}
